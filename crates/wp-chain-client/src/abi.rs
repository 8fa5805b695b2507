//! Solidity ABI encoding for the handful of shapes the wave contract uses.
//!
//! Calls take zero or one `string` argument. Return data covers `uint256`,
//! `address`, `string`, and dynamic arrays of `(address, string, uint256)`
//! tuples. Every read is bounds-checked.

use sha3::{Digest, Keccak256};
use thiserror::Error;
use wp_api_types::{Address, Wave};

pub const WORD: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    #[error("read of {len} bytes at offset {offset} is out of bounds")]
    OutOfBounds { offset: usize, len: usize },
    #[error("value at offset {0} does not fit in 64 bits")]
    Overflow(usize),
    #[error("word at offset {0} is not a left-padded address")]
    BadAddress(usize),
    #[error("log has {0} topics, expected at least 2")]
    MissingTopic(usize),
}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let mut out = [0_u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

pub fn event_topic(signature: &str) -> [u8; 32] {
    keccak256(signature.as_bytes())
}

pub fn encode_call(selector: [u8; 4]) -> Vec<u8> {
    selector.to_vec()
}

pub fn encode_string_call(selector: [u8; 4], value: &str) -> Vec<u8> {
    let bytes = value.as_bytes();
    let padded = bytes.len().div_ceil(WORD) * WORD;
    let mut out = Vec::with_capacity(4 + 2 * WORD + padded);
    out.extend_from_slice(&selector);
    out.extend_from_slice(&u64_word(WORD as u64));
    out.extend_from_slice(&u64_word(bytes.len() as u64));
    out.extend_from_slice(bytes);
    out.resize(4 + 2 * WORD + padded, 0);
    out
}

pub fn u64_word(value: u64) -> [u8; 32] {
    let mut word = [0_u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

pub fn address_word(address: &Address) -> [u8; 32] {
    let mut word = [0_u8; 32];
    word[12..].copy_from_slice(&address.to_bytes());
    word
}

/// Inverse of [`decode_waves`]; used by in-memory contract doubles.
pub fn encode_waves(waves: &[Wave]) -> Vec<u8> {
    let tuples: Vec<Vec<u8>> = waves.iter().map(wave_tuple).collect();
    let mut out = u64_word(WORD as u64).to_vec();
    out.extend_from_slice(&u64_word(waves.len() as u64));
    let mut next = waves.len() * WORD;
    for tuple in &tuples {
        out.extend_from_slice(&u64_word(next as u64));
        next += tuple.len();
    }
    for tuple in tuples {
        out.extend_from_slice(&tuple);
    }
    out
}

/// Inverse of [`decode_new_wave`]: `(topics, data)` for one `NewWave` log.
pub fn encode_new_wave(topic0: [u8; 32], wave: &Wave) -> (Vec<[u8; 32]>, Vec<u8>) {
    let mut data = u64_word(wave.timestamp).to_vec();
    data.extend_from_slice(&u64_word(2 * WORD as u64));
    data.extend_from_slice(&string_tail(&wave.message));
    (vec![topic0, address_word(&wave.waver)], data)
}

fn string_tail(value: &str) -> Vec<u8> {
    let bytes = value.as_bytes();
    let mut out = u64_word(bytes.len() as u64).to_vec();
    out.extend_from_slice(bytes);
    out.resize(WORD + bytes.len().div_ceil(WORD) * WORD, 0);
    out
}

fn wave_tuple(wave: &Wave) -> Vec<u8> {
    let mut out = address_word(&wave.waver).to_vec();
    out.extend_from_slice(&u64_word(3 * WORD as u64));
    out.extend_from_slice(&u64_word(wave.timestamp));
    out.extend_from_slice(&string_tail(&wave.message));
    out
}

/// Return data of a function returning a single `uint256`.
pub fn decode_u64(data: &[u8]) -> Result<u64, AbiError> {
    read_u64(data, 0)
}

/// Return data of `getAllWaves()`: `(address waver, string message, uint256 timestamp)[]`.
pub fn decode_waves(data: &[u8]) -> Result<Vec<Wave>, AbiError> {
    let array = read_offset(data, 0)?;
    let count = read_offset(data, array)?;
    let base = checked(array, WORD)?;

    // All element offsets must be present before anything is allocated.
    let heads_len = count.checked_mul(WORD).ok_or(AbiError::Overflow(array))?;
    slice(data, base, heads_len)?;

    let mut waves = Vec::with_capacity(count);
    for index in 0..count {
        let tuple = checked(base, read_offset(data, base + index * WORD)?)?;
        let waver = read_address(data, tuple)?;
        let message_at = checked(tuple, read_offset(data, checked(tuple, WORD)?)?)?;
        let message = read_string(data, message_at)?;
        let timestamp = read_u64(data, checked(tuple, 2 * WORD)?)?;
        waves.push(Wave {
            waver,
            timestamp,
            message,
        });
    }
    Ok(waves)
}

/// `NewWave(address indexed from, uint256 timestamp, string message)`.
pub fn decode_new_wave(topics: &[[u8; 32]], data: &[u8]) -> Result<Wave, AbiError> {
    if topics.len() < 2 {
        return Err(AbiError::MissingTopic(topics.len()));
    }
    let waver = read_address(&topics[1], 0)?;
    let timestamp = read_u64(data, 0)?;
    let message = read_string(data, read_offset(data, WORD)?)?;
    Ok(Wave {
        waver,
        timestamp,
        message,
    })
}

/// EIP-55 mixed-case rendering.
pub fn checksum_address(address: &Address) -> String {
    let lower = &address.as_str()[2..];
    let hash = keccak256(lower.as_bytes());
    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

// ── Readers ──

fn checked(base: usize, add: usize) -> Result<usize, AbiError> {
    base.checked_add(add).ok_or(AbiError::Overflow(base))
}

fn slice(data: &[u8], offset: usize, len: usize) -> Result<&[u8], AbiError> {
    let end = offset
        .checked_add(len)
        .ok_or(AbiError::OutOfBounds { offset, len })?;
    data.get(offset..end)
        .ok_or(AbiError::OutOfBounds { offset, len })
}

fn read_u64(data: &[u8], offset: usize) -> Result<u64, AbiError> {
    let word = slice(data, offset, WORD)?;
    if word[..24].iter().any(|b| *b != 0) {
        return Err(AbiError::Overflow(offset));
    }
    let mut tail = [0_u8; 8];
    tail.copy_from_slice(&word[24..]);
    Ok(u64::from_be_bytes(tail))
}

fn read_offset(data: &[u8], offset: usize) -> Result<usize, AbiError> {
    let value = read_u64(data, offset)?;
    usize::try_from(value).map_err(|_| AbiError::Overflow(offset))
}

fn read_address(data: &[u8], offset: usize) -> Result<Address, AbiError> {
    let word = slice(data, offset, WORD)?;
    if word[..12].iter().any(|b| *b != 0) {
        return Err(AbiError::BadAddress(offset));
    }
    let mut raw = [0_u8; 20];
    raw.copy_from_slice(&word[12..]);
    Ok(Address::from_bytes(raw))
}

fn read_string(data: &[u8], offset: usize) -> Result<String, AbiError> {
    let len = read_offset(data, offset)?;
    let bytes = slice(data, checked(offset, WORD)?, len)?;
    Ok(String::from_utf8_lossy(bytes).into_owned())
}
