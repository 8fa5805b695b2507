//! In-memory wallet + contract double for controller and portal tests.

use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use wp_api_types::{Address, Receipt, TxHash, Wave};
use wp_chain_client::abi;
use wp_chain_client::{CallRequest, Log, LogFilter, ProviderError, TxRequest, WalletProvider};

use crate::portal::{GET_ALL_WAVES, GET_TOTAL_WAVES, NEW_WAVE_EVENT, WAVE};

pub const CONTRACT: &str = "0xfcd302aede3b5e725b524e5b6be63847435245cb";
pub const ALICE: &str = "0xa11ce00000000000000000000000000000000001";
pub const BOB: &str = "0xb0b0000000000000000000000000000000000002";

pub fn addr(s: &str) -> Address {
    Address::parse(s).unwrap()
}

pub struct MockWallet {
    pub authorized: RefCell<Vec<Address>>,
    /// Account granted by `request_accounts`; `None` rejects the prompt.
    pub grant: RefCell<Option<Address>>,
    pub waves: RefCell<Vec<Wave>>,
    pub logs: RefCell<Vec<Log>>,
    pub sent: RefCell<Vec<TxRequest>>,
    pub revert_next: Cell<bool>,
    pending: RefCell<Vec<(TxHash, Wave)>>,
    block: Cell<u64>,
    clock: Cell<u64>,
}

impl Default for MockWallet {
    fn default() -> Self {
        Self {
            authorized: RefCell::new(Vec::new()),
            grant: RefCell::new(None),
            waves: RefCell::new(Vec::new()),
            logs: RefCell::new(Vec::new()),
            sent: RefCell::new(Vec::new()),
            revert_next: Cell::new(false),
            pending: RefCell::new(Vec::new()),
            block: Cell::new(100),
            clock: Cell::new(1_650_000_000),
        }
    }
}

impl MockWallet {
    pub fn with_waves(messages: &[(&str, &str)]) -> Self {
        let wallet = Self::default();
        for (from, message) in messages {
            wallet.record(addr(from), message);
        }
        wallet
    }

    /// Someone else waves; the contract records it and emits `NewWave`.
    pub fn external_wave(&self, from: &str, message: &str) -> Wave {
        self.record(addr(from), message)
    }

    /// A `NewWave` log missing its indexed sender topic.
    pub fn push_truncated_log(&self) {
        self.block.set(self.block.get() + 1);
        self.logs.borrow_mut().push(Log {
            topics: vec![abi::event_topic(NEW_WAVE_EVENT)],
            data: Vec::new(),
            block_number: self.block.get(),
        });
    }

    /// Several waves mined in the same block, sharing its timestamp.
    pub fn external_waves_in_one_block(&self, waves: &[(&str, &str)]) -> Vec<Wave> {
        self.next_block();
        waves
            .iter()
            .map(|(from, message)| self.push_wave(addr(from), message))
            .collect()
    }

    pub fn set_head(&self, block: u64) {
        self.block.set(block);
    }

    fn next_block(&self) {
        self.block.set(self.block.get() + 1);
        self.clock.set(self.clock.get() + 60);
    }

    fn record(&self, waver: Address, message: &str) -> Wave {
        self.next_block();
        self.push_wave(waver, message)
    }

    fn push_wave(&self, waver: Address, message: &str) -> Wave {
        let wave = Wave {
            waver,
            timestamp: self.clock.get(),
            message: message.to_owned(),
        };
        let (topics, data) = abi::encode_new_wave(abi::event_topic(NEW_WAVE_EVENT), &wave);
        self.logs.borrow_mut().push(Log {
            topics,
            data,
            block_number: self.block.get(),
        });
        self.waves.borrow_mut().push(wave.clone());
        wave
    }
}

fn decode_string_arg(data: &[u8]) -> Result<String, ProviderError> {
    let malformed = || ProviderError::Malformed("bad string argument".into());
    let len_word = data.get(36..68).ok_or_else(malformed)?;
    let len = abi::decode_u64(len_word).map_err(|_| malformed())? as usize;
    let bytes = data.get(68..68 + len).ok_or_else(malformed)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| malformed())
}

#[async_trait(?Send)]
impl WalletProvider for MockWallet {
    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        Ok(self.authorized.borrow().clone())
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        match self.grant.borrow().clone() {
            Some(account) => {
                self.authorized.borrow_mut().push(account);
                Ok(self.authorized.borrow().clone())
            }
            None => Err(ProviderError::Rejected("User rejected the request.".into())),
        }
    }

    async fn call(&self, req: CallRequest) -> Result<Vec<u8>, ProviderError> {
        if req.to != addr(CONTRACT) {
            return Ok(Vec::new());
        }
        let sel = req.data.get(..4).unwrap_or_default();
        if sel == abi::selector(GET_TOTAL_WAVES) {
            Ok(abi::u64_word(self.waves.borrow().len() as u64).to_vec())
        } else if sel == abi::selector(GET_ALL_WAVES) {
            Ok(abi::encode_waves(&self.waves.borrow()))
        } else {
            Err(ProviderError::Rpc {
                code: -32000,
                message: "execution reverted".into(),
            })
        }
    }

    async fn send_transaction(&self, req: TxRequest) -> Result<TxHash, ProviderError> {
        if req.data.get(..4) != Some(&abi::selector(WAVE)[..]) {
            return Err(ProviderError::Malformed("unknown selector".into()));
        }
        let message = decode_string_arg(&req.data)?;
        let hash = TxHash(format!("0x{:064x}", self.sent.borrow().len() + 1));
        let wave = Wave {
            waver: req.from.clone(),
            timestamp: 0,
            message,
        };
        self.pending.borrow_mut().push((hash.clone(), wave));
        self.sent.borrow_mut().push(req);
        Ok(hash)
    }

    async fn wait_for_receipt(&self, tx_hash: &TxHash) -> Result<Receipt, ProviderError> {
        let index = self
            .pending
            .borrow()
            .iter()
            .position(|(h, _)| h == tx_hash)
            .ok_or_else(|| ProviderError::Malformed(format!("unknown tx {tx_hash}")))?;
        let (_, wave) = self.pending.borrow_mut().remove(index);
        if self.revert_next.replace(false) {
            return Err(ProviderError::Rpc {
                code: -32000,
                message: format!("transaction {tx_hash} reverted"),
            });
        }
        self.record(wave.waver, &wave.message);
        Ok(Receipt {
            tx_hash: tx_hash.clone(),
            block_number: self.block.get(),
            success: true,
        })
    }

    async fn block_number(&self) -> Result<u64, ProviderError> {
        Ok(self.block.get())
    }

    async fn logs(&self, filter: LogFilter) -> Result<Vec<Log>, ProviderError> {
        let to = filter.to_block.unwrap_or(u64::MAX);
        Ok(self
            .logs
            .borrow()
            .iter()
            .filter(|log| log.block_number >= filter.from_block && log.block_number <= to)
            .filter(|log| log.topics.first() == Some(&filter.topic0))
            .cloned()
            .collect())
    }
}
