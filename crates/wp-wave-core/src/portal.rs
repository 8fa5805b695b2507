//! Binding for the deployed `WavePortal` contract.

use anyhow::{Context, Result};
use tracing::{debug, warn};
use wp_api_types::{Address, Receipt, TxHash, Wave};
use wp_chain_client::abi;
use wp_chain_client::{CallRequest, LogFilter, TxRequest, WalletProvider};

pub const DEFAULT_CONTRACT: &str = "0xFCD302AEDE3B5e725b524e5B6Be63847435245CB";

pub const GET_TOTAL_WAVES: &str = "getTotalWaves()";
pub const GET_ALL_WAVES: &str = "getAllWaves()";
pub const WAVE: &str = "wave(string)";
pub const NEW_WAVE_EVENT: &str = "NewWave(address,uint256,string)";

/// A decoded `NewWave` log and the block it was mined in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveEvent {
    pub block_number: u64,
    pub wave: Wave,
}

pub struct WavePortal<P> {
    provider: P,
    contract: Address,
    new_wave_topic: [u8; 32],
}

impl<P: WalletProvider> WavePortal<P> {
    pub fn new(provider: P, contract: Address) -> Self {
        Self {
            provider,
            contract,
            new_wave_topic: abi::event_topic(NEW_WAVE_EVENT),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn contract(&self) -> &Address {
        &self.contract
    }

    async fn read(&self, signature: &str) -> Result<Vec<u8>> {
        let req = CallRequest {
            to: self.contract.clone(),
            data: abi::encode_call(abi::selector(signature)),
        };
        self.provider
            .call(req)
            .await
            .with_context(|| format!("{signature} call failed"))
    }

    pub async fn total_waves(&self) -> Result<u64> {
        let data = self.read(GET_TOTAL_WAVES).await?;
        abi::decode_u64(&data).context("getTotalWaves returned malformed data")
    }

    pub async fn all_waves(&self) -> Result<Vec<Wave>> {
        let data = self.read(GET_ALL_WAVES).await?;
        abi::decode_waves(&data).context("getAllWaves returned malformed data")
    }

    /// Submit `wave(message)` from `from`. Resolves once the wallet has broadcast it.
    pub async fn wave(&self, from: &Address, message: &str) -> Result<TxHash> {
        let req = TxRequest {
            from: from.clone(),
            to: self.contract.clone(),
            data: abi::encode_string_call(abi::selector(WAVE), message),
        };
        self.provider
            .send_transaction(req)
            .await
            .context("wave transaction was not submitted")
    }

    pub async fn wait_mined(&self, tx_hash: &TxHash) -> Result<Receipt> {
        self.provider
            .wait_for_receipt(tx_hash)
            .await
            .with_context(|| format!("wave transaction {tx_hash} did not confirm"))
    }

    pub async fn latest_block(&self) -> Result<u64> {
        self.provider
            .block_number()
            .await
            .context("eth_blockNumber failed")
    }

    /// `NewWave` events in `from_block..=to_block`, in log order.
    /// Logs that fail to decode are skipped.
    pub async fn new_waves(&self, from_block: u64, to_block: u64) -> Result<Vec<WaveEvent>> {
        let filter = LogFilter {
            address: self.contract.clone(),
            topic0: self.new_wave_topic,
            from_block,
            to_block: Some(to_block),
        };
        let logs = self
            .provider
            .logs(filter)
            .await
            .context("eth_getLogs for NewWave failed")?;
        debug!(from_block, to_block, count = logs.len(), "fetched NewWave logs");

        let mut events = Vec::with_capacity(logs.len());
        for log in logs {
            if log.topics.first() != Some(&self.new_wave_topic) {
                continue;
            }
            match abi::decode_new_wave(&log.topics, &log.data) {
                Ok(wave) => events.push(WaveEvent {
                    block_number: log.block_number,
                    wave,
                }),
                Err(e) => warn!(block = log.block_number, "skipping undecodable NewWave log: {e}"),
            }
        }
        Ok(events)
    }
}
