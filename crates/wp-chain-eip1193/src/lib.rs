use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;
use wp_api_types::{Address, Receipt, TxHash};
use wp_chain_client::{CallRequest, Log, LogFilter, ProviderError, TxRequest, WalletProvider};

pub const DEFAULT_RECEIPT_POLL_MS: u32 = 1_500;

/// Raw access to an EIP-1193 provider (`window.ethereum` in the browser).
///
/// `sleep` paces receipt polling and must yield to the host event loop.
#[async_trait(?Send)]
pub trait Eip1193Transport {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;
    async fn sleep(&self, millis: u32);
}

/// `WalletProvider` over plain EIP-1193 JSON-RPC requests.
pub struct Eip1193Wallet<T> {
    transport: T,
    receipt_poll_ms: u32,
}

impl<T: Eip1193Transport> Eip1193Wallet<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            receipt_poll_ms: DEFAULT_RECEIPT_POLL_MS,
        }
    }

    pub fn with_receipt_poll_ms(mut self, millis: u32) -> Self {
        self.receipt_poll_ms = millis.max(1);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn receipt(&self, tx_hash: &TxHash) -> Result<Option<Receipt>, ProviderError> {
        let value = self
            .transport
            .request("eth_getTransactionReceipt", json!([tx_hash.0]))
            .await?;
        parse_receipt(&value)
    }
}

#[async_trait(?Send)]
impl<T: Eip1193Transport> WalletProvider for Eip1193Wallet<T> {
    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let value = self.transport.request("eth_accounts", json!([])).await?;
        parse_accounts(&value)
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let value = self
            .transport
            .request("eth_requestAccounts", json!([]))
            .await?;
        parse_accounts(&value)
    }

    async fn call(&self, req: CallRequest) -> Result<Vec<u8>, ProviderError> {
        let params = json!([
            { "to": req.to.as_str(), "data": encode_bytes(&req.data) },
            "latest"
        ]);
        let value = self.transport.request("eth_call", params).await?;
        parse_bytes(&value)
    }

    async fn send_transaction(&self, req: TxRequest) -> Result<TxHash, ProviderError> {
        let params = json!([{
            "from": req.from.as_str(),
            "to": req.to.as_str(),
            "data": encode_bytes(&req.data)
        }]);
        let value = self.transport.request("eth_sendTransaction", params).await?;
        value
            .as_str()
            .map(|h| TxHash(h.to_owned()))
            .ok_or_else(|| ProviderError::Malformed(format!("tx hash: {value}")))
    }

    async fn wait_for_receipt(&self, tx_hash: &TxHash) -> Result<Receipt, ProviderError> {
        loop {
            if let Some(receipt) = self.receipt(tx_hash).await? {
                if !receipt.success {
                    return Err(ProviderError::Rpc {
                        code: -32000,
                        message: format!("transaction {tx_hash} reverted"),
                    });
                }
                return Ok(receipt);
            }
            debug!(%tx_hash, "receipt not available yet");
            self.transport.sleep(self.receipt_poll_ms).await;
        }
    }

    async fn block_number(&self) -> Result<u64, ProviderError> {
        let value = self.transport.request("eth_blockNumber", json!([])).await?;
        parse_quantity(&value)
    }

    async fn logs(&self, filter: LogFilter) -> Result<Vec<Log>, ProviderError> {
        let mut query = json!({
            "address": filter.address.as_str(),
            "topics": [encode_bytes(&filter.topic0)],
            "fromBlock": encode_quantity(filter.from_block)
        });
        query["toBlock"] = match filter.to_block {
            Some(block) => Value::String(encode_quantity(block)),
            None => Value::String("latest".to_owned()),
        };
        let value = self.transport.request("eth_getLogs", json!([query])).await?;
        let entries = value
            .as_array()
            .ok_or_else(|| ProviderError::Malformed(format!("logs: {value}")))?;
        entries.iter().map(parse_log).collect()
    }
}

// ── JSON-RPC value mapping ──

pub fn encode_bytes(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub fn encode_quantity(value: u64) -> String {
    format!("{value:#x}")
}

pub fn parse_bytes(value: &Value) -> Result<Vec<u8>, ProviderError> {
    let text = value
        .as_str()
        .ok_or_else(|| ProviderError::Malformed(format!("expected hex string, got {value}")))?;
    let digits = text
        .strip_prefix("0x")
        .ok_or_else(|| ProviderError::Malformed(format!("missing 0x prefix: {text}")))?;
    hex::decode(digits).map_err(|e| ProviderError::Malformed(format!("{text}: {e}")))
}

pub fn parse_quantity(value: &Value) -> Result<u64, ProviderError> {
    let text = value
        .as_str()
        .ok_or_else(|| ProviderError::Malformed(format!("expected quantity, got {value}")))?;
    let digits = text
        .strip_prefix("0x")
        .ok_or_else(|| ProviderError::Malformed(format!("missing 0x prefix: {text}")))?;
    u64::from_str_radix(digits, 16).map_err(|e| ProviderError::Malformed(format!("{text}: {e}")))
}

fn parse_word(value: &Value) -> Result<[u8; 32], ProviderError> {
    let bytes = parse_bytes(value)?;
    <[u8; 32]>::try_from(bytes.as_slice())
        .map_err(|_| ProviderError::Malformed(format!("expected 32-byte word, got {value}")))
}

pub fn parse_accounts(value: &Value) -> Result<Vec<Address>, ProviderError> {
    let entries = value
        .as_array()
        .ok_or_else(|| ProviderError::Malformed(format!("accounts: {value}")))?;
    entries
        .iter()
        .map(|entry| {
            let text = entry
                .as_str()
                .ok_or_else(|| ProviderError::Malformed(format!("account: {entry}")))?;
            Address::parse(text).map_err(|e| ProviderError::Malformed(e.to_string()))
        })
        .collect()
}

/// `null` means "not mined yet".
pub fn parse_receipt(value: &Value) -> Result<Option<Receipt>, ProviderError> {
    if value.is_null() {
        return Ok(None);
    }
    let tx_hash = value["transactionHash"]
        .as_str()
        .ok_or_else(|| ProviderError::Malformed(format!("receipt: {value}")))?;
    let block_number = parse_quantity(&value["blockNumber"])?;
    // Pre-Byzantium receipts carry no status field.
    let success = match &value["status"] {
        Value::Null => true,
        status => parse_quantity(status)? == 1,
    };
    Ok(Some(Receipt {
        tx_hash: TxHash(tx_hash.to_owned()),
        block_number,
        success,
    }))
}

pub fn parse_log(value: &Value) -> Result<Log, ProviderError> {
    let topics = value["topics"]
        .as_array()
        .ok_or_else(|| ProviderError::Malformed(format!("log topics: {value}")))?
        .iter()
        .map(parse_word)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Log {
        topics,
        data: parse_bytes(&value["data"])?,
        block_number: parse_quantity(&value["blockNumber"])?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    /// Replays canned responses in order and records each request.
    #[derive(Default)]
    struct ScriptedTransport {
        responses: RefCell<VecDeque<Result<Value, ProviderError>>>,
        requests: RefCell<Vec<(String, Value)>>,
        sleeps: Cell<u32>,
    }

    impl ScriptedTransport {
        fn push(&self, response: Result<Value, ProviderError>) {
            self.responses.borrow_mut().push_back(response);
        }
    }

    #[async_trait(?Send)]
    impl Eip1193Transport for ScriptedTransport {
        async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
            self.requests
                .borrow_mut()
                .push((method.to_owned(), params));
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::Malformed("script exhausted".into())))
        }

        async fn sleep(&self, _millis: u32) {
            self.sleeps.set(self.sleeps.get() + 1);
        }
    }

    const CONTRACT: &str = "0xfcd302aede3b5e725b524e5b6be63847435245cb";
    const ACCOUNT: &str = "0x1111111111111111111111111111111111111111";

    #[tokio::test]
    async fn accounts_are_parsed_and_normalized() -> anyhow::Result<()> {
        let transport = ScriptedTransport::default();
        transport.push(Ok(json!(["0xAbCdEf0000000000000000000000000000000001"])));
        let wallet = Eip1193Wallet::new(transport);

        let accounts = wallet.accounts().await?;
        assert_eq!(
            accounts,
            vec![Address::parse("0xabcdef0000000000000000000000000000000001")?]
        );
        assert_eq!(wallet.transport().requests.borrow()[0].0, "eth_accounts");
        Ok(())
    }

    #[tokio::test]
    async fn rejection_passes_through() {
        let transport = ScriptedTransport::default();
        transport.push(Err(ProviderError::from_code(4001, "User rejected the request.")));
        let wallet = Eip1193Wallet::new(transport);

        let err = wallet.request_accounts().await.unwrap_err();
        assert!(matches!(err, ProviderError::Rejected(_)));
    }

    #[tokio::test]
    async fn call_sends_hex_data_against_latest() -> anyhow::Result<()> {
        let transport = ScriptedTransport::default();
        transport.push(Ok(json!("0x000000000000000000000000000000000000000000000000000000000000002a")));
        let wallet = Eip1193Wallet::new(transport);

        let out = wallet
            .call(CallRequest {
                to: Address::parse(CONTRACT)?,
                data: vec![0xde, 0xad, 0xbe, 0xef],
            })
            .await?;
        assert_eq!(out.len(), 32);
        assert_eq!(out[31], 42);

        let requests = wallet.transport().requests.borrow();
        let (method, params) = &requests[0];
        assert_eq!(method, "eth_call");
        assert_eq!(params[0]["to"], CONTRACT);
        assert_eq!(params[0]["data"], "0xdeadbeef");
        assert_eq!(params[1], "latest");
        Ok(())
    }

    #[tokio::test]
    async fn send_transaction_returns_hash() -> anyhow::Result<()> {
        let transport = ScriptedTransport::default();
        transport.push(Ok(json!("0xabc123")));
        let wallet = Eip1193Wallet::new(transport);

        let hash = wallet
            .send_transaction(TxRequest {
                from: Address::parse(ACCOUNT)?,
                to: Address::parse(CONTRACT)?,
                data: vec![1, 2],
            })
            .await?;
        assert_eq!(hash, TxHash("0xabc123".to_owned()));

        let requests = wallet.transport().requests.borrow();
        assert_eq!(requests[0].0, "eth_sendTransaction");
        assert_eq!(requests[0].1[0]["from"], ACCOUNT);
        assert_eq!(requests[0].1[0]["data"], "0x0102");
        Ok(())
    }

    #[tokio::test]
    async fn receipt_is_polled_until_mined() -> anyhow::Result<()> {
        let transport = ScriptedTransport::default();
        transport.push(Ok(Value::Null));
        transport.push(Ok(Value::Null));
        transport.push(Ok(json!({
            "transactionHash": "0xabc",
            "blockNumber": "0x10",
            "status": "0x1",
        })));
        let wallet = Eip1193Wallet::new(transport).with_receipt_poll_ms(10);

        let receipt = wallet.wait_for_receipt(&TxHash("0xabc".to_owned())).await?;
        assert_eq!(receipt.block_number, 16);
        assert!(receipt.success);
        assert_eq!(wallet.transport().sleeps.get(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn reverted_receipt_is_an_error() {
        let transport = ScriptedTransport::default();
        transport.push(Ok(json!({
            "transactionHash": "0xabc",
            "blockNumber": "0x10",
            "status": "0x0",
        })));
        let wallet = Eip1193Wallet::new(transport);

        let err = wallet
            .wait_for_receipt(&TxHash("0xabc".to_owned()))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Rpc { code: -32000, .. }));
    }

    #[tokio::test]
    async fn logs_query_and_parse() -> anyhow::Result<()> {
        let topic = format!("0x{}", "ab".repeat(32));
        let transport = ScriptedTransport::default();
        transport.push(Ok(json!([{
            "topics": [topic.clone()],
            "data": "0x01",
            "blockNumber": "0x5",
        }])));
        let wallet = Eip1193Wallet::new(transport);

        let logs = wallet
            .logs(LogFilter {
                address: Address::parse(CONTRACT)?,
                topic0: [0xab; 32],
                from_block: 5,
                to_block: None,
            })
            .await?;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].topics, vec![[0xab; 32]]);
        assert_eq!(logs[0].data, vec![1]);
        assert_eq!(logs[0].block_number, 5);

        let requests = wallet.transport().requests.borrow();
        let query = &requests[0].1[0];
        assert_eq!(query["fromBlock"], "0x5");
        assert_eq!(query["toBlock"], "latest");
        assert_eq!(query["topics"][0], topic);
        Ok(())
    }

    #[test]
    fn quantities_and_bytes_are_strict() {
        assert_eq!(parse_quantity(&json!("0x1a")).unwrap(), 26);
        assert_eq!(encode_quantity(26), "0x1a");
        assert_eq!(encode_quantity(0), "0x0");
        assert!(parse_quantity(&json!("1a")).is_err());
        assert!(parse_quantity(&json!(26)).is_err());
        assert_eq!(parse_bytes(&json!("0x")).unwrap(), Vec::<u8>::new());
        assert!(parse_bytes(&json!("0xzz")).is_err());
    }

    #[test]
    fn receipt_without_status_counts_as_success() {
        let receipt = parse_receipt(&json!({
            "transactionHash": "0x1",
            "blockNumber": "0x2",
        }))
        .unwrap()
        .unwrap();
        assert!(receipt.success);
    }
}
