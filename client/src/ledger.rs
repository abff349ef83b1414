//! Occupancy ledger over Ethereum-style JSON-RPC.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use gloo_net::http::Request;
use gloo_timers::future::TimeoutFuture;
use serde::Deserialize;
use serde_json::{Value, json};

use isomap_shared::config::LedgerConfig;
use isomap_shared::{AccountId, Ledger, LedgerError, TileCoord};

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone)]
pub struct JsonRpcLedger {
    config: LedgerConfig,
}

impl JsonRpcLedger {
    pub fn new(config: LedgerConfig) -> Self {
        Self { config }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
        let id = NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let resp = Request::post(&self.config.rpc_url)
            .json(&body)
            .map_err(|e| LedgerError::Transport(format!("request error: {e}")))?
            .send()
            .await
            .map_err(|e| LedgerError::Transport(format!("fetch error: {e}")))?;

        if !resp.ok() {
            return Err(LedgerError::Transport(format!("HTTP {}", resp.status())));
        }

        let parsed = resp
            .json::<Value>()
            .await
            .map_err(|e| LedgerError::Decode(format!("parse error: {e}")))?;
        into_result(parsed)
    }

    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<(), LedgerError> {
        for _ in 0..self.config.receipt_poll_attempts {
            let receipt = self
                .call("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;
            if let Some(outcome) = receipt_outcome(&receipt, tx_hash) {
                return outcome;
            }
            TimeoutFuture::new(self.config.receipt_poll_interval_ms).await;
        }
        Err(LedgerError::Timeout(tx_hash.to_string()))
    }
}

#[async_trait(?Send)]
impl Ledger for JsonRpcLedger {
    async fn query_occupancy(&self, tile: TileCoord) -> Result<bool, LedgerError> {
        let data = encode_call(
            &self.config.query_selector,
            self.config.argument_order.arrange(tile),
        );
        let params = json!([
            { "to": self.config.contract_address, "data": data },
            "latest"
        ]);
        let result = self.call("eth_call", params).await?;
        decode_bool(as_hex(&result)?)
    }

    async fn occupy_tile(&self, tile: TileCoord, account: &AccountId) -> Result<(), LedgerError> {
        let data = encode_call(
            &self.config.occupy_selector,
            self.config.argument_order.arrange(tile),
        );
        let params = json!([{
            "from": account.0,
            "to": self.config.contract_address,
            "data": data,
        }]);
        let result = self.call("eth_sendTransaction", params).await?;
        let tx_hash = as_hex(&result)?.to_string();
        tracing::debug!(%tx_hash, row = tile.row, col = tile.col, "occupy submitted");
        self.wait_for_receipt(&tx_hash).await
    }

    async fn list_accounts(&self) -> Result<Vec<AccountId>, LedgerError> {
        let result = self.call("eth_accounts", json!([])).await?;
        parse_accounts(result)
    }
}

/// Split a JSON-RPC envelope. A `null` result is valid (e.g. a pending receipt).
fn into_result(mut resp: Value) -> Result<Value, LedgerError> {
    if let Some(err) = resp.get("error").filter(|e| !e.is_null()) {
        let body: RpcErrorBody = serde_json::from_value(err.clone())
            .map_err(|e| LedgerError::Decode(format!("malformed rpc error: {e}")))?;
        return Err(LedgerError::Rpc {
            code: body.code,
            message: body.message,
        });
    }
    resp.get_mut("result")
        .map(Value::take)
        .ok_or_else(|| LedgerError::Decode("response has neither result nor error".into()))
}

fn as_hex(value: &Value) -> Result<&str, LedgerError> {
    value
        .as_str()
        .ok_or_else(|| LedgerError::Decode(format!("expected hex string, got {value}")))
}

/// Calldata: 4-byte selector followed by two 32-byte big-endian words.
fn encode_call(selector: &str, (a, b): (u32, u32)) -> String {
    let selector = selector.trim_start_matches("0x");
    format!("0x{selector}{a:064x}{b:064x}")
}

fn decode_bool(hex: &str) -> Result<bool, LedgerError> {
    let digits = hex.trim_start_matches("0x");
    if digits.len() < 64 || !digits.is_ascii() {
        return Err(LedgerError::Decode(format!("short return data {hex:?}")));
    }
    let word = &digits[..64];
    if !word.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(LedgerError::Decode(format!("non-hex return data {hex:?}")));
    }
    u8::from_str_radix(&word[62..], 16)
        .map(|last| last != 0)
        .map_err(|e| LedgerError::Decode(e.to_string()))
}

fn parse_accounts(value: Value) -> Result<Vec<AccountId>, LedgerError> {
    let accounts: Vec<String> =
        serde_json::from_value(value).map_err(|e| LedgerError::Decode(e.to_string()))?;
    Ok(accounts.into_iter().map(AccountId).collect())
}

/// `None` while the transaction is still pending.
fn receipt_outcome(receipt: &Value, tx_hash: &str) -> Option<Result<(), LedgerError>> {
    if receipt.is_null() {
        return None;
    }
    match receipt.get("status").and_then(Value::as_str) {
        Some("0x1") => Some(Ok(())),
        Some(_) => Some(Err(LedgerError::Reverted(tx_hash.to_string()))),
        None => Some(Err(LedgerError::Decode(format!(
            "receipt for {tx_hash} has no status"
        )))),
    }
}
