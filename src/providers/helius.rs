//! Helius RPC/DAS Gateway
//!
//! JSON-RPC client for Solana account, holder, signature and transaction
//! lookups plus the DAS `getAsset` metadata call. Every call carries an
//! explicit timeout and maps transport failures, HTTP status errors and
//! RPC error objects uniformly into `AppError` — callers treat all three
//! as a recoverable step failure. The gateway performs no retries.

use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::models::config::RpcConfig;
use crate::models::errors::{AppError, AppResult};
use crate::utils::constants::USER_AGENT;

/// Raw account info, `jsonParsed` encoding
#[derive(Debug, Clone, serde::Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub lamports: u64,
    pub owner: String,
    pub executable: bool,
    pub data: Value,
}

impl AccountInfo {
    /// Parsed account type (e.g. "mint", "program", "programData")
    pub fn parsed_type(&self) -> Option<&str> {
        self.data
            .get("parsed")
            .and_then(|p| p.get("type"))
            .and_then(|t| t.as_str())
    }

    /// Parsed info payload
    pub fn parsed_info(&self) -> Option<&Value> {
        self.data.get("parsed").and_then(|p| p.get("info"))
    }
}

/// One entry from getTokenLargestAccounts
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolderBalance {
    pub address: String,
    #[serde(default)]
    pub ui_amount: Option<f64>,
}

/// One entry from getSignaturesForAddress
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureRecord {
    pub signature: String,
    #[serde(default)]
    pub block_time: Option<i64>,
    #[serde(default)]
    pub err: Option<Value>,
}

impl SignatureRecord {
    pub fn failed(&self) -> bool {
        self.err.as_ref().map(|e| !e.is_null()).unwrap_or(false)
    }
}

/// Facts the MEV scorer consumes from a resolved transaction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedTransaction {
    pub signature: String,
    pub fee_lamports: u64,
    pub inner_instruction_count: usize,
    pub program_ids: Vec<String>,
    pub failed: bool,
}

/// DAS asset metadata the analyzer consumes
#[derive(Debug, Clone, serde::Serialize)]
pub struct AssetMetadata {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub mutable: bool,
}

/// Solana JSON-RPC / DAS client
#[derive(Clone)]
pub struct HeliusClient {
    config: RpcConfig,
    client: reqwest::Client,
}

impl HeliusClient {
    pub fn new(config: RpcConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// True only when a dedicated API key is configured; without one the
    /// on-chain path degrades to "not configured" rather than failing hard.
    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Execute a JSON-RPC call with an explicit timeout.
    /// Returns the raw `result` value; `null` results pass through as-is.
    pub async fn call(
        &self,
        method: &str,
        params: Value,
        timeout: Option<Duration>,
    ) -> AppResult<Value> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        debug!("📡 RPC call: {}", method);

        let response = self
            .client
            .post(&self.config.url)
            .timeout(timeout.unwrap_or(self.config.timeout))
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;

        if let Some(error) = body.get("error") {
            if !error.is_null() {
                return Err(AppError::rpc_error(format!("{}: {}", method, error)));
            }
        }

        body.get("result")
            .cloned()
            .ok_or_else(|| AppError::rpc_invalid_response(format!("{}: no result field", method)))
    }

    // ============================================
    // STANDARD RPC METHODS
    // ============================================

    /// Get account info, `jsonParsed` encoding. `Ok(None)` means the
    /// account does not exist on-chain.
    pub async fn get_account_info(&self, address: &str) -> AppResult<Option<AccountInfo>> {
        let params = json!([address, {"encoding": "jsonParsed"}]);
        let result = self.call("getAccountInfo", params, None).await?;

        let value = match result.get("value") {
            Some(v) if !v.is_null() => v.clone(),
            _ => return Ok(None),
        };

        let info = serde_json::from_value(value)
            .map_err(|e| AppError::rpc_invalid_response(format!("account info: {}", e)))?;
        Ok(Some(info))
    }

    /// Get the 20 largest token accounts for a mint, descending by balance
    pub async fn get_token_largest_accounts(&self, mint: &str) -> AppResult<Vec<HolderBalance>> {
        let result = self
            .call("getTokenLargestAccounts", json!([mint]), None)
            .await?;

        let holders = result
            .get("value")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        Ok(holders)
    }

    /// Get up to `limit` recent signatures for an address, newest first
    pub async fn get_signatures_for_address(
        &self,
        address: &str,
        limit: usize,
    ) -> AppResult<Vec<SignatureRecord>> {
        let params = json!([address, {"limit": limit}]);
        let result = self.call("getSignaturesForAddress", params, None).await?;

        let records = result
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        Ok(records)
    }

    /// Resolve a transaction signature into the facts the MEV scorer
    /// consumes. `Ok(None)` means the signature is unknown to the chain.
    pub async fn get_transaction(&self, signature: &str) -> AppResult<Option<ResolvedTransaction>> {
        let params = json!([
            signature,
            {"encoding": "jsonParsed", "maxSupportedTransactionVersion": 0}
        ]);
        let result = self.call("getTransaction", params, None).await?;

        if result.is_null() {
            return Ok(None);
        }

        Ok(Some(parse_transaction(signature, &result)))
    }

    // ============================================
    // DAS API
    // ============================================

    /// Get token metadata via the DAS `getAsset` call. `Ok(None)` when the
    /// asset is unknown to the DAS index.
    pub async fn get_asset(&self, mint: &str) -> AppResult<Option<AssetMetadata>> {
        let result = self.call("getAsset", json!({"id": mint}), None).await?;

        if result.is_null() {
            return Ok(None);
        }

        let metadata = result
            .get("content")
            .and_then(|c| c.get("metadata"));

        Ok(Some(AssetMetadata {
            name: metadata
                .and_then(|m| m.get("name"))
                .and_then(|n| n.as_str())
                .map(String::from),
            symbol: metadata
                .and_then(|m| m.get("symbol"))
                .and_then(|s| s.as_str())
                .map(String::from),
            mutable: result
                .get("mutable")
                .and_then(|m| m.as_bool())
                .unwrap_or(true),
        }))
    }
}

/// Flatten a `jsonParsed` getTransaction result into gateway facts
fn parse_transaction(signature: &str, result: &Value) -> ResolvedTransaction {
    let meta = result.get("meta");

    let fee_lamports = meta
        .and_then(|m| m.get("fee"))
        .and_then(|f| f.as_u64())
        .unwrap_or(0);

    let failed = meta
        .and_then(|m| m.get("err"))
        .map(|e| !e.is_null())
        .unwrap_or(false);

    let inner_instruction_count = meta
        .and_then(|m| m.get("innerInstructions"))
        .and_then(|i| i.as_array())
        .map(|groups| {
            groups
                .iter()
                .filter_map(|g| g.get("instructions").and_then(|ix| ix.as_array()))
                .map(|ix| ix.len())
                .sum()
        })
        .unwrap_or(0);

    // Account keys come back as strings (base64) or objects (jsonParsed)
    let program_ids = result
        .get("transaction")
        .and_then(|t| t.get("message"))
        .and_then(|m| m.get("accountKeys"))
        .and_then(|k| k.as_array())
        .map(|keys| {
            keys.iter()
                .filter_map(|k| {
                    k.as_str()
                        .or_else(|| k.get("pubkey").and_then(|p| p.as_str()))
                        .map(String::from)
                })
                .collect()
        })
        .unwrap_or_default();

    ResolvedTransaction {
        signature: signature.to_string(),
        fee_lamports,
        inner_instruction_count,
        program_ids,
        failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transaction_shapes() {
        let raw = json!({
            "meta": {
                "fee": 25000,
                "err": null,
                "innerInstructions": [
                    {"index": 0, "instructions": [{}, {}, {}]},
                    {"index": 1, "instructions": [{}, {}]}
                ]
            },
            "transaction": {
                "message": {
                    "accountKeys": [
                        {"pubkey": "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4"},
                        {"pubkey": "SomeWallet1111111111111111111111111111111111"}
                    ]
                }
            }
        });

        let tx = parse_transaction("sig", &raw);
        assert_eq!(tx.fee_lamports, 25000);
        assert!(!tx.failed);
        assert_eq!(tx.inner_instruction_count, 5);
        assert_eq!(tx.program_ids.len(), 2);
    }

    #[test]
    fn test_parse_failed_transaction() {
        let raw = json!({
            "meta": {"fee": 5000, "err": {"InstructionError": [0, "Custom"]}},
            "transaction": {"message": {"accountKeys": ["Wallet"]}}
        });

        let tx = parse_transaction("sig", &raw);
        assert!(tx.failed);
        assert_eq!(tx.inner_instruction_count, 0);
    }

    #[test]
    fn test_signature_record_failed() {
        let ok: SignatureRecord =
            serde_json::from_value(json!({"signature": "a", "err": null})).unwrap();
        assert!(!ok.failed());

        let bad: SignatureRecord =
            serde_json::from_value(json!({"signature": "b", "err": {"InstructionError": []}}))
                .unwrap();
        assert!(bad.failed());
    }
}
