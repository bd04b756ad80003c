//! DeFiLlama Client
//!
//! Thin REST client for the TVL and DEX-volume feeds shown on the
//! dashboard. Responses are lightly shaped; handlers fetch through the
//! response cache so a provider outage serves stale data instead of
//! breaking the dashboard.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::models::errors::{AppError, AppResult};
use crate::utils::constants::{DEFILLAMA_API, USER_AGENT};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Chain TVL snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainTvl {
    pub name: String,
    pub tvl: f64,
}

/// Protocol TVL snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolTvl {
    pub name: String,
    pub tvl: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, rename = "change_1d")]
    pub change_1d: Option<f64>,
}

/// DEX volume overview for one chain
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexVolumeOverview {
    #[serde(default)]
    pub total24h: Option<f64>,
    #[serde(default)]
    pub total7d: Option<f64>,
    #[serde(default)]
    pub change_1d: Option<f64>,
}

#[derive(Clone)]
pub struct DefiLlamaClient {
    client: reqwest::Client,
    base_url: String,
}

impl DefiLlamaClient {
    pub fn new() -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .gzip(true)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: DEFILLAMA_API.to_string(),
        })
    }

    async fn get_json(&self, path: &str) -> AppResult<serde_json::Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!("📡 DeFiLlama: GET {}", path);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(AppError::defillama_error(format!(
                "HTTP {} from {}",
                response.status(),
                path
            )));
        }

        Ok(response.json().await?)
    }

    /// Current TVL of the Solana chain
    pub async fn solana_tvl(&self) -> AppResult<ChainTvl> {
        let chains = self.get_json("/v2/chains").await?;

        chains
            .as_array()
            .and_then(|arr| {
                arr.iter()
                    .find(|c| c.get("name").and_then(|n| n.as_str()) == Some("Solana"))
            })
            .and_then(|c| {
                Some(ChainTvl {
                    name: "Solana".to_string(),
                    tvl: c.get("tvl")?.as_f64()?,
                })
            })
            .ok_or_else(|| AppError::defillama_error("Solana missing from chain list"))
    }

    /// Top Solana protocols by TVL
    pub async fn top_solana_protocols(&self, limit: usize) -> AppResult<Vec<ProtocolTvl>> {
        let protocols = self.get_json("/protocols").await?;

        let mut result: Vec<ProtocolTvl> = protocols
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter(|p| {
                        p.get("chains")
                            .and_then(|c| c.as_array())
                            .map(|chains| chains.iter().any(|c| c.as_str() == Some("Solana")))
                            .unwrap_or(false)
                    })
                    .filter_map(|p| serde_json::from_value(p.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        result.sort_by(|a, b| b.tvl.partial_cmp(&a.tvl).unwrap_or(std::cmp::Ordering::Equal));
        result.truncate(limit);
        Ok(result)
    }

    /// Aggregate DEX volume on Solana
    pub async fn solana_dex_volume(&self) -> AppResult<DexVolumeOverview> {
        let overview = self
            .get_json("/overview/dexs/solana?excludeTotalDataChart=true")
            .await?;

        serde_json::from_value(overview)
            .map_err(|e| AppError::defillama_error(format!("volume overview: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_overview_parses_partial_payload() {
        let overview: DexVolumeOverview =
            serde_json::from_value(serde_json::json!({"total24h": 1.5e9})).unwrap();
        assert_eq!(overview.total24h, Some(1.5e9));
        assert_eq!(overview.total7d, None);
    }
}
