//! Configuration module
//!
//! Env-driven RPC configuration plus the risk threshold table.
//! Threshold values are configuration constants, not derived formulas;
//! they live here so no other module hardcodes them.

use std::time::Duration;
use tracing::info;

use crate::utils::constants::{DEFAULT_RPC_TIMEOUT_SECS, PUBLIC_RPC_FALLBACK};

/// RPC gateway configuration.
///
/// When no Helius key is present the client degrades to the public
/// fallback endpoint and `is_configured()` reports false; callers must
/// check that flag before assuming on-chain enrichment is available.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl RpcConfig {
    /// Build from environment. The key itself is never logged.
    pub fn from_env() -> Self {
        let api_key = std::env::var("HELIUS_API_KEY")
            .ok()
            .filter(|k| !k.is_empty() && k != "YOUR_API_KEY");

        let url = std::env::var("HELIUS_RPC_URL").ok().unwrap_or_else(|| {
            match &api_key {
                Some(key) => {
                    info!("🔑 HELIUS_API_KEY configured (key hidden)");
                    format!("https://mainnet.helius-rpc.com/?api-key={}", key)
                }
                None => {
                    info!("📭 HELIUS_API_KEY not set, using public RPC fallback");
                    PUBLIC_RPC_FALLBACK.to_string()
                }
            }
        });

        Self {
            url,
            api_key,
            timeout: Duration::from_secs(DEFAULT_RPC_TIMEOUT_SECS),
        }
    }

    /// True only when a dedicated API key is present
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Risk threshold table shared by the analyzer, aggregator and MEV scorer
#[derive(Debug, Clone)]
pub struct RiskThresholds {
    /// Top-holder share above which concentration is critical (percent)
    pub top_holder_critical_pct: f64,
    /// Top-holder share above which concentration is high (percent)
    pub top_holder_high_pct: f64,
    /// Top-10 aggregate share above which concentration is medium (percent)
    pub top10_medium_pct: f64,
    /// Failure rate above which activity is flagged (0.0-1.0)
    pub failure_rate_flag: f64,
    /// Account younger than this is flagged (days)
    pub young_account_days: f64,
    /// Program with fewer recent signatures than this is "low usage"
    pub min_program_signatures: usize,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            top_holder_critical_pct: 50.0,
            top_holder_high_pct: 25.0,
            top10_medium_pct: 80.0,
            failure_rate_flag: 0.30,
            young_account_days: 7.0,
            min_program_signatures: 10,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let host = std::env::var("SOLSEC_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("PORT")
            .or_else(|_| std::env::var("SOLSEC_PORT"))
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        Self { host, port }
    }
}
