//! SolSec Library
//!
//! Solana security analysis backend:
//! - On-chain address analyzer (token mints, programs, plain accounts)
//!   with a step-by-step timeline and typed risk indicators
//! - Three-layer risk aggregation (pattern-match / on-chain / AI) into
//!   one weighted score, grade and remediation plan
//! - MEV heuristic scoring for single transactions
//! - Cached gateways to Helius RPC/DAS, DeFiLlama and Jupiter

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use api::{create_router, AppState};
pub use crate::core::{MevScorer, OnChainAnalyzer, RiskAggregator, StepRunner};
pub use models::config::{RiskThresholds, RpcConfig, ServerConfig};
pub use models::errors::{AppError, AppResult, ErrorCode};
pub use models::types::{
    AccountType, CombinedAnalysisResult, Grade, MevRiskAssessment, RiskIndicator, RiskLevel,
    RiskScore, Severity, TokenAnalysisData,
};
pub use providers::{DefiLlamaClient, HeliusClient, JupiterClient};
pub use utils::cache::{CacheStats, ResponseCache};
pub use utils::telemetry::{TelemetryCollector, TelemetryStats, ThreatKind};
