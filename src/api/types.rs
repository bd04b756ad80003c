//! API Request/Response Types

use serde::{Deserialize, Serialize};

use crate::models::types::{
    AiVulnerability, AnalysisTimeline, CombinedAnalysisResult, Grade, MevRiskAssessment,
    SecurityFinding, TokenAnalysisData,
};
use crate::providers::defillama::{ChainTvl, DexVolumeOverview, ProtocolTvl};
use crate::providers::jupiter::TokenPrice;
use crate::utils::cache::CacheStats;
use crate::utils::telemetry::TelemetryStats;

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// API Error
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
            details: None,
        }
    }
}

// ============================================
// Address Analysis
// ============================================

#[derive(Debug, Deserialize)]
pub struct AddressAnalysisRequest {
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct AddressAnalysisData {
    pub data: TokenAnalysisData,
    pub timeline: AnalysisTimeline,
    pub score: u8,
    pub grade: Grade,
}

// ============================================
// Full Three-Layer Analysis
// ============================================

/// The pattern and AI layers are supplied by external collaborators;
/// the on-chain layer is always derived server-side.
#[derive(Debug, Deserialize)]
pub struct FullAnalysisRequest {
    pub address: String,
    #[serde(default)]
    pub pattern_findings: Vec<SecurityFinding>,
    #[serde(default)]
    pub ai_vulnerabilities: Vec<AiVulnerability>,
}

#[derive(Debug, Serialize)]
pub struct FullAnalysisData {
    pub result: CombinedAnalysisResult,
    pub timeline: AnalysisTimeline,
}

// ============================================
// MEV Analysis
// ============================================

#[derive(Debug, Deserialize)]
pub struct MevAnalysisRequest {
    /// Transaction signature or raw payload, min 10 chars
    pub transaction: String,
}

#[derive(Debug, Serialize)]
pub struct MevAnalysisData {
    pub assessment: MevRiskAssessment,
}

// ============================================
// Dashboard
// ============================================

/// Market feeds for the dashboard. Every field is nullable: a feed that
/// failed (and had no stale cache entry) renders as null, never a 500.
#[derive(Debug, Serialize)]
pub struct DashboardData {
    pub solana_tvl: Option<ChainTvl>,
    pub top_protocols: Option<Vec<ProtocolTvl>>,
    pub dex_volume: Option<DexVolumeOverview>,
    pub sol_price: Option<TokenPrice>,
    pub rpc_configured: bool,
}

// ============================================
// Stats / Health
// ============================================

#[derive(Debug, Serialize)]
pub struct StatsData {
    pub telemetry: TelemetryStats,
    pub cache: CacheStats,
    pub uptime_seconds: u64,
    pub api_version: String,
}

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub rpc_configured: bool,
}
