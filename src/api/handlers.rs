//! API Request Handlers

use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use super::types::*;
use crate::core::aggregator::{on_chain_finding_from, RiskAggregator};
use crate::core::analyzer::{calculate_risk_score, OnChainAnalyzer};
use crate::core::mev::MevScorer;
use crate::models::config::{RiskThresholds, RpcConfig};
use crate::models::errors::AppResult;
use crate::models::types::{RiskLevel, Severity};
use crate::providers::defillama::{ChainTvl, DefiLlamaClient, DexVolumeOverview, ProtocolTvl};
use crate::providers::helius::HeliusClient;
use crate::providers::jupiter::{JupiterClient, TokenPrice};
use crate::utils::cache::ResponseCache;
use crate::utils::constants::MARKET_FEED_TTL_SECS;
use crate::utils::telemetry::{TelemetryCollector, ThreatKind};

const TOP_PROTOCOL_COUNT: usize = 10;

/// Shared application state
pub struct AppState {
    pub rpc: Arc<HeliusClient>,
    pub defillama: DefiLlamaClient,
    pub jupiter: JupiterClient,
    pub cache: ResponseCache,
    pub telemetry: Arc<TelemetryCollector>,
    pub thresholds: RiskThresholds,
    pub start_time: Instant,
}

impl AppState {
    pub fn new() -> AppResult<Self> {
        Ok(Self {
            rpc: Arc::new(HeliusClient::new(RpcConfig::from_env())?),
            defillama: DefiLlamaClient::new()?,
            jupiter: JupiterClient::new()?,
            cache: ResponseCache::new(),
            telemetry: Arc::new(TelemetryCollector::new()),
            thresholds: RiskThresholds::default(),
            start_time: Instant::now(),
        })
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// Solana addresses are 32-byte base58 strings
fn is_valid_address(address: &str) -> bool {
    (32..=44).contains(&address.len())
        && bs58::decode(address)
            .into_vec()
            .map(|bytes| bytes.len() == 32)
            .unwrap_or(false)
}

fn bad_request(message: impl Into<String>, start: Instant) -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::error(
            ApiError::bad_request(message),
            start.elapsed().as_secs_f64() * 1000.0,
        )),
    )
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        rpc_configured: state.rpc.is_configured(),
    };

    Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    ))
}

// ============================================
// Address Analysis
// ============================================

pub async fn analyze_address(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddressAnalysisRequest>,
) -> Result<Json<ApiResponse<AddressAnalysisData>>, (StatusCode, Json<ApiResponse<()>>)> {
    let start = Instant::now();

    if !is_valid_address(&req.address) {
        return Err(bad_request("Invalid Solana address format", start));
    }

    let analyzer = OnChainAnalyzer::new(state.rpc.clone(), state.thresholds.clone());
    let (data, timeline) = analyzer.analyze(&req.address).await;
    let (score, grade) = calculate_risk_score(&data.indicators);

    record_indicator_telemetry(&state, &data.indicators, start);

    info!(
        "✅ Analyzed {}: {} indicators, score {} grade {}",
        req.address,
        data.indicators.len(),
        score,
        grade.as_str()
    );

    Ok(Json(ApiResponse::success(
        AddressAnalysisData {
            data,
            timeline,
            score,
            grade,
        },
        start.elapsed().as_secs_f64() * 1000.0,
    )))
}

// ============================================
// Full Three-Layer Analysis
// ============================================

pub async fn analyze_full(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FullAnalysisRequest>,
) -> Result<Json<ApiResponse<FullAnalysisData>>, (StatusCode, Json<ApiResponse<()>>)> {
    let start = Instant::now();

    if !is_valid_address(&req.address) {
        return Err(bad_request("Invalid Solana address format", start));
    }

    let analyzer = OnChainAnalyzer::new(state.rpc.clone(), state.thresholds.clone());
    let (data, timeline) = analyzer.analyze(&req.address).await;

    let on_chain = on_chain_finding_from(&data);
    let result = RiskAggregator::aggregate(
        &req.address,
        req.pattern_findings,
        on_chain,
        req.ai_vulnerabilities,
    );

    record_indicator_telemetry(&state, &data.indicators, start);

    Ok(Json(ApiResponse::success(
        FullAnalysisData { result, timeline },
        start.elapsed().as_secs_f64() * 1000.0,
    )))
}

fn record_indicator_telemetry(
    state: &AppState,
    indicators: &[crate::models::types::RiskIndicator],
    start: Instant,
) {
    let latency = start.elapsed().as_millis() as u64;

    let threat = indicators
        .iter()
        .filter(|i| matches!(i.severity, Severity::Critical | Severity::High))
        .map(|i| match i.id.as_str() {
            "account_not_found" => ThreatKind::AccountNotFound,
            "high_concentration" | "moderate_concentration" => ThreatKind::HolderConcentration,
            _ => ThreatKind::AuthorityRisk,
        })
        .next();

    match threat {
        Some(kind) => state.telemetry.record_threat(kind, latency),
        None => state.telemetry.record_analysis(latency),
    }
}

// ============================================
// MEV Analysis
// ============================================

pub async fn mev_analyze(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MevAnalysisRequest>,
) -> Result<Json<ApiResponse<MevAnalysisData>>, (StatusCode, Json<ApiResponse<()>>)> {
    let start = Instant::now();

    if req.transaction.trim().len() < 10 {
        return Err(bad_request(
            "transaction must be at least 10 characters",
            start,
        ));
    }

    let scorer = MevScorer::new(state.rpc.clone());
    let assessment = scorer.assess(&req.transaction).await;

    let latency = start.elapsed().as_millis() as u64;
    match assessment.risk_level {
        RiskLevel::High | RiskLevel::Critical => state
            .telemetry
            .record_threat(ThreatKind::MevExposure, latency),
        _ => state.telemetry.record_analysis(latency),
    }

    Ok(Json(ApiResponse::success(
        MevAnalysisData { assessment },
        start.elapsed().as_secs_f64() * 1000.0,
    )))
}

// ============================================
// Dashboard
// ============================================

pub async fn dashboard(State(state): State<Arc<AppState>>) -> Json<ApiResponse<DashboardData>> {
    let start = Instant::now();
    let ttl = Duration::from_secs(MARKET_FEED_TTL_SECS);

    // All four feeds settle independently; one failing feed renders as
    // null, never a 500
    let (tvl, protocols, volume, price) = tokio::join!(
        state.cache.get_or_fetch("dashboard:tvl", ttl, || async {
            let tvl = state.defillama.solana_tvl().await?;
            Ok(serde_json::to_value(tvl)?)
        }),
        state
            .cache
            .get_or_fetch("dashboard:protocols", ttl, || async {
                let protocols = state
                    .defillama
                    .top_solana_protocols(TOP_PROTOCOL_COUNT)
                    .await?;
                Ok(serde_json::to_value(protocols)?)
            }),
        state.cache.get_or_fetch("dashboard:volume", ttl, || async {
            let volume = state.defillama.solana_dex_volume().await?;
            Ok(serde_json::to_value(volume)?)
        }),
        state
            .cache
            .get_or_fetch("dashboard:sol_price", ttl, || async {
                let price = state.jupiter.price("SOL").await?;
                Ok(serde_json::to_value(price)?)
            }),
    );

    let data = DashboardData {
        solana_tvl: decode_feed::<ChainTvl>(tvl),
        top_protocols: decode_feed::<Vec<ProtocolTvl>>(protocols),
        dex_volume: decode_feed::<DexVolumeOverview>(volume),
        sol_price: decode_feed::<TokenPrice>(price),
        rpc_configured: state.rpc.is_configured(),
    };

    Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    ))
}

fn decode_feed<T: serde::de::DeserializeOwned>(result: AppResult<Value>) -> Option<T> {
    result.ok().and_then(|v| serde_json::from_value(v).ok())
}

// ============================================
// Stats
// ============================================

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StatsData>> {
    let start = Instant::now();

    let data = StatsData {
        telemetry: state.telemetry.get_stats(),
        cache: state.cache.stats(),
        uptime_seconds: state.uptime_seconds(),
        api_version: env!("CARGO_PKG_VERSION").to_string(),
    };

    info!(
        "📊 Cache: {} entries, {:.1}% hit rate ({} hits / {} misses, {} stale serves)",
        data.cache.entries, data.cache.hit_rate, data.cache.hits, data.cache.misses,
        data.cache.stale_serves
    );

    Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_validation() {
        assert!(is_valid_address(
            "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA"
        ));
        assert!(is_valid_address(
            "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4"
        ));

        assert!(!is_valid_address("too-short"));
        assert!(!is_valid_address(""));
        // 0 and O are not in the base58 alphabet
        assert!(!is_valid_address(&"0".repeat(40)));
    }
}
