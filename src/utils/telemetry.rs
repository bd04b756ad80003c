//! Telemetry Module
//!
//! Counts analyses and detected threats for the /stats endpoint.
//! No addresses or signatures are stored, only aggregate counters.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Instant;

/// Threat categories tracked across both analysis paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreatKind {
    MevExposure,
    AuthorityRisk,
    HolderConcentration,
    FailedTransaction,
    AccountNotFound,
}

impl ThreatKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatKind::MevExposure => "mev_exposure",
            ThreatKind::AuthorityRisk => "authority_risk",
            ThreatKind::HolderConcentration => "holder_concentration",
            ThreatKind::FailedTransaction => "failed_transaction",
            ThreatKind::AccountNotFound => "account_not_found",
        }
    }
}

/// Aggregate counters, cheap to clone out for serialization
#[derive(Debug, Clone, Default, Serialize)]
pub struct TelemetryStats {
    pub total_analyzed: u64,
    pub total_threats: u64,
    pub threats_by_kind: HashMap<String, u64>,
    pub avg_latency_ms: f64,
}

/// Process-wide telemetry collector, owned by AppState
pub struct TelemetryCollector {
    total_analyzed: AtomicU64,
    total_threats: AtomicU64,
    latency_sum_ms: AtomicU64,
    threats_by_kind: RwLock<HashMap<ThreatKind, u64>>,
    started_at: Instant,
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryCollector {
    pub fn new() -> Self {
        Self {
            total_analyzed: AtomicU64::new(0),
            total_threats: AtomicU64::new(0),
            latency_sum_ms: AtomicU64::new(0),
            threats_by_kind: RwLock::new(HashMap::new()),
            started_at: Instant::now(),
        }
    }

    /// Record one completed analysis
    pub fn record_analysis(&self, latency_ms: u64) {
        self.total_analyzed.fetch_add(1, Ordering::Relaxed);
        self.latency_sum_ms.fetch_add(latency_ms, Ordering::Relaxed);
    }

    /// Record a detected threat (also counts as an analysis)
    pub fn record_threat(&self, kind: ThreatKind, latency_ms: u64) {
        self.record_analysis(latency_ms);
        self.total_threats.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut map) = self.threats_by_kind.write() {
            *map.entry(kind).or_insert(0) += 1;
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn get_stats(&self) -> TelemetryStats {
        let total = self.total_analyzed.load(Ordering::Relaxed);
        let latency_sum = self.latency_sum_ms.load(Ordering::Relaxed);
        let avg_latency_ms = if total > 0 {
            latency_sum as f64 / total as f64
        } else {
            0.0
        };

        let threats_by_kind = self
            .threats_by_kind
            .read()
            .map(|map| {
                map.iter()
                    .map(|(k, v)| (k.as_str().to_string(), *v))
                    .collect()
            })
            .unwrap_or_default();

        TelemetryStats {
            total_analyzed: total,
            total_threats: self.total_threats.load(Ordering::Relaxed),
            threats_by_kind,
            avg_latency_ms,
        }
    }
}
