//! Type definitions for the security analysis pipeline
//! All core data structures: risk indicators, analysis timeline,
//! account snapshots, layer findings, combined scores, MEV assessments.

use serde::{Deserialize, Serialize};

// ============================================
// SEVERITY & RISK LEVEL
// ============================================

/// Severity of a single finding or indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Score contribution of one indicator of this severity
    pub fn weight(&self) -> u32 {
        match self {
            Severity::Critical => 30,
            Severity::High => 20,
            Severity::Medium => 10,
            Severity::Low => 2,
        }
    }

    /// Sort rank: critical first
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 1,
            Severity::High => 2,
            Severity::Medium => 3,
            Severity::Low => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

/// Risk level classification for MEV assessments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Map a clamped 0-100 score to a level
    pub fn from_score(score: u8) -> Self {
        match score {
            76..=100 => RiskLevel::Critical,
            51..=75 => RiskLevel::High,
            26..=50 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

// ============================================
// RISK INDICATORS (on-chain analyzer output)
// ============================================

/// Which aspect of an address an indicator describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorCategory {
    Authority,
    Holder,
    Activity,
    Metadata,
    Program,
}

/// A single typed finding about one aspect of an address.
/// Immutable once created; appended to the per-run list in check order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskIndicator {
    pub id: String,
    pub category: IndicatorCategory,
    pub name: String,
    pub severity: Severity,
    pub value: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl RiskIndicator {
    pub fn new(
        id: impl Into<String>,
        category: IndicatorCategory,
        name: impl Into<String>,
        severity: Severity,
        value: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            name: name.into(),
            severity,
            value: value.into(),
            description: description.into(),
            remediation: None,
        }
    }

    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }
}

// ============================================
// ANALYSIS TIMELINE
// ============================================

/// Lifecycle of one analysis step.
/// A step transitions pending -> running -> {complete|error} exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Complete,
    Error,
}

/// One timed step of an analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisStep {
    pub id: String,
    pub name: String,
    pub status: StepStatus,
    /// Unix millis
    pub started_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Ordered step log for one analysis request.
/// Insertion order = execution order = display order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisTimeline {
    pub steps: Vec<AnalysisStep>,
    pub started_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration_ms: Option<u64>,
}

// ============================================
// ACCOUNT SNAPSHOT
// ============================================

/// Account classification, decided once per run from the first
/// successful account-info fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Token,
    Program,
    Account,
    Unknown,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Token => "token",
            AccountType::Program => "program",
            AccountType::Account => "account",
            AccountType::Unknown => "unknown",
        }
    }
}

/// Mint facts extracted from a token mint account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintFacts {
    pub decimals: u8,
    /// Supply formatted by decimals
    pub supply: f64,
    pub mint_authority: Option<String>,
    pub freeze_authority: Option<String>,
}

/// Metadata facts from the DAS layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenMetadataFacts {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub mutable: bool,
}

/// One holder in the distribution, ranked 1-based by descending balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopHolder {
    pub rank: u32,
    pub address: String,
    pub balance: f64,
    /// Share of formatted supply, percent
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolderDistribution {
    pub top_holders: Vec<TopHolder>,
    pub top_holder_percent: f64,
    pub top10_percent: f64,
}

/// Recent activity stats over up to 100 signatures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityStats {
    pub recent_tx_count: usize,
    pub failed_tx_count: usize,
    /// failed / total, 0.0-1.0
    pub failure_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_days: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<i64>,
}

/// Program-specific facts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramFacts {
    pub upgrade_authority: Option<String>,
    pub is_upgradeable: bool,
}

/// Per-address snapshot produced by the on-chain analyzer.
/// The indicator list accumulates monotonically during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenAnalysisData {
    pub address: String,
    pub account_type: AccountType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mint_facts: Option<MintFacts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TokenMetadataFacts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holders: Option<HolderDistribution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<ActivityStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program_facts: Option<ProgramFacts>,
    pub indicators: Vec<RiskIndicator>,
}

impl TokenAnalysisData {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            account_type: AccountType::Unknown,
            mint_facts: None,
            metadata: None,
            holders: None,
            activity: None,
            program_facts: None,
            indicators: Vec::new(),
        }
    }
}

// ============================================
// LAYER FINDINGS
// ============================================

/// Pattern-match layer finding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityFinding {
    pub name: String,
    pub severity: Severity,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

/// Authority fact consumed by the on-chain layer of the aggregator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorityFact {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub is_mint_authority: bool,
    #[serde(default)]
    pub is_multisig: bool,
    #[serde(default)]
    pub is_disabled: bool,
}

/// On-chain layer input: facts the aggregator turns into a score
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OnChainFinding {
    #[serde(default)]
    pub authorities: Vec<AuthorityFact>,
    /// Top holder share in percent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder_concentration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_days: Option<f64>,
    #[serde(default)]
    pub mutable_metadata: bool,
    #[serde(default)]
    pub suspicious_patterns: Vec<String>,
    #[serde(default)]
    pub unverified_program: bool,
    #[serde(default)]
    pub upgradeable_without_timelock: bool,
}

/// AI layer vulnerability (opaque collaborator output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiVulnerability {
    pub name: String,
    pub severity: Severity,
    /// 0-100, scales the severity base score
    pub confidence: u8,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

// ============================================
// COMBINED RISK SCORE
// ============================================

/// Letter grade under a severity-aware threshold policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }

    /// Grade purely from a numeric 0-100 score, no severity override
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=10 => Grade::A,
            11..=25 => Grade::B,
            26..=50 => Grade::C,
            _ => Grade::D,
        }
    }
}

/// Per-layer score breakdown. An explicit record with exactly the three
/// layers so the weighting formula stays compile-time checkable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub pattern_match: u8,
    pub on_chain: u8,
    pub ai_analysis: u8,
}

/// Derived risk score, recomputed per request and never stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskScore {
    pub overall: u8,
    pub confidence: u8,
    pub breakdown: ScoreBreakdown,
    pub grade: Grade,
}

// ============================================
// COMBINED ANALYSIS RESULT
// ============================================

/// Counts and highlights across all three layers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub critical_count: usize,
    pub high_count: usize,
    pub medium_count: usize,
    pub low_count: usize,
    /// First 5 critical-or-high finding names in layer order
    pub top_risks: Vec<String>,
    pub recommendation: String,
}

/// One prioritized remediation action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationItem {
    pub priority: u32,
    pub severity: Severity,
    pub issue: String,
    pub action: String,
}

/// Raw layer results carried alongside the combined score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerResults {
    pub pattern_findings: Vec<SecurityFinding>,
    pub on_chain: OnChainFinding,
    pub ai_vulnerabilities: Vec<AiVulnerability>,
}

/// Fully immutable result of one combined three-layer analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedAnalysisResult {
    pub address: String,
    pub timestamp: i64,
    pub risk_score: RiskScore,
    pub layers: LayerResults,
    pub summary: AnalysisSummary,
    pub remediation: Vec<RemediationItem>,
}

// ============================================
// MEV ASSESSMENT
// ============================================

/// One detected MEV-related threat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MevThreat {
    pub kind: String,
    pub severity: Severity,
    pub description: String,
}

/// Transaction classification for the MEV path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Swap,
    Transfer,
    Unknown,
}

/// Facts resolved from the chain for a real signature
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MevOnChainData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_lamports: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner_instruction_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dex_program: Option<String>,
    pub failed: bool,
    pub resolved: bool,
}

/// Result of the single-transaction MEV heuristic path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MevRiskAssessment {
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub threats: Vec<MevThreat>,
    pub recommendations: Vec<String>,
    pub transaction_type: TransactionType,
    pub on_chain_data: MevOnChainData,
    pub analyzed_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_weights() {
        assert_eq!(Severity::Critical.weight(), 30);
        assert_eq!(Severity::High.weight(), 20);
        assert_eq!(Severity::Medium.weight(), 10);
        assert_eq!(Severity::Low.weight(), 2);
    }

    #[test]
    fn test_risk_level_thresholds() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(25), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(26), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(51), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(76), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(100), RiskLevel::Critical);
    }

    #[test]
    fn test_grade_from_score() {
        assert_eq!(Grade::from_score(10), Grade::A);
        assert_eq!(Grade::from_score(11), Grade::B);
        assert_eq!(Grade::from_score(25), Grade::B);
        assert_eq!(Grade::from_score(26), Grade::C);
        assert_eq!(Grade::from_score(50), Grade::C);
        assert_eq!(Grade::from_score(51), Grade::D);
    }
}
