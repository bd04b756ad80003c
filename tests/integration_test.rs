//! Integration tests for the SolSec scoring pipeline

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use solsec::core::aggregator::{on_chain_finding_from, weighted_blend, RiskAggregator};
use solsec::core::analyzer::{
    calculate_risk_score, concentration_indicator, mint_indicators,
};
use solsec::core::mev::{looks_like_signature, score_fallback, score_resolved};
use solsec::models::config::RiskThresholds;
use solsec::models::types::{
    AiVulnerability, Grade, HolderDistribution, IndicatorCategory, MintFacts, RiskIndicator,
    RiskLevel, SecurityFinding, Severity, TokenAnalysisData, TransactionType,
};
use solsec::providers::helius::ResolvedTransaction;
use solsec::utils::cache::ResponseCache;

const JUPITER_PROGRAM: &str = "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4";

fn indicator(id: &str, severity: Severity) -> RiskIndicator {
    RiskIndicator::new(
        id,
        IndicatorCategory::Authority,
        id,
        severity,
        "value",
        "description",
    )
}

// ============================================
// Analyzer scoring path
// ============================================

#[test]
fn test_score_is_monotonic_in_indicators() {
    let mut indicators = Vec::new();
    let mut previous = 0;

    for severity in [Severity::Low, Severity::Medium, Severity::High, Severity::Critical] {
        indicators.push(indicator("x", severity));
        let (score, _) = calculate_risk_score(&indicators);
        assert!(score >= previous, "adding an indicator must never lower the score");
        previous = score;
    }
}

#[test]
fn test_single_critical_forces_grade_f() {
    // Score stays low (30 + 10*2 = 50) but the critical still forces F
    let mut indicators = vec![indicator("mint_authority_active", Severity::Critical)];
    indicators.extend((0..10).map(|_| indicator("minor", Severity::Low)));

    let (score, grade) = calculate_risk_score(&indicators);
    assert_eq!(score, 50);
    assert_eq!(grade, Grade::F);
}

#[test]
fn test_clean_token_grades_a() {
    let facts = MintFacts {
        decimals: 6,
        supply: 1_000_000.0,
        mint_authority: None,
        freeze_authority: None,
    };
    let indicators = mint_indicators(&facts);
    let (score, grade) = calculate_risk_score(&indicators);

    assert!(score <= 10);
    assert_eq!(grade, Grade::A);
}

#[test]
fn test_concentration_tiers_are_exclusive() {
    let thresholds = RiskThresholds::default();

    // 60% top holder also implies >80% top-10, but only the critical
    // tier fires
    let extreme = HolderDistribution {
        top_holders: vec![],
        top_holder_percent: 60.0,
        top10_percent: 95.0,
    };
    let fired = concentration_indicator(&extreme, &thresholds).unwrap();
    assert_eq!(fired.id, "high_concentration");
    assert_eq!(fired.severity, Severity::Critical);

    let top10_only = HolderDistribution {
        top_holders: vec![],
        top_holder_percent: 20.0,
        top10_percent: 85.0,
    };
    let fired = concentration_indicator(&top10_only, &thresholds).unwrap();
    assert_eq!(fired.id, "top10_concentration");
}

// ============================================
// Aggregator path
// ============================================

#[test]
fn test_layer_weights_isolate() {
    assert_eq!(weighted_blend(100, 0, 0), 25);
    assert_eq!(weighted_blend(0, 100, 0), 45);
    assert_eq!(weighted_blend(0, 0, 100), 30);
}

#[test]
fn test_full_aggregation_of_risky_token() {
    let pattern_findings = vec![SecurityFinding {
        name: "Known rug pattern".to_string(),
        severity: Severity::Critical,
        description: "Bytecode matches a drained pool pattern".to_string(),
        remediation: Some("Do not interact".to_string()),
    }];

    let mut snapshot = TokenAnalysisData::new("Mint1111111111111111111111111111");
    snapshot.mint_facts = Some(MintFacts {
        decimals: 9,
        supply: 1e9,
        mint_authority: Some("Auth111".to_string()),
        freeze_authority: None,
    });
    let on_chain = on_chain_finding_from(&snapshot);

    let ai = vec![AiVulnerability {
        name: "Unchecked authority".to_string(),
        severity: Severity::High,
        confidence: 80,
        description: "Authority can drain the pool".to_string(),
        recommendation: None,
    }];

    let result = RiskAggregator::aggregate(&snapshot.address, pattern_findings, on_chain, ai);

    // pattern 25, on-chain 15 (active mint authority), ai 16
    assert_eq!(result.risk_score.breakdown.pattern_match, 25);
    assert_eq!(result.risk_score.breakdown.on_chain, 15);
    assert_eq!(result.risk_score.breakdown.ai_analysis, 16);
    assert_eq!(result.risk_score.overall, 18); // 6.25 + 6.75 + 4.8 rounded

    // Grade comes from the weighted overall alone on this path
    assert_eq!(result.risk_score.grade, Grade::B);
    assert_eq!(result.summary.critical_count, 2);
    assert!(result.summary.recommendation.contains("Critical"));
    assert!(!result.remediation.is_empty());
    assert_eq!(result.remediation[0].priority, 1);
}

#[test]
fn test_clean_aggregation_grades_a() {
    let snapshot = TokenAnalysisData::new("Mint1111111111111111111111111111");
    let result = RiskAggregator::aggregate(
        &snapshot.address,
        vec![],
        on_chain_finding_from(&snapshot),
        vec![],
    );

    assert_eq!(result.risk_score.overall, 0);
    assert_eq!(result.risk_score.grade, Grade::A);
    assert!(result.summary.top_risks.is_empty());
    assert!(result.remediation.is_empty());
}

// ============================================
// MEV scorer path
// ============================================

fn resolved(fee: u64, inner: usize, programs: Vec<&str>, failed: bool) -> ResolvedTransaction {
    ResolvedTransaction {
        signature: "sig".to_string(),
        fee_lamports: fee,
        inner_instruction_count: inner,
        program_ids: programs.into_iter().map(String::from).collect(),
        failed,
    }
}

#[test]
fn test_jupiter_swap_assessment() {
    let assessment = score_resolved(&resolved(20_000, 6, vec![JUPITER_PROGRAM], false));

    assert_eq!(assessment.risk_score, 70);
    assert_eq!(assessment.risk_level, RiskLevel::High);
    assert_eq!(assessment.transaction_type, TransactionType::Swap);
    assert_eq!(assessment.threats.len(), 3);
}

#[test]
fn test_fee_boundary_is_strict() {
    let at = score_resolved(&resolved(10_000, 0, vec![], false));
    let above = score_resolved(&resolved(10_001, 0, vec![], false));

    assert!(at.threats.iter().all(|t| t.kind != "high_priority_fee"));
    assert!(above.threats.iter().any(|t| t.kind == "high_priority_fee"));
}

#[test]
fn test_mev_scoring_is_idempotent() {
    let tx = resolved(20_000, 6, vec![JUPITER_PROGRAM], true);
    let first = score_resolved(&tx);
    let second = score_resolved(&tx);

    assert_eq!(first.risk_score, second.risk_score);
    assert_eq!(first.risk_level, second.risk_level);
    assert_eq!(first.threats, second.threats);
}

#[test]
fn test_signature_classification_and_fallback() {
    assert!(looks_like_signature(&"3".repeat(88)));
    assert!(!looks_like_signature("raydium swap instruction data"));

    let fallback = score_fallback("raydium swap instruction data");
    assert_eq!(fallback.risk_score, 35);
    assert_eq!(fallback.transaction_type, TransactionType::Unknown);
    assert!(fallback.threats.iter().any(|t| t.kind == "dex_keyword"));
}

// ============================================
// Cache contract
// ============================================

#[tokio::test]
async fn test_cache_coalesces_concurrent_requests() {
    let cache = ResponseCache::new();
    let calls = Arc::new(AtomicU64::new(0));

    let fetch = |cache: ResponseCache, calls: Arc<AtomicU64>| async move {
        cache
            .get_or_fetch("feed:tvl", Duration::from_secs(60), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(40)).await;
                Ok(serde_json::json!({"tvl": 5.2e9}))
            })
            .await
            .unwrap()
    };

    let (a, b, c) = tokio::join!(
        fetch(cache.clone(), calls.clone()),
        fetch(cache.clone(), calls.clone()),
        fetch(cache.clone(), calls.clone()),
    );

    assert_eq!(a, b);
    assert_eq!(b, c);
    assert_eq!(calls.load(Ordering::SeqCst), 1, "one upstream call serves all");
}

#[tokio::test]
async fn test_cache_serves_stale_on_upstream_failure() {
    let cache = ResponseCache::new();

    cache
        .get_or_fetch("feed:price", Duration::from_millis(5), || async {
            Ok(serde_json::json!(142.0))
        })
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;

    let value = cache
        .get_or_fetch("feed:price", Duration::from_millis(5), || async {
            Err(solsec::AppError::rpc_timeout("provider outage"))
        })
        .await
        .unwrap();

    assert_eq!(value, serde_json::json!(142.0));
}
