//! Risk Aggregator
//!
//! Combines three independent detection layers — pattern-match findings,
//! on-chain facts, AI-reported vulnerabilities — into one weighted risk
//! score with grade and confidence, plus a summary and a prioritized,
//! deduplicated remediation list. Every function here is pure: the
//! aggregator never touches the network and is fully deterministic for
//! fixed inputs.
//!
//! The grade on this path comes from the weighted overall score alone.
//! Unlike the single-address analyzer there is no critical/high grade
//! override here.

use chrono::Utc;
use tracing::info;

use crate::models::types::{
    AiVulnerability, AnalysisSummary, AuthorityFact, CombinedAnalysisResult, Grade, LayerResults,
    OnChainFinding, RemediationItem, RiskScore, ScoreBreakdown, SecurityFinding, Severity,
    TokenAnalysisData,
};
use crate::utils::constants::{
    ai_severity_base_score, pattern_severity_score, AI_WEIGHT, ON_CHAIN_CONFIDENCE,
    ON_CHAIN_WEIGHT, PATTERN_DEFAULT_CONFIDENCE, PATTERN_WEIGHT,
};

/// Pattern layer confidence once it has at least one finding
const PATTERN_FINDINGS_CONFIDENCE: u8 = 80;

pub struct RiskAggregator;

impl RiskAggregator {
    /// Build the combined result for one address from the three layers.
    pub fn aggregate(
        address: &str,
        pattern_findings: Vec<SecurityFinding>,
        on_chain: OnChainFinding,
        ai_vulnerabilities: Vec<AiVulnerability>,
    ) -> CombinedAnalysisResult {
        let breakdown = ScoreBreakdown {
            pattern_match: pattern_score(&pattern_findings),
            on_chain: on_chain_score(&on_chain),
            ai_analysis: ai_score(&ai_vulnerabilities),
        };

        let overall = weighted_blend(
            breakdown.pattern_match,
            breakdown.on_chain,
            breakdown.ai_analysis,
        );
        let confidence = weighted_blend(
            pattern_confidence(&pattern_findings),
            ON_CHAIN_CONFIDENCE,
            ai_confidence(&ai_vulnerabilities),
        );

        let risk_score = RiskScore {
            overall,
            confidence,
            breakdown,
            grade: Grade::from_score(overall),
        };

        let all = collect_severities(&pattern_findings, &on_chain, &ai_vulnerabilities);
        let summary = build_summary(&all);
        let remediation = build_remediation(&pattern_findings, &on_chain, &ai_vulnerabilities);

        info!(
            "✅ Aggregated {}: score {} grade {} ({} findings)",
            address,
            overall,
            risk_score.grade.as_str(),
            all.len()
        );

        CombinedAnalysisResult {
            address: address.to_string(),
            timestamp: Utc::now().timestamp_millis(),
            risk_score,
            layers: LayerResults {
                pattern_findings,
                on_chain,
                ai_vulnerabilities,
            },
            summary,
            remediation,
        }
    }
}

/// Convert an analyzer snapshot into the on-chain layer's fact sheet
pub fn on_chain_finding_from(data: &TokenAnalysisData) -> OnChainFinding {
    let mut authorities = Vec::new();

    if let Some(facts) = &data.mint_facts {
        authorities.push(AuthorityFact {
            name: "mint".to_string(),
            address: facts.mint_authority.clone(),
            is_mint_authority: true,
            is_multisig: false,
            is_disabled: facts.mint_authority.is_none(),
        });
        if facts.freeze_authority.is_some() {
            authorities.push(AuthorityFact {
                name: "freeze".to_string(),
                address: facts.freeze_authority.clone(),
                is_mint_authority: false,
                is_multisig: false,
                is_disabled: false,
            });
        }
    }

    if let Some(facts) = &data.program_facts {
        if facts.is_upgradeable {
            authorities.push(AuthorityFact {
                name: "upgrade".to_string(),
                address: facts.upgrade_authority.clone(),
                is_mint_authority: false,
                is_multisig: false,
                is_disabled: false,
            });
        }
    }

    let suspicious_patterns = data
        .activity
        .as_ref()
        .filter(|a| a.failure_rate > 0.30)
        .map(|a| vec![format!("failure rate {:.0}%", a.failure_rate * 100.0)])
        .unwrap_or_default();

    OnChainFinding {
        authorities,
        holder_concentration: data.holders.as_ref().map(|h| h.top_holder_percent),
        age_days: data.activity.as_ref().and_then(|a| a.age_days),
        mutable_metadata: data.metadata.as_ref().map(|m| m.mutable).unwrap_or(false),
        suspicious_patterns,
        unverified_program: false,
        upgradeable_without_timelock: data
            .program_facts
            .as_ref()
            .map(|p| p.is_upgradeable)
            .unwrap_or(false),
    }
}

// ============================================
// PER-LAYER SCORES
// ============================================

/// Pattern layer: fixed severity-score table summed over findings
pub fn pattern_score(findings: &[SecurityFinding]) -> u8 {
    let total: u32 = findings
        .iter()
        .map(|f| pattern_severity_score(f.severity))
        .sum();
    total.min(100) as u8
}

/// On-chain layer: additive contribution rules over the fact sheet
pub fn on_chain_score(finding: &OnChainFinding) -> u8 {
    let mut score: u32 = 0;

    for authority in &finding.authorities {
        // Only live, single-key authorities count
        if authority.address.is_some() && !authority.is_multisig && !authority.is_disabled {
            score += if authority.is_mint_authority { 15 } else { 10 };
        }
    }

    if let Some(concentration) = finding.holder_concentration {
        if concentration > 50.0 {
            score += 15;
        } else if concentration > 25.0 {
            score += 8;
        }
    }

    if let Some(age) = finding.age_days {
        if age < 7.0 {
            score += 10;
        } else if age < 30.0 {
            score += 5;
        }
    }

    if finding.mutable_metadata {
        score += 5;
    }

    score += (finding.suspicious_patterns.len() as u32 * 5).min(15);

    if finding.unverified_program {
        score += 10;
    }
    if finding.upgradeable_without_timelock {
        score += 10;
    }

    score.min(100) as u8
}

/// AI layer: severity base score scaled by the model's own confidence
pub fn ai_score(vulnerabilities: &[AiVulnerability]) -> u8 {
    let total: f64 = vulnerabilities
        .iter()
        .map(|v| ai_severity_base_score(v.severity) * v.confidence.min(100) as f64 / 100.0)
        .sum();
    (total.min(100.0)) as u8
}

fn pattern_confidence(findings: &[SecurityFinding]) -> u8 {
    if findings.is_empty() {
        PATTERN_DEFAULT_CONFIDENCE
    } else {
        PATTERN_FINDINGS_CONFIDENCE
    }
}

fn ai_confidence(vulnerabilities: &[AiVulnerability]) -> u8 {
    if vulnerabilities.is_empty() {
        return 0;
    }
    let total: u32 = vulnerabilities
        .iter()
        .map(|v| v.confidence.min(100) as u32)
        .sum();
    (total / vulnerabilities.len() as u32) as u8
}

/// The fixed 0.25 / 0.45 / 0.30 blend, rounded to the nearest integer
pub fn weighted_blend(pattern: u8, on_chain: u8, ai: u8) -> u8 {
    let blended = pattern as f64 * PATTERN_WEIGHT
        + on_chain as f64 * ON_CHAIN_WEIGHT
        + ai as f64 * AI_WEIGHT;
    blended.round().min(100.0) as u8
}

// ============================================
// SUMMARY
// ============================================

/// Normalized `{name, severity}` view of a finding from any layer
struct NamedFinding {
    name: String,
    severity: Severity,
}

/// Flatten all three layers in pattern -> on-chain -> AI order.
/// On-chain facts become synthetic named findings so the summary counts
/// every layer uniformly.
fn collect_severities(
    pattern_findings: &[SecurityFinding],
    on_chain: &OnChainFinding,
    ai_vulnerabilities: &[AiVulnerability],
) -> Vec<NamedFinding> {
    let mut all: Vec<NamedFinding> = Vec::new();

    for finding in pattern_findings {
        all.push(NamedFinding {
            name: finding.name.clone(),
            severity: finding.severity,
        });
    }

    for finding in on_chain_findings(on_chain) {
        all.push(finding);
    }

    for vulnerability in ai_vulnerabilities {
        all.push(NamedFinding {
            name: vulnerability.name.clone(),
            severity: vulnerability.severity,
        });
    }

    all
}

/// Express the on-chain fact sheet as named findings, mirroring the
/// contribution rules of `on_chain_score`
fn on_chain_findings(finding: &OnChainFinding) -> Vec<NamedFinding> {
    let mut findings = Vec::new();

    for authority in &finding.authorities {
        if authority.address.is_some() && !authority.is_multisig && !authority.is_disabled {
            findings.push(NamedFinding {
                name: format!("Active {} authority", authority.name),
                severity: if authority.is_mint_authority {
                    Severity::Critical
                } else {
                    Severity::High
                },
            });
        }
    }

    if let Some(concentration) = finding.holder_concentration {
        if concentration > 50.0 {
            findings.push(NamedFinding {
                name: "Extreme holder concentration".to_string(),
                severity: Severity::High,
            });
        } else if concentration > 25.0 {
            findings.push(NamedFinding {
                name: "High holder concentration".to_string(),
                severity: Severity::Medium,
            });
        }
    }

    if let Some(age) = finding.age_days {
        if age < 7.0 {
            findings.push(NamedFinding {
                name: "Very recently created".to_string(),
                severity: Severity::Medium,
            });
        } else if age < 30.0 {
            findings.push(NamedFinding {
                name: "Recently created".to_string(),
                severity: Severity::Low,
            });
        }
    }

    if finding.mutable_metadata {
        findings.push(NamedFinding {
            name: "Mutable metadata".to_string(),
            severity: Severity::Medium,
        });
    }

    for pattern in &finding.suspicious_patterns {
        findings.push(NamedFinding {
            name: format!("Suspicious pattern: {}", pattern),
            severity: Severity::Medium,
        });
    }

    if finding.unverified_program {
        findings.push(NamedFinding {
            name: "Unverified program".to_string(),
            severity: Severity::Medium,
        });
    }
    if finding.upgradeable_without_timelock {
        findings.push(NamedFinding {
            name: "Upgradeable without timelock".to_string(),
            severity: Severity::High,
        });
    }

    findings
}

fn build_summary(all: &[NamedFinding]) -> AnalysisSummary {
    let count = |severity: Severity| all.iter().filter(|f| f.severity == severity).count();

    let critical_count = count(Severity::Critical);
    let high_count = count(Severity::High);
    let medium_count = count(Severity::Medium);
    let low_count = count(Severity::Low);

    // Concatenation order, not severity order, within the filter
    let top_risks: Vec<String> = all
        .iter()
        .filter(|f| matches!(f.severity, Severity::Critical | Severity::High))
        .take(5)
        .map(|f| f.name.clone())
        .collect();

    let recommendation = if critical_count > 0 {
        "Critical risks detected. Do not interact with this address until they are resolved."
    } else if high_count > 0 {
        "High risks detected. Proceed only with extreme caution and a small exposure."
    } else if medium_count > 0 {
        "Moderate risks detected. Review each finding before interacting."
    } else if low_count > 0 {
        "Only minor findings. Standard caution applies."
    } else {
        "No risks detected. The address looks clean under all three layers."
    };

    AnalysisSummary {
        critical_count,
        high_count,
        medium_count,
        low_count,
        top_risks,
        recommendation: recommendation.to_string(),
    }
}

// ============================================
// REMEDIATION
// ============================================

/// Flatten, stable-sort by severity rank, number sequentially, then
/// dedupe by case-insensitive issue keeping the first occurrence.
fn build_remediation(
    pattern_findings: &[SecurityFinding],
    on_chain: &OnChainFinding,
    ai_vulnerabilities: &[AiVulnerability],
) -> Vec<RemediationItem> {
    let mut items: Vec<RemediationItem> = Vec::new();

    for finding in pattern_findings {
        items.push(RemediationItem {
            priority: 0,
            severity: finding.severity,
            issue: finding.name.clone(),
            action: finding
                .remediation
                .clone()
                .unwrap_or_else(|| format!("Review and address: {}", finding.description)),
        });
    }

    for finding in on_chain_findings(on_chain) {
        items.push(RemediationItem {
            priority: 0,
            severity: finding.severity,
            action: format!("Resolve on-chain issue: {}", finding.name),
            issue: finding.name,
        });
    }

    for vulnerability in ai_vulnerabilities {
        items.push(RemediationItem {
            priority: 0,
            severity: vulnerability.severity,
            issue: vulnerability.name.clone(),
            action: vulnerability
                .recommendation
                .clone()
                .unwrap_or_else(|| format!("Review and address: {}", vulnerability.description)),
        });
    }

    items.sort_by_key(|item| item.severity.rank());

    for (i, item) in items.iter_mut().enumerate() {
        item.priority = (i + 1) as u32;
    }

    let mut seen: Vec<String> = Vec::new();
    items.retain(|item| {
        let key = item.issue.to_lowercase();
        if seen.contains(&key) {
            false
        } else {
            seen.push(key);
            true
        }
    });

    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(name: &str, severity: Severity) -> SecurityFinding {
        SecurityFinding {
            name: name.to_string(),
            severity,
            description: "d".to_string(),
            remediation: Some(format!("fix {}", name)),
        }
    }

    fn vulnerability(name: &str, severity: Severity, confidence: u8) -> AiVulnerability {
        AiVulnerability {
            name: name.to_string(),
            severity,
            confidence,
            description: "d".to_string(),
            recommendation: None,
        }
    }

    #[test]
    fn test_pattern_score_table_and_clamp() {
        let findings = vec![
            finding("a", Severity::Critical),
            finding("b", Severity::High),
            finding("c", Severity::Medium),
            finding("d", Severity::Low),
        ];
        assert_eq!(pattern_score(&findings), 25 + 15 + 8 + 3);

        let many: Vec<_> = (0..10).map(|i| finding(&i.to_string(), Severity::Critical)).collect();
        assert_eq!(pattern_score(&many), 100);
    }

    #[test]
    fn test_on_chain_authority_rules() {
        let mut finding = OnChainFinding::default();
        finding.authorities = vec![
            AuthorityFact {
                name: "mint".into(),
                address: Some("A".into()),
                is_mint_authority: true,
                is_multisig: false,
                is_disabled: false,
            },
            AuthorityFact {
                name: "freeze".into(),
                address: Some("B".into()),
                is_mint_authority: false,
                is_multisig: false,
                is_disabled: false,
            },
            // Multisig and disabled authorities contribute nothing
            AuthorityFact {
                name: "update".into(),
                address: Some("C".into()),
                is_mint_authority: false,
                is_multisig: true,
                is_disabled: false,
            },
            AuthorityFact {
                name: "old".into(),
                address: Some("D".into()),
                is_mint_authority: true,
                is_multisig: false,
                is_disabled: true,
            },
        ];
        assert_eq!(on_chain_score(&finding), 25);
    }

    #[test]
    fn test_on_chain_concentration_age_and_caps() {
        let finding = OnChainFinding {
            holder_concentration: Some(60.0),
            age_days: Some(3.0),
            mutable_metadata: true,
            suspicious_patterns: vec!["a".into(), "b".into(), "c".into(), "d".into(), "e".into()],
            unverified_program: true,
            upgradeable_without_timelock: true,
            ..Default::default()
        };
        // 15 + 10 + 5 + cap(25 -> 15) + 10 + 10
        assert_eq!(on_chain_score(&finding), 65);

        let moderate = OnChainFinding {
            holder_concentration: Some(30.0),
            age_days: Some(20.0),
            ..Default::default()
        };
        assert_eq!(on_chain_score(&moderate), 13);
    }

    #[test]
    fn test_ai_score_confidence_scaling() {
        let vulnerabilities = vec![
            vulnerability("a", Severity::Critical, 100),
            vulnerability("b", Severity::High, 50),
        ];
        // 30*1.0 + 20*0.5
        assert_eq!(ai_score(&vulnerabilities), 40);
    }

    #[test]
    fn test_weighted_blend_isolates_layers() {
        assert_eq!(weighted_blend(100, 0, 0), 25);
        assert_eq!(weighted_blend(0, 100, 0), 45);
        assert_eq!(weighted_blend(0, 0, 100), 30);
        assert_eq!(weighted_blend(100, 100, 100), 100);
    }

    #[test]
    fn test_grade_has_no_severity_override() {
        // One critical pattern finding alone: 25 * 0.25 = 6 -> grade A
        let result = RiskAggregator::aggregate(
            "Addr",
            vec![finding("rug", Severity::Critical)],
            OnChainFinding::default(),
            vec![],
        );
        assert_eq!(result.risk_score.overall, 6);
        assert_eq!(result.risk_score.grade, Grade::A);
        assert_eq!(result.summary.critical_count, 1);
    }

    #[test]
    fn test_confidence_blend() {
        // No findings anywhere: pattern 50, on-chain 90, ai 0
        let result =
            RiskAggregator::aggregate("Addr", vec![], OnChainFinding::default(), vec![]);
        assert_eq!(result.risk_score.confidence, 53); // 12.5 + 40.5 + 0 rounded

        let with_ai = RiskAggregator::aggregate(
            "Addr",
            vec![],
            OnChainFinding::default(),
            vec![vulnerability("a", Severity::Low, 70)],
        );
        // pattern 50*0.25 + on-chain 90*0.45 + ai 70*0.30 = 74
        assert_eq!(with_ai.risk_score.confidence, 74);
    }

    #[test]
    fn test_top_risks_keep_layer_order() {
        let result = RiskAggregator::aggregate(
            "Addr",
            vec![
                finding("pattern-high", Severity::High),
                finding("pattern-low", Severity::Low),
            ],
            OnChainFinding {
                upgradeable_without_timelock: true,
                ..Default::default()
            },
            vec![vulnerability("ai-critical", Severity::Critical, 90)],
        );

        // Concatenation order within the critical-or-high filter, not
        // sorted by severity
        assert_eq!(
            result.summary.top_risks,
            vec![
                "pattern-high",
                "Upgradeable without timelock",
                "ai-critical"
            ]
        );
    }

    #[test]
    fn test_recommendation_priority() {
        let clean = RiskAggregator::aggregate("A", vec![], OnChainFinding::default(), vec![]);
        assert!(clean.summary.recommendation.contains("clean"));

        let medium = RiskAggregator::aggregate(
            "A",
            vec![finding("x", Severity::Medium)],
            OnChainFinding::default(),
            vec![],
        );
        assert!(medium.summary.recommendation.contains("Moderate"));

        let critical = RiskAggregator::aggregate(
            "A",
            vec![finding("x", Severity::Medium), finding("y", Severity::Critical)],
            OnChainFinding::default(),
            vec![],
        );
        assert!(critical.summary.recommendation.contains("Critical"));
    }

    #[test]
    fn test_remediation_sort_priority_and_dedupe() {
        let result = RiskAggregator::aggregate(
            "Addr",
            vec![
                finding("Low issue", Severity::Low),
                finding("Shared Issue", Severity::High),
            ],
            OnChainFinding::default(),
            vec![vulnerability("shared issue", Severity::Low, 50)],
        );

        // Severity-ordered, sequentially numbered, case-insensitive dedupe
        // keeps the high-severity occurrence
        assert_eq!(result.remediation.len(), 2);
        assert_eq!(result.remediation[0].issue, "Shared Issue");
        assert_eq!(result.remediation[0].priority, 1);
        assert_eq!(result.remediation[0].severity, Severity::High);
        assert_eq!(result.remediation[1].issue, "Low issue");
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let build = || {
            RiskAggregator::aggregate(
                "Addr",
                vec![finding("a", Severity::High)],
                OnChainFinding {
                    holder_concentration: Some(40.0),
                    ..Default::default()
                },
                vec![vulnerability("b", Severity::Medium, 60)],
            )
        };
        let first = build();
        let second = build();
        assert_eq!(first.risk_score.overall, second.risk_score.overall);
        assert_eq!(first.risk_score.confidence, second.risk_score.confidence);
        assert_eq!(first.summary.top_risks, second.summary.top_risks);
    }
}
