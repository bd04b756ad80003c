//! MEV Heuristic Scorer
//!
//! Independent single-transaction scoring path: classify the input as a
//! real signature (resolved via the RPC gateway) or a raw payload
//! (text heuristics only), accumulate threat scores, and map the clamped
//! total to a risk level. The scoring itself is a pure function of the
//! resolved facts; only signature resolution touches the network.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use crate::models::types::{
    MevOnChainData, MevRiskAssessment, MevThreat, RiskLevel, Severity, TransactionType,
};
use crate::providers::helius::{HeliusClient, ResolvedTransaction};
use crate::utils::constants::{dex_program_name, DEX_KEYWORDS};

const BASE_SCORE: u32 = 10;
const HIGH_FEE_LAMPORTS: u64 = 10_000;
const COMPLEX_INNER_INSTRUCTIONS: usize = 5;
const LARGE_PAYLOAD_CHARS: usize = 500;

pub struct MevScorer {
    rpc: Arc<HeliusClient>,
}

impl MevScorer {
    pub fn new(rpc: Arc<HeliusClient>) -> Self {
        Self { rpc }
    }

    /// Assess one transaction input: a signature-shaped string is
    /// resolved on-chain first; anything else (including a signature the
    /// chain does not know) goes through the text fallback.
    pub async fn assess(&self, input: &str) -> MevRiskAssessment {
        let input = input.trim();

        if looks_like_signature(input) {
            debug!("🔑 MEV input classified as signature");
            match self.rpc.get_transaction(input).await {
                Ok(Some(tx)) => {
                    let assessment = score_resolved(&tx);
                    info!(
                        "✅ MEV assessment for {}: score {} ({})",
                        input,
                        assessment.risk_score,
                        assessment.risk_level.as_str()
                    );
                    return assessment;
                }
                Ok(None) => debug!("📭 Signature unknown to the chain, using fallback"),
                Err(err) => debug!("⚠️ Transaction lookup failed ({}), using fallback", err),
            }
        }

        score_fallback(input)
    }
}

/// Base58 strings of 87-88 chars are Solana transaction signatures
pub fn looks_like_signature(input: &str) -> bool {
    (87..=88).contains(&input.len()) && bs58::decode(input).into_vec().is_ok()
}

/// Score a chain-resolved transaction. Deterministic.
pub fn score_resolved(tx: &ResolvedTransaction) -> MevRiskAssessment {
    let mut score = BASE_SCORE;
    let mut threats = Vec::new();
    let mut recommendations = Vec::new();

    let dex = tx
        .program_ids
        .iter()
        .find_map(|id| dex_program_name(id).map(|name| (id.clone(), name)));

    let transaction_type = if let Some((_, name)) = &dex {
        score += 30;
        threats.push(MevThreat {
            kind: "dex_swap".to_string(),
            severity: Severity::Medium,
            description: format!("Transaction interacts with {} — swaps are prime sandwich targets", name),
        });
        recommendations.push("Use tight slippage limits and a private mempool RPC for swaps".to_string());
        TransactionType::Swap
    } else {
        recommendations.push(
            "Transfer-only transaction: low MEV exposure, no special precautions needed"
                .to_string(),
        );
        TransactionType::Transfer
    };

    if tx.fee_lamports > HIGH_FEE_LAMPORTS {
        score += 15;
        threats.push(MevThreat {
            kind: "high_priority_fee".to_string(),
            severity: Severity::Medium,
            description: format!(
                "Priority fee of {} lamports signals a contested block position",
                tx.fee_lamports
            ),
        });
    }

    if tx.inner_instruction_count > COMPLEX_INNER_INSTRUCTIONS {
        score += 15;
        threats.push(MevThreat {
            kind: "complex_swap".to_string(),
            severity: Severity::Medium,
            description: format!(
                "{} inner instructions indicate a multi-hop route with more extraction surface",
                tx.inner_instruction_count
            ),
        });
    }

    if tx.failed {
        score += 20;
        threats.push(MevThreat {
            kind: "transaction_failed".to_string(),
            severity: Severity::High,
            description: "Transaction failed on-chain, consistent with a front-run or sandwich"
                .to_string(),
        });
        recommendations.push("Investigate why the transaction failed before retrying".to_string());
    }

    finish(
        score,
        threats,
        recommendations,
        transaction_type,
        MevOnChainData {
            signature: Some(tx.signature.clone()),
            fee_lamports: Some(tx.fee_lamports),
            inner_instruction_count: Some(tx.inner_instruction_count),
            dex_program: dex.map(|(id, _)| id),
            failed: tx.failed,
            resolved: true,
        },
    )
}

/// Text-heuristic path for raw payloads and unresolvable signatures.
/// Deterministic.
pub fn score_fallback(input: &str) -> MevRiskAssessment {
    let mut score = BASE_SCORE;
    let mut threats = Vec::new();
    let recommendations =
        vec!["Submit a confirmed signature for a full on-chain assessment".to_string()];

    let lowered = input.to_lowercase();
    if DEX_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        score += 25;
        threats.push(MevThreat {
            kind: "dex_keyword".to_string(),
            severity: Severity::Medium,
            description: "Payload references a known DEX, suggesting swap activity".to_string(),
        });
    }

    if input.len() > LARGE_PAYLOAD_CHARS {
        score += 10;
        threats.push(MevThreat {
            kind: "large_payload".to_string(),
            severity: Severity::Low,
            description: "Large payload suggests a complex multi-instruction transaction"
                .to_string(),
        });
    }

    finish(
        score,
        threats,
        recommendations,
        TransactionType::Unknown,
        MevOnChainData::default(),
    )
}

fn finish(
    score: u32,
    mut threats: Vec<MevThreat>,
    recommendations: Vec<String>,
    transaction_type: TransactionType,
    on_chain_data: MevOnChainData,
) -> MevRiskAssessment {
    if threats.is_empty() {
        threats.push(MevThreat {
            kind: "none".to_string(),
            severity: Severity::Low,
            description: "No MEV threat patterns detected".to_string(),
        });
    }

    let risk_score = score.min(100) as u8;

    MevRiskAssessment {
        risk_score,
        risk_level: RiskLevel::from_score(risk_score),
        threats,
        recommendations,
        transaction_type,
        on_chain_data,
        analyzed_at: Utc::now().timestamp_millis(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JUPITER: &str = "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4";

    fn tx(fee: u64, inner: usize, programs: Vec<&str>, failed: bool) -> ResolvedTransaction {
        ResolvedTransaction {
            signature: "sig".to_string(),
            fee_lamports: fee,
            inner_instruction_count: inner,
            program_ids: programs.into_iter().map(String::from).collect(),
            failed,
        }
    }

    #[test]
    fn test_signature_shape_detection() {
        let signature = "5".repeat(88);
        assert!(looks_like_signature(&signature));
        assert!(looks_like_signature(&"4".repeat(87)));

        assert!(!looks_like_signature("raydium swap payload"));
        assert!(!looks_like_signature(&"5".repeat(60)));
        // Right length but not base58 (0, O, I, l are excluded)
        assert!(!looks_like_signature(&"0".repeat(88)));
    }

    #[test]
    fn test_plain_transfer_scores_base() {
        let assessment = score_resolved(&tx(5_000, 0, vec!["SomeWallet"], false));
        assert_eq!(assessment.risk_score, 10);
        assert_eq!(assessment.risk_level, RiskLevel::Low);
        assert_eq!(assessment.transaction_type, TransactionType::Transfer);
        assert_eq!(assessment.threats.len(), 1);
        assert_eq!(assessment.threats[0].kind, "none");
        assert!(assessment.on_chain_data.resolved);
    }

    #[test]
    fn test_jupiter_swap_scenario() {
        // DEX +30, fee +15, inner instructions +15 on base 10
        let assessment = score_resolved(&tx(20_000, 6, vec![JUPITER, "Wallet"], false));
        assert_eq!(assessment.risk_score, 70);
        assert_eq!(assessment.risk_level, RiskLevel::High);
        assert_eq!(assessment.transaction_type, TransactionType::Swap);
        assert_eq!(assessment.threats.len(), 3);
        assert_eq!(assessment.on_chain_data.dex_program.as_deref(), Some(JUPITER));
    }

    #[test]
    fn test_fee_threshold_is_strict() {
        let at_threshold = score_resolved(&tx(10_000, 0, vec![], false));
        assert!(at_threshold
            .threats
            .iter()
            .all(|t| t.kind != "high_priority_fee"));

        let above = score_resolved(&tx(10_001, 0, vec![], false));
        assert!(above.threats.iter().any(|t| t.kind == "high_priority_fee"));
        assert_eq!(above.risk_score, at_threshold.risk_score + 15);
    }

    #[test]
    fn test_inner_instruction_threshold_is_strict() {
        let at = score_resolved(&tx(0, 5, vec![], false));
        assert!(at.threats.iter().all(|t| t.kind != "complex_swap"));

        let above = score_resolved(&tx(0, 6, vec![], false));
        assert!(above.threats.iter().any(|t| t.kind == "complex_swap"));
    }

    #[test]
    fn test_failed_transaction_threat() {
        let assessment = score_resolved(&tx(5_000, 0, vec![], true));
        assert_eq!(assessment.risk_score, 30);
        let failed = assessment
            .threats
            .iter()
            .find(|t| t.kind == "transaction_failed")
            .unwrap();
        assert_eq!(failed.severity, Severity::High);
    }

    #[test]
    fn test_all_threats_stack() {
        let assessment = score_resolved(&tx(1_000_000, 50, vec![JUPITER], true));
        assert_eq!(assessment.risk_score, 90); // 10+30+15+15+20
        assert_eq!(assessment.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn test_fallback_keyword_and_length() {
        let assessment = score_fallback("raydium swap via route");
        assert_eq!(assessment.risk_score, 35);
        assert_eq!(assessment.transaction_type, TransactionType::Unknown);
        assert!(!assessment.on_chain_data.resolved);

        let long_payload = format!("jupiter {}", "x".repeat(600));
        let assessment = score_fallback(&long_payload);
        assert_eq!(assessment.risk_score, 45);
        assert_eq!(assessment.threats.len(), 2);

        let boring = score_fallback("hello world");
        assert_eq!(boring.risk_score, 10);
        assert_eq!(boring.threats[0].kind, "none");
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let transaction = tx(20_000, 6, vec![JUPITER], false);
        let first = score_resolved(&transaction);
        let second = score_resolved(&transaction);
        assert_eq!(first.risk_score, second.risk_score);
        assert_eq!(first.threats, second.threats);
    }
}
