//! On-Chain Analyzer
//!
//! Orchestrates a sequence of timed analysis steps against one address:
//! classify the account (token mint / program / plain account), extract
//! authority, holder, activity and program facts, and emit typed risk
//! indicators. Steps run strictly in order because later steps depend on
//! facts from earlier ones (decimals are needed to weigh holder
//! balances); any single step may fail without aborting the run.
//!
//! Indicator order reflects check order, not severity order. Scoring is
//! a pure function of the final indicator list.

use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::core::steps::StepRunner;
use crate::models::config::RiskThresholds;
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{
    AccountType, ActivityStats, AnalysisTimeline, Grade, HolderDistribution, IndicatorCategory,
    MintFacts, ProgramFacts, RiskIndicator, Severity, TokenAnalysisData, TokenMetadataFacts,
    TopHolder,
};
use crate::providers::helius::{AccountInfo, HeliusClient, SignatureRecord};
use crate::utils::constants::{is_loader_program, MAX_SIGNATURE_FETCH};

pub struct OnChainAnalyzer {
    rpc: Arc<HeliusClient>,
    thresholds: RiskThresholds,
}

impl OnChainAnalyzer {
    pub fn new(rpc: Arc<HeliusClient>, thresholds: RiskThresholds) -> Self {
        Self { rpc, thresholds }
    }

    /// Analyze one address into a snapshot + step timeline.
    /// Never fails at the run level: a missing account yields a
    /// well-formed result carrying an "account not found" indicator.
    pub async fn analyze(&self, address: &str) -> (TokenAnalysisData, AnalysisTimeline) {
        let mut runner = StepRunner::new();
        let mut data = TokenAnalysisData::new(address);

        info!("🔍 Analyzing address {}", address);

        let account = runner
            .run(
                "account_info",
                "Fetch account info",
                self.rpc.get_account_info(address),
            )
            .await
            .flatten();

        // Terminal short-circuit: nothing on-chain, nothing more to check
        let account = match account {
            Some(account) => account,
            None => {
                data.account_type = AccountType::Unknown;
                data.indicators.push(
                    RiskIndicator::new(
                        "account_not_found",
                        IndicatorCategory::Activity,
                        "Account not found",
                        Severity::High,
                        "missing",
                        "The address does not exist on-chain or has been closed",
                    )
                    .with_remediation("Verify the address before interacting with it"),
                );
                return (data, runner.finalize());
            }
        };

        // Account type is decided once from the first successful fetch
        data.account_type = classify_account(&account);

        match data.account_type {
            AccountType::Token => self.analyze_token(&mut runner, &mut data, &account).await,
            AccountType::Program => self.analyze_program(&mut runner, &mut data, &account).await,
            _ => {
                data.indicators.push(RiskIndicator::new(
                    "plain_account",
                    IndicatorCategory::Activity,
                    "Plain account",
                    Severity::Low,
                    "account",
                    "Address is a regular account, not a token mint or program",
                ));
            }
        }

        (data, runner.finalize())
    }

    /// Token path: mint facts, metadata, holder distribution, activity
    async fn analyze_token(
        &self,
        runner: &mut StepRunner,
        data: &mut TokenAnalysisData,
        account: &AccountInfo,
    ) {
        let mint_facts = runner
            .run("mint_facts", "Extract mint facts", async {
                parse_mint_facts(account)
            })
            .await;

        if let Some(facts) = &mint_facts {
            data.indicators.extend(mint_indicators(facts));
        }

        let metadata = runner
            .run("metadata", "Fetch token metadata", async {
                self.rpc
                    .get_asset(&data.address)
                    .await?
                    .ok_or_else(|| AppError::step_failed("metadata", "asset not indexed"))
            })
            .await;

        if let Some(asset) = metadata {
            let facts = TokenMetadataFacts {
                name: asset.name,
                symbol: asset.symbol,
                mutable: asset.mutable,
            };
            if facts.mutable {
                data.indicators.push(
                    RiskIndicator::new(
                        "mutable_metadata",
                        IndicatorCategory::Metadata,
                        "Mutable metadata",
                        Severity::Medium,
                        "mutable",
                        "Token metadata can still be changed by its update authority",
                    )
                    .with_remediation("Make metadata immutable once the token is finalized"),
                );
            }
            data.metadata = Some(facts);
        }

        // Holder shares need the formatted supply from the mint facts
        if let Some(facts) = &mint_facts {
            let supply = facts.supply;
            let holders = runner
                .run("holders", "Fetch largest holders", async {
                    let balances = self.rpc.get_token_largest_accounts(&data.address).await?;
                    Ok(build_holder_distribution(&balances, supply))
                })
                .await;

            if let Some(distribution) = holders {
                if let Some(indicator) =
                    concentration_indicator(&distribution, &self.thresholds)
                {
                    data.indicators.push(indicator);
                }
                data.holders = Some(distribution);
            }
        }

        let activity = runner
            .run("activity", "Fetch recent activity", async {
                let signatures = self
                    .rpc
                    .get_signatures_for_address(&data.address, MAX_SIGNATURE_FETCH)
                    .await?;
                Ok(build_activity_stats(&signatures))
            })
            .await;

        if let Some(stats) = activity {
            data.indicators
                .extend(activity_indicators(&stats, &self.thresholds));
            data.activity = Some(stats);
        }

        data.mint_facts = mint_facts;
    }

    /// Program path: upgrade authority, then usage stats
    async fn analyze_program(
        &self,
        runner: &mut StepRunner,
        data: &mut TokenAnalysisData,
        account: &AccountInfo,
    ) {
        let program_facts = runner
            .run("program_info", "Check upgrade authority", async {
                self.fetch_program_facts(account).await
            })
            .await;

        if let Some(facts) = program_facts {
            if facts.is_upgradeable {
                data.indicators.push(
                    RiskIndicator::new(
                        "upgradeable_program",
                        IndicatorCategory::Program,
                        "Upgradeable program",
                        Severity::High,
                        facts.upgrade_authority.clone().unwrap_or_default(),
                        "Program code can be replaced by its upgrade authority",
                    )
                    .with_remediation(
                        "Transfer the upgrade authority to a multisig or burn it",
                    ),
                );
            } else {
                data.indicators.push(RiskIndicator::new(
                    "immutable_program",
                    IndicatorCategory::Program,
                    "Immutable program",
                    Severity::Low,
                    "immutable",
                    "Program has no upgrade authority and cannot be changed",
                ));
            }
            data.program_facts = Some(facts);
        }

        let activity = runner
            .run("program_activity", "Fetch usage stats", async {
                let signatures = self
                    .rpc
                    .get_signatures_for_address(&data.address, MAX_SIGNATURE_FETCH)
                    .await?;
                Ok(build_activity_stats(&signatures))
            })
            .await;

        if let Some(stats) = activity {
            if stats.failure_rate > self.thresholds.failure_rate_flag {
                data.indicators.push(RiskIndicator::new(
                    "high_failure_rate",
                    IndicatorCategory::Activity,
                    "High failure rate",
                    Severity::Medium,
                    format!("{:.0}%", stats.failure_rate * 100.0),
                    "A large share of recent transactions against this program failed",
                ));
            }
            if stats.recent_tx_count < self.thresholds.min_program_signatures {
                data.indicators.push(RiskIndicator::new(
                    "low_usage",
                    IndicatorCategory::Activity,
                    "Low usage",
                    Severity::Medium,
                    stats.recent_tx_count.to_string(),
                    "Program has very little recent activity",
                ));
            }
            data.activity = Some(stats);
        }
    }

    async fn fetch_program_facts(&self, account: &AccountInfo) -> AppResult<ProgramFacts> {
        // Upgradeable-loader programs point at a separate program-data
        // account holding the authority
        let program_data_address = account
            .parsed_info()
            .and_then(|info| info.get("programData"))
            .and_then(|p| p.as_str())
            .map(String::from);

        let Some(program_data_address) = program_data_address else {
            return Ok(ProgramFacts {
                upgrade_authority: None,
                is_upgradeable: false,
            });
        };

        let program_data = self
            .rpc
            .get_account_info(&program_data_address)
            .await?
            .ok_or_else(|| AppError::step_failed("program_info", "program-data account missing"))?;

        let authority = program_data
            .parsed_info()
            .and_then(|info| info.get("authority"))
            .and_then(|a| a.as_str())
            .map(String::from);

        Ok(ProgramFacts {
            is_upgradeable: authority.is_some(),
            upgrade_authority: authority,
        })
    }
}

// ============================================
// CLASSIFICATION & FACT EXTRACTION (pure)
// ============================================

/// Classify from parsed account info: mint data wins, then loader
/// ownership or the executable flag, else a plain account.
fn classify_account(account: &AccountInfo) -> AccountType {
    if account.parsed_type() == Some("mint") {
        AccountType::Token
    } else if account.executable || is_loader_program(&account.owner) {
        AccountType::Program
    } else {
        AccountType::Account
    }
}

fn parse_mint_facts(account: &AccountInfo) -> AppResult<MintFacts> {
    let info = account
        .parsed_info()
        .ok_or_else(|| AppError::step_failed("mint_facts", "no parsed mint info"))?;

    let decimals = info
        .get("decimals")
        .and_then(Value::as_u64)
        .map(|d| d as u8)
        .unwrap_or(0);
    let raw_supply: u64 = info
        .get("supply")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    let authority = |key: &str| -> Option<String> {
        info.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(String::from)
    };

    Ok(MintFacts {
        decimals,
        supply: raw_supply as f64 / 10f64.powi(decimals as i32),
        mint_authority: authority("mintAuthority"),
        freeze_authority: authority("freezeAuthority"),
    })
}

/// Authority indicators for a mint. An active mint authority means
/// supply can be inflated at will; a freeze authority can lock holders.
pub fn mint_indicators(facts: &MintFacts) -> Vec<RiskIndicator> {
    let mut indicators = Vec::new();

    match &facts.mint_authority {
        Some(authority) => indicators.push(
            RiskIndicator::new(
                "mint_authority_active",
                IndicatorCategory::Authority,
                "Mint authority active",
                Severity::Critical,
                authority.clone(),
                "Supply can be inflated arbitrarily by the mint authority",
            )
            .with_remediation("Revoke the mint authority to fix the supply"),
        ),
        None => indicators.push(RiskIndicator::new(
            "mint_authority_disabled",
            IndicatorCategory::Authority,
            "Mint authority disabled",
            Severity::Low,
            "revoked",
            "Supply is fixed; no further tokens can be minted",
        )),
    }

    if let Some(authority) = &facts.freeze_authority {
        indicators.push(
            RiskIndicator::new(
                "freeze_authority_active",
                IndicatorCategory::Authority,
                "Freeze authority active",
                Severity::High,
                authority.clone(),
                "Token accounts can be frozen by the freeze authority",
            )
            .with_remediation("Revoke the freeze authority"),
        );
    }

    indicators
}

/// Rank holders 1-based by descending balance and compute supply shares
pub fn build_holder_distribution(
    balances: &[crate::providers::helius::HolderBalance],
    supply: f64,
) -> HolderDistribution {
    let mut holders: Vec<TopHolder> = balances
        .iter()
        .map(|b| TopHolder {
            rank: 0,
            address: b.address.clone(),
            balance: b.ui_amount.unwrap_or(0.0),
            percent: if supply > 0.0 {
                b.ui_amount.unwrap_or(0.0) / supply * 100.0
            } else {
                0.0
            },
        })
        .collect();

    holders.sort_by(|a, b| b.balance.partial_cmp(&a.balance).unwrap_or(std::cmp::Ordering::Equal));
    for (i, holder) in holders.iter_mut().enumerate() {
        holder.rank = (i + 1) as u32;
    }

    let top_holder_percent = holders.first().map(|h| h.percent).unwrap_or(0.0);
    let top10_percent: f64 = holders.iter().take(10).map(|h| h.percent).sum();

    HolderDistribution {
        top_holders: holders,
        top_holder_percent,
        top10_percent,
    }
}

/// At most one concentration indicator per analysis: the tiers are an
/// exclusive else-if chain and only the highest match fires.
pub fn concentration_indicator(
    distribution: &HolderDistribution,
    thresholds: &RiskThresholds,
) -> Option<RiskIndicator> {
    let top1 = distribution.top_holder_percent;
    let top10 = distribution.top10_percent;

    if top1 > thresholds.top_holder_critical_pct {
        Some(
            RiskIndicator::new(
                "high_concentration",
                IndicatorCategory::Holder,
                "Extreme holder concentration",
                Severity::Critical,
                format!("{:.1}%", top1),
                "A single holder controls the majority of the supply",
            )
            .with_remediation("Distribute supply or lock team allocations"),
        )
    } else if top1 > thresholds.top_holder_high_pct {
        Some(
            RiskIndicator::new(
                "moderate_concentration",
                IndicatorCategory::Holder,
                "High holder concentration",
                Severity::High,
                format!("{:.1}%", top1),
                "The top holder controls a large share of the supply",
            )
            .with_remediation("Review the top holder's allocation"),
        )
    } else if top10 > thresholds.top10_medium_pct {
        Some(RiskIndicator::new(
            "top10_concentration",
            IndicatorCategory::Holder,
            "Concentrated top-10",
            Severity::Medium,
            format!("{:.1}%", top10),
            "The ten largest holders control most of the supply",
        ))
    } else {
        None
    }
}

/// Failure rate, age and last-activity from a signature list
/// (newest first, as the RPC returns them)
pub fn build_activity_stats(signatures: &[SignatureRecord]) -> ActivityStats {
    let recent_tx_count = signatures.len();
    let failed_tx_count = signatures.iter().filter(|s| s.failed()).count();
    let failure_rate = if recent_tx_count > 0 {
        failed_tx_count as f64 / recent_tx_count as f64
    } else {
        0.0
    };

    let now = chrono::Utc::now().timestamp();
    let age_days = signatures
        .last()
        .and_then(|s| s.block_time)
        .map(|oldest| (now - oldest) as f64 / 86_400.0);
    let last_activity = signatures.first().and_then(|s| s.block_time);

    ActivityStats {
        recent_tx_count,
        failed_tx_count,
        failure_rate,
        age_days,
        last_activity,
    }
}

/// Activity indicators for the token path
pub fn activity_indicators(
    stats: &ActivityStats,
    thresholds: &RiskThresholds,
) -> Vec<RiskIndicator> {
    let mut indicators = Vec::new();

    if stats.failure_rate > thresholds.failure_rate_flag {
        indicators.push(RiskIndicator::new(
            "high_failure_rate",
            IndicatorCategory::Activity,
            "High failure rate",
            Severity::Medium,
            format!("{:.0}%", stats.failure_rate * 100.0),
            "A large share of recent transactions failed",
        ));
    }

    if let Some(age) = stats.age_days {
        if age < thresholds.young_account_days {
            indicators.push(RiskIndicator::new(
                "young_account",
                IndicatorCategory::Activity,
                "Young account",
                Severity::Medium,
                format!("{:.1} days", age),
                "Account was created very recently",
            ));
        }
    }

    indicators
}

// ============================================
// SCORING (pure)
// ============================================

/// Sum of severity weights clamped to 100, with a threshold-overriding
/// grade: any critical indicator forces F and any high forces D no
/// matter how low the aggregate score is.
pub fn calculate_risk_score(indicators: &[RiskIndicator]) -> (u8, Grade) {
    let score: u32 = indicators.iter().map(|i| i.severity.weight()).sum();
    let score = score.min(100) as u8;

    let has_critical = indicators.iter().any(|i| i.severity == Severity::Critical);
    let has_high = indicators.iter().any(|i| i.severity == Severity::High);

    let grade = if has_critical {
        Grade::F
    } else if has_high {
        Grade::D
    } else {
        match score {
            0..=10 => Grade::A,
            11..=25 => Grade::B,
            26..=50 => Grade::C,
            _ => Grade::D,
        }
    };

    (score, grade)
}
