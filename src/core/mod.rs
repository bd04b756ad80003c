//! Core Module - Analysis Engines
//!
//! The three scoring engines (on-chain analyzer, risk aggregator, MEV
//! scorer) and the step runner they report through.

pub mod aggregator;
pub mod analyzer;
pub mod mev;
pub mod steps;

pub use aggregator::RiskAggregator;
pub use analyzer::OnChainAnalyzer;
pub use mev::MevScorer;
pub use steps::StepRunner;
