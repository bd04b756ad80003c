//! Providers Module - External Data Sources
//!
//! Gateways to the chain (Helius JSON-RPC/DAS) and the DeFi data
//! aggregators (DeFiLlama, Jupiter) feeding the dashboard.

pub mod defillama;
pub mod helius;
pub mod jupiter;

pub use defillama::*;
pub use helius::*;
pub use jupiter::*;
