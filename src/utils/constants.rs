//! Constants Module - Single Source of Truth
//!
//! All program ID tables, endpoints and fixed scoring tables live here.
//! Classification is data, not code: a new loader or DEX program is
//! supported by adding a row, never by adding a branch.

use crate::models::types::Severity;

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "SolSec";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for HTTP requests
pub const USER_AGENT: &str = "SolSec/0.1.0";

// ============================================
// RPC CONSTANTS
// ============================================

/// Default timeout for RPC requests (seconds)
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 10;

/// Public RPC endpoint used when no Helius key is configured
pub const PUBLIC_RPC_FALLBACK: &str = "https://api.mainnet-beta.solana.com";

/// Default cache TTL (seconds)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// TTL for dashboard market feeds (seconds)
pub const MARKET_FEED_TTL_SECS: u64 = 60;

/// Max signatures fetched for activity stats
pub const MAX_SIGNATURE_FETCH: usize = 100;

// ============================================
// EXTERNAL API ENDPOINTS
// ============================================

/// DeFiLlama base URL
pub const DEFILLAMA_API: &str = "https://api.llama.fi";

/// Jupiter price API base URL
pub const JUPITER_PRICE_API: &str = "https://price.jup.ag/v6";

// ============================================
// PROGRAM ID TABLES
// ============================================

/// SPL Token Program
pub const TOKEN_PROGRAM: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// Token-2022 Program
pub const TOKEN_2022_PROGRAM: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";

/// Loader programs: ownership by any of these (or the executable flag)
/// classifies an account as a program
pub const LOADER_PROGRAMS: [&str; 4] = [
    "BPFLoaderUpgradeab1e11111111111111111111111",
    "BPFLoader2111111111111111111111111111111111",
    "BPFLoader1111111111111111111111111111111111",
    "LoaderV411111111111111111111111111111111111",
];

/// Known DEX program info
#[derive(Debug, Clone, Copy)]
pub struct DexProgramInfo {
    pub name: &'static str,
    pub program_id: &'static str,
}

/// Known DEX programs checked by the MEV scorer
pub const DEX_PROGRAMS: [DexProgramInfo; 7] = [
    DexProgramInfo {
        name: "Jupiter",
        program_id: "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4",
    },
    DexProgramInfo {
        name: "Raydium AMM",
        program_id: "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8",
    },
    DexProgramInfo {
        name: "Raydium CLMM",
        program_id: "CAMMCzo5YL8w4VFF8KVHrK22GGUsp5VTaW7grrKgrWqK",
    },
    DexProgramInfo {
        name: "Orca Whirlpool",
        program_id: "whirLbMiicVdio4qvUfM5KAg6Ct8VwpYzGff3uctyCc",
    },
    DexProgramInfo {
        name: "Meteora DLMM",
        program_id: "LBUZKhRxPF3XUpBCjp4YzTKgLccjZhTSDM9YuVaPwxo",
    },
    DexProgramInfo {
        name: "Phoenix",
        program_id: "PhoeNiXZ8ByJGLkxNfZRnkUfjvmuYqLR89jjFHGqdXY",
    },
    DexProgramInfo {
        name: "Lifinity",
        program_id: "EewxydAPCCVuNEyrVN68PuSYdQ7wKn27V9Gjeoi8dy3S",
    },
];

/// Check if a program ID belongs to a loader
#[inline]
pub fn is_loader_program(program_id: &str) -> bool {
    LOADER_PROGRAMS.contains(&program_id)
}

/// Check if a program ID belongs to a token program
#[inline]
pub fn is_token_program(program_id: &str) -> bool {
    program_id == TOKEN_PROGRAM || program_id == TOKEN_2022_PROGRAM
}

/// Check if a program ID belongs to a known DEX
#[inline]
pub fn is_dex_program(program_id: &str) -> bool {
    DEX_PROGRAMS.iter().any(|d| d.program_id == program_id)
}

/// Name of the DEX owning a program ID, if known
pub fn dex_program_name(program_id: &str) -> Option<&'static str> {
    DEX_PROGRAMS
        .iter()
        .find(|d| d.program_id == program_id)
        .map(|d| d.name)
}

/// Keywords the MEV fallback path matches in raw payloads
pub const DEX_KEYWORDS: [&str; 7] = [
    "jupiter", "raydium", "orca", "meteora", "phoenix", "swap", "whirlpool",
];

// ============================================
// SCORING TABLES
// ============================================

/// Pattern-match layer score per finding severity
pub fn pattern_severity_score(severity: Severity) -> u32 {
    match severity {
        Severity::Critical => 25,
        Severity::High => 15,
        Severity::Medium => 8,
        Severity::Low => 3,
    }
}

/// AI layer base score per vulnerability severity, scaled by confidence
pub fn ai_severity_base_score(severity: Severity) -> f64 {
    match severity {
        Severity::Critical => 30.0,
        Severity::High => 20.0,
        Severity::Medium => 10.0,
        Severity::Low => 4.0,
    }
}

/// Three-layer combination weights
pub const PATTERN_WEIGHT: f64 = 0.25;
pub const ON_CHAIN_WEIGHT: f64 = 0.45;
pub const AI_WEIGHT: f64 = 0.30;

/// Fixed confidence of the on-chain layer
pub const ON_CHAIN_CONFIDENCE: u8 = 90;

/// Pattern layer confidence when it produced no findings
pub const PATTERN_DEFAULT_CONFIDENCE: u8 = 50;
