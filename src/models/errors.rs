//! Centralized Error Handling Module
//!
//! Every failure carries a unique error code so production logs can be
//! filtered by category without parsing free-text messages.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - RPC_xxx: RPC-related errors
//! - ANALYSIS_xxx: analyzer/scorer errors
//! - API_xxx: API errors
//! - CFG_xxx: Configuration errors
//! - EXT_xxx: External data provider errors

use std::fmt;

/// Application-wide error type. All failures flow through this.
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // RPC Errors
    // ============================================
    /// RPC connection failed
    RpcConnectionFailed,
    /// RPC request timeout
    RpcTimeout,
    /// RPC rate limited (HTTP 429)
    RpcRateLimited,
    /// RPC returned an error object
    RpcError,
    /// RPC returned non-2xx status
    RpcHttpStatus,
    /// Invalid RPC response body
    RpcInvalidResponse,

    // ============================================
    // Analysis Errors
    // ============================================
    /// Account does not exist on-chain
    AccountNotFound,
    /// A single analysis step failed (non-fatal at run level)
    AnalysisStepFailed,
    /// Transaction signature could not be resolved
    TransactionNotFound,

    // ============================================
    // API Errors
    // ============================================
    /// Invalid request format
    ApiBadRequest,
    /// Rate limit exceeded
    ApiRateLimited,
    /// Internal server error
    ApiInternalError,
    /// Resource not found
    ApiNotFound,

    // ============================================
    // Configuration Errors
    // ============================================
    /// Missing environment variable
    ConfigMissingEnv,
    /// Invalid configuration value
    ConfigInvalidValue,
    /// Missing RPC API key (on-chain path degrades, not fatal)
    ConfigMissingApiKey,

    // ============================================
    // External Service Errors
    // ============================================
    /// DeFiLlama API error
    DefiLlamaError,
    /// Jupiter API error
    JupiterError,
    /// External service timeout
    ExternalTimeout,

    /// Unknown error
    Unknown,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            // RPC Errors
            Self::RpcConnectionFailed => "RPC_CONNECTION_FAILED",
            Self::RpcTimeout => "RPC_TIMEOUT",
            Self::RpcRateLimited => "RPC_RATE_LIMITED",
            Self::RpcError => "RPC_ERROR",
            Self::RpcHttpStatus => "RPC_HTTP_STATUS",
            Self::RpcInvalidResponse => "RPC_INVALID_RESPONSE",

            // Analysis Errors
            Self::AccountNotFound => "ANALYSIS_ACCOUNT_NOT_FOUND",
            Self::AnalysisStepFailed => "ANALYSIS_STEP_FAILED",
            Self::TransactionNotFound => "ANALYSIS_TX_NOT_FOUND",

            // API Errors
            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiRateLimited => "API_RATE_LIMITED",
            Self::ApiInternalError => "API_INTERNAL_ERROR",
            Self::ApiNotFound => "API_NOT_FOUND",

            // Configuration Errors
            Self::ConfigMissingEnv => "CFG_MISSING_ENV",
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",
            Self::ConfigMissingApiKey => "CFG_MISSING_API_KEY",

            // External Service Errors
            Self::DefiLlamaError => "EXT_DEFILLAMA_ERROR",
            Self::JupiterError => "EXT_JUPITER_ERROR",
            Self::ExternalTimeout => "EXT_TIMEOUT",

            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest | Self::ConfigInvalidValue => 400,
            Self::ApiNotFound | Self::AccountNotFound | Self::TransactionNotFound => 404,
            Self::ApiRateLimited | Self::RpcRateLimited => 429,
            _ => 500,
        }
    }

    /// Check if error is retryable upstream
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RpcTimeout
                | Self::RpcRateLimited
                | Self::RpcConnectionFailed
                | Self::ExternalTimeout
                | Self::DefiLlamaError
                | Self::JupiterError
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    pub fn rpc_timeout(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RpcTimeout, msg)
    }

    pub fn rpc_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RpcError, msg)
    }

    pub fn rpc_invalid_response(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RpcInvalidResponse, msg)
    }

    pub fn account_not_found(address: &str) -> Self {
        Self::new(
            ErrorCode::AccountNotFound,
            format!("Account not found on-chain: {}", address),
        )
    }

    pub fn transaction_not_found(signature: &str) -> Self {
        Self::new(
            ErrorCode::TransactionNotFound,
            format!("Transaction not found: {}", signature),
        )
    }

    pub fn step_failed(step: &str, msg: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::AnalysisStepFailed,
            format!("Step '{}' failed: {}", step, msg.into()),
        )
    }

    pub fn missing_api_key(key_name: &str) -> Self {
        Self::new(
            ErrorCode::ConfigMissingApiKey,
            format!("Missing API key: {}", key_name),
        )
    }

    pub fn defillama_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::DefiLlamaError, msg)
    }

    pub fn jupiter_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::JupiterError, msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiInternalError, msg)
    }
}

// ============================================
// Result type alias
// ============================================

pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorCode::Unknown, "IO error", err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ErrorCode::RpcTimeout, "Request timeout")
        } else if err.is_connect() {
            Self::new(ErrorCode::RpcConnectionFailed, "Connection failed")
        } else if let Some(status) = err.status() {
            if status.as_u16() == 429 {
                Self::new(ErrorCode::RpcRateLimited, "Rate limited (HTTP 429)")
            } else {
                Self::new(ErrorCode::RpcHttpStatus, format!("HTTP {}", status))
            }
        } else {
            Self::new(ErrorCode::Unknown, err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::RpcInvalidResponse, "JSON parse error", err)
    }
}
