//! Jupiter Price Client
//!
//! Token price lookups feeding the dashboard. Always accessed through
//! the response cache.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::models::errors::{AppError, AppResult};
use crate::utils::constants::{JUPITER_PRICE_API, USER_AGENT};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Price of one token, USD
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPrice {
    pub id: String,
    pub price: f64,
}

#[derive(Clone)]
pub struct JupiterClient {
    client: reqwest::Client,
    base_url: String,
}

impl JupiterClient {
    pub fn new() -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .gzip(true)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: JUPITER_PRICE_API.to_string(),
        })
    }

    /// Price of a mint (or symbol like "SOL") in USD
    pub async fn price(&self, id: &str) -> AppResult<TokenPrice> {
        let url = format!("{}/price?ids={}", self.base_url, id);
        debug!("📡 Jupiter: price {}", id);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(AppError::jupiter_error(format!(
                "HTTP {} for {}",
                response.status(),
                id
            )));
        }

        let body: serde_json::Value = response.json().await?;
        body.get("data")
            .and_then(|d| d.get(id))
            .and_then(|entry| {
                Some(TokenPrice {
                    id: id.to_string(),
                    price: entry.get("price")?.as_f64()?,
                })
            })
            .ok_or_else(|| AppError::jupiter_error(format!("no price for {}", id)))
    }
}
