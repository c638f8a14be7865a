use std::collections::HashSet;
use std::time::Duration;

use crate::models::{
    AnnualFigures, FmpKeyMetricsTtm, FmpQuote, FmpRatiosTtm, FmpScreenerItem, InsiderTransaction,
    MarketCapBucket,
};

pub mod fmp_client;
pub use fmp_client::FmpClient;

/// Errors from the market-data layer.
///
/// Only authentication failures abort a universe build; everything else is
/// contained at the fetch site and surfaces as missing data.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("market data API authentication failed (HTTP {status})")]
    Auth { status: u16 },
    #[error("market data request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected market data payload: {0}")]
    Payload(String),
}

impl ApiError {
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth { .. })
    }
}

/// Simple rate limiter for API requests
pub struct ApiRateLimiter {
    delay_ms: u64,
}

impl ApiRateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        let delay_ms = if requests_per_minute > 0 {
            60_000 / requests_per_minute as u64
        } else {
            1000 // Default 1 second delay
        };

        Self { delay_ms }
    }

    pub async fn wait(&self) {
        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
    }
}

/// Per-symbol raw data access, as the record assembly consumes it.
///
/// Implementations must map an authentication failure to `ApiError::Auth`
/// and are expected to contain transient per-symbol failures by returning
/// empty/absent payloads instead of errors.
#[async_trait::async_trait]
pub trait StockDataProvider: Send + Sync {
    async fn screener_slice(
        &self,
        slice: MarketCapBucket,
        limit: usize,
    ) -> Result<Vec<FmpScreenerItem>, ApiError>;

    async fn quote(&self, symbol: &str) -> Result<Option<FmpQuote>, ApiError>;

    async fn ratios_ttm(&self, symbol: &str) -> Result<Option<FmpRatiosTtm>, ApiError>;

    async fn key_metrics_ttm(&self, symbol: &str) -> Result<Option<FmpKeyMetricsTtm>, ApiError>;

    /// Merged annual income-statement and balance-sheet figures, oldest
    /// year first.
    async fn annual_figures(
        &self,
        symbol: &str,
        years: usize,
    ) -> Result<Vec<AnnualFigures>, ApiError>;

    async fn insider_trades(&self, symbol: &str) -> Result<Vec<InsiderTransaction>, ApiError>;

    async fn insider_ownership_pct(&self, symbol: &str) -> Result<Option<f64>, ApiError>;

    /// Symbols currently on the Reg-SHO threshold list, uppercased.
    async fn reg_sho_symbols(&self) -> Result<HashSet<String>, ApiError>;

    /// Constituents of the external benchmark universe.
    async fn benchmark_symbols(&self) -> Result<Vec<String>, ApiError>;
}
