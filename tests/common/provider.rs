//! Canned-response market-data provider for unit tests.

use std::collections::{HashMap, HashSet};

use rust_screener::api::{ApiError, StockDataProvider};
use rust_screener::models::{
    AnnualFigures, FmpKeyMetricsTtm, FmpQuote, FmpRatiosTtm, FmpScreenerItem, InsiderTransaction,
    MarketCapBucket,
};

/// A [`StockDataProvider`] backed by in-memory fixtures. Anything not
/// configured comes back as absent data, matching the contained-failure
/// behavior of the real client. The failure switches simulate the two error
/// classes the collector has to handle.
#[derive(Default)]
pub struct FakeProvider {
    pub screener: HashMap<&'static str, Vec<FmpScreenerItem>>,
    pub quotes: HashMap<String, FmpQuote>,
    pub ratios: HashMap<String, FmpRatiosTtm>,
    pub key_metrics: HashMap<String, FmpKeyMetricsTtm>,
    pub figures: HashMap<String, Vec<AnnualFigures>>,
    pub insider_trades: HashMap<String, Vec<InsiderTransaction>>,
    pub insider_ownership: HashMap<String, f64>,
    pub reg_sho: HashSet<String>,
    pub benchmark: Vec<String>,
    /// Quote requests fail with an authentication error.
    pub fail_quote_auth: bool,
    /// Ratio requests fail with a transient (non-auth) error.
    pub fail_ratios_transient: bool,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(symbol: &str, price: f64, market_cap: f64) -> FmpScreenerItem {
        FmpScreenerItem {
            symbol: symbol.to_string(),
            company_name: Some(format!("{symbol} Inc.")),
            sector: Some("Industrials".to_string()),
            price: Some(price),
            market_cap: Some(market_cap),
            volume: Some(250_000.0),
            is_etf: Some(false),
            is_fund: Some(false),
            is_actively_trading: Some(true),
        }
    }
}

#[async_trait::async_trait]
impl StockDataProvider for FakeProvider {
    async fn screener_slice(
        &self,
        slice: MarketCapBucket,
        _limit: usize,
    ) -> Result<Vec<FmpScreenerItem>, ApiError> {
        Ok(self.screener.get(slice.as_str()).cloned().unwrap_or_default())
    }

    async fn quote(&self, symbol: &str) -> Result<Option<FmpQuote>, ApiError> {
        if self.fail_quote_auth {
            return Err(ApiError::Auth { status: 401 });
        }
        Ok(self.quotes.get(symbol).cloned())
    }

    async fn ratios_ttm(&self, symbol: &str) -> Result<Option<FmpRatiosTtm>, ApiError> {
        if self.fail_ratios_transient {
            return Err(ApiError::Payload("ratios endpoint unavailable".into()));
        }
        Ok(self.ratios.get(symbol).cloned())
    }

    async fn key_metrics_ttm(&self, symbol: &str) -> Result<Option<FmpKeyMetricsTtm>, ApiError> {
        Ok(self.key_metrics.get(symbol).cloned())
    }

    async fn annual_figures(
        &self,
        symbol: &str,
        _years: usize,
    ) -> Result<Vec<AnnualFigures>, ApiError> {
        Ok(self.figures.get(symbol).cloned().unwrap_or_default())
    }

    async fn insider_trades(&self, symbol: &str) -> Result<Vec<InsiderTransaction>, ApiError> {
        Ok(self.insider_trades.get(symbol).cloned().unwrap_or_default())
    }

    async fn insider_ownership_pct(&self, symbol: &str) -> Result<Option<f64>, ApiError> {
        Ok(self.insider_ownership.get(symbol).copied())
    }

    async fn reg_sho_symbols(&self) -> Result<HashSet<String>, ApiError> {
        Ok(self.reg_sho.clone())
    }

    async fn benchmark_symbols(&self) -> Result<Vec<String>, ApiError> {
        Ok(self.benchmark.clone())
    }
}
