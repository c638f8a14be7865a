//! HTTP client for the Financial Modeling Prep style endpoints.
//!
//! Transient per-symbol failures (404s, malformed payloads, network drops)
//! are contained here and come back as empty/absent data; only
//! authentication failures propagate as errors.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::{ApiError, ApiRateLimiter, StockDataProvider};
use crate::models::{
    AnnualFigures, Config, FmpBalanceSheet, FmpIncomeStatement, FmpInsiderOwnership,
    FmpInsiderTrade, FmpKeyMetricsTtm, FmpQuote, FmpRatiosTtm, FmpScreenerItem,
    InsiderTransaction, InsiderTransactionKind, MarketCapBucket,
};

/// Market cap slice boundaries used to seed the screener universe.
const MICRO_CAP_FLOOR: u64 = 50_000_000;
const SMALL_CAP_FLOOR: u64 = 300_000_000;
const MID_LARGE_CAP_FLOOR: u64 = 2_000_000_000;

pub struct FmpClient {
    client: Client,
    config: Config,
    rate_limiter: ApiRateLimiter,
}

impl FmpClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("rust-screener/1.0")
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
            rate_limiter: ApiRateLimiter::new(config.api_requests_per_minute),
        })
    }

    fn endpoint(&self, base: &str, path: &str, params: &[(&str, &str)]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&format!("{}/{}", base.trim_end_matches('/'), path))
            .map_err(|e| ApiError::Payload(format!("invalid endpoint {path}: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
            query.append_pair("apikey", &self.config.fmp_api_key);
        }
        Ok(url)
    }

    fn v3(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, ApiError> {
        self.endpoint(&self.config.fmp_base_url, path, params)
    }

    fn v4(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, ApiError> {
        self.endpoint(&self.config.fmp_v4_base_url, path, params)
    }

    /// Fetch a JSON array endpoint. The API sometimes hands back a single
    /// object where an array is documented; both shapes are accepted.
    async fn get_list<T: DeserializeOwned>(
        &self,
        url: Url,
        what: &str,
    ) -> Result<Vec<T>, ApiError> {
        self.rate_limiter.wait().await;

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Network error fetching {}: {}", what, e);
                return Ok(Vec::new());
            }
        };

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Auth {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            if status != StatusCode::NOT_FOUND {
                warn!("API error {} fetching {}", status, what);
            }
            return Ok(Vec::new());
        }

        let value: Value = match response.json().await {
            Ok(value) => value,
            Err(e) => {
                warn!("Unreadable payload for {}: {}", what, e);
                return Ok(Vec::new());
            }
        };

        let items = match value {
            Value::Array(_) => serde_json::from_value::<Vec<T>>(value),
            Value::Null => return Ok(Vec::new()),
            other => serde_json::from_value::<T>(other).map(|item| vec![item]),
        };

        match items {
            Ok(items) => Ok(items),
            Err(e) => {
                warn!("Unexpected payload shape for {}: {}", what, e);
                Ok(Vec::new())
            }
        }
    }

    async fn get_first<T: DeserializeOwned>(
        &self,
        url: Url,
        what: &str,
    ) -> Result<Option<T>, ApiError> {
        Ok(self.get_list(url, what).await?.into_iter().next())
    }

    async fn read_local_json(&self, path: &str) -> Option<Value> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Could not parse {}: {}", path, e);
                    None
                }
            },
            Err(e) => {
                warn!("Could not read {}: {}", path, e);
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl StockDataProvider for FmpClient {
    async fn screener_slice(
        &self,
        slice: MarketCapBucket,
        limit: usize,
    ) -> Result<Vec<FmpScreenerItem>, ApiError> {
        let micro = MICRO_CAP_FLOOR.to_string();
        let small = SMALL_CAP_FLOOR.to_string();
        let mid_large = MID_LARGE_CAP_FLOOR.to_string();
        let limit = limit.to_string();

        let mut params: Vec<(&str, &str)> = vec![
            ("exchange", "NASDAQ,NYSE,OTC"),
            ("isActivelyTrading", "true"),
        ];
        match slice {
            MarketCapBucket::Nano => params.push(("marketCapLowerThan", micro.as_str())),
            MarketCapBucket::Micro => {
                params.push(("marketCapMoreThan", micro.as_str()));
                params.push(("marketCapLowerThan", small.as_str()));
            }
            MarketCapBucket::Small => {
                params.push(("marketCapMoreThan", small.as_str()));
                params.push(("marketCapLowerThan", mid_large.as_str()));
            }
            MarketCapBucket::MidLarge => params.push(("marketCapMoreThan", mid_large.as_str())),
        }
        params.push(("limit", limit.as_str()));

        let url = self.v3("stock-screener", &params)?;
        let items = self
            .get_list::<FmpScreenerItem>(url, &format!("{} cap screener", slice.as_str()))
            .await?;
        debug!("Screener slice {} returned {} items", slice.as_str(), items.len());
        Ok(items)
    }

    async fn quote(&self, symbol: &str) -> Result<Option<FmpQuote>, ApiError> {
        let url = self.v3(&format!("quote/{symbol}"), &[])?;
        self.get_first(url, &format!("quote for {symbol}")).await
    }

    async fn ratios_ttm(&self, symbol: &str) -> Result<Option<FmpRatiosTtm>, ApiError> {
        let url = self.v3(&format!("ratios-ttm/{symbol}"), &[])?;
        self.get_first(url, &format!("TTM ratios for {symbol}")).await
    }

    async fn key_metrics_ttm(&self, symbol: &str) -> Result<Option<FmpKeyMetricsTtm>, ApiError> {
        let url = self.v3(&format!("key-metrics-ttm/{symbol}"), &[])?;
        self.get_first(url, &format!("TTM key metrics for {symbol}"))
            .await
    }

    async fn annual_figures(
        &self,
        symbol: &str,
        years: usize,
    ) -> Result<Vec<AnnualFigures>, ApiError> {
        let limit = years.to_string();
        let params = [("period", "annual"), ("limit", limit.as_str())];

        let income_url = self.v3(&format!("income-statement/{symbol}"), &params)?;
        let balance_url = self.v3(&format!("balance-sheet-statement/{symbol}"), &params)?;

        let income_ctx = format!("income statements for {symbol}");
        let balance_ctx = format!("balance sheets for {symbol}");
        let (income, balance) = tokio::try_join!(
            self.get_list::<FmpIncomeStatement>(income_url, &income_ctx),
            self.get_list::<FmpBalanceSheet>(balance_url, &balance_ctx),
        )?;

        let balance_by_year: HashMap<&str, &FmpBalanceSheet> = balance
            .iter()
            .map(|sheet| (sheet.calendar_year.as_str(), sheet))
            .collect();

        // Keep only fiscal years where both statements are present.
        let mut figures: Vec<AnnualFigures> = income
            .iter()
            .filter_map(|statement| {
                let year: i32 = statement.calendar_year.parse().ok()?;
                let sheet = balance_by_year.get(statement.calendar_year.as_str())?;
                Some(AnnualFigures {
                    calendar_year: year,
                    revenue: statement.revenue,
                    gross_profit_ratio: statement.gross_profit_ratio,
                    operating_income: statement.operating_income,
                    income_tax_expense: statement.income_tax_expense,
                    income_before_tax: statement.income_before_tax,
                    net_income: statement.net_income,
                    shares_outstanding: statement.weighted_average_shs_out_dil,
                    total_debt: sheet.total_debt,
                    total_stockholders_equity: sheet.total_stockholders_equity,
                    cash_and_equivalents: sheet.cash_and_cash_equivalents,
                    goodwill: sheet.goodwill,
                    intangible_assets: sheet.intangible_assets,
                    goodwill_and_intangibles: sheet.goodwill_and_intangible_assets,
                    total_current_assets: sheet.total_current_assets,
                    total_liabilities: sheet.total_liabilities,
                })
            })
            .collect();

        figures.sort_by_key(|f| f.calendar_year);
        Ok(figures)
    }

    async fn insider_trades(&self, symbol: &str) -> Result<Vec<InsiderTransaction>, ApiError> {
        let url = self.v4(
            "insider-trading",
            &[("symbol", symbol), ("limit", "100"), ("page", "0")],
        )?;
        let rows = self
            .get_list::<FmpInsiderTrade>(url, &format!("insider trades for {symbol}"))
            .await?;

        let trades = rows
            .into_iter()
            .filter_map(|row| {
                let raw_date = row.transaction_date?;
                let date = NaiveDate::parse_from_str(raw_date.get(..10)?, "%Y-%m-%d").ok()?;
                let kind = match row.transaction_type.as_deref() {
                    Some("P-Purchase") => InsiderTransactionKind::Purchase,
                    Some("S-Sale") => InsiderTransactionKind::Sale,
                    _ => InsiderTransactionKind::Other,
                };
                Some(InsiderTransaction {
                    transaction_date: date,
                    kind,
                    shares: row.securities_transacted,
                    price: row.price,
                })
            })
            .collect();
        Ok(trades)
    }

    async fn insider_ownership_pct(&self, symbol: &str) -> Result<Option<f64>, ApiError> {
        let url = self.v4("insider-ownership", &[("symbol", symbol)])?;
        let rows = self
            .get_list::<FmpInsiderOwnership>(url, &format!("insider ownership for {symbol}"))
            .await?;

        // Latest filing wins.
        let latest = rows
            .into_iter()
            .filter_map(|row| {
                let pct = row.ownership_percentage.filter(|v| v.is_finite())?;
                let raw_date = row.filing_date.as_deref()?;
                let date = NaiveDate::parse_from_str(raw_date.get(..10)?, "%Y-%m-%d").ok()?;
                Some((date, pct))
            })
            .max_by_key(|(date, _)| *date);

        Ok(latest.map(|(_, pct)| pct))
    }

    async fn reg_sho_symbols(&self) -> Result<HashSet<String>, ApiError> {
        let Some(value) = self.read_local_json(&self.config.reg_sho_path).await else {
            return Ok(HashSet::new());
        };
        match serde_json::from_value::<Vec<String>>(value) {
            Ok(tickers) => Ok(tickers.into_iter().map(|t| t.to_uppercase()).collect()),
            Err(e) => {
                warn!("Reg-SHO list has an unexpected shape: {}", e);
                Ok(HashSet::new())
            }
        }
    }

    async fn benchmark_symbols(&self) -> Result<Vec<String>, ApiError> {
        let Some(value) = self
            .read_local_json(&self.config.benchmark_symbols_path)
            .await
        else {
            return Ok(Vec::new());
        };

        // The constituent file is an array of objects keyed by "Symbol".
        let Value::Array(rows) = value else {
            warn!("Benchmark constituent list has an unexpected shape");
            return Ok(Vec::new());
        };
        Ok(rows
            .into_iter()
            .filter_map(|row| row.get("Symbol").and_then(Value::as_str).map(str::to_string))
            .collect())
    }
}
