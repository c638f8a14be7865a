use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Market-cap size classes, which double as the screener's universe slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketCapBucket {
    #[serde(rename = "nano")]
    Nano,
    #[serde(rename = "micro")]
    Micro,
    #[serde(rename = "small")]
    Small,
    #[serde(rename = "midLarge")]
    MidLarge,
}

impl MarketCapBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketCapBucket::Nano => "nano",
            MarketCapBucket::Micro => "micro",
            MarketCapBucket::Small => "small",
            MarketCapBucket::MidLarge => "midLarge",
        }
    }
}

/// Average daily volume classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeBucket {
    Low,
    Medium,
    High,
}

impl VolumeBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            VolumeBucket::Low => "low",
            VolumeBucket::Medium => "medium",
            VolumeBucket::High => "high",
        }
    }
}

/// Debt/equity load classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtBucket {
    Low,
    Medium,
    High,
}

impl DebtBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebtBucket::Low => "low",
            DebtBucket::Medium => "medium",
            DebtBucket::High => "high",
        }
    }
}

/// P/E-based valuation classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValuationBucket {
    Value,
    Blend,
    Growth,
}

impl ValuationBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValuationBucket::Value => "value",
            ValuationBucket::Blend => "blend",
            ValuationBucket::Growth => "growth",
        }
    }
}

/// Return-on-equity quality classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoeBucket {
    Poor,
    Average,
    Good,
    Excellent,
}

impl RoeBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoeBucket::Poor => "poor",
            RoeBucket::Average => "average",
            RoeBucket::Good => "good",
            RoeBucket::Excellent => "excellent",
        }
    }
}

/// Deep-value classes derived from price / net current asset value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeepValueBucket {
    #[serde(rename = "le0.5")]
    AtMostHalf,
    #[serde(rename = "le0.8")]
    AtMostFourFifths,
    #[serde(rename = "le1.0")]
    AtMostOne,
}

impl DeepValueBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeepValueBucket::AtMostHalf => "le0.5",
            DeepValueBucket::AtMostFourFifths => "le0.8",
            DeepValueBucket::AtMostOne => "le1.0",
        }
    }
}

/// Three-year share-count CAGR classes (buybacks vs. dilution).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareCountCagrBucket {
    ReductionLarge,
    ReductionSmall,
    Flat,
    Increasing,
}

impl ShareCountCagrBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareCountCagrBucket::ReductionLarge => "reduction_large",
            ShareCountCagrBucket::ReductionSmall => "reduction_small",
            ShareCountCagrBucket::Flat => "flat",
            ShareCountCagrBucket::Increasing => "increasing",
        }
    }
}

/// Insider ownership percentage classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsiderOwnershipBucket {
    #[serde(rename = "ge20")]
    AtLeast20,
    #[serde(rename = "ge10")]
    AtLeast10,
    #[serde(rename = "ge5")]
    AtLeast5,
}

impl InsiderOwnershipBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsiderOwnershipBucket::AtLeast20 => "ge20",
            InsiderOwnershipBucket::AtLeast10 => "ge10",
            InsiderOwnershipBucket::AtLeast5 => "ge5",
        }
    }
}

/// Net insider buy-transaction classes over the trailing six months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsiderBuysBucket {
    NetBuying,
    Neutral,
    NetSelling,
}

impl InsiderBuysBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsiderBuysBucket::NetBuying => "net_buying",
            InsiderBuysBucket::Neutral => "neutral",
            InsiderBuysBucket::NetSelling => "net_selling",
        }
    }
}

/// Incremental return-on-invested-capital classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncrementalRoicBucket {
    #[serde(rename = "ge25pct")]
    AtLeast25Pct,
    #[serde(rename = "ge20pct")]
    AtLeast20Pct,
    #[serde(rename = "ge15pct")]
    AtLeast15Pct,
}

impl IncrementalRoicBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncrementalRoicBucket::AtLeast25Pct => "ge25pct",
            IncrementalRoicBucket::AtLeast20Pct => "ge20pct",
            IncrementalRoicBucket::AtLeast15Pct => "ge15pct",
        }
    }
}

/// Direction of a margin series over the trend window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginTrend {
    Improving,
    Stable,
    Declining,
}

impl MarginTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarginTrend::Improving => "improving",
            MarginTrend::Stable => "stable",
            MarginTrend::Declining => "declining",
        }
    }
}

/// Classifications with no live data feed behind them yet. The enum is
/// uninhabited, so the corresponding record fields can only read as absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaceholderBucket {}

/// Price relative to net current asset value per share.
///
/// `NotFavorable` covers the case where NCAV per share is non-positive while
/// the stock still trades at a positive price; it never satisfies any
/// "at most x" comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceToNcav {
    Ratio(f64),
    NotFavorable,
}

impl PriceToNcav {
    pub fn at_most(&self, limit: f64) -> bool {
        match self {
            PriceToNcav::Ratio(v) => *v <= limit,
            PriceToNcav::NotFavorable => false,
        }
    }

    pub fn ratio(&self) -> Option<f64> {
        match self {
            PriceToNcav::Ratio(v) => Some(*v),
            PriceToNcav::NotFavorable => None,
        }
    }
}

impl Serialize for PriceToNcav {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PriceToNcav::Ratio(v) => serializer.serialize_f64(*v),
            PriceToNcav::NotFavorable => serializer.serialize_str("unfavorable"),
        }
    }
}

/// One fully assembled row of the screener universe.
///
/// Records are built once per refresh cycle and never mutated afterwards;
/// a new refresh replaces the whole universe.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRecord {
    pub symbol: String,
    pub name: String,
    pub sector: String,

    // Market data
    pub price: f64,
    pub market_cap: Option<f64>,
    pub avg_volume: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub price_change_pct_1d: Option<f64>,
    pub year_high: Option<f64>,
    pub year_low: Option<f64>,

    // Trailing-twelve-month ratios
    pub pe_ratio_ttm: Option<f64>,
    pub debt_equity_ratio_ttm: Option<f64>,
    pub return_on_equity_ttm: Option<f64>,
    pub debt_to_ebitda_ttm: Option<f64>,
    pub ev_over_ebitda_ttm: Option<f64>,
    pub fcf_per_share_ttm: Option<f64>,
    pub net_income_per_share_ttm: Option<f64>,
    pub interest_coverage_ttm: Option<f64>,

    // Derived metrics
    pub fcf_ni_ratio_ttm: Option<f64>,
    pub pnca_ratio: Option<PriceToNcav>,
    pub share_count_cagr_3yr: Option<f64>,
    pub gross_margin_trend: Option<MarginTrend>,
    pub incremental_roic: Option<f64>,
    pub net_insider_buy_tx_6m: i32,
    pub insider_ownership_pct: Option<f64>,
    pub avg_rotce_5yr: Option<f64>,
    pub days_to_exit_position: Option<f64>,
    pub net_cash_to_market_cap: Option<f64>,
    pub insider_buy_value_to_market_cap: Option<f64>,
    pub revenue_cagr_3yr: Option<f64>,
    pub revenue_cagr_5yr: Option<f64>,
    pub owner_earnings_yield: Option<f64>,

    // Composite score and momentum
    pub simple_score: u32,
    pub score_63_days_ago: u32,
    pub rank_momentum_63: Option<i32>,

    // Categorical buckets
    pub market_cap_category: Option<MarketCapBucket>,
    pub volume_category: Option<VolumeBucket>,
    pub debt_category: Option<DebtBucket>,
    pub valuation_category: Option<ValuationBucket>,
    pub rotce_category: Option<RoeBucket>,
    pub deep_value_category: Option<DeepValueBucket>,
    pub share_count_cagr_category: Option<ShareCountCagrBucket>,
    pub insider_ownership_category: Option<InsiderOwnershipBucket>,
    pub net_insider_buys_category: Option<InsiderBuysBucket>,
    pub incremental_roic_category: Option<IncrementalRoicBucket>,
    pub moat_keywords_category: Option<PlaceholderBucket>,
    pub red_flags_category: Option<PlaceholderBucket>,

    // Flags
    pub has_catalyst: bool,
    pub is_reg_sho: bool,
}

/// One year of merged income-statement and balance-sheet figures.
/// Series handed to the derivation functions are ordered oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnualFigures {
    pub calendar_year: i32,
    pub revenue: Option<f64>,
    pub gross_profit_ratio: Option<f64>,
    pub operating_income: Option<f64>,
    pub income_tax_expense: Option<f64>,
    pub income_before_tax: Option<f64>,
    pub net_income: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub total_debt: Option<f64>,
    pub total_stockholders_equity: Option<f64>,
    pub cash_and_equivalents: Option<f64>,
    pub goodwill: Option<f64>,
    pub intangible_assets: Option<f64>,
    pub goodwill_and_intangibles: Option<f64>,
    pub total_current_assets: Option<f64>,
    pub total_liabilities: Option<f64>,
}

/// Kind of an insider transaction as reported in the filings feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsiderTransactionKind {
    Purchase,
    Sale,
    Other,
}

/// A single insider transaction.
#[derive(Debug, Clone)]
pub struct InsiderTransaction {
    pub transaction_date: NaiveDate,
    pub kind: InsiderTransactionKind,
    pub shares: Option<f64>,
    pub price: Option<f64>,
}

// ============================================================================
// Raw market-data API payloads
// ============================================================================

/// One row from the stock screener endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FmpScreenerItem {
    pub symbol: String,
    pub company_name: Option<String>,
    pub sector: Option<String>,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub volume: Option<f64>,
    pub is_etf: Option<bool>,
    pub is_fund: Option<bool>,
    pub is_actively_trading: Option<bool>,
}

/// Quote payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FmpQuote {
    pub symbol: String,
    pub price: Option<f64>,
    #[serde(rename = "changesPercentage")]
    pub changes_percentage: Option<f64>,
    #[serde(rename = "avgVolume")]
    pub avg_volume: Option<f64>,
    #[serde(rename = "sharesOutstanding")]
    pub shares_outstanding: Option<f64>,
    #[serde(rename = "yearHigh")]
    pub year_high: Option<f64>,
    #[serde(rename = "yearLow")]
    pub year_low: Option<f64>,
    #[serde(rename = "marketCap")]
    pub market_cap: Option<f64>,
}

/// Trailing-twelve-month ratios payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FmpRatiosTtm {
    #[serde(rename = "priceEarningsRatioTTM")]
    pub price_earnings_ratio_ttm: Option<f64>,
    #[serde(rename = "debtEquityRatioTTM")]
    pub debt_equity_ratio_ttm: Option<f64>,
    #[serde(rename = "returnOnTangibleEquityTTM")]
    pub return_on_tangible_equity_ttm: Option<f64>,
    #[serde(rename = "returnOnEquityTTM")]
    pub return_on_equity_ttm: Option<f64>,
    #[serde(rename = "netIncomePerShareTTM")]
    pub net_income_per_share_ttm: Option<f64>,
    #[serde(rename = "interestCoverageTTM")]
    pub interest_coverage_ttm: Option<f64>,
}

/// Trailing-twelve-month key-metrics payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FmpKeyMetricsTtm {
    #[serde(rename = "debtToEbitdaTTM")]
    pub debt_to_ebitda_ttm: Option<f64>,
    #[serde(rename = "enterpriseValueOverEBITDATTM")]
    pub enterprise_value_over_ebitda_ttm: Option<f64>,
    #[serde(rename = "freeCashFlowPerShareTTM")]
    pub free_cash_flow_per_share_ttm: Option<f64>,
}

/// Annual income-statement payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FmpIncomeStatement {
    pub calendar_year: String,
    pub revenue: Option<f64>,
    pub gross_profit_ratio: Option<f64>,
    pub operating_income: Option<f64>,
    pub income_tax_expense: Option<f64>,
    pub income_before_tax: Option<f64>,
    pub net_income: Option<f64>,
    pub weighted_average_shs_out_dil: Option<f64>,
}

/// Annual balance-sheet payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FmpBalanceSheet {
    pub calendar_year: String,
    pub total_debt: Option<f64>,
    pub total_stockholders_equity: Option<f64>,
    pub cash_and_cash_equivalents: Option<f64>,
    pub goodwill: Option<f64>,
    pub intangible_assets: Option<f64>,
    pub goodwill_and_intangible_assets: Option<f64>,
    pub total_current_assets: Option<f64>,
    pub total_liabilities: Option<f64>,
}

/// Insider-trading payload row.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FmpInsiderTrade {
    pub transaction_date: Option<String>,
    pub transaction_type: Option<String>,
    pub securities_transacted: Option<f64>,
    pub price: Option<f64>,
}

/// Insider-ownership payload row.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FmpInsiderOwnership {
    pub filing_date: Option<String>,
    pub ownership_percentage: Option<f64>,
}

/// Configuration for the screener application.
#[derive(Debug, Clone)]
pub struct Config {
    pub fmp_api_key: String,
    pub fmp_base_url: String,
    pub fmp_v4_base_url: String,
    pub api_requests_per_minute: u32,
    pub universe_size: usize,
    pub fetch_batch_size: usize,
    pub fetch_batch_delay_ms: u64,
    pub benchmark_batch_size: usize,
    pub benchmark_batch_delay_ms: u64,
    pub reg_sho_path: String,
    pub benchmark_symbols_path: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        Ok(Config {
            fmp_api_key: std::env::var("FMP_API_KEY")
                .map_err(|_| anyhow::anyhow!("FMP_API_KEY environment variable required"))?,
            fmp_base_url: std::env::var("FMP_BASE_URL")
                .unwrap_or_else(|_| "https://financialmodelingprep.com/api/v3".to_string()),
            fmp_v4_base_url: std::env::var("FMP_V4_BASE_URL")
                .unwrap_or_else(|_| "https://financialmodelingprep.com/api/v4".to_string()),
            api_requests_per_minute: std::env::var("API_REQUESTS_PER_MINUTE")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap_or(300),
            universe_size: std::env::var("UNIVERSE_SIZE")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .unwrap_or(50),
            fetch_batch_size: std::env::var("FETCH_BATCH_SIZE")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .unwrap_or(3),
            fetch_batch_delay_ms: std::env::var("FETCH_BATCH_DELAY_MS")
                .unwrap_or_else(|_| "1500".to_string())
                .parse()
                .unwrap_or(1500),
            benchmark_batch_size: std::env::var("BENCHMARK_BATCH_SIZE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            benchmark_batch_delay_ms: std::env::var("BENCHMARK_BATCH_DELAY_MS")
                .unwrap_or_else(|_| "500".to_string())
                .parse()
                .unwrap_or(500),
            reg_sho_path: std::env::var("REG_SHO_PATH")
                .unwrap_or_else(|_| "data/regsho.json".to_string()),
            benchmark_symbols_path: std::env::var("BENCHMARK_SYMBOLS_PATH")
                .unwrap_or_else(|_| "data/sp500.json".to_string()),
        })
    }
}
