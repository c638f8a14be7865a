pub mod categories;
pub mod metrics;
pub mod scoring;

/// Years of history feeding CAGR and trend calculations.
pub const TREND_WINDOW_YEARS: usize = 3;
/// Years of history feeding the tangible-ROE average.
pub const ROE_AVG_WINDOW_YEARS: usize = 5;
/// Annual statements to request per symbol; one extra year is needed for the
/// five-year revenue CAGR.
pub const FINANCIAL_HISTORY_YEARS: usize = 6;
