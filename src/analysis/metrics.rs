//! Derivation of secondary financial metrics from raw statement figures.
//!
//! Every function here is pure and total: an absent or non-finite input
//! propagates to `None` instead of panicking or surfacing NaN/Infinity.

use chrono::NaiveDate;

use crate::analysis::ROE_AVG_WINDOW_YEARS;
use crate::models::{AnnualFigures, InsiderTransaction, InsiderTransactionKind, MarginTrend, PriceToNcav};

/// Drop non-finite values so NaN/Infinity never enter a derivation.
pub(crate) fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Compound annual growth rate over a series of annual values, oldest first.
///
/// Nulls are filtered out and the growth exponent is the number of steps
/// between the first and last usable points. Returns `None` when fewer than
/// two usable points remain, when the series starts at zero, or when the
/// sign combination of the endpoints would require a non-real root.
pub fn cagr(values: &[Option<f64>], periods: usize) -> Option<f64> {
    if values.len() < 2 || periods < 1 {
        return None;
    }

    let usable: Vec<f64> = values.iter().copied().filter_map(finite).collect();
    if usable.len() < 2 {
        return None;
    }

    let start = *usable.first()?;
    let end = *usable.last()?;
    let span = usable.len() - 1;

    if start == 0.0 {
        return None;
    }
    if start <= 0.0 && end > 0.0 {
        return None;
    }
    // An even root of a negative ratio has no real solution.
    if start > 0.0 && end <= 0.0 && span % 2 == 0 {
        return None;
    }

    let growth = (end / start).powf(1.0 / span as f64) - 1.0;
    growth.is_finite().then_some(growth)
}

/// Classify the direction of a margin series, oldest first.
///
/// A series counts as consistently rising/falling when every step stays
/// within a 2% tolerance of the previous value; the first-vs-last comparison
/// (±5%) decides when the pointwise test is inconclusive.
pub fn margin_trend(values: &[Option<f64>]) -> Option<MarginTrend> {
    let valid: Vec<f64> = values.iter().copied().filter_map(finite).collect();
    if valid.len() < 2 {
        return None;
    }

    let first = valid[0];
    let last = valid[valid.len() - 1];

    let mut rising = true;
    let mut falling = true;
    for pair in valid.windows(2) {
        if pair[1] < pair[0] * 0.98 {
            rising = false;
        }
        if pair[1] > pair[0] * 1.02 {
            falling = false;
        }
    }

    if rising && last > first * 1.05 {
        return Some(MarginTrend::Improving);
    }
    if falling && last < first * 0.95 {
        return Some(MarginTrend::Declining);
    }
    if last > first * 1.05 {
        return Some(MarginTrend::Improving);
    }
    if last < first * 0.95 {
        return Some(MarginTrend::Declining);
    }
    Some(MarginTrend::Stable)
}

/// Net operating profit after tax for one fiscal year.
/// Undefined when income before tax is zero (no meaningful tax rate).
fn nopat(figures: &AnnualFigures) -> Option<f64> {
    let operating_income = finite(figures.operating_income)?;
    let tax_expense = finite(figures.income_tax_expense)?;
    let income_before_tax = finite(figures.income_before_tax)?;
    if income_before_tax == 0.0 {
        return None;
    }
    let tax_rate = tax_expense / income_before_tax;
    Some(operating_income * (1.0 - tax_rate))
}

/// Invested capital for one fiscal year: debt + equity - cash.
fn invested_capital(figures: &AnnualFigures) -> Option<f64> {
    let debt = finite(figures.total_debt)?;
    let equity = finite(figures.total_stockholders_equity)?;
    let cash = finite(figures.cash_and_equivalents)?;
    Some(debt + equity - cash)
}

/// Return on incrementally invested capital across the two most recent
/// fiscal years. Requires the change in invested capital to be positive;
/// a shrinking or flat capital base makes the ratio meaningless.
pub fn incremental_roic(prior: &AnnualFigures, latest: &AnnualFigures) -> Option<f64> {
    let delta_nopat = nopat(latest)? - nopat(prior)?;
    let delta_capital = invested_capital(latest)? - invested_capital(prior)?;
    (delta_capital > 0.0).then(|| delta_nopat / delta_capital)
}

/// Price relative to net current asset value per share, from the latest
/// balance sheet. A non-positive NCAV with a positive price yields the
/// `NotFavorable` marker rather than a ratio.
pub fn price_to_ncav(
    price: f64,
    shares_outstanding: Option<f64>,
    latest: &AnnualFigures,
) -> Option<PriceToNcav> {
    if price <= 0.0 {
        return None;
    }
    let shares = finite(shares_outstanding).filter(|s| *s > 0.0)?;
    let current_assets = finite(latest.total_current_assets)?;
    let total_liabilities = finite(latest.total_liabilities)?;

    let ncav_per_share = (current_assets - total_liabilities) / shares;
    if ncav_per_share > 0.0 {
        Some(PriceToNcav::Ratio(price / ncav_per_share))
    } else {
        Some(PriceToNcav::NotFavorable)
    }
}

/// Estimated trading days to unwind a 5% position while staying at 10% of
/// average daily volume.
pub fn days_to_exit_position(
    shares_outstanding: Option<f64>,
    avg_volume: Option<f64>,
) -> Option<f64> {
    let shares = finite(shares_outstanding).filter(|s| *s > 0.0)?;
    let volume = finite(avg_volume).filter(|v| *v > 0.0)?;
    let shares_to_sell = 0.05 * shares;
    let tradeable_per_day = 0.10 * volume;
    Some(shares_to_sell / tradeable_per_day)
}

/// (cash - total debt) / market cap, from the latest balance sheet.
pub fn net_cash_to_market_cap(latest: &AnnualFigures, market_cap: Option<f64>) -> Option<f64> {
    let mcap = finite(market_cap).filter(|m| *m > 0.0)?;
    let cash = finite(latest.cash_and_equivalents)?;
    let debt = finite(latest.total_debt)?;
    Some((cash - debt) / mcap)
}

/// Trailing insider activity: net buy-transaction count and the total dollar
/// value of purchases since `cutoff`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InsiderActivity {
    pub net_buy_tx: i32,
    pub buy_value: f64,
}

pub fn insider_activity(trades: &[InsiderTransaction], cutoff: NaiveDate) -> InsiderActivity {
    let mut activity = InsiderActivity::default();
    for trade in trades {
        if trade.transaction_date < cutoff {
            continue;
        }
        match trade.kind {
            InsiderTransactionKind::Purchase => {
                activity.net_buy_tx += 1;
                activity.buy_value +=
                    finite(trade.shares).unwrap_or(0.0) * finite(trade.price).unwrap_or(0.0);
            }
            InsiderTransactionKind::Sale => activity.net_buy_tx -= 1,
            InsiderTransactionKind::Other => {}
        }
    }
    activity
}

/// Insider purchase value as a fraction of market cap. Zero when there were
/// no purchases; `None` only when purchases exist but market cap is unusable.
pub fn insider_buy_value_ratio(buy_value: f64, market_cap: Option<f64>) -> Option<f64> {
    match finite(market_cap).filter(|m| *m > 0.0) {
        Some(mcap) if buy_value > 0.0 => Some(buy_value / mcap),
        _ if buy_value <= 0.0 => Some(0.0),
        _ => None,
    }
}

/// Average return on tangible common equity over the most recent five
/// fiscal years, skipping years where tangible equity is non-positive.
pub fn avg_tangible_roe(figures: &[AnnualFigures]) -> Option<f64> {
    if figures.len() < ROE_AVG_WINDOW_YEARS {
        return None;
    }

    let window = &figures[figures.len() - ROE_AVG_WINDOW_YEARS..];
    let mut returns = Vec::new();
    for year in window {
        let Some(net_income) = finite(year.net_income) else {
            continue;
        };
        let Some(equity) = finite(year.total_stockholders_equity) else {
            continue;
        };
        let goodwill = finite(year.goodwill).unwrap_or(0.0);
        let intangibles = finite(year.intangible_assets).unwrap_or(0.0);
        let goodwill_and_intangibles = if goodwill + intangibles > 0.0 {
            goodwill + intangibles
        } else {
            finite(year.goodwill_and_intangibles).unwrap_or(0.0)
        };

        let tangible_equity = equity - goodwill_and_intangibles;
        if tangible_equity > 0.0 {
            returns.push(net_income / tangible_equity);
        }
    }

    if returns.is_empty() {
        return None;
    }
    Some(returns.iter().sum::<f64>() / returns.len() as f64)
}

/// Free cash flow per share relative to price.
pub fn owner_earnings_yield(fcf_per_share: Option<f64>, price: f64) -> Option<f64> {
    let fcf = finite(fcf_per_share).filter(|v| *v != 0.0)?;
    (price > 0.0).then(|| fcf / price)
}

/// Free cash flow per share relative to net income per share.
pub fn fcf_to_net_income(
    fcf_per_share: Option<f64>,
    net_income_per_share: Option<f64>,
) -> Option<f64> {
    let fcf = finite(fcf_per_share)?;
    let ni = finite(net_income_per_share).filter(|v| *v != 0.0)?;
    Some(fcf / ni)
}
