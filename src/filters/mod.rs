//! Compound filter evaluation over the assembled universe.
//!
//! Every filter control resolves to one entry in [`FILTER_REGISTRY`]; active
//! keys AND together. Numeric filters fail closed on missing data, keys
//! without a registry entry fail open so unimplemented controls never hide
//! stocks.

pub mod simple_mode;

use std::collections::BTreeMap;

use crate::models::StockRecord;

/// Active filter selections, keyed by filter control id. An absent key means
/// the control is inactive; empty and `"false"` values are inactive too.
pub type ActiveFilters = BTreeMap<String, String>;

/// Rows shown per page of results.
pub const STOCKS_PER_PAGE: usize = 15;

/// One filter control: its wire key and the predicate a record must satisfy
/// for a given selected value.
pub struct FilterSpec {
    pub key: &'static str,
    pub matches: fn(&StockRecord, &str) -> bool,
}

/// All implemented filter controls. Keys absent from this table are treated
/// as always-passing placeholders (`rdFlags`, `moatKws`, `catalyst_*`).
pub static FILTER_REGISTRY: &[FilterSpec] = &[
    FilterSpec { key: "marketCap", matches: match_market_cap },
    FilterSpec { key: "volume", matches: match_volume },
    FilterSpec { key: "debtEquityRatio", matches: match_debt_equity },
    FilterSpec { key: "peRatio", matches: match_valuation },
    FilterSpec { key: "roe", matches: match_roe },
    FilterSpec { key: "debtToEbitda", matches: match_debt_to_ebitda },
    FilterSpec { key: "fcfToNetIncome", matches: match_fcf_to_net_income },
    FilterSpec { key: "evToEbit", matches: match_ev_to_ebitda },
    FilterSpec { key: "shareCountChange", matches: match_share_count_change },
    FilterSpec { key: "priceToNCAV", matches: match_price_to_ncav },
    FilterSpec { key: "ncavSafety", matches: match_ncav_safety },
    FilterSpec { key: "insiderOwn", matches: match_insider_ownership },
    FilterSpec { key: "netInsiderTrx", matches: match_net_insider_tx },
    FilterSpec { key: "gmTrend", matches: match_gm_trend },
    FilterSpec { key: "incRoic", matches: match_incremental_roic },
    FilterSpec { key: "interestCoverage", matches: match_interest_coverage },
    FilterSpec { key: "avgRotce5yr", matches: match_avg_rotce },
    FilterSpec { key: "liquiditySafety", matches: match_liquidity_safety },
    FilterSpec { key: "rankMomentum", matches: match_rank_momentum },
    FilterSpec { key: "catalystOnly", matches: match_catalyst_only },
    FilterSpec { key: "excludeRegSho", matches: match_exclude_reg_sho },
];

/// Evaluate the search term and every active filter against the universe.
pub fn apply_filters(
    records: &[StockRecord],
    search: &str,
    filters: &ActiveFilters,
) -> Vec<StockRecord> {
    let search = search.trim().to_lowercase();

    records
        .iter()
        .filter(|record| {
            if !search.is_empty() && !matches_search(record, &search) {
                return false;
            }
            filters.iter().all(|(key, value)| {
                if value.is_empty() || value == "false" {
                    return true;
                }
                record_matches(record, key, value)
            })
        })
        .cloned()
        .collect()
}

/// Evaluate one filter key against one record. Unrecognized keys pass, and
/// the literal `"any"` selection passes for every implemented filter.
pub fn record_matches(record: &StockRecord, key: &str, value: &str) -> bool {
    match FILTER_REGISTRY.iter().find(|spec| spec.key == key) {
        Some(spec) => value == "any" || (spec.matches)(record, value),
        None => true,
    }
}

/// Number of rows to materialize for display; never changes which records
/// passed, only how many are shown.
pub fn paginate(records: &[StockRecord], page: usize, per_page: usize) -> &[StockRecord] {
    let shown = page.max(1).saturating_mul(per_page).min(records.len());
    &records[..shown]
}

fn matches_search(record: &StockRecord, lower_search: &str) -> bool {
    record.symbol.to_lowercase().contains(lower_search)
        || record.name.to_lowercase().contains(lower_search)
        || record.sector.to_lowercase().contains(lower_search)
}

// --- Bucket equality predicates ---

fn match_market_cap(record: &StockRecord, value: &str) -> bool {
    record.market_cap_category.map(|c| c.as_str()) == Some(value)
}

fn match_volume(record: &StockRecord, value: &str) -> bool {
    record.volume_category.map(|c| c.as_str()) == Some(value)
}

fn match_debt_equity(record: &StockRecord, value: &str) -> bool {
    record.debt_category.map(|c| c.as_str()) == Some(value)
}

fn match_valuation(record: &StockRecord, value: &str) -> bool {
    record.valuation_category.map(|c| c.as_str()) == Some(value)
}

fn match_roe(record: &StockRecord, value: &str) -> bool {
    record.rotce_category.map(|c| c.as_str()) == Some(value)
}

fn match_gm_trend(record: &StockRecord, value: &str) -> bool {
    record.gross_margin_trend.map(|t| t.as_str()) == Some(value)
}

// --- Numeric threshold predicates (missing data fails the filter) ---

fn match_debt_to_ebitda(record: &StockRecord, value: &str) -> bool {
    let Some(ratio) = record.debt_to_ebitda_ttm else {
        return false;
    };
    match value {
        "le1x" => ratio <= 1.0,
        "le0.5x" => ratio <= 0.5,
        "le0.25x" => ratio <= 0.25,
        _ => false,
    }
}

fn match_fcf_to_net_income(record: &StockRecord, value: &str) -> bool {
    let Some(ratio) = record.fcf_ni_ratio_ttm else {
        return false;
    };
    match value {
        "ge0.8" => ratio >= 0.8,
        "ge1.0" => ratio >= 1.0,
        "ge1.2" => ratio >= 1.2,
        _ => false,
    }
}

fn match_ev_to_ebitda(record: &StockRecord, value: &str) -> bool {
    let Some(ratio) = record.ev_over_ebitda_ttm else {
        return false;
    };
    match value {
        "le6x" => ratio <= 6.0,
        "le8x" => ratio <= 8.0,
        "le10x" => ratio <= 10.0,
        _ => false,
    }
}

fn match_share_count_change(record: &StockRecord, value: &str) -> bool {
    let Some(cagr) = record.share_count_cagr_3yr else {
        return false;
    };
    match value {
        "reduction_large" => cagr <= -0.05,
        "reduction_small" => cagr < 0.0 && cagr > -0.05,
        "flat" => (-0.005..=0.005).contains(&cagr),
        "increasing" => cagr > 0.005,
        _ => false,
    }
}

fn match_price_to_ncav(record: &StockRecord, value: &str) -> bool {
    let Some(pnca) = &record.pnca_ratio else {
        return false;
    };
    match value {
        "le0.5" => pnca.at_most(0.5),
        "le0.8" => pnca.at_most(0.8),
        "le1.0" => pnca.at_most(1.0),
        _ => false,
    }
}

fn match_ncav_safety(record: &StockRecord, value: &str) -> bool {
    if value != "le0_66" {
        return true;
    }
    record
        .pnca_ratio
        .as_ref()
        .map(|pnca| pnca.at_most(0.66))
        .unwrap_or(false)
}

fn match_insider_ownership(record: &StockRecord, value: &str) -> bool {
    let Some(pct) = record.insider_ownership_pct else {
        return false;
    };
    match value {
        "ge5" => pct >= 5.0,
        "ge10" => pct >= 10.0,
        "ge20" => pct >= 20.0,
        _ => false,
    }
}

fn match_net_insider_tx(record: &StockRecord, value: &str) -> bool {
    let net = record.net_insider_buy_tx_6m;
    match value {
        "net_buying" => net >= 1,
        "neutral" => net == 0,
        "net_selling" => net <= -1,
        _ => false,
    }
}

fn match_incremental_roic(record: &StockRecord, value: &str) -> bool {
    let Some(roic) = record.incremental_roic else {
        return false;
    };
    match value {
        "ge15pct" => roic >= 0.15,
        "ge20pct" => roic >= 0.20,
        "ge25pct" => roic >= 0.25,
        _ => false,
    }
}

fn match_interest_coverage(record: &StockRecord, value: &str) -> bool {
    // Slider-backed control: the value is a numeric floor. An unparsable
    // value deactivates the filter.
    let Ok(floor) = value.parse::<f64>() else {
        return true;
    };
    let Some(coverage) = record.interest_coverage_ttm else {
        return false;
    };
    coverage >= floor
}

fn match_avg_rotce(record: &StockRecord, value: &str) -> bool {
    let Some(avg) = record.avg_rotce_5yr else {
        return false;
    };
    match value {
        "gt20" => avg > 0.20,
        "gt15" => avg > 0.15,
        "gt10" => avg > 0.10,
        "anyPositive" => avg > 0.0,
        _ => false,
    }
}

fn match_liquidity_safety(record: &StockRecord, value: &str) -> bool {
    // Slider-backed ceiling on days-to-exit.
    let Ok(ceiling) = value.parse::<f64>() else {
        return true;
    };
    let Some(days) = record.days_to_exit_position else {
        return false;
    };
    days <= ceiling
}

// --- Flag predicates ---

fn match_rank_momentum(record: &StockRecord, value: &str) -> bool {
    if value == "positive" {
        // Strictly positive; zero momentum does not count.
        return record.rank_momentum_63.map_or(false, |m| m > 0);
    }
    true
}

fn match_catalyst_only(record: &StockRecord, value: &str) -> bool {
    if value == "true" {
        return record.has_catalyst;
    }
    true
}

fn match_exclude_reg_sho(record: &StockRecord, value: &str) -> bool {
    if value == "true" {
        return !record.is_reg_sho;
    }
    true
}
