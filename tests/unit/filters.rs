//! Filter evaluator tests: fail-closed numerics, fail-open placeholders,
//! search and pagination.

use pretty_assertions::assert_eq;
use test_log::test;

use rust_screener::filters::{
    apply_filters, paginate, record_matches, ActiveFilters, FILTER_REGISTRY,
};
use rust_screener::models::{
    DebtBucket, MarginTrend, MarketCapBucket, PriceToNcav, RoeBucket, ValuationBucket,
};

use crate::common::test_data::stock_record;

fn filters_of(pairs: &[(&str, &str)]) -> ActiveFilters {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn missing_numeric_field_fails_every_threshold() {
    let record = stock_record("NODATA");
    assert!(record.debt_to_ebitda_ttm.is_none());

    // Even the loosest debt/EBITDA selection excludes a record without data.
    for value in ["le1x", "le0.5x", "le0.25x"] {
        assert!(!record_matches(&record, "debtToEbitda", value), "{value}");
    }

    let mut with_data = stock_record("DATA");
    with_data.debt_to_ebitda_ttm = Some(0.4);
    assert!(record_matches(&with_data, "debtToEbitda", "le1x"));
    assert!(record_matches(&with_data, "debtToEbitda", "le0.5x"));
    assert!(!record_matches(&with_data, "debtToEbitda", "le0.25x"));
}

#[test]
fn unrecognized_keys_fail_open() {
    let record = stock_record("ANY");
    assert!(record_matches(&record, "rdFlags", "allRedFlags"));
    assert!(record_matches(&record, "moatKws", "ge3"));
    assert!(record_matches(&record, "catalyst_spinOff", "true"));
    assert!(record_matches(&record, "definitely-not-a-filter", "x"));

    let universe = vec![record];
    let matched = apply_filters(&universe, "", &filters_of(&[("rdFlags", "allRedFlags")]));
    assert_eq!(matched.len(), 1);
}

#[test]
fn empty_and_false_values_deactivate_a_filter() {
    let record = stock_record("IDLE");
    let universe = vec![record];

    let matched = apply_filters(
        &universe,
        "",
        &filters_of(&[("marketCap", ""), ("catalystOnly", "false")]),
    );
    assert_eq!(matched.len(), 1);
}

#[test]
fn bucket_equality_filters() {
    let mut record = stock_record("BUCK");
    record.market_cap_category = Some(MarketCapBucket::Micro);
    record.debt_category = Some(DebtBucket::Low);
    record.valuation_category = Some(ValuationBucket::Value);
    record.rotce_category = Some(RoeBucket::Good);

    assert!(record_matches(&record, "marketCap", "micro"));
    assert!(!record_matches(&record, "marketCap", "nano"));
    assert!(record_matches(&record, "debtEquityRatio", "low"));
    assert!(record_matches(&record, "peRatio", "value"));
    assert!(record_matches(&record, "roe", "good"));

    // A record without the bucket never matches any selection.
    let blank = stock_record("BLANK");
    assert!(!record_matches(&blank, "marketCap", "micro"));
    assert!(!record_matches(&blank, "roe", "poor"));
}

#[test]
fn any_selection_passes_even_without_data() {
    let record = stock_record("ANYVAL");
    assert!(record_matches(&record, "gmTrend", "any"));
    assert!(record_matches(&record, "netInsiderTrx", "any"));

    let mut trending = stock_record("TREND");
    trending.gross_margin_trend = Some(MarginTrend::Improving);
    assert!(record_matches(&trending, "gmTrend", "improving"));
    assert!(!record_matches(&trending, "gmTrend", "declining"));
    assert!(!record_matches(&record, "gmTrend", "improving"));
}

#[test]
fn momentum_filter_requires_strictly_positive() {
    let mut record = stock_record("MOM");

    record.rank_momentum_63 = Some(3);
    assert!(record_matches(&record, "rankMomentum", "positive"));

    record.rank_momentum_63 = Some(0);
    assert!(!record_matches(&record, "rankMomentum", "positive"));

    record.rank_momentum_63 = None;
    assert!(!record_matches(&record, "rankMomentum", "positive"));
}

#[test]
fn flag_filters() {
    let mut record = stock_record("FLAG");

    assert!(!record_matches(&record, "catalystOnly", "true"));
    record.has_catalyst = true;
    assert!(record_matches(&record, "catalystOnly", "true"));

    assert!(record_matches(&record, "excludeRegSho", "true"));
    record.is_reg_sho = true;
    assert!(!record_matches(&record, "excludeRegSho", "true"));
}

#[test]
fn slider_filters_parse_their_threshold() {
    let mut record = stock_record("SLIDE");

    // Unparsable slider values deactivate the filter.
    assert!(record_matches(&record, "interestCoverage", "not-a-number"));
    // Missing data fails a parsed threshold.
    assert!(!record_matches(&record, "interestCoverage", "3"));

    record.interest_coverage_ttm = Some(5.0);
    assert!(record_matches(&record, "interestCoverage", "3"));
    assert!(!record_matches(&record, "interestCoverage", "10"));

    record.days_to_exit_position = Some(12.0);
    assert!(record_matches(&record, "liquiditySafety", "15"));
    assert!(!record_matches(&record, "liquiditySafety", "10"));
    assert!(record_matches(&record, "liquiditySafety", "garbage"));
}

#[test]
fn ncav_filters_exclude_the_unfavorable_marker() {
    let mut record = stock_record("NCAV");

    record.pnca_ratio = Some(PriceToNcav::Ratio(0.6));
    assert!(record_matches(&record, "priceToNCAV", "le0.8"));
    assert!(!record_matches(&record, "priceToNCAV", "le0.5"));
    assert!(record_matches(&record, "ncavSafety", "le0_66"));

    record.pnca_ratio = Some(PriceToNcav::NotFavorable);
    assert!(!record_matches(&record, "priceToNCAV", "le1.0"));
    assert!(!record_matches(&record, "ncavSafety", "le0_66"));

    record.pnca_ratio = None;
    assert!(!record_matches(&record, "priceToNCAV", "le1.0"));
}

#[test]
fn avg_rotce_selections() {
    let mut record = stock_record("ROTCE");
    record.avg_rotce_5yr = Some(0.18);

    assert!(record_matches(&record, "avgRotce5yr", "gt15"));
    assert!(!record_matches(&record, "avgRotce5yr", "gt20"));
    assert!(record_matches(&record, "avgRotce5yr", "anyPositive"));

    record.avg_rotce_5yr = None;
    assert!(!record_matches(&record, "avgRotce5yr", "anyPositive"));
}

#[test]
fn search_is_case_insensitive_substring_over_identity() {
    let mut apple = stock_record("AAPL");
    apple.name = "Apple Inc.".to_string();
    apple.sector = "Technology".to_string();
    let mut bank = stock_record("JPM");
    bank.name = "JPMorgan Chase".to_string();
    bank.sector = "Financial Services".to_string();
    let universe = vec![apple, bank];

    let no_filters = ActiveFilters::new();
    assert_eq!(apply_filters(&universe, "aapl", &no_filters).len(), 1);
    assert_eq!(apply_filters(&universe, "morgan", &no_filters).len(), 1);
    assert_eq!(apply_filters(&universe, "FINANCIAL", &no_filters).len(), 1);
    assert_eq!(apply_filters(&universe, "zzz", &no_filters).len(), 0);
    assert_eq!(apply_filters(&universe, "  ", &no_filters).len(), 2);
}

#[test]
fn active_filters_combine_with_logical_and() {
    let mut a = stock_record("A");
    a.market_cap_category = Some(MarketCapBucket::Micro);
    a.debt_to_ebitda_ttm = Some(0.2);
    let mut b = stock_record("B");
    b.market_cap_category = Some(MarketCapBucket::Micro);
    b.debt_to_ebitda_ttm = Some(3.0);
    let universe = vec![a, b];

    let matched = apply_filters(
        &universe,
        "",
        &filters_of(&[("marketCap", "micro"), ("debtToEbitda", "le1x")]),
    );
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].symbol, "A");
}

#[test]
fn pagination_truncates_without_changing_membership() {
    let universe: Vec<_> = (0..7)
        .map(|i| stock_record(&format!("S{i}")))
        .collect();
    let matched = apply_filters(&universe, "", &ActiveFilters::new());
    assert_eq!(matched.len(), 7);

    let page_one = paginate(&matched, 1, 3);
    assert_eq!(page_one.len(), 3);
    assert_eq!(page_one[0].symbol, "S0");

    let page_two = paginate(&matched, 2, 3);
    assert_eq!(page_two.len(), 6);

    // Requesting past the end just materializes everything.
    let all = paginate(&matched, 5, 3);
    assert_eq!(all.len(), 7);
}

#[test]
fn registry_keys_are_unique() {
    for (index, spec) in FILTER_REGISTRY.iter().enumerate() {
        assert!(
            FILTER_REGISTRY[index + 1..]
                .iter()
                .all(|other| other.key != spec.key),
            "duplicate filter key {}",
            spec.key
        );
    }
}
