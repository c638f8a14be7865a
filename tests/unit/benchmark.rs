//! Averaging tests: screen averages and the benchmark abstention rule.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use test_log::test;

use rust_screener::benchmark::{
    benchmark_averages, metric_average, screen_averages, BenchmarkAverages, BenchmarkSample,
};
use rust_screener::collector::UniverseCollector;
use rust_screener::models::FmpQuote;

use crate::common::provider::FakeProvider;
use crate::common::test_data;

#[test]
fn metric_average_ignores_missing_and_non_finite() {
    let values = vec![Some(1.0), None, Some(3.0), Some(f64::NAN), Some(f64::INFINITY)];
    assert_eq!(metric_average(values.into_iter()), Some(2.0));

    assert_eq!(metric_average([None, None].into_iter()), None);
    assert_eq!(metric_average(std::iter::empty::<Option<f64>>()), None);
}

#[test]
fn screen_averages_have_no_abstention_threshold() {
    let mut a = test_data::stock_record("A");
    a.debt_to_ebitda_ttm = Some(1.0);
    a.return_on_equity_ttm = Some(0.10);
    let mut b = test_data::stock_record("B");
    b.debt_to_ebitda_ttm = Some(3.0);

    let averages = screen_averages(&[a, b]);
    assert_eq!(averages.stocks_passing, 2);
    // One valid sample out of two is enough for a screen average.
    assert_eq!(averages.debt_to_ebitda, Some(2.0));
    assert_eq!(averages.return_on_equity, Some(0.10));
    // Zero valid samples is the only absent case.
    assert_eq!(averages.ev_over_ebitda, None);

    let empty = screen_averages(&[]);
    assert_eq!(empty.stocks_passing, 0);
    assert_eq!(empty.debt_to_ebitda, None);
}

#[test]
fn benchmark_abstains_below_eighty_percent_coverage() {
    let universe_size = 100;

    // 81 constituents with an owner-earnings yield, all 100 with momentum,
    // only 79 with a revenue CAGR.
    let samples: Vec<Option<BenchmarkSample>> = (0..universe_size)
        .map(|i| {
            Some(BenchmarkSample {
                owner_earnings_yield: (i < 81).then_some(0.10),
                revenue_cagr_5yr: (i < 79).then_some(0.05),
                avg_rotce_5yr: None,
                net_cash_to_market_cap: None,
                rank_momentum_63: Some(2.0),
            })
        })
        .collect();

    let averages = BenchmarkAverages::from_samples(&samples, universe_size);

    // 81% coverage reports, 79% abstains, and the abstention is per metric.
    assert_eq!(averages.owner_earnings_yield, Some(0.10));
    assert_eq!(averages.revenue_cagr_5yr, None);
    assert_eq!(averages.rank_momentum_63, Some(2.0));
    assert_eq!(averages.avg_rotce_5yr, None);
}

#[test]
fn failed_constituent_fetches_count_against_coverage() {
    // 7 of 10 constituents resolved: even a metric present on every
    // resolved sample is below the 80% bar.
    let samples: Vec<Option<BenchmarkSample>> = (0..10)
        .map(|i| {
            (i < 7).then_some(BenchmarkSample {
                owner_earnings_yield: Some(0.08),
                ..Default::default()
            })
        })
        .collect();

    let averages = BenchmarkAverages::from_samples(&samples, 10);
    assert_eq!(averages.owner_earnings_yield, None);
}

#[test(tokio::test)]
async fn benchmark_averages_end_to_end_over_a_small_list() {
    let mut provider = FakeProvider::new();
    provider.benchmark = vec!["AAA".to_string(), "BBB".to_string()];
    for (symbol, price) in [("AAA", 50.0), ("BBB", 100.0)] {
        provider.quotes.insert(
            symbol.to_string(),
            FmpQuote {
                symbol: symbol.to_string(),
                price: Some(price),
                market_cap: Some(500_000_000.0),
                avg_volume: Some(200_000.0),
                shares_outstanding: Some(1_000_000.0),
                ..Default::default()
            },
        );
    }

    let collector = UniverseCollector::new(Arc::new(provider), test_data::test_config("http://unused"));
    let averages = benchmark_averages(&collector).await.unwrap();

    // Momentum exists for every assembled record, so it reports; metrics
    // with no underlying statement data abstain.
    assert!(averages.rank_momentum_63.is_some());
    assert_eq!(averages.owner_earnings_yield, None);
    assert_eq!(averages.revenue_cagr_5yr, None);
}

#[test(tokio::test)]
async fn empty_benchmark_list_is_an_error() {
    let provider = FakeProvider::new();
    let collector = UniverseCollector::new(Arc::new(provider), test_data::test_config("http://unused"));
    assert!(benchmark_averages(&collector).await.is_err());
}
