//! Universe-wide and benchmark-wide metric averaging.

use std::time::Duration;

use anyhow::{bail, Result};
use serde::Serialize;
use tracing::info;

use crate::api::StockDataProvider;
use crate::collector::{RefreshContext, UniverseCollector};
use crate::models::StockRecord;

/// Fraction of the benchmark universe that must have usable data before an
/// average is reported at all.
const BENCHMARK_MIN_VALID_SHARE: f64 = 0.8;

/// Mean over the finite values in an iterator; `None` when nothing usable
/// remains.
pub fn metric_average(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let valid: Vec<f64> = values.flatten().filter(|v| v.is_finite()).collect();
    if valid.is_empty() {
        return None;
    }
    Some(valid.iter().sum::<f64>() / valid.len() as f64)
}

/// Summary averages over the user's filtered screen. Small filtered sets
/// still report; only a metric with zero valid samples reads as absent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenAverages {
    pub stocks_passing: usize,
    pub debt_to_ebitda: Option<f64>,
    pub ev_over_ebitda: Option<f64>,
    pub fcf_ni_ratio: Option<f64>,
    pub return_on_equity: Option<f64>,
}

pub fn screen_averages(records: &[StockRecord]) -> ScreenAverages {
    ScreenAverages {
        stocks_passing: records.len(),
        debt_to_ebitda: metric_average(records.iter().map(|r| r.debt_to_ebitda_ttm)),
        ev_over_ebitda: metric_average(records.iter().map(|r| r.ev_over_ebitda_ttm)),
        fcf_ni_ratio: metric_average(records.iter().map(|r| r.fcf_ni_ratio_ttm)),
        return_on_equity: metric_average(records.iter().map(|r| r.return_on_equity_ttm)),
    }
}

/// The metrics sampled per benchmark constituent.
#[derive(Debug, Clone, Copy, Default)]
pub struct BenchmarkSample {
    pub owner_earnings_yield: Option<f64>,
    pub revenue_cagr_5yr: Option<f64>,
    pub avg_rotce_5yr: Option<f64>,
    pub net_cash_to_market_cap: Option<f64>,
    pub rank_momentum_63: Option<f64>,
}

impl From<&StockRecord> for BenchmarkSample {
    fn from(record: &StockRecord) -> Self {
        Self {
            owner_earnings_yield: record.owner_earnings_yield,
            revenue_cagr_5yr: record.revenue_cagr_5yr,
            avg_rotce_5yr: record.avg_rotce_5yr,
            net_cash_to_market_cap: record.net_cash_to_market_cap,
            rank_momentum_63: record.rank_momentum_63.map(f64::from),
        }
    }
}

/// Averages across the external benchmark universe. A metric abstains when
/// fewer than 80% of the constituents produced a usable value, so a minority
/// sample never masquerades as the benchmark.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkAverages {
    pub owner_earnings_yield: Option<f64>,
    pub revenue_cagr_5yr: Option<f64>,
    pub avg_rotce_5yr: Option<f64>,
    pub net_cash_to_market_cap: Option<f64>,
    pub rank_momentum_63: Option<f64>,
}

impl BenchmarkAverages {
    /// Pure aggregation step: samples may be absent entirely (constituent
    /// fetch failed) or present with individual metrics missing.
    pub fn from_samples(samples: &[Option<BenchmarkSample>], universe_size: usize) -> Self {
        let average = |metric: fn(&BenchmarkSample) -> Option<f64>| -> Option<f64> {
            let valid: Vec<f64> = samples
                .iter()
                .flatten()
                .filter_map(metric)
                .filter(|v| v.is_finite())
                .collect();
            if (valid.len() as f64) < universe_size as f64 * BENCHMARK_MIN_VALID_SHARE {
                return None;
            }
            if valid.is_empty() {
                return None;
            }
            Some(valid.iter().sum::<f64>() / valid.len() as f64)
        };

        Self {
            owner_earnings_yield: average(|s| s.owner_earnings_yield),
            revenue_cagr_5yr: average(|s| s.revenue_cagr_5yr),
            avg_rotce_5yr: average(|s| s.avg_rotce_5yr),
            net_cash_to_market_cap: average(|s| s.net_cash_to_market_cap),
            rank_momentum_63: average(|s| s.rank_momentum_63),
        }
    }
}

/// Fetch the benchmark constituents and compute their metric averages.
/// Constituents are fetched in small batches with a pause in between.
pub async fn benchmark_averages<P: StockDataProvider>(
    collector: &UniverseCollector<P>,
) -> Result<BenchmarkAverages> {
    let provider = collector.provider();
    let config = collector.config().clone();

    let symbols = provider.benchmark_symbols().await?;
    if symbols.is_empty() {
        bail!("benchmark symbol list is empty");
    }
    info!("📊 Averaging {} benchmark constituents", symbols.len());

    let context = RefreshContext::load(&*provider).await;

    let mut samples: Vec<Option<BenchmarkSample>> = Vec::with_capacity(symbols.len());
    for (batch_index, batch) in symbols.chunks(config.benchmark_batch_size.max(1)).enumerate() {
        if batch_index > 0 && config.benchmark_batch_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(config.benchmark_batch_delay_ms)).await;
        }

        let fetched = futures::future::join_all(
            batch
                .iter()
                .map(|symbol| collector.assemble_symbol(symbol, &context)),
        )
        .await;

        for result in fetched {
            samples.push(result?.as_ref().map(BenchmarkSample::from));
        }
    }

    let averages = BenchmarkAverages::from_samples(&samples, symbols.len());
    Ok(averages)
}
