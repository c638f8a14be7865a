//! Universe construction: orchestrates per-symbol fetches and assembles
//! fully-populated stock records.
//!
//! A record is only handed out once every derived field has been computed;
//! callers never observe a partially built record. Authentication failures
//! abort the build, any other per-symbol failure just leaves the affected
//! fields absent.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Months, Utc};
use rand::Rng;
use tracing::{info, warn};

use crate::analysis::categories;
use crate::analysis::metrics::{self, finite};
use crate::analysis::scoring::{self, ScoreInputs};
use crate::analysis::{FINANCIAL_HISTORY_YEARS, TREND_WINDOW_YEARS};
use crate::api::{ApiError, StockDataProvider};
use crate::models::{Config, FmpScreenerItem, MarketCapBucket, StockRecord};

/// Per-refresh state loaded once and passed into record assembly.
#[derive(Debug, Clone, Default)]
pub struct RefreshContext {
    pub reg_sho: HashSet<String>,
}

impl RefreshContext {
    /// Load the context from the provider. A failed Reg-SHO load degrades to
    /// an empty set rather than blocking the refresh.
    pub async fn load<P: StockDataProvider + ?Sized>(provider: &P) -> Self {
        let reg_sho = match provider.reg_sho_symbols().await {
            Ok(symbols) => symbols,
            Err(e) => {
                warn!("Failed to load Reg-SHO symbols: {}", e);
                HashSet::new()
            }
        };
        info!("📋 Loaded {} Reg-SHO symbols", reg_sho.len());
        Self { reg_sho }
    }
}

/// Builds the screener universe from a market-data provider.
pub struct UniverseCollector<P: StockDataProvider> {
    provider: Arc<P>,
    config: Config,
}

/// Contain transient fetch failures; only authentication problems escape.
fn allow_missing<T: Default>(
    result: Result<T, ApiError>,
    symbol: &str,
    what: &str,
) -> Result<T, ApiError> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.is_auth() => Err(e),
        Err(e) => {
            warn!("Missing {} for {}: {}", what, symbol, e);
            Ok(T::default())
        }
    }
}

impl<P: StockDataProvider> UniverseCollector<P> {
    pub fn new(provider: Arc<P>, config: Config) -> Self {
        Self { provider, config }
    }

    pub fn provider(&self) -> Arc<P> {
        Arc::clone(&self.provider)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Rebuild the whole universe. Records come back fully derived and are
    /// meant to replace any previous snapshot wholesale.
    pub async fn build_universe(&self) -> Result<Vec<StockRecord>, ApiError> {
        info!("🔍 Building screener universe (target {} stocks)", self.config.universe_size);

        let context = RefreshContext::load(&*self.provider).await;
        let seeds = self.seed_universe().await?;
        info!("📊 Screener seeds: {} symbols", seeds.len());

        let mut records = Vec::with_capacity(seeds.len());
        for (batch_index, batch) in seeds.chunks(self.config.fetch_batch_size.max(1)).enumerate() {
            if batch_index > 0 && self.config.fetch_batch_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.fetch_batch_delay_ms)).await;
            }

            let assembled = futures::future::join_all(
                batch.iter().map(|seed| self.assemble_record(seed, &context)),
            )
            .await;

            for result in assembled {
                if let Some(record) = result? {
                    records.push(record);
                }
            }
        }

        info!("✅ Assembled {} of {} universe records", records.len(), seeds.len());
        Ok(records)
    }

    /// Refresh a single symbol outside the screener seeding, e.g. for the
    /// benchmark universe. Returns `None` when no quote exists.
    pub async fn assemble_symbol(
        &self,
        symbol: &str,
        context: &RefreshContext,
    ) -> Result<Option<StockRecord>, ApiError> {
        let quote = allow_missing(self.provider.quote(symbol).await, symbol, "quote")?;
        let Some(quote) = quote else {
            return Ok(None);
        };

        let seed = FmpScreenerItem {
            symbol: symbol.to_string(),
            price: quote.price,
            market_cap: quote.market_cap,
            volume: quote.avg_volume,
            ..Default::default()
        };
        self.assemble_record(&seed, context).await
    }

    /// Pull the screener seed list: one slice per market-cap class, merged
    /// in ascending-size order with ETFs, funds and inactive names dropped.
    async fn seed_universe(&self) -> Result<Vec<FmpScreenerItem>, ApiError> {
        let per_slice = self.config.universe_size / 4;
        let mid_large_target = std::cmp::max(
            10,
            self.config.universe_size.saturating_sub(per_slice * 3),
        );

        let (nano, micro, small, mid_large) = tokio::join!(
            self.provider.screener_slice(MarketCapBucket::Nano, per_slice),
            self.provider.screener_slice(MarketCapBucket::Micro, per_slice),
            self.provider.screener_slice(MarketCapBucket::Small, per_slice),
            self.provider.screener_slice(MarketCapBucket::MidLarge, mid_large_target),
        );

        let slices = [
            allow_missing(nano, "universe", "nano-cap slice")?,
            allow_missing(micro, "universe", "micro-cap slice")?,
            allow_missing(small, "universe", "small-cap slice")?,
            allow_missing(mid_large, "universe", "mid/large-cap slice")?,
        ];

        let mut seen = HashSet::new();
        let mut seeds = Vec::new();
        for item in slices.into_iter().flatten() {
            if item.symbol.trim().is_empty() {
                continue;
            }
            if item.is_etf == Some(true) || item.is_fund == Some(true) {
                continue;
            }
            if item.is_actively_trading == Some(false) {
                continue;
            }
            if seen.insert(item.symbol.clone()) {
                seeds.push(item);
            }
        }

        seeds.truncate(self.config.universe_size);
        Ok(seeds)
    }

    /// Fetch everything for one symbol and derive the full record.
    async fn assemble_record(
        &self,
        seed: &FmpScreenerItem,
        context: &RefreshContext,
    ) -> Result<Option<StockRecord>, ApiError> {
        let symbol = seed.symbol.trim();
        if symbol.is_empty() {
            return Ok(None);
        }

        let (quote, ratios, key_metrics) = tokio::join!(
            self.provider.quote(symbol),
            self.provider.ratios_ttm(symbol),
            self.provider.key_metrics_ttm(symbol),
        );
        let quote = allow_missing(quote, symbol, "quote")?;
        let ratios = allow_missing(ratios, symbol, "TTM ratios")?;
        let key_metrics = allow_missing(key_metrics, symbol, "TTM key metrics")?;

        let (figures, insider_trades, insider_ownership) = tokio::join!(
            self.provider.annual_figures(symbol, FINANCIAL_HISTORY_YEARS),
            self.provider.insider_trades(symbol),
            self.provider.insider_ownership_pct(symbol),
        );
        let figures = allow_missing(figures, symbol, "annual figures")?;
        let insider_trades = allow_missing(insider_trades, symbol, "insider trades")?;
        let insider_ownership = allow_missing(insider_ownership, symbol, "insider ownership")?;

        // --- Point-in-time market data ---
        let quote = quote.unwrap_or_default();
        let ratios = ratios.unwrap_or_default();
        let key_metrics = key_metrics.unwrap_or_default();

        let price = finite(seed.price).or(finite(quote.price)).unwrap_or(0.0);
        let market_cap = finite(seed.market_cap).or(finite(quote.market_cap));
        let avg_volume = finite(quote.avg_volume).or(finite(seed.volume));
        let latest_figures = figures.last();
        let shares_outstanding = finite(quote.shares_outstanding)
            .or(latest_figures.and_then(|f| finite(f.shares_outstanding)))
            .filter(|s| *s > 0.0);

        // --- Trailing-twelve-month ratios ---
        let pe_ratio_ttm = finite(ratios.price_earnings_ratio_ttm);
        let debt_equity_ratio_ttm = finite(ratios.debt_equity_ratio_ttm);
        let return_on_equity_ttm =
            finite(ratios.return_on_tangible_equity_ttm).or(finite(ratios.return_on_equity_ttm));
        let net_income_per_share_ttm = finite(ratios.net_income_per_share_ttm);
        let interest_coverage_ttm = finite(ratios.interest_coverage_ttm);
        let debt_to_ebitda_ttm = finite(key_metrics.debt_to_ebitda_ttm);
        let ev_over_ebitda_ttm = finite(key_metrics.enterprise_value_over_ebitda_ttm);
        let fcf_per_share_ttm = finite(key_metrics.free_cash_flow_per_share_ttm);

        let fcf_ni_ratio_ttm = metrics::fcf_to_net_income(fcf_per_share_ttm, net_income_per_share_ttm);

        // --- Multi-year derivations ---
        let pnca_ratio = latest_figures
            .and_then(|latest| metrics::price_to_ncav(price, shares_outstanding, latest));

        let share_count_cagr_3yr = if figures.len() >= TREND_WINDOW_YEARS {
            let shares: Vec<Option<f64>> = figures[figures.len() - TREND_WINDOW_YEARS..]
                .iter()
                .map(|f| f.shares_outstanding)
                .collect();
            metrics::cagr(&shares, shares.len().saturating_sub(1))
        } else {
            None
        };

        let gross_margin_trend = if figures.len() >= 2 {
            let window = figures.len().min(TREND_WINDOW_YEARS);
            let margins: Vec<Option<f64>> = figures[figures.len() - window..]
                .iter()
                .map(|f| f.gross_profit_ratio)
                .collect();
            metrics::margin_trend(&margins)
        } else {
            None
        };

        let incremental_roic = if figures.len() >= 2 {
            metrics::incremental_roic(&figures[figures.len() - 2], &figures[figures.len() - 1])
        } else {
            None
        };

        let revenue_cagr_3yr = if figures.len() >= TREND_WINDOW_YEARS {
            let revenues: Vec<Option<f64>> = figures[figures.len() - TREND_WINDOW_YEARS..]
                .iter()
                .map(|f| f.revenue)
                .collect();
            metrics::cagr(&revenues, revenues.len().saturating_sub(1))
        } else {
            None
        };

        let revenue_cagr_5yr = if figures.len() >= FINANCIAL_HISTORY_YEARS {
            let revenues: Vec<Option<f64>> = figures[figures.len() - FINANCIAL_HISTORY_YEARS..]
                .iter()
                .map(|f| f.revenue)
                .collect();
            metrics::cagr(&revenues, FINANCIAL_HISTORY_YEARS - 1)
        } else {
            None
        };

        let avg_rotce_5yr = metrics::avg_tangible_roe(&figures);

        let net_cash_to_market_cap =
            latest_figures.and_then(|latest| metrics::net_cash_to_market_cap(latest, market_cap));

        let days_to_exit_position =
            metrics::days_to_exit_position(shares_outstanding, avg_volume);

        // --- Insider activity over the trailing six months ---
        let today = Utc::now().date_naive();
        let cutoff = today.checked_sub_months(Months::new(6)).unwrap_or(today);
        let activity = metrics::insider_activity(&insider_trades, cutoff);
        let insider_buy_value_to_market_cap =
            metrics::insider_buy_value_ratio(activity.buy_value, market_cap);

        let owner_earnings_yield = metrics::owner_earnings_yield(fcf_per_share_ttm, price);

        // --- Composite score and momentum baseline ---
        let mut rng = rand::thread_rng();
        // No live catalyst feed is wired up yet; the flag is sampled.
        let has_catalyst = rng.gen_bool(0.2);

        let score_inputs = ScoreInputs {
            fcf_per_share: fcf_per_share_ttm,
            price,
            net_cash_to_market_cap,
            insider_buy_value_to_market_cap,
            revenue_cagr_3yr,
            has_catalyst,
        };
        let simple_score = scoring::simple_score(&score_inputs);
        let score_63_days_ago = scoring::score_63_days_ago(simple_score, &mut rng);
        let rank_momentum_63 = Some(scoring::rank_momentum(simple_score, score_63_days_ago));

        let is_reg_sho = context.reg_sho.contains(&symbol.to_uppercase());

        Ok(Some(StockRecord {
            symbol: symbol.to_string(),
            name: seed
                .company_name
                .clone()
                .unwrap_or_else(|| "N/A".to_string()),
            sector: seed.sector.clone().unwrap_or_else(|| "N/A".to_string()),

            price,
            market_cap,
            avg_volume,
            shares_outstanding,
            price_change_pct_1d: finite(quote.changes_percentage),
            year_high: finite(quote.year_high),
            year_low: finite(quote.year_low),

            pe_ratio_ttm,
            debt_equity_ratio_ttm,
            return_on_equity_ttm,
            debt_to_ebitda_ttm,
            ev_over_ebitda_ttm,
            fcf_per_share_ttm,
            net_income_per_share_ttm,
            interest_coverage_ttm,

            fcf_ni_ratio_ttm,
            pnca_ratio,
            share_count_cagr_3yr,
            gross_margin_trend,
            incremental_roic,
            net_insider_buy_tx_6m: activity.net_buy_tx,
            insider_ownership_pct: insider_ownership,
            avg_rotce_5yr,
            days_to_exit_position,
            net_cash_to_market_cap,
            insider_buy_value_to_market_cap,
            revenue_cagr_3yr,
            revenue_cagr_5yr,
            owner_earnings_yield,

            simple_score,
            score_63_days_ago,
            rank_momentum_63,

            market_cap_category: categories::market_cap_bucket(market_cap),
            volume_category: categories::volume_bucket(avg_volume),
            debt_category: categories::debt_bucket(debt_equity_ratio_ttm),
            valuation_category: categories::valuation_bucket(pe_ratio_ttm),
            rotce_category: categories::roe_bucket(return_on_equity_ttm),
            deep_value_category: categories::deep_value_bucket(pnca_ratio.as_ref()),
            share_count_cagr_category: categories::share_count_cagr_bucket(share_count_cagr_3yr),
            insider_ownership_category: categories::insider_ownership_bucket(insider_ownership),
            net_insider_buys_category: Some(categories::insider_buys_bucket(activity.net_buy_tx)),
            incremental_roic_category: categories::incremental_roic_bucket(incremental_roic),
            moat_keywords_category: None,
            red_flags_category: None,

            has_catalyst,
            is_reg_sho,
        }))
    }
}
