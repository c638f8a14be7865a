use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use rust_screener::alerts::{AlertEngine, MemorySessionStore};
use rust_screener::api::FmpClient;
use rust_screener::benchmark::{benchmark_averages, screen_averages};
use rust_screener::collector::UniverseCollector;
use rust_screener::filters::simple_mode::{simple_mode_filters, SimpleSliderValues};
use rust_screener::filters::{apply_filters, paginate, ActiveFilters, STOCKS_PER_PAGE};
use rust_screener::models::Config;

/// One-shot stock screen: build the universe, apply filters, print results.
#[derive(Debug, Parser)]
#[command(name = "rust-screener", about = "Deep-value stock screener")]
struct Args {
    /// Free-text search over symbol, name and sector
    #[arg(long, default_value = "")]
    search: String,

    /// Simple-mode size slider (0-100); enables simple mode together with
    /// --value and --quality
    #[arg(long)]
    size: Option<u8>,

    /// Simple-mode value slider (0-100)
    #[arg(long)]
    value: Option<u8>,

    /// Simple-mode quality slider (0-100)
    #[arg(long)]
    quality: Option<u8>,

    /// Advanced filter as key=value, repeatable (e.g. --filter marketCap=micro)
    #[arg(long = "filter", value_parser = parse_key_value)]
    filters: Vec<(String, String)>,

    /// Result pages to materialize
    #[arg(long, default_value_t = 1)]
    pages: usize,

    /// Also compute benchmark universe averages
    #[arg(long)]
    benchmark: bool,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

fn active_filters(args: &Args) -> ActiveFilters {
    let simple_mode = args.size.is_some() || args.value.is_some() || args.quality.is_some();
    if simple_mode {
        let sliders = SimpleSliderValues {
            size: args.size.unwrap_or(50),
            value: args.value.unwrap_or(50),
            quality: args.quality.unwrap_or(50),
        };
        simple_mode_filters(&sliders)
    } else {
        args.filters.iter().cloned().collect()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rust_screener=info")),
        )
        .init();

    let args = Args::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("❌ Configuration Error: {}", e);
            eprintln!("Make sure FMP_API_KEY is set in the environment or a .env file.");
            std::process::exit(1);
        }
    };

    let client = Arc::new(FmpClient::new(&config)?);
    let collector = UniverseCollector::new(Arc::clone(&client), config.clone());

    let universe = collector.build_universe().await?;
    let filters = active_filters(&args);
    let matched = apply_filters(&universe, &args.search, &filters);
    let shown = paginate(&matched, args.pages, STOCKS_PER_PAGE);

    println!();
    println!("📊 {} of {} stocks pass the screen", matched.len(), universe.len());
    println!(
        "{:<8} {:<28} {:>9} {:>6} {:>5}  {:<9} {:<7}",
        "Symbol", "Name", "Price", "Score", "Mom", "Size", "Value"
    );
    for record in shown {
        println!(
            "{:<8} {:<28} {:>9.2} {:>6} {:>5}  {:<9} {:<7}",
            record.symbol,
            record.name.chars().take(28).collect::<String>(),
            record.price,
            record.simple_score,
            record
                .rank_momentum_63
                .map(|m| m.to_string())
                .unwrap_or_else(|| "-".to_string()),
            record
                .market_cap_category
                .map(|c| c.as_str())
                .unwrap_or("N/A"),
            record
                .valuation_category
                .map(|c| c.as_str())
                .unwrap_or("N/A"),
        );
    }

    let averages = screen_averages(&matched);
    println!();
    println!(
        "Averages: Debt/EBITDA {}  EV/EBITDA {}  FCF/NI {}  ROE {}",
        format_avg(averages.debt_to_ebitda, ""),
        format_avg(averages.ev_over_ebitda, ""),
        format_avg(averages.fcf_ni_ratio, ""),
        format_avg(averages.return_on_equity.map(|v| v * 100.0), "%"),
    );

    // One alert pass over the fresh snapshot.
    let session = Arc::new(MemorySessionStore::new());
    let mut engine = AlertEngine::new(session);
    for alert in engine.observe_snapshot(&universe) {
        println!("{}", alert.message);
    }

    if args.benchmark {
        let averages = benchmark_averages(&collector).await?;
        println!();
        println!("Benchmark averages:");
        println!(
            "  Owner-earnings yield: {}",
            format_avg(averages.owner_earnings_yield.map(|v| v * 100.0), "%")
        );
        println!(
            "  Revenue CAGR (5yr):   {}",
            format_avg(averages.revenue_cagr_5yr.map(|v| v * 100.0), "%")
        );
        println!(
            "  Avg ROE (5yr):        {}",
            format_avg(averages.avg_rotce_5yr.map(|v| v * 100.0), "%")
        );
        println!(
            "  Net cash / MCap:      {}",
            format_avg(averages.net_cash_to_market_cap.map(|v| v * 100.0), "%")
        );
        println!(
            "  Rank momentum (63d):  {}",
            format_avg(averages.rank_momentum_63, "")
        );
    }

    Ok(())
}

fn format_avg(value: Option<f64>, suffix: &str) -> String {
    match value {
        Some(v) => format!("{v:.2}{suffix}"),
        None => "N/A".to_string(),
    }
}
