//! finprobe CLI: data collection, price lookup, and document classification.
//!
//! Commands:
//! - `run`: full collection pipeline for one ticker, then routing and sentiment
//! - `prices`: price fallback chain only
//! - `classify`: keyword classifier on a single document, no network
//! - `settings`: resolved configuration with credential presence

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use finprobe_core::classify::classify;
use finprobe_core::data::{AllSourcesFailed, Interval, Lookback};
use finprobe_core::domain::NewsDocument;
use finprobe_runner::{
    build_price_chain, render_prices, render_settings, render_summary, AppConfig, Pipeline,
    PipelineError, PLAN,
};

#[derive(Parser)]
#[command(
    name = "finprobe",
    about = "finprobe: multi-source financial data collection with keyword routing"
)]
struct Cli {
    /// Path to a TOML file overriding run settings.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect prices, financials, macro and news, then classify the news.
    Run {
        /// Ticker to collect. Defaults to the configured ticker.
        #[arg(long)]
        ticker: Option<String>,

        /// Print the full report as JSON instead of text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Fetch prices through the fallback chain.
    Prices {
        /// Ticker symbol (e.g., AAPL).
        ticker: String,

        /// Lookback: 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max.
        #[arg(long)]
        period: Option<Lookback>,

        /// Interval: 1d, 1wk, 1mo.
        #[arg(long)]
        interval: Option<Interval>,

        /// Number of trailing rows to print.
        #[arg(long, default_value_t = 5)]
        rows: usize,
    },
    /// Route and score a single document.
    Classify {
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        content: String,
    },
    /// Print resolved settings. Keys are shown as Present/Missing.
    Settings,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("RUST_LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config_path = cli.config;
    let load = || AppConfig::load(config_path.as_deref()).context("failed to load configuration");

    match cli.command {
        Commands::Run { ticker, json } => run_pipeline(load()?, ticker, json),
        Commands::Prices {
            ticker,
            period,
            interval,
            rows,
        } => run_prices(load()?, ticker, period, interval, rows),
        Commands::Classify { title, content } => run_classify(&title, &content),
        Commands::Settings => {
            print!("{}", render_settings(&load()?));
            Ok(())
        }
    }
}

fn run_pipeline(config: AppConfig, ticker: Option<String>, json: bool) -> Result<()> {
    let config = match ticker {
        Some(t) => config.with_ticker(t)?,
        None => config,
    };
    let pipeline = Pipeline::from_config(&config)?;

    if !json {
        println!("{PLAN}\n");
        println!("{}", render_settings(&config));
    }

    let report = match pipeline.run(&config) {
        Ok(report) => report,
        Err(PipelineError::Prices(failed)) => {
            print_failures(&failed);
            return Err(failed.into());
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", render_summary(&report));
    }
    Ok(())
}

fn run_prices(
    config: AppConfig,
    ticker: String,
    period: Option<Lookback>,
    interval: Option<Interval>,
    rows: usize,
) -> Result<()> {
    let lookback = match period {
        Some(p) => p,
        None => config.run.lookback()?,
    };
    let interval = match interval {
        Some(i) => i,
        None => config.run.interval()?,
    };

    let chain = build_price_chain(&config)?;
    let order: Vec<String> = chain.order().iter().map(|p| p.to_string()).collect();
    println!("Fallback order: {}", order.join(" -> "));

    match chain.fetch(&ticker, lookback, interval) {
        Ok(series) => {
            print!("{}", render_prices(&series, rows));
            Ok(())
        }
        Err(failed) => {
            print_failures(&failed);
            Err(failed.into())
        }
    }
}

fn run_classify(title: &str, content: &str) -> Result<()> {
    let result = classify(NewsDocument::new(title, content, "", ""));
    println!("route={}", result.route);
    println!("sentiment={}", result.sentiment);
    println!("reason={}", result.reason);
    Ok(())
}

fn print_failures(failed: &AllSourcesFailed) {
    eprintln!("Price fetch failed for {}:", failed.symbol);
    for reason in failed.reasons() {
        eprintln!("  - {reason}");
    }
}
