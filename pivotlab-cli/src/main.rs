//! PivotLab CLI — swing-pivot reentry strategy runner.
//!
//! Commands:
//! - `init` — write a default run config TOML
//! - `fetch` — download closed candles and export them as CSV
//! - `backtest` — run the strategy over a CSV file, a fresh fetch, or
//!   synthetic data
//! - `live` — poll for new candles and run the strategy until Ctrl-C

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::DateTime;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pivotlab_core::data::synthetic::random_walk;
use pivotlab_core::data::{BarSource, CircuitBreaker, CryptoCompareProvider};
use pivotlab_core::domain::Bar;
use pivotlab_runner::{
    read_bars_csv, run_backtest, write_bars_csv, BacktestReport, LiveRunner, RunConfig,
    TracingSink,
};

#[derive(Parser)]
#[command(
    name = "pivotlab",
    about = "PivotLab CLI — swing-pivot reentry strategy engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default run config TOML to the given path.
    Init {
        /// Output path for the config file.
        #[arg(long, default_value = "pivotlab.toml")]
        path: PathBuf,
    },
    /// Fetch closed candles for the configured pair and export them as CSV.
    Fetch {
        /// Path to the run config TOML.
        #[arg(long)]
        config: PathBuf,

        /// Output CSV path.
        #[arg(long, default_value = "bars.csv")]
        out: PathBuf,
    },
    /// Run a backtest over CSV, freshly fetched, or synthetic bars.
    Backtest {
        /// Path to the run config TOML.
        #[arg(long)]
        config: PathBuf,

        /// Read bars from a CSV file instead of the network.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Generate this many synthetic bars instead of fetching.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Seed for synthetic data.
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Poll for new candles and run the strategy until interrupted.
    Live {
        /// Path to the run config TOML.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Init { path } => init_config(&path),
        Commands::Fetch { config, out } => fetch(&config, &out),
        Commands::Backtest {
            config,
            csv,
            synthetic,
            seed,
        } => backtest(&config, csv.as_deref(), synthetic, seed),
        Commands::Live { config } => live(&config),
    }
}

fn init_config(path: &std::path::Path) -> Result<()> {
    if path.exists() {
        bail!("refusing to overwrite existing config at {}", path.display());
    }
    let config = RunConfig::default();
    std::fs::write(path, toml::to_string_pretty(&config)?)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote default config to {}", path.display());
    println!("Set market.api_key before fetching live data.");
    Ok(())
}

fn provider_for(config: &RunConfig) -> CryptoCompareProvider {
    CryptoCompareProvider::new(
        config.market.api_key.clone(),
        Arc::new(CircuitBreaker::default_provider()),
    )
}

fn fetch(config_path: &std::path::Path, out: &std::path::Path) -> Result<()> {
    let config = RunConfig::load(config_path)?;
    let provider = provider_for(&config);
    let query = config.market_query();
    let bars = provider
        .fetch(&query)
        .with_context(|| format!("fetching {}", query.pair()))?;
    if bars.is_empty() {
        bail!("no closed bars returned for {}", query.pair());
    }
    write_bars_csv(out, &bars)?;
    println!(
        "Wrote {} bars for {} to {}",
        bars.len(),
        query.pair(),
        out.display()
    );
    Ok(())
}

fn load_backtest_bars(
    config: &RunConfig,
    csv: Option<&std::path::Path>,
    synthetic: Option<usize>,
    seed: u64,
) -> Result<Vec<Bar>> {
    match (csv, synthetic) {
        (Some(_), Some(_)) => bail!("--csv and --synthetic are mutually exclusive"),
        (Some(path), None) => {
            let bars = read_bars_csv(path)?;
            println!("Loaded {} bars from {}", bars.len(), path.display());
            Ok(bars)
        }
        (None, Some(count)) => {
            let start = DateTime::from_timestamp(1_700_000_000, 0).expect("valid epoch");
            Ok(random_walk(
                seed,
                count,
                100.0,
                start,
                config.market.granularity,
            ))
        }
        (None, None) => {
            let provider = provider_for(config);
            let query = config.market_query();
            let bars = provider
                .fetch(&query)
                .with_context(|| format!("fetching {}", query.pair()))?;
            println!("Fetched {} bars for {}", bars.len(), query.pair());
            Ok(bars)
        }
    }
}

fn backtest(
    config_path: &std::path::Path,
    csv: Option<&std::path::Path>,
    synthetic: Option<usize>,
    seed: u64,
) -> Result<()> {
    let config = RunConfig::load(config_path)?;
    let bars = load_backtest_bars(&config, csv, synthetic, seed)?;
    let mut sink = TracingSink;
    let report = run_backtest(&config, &bars, &mut sink)?;
    print_report(&report);
    Ok(())
}

fn live(config_path: &std::path::Path) -> Result<()> {
    let config = RunConfig::load(config_path)?;

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = stop.clone();
    ctrlc::set_handler(move || {
        // First Ctrl-C requests a clean stop after the in-flight bar.
        handler_stop.store(true, Ordering::Relaxed);
        eprintln!("stop requested, finishing current cycle...");
    })
    .context("failed to install Ctrl-C handler")?;

    let source = Box::new(provider_for(&config));
    let runner = LiveRunner::new(config, source, stop);
    let mut sink = TracingSink;
    let report = runner.run(&mut sink)?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &BacktestReport) {
    let s = &report.summary;
    println!("\n── Session summary ───────────────────────────");
    println!("Run id:          {}", report.run_id);
    println!("Bars processed:  {}", report.bars_processed);
    println!("Initial capital: {:.2}", report.initial_capital);
    println!("Final equity:    {:.2}", report.final_equity);
    println!(
        "Net PnL:         {:.2} ({:.2}%)",
        s.total_net_pnl,
        s.total_return * 100.0
    );
    println!(
        "Trades:          {} ({} wins / {} losses, win rate {:.1}%)",
        s.trade_count,
        s.winning_trades,
        s.losing_trades,
        s.win_rate * 100.0
    );
    println!("Avg PnL/trade:   {:.4}", s.avg_net_pnl);
    println!("Profit factor:   {:.2}", s.profit_factor);
    println!("Max drawdown:    {:.2}%", s.max_drawdown * 100.0);
    println!("Commission paid: {:.4}", s.commission_paid);
}
