//! SignalBench CLI: backtest a strategy and print the accept/reject verdict.
//!
//! Commands:
//! - `run`: backtest a registered strategy against CSV or synthetic data
//! - `strategies`: list registered strategy names

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use signalbench_core::data::{CsvProvider, DataProvider, SyntheticProvider};
use signalbench_runner::{
    validate, BacktestEngine, InstrumentStatus, RunConfig, StrategyParams, StrategyRegistry,
    Validation,
};

#[derive(Parser)]
#[command(
    name = "signalbench",
    about = "SignalBench: walk-forward backtests with a go/no-go verdict"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest a strategy using a TOML run file.
    Run {
        /// Path to the TOML run file.
        #[arg(long)]
        config: PathBuf,

        /// Registered strategy name (see `signalbench strategies`).
        #[arg(long, default_value = "ma_crossover")]
        strategy: String,

        /// Strategy parameter as key=value. Repeatable.
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, f64)>,

        /// Directory of `<INSTRUMENT>_<timeframe>.csv` files.
        #[arg(long, conflicts_with = "synthetic")]
        data_dir: Option<PathBuf>,

        /// Use the deterministic synthetic random-walk provider.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Override the acceptance threshold from the run file.
        #[arg(long, allow_hyphen_values = true)]
        threshold: Option<f64>,

        /// Print the full validation as JSON instead of the summary.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Exit with status 2 when the strategy is rejected.
        #[arg(long, default_value_t = false)]
        fail_on_reject: bool,
    },
    /// List registered strategy names.
    Strategies,
}

fn parse_param(s: &str) -> Result<(String, f64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid value for '{key}': {e}"))?;
    Ok((key.trim().to_string(), value))
}

/// Used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "signalbench_core=info,signalbench_runner=info";

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let registry = StrategyRegistry::with_builtins();

    match cli.command {
        Commands::Run {
            config,
            strategy,
            params,
            data_dir,
            synthetic,
            threshold,
            json,
            fail_on_reject,
        } => {
            let validation = run_backtest_cmd(
                &registry,
                &config,
                &strategy,
                params.into_iter().collect(),
                data_dir,
                synthetic,
                threshold,
            )?;

            if json {
                println!("{}", validation.to_json_pretty()?);
            } else {
                print_summary(&validation);
            }

            if fail_on_reject && !validation.accepted {
                std::process::exit(2);
            }
            Ok(())
        }
        Commands::Strategies => {
            for name in registry.names() {
                println!("{name}");
            }
            Ok(())
        }
    }
}

fn run_backtest_cmd(
    registry: &StrategyRegistry,
    config_path: &Path,
    strategy_name: &str,
    params: StrategyParams,
    data_dir: Option<PathBuf>,
    synthetic: bool,
    threshold: Option<f64>,
) -> Result<Validation> {
    let run_config = RunConfig::load(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let provider: Box<dyn DataProvider> = match (data_dir, synthetic) {
        (Some(dir), false) => Box::new(CsvProvider::new(dir)),
        (None, true) => Box::new(SyntheticProvider::default()),
        (None, false) => bail!("one of --data-dir or --synthetic is required"),
        (Some(_), true) => bail!("--data-dir and --synthetic are mutually exclusive"),
    };

    let threshold = threshold.unwrap_or(run_config.validation.threshold);
    if !threshold.is_finite() {
        bail!("--threshold must be a finite number");
    }

    let strategy = registry.create(strategy_name, &params)?;
    let result =
        BacktestEngine::new(provider.as_ref()).run(strategy.as_ref(), &run_config.backtest)?;
    Ok(validate(result, threshold))
}

fn print_summary(validation: &Validation) {
    let result = &validation.result;
    let d = &result.diagnostics;

    println!();
    println!("=== Backtest Result ===");
    println!("Strategy:       {}", result.strategy);
    println!(
        "Config:         {}",
        &result.config_fingerprint[..16.min(result.config_fingerprint.len())]
    );
    println!(
        "Instruments:    {} evaluated, {} unavailable, {} fetch errors",
        d.instruments_evaluated, d.instruments_unavailable, d.provider_errors
    );
    println!("Steps:          {}", d.steps_evaluated);
    println!("Signals:        {}", d.signals);
    println!("Trades:         {}", result.trade_count);
    println!();
    println!("--- Performance ---");
    println!("Avg Return:     {:.4}%", result.average_return * 100.0);
    println!("Win Rate:       {:.1}%", result.win_rate * 100.0);
    println!("Best Trade:     {:.4}%", result.stats.best_return * 100.0);
    println!("Worst Trade:    {:.4}%", result.stats.worst_return * 100.0);
    println!("Std Dev:        {:.4}%", result.stats.return_std_dev * 100.0);
    println!("Profit Factor:  {:.2}", result.stats.profit_factor);
    println!("Max Consec Win: {}", result.stats.max_consecutive_wins);
    println!("Max Consec Loss:{}", result.stats.max_consecutive_losses);

    if !result.instruments.is_empty() {
        println!();
        println!(
            "{:<12} {:<14} {:>8} {:>8} {:>10}",
            "Instrument", "Status", "Bars", "Trades", "Avg Ret"
        );
        println!("{}", "-".repeat(56));
        for report in &result.instruments {
            let status = match &report.status {
                InstrumentStatus::Evaluated => "ok",
                InstrumentStatus::NoData => "no data",
                InstrumentStatus::TooShort { .. } => "too short",
                InstrumentStatus::InvalidSeries { .. } => "invalid series",
                InstrumentStatus::FetchFailed { .. } => "fetch failed",
            };
            println!(
                "{:<12} {:<14} {:>8} {:>8} {:>9.4}%",
                report.instrument,
                status,
                report.bar_count,
                report.trade_count,
                report.average_return * 100.0
            );
        }
    }

    if d.strategy_faults > 0 || d.malformed_signals > 0 || d.invalid_price_steps > 0 {
        println!();
        println!(
            "WARNING: {} strategy faults, {} malformed signals, {} invalid-price steps",
            d.strategy_faults, d.malformed_signals, d.invalid_price_steps
        );
    }

    println!();
    println!(
        "Verdict:        {} (threshold {:.4}%)",
        validation.verdict.label(),
        validation.threshold * 100.0
    );
    if validation.no_trades {
        println!("WARNING: no trades were produced; check the data source and strategy warmup");
    }
}
