//! # lineup_report
//!
//! Loads the historical actual and plan files, runs one forecast generation
//! and writes the unified series as CSV.

use clap::Parser;
use lineup_forecast::{DataLoader, ForecastConfig, ForecastService, Result};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lineup_report")]
#[command(about = "Forecast lineups and reconcile them with actuals and plans", long_about = None)]
struct Cli {
    /// Historical actuals (CSV)
    #[arg(short, long)]
    actuals: PathBuf,

    /// Historical plans (CSV)
    #[arg(short, long)]
    plans: PathBuf,

    /// Forecast configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of months to forecast, overrides the configuration
    #[arg(long)]
    horizon: Option<usize>,

    /// Where to write the unified series
    #[arg(short, long, default_value = "unified_data.csv")]
    output: PathBuf,

    /// Also print the yearly/monthly totals
    #[arg(short, long)]
    summary: bool,
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => ForecastConfig::from_json_file(path)?,
        None => ForecastConfig::default(),
    };
    if let Some(horizon) = cli.horizon {
        config = config.with_horizon(horizon);
    }

    let store = DataLoader::load_store(&cli.actuals, &cli.plans)?;
    let service = ForecastService::new(store, config)?;

    println!("{}", serde_json::to_string_pretty(&service.data_summary())?);

    let generation = service.generate()?;
    println!("{}", serde_json::to_string_pretty(&generation)?);

    if cli.summary {
        println!("{}", serde_json::to_string_pretty(&service.yearly_summary()?)?);
    }

    service.export_csv(&cli.output)?;
    println!("Unified data written to {}", cli.output.display());
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "lineup_report failed");
            ExitCode::FAILURE
        }
    }
}
