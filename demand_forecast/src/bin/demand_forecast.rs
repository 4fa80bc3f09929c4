//! Train segment models from CSV sources and print forecasts
//!
//! ```text
//! demand-forecast --sales sales_data.csv --weather weather_data.csv --events events_data.csv
//! ```

use clap::Parser;
use demand_forecast::{forecasts_to_json, DemandPipeline, ForecastConfig, Result};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Per-store, per-product demand forecasting")]
struct Args {
    /// Sales history CSV
    #[arg(long, default_value = "sales_data.csv")]
    sales: PathBuf,

    /// Weather CSV
    #[arg(long, default_value = "weather_data.csv")]
    weather: PathBuf,

    /// Events CSV
    #[arg(long, default_value = "events_data.csv")]
    events: PathBuf,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Days to forecast
    #[arg(short, long, default_value = "7")]
    days: usize,

    /// Store to forecast
    #[arg(long, default_value = "store_001")]
    store: String,

    /// Products to forecast
    #[arg(long, value_delimiter = ',', default_value = "ice_cream,hot_coffee")]
    products: Vec<String>,

    /// Write the performance summary CSV here
    #[arg(long)]
    summary: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run(Args::parse()) {
        error!(error = %e, "demand forecast failed");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => ForecastConfig::from_json_file(path)?,
        None => ForecastConfig::default(),
    };

    let mut pipeline = DemandPipeline::from_csv(config, &args.sales, &args.weather, &args.events)?;
    let report = pipeline.train()?;
    info!(
        trained = report.trained.len(),
        skipped = report.skipped.len(),
        budget_exhausted = report.budget_exhausted,
        "training complete"
    );

    println!("\nModel performance summary:");
    println!("{:<12} {:<16} {:>10} {:>10} {:>8}", "store_id", "product", "mape", "rmse", "train");
    for row in pipeline.summary() {
        println!(
            "{:<12} {:<16} {:>10.2} {:>10.2} {:>8}",
            row.store_id, row.product, row.mape, row.rmse, row.train_size
        );
    }

    let mut weather = pipeline.weather_sampler();
    for product in &args.products {
        match pipeline.forecast(&args.store, product, args.days, &mut weather)? {
            Some(points) => {
                println!("\n{} / {} ({} days):", args.store, product, args.days);
                println!("{}", forecasts_to_json(&points)?);
            }
            None => println!("\n{} / {}: no model available", args.store, product),
        }
    }

    if let Some(path) = &args.summary {
        pipeline.write_summary_csv(path)?;
    }

    Ok(())
}
