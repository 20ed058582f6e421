//! swellcast CLI
//!
//! Looks up the marine and wind forecast for a place and prints it as a table
//! or as JSON.

#![allow(clippy::print_stdout)]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use swellcast::{
    ForecastAggregator, ForecastReport, LookupOutcome, LookupSession, ReqwestFetcher,
    SwellcastConfig, logging,
};
use tracing::{debug, error};

/// swellcast CLI
#[derive(Parser)]
#[command(name = "swellcast")]
#[command(author, version, about = "Marine and wind forecast lookup", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "SWELLCAST_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the hourly wave and wind forecast for a place
    Forecast {
        /// Place name, e.g. "Bondi Beach"
        #[arg(short, long)]
        location: String,

        /// Number of hourly rows to print, starting at the current hour
        #[arg(long)]
        hours: Option<usize>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = match cli.config.clone() {
        Some(path) => SwellcastConfig::load_from_path(Some(path)),
        None => SwellcastConfig::load(),
    }
    .with_context(|| "Failed to load configuration")?;
    logging::init(&config.logging, cli.verbose)?;
    debug!("Loaded configuration: {:?}", config);

    match cli.command {
        Commands::Forecast {
            location,
            hours,
            json,
        } => run_forecast(config, &location, hours, json).await,
    }
}

async fn run_forecast(
    config: SwellcastConfig,
    location: &str,
    hours: Option<usize>,
    json: bool,
) -> Result<ExitCode> {
    let fetcher = ReqwestFetcher::new(config.request.timeout())
        .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {e}"))?;
    let aggregator = ForecastAggregator::new(fetcher, config)?;

    let mut session = LookupSession::new();
    let ticket = session.begin();
    debug!("Lookup #{} for '{}'", ticket.id(), location);
    let result = aggregator.lookup(location, Utc::now()).await;
    if let Err(err) = &result {
        error!("Lookup failed: {}", err);
    }
    session.resolve(ticket, result.into());

    match session.outcome() {
        LookupOutcome::Success(report) => {
            if json {
                println!("{}", serde_json::to_string_pretty(report.as_ref())?);
            } else {
                print_report(report, hours);
            }
            Ok(ExitCode::SUCCESS)
        }
        LookupOutcome::NotFound { query } => {
            eprintln!("No place called '{query}' was found. Check the spelling and try again.");
            Ok(ExitCode::FAILURE)
        }
        LookupOutcome::InvalidInput(message) => {
            eprintln!("Invalid input: {message}");
            Ok(ExitCode::FAILURE)
        }
        LookupOutcome::UpstreamFailure(message) => {
            eprintln!("{message}");
            Ok(ExitCode::FAILURE)
        }
        LookupOutcome::Idle | LookupOutcome::Pending => {
            eprintln!("Lookup did not complete");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_report(report: &ForecastReport, hours: Option<usize>) {
    println!("{} ({})", report.location.display_name(), report.location.format_coordinates());
    println!("Times in {}", report.timezone);
    println!();

    let start = report
        .rows
        .iter()
        .position(|row| row.is_current_hour)
        .unwrap_or(0);
    let count = hours.unwrap_or(report.rows.len());

    println!(
        "  {:<14} {:>7} {:>9} {:>7} {:>10} {:>9} {:>9} {:>7}",
        "Time", "Period", "Wave dir", "Waves", "Wind", "Strength", "Wind dir", "Temp"
    );
    for row in report.rows.iter().skip(start).take(count) {
        let marker = if row.is_current_hour { '*' } else { ' ' };
        let temperature = row
            .temperature_c
            .map_or_else(|| "-".to_string(), |t| format!("{t:.1}°C"));
        println!(
            "{} {:<14} {:>6.1}s {:>9} {:>6.1}m {:>6.1}km/h {:>9} {:>9} {:>7}",
            marker,
            row.format_time(),
            row.wave_period_s,
            row.wave_direction.to_string(),
            row.wave_height_m,
            row.wind_speed_kmh,
            row.wind_severity.label(),
            row.wind_direction.to_string(),
            temperature
        );
    }

    if !report.daily.is_empty() {
        println!();
        println!("Daily");
        for day in &report.daily {
            println!(
                "  {}  {}  daylight {}",
                day.date.format("%a %d/%m"),
                day.format_temperature_range(),
                day.format_daylight()
            );
        }
    }
}
