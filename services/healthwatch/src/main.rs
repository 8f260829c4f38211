//! Healthwatch CLI
//!
//! Command-line client for the health dashboard backend.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use healthwatch::io::{HttpClient, ReqwestHttpClient};
use healthwatch::models::HealthSettingsUpdate;
use healthwatch::{build_dashboard, load_config, render, Config, Dashboard};
use tracing::Level;

#[derive(Parser)]
#[command(name = "healthwatch")]
#[command(about = "Health dashboard client")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Project to query (overrides config file)
    #[arg(short, long)]
    project: Option<String>,

    /// Per-request timeout in milliseconds (overrides config file)
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Poll the backend until interrupted
    Watch,
    /// Show the aggregated health window
    Period {
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        limit: Option<u32>,
        /// Only include results at or after this RFC3339 timestamp
        #[arg(long)]
        since: Option<DateTime<Utc>>,
    },
    /// Show the most recent raw results
    Rows {
        #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u32).range(1..))]
        limit: u32,
    },
    /// Show the polling settings
    Settings,
    /// Change some polling settings
    Set {
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval_ms: Option<u64>,
        #[arg(long)]
        auto_refresh: Option<bool>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_points: Option<u32>,
    },
    /// Delete all stored results for the project
    Truncate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, base_url={:?}, project={:?}, log_level={:?}",
        args.config,
        args.base_url,
        args.project,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(project) = args.project {
        config.project_name = project;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.request_timeout_ms = timeout_ms;
    }

    if let Command::Watch = args.command {
        healthwatch::watch(config).await?;
        return Ok(());
    }

    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());
    let dashboard = build_dashboard(&config, http)?;
    let outcome = run_once(&dashboard, &config, args.command).await;

    for toast in dashboard.notifications().snapshot() {
        render::show_toast(&toast);
    }

    outcome?;
    Ok(())
}

async fn run_once(
    dashboard: &Dashboard,
    config: &Config,
    command: Command,
) -> healthwatch::Result<()> {
    match command {
        Command::Watch => {}
        Command::Period { limit, since } => {
            let limit = limit.unwrap_or(config.period_limit);
            let response = dashboard
                .gateway()
                .fetch_period(&config.project_name, limit, config.request_timeout(), since)
                .await
                .inspect_err(|e| {
                    dashboard
                        .notifications()
                        .error(format!("Could not load health data: {}", e.summary()));
                })?;
            for sample in response.samples() {
                println!("{}", render::sample_line(&sample));
            }
        }
        Command::Rows { limit } => {
            let response = dashboard.result_rows(limit).await?;
            for row in &response.results {
                println!("{}", render::row_line(row));
            }
        }
        Command::Settings => {
            let settings = dashboard.load_settings().await?;
            println!("{}", render::settings_block(&settings));
        }
        Command::Set {
            interval_ms,
            auto_refresh,
            max_points,
        } => {
            let update = HealthSettingsUpdate {
                project_name: config.project_name.clone(),
                polling_interval_ms: interval_ms,
                auto_refresh,
                max_points,
            };
            let settings = dashboard.apply_settings(update).await?;
            println!("{}", render::settings_block(&settings));
        }
        Command::Truncate => {
            dashboard.truncate().await?;
        }
    }
    Ok(())
}
