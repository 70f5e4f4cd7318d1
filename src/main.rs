// =============================================================================
// Signal Scout: Main Entry Point
// =============================================================================
//
//   signal-scout [serve]          HTTP service with background rescans
//   signal-scout scan             one scan, printed to stdout
//   signal-scout analyze <TICKER> one unfiltered analysis
//   signal-scout init-config      write the default config file
// =============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use signal_scout::api;
use signal_scout::app_state::{self, AppState};
use signal_scout::provider::YahooClient;
use signal_scout::render;
use signal_scout::runtime_config::{parse_ticker_list, EngineConfig, RuntimeConfig};
use signal_scout::types::ScanPolicy;

#[derive(Parser)]
#[command(name = "signal-scout", about = "Technical-indicator stock screener")]
struct Cli {
    /// JSON configuration file.
    #[arg(long, default_value = "scout_config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API and rescan in the background (default).
    Serve,
    /// Run one scan and print the result.
    Scan {
        /// first | best | count:<N>
        #[arg(long)]
        policy: Option<ScanPolicy>,

        /// Comma-separated tickers, replacing the configured list.
        #[arg(long)]
        tickers: Option<String>,

        /// Apply the penny-stock filters (price <= 5.00, volume >= 1M).
        #[arg(long, default_value_t = false)]
        penny: bool,

        /// Print the report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Analyse one ticker without eligibility filters.
    Analyze {
        ticker: String,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write the default configuration to the config path.
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Some(Command::InitConfig) = cli.command {
        return RuntimeConfig::default().save(&cli.config);
    }

    let mut config = RuntimeConfig::load(&cli.config).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });
    config.apply_env_overrides();

    // ── 2. Provider ──────────────────────────────────────────────────────
    let provider = Arc::new(YahooClient::new().context("failed to build Yahoo client")?);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, provider).await,
        Command::Scan {
            policy,
            tickers,
            penny,
            json,
        } => {
            if let Some(policy) = policy {
                config.policy = policy;
            }
            if let Some(list) = tickers {
                config.tickers = parse_ticker_list(&list);
                config.universe_url = None;
            }
            if penny {
                config.engine = EngineConfig {
                    window: config.engine.window,
                    ..EngineConfig::penny_stock()
                };
            }

            let state = AppState::new(config, provider).context("failed to build app state")?;
            let report = state.run_scan().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&*report)?);
            } else {
                print!("{}", render::report_text(&report));
            }
            Ok(())
        }
        Command::Analyze { ticker, json } => {
            let ticker = ticker.trim().to_uppercase();
            let state = AppState::new(config, provider).context("failed to build app state")?;
            let analysis = state
                .analyze_ticker(&ticker)
                .await
                .with_context(|| format!("could not analyse {ticker}"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                print!("{}", render::analysis_text(&analysis));
            }
            Ok(())
        }
        Command::InitConfig => Ok(()),
    }
}

async fn serve(config: RuntimeConfig, provider: Arc<YahooClient>) -> Result<()> {
    info!(
        tickers = config.tickers.len(),
        universe = ?config.universe_url,
        policy = %config.policy,
        interval_secs = config.scan_interval_secs,
        "Signal Scout starting"
    );

    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, provider).context("failed to build app state")?);

    // ── 3. Background rescans ────────────────────────────────────────────
    let rescan = tokio::spawn(app_state::run_rescan_loop(state.clone()));

    // ── 4. API server ────────────────────────────────────────────────────
    let app = api::rest::router(state.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server to {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            warn!("Shutdown signal received, stopping gracefully");
        })
        .await
        .context("API server failed")?;

    rescan.abort();
    info!("Signal Scout shut down complete.");
    Ok(())
}
