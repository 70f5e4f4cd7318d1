// =============================================================================
// Central Application State
// =============================================================================
//
// Shared by the HTTP handlers, the background rescan task and the CLI.  Holds
// the configuration, the market-data provider and an explicit cache of the
// most recent scan.  Nothing here is a module-level global: every consumer
// reaches the cache through an `Arc<AppState>`.
//
// Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock for the config, the cache and the error log.  These
//     guards are never held across an `.await`.
//   - tokio::sync::Mutex serialises scans so a manual POST and the background
//     task never hit the provider at the same time.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::ProviderError;
use crate::provider::universe;
use crate::provider::MarketDataProvider;
use crate::recommendation::{self, Analysis};
use crate::runtime_config::RuntimeConfig;
use crate::scanner::{self, ScanOptions, ScanReport, ScanStatus};

// =============================================================================
// Error Record
// =============================================================================

/// A recorded error event for the service error log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub message: String,
    /// ISO 8601 timestamp.
    pub at: String,
}

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

/// Deadline for a universe download.  The scan lock is held while it runs.
pub const UNIVERSE_TIMEOUT: Duration = Duration::from_secs(15);

// =============================================================================
// Scan cache
// =============================================================================

/// A stored scan report and when it was stored.
#[derive(Debug, Clone)]
pub struct CachedScan {
    pub report: Arc<ScanReport>,
    pub stored_at: Instant,
}

impl CachedScan {
    /// Older than `max_age`.
    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.stored_at.elapsed() > max_age
    }
}

/// Payload for `GET /api/v1/health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub status: &'static str,
    pub state_version: u64,
    pub uptime_secs: u64,
    pub tickers_configured: usize,
    pub last_scan_at: Option<DateTime<Utc>>,
    pub last_scan_status: Option<ScanStatus>,
    pub last_scan_stale: bool,
    pub recent_errors: Vec<ErrorRecord>,
}

// =============================================================================
// AppState
// =============================================================================

/// Application state shared across all async tasks via `Arc<AppState>`.
pub struct AppState {
    // ── Version tracking ────────────────────────────────────────────────
    /// Incremented whenever a new scan is stored.
    pub state_version: AtomicU64,

    // ── Configuration ───────────────────────────────────────────────────
    pub runtime_config: Arc<RwLock<RuntimeConfig>>,

    // ── Collaborators ───────────────────────────────────────────────────
    pub provider: Arc<dyn MarketDataProvider>,
    /// Plain HTTP client for universe downloads.
    pub http: reqwest::Client,

    // ── Scan cache ──────────────────────────────────────────────────────
    latest_scan: RwLock<Option<CachedScan>>,
    scan_lock: tokio::sync::Mutex<()>,

    // ── Error Log ───────────────────────────────────────────────────────
    pub recent_errors: RwLock<Vec<ErrorRecord>>,

    // ── Timing ──────────────────────────────────────────────────────────
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: RuntimeConfig,
        provider: Arc<dyn MarketDataProvider>,
    ) -> Result<Self, ProviderError> {
        Self::with_http_timeout(config, provider, UNIVERSE_TIMEOUT)
    }

    /// Like [`AppState::new`] with a custom universe download deadline.
    pub fn with_http_timeout(
        config: RuntimeConfig,
        provider: Arc<dyn MarketDataProvider>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("signal-scout")
            .build()?;

        Ok(Self {
            state_version: AtomicU64::new(1),
            runtime_config: Arc::new(RwLock::new(config)),
            provider,
            http,
            latest_scan: RwLock::new(None),
            scan_lock: tokio::sync::Mutex::new(()),
            recent_errors: RwLock::new(Vec::new()),
            start_time: Instant::now(),
        })
    }

    // ── Version Management ──────────────────────────────────────────────

    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Error Logging ───────────────────────────────────────────────────

    /// Record an error message.  Oldest entries are evicted past
    /// [`MAX_RECENT_ERRORS`].
    pub fn push_error(&self, msg: String) {
        let record = ErrorRecord {
            message: msg,
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }
    }

    // ── Scan cache ──────────────────────────────────────────────────────

    /// Most recent stored scan, if any.
    pub fn latest_scan(&self) -> Option<CachedScan> {
        self.latest_scan.read().clone()
    }

    /// Replace the cached scan.
    pub fn store_scan(&self, report: ScanReport) -> Arc<ScanReport> {
        let report = Arc::new(report);
        *self.latest_scan.write() = Some(CachedScan {
            report: report.clone(),
            stored_at: Instant::now(),
        });
        self.increment_version();
        report
    }

    /// A cached scan counts as stale after two missed rescan intervals.
    pub fn max_scan_age(&self) -> Duration {
        let secs = self.runtime_config.read().scan_interval_secs;
        Duration::from_secs(secs.saturating_mul(2).max(1))
    }

    // ── Operations ──────────────────────────────────────────────────────

    /// Resolve the ticker list, run a scan and cache the report.
    ///
    /// Concurrent callers queue behind the scan in progress.
    pub async fn run_scan(&self) -> Arc<ScanReport> {
        let _guard = self.scan_lock.lock().await;

        let (engine, options, shuffle) = {
            let config = self.runtime_config.read();
            (config.engine.clone(), ScanOptions::from(&*config), config.shuffle)
        };

        let mut tickers = self.resolve_tickers().await;
        if shuffle {
            universe::shuffle_tickers(&mut tickers, &mut rand::thread_rng());
        }

        let report = scanner::scan(self.provider.as_ref(), &tickers, &engine, &options).await;
        if report.status == ScanStatus::ProviderOutage {
            self.push_error(format!(
                "scan {}: all {} tickers failed at the provider",
                report.id, report.evaluated
            ));
        }
        self.store_scan(report)
    }

    /// Unfiltered analysis of one ticker with the current engine settings.
    pub async fn analyze_ticker(&self, ticker: &str) -> Result<Analysis, ProviderError> {
        let (engine, lookback_days) = {
            let config = self.runtime_config.read();
            (config.engine.clone(), config.lookback_days)
        };

        let quote = self.provider.get_quote(ticker).await?;
        let series = self.provider.get_history(ticker, lookback_days).await?;
        Ok(recommendation::analyze(ticker, &quote, &series, &engine))
    }

    /// Universe tickers when a universe URL is configured and loads, otherwise
    /// the configured list.
    async fn resolve_tickers(&self) -> Vec<String> {
        let (url, configured) = {
            let config = self.runtime_config.read();
            (config.universe_url.clone(), config.tickers.clone())
        };

        let Some(url) = url else {
            return configured;
        };

        match universe::fetch_universe(&self.http, &url).await {
            Ok(tickers) if !tickers.is_empty() => tickers,
            Ok(_) => {
                warn!(url = %url, "universe is empty, using configured tickers");
                configured
            }
            Err(e) => {
                warn!(url = %url, error = %e, "universe unavailable, using configured tickers");
                self.push_error(format!("universe {url}: {e:#}"));
                configured
            }
        }
    }

    // ── Snapshot Builder ────────────────────────────────────────────────

    pub fn health(&self) -> HealthSnapshot {
        let cached = self.latest_scan();
        let max_age = self.max_scan_age();

        HealthSnapshot {
            status: "ok",
            state_version: self.current_state_version(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            tickers_configured: self.runtime_config.read().tickers.len(),
            last_scan_at: cached.as_ref().map(|c| c.report.finished_at),
            last_scan_status: cached.as_ref().map(|c| c.report.status),
            last_scan_stale: cached.as_ref().map_or(false, |c| c.is_stale(max_age)),
            recent_errors: self.recent_errors.read().clone(),
        }
    }
}

/// Rescan every `scan_interval_secs` until the task is aborted.
pub async fn run_rescan_loop(state: Arc<AppState>) {
    let secs = state.runtime_config.read().scan_interval_secs.max(1);
    let mut interval = tokio::time::interval(Duration::from_secs(secs));
    info!(interval_secs = secs, "background rescan loop starting");

    loop {
        interval.tick().await;
        let report = state.run_scan().await;
        info!(
            scan_id = %report.id,
            status = %report.status,
            version = state.current_state_version(),
            "background scan stored"
        );
    }
}
