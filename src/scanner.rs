// =============================================================================
// Scan Loop
// =============================================================================
//
// Walks a ticker list, fetches a quote and history per ticker through the
// `MarketDataProvider`, and runs the recommendation builder until the scan
// policy is satisfied:
//
//   FirstEligible  stop at the first qualifying recommendation
//   BestOfAll      evaluate everything, keep the highest profit percentage
//   FixedCount(n)  evaluate the first n tickers, keep the best of those
//
// Evaluation is bounded-concurrent (`buffered`), so results arrive in list
// order.  Dropping the stream after a FirstEligible hit cancels in-flight
// requests for later tickers.
//
// Provider failures skip the ticker.  A missing quote price is not a failure:
// it is reported as `NoQuote` like any other ineligible ticker.
// =============================================================================

use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::ProviderError;
use crate::provider::MarketDataProvider;
use crate::recommendation::{self, Ineligible, Recommendation};
use crate::runtime_config::{EngineConfig, RuntimeConfig};
use crate::types::ScanPolicy;

// =============================================================================
// Types
// =============================================================================

/// Scan-loop settings, separate from the engine thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOptions {
    pub policy: ScanPolicy,
    pub concurrency: usize,
    pub lookback_days: u32,
    pub require_buy_signal: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::from(&RuntimeConfig::default())
    }
}

impl From<&RuntimeConfig> for ScanOptions {
    fn from(config: &RuntimeConfig) -> Self {
        Self {
            policy: config.policy,
            concurrency: config.concurrency,
            lookback_days: config.lookback_days,
            require_buy_signal: config.require_buy_signal,
        }
    }
}

/// Result of evaluating one ticker that the provider answered for.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TickerOutcome {
    Eligible(Recommendation),
    Ineligible(Ineligible),
}

impl TickerOutcome {
    pub fn ticker(&self) -> &str {
        match self {
            Self::Eligible(r) => &r.ticker,
            Self::Ineligible(i) => &i.ticker,
        }
    }
}

/// A ticker dropped because the provider failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedTicker {
    pub ticker: String,
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScanStatus {
    /// `best` holds a recommendation.
    Recommended,
    /// Tickers were evaluated but none qualified.
    NoEligible,
    /// Every ticker failed at the provider.
    ProviderOutage,
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Recommended => write!(f, "Recommended"),
            Self::NoEligible => write!(f, "no eligible recommendation found"),
            Self::ProviderOutage => write!(f, "market data provider unavailable"),
        }
    }
}

/// Everything a scan produced.  Immutable once returned.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub policy: ScanPolicy,
    /// Tickers that produced an outcome or a skip.
    pub evaluated: usize,
    pub skipped: Vec<SkippedTicker>,
    pub outcomes: Vec<TickerOutcome>,
    pub best: Option<Recommendation>,
    pub status: ScanStatus,
}

impl ScanReport {
    pub fn eligible(&self) -> impl Iterator<Item = &Recommendation> {
        self.outcomes.iter().filter_map(|o| match o {
            TickerOutcome::Eligible(r) => Some(r),
            TickerOutcome::Ineligible(_) => None,
        })
    }
}

// =============================================================================
// Scan
// =============================================================================

/// Run one scan over `tickers`.  Never fails: provider errors become skips.
pub async fn scan(
    provider: &dyn MarketDataProvider,
    tickers: &[String],
    engine: &EngineConfig,
    options: &ScanOptions,
) -> ScanReport {
    let id = Uuid::new_v4();
    let started_at = Utc::now();

    let candidates: &[String] = match options.policy {
        ScanPolicy::FixedCount(n) => &tickers[..n.min(tickers.len())],
        ScanPolicy::FirstEligible | ScanPolicy::BestOfAll => tickers,
    };
    info!(
        scan_id = %id,
        policy = %options.policy,
        tickers = candidates.len(),
        concurrency = options.concurrency,
        "scan started"
    );

    let lookback = options.lookback_days;
    // Owned tickers: a future borrowing the stream item is not `Send`.
    let mut results = stream::iter(candidates.to_vec())
        .map(|ticker| async move {
            let result = evaluate(provider, &ticker, engine, lookback).await;
            (ticker, result)
        })
        .buffered(options.concurrency.max(1));

    let mut evaluated = 0usize;
    let mut skipped = Vec::new();
    let mut outcomes = Vec::new();
    let mut best: Option<Recommendation> = None;

    while let Some((ticker, result)) = results.next().await {
        evaluated += 1;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(scan_id = %id, ticker = %ticker, error = %e, "skipping ticker");
                skipped.push(SkippedTicker {
                    ticker,
                    error: e.to_string(),
                });
                continue;
            }
        };

        if let TickerOutcome::Eligible(rec) = &outcome {
            if qualifies(rec, options) {
                let better = best
                    .as_ref()
                    .map_or(true, |b| rec.potential_profit_pct.total_cmp(&b.potential_profit_pct).is_gt());
                if better {
                    best = Some(rec.clone());
                }
            } else {
                debug!(scan_id = %id, ticker = %ticker, signal = %rec.signal, "eligible but not a buy");
            }
        }
        outcomes.push(outcome);

        if options.policy == ScanPolicy::FirstEligible && best.is_some() {
            break;
        }
    }
    drop(results);

    let status = if best.is_some() {
        ScanStatus::Recommended
    } else if outcomes.is_empty() && !skipped.is_empty() {
        ScanStatus::ProviderOutage
    } else {
        ScanStatus::NoEligible
    };

    let report = ScanReport {
        id,
        started_at,
        finished_at: Utc::now(),
        policy: options.policy,
        evaluated,
        skipped,
        outcomes,
        best,
        status,
    };

    match &report.best {
        Some(rec) => info!(
            scan_id = %id,
            ticker = %rec.ticker,
            signal = %rec.signal,
            profit_pct = rec.potential_profit_pct,
            evaluated = report.evaluated,
            skipped = report.skipped.len(),
            "scan finished"
        ),
        None => info!(
            scan_id = %id,
            status = %report.status,
            evaluated = report.evaluated,
            skipped = report.skipped.len(),
            "scan finished"
        ),
    }

    report
}

fn qualifies(rec: &Recommendation, options: &ScanOptions) -> bool {
    !options.require_buy_signal || rec.signal.is_buy()
}

/// Fetch and evaluate one ticker.  History is only requested once the quote
/// has passed the quote-level filters.
async fn evaluate(
    provider: &dyn MarketDataProvider,
    ticker: &str,
    engine: &EngineConfig,
    lookback_days: u32,
) -> Result<TickerOutcome, ProviderError> {
    let quote = match provider.get_quote(ticker).await {
        Ok(q) => Some(q),
        Err(ProviderError::QuoteUnavailable { .. }) => None,
        Err(e) => return Err(e),
    };

    if let Err(rejected) = recommendation::screen_quote(ticker, quote.as_ref(), engine) {
        debug!(ticker, reason = %rejected.reason, "rejected on quote");
        return Ok(TickerOutcome::Ineligible(rejected));
    }

    let series = provider.get_history(ticker, lookback_days).await?;

    Ok(match recommendation::build(ticker, quote.as_ref(), &series, engine) {
        Ok(rec) => TickerOutcome::Eligible(rec),
        Err(rejected) => TickerOutcome::Ineligible(rejected),
    })
}
