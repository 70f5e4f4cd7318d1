// =============================================================================
// Recommendation Builder
// =============================================================================
//
// Assembles indicator values, the classified signal, a target price and the
// expected profit into one record, then applies the eligibility filters in a
// fixed order.  The first failing filter short-circuits:
//
//   1. NoQuote             : quote missing or price <= 0
//   2. PriceAboveCeiling   : price above the configured ceiling
//   3. InsufficientVolume  : volume below the floor (missing volume fails)
//   4. InsufficientHistory : SMA or EMA undefined
//   5. NoProfitPotential   : target - price <= 0
//
// Pure: no I/O, no clocks, no randomness.  Values are kept at full precision;
// rounding is left to whoever renders them.
// =============================================================================

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::indicators::IndicatorSet;
use crate::market_data::{BarSeries, Quote};
use crate::runtime_config::EngineConfig;
use crate::signals::{classify, Signal, Trend};

// =============================================================================
// Types
// =============================================================================

/// Why a ticker did not produce a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IneligibleReason {
    NoQuote,
    PriceAboveCeiling,
    InsufficientVolume,
    InsufficientHistory,
    NoProfitPotential,
}

impl std::fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoQuote => write!(f, "NoQuote"),
            Self::PriceAboveCeiling => write!(f, "PriceAboveCeiling"),
            Self::InsufficientVolume => write!(f, "InsufficientVolume"),
            Self::InsufficientHistory => write!(f, "InsufficientHistory"),
            Self::NoProfitPotential => write!(f, "NoProfitPotential"),
        }
    }
}

/// A rejected ticker with the filter that rejected it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ineligible {
    pub ticker: String,
    pub reason: IneligibleReason,
    /// Human-readable detail, e.g. "price 7.10 above ceiling 5.00".
    pub detail: String,
}

impl Ineligible {
    fn new(ticker: &str, reason: IneligibleReason, detail: impl Into<String>) -> Self {
        Self {
            ticker: ticker.to_string(),
            reason,
            detail: detail.into(),
        }
    }
}

/// Take-profit / stop-loss levels around the quote price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExitPlan {
    pub take_profit: f64,
    pub stop_loss: f64,
}

impl ExitPlan {
    pub fn around(price: f64, config: &EngineConfig) -> Self {
        Self {
            take_profit: price * (1.0 + config.take_profit_pct / 100.0),
            stop_loss: price * (1.0 - config.stop_loss_pct / 100.0),
        }
    }
}

/// Unfiltered analysis of one ticker at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub ticker: String,
    pub quote: Quote,
    /// Date of the most recent bar used.
    pub as_of: Option<NaiveDate>,
    pub bars: usize,
    pub indicators: IndicatorSet,
    pub signal: Signal,
    pub rationale: String,
    pub trend: Trend,
    pub target_price: Option<f64>,
    pub potential_profit: Option<f64>,
    pub potential_profit_pct: Option<f64>,
    /// Suggested entry ceiling for Buy signals: price minus ATR.
    pub buy_below: Option<f64>,
    pub exit_plan: ExitPlan,
}

/// An eligible pick.  Created once per scan; never updated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub ticker: String,
    pub price: f64,
    pub target_price: f64,
    pub potential_profit: f64,
    pub potential_profit_pct: f64,
    pub signal: Signal,
    pub analysis: Analysis,
}

// =============================================================================
// Operations
// =============================================================================

/// Compute indicators, signal, target and profit without applying any filter.
pub fn analyze(ticker: &str, quote: &Quote, series: &BarSeries, config: &EngineConfig) -> Analysis {
    let price = quote.price();
    let indicators = IndicatorSet::compute(series, config.window);
    let classification = classify(price, &indicators, config);

    let target_price = indicators.target_price();
    let (potential_profit, potential_profit_pct) = match target_price {
        Some(target) if price > 0.0 => {
            let profit = target - price;
            (Some(profit), Some(profit / price * 100.0))
        }
        _ => (None, None),
    };

    let buy_below = classification
        .signal
        .is_buy()
        .then(|| price - indicators.atr.unwrap_or(config.entry_buffer_fallback));

    Analysis {
        ticker: ticker.to_string(),
        quote: quote.clone(),
        as_of: series.last().map(|b| b.date()),
        bars: series.len(),
        indicators,
        signal: classification.signal,
        rationale: classification.rationale,
        trend: classification.signal.trend(),
        target_price,
        potential_profit,
        potential_profit_pct,
        buy_below,
        exit_plan: ExitPlan::around(price, config),
    }
}

/// Apply the eligibility filters and, if all pass, build a `Recommendation`.
pub fn build(
    ticker: &str,
    quote: Option<&Quote>,
    series: &BarSeries,
    config: &EngineConfig,
) -> Result<Recommendation, Ineligible> {
    let result = check(ticker, quote, series, config);
    if let Err(ref rejected) = result {
        debug!(ticker, reason = %rejected.reason, detail = %rejected.detail, "ineligible");
    }
    result
}

/// Filters 1-3, which need only the quote.  Lets a scan skip the history
/// request for tickers that can never qualify.
pub fn screen_quote<'q>(
    ticker: &str,
    quote: Option<&'q Quote>,
    config: &EngineConfig,
) -> Result<&'q Quote, Ineligible> {
    // ── 1. Quote ─────────────────────────────────────────────────────────
    let quote = match quote {
        Some(q) if q.price() > 0.0 => q,
        _ => {
            return Err(Ineligible::new(
                ticker,
                IneligibleReason::NoQuote,
                "no usable quote price",
            ))
        }
    };
    let price = quote.price();

    // ── 2. Price ceiling ─────────────────────────────────────────────────
    if let Some(ceiling) = config.price_ceiling {
        if price > ceiling {
            return Err(Ineligible::new(
                ticker,
                IneligibleReason::PriceAboveCeiling,
                format!("price {price} above ceiling {ceiling}"),
            ));
        }
    }

    // ── 3. Volume floor ──────────────────────────────────────────────────
    if let Some(min_volume) = config.min_volume {
        match quote.volume() {
            Some(v) if v >= min_volume => {}
            Some(v) => {
                return Err(Ineligible::new(
                    ticker,
                    IneligibleReason::InsufficientVolume,
                    format!("volume {v} below minimum {min_volume}"),
                ))
            }
            None => {
                return Err(Ineligible::new(
                    ticker,
                    IneligibleReason::InsufficientVolume,
                    format!("volume unknown, minimum {min_volume} required"),
                ))
            }
        }
    }

    Ok(quote)
}

fn check(
    ticker: &str,
    quote: Option<&Quote>,
    series: &BarSeries,
    config: &EngineConfig,
) -> Result<Recommendation, Ineligible> {
    let quote = screen_quote(ticker, quote, config)?;
    let price = quote.price();

    // ── 4. History ───────────────────────────────────────────────────────
    let analysis = analyze(ticker, quote, series, config);
    let (Some(target_price), Some(potential_profit), Some(potential_profit_pct)) = (
        analysis.target_price,
        analysis.potential_profit,
        analysis.potential_profit_pct,
    ) else {
        return Err(Ineligible::new(
            ticker,
            IneligibleReason::InsufficientHistory,
            format!("{} bars, {} required", series.len(), config.window),
        ));
    };

    // ── 5. Profit ────────────────────────────────────────────────────────
    if potential_profit <= 0.0 {
        return Err(Ineligible::new(
            ticker,
            IneligibleReason::NoProfitPotential,
            format!("target {target_price} does not exceed price {price}"),
        ));
    }

    Ok(Recommendation {
        ticker: ticker.to_string(),
        price,
        target_price,
        potential_profit,
        potential_profit_pct,
        signal: analysis.signal,
        analysis,
    })
}
