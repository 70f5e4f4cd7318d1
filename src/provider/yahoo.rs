// =============================================================================
// Yahoo Finance chart API adapter
// =============================================================================
//
// Both the live quote and the daily history come from the v8 chart endpoint:
//
//   GET /v8/finance/chart/{ticker}?period1=..&period2=..&interval=1d
//
// The quote is read from `chart.result[0].meta`.  Quote fields are resolved
// through explicit, ordered fallback lists (`PRICE_FIELDS`, `VOLUME_FIELDS`)
// so the engine never sees an ambiguous price: the first present, finite,
// positive value wins.
//
// History rows with a missing OHLC value (holidays, halted sessions) are
// dropped.  When the feed repeats the latest session (intraday bar appended to
// a completed one) the later row replaces the earlier.
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::errors::{InvalidInput, ProviderError};
use crate::market_data::{Bar, BarSeries, Quote};
use crate::provider::MarketDataProvider;

const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";

/// Ordered price fallbacks.
pub const PRICE_FIELDS: &[&str] = &[
    "regularMarketPrice",
    "currentPrice",
    "previousClose",
    "chartPreviousClose",
    "ask",
];

/// Ordered volume fallbacks.
pub const VOLUME_FIELDS: &[&str] = &["regularMarketVolume", "volume"];

/// Yahoo Finance chart API client.
#[derive(Clone)]
pub struct YahooClient {
    base_url: String,
    client: reqwest::Client,
}

impl YahooClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    pub fn new() -> Result<Self, ProviderError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the client at a different host (mirrors, local fixtures).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) signal-scout")
            .build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(base_url = %base_url, "YahooClient initialised");

        Ok(Self { base_url, client })
    }

    // -------------------------------------------------------------------------
    // Transport
    // -------------------------------------------------------------------------

    /// Fetch the first `chart.result` element for `ticker`.
    async fn chart(&self, ticker: &str, query: &str) -> Result<Value, ProviderError> {
        let url = format!("{}/v8/finance/chart/{}?{}", self.base_url, ticker, query);

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(format!("chart body for {ticker}: {e}")))?;

        extract_result(ticker, status.is_success(), status.as_u16(), body)
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    #[instrument(skip(self), name = "yahoo::get_quote")]
    async fn get_quote(&self, ticker: &str) -> Result<Quote, ProviderError> {
        let result = self.chart(ticker, "range=1d&interval=1d").await?;
        let meta = result
            .get("meta")
            .and_then(Value::as_object)
            .ok_or_else(|| ProviderError::Malformed(format!("no meta block for {ticker}")))?;

        let quote = parse_quote(ticker, meta)?;
        debug!(ticker, price = quote.price(), volume = ?quote.volume(), "quote fetched");
        Ok(quote)
    }

    #[instrument(skip(self), name = "yahoo::get_history")]
    async fn get_history(
        &self,
        ticker: &str,
        lookback_days: u32,
    ) -> Result<BarSeries, ProviderError> {
        let now = Utc::now().timestamp();
        let start = now - i64::from(lookback_days) * 86_400;
        let query = format!("period1={start}&period2={now}&interval=1d");

        let result = self.chart(ticker, &query).await?;
        let series = parse_history(ticker, &result)?;
        debug!(ticker, bars = series.len(), "history fetched");
        Ok(series)
    }
}

// =============================================================================
// Parsing (pure)
// =============================================================================

/// Unwrap `chart.result[0]`, mapping Yahoo's error envelope onto
/// `ProviderError`.
fn extract_result(ticker: &str, ok: bool, status: u16, body: Value) -> Result<Value, ProviderError> {
    let chart = &body["chart"];

    if let Some(err) = chart.get("error").filter(|e| !e.is_null()) {
        let code = err["code"].as_str().unwrap_or_default();
        let description = err["description"].as_str().unwrap_or_default();
        if code == "Not Found" {
            return Err(ProviderError::UnknownTicker {
                ticker: ticker.to_string(),
            });
        }
        return Err(ProviderError::Api(format!("{code}: {description}")));
    }

    if !ok {
        return Err(ProviderError::Api(format!("HTTP {status} for {ticker}")));
    }

    chart["result"]
        .as_array()
        .and_then(|r| r.first())
        .cloned()
        .ok_or_else(|| ProviderError::Malformed(format!("empty chart result for {ticker}")))
}

/// First finite, positive number among `fields`, in order.
pub fn resolve_number(meta: &Map<String, Value>, fields: &[&str]) -> Option<f64> {
    fields
        .iter()
        .filter_map(|f| meta.get(*f).and_then(Value::as_f64))
        .find(|v| v.is_finite() && *v > 0.0)
}

/// Build a `Quote` from a chart `meta` block.
pub fn parse_quote(ticker: &str, meta: &Map<String, Value>) -> Result<Quote, ProviderError> {
    let price = resolve_number(meta, PRICE_FIELDS).ok_or_else(|| {
        ProviderError::QuoteUnavailable {
            ticker: ticker.to_string(),
        }
    })?;
    let volume = resolve_number(meta, VOLUME_FIELDS).map(|v| v as u64);
    let field = |name: &str| meta.get(name).and_then(Value::as_f64);

    Ok(Quote::new(ticker, price)?
        .with_volume(volume)
        .with_day_range(field("regularMarketDayHigh"), field("regularMarketDayLow"))
        .with_fifty_two_week_range(field("fiftyTwoWeekHigh"), field("fiftyTwoWeekLow"))
        .with_market_cap(field("marketCap")))
}

/// Build a `BarSeries` from a chart result.
pub fn parse_history(ticker: &str, result: &Value) -> Result<BarSeries, ProviderError> {
    let timestamps = result["timestamp"].as_array().cloned().unwrap_or_default();
    let quote = &result["indicators"]["quote"][0];

    let column = |name: &str| -> Vec<Option<f64>> {
        quote[name]
            .as_array()
            .map(|a| a.iter().map(Value::as_f64).collect())
            .unwrap_or_default()
    };
    let opens = column("open");
    let highs = column("high");
    let lows = column("low");
    let closes = column("close");
    let volumes = column("volume");

    let mut bars: Vec<Bar> = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let date = ts
            .as_i64()
            .and_then(|t| DateTime::<Utc>::from_timestamp(t, 0))
            .map(|dt| dt.date_naive())
            .ok_or_else(|| ProviderError::Malformed(format!("bad timestamp {ts} for {ticker}")))?;

        let cell = |col: &[Option<f64>]| col.get(i).copied().flatten();
        let (Some(open), Some(high), Some(low), Some(close)) =
            (cell(&opens[..]), cell(&highs[..]), cell(&lows[..]), cell(&closes[..]))
        else {
            debug!(ticker, %date, "dropping incomplete row");
            continue;
        };
        let volume = cell(&volumes[..]).unwrap_or(0.0).max(0.0) as u64;

        let bar = Bar::new(date, open, high, low, close, volume).map_err(|e| {
            warn!(ticker, %date, error = %e, "rejecting malformed bar");
            InvalidInput::Bar {
                index: i,
                source: Box::new(e),
            }
        })?;
        push_session(&mut bars, bar);
    }

    if bars.is_empty() {
        return Err(ProviderError::EmptyHistory {
            ticker: ticker.to_string(),
        });
    }

    Ok(BarSeries::new(ticker, bars)?)
}

/// Append `bar`, replacing the previous one if it is for the same session.
fn push_session(bars: &mut Vec<Bar>, bar: Bar) {
    if bars.last().is_some_and(|last| last.date() == bar.date()) {
        bars.pop();
    }
    bars.push(bar);
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn price_fallback_order() {
        let m = meta(json!({ "previousClose": 3.0, "ask": 3.2 }));
        assert_eq!(resolve_number(&m, PRICE_FIELDS), Some(3.0));

        let m = meta(json!({ "regularMarketPrice": 2.5, "previousClose": 3.0 }));
        assert_eq!(resolve_number(&m, PRICE_FIELDS), Some(2.5));
    }

    #[test]
    fn zero_price_falls_through() {
        let m = meta(json!({ "regularMarketPrice": 0.0, "currentPrice": 4.4 }));
        assert_eq!(resolve_number(&m, PRICE_FIELDS), Some(4.4));
    }

    #[test]
    fn non_numeric_price_falls_through() {
        let m = meta(json!({ "regularMarketPrice": "N/A", "chartPreviousClose": 1.1 }));
        assert_eq!(resolve_number(&m, PRICE_FIELDS), Some(1.1));
    }

    #[test]
    fn missing_price_is_quote_unavailable() {
        let m = meta(json!({ "regularMarketVolume": 100 }));
        let err = parse_quote("ABC", &m).unwrap_err();
        assert!(matches!(err, ProviderError::QuoteUnavailable { .. }));
    }

    #[test]
    fn quote_details_are_carried() {
        let m = meta(json!({
            "regularMarketPrice": 4.2,
            "volume": 1_500_000,
            "regularMarketDayHigh": 4.5,
            "regularMarketDayLow": 4.0,
            "fiftyTwoWeekHigh": 9.0,
            "fiftyTwoWeekLow": 1.0
        }));
        let q = parse_quote("ABC", &m).unwrap();
        assert_eq!(q.price(), 4.2);
        assert_eq!(q.volume(), Some(1_500_000));
        assert_eq!(q.day_high(), Some(4.5));
        assert_eq!(q.fifty_two_week_low(), Some(1.0));
        assert_eq!(q.market_cap(), None);
    }

    fn chart_result() -> Value {
        // 2024-01-02, 2024-01-03 (null row), 2024-01-04, 2024-01-04 again.
        json!({
            "meta": { "regularMarketPrice": 4.0 },
            "timestamp": [1704204000, 1704290400, 1704376800, 1704380400],
            "indicators": { "quote": [{
                "open":   [1.0, null, 1.2, 1.25],
                "high":   [1.5, null, 1.6, 1.7],
                "low":    [0.9, null, 1.1, 1.1],
                "close":  [1.1, null, 1.3, 1.4],
                "volume": [1000, null, 2000, 2500]
            }]}
        })
    }

    #[test]
    fn history_drops_incomplete_rows_and_merges_sessions() {
        let series = parse_history("ABC", &chart_result()).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), vec![1.1, 1.4]);
        assert_eq!(series.bars()[1].volume(), 2500);
    }

    #[test]
    fn history_without_rows_is_empty_history() {
        let result = json!({ "timestamp": [], "indicators": { "quote": [{}] } });
        let err = parse_history("ABC", &result).unwrap_err();
        assert!(matches!(err, ProviderError::EmptyHistory { .. }));
    }

    #[test]
    fn history_with_broken_bar_is_invalid() {
        let result = json!({
            "timestamp": [1704204000],
            "indicators": { "quote": [{
                "open": [1.0], "high": [0.5], "low": [0.9], "close": [1.0], "volume": [1]
            }]}
        });
        let err = parse_history("ABC", &result).unwrap_err();
        assert!(matches!(err, ProviderError::Invalid(InvalidInput::Bar { index: 0, .. })));
    }

    #[test]
    fn not_found_maps_to_unknown_ticker() {
        let body = json!({ "chart": { "result": null, "error": {
            "code": "Not Found", "description": "No data found, symbol may be delisted"
        }}});
        let err = extract_result("ZZZZ", false, 404, body).unwrap_err();
        assert!(matches!(err, ProviderError::UnknownTicker { .. }));
    }

    #[test]
    fn http_failure_without_envelope_is_api_error() {
        let err = extract_result("ABC", false, 429, json!({})).unwrap_err();
        assert!(matches!(err, ProviderError::Api(ref m) if m.contains("429")));
    }

    #[test]
    fn successful_envelope_yields_first_result() {
        let body = json!({ "chart": { "result": [ { "meta": {} } ], "error": null } });
        let result = extract_result("ABC", true, 200, body).unwrap();
        assert!(result.get("meta").is_some());
    }
}
