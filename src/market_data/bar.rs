use chrono::NaiveDate;
use serde::Serialize;

use crate::errors::InvalidInput;

// ---------------------------------------------------------------------------
// Bar
// ---------------------------------------------------------------------------

/// One trading day of OHLCV data.
///
/// Fields are private so a `Bar` can only exist in a validated state:
/// every price is positive and finite and `low <= open, close <= high`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bar {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

impl Bar {
    pub fn new(
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Result<Self, InvalidInput> {
        positive("open", open)?;
        positive("high", high)?;
        positive("low", low)?;
        positive("close", close)?;

        if high < low {
            return Err(InvalidInput::HighBelowLow { high, low });
        }
        for (field, value) in [("open", open), ("close", close)] {
            if value < low || value > high {
                return Err(InvalidInput::OutsideRange {
                    field,
                    value,
                    low,
                    high,
                });
            }
        }

        Ok(Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn open(&self) -> f64 {
        self.open
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn close(&self) -> f64 {
        self.close
    }

    pub fn volume(&self) -> u64 {
        self.volume
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), InvalidInput> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(InvalidInput::NonPositivePrice { field, value })
    }
}

// ---------------------------------------------------------------------------
// BarSeries
// ---------------------------------------------------------------------------

/// Daily bars for a single ticker, oldest first, with strictly increasing
/// dates.
///
/// A short (or empty) series is valid; indicators simply report `None` for
/// windows the series cannot fill.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    ticker: String,
    bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(ticker: impl Into<String>, bars: Vec<Bar>) -> Result<Self, InvalidInput> {
        let ticker = ticker.into();
        if ticker.trim().is_empty() {
            return Err(InvalidInput::EmptyTicker);
        }

        for (index, pair) in bars.windows(2).enumerate() {
            if pair[1].date <= pair[0].date {
                return Err(InvalidInput::NonMonotonicDate {
                    index: index + 1,
                    date: pair[1].date,
                    previous: pair[0].date,
                });
            }
        }

        Ok(Self { ticker, bars })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Close prices in chronological order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(Bar::close).collect()
    }
}

// ---------------------------------------------------------------------------
// Test fixtures
// ---------------------------------------------------------------------------

/// Flat bars (open = high = low = close) on consecutive days starting
/// 2024-01-01.  Shared by the indicator, classifier, and scanner tests.
#[cfg(test)]
pub(crate) fn series_from_closes(ticker: &str, closes: &[f64]) -> BarSeries {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let date = start + chrono::Duration::days(i as i64);
            Bar::new(date, c, c, c, c, 1_000_000).unwrap()
        })
        .collect();
    BarSeries::new(ticker, bars).unwrap()
}
