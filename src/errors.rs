// =============================================================================
// Error taxonomy
// =============================================================================
//
// Two families of failure exist:
//
//   - `InvalidInput`  : a caller handed the engine data that breaks the bar /
//                        quote contract (non-monotonic dates, negative prices).
//                        Reported at construction time, never deferred into
//                        the indicator math.
//   - `ProviderError` : the market-data boundary failed (network, unknown
//                        ticker, malformed payload).  The scan loop converts
//                        these into "skip this ticker".
//
// Ineligibility (price ceiling, thin volume, ...) is NOT an error; see
// `recommendation::IneligibleReason`.
// =============================================================================

use chrono::NaiveDate;
use thiserror::Error;

/// Contract violation detected while constructing a `Bar`, `BarSeries`, or
/// `Quote`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInput {
    #[error("ticker must not be empty")]
    EmptyTicker,

    #[error("{field} must be a positive finite number, got {value}")]
    NonPositivePrice { field: &'static str, value: f64 },

    #[error("high {high} is below low {low}")]
    HighBelowLow { high: f64, low: f64 },

    #[error("{field} {value} lies outside the bar range [{low}, {high}]")]
    OutsideRange {
        field: &'static str,
        value: f64,
        low: f64,
        high: f64,
    },

    #[error("bar {index} dated {date} does not follow {previous}")]
    NonMonotonicDate {
        index: usize,
        date: NaiveDate,
        previous: NaiveDate,
    },

    #[error("bar {index} is invalid: {source}")]
    Bar {
        index: usize,
        #[source]
        source: Box<InvalidInput>,
    },
}

/// Failure at the market-data provider boundary.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport-level failure (DNS, TLS, timeout, connection reset).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered with an error payload or a non-success status.
    #[error("provider error: {0}")]
    Api(String),

    /// The provider does not know the ticker.
    #[error("unknown ticker {ticker}")]
    UnknownTicker { ticker: String },

    /// The provider returned no bars for the requested lookback.
    #[error("no price history for {ticker}")]
    EmptyHistory { ticker: String },

    /// None of the quote price fields resolved to a usable value.
    #[error("no usable quote price for {ticker}")]
    QuoteUnavailable { ticker: String },

    /// The payload could not be interpreted.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The payload decoded but violated the bar/quote contract.
    #[error(transparent)]
    Invalid(#[from] InvalidInput),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_bar_error_mentions_index_and_cause() {
        let err = InvalidInput::Bar {
            index: 3,
            source: Box::new(InvalidInput::HighBelowLow { high: 1.0, low: 2.0 }),
        };
        let msg = err.to_string();
        assert!(msg.contains("bar 3"), "{msg}");
        assert!(msg.contains("high 1 is below low 2"), "{msg}");
    }

    #[test]
    fn invalid_input_converts_into_provider_error() {
        let err: ProviderError = InvalidInput::EmptyTicker.into();
        assert!(matches!(err, ProviderError::Invalid(InvalidInput::EmptyTicker)));
        assert_eq!(err.to_string(), "ticker must not be empty");
    }
}
