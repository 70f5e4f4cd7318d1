// =============================================================================
// Market-Data Provider Boundary
// =============================================================================
//
// The engine never fetches data itself; the scan loop asks a
// `MarketDataProvider` for a live `Quote` and a daily `BarSeries` per ticker.
// Any `ProviderError` means "no data for this ticker" and is never fatal to a
// scan.
//
// The trait is object-safe so the service can hold an
// `Arc<dyn MarketDataProvider>` and tests can swap in an in-memory double.
// =============================================================================

pub mod universe;
pub mod yahoo;

use async_trait::async_trait;

use crate::errors::ProviderError;
use crate::market_data::{BarSeries, Quote};

pub use yahoo::YahooClient;

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Live snapshot for `ticker`.
    async fn get_quote(&self, ticker: &str) -> Result<Quote, ProviderError>;

    /// Daily bars covering roughly the last `lookback_days` calendar days.
    async fn get_history(&self, ticker: &str, lookback_days: u32)
        -> Result<BarSeries, ProviderError>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory provider that records every call.

    use std::collections::HashMap;

    use parking_lot::Mutex;

    use super::*;
    use crate::market_data::bar::series_from_closes;

    #[derive(Clone)]
    pub enum Fixture {
        /// Quote at `price` with `volume`, history from `closes`.
        Listed {
            price: f64,
            volume: Option<u64>,
            closes: Vec<f64>,
        },
        /// Quote resolves but no price field is usable.
        NoPrice { closes: Vec<f64> },
        /// Every call fails at the transport level.
        Down,
    }

    #[derive(Default)]
    pub struct StaticProvider {
        fixtures: HashMap<String, Fixture>,
        pub quote_calls: Mutex<Vec<String>>,
        pub history_calls: Mutex<Vec<String>>,
    }

    impl StaticProvider {
        pub fn with(mut self, ticker: &str, fixture: Fixture) -> Self {
            self.fixtures.insert(ticker.to_string(), fixture);
            self
        }

        pub fn quote_calls(&self) -> Vec<String> {
            self.quote_calls.lock().clone()
        }

        pub fn history_calls(&self) -> Vec<String> {
            self.history_calls.lock().clone()
        }
    }

    #[async_trait]
    impl MarketDataProvider for StaticProvider {
        async fn get_quote(&self, ticker: &str) -> Result<Quote, ProviderError> {
            self.quote_calls.lock().push(ticker.to_string());
            match self.fixtures.get(ticker) {
                Some(Fixture::Listed { price, volume, .. }) => {
                    Ok(Quote::new(ticker, *price)?.with_volume(*volume))
                }
                Some(Fixture::NoPrice { .. }) => Err(ProviderError::QuoteUnavailable {
                    ticker: ticker.to_string(),
                }),
                Some(Fixture::Down) => Err(ProviderError::Api("503 Service Unavailable".into())),
                None => Err(ProviderError::UnknownTicker {
                    ticker: ticker.to_string(),
                }),
            }
        }

        async fn get_history(
            &self,
            ticker: &str,
            _lookback_days: u32,
        ) -> Result<BarSeries, ProviderError> {
            self.history_calls.lock().push(ticker.to_string());
            match self.fixtures.get(ticker) {
                Some(Fixture::Listed { closes, .. }) | Some(Fixture::NoPrice { closes }) => {
                    if closes.is_empty() {
                        return Err(ProviderError::EmptyHistory {
                            ticker: ticker.to_string(),
                        });
                    }
                    Ok(series_from_closes(ticker, closes))
                }
                Some(Fixture::Down) => Err(ProviderError::Api("503 Service Unavailable".into())),
                None => Err(ProviderError::UnknownTicker {
                    ticker: ticker.to_string(),
                }),
            }
        }
    }

    /// Closes that make SMA/EMA sit well above a price of 1.0 without
    /// driving RSI to an extreme.
    pub fn upside_closes() -> Vec<f64> {
        (0..20)
            .map(|i| if i % 2 == 0 { 2.0 } else { 2.1 })
            .collect()
    }

    #[tokio::test]
    async fn static_provider_records_calls() {
        let p = StaticProvider::default().with("AAA", Fixture::Down);
        assert!(p.get_quote("AAA").await.is_err());
        assert!(p.get_history("ZZZ", 30).await.is_err());
        assert_eq!(p.quote_calls(), vec!["AAA"]);
        assert_eq!(p.history_calls(), vec!["ZZZ"]);
    }

    #[tokio::test]
    async fn dynamic_dispatch_through_trait_object() {
        let p: Box<dyn MarketDataProvider> = Box::new(StaticProvider::default().with(
            "AAA",
            Fixture::Listed {
                price: 1.0,
                volume: None,
                closes: upside_closes(),
            },
        ));
        let q = p.get_quote("AAA").await.unwrap();
        assert_eq!(q.price(), 1.0);
        assert_eq!(p.get_history("AAA", 30).await.unwrap().len(), 20);
    }
}
