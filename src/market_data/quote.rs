use serde::Serialize;

use crate::errors::InvalidInput;

/// Live snapshot for a ticker.
///
/// `price` is always positive and finite.  `volume` is optional: when it is
/// absent, a configured minimum-volume filter fails closed.  The remaining
/// fields are informational and never feed the indicator math.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    ticker: String,
    price: f64,
    volume: Option<u64>,
    day_high: Option<f64>,
    day_low: Option<f64>,
    fifty_two_week_high: Option<f64>,
    fifty_two_week_low: Option<f64>,
    market_cap: Option<f64>,
}

impl Quote {
    pub fn new(ticker: impl Into<String>, price: f64) -> Result<Self, InvalidInput> {
        let ticker = ticker.into();
        if ticker.trim().is_empty() {
            return Err(InvalidInput::EmptyTicker);
        }
        if !price.is_finite() || price <= 0.0 {
            return Err(InvalidInput::NonPositivePrice {
                field: "price",
                value: price,
            });
        }
        Ok(Self {
            ticker,
            price,
            volume: None,
            day_high: None,
            day_low: None,
            fifty_two_week_high: None,
            fifty_two_week_low: None,
            market_cap: None,
        })
    }

    pub fn with_volume(mut self, volume: Option<u64>) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_day_range(mut self, high: Option<f64>, low: Option<f64>) -> Self {
        self.day_high = high.filter(|v| v.is_finite());
        self.day_low = low.filter(|v| v.is_finite());
        self
    }

    pub fn with_fifty_two_week_range(mut self, high: Option<f64>, low: Option<f64>) -> Self {
        self.fifty_two_week_high = high.filter(|v| v.is_finite());
        self.fifty_two_week_low = low.filter(|v| v.is_finite());
        self
    }

    pub fn with_market_cap(mut self, market_cap: Option<f64>) -> Self {
        self.market_cap = market_cap.filter(|v| v.is_finite());
        self
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn volume(&self) -> Option<u64> {
        self.volume
    }

    pub fn day_high(&self) -> Option<f64> {
        self.day_high
    }

    pub fn day_low(&self) -> Option<f64> {
        self.day_low
    }

    pub fn fifty_two_week_high(&self) -> Option<f64> {
        self.fifty_two_week_high
    }

    pub fn fifty_two_week_low(&self) -> Option<f64> {
        self.fifty_two_week_low
    }

    pub fn market_cap(&self) -> Option<f64> {
        self.market_cap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_price_is_rejected() {
        assert!(Quote::new("ABC", 0.0).is_err());
    }

    #[test]
    fn infinite_price_is_rejected() {
        assert!(Quote::new("ABC", f64::INFINITY).is_err());
    }

    #[test]
    fn empty_ticker_is_rejected() {
        assert_eq!(Quote::new("", 1.0).unwrap_err(), InvalidInput::EmptyTicker);
    }

    #[test]
    fn builder_sets_optional_fields() {
        let q = Quote::new("ABC", 4.2)
            .unwrap()
            .with_volume(Some(2_000_000))
            .with_day_range(Some(4.5), Some(4.0))
            .with_fifty_two_week_range(Some(9.0), Some(f64::NAN))
            .with_market_cap(Some(1.5e9));
        assert_eq!(q.volume(), Some(2_000_000));
        assert_eq!(q.day_high(), Some(4.5));
        assert_eq!(q.day_low(), Some(4.0));
        assert_eq!(q.fifty_two_week_high(), Some(9.0));
        assert_eq!(q.fifty_two_week_low(), None);
        assert_eq!(q.market_cap(), Some(1.5e9));
    }
}
