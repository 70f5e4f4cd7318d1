// =============================================================================
// Signals Module
// =============================================================================
//
// Discrete trading signals and the ordered decision list that produces them.

pub mod classifier;

pub use classifier::{classify, Classification};

use serde::Serialize;

/// Closed signal vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    SellOverbought,
    SellDowntrend,
    BuyOversold,
    BuyUptrend,
    HoldStable,
}

/// Short Buy / Hold / Sell vocabulary for renderers that do not need the
/// reason behind a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SimpleSignal {
    Buy,
    Hold,
    Sell,
}

/// Direction label derived from the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

impl Signal {
    pub fn simple(self) -> SimpleSignal {
        match self {
            Self::BuyOversold | Self::BuyUptrend => SimpleSignal::Buy,
            Self::SellOverbought | Self::SellDowntrend => SimpleSignal::Sell,
            Self::HoldStable => SimpleSignal::Hold,
        }
    }

    pub fn is_buy(self) -> bool {
        self.simple() == SimpleSignal::Buy
    }

    pub fn trend(self) -> Trend {
        match self.simple() {
            SimpleSignal::Buy => Trend::Bullish,
            SimpleSignal::Sell => Trend::Bearish,
            SimpleSignal::Hold => Trend::Neutral,
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SellOverbought => write!(f, "Sell (Overbought)"),
            Self::SellDowntrend => write!(f, "Sell (Downtrend)"),
            Self::BuyOversold => write!(f, "Buy (Oversold)"),
            Self::BuyUptrend => write!(f, "Buy (Uptrend)"),
            Self::HoldStable => write!(f, "Hold (Stable)"),
        }
    }
}

impl std::fmt::Display for SimpleSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "Buy"),
            Self::Hold => write!(f, "Hold"),
            Self::Sell => write!(f, "Sell"),
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "Bullish"),
            Self::Bearish => write!(f, "Bearish"),
            Self::Neutral => write!(f, "Neutral"),
        }
    }
}
