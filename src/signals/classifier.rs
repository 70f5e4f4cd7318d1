// =============================================================================
// Signal Classifier: ordered decision list
// =============================================================================
//
// First matching rule wins.  RSI extremes are checked before the EMA trend
// rules so that an oversold / overbought reading overrides trend following.
//
//   1. RSI < oversold                                   => BuyOversold
//   2. RSI > overbought                                 => SellOverbought
//   3. P > EMA and (target - P) / P > min_profit        => BuyUptrend
//   4. P < EMA                                          => SellDowntrend
//   5. otherwise                                        => HoldStable
//
// A rule whose indicator is undefined is skipped, never evaluated against a
// default value.
// =============================================================================

use serde::Serialize;
use tracing::debug;

use crate::indicators::IndicatorSet;
use crate::runtime_config::EngineConfig;
use crate::signals::Signal;

/// Signal plus a one-line explanation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub signal: Signal,
    pub rationale: String,
}

impl Classification {
    fn new(signal: Signal, rationale: impl Into<String>) -> Self {
        Self {
            signal,
            rationale: rationale.into(),
        }
    }
}

/// Classify quote price `price` against `indicators`.
pub fn classify(price: f64, indicators: &IndicatorSet, config: &EngineConfig) -> Classification {
    let classification = evaluate(price, indicators, config);
    debug!(
        price,
        rsi = ?indicators.rsi,
        ema = ?indicators.ema,
        signal = %classification.signal,
        "classified"
    );
    classification
}

fn evaluate(price: f64, indicators: &IndicatorSet, config: &EngineConfig) -> Classification {
    if let Some(rsi) = indicators.rsi {
        if rsi < config.rsi_oversold {
            return Classification::new(
                Signal::BuyOversold,
                format!(
                    "RSI {rsi:.2} indicates oversold conditions. This is a potential buy opportunity."
                ),
            );
        }
        if rsi > config.rsi_overbought {
            return Classification::new(
                Signal::SellOverbought,
                format!(
                    "RSI {rsi:.2} indicates overbought conditions. Consider selling to secure profits."
                ),
            );
        }
    }

    if let Some(ema) = indicators.ema {
        if price > ema {
            if let Some(target) = indicators.target_price() {
                let upside = (target - price) / price;
                if upside > config.min_profit_fraction {
                    return Classification::new(
                        Signal::BuyUptrend,
                        "The price is above the EMA with room to the target, suggesting an uptrend. This may be a buy opportunity.",
                    );
                }
            }
        } else if price < ema {
            return Classification::new(
                Signal::SellDowntrend,
                "The price is below the EMA, suggesting a downtrend. Selling may be prudent.",
            );
        }
    }

    Classification::new(
        Signal::HoldStable,
        "The stock is in a stable range. Holding is recommended.",
    )
}
