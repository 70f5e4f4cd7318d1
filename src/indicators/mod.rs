// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators used by the
// signal classifier.  Every public function returns `Option<T>` so callers
// are forced to handle insufficient-data and numerical-edge-case scenarios;
// an undefined value is never substituted with zero.

pub mod atr;
pub mod ema;
pub mod rsi;
pub mod sma;

use serde::Serialize;

use crate::market_data::BarSeries;

/// Indicator values computed from one `BarSeries`.
///
/// Recomputed on every call; identical input produces bit-identical output.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct IndicatorSet {
    pub sma: Option<f64>,
    pub ema: Option<f64>,
    pub atr: Option<f64>,
    pub rsi: Option<f64>,
}

impl IndicatorSet {
    /// Compute SMA, EMA, ATR and RSI over `window` bars.
    ///
    /// SMA and EMA need `window` bars; ATR and RSI need `window + 1`.
    pub fn compute(series: &BarSeries, window: usize) -> Self {
        let closes = series.closes();
        Self {
            sma: sma::calculate_sma(&closes, window),
            ema: ema::latest_ema(&closes, window),
            atr: atr::calculate_atr(series.bars(), window),
            rsi: rsi::calculate_rsi(&closes, window),
        }
    }

    /// `max(sma, ema)` when both are defined.
    pub fn target_price(&self) -> Option<f64> {
        match (self.sma, self.ema) {
            (Some(s), Some(e)) => Some(s.max(e)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::bar::series_from_closes;

    fn wavy(n: usize) -> Vec<f64> {
        (0..n).map(|i| 10.0 + (i as f64 * 0.7).sin() * 2.0).collect()
    }

    #[test]
    fn compute_is_deterministic() {
        let series = series_from_closes("ABC", &wavy(40));
        let a = IndicatorSet::compute(&series, 14);
        let b = IndicatorSet::compute(&series, 14);
        for (x, y) in [(a.sma, b.sma), (a.ema, b.ema), (a.atr, b.atr), (a.rsi, b.rsi)] {
            assert_eq!(x.map(f64::to_bits), y.map(f64::to_bits));
        }
    }

    #[test]
    fn undefined_below_window() {
        for k in 0..14 {
            let series = series_from_closes("ABC", &wavy(k));
            let set = IndicatorSet::compute(&series, 14);
            assert_eq!(set, IndicatorSet::default(), "k = {k}");
        }
    }

    #[test]
    fn window_larger_than_any_history_is_undefined() {
        let series = series_from_closes("ABC", &wavy(40));
        assert_eq!(IndicatorSet::compute(&series, usize::MAX), IndicatorSet::default());
    }

    #[test]
    fn sma_and_ema_defined_at_window_atr_rsi_one_later() {
        let set = IndicatorSet::compute(&series_from_closes("ABC", &wavy(14)), 14);
        assert!(set.sma.is_some());
        assert!(set.ema.is_some());
        assert!(set.atr.is_none());
        assert!(set.rsi.is_none());

        let set = IndicatorSet::compute(&series_from_closes("ABC", &wavy(15)), 14);
        assert!(set.atr.is_some());
        assert!(set.rsi.is_some());
    }

    #[test]
    fn rsi_stays_in_bounds() {
        for n in 15..60 {
            let set = IndicatorSet::compute(&series_from_closes("ABC", &wavy(n)), 14);
            let rsi = set.rsi.unwrap();
            assert!((0.0..=100.0).contains(&rsi), "RSI {rsi} out of range");
        }
    }

    #[test]
    fn worked_example_values() {
        let closes: Vec<f64> = (1..=14).map(|x| x as f64).collect();
        let set = IndicatorSet::compute(&series_from_closes("ABC", &closes), 14);
        assert!((set.sma.unwrap() - 7.5).abs() < 1e-12);
        assert!((set.ema.unwrap() - 8.511557487148107).abs() < 1e-9);
        assert!((set.target_price().unwrap() - 8.511557487148107).abs() < 1e-9);
    }

    #[test]
    fn target_undefined_when_either_average_missing() {
        let set = IndicatorSet {
            sma: Some(5.0),
            ema: None,
            ..Default::default()
        };
        assert!(set.target_price().is_none());
    }
}
