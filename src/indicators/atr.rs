// =============================================================================
// Average True Range (ATR): simple rolling mean
// =============================================================================
//
// ATR measures market volatility by decomposing the entire range of a bar.
//
// True Range (TR) for each bar:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
//   TR_0 = H - L            (first bar has no previous close)
//
// ATR is the arithmetic mean of the trailing `period` TR values.  It is only
// reported once every TR in the window has a real previous close, i.e. with
// at least `period + 1` bars.
//
// Default period: 14
// =============================================================================

use crate::market_data::Bar;

/// True Range of `bar` given the previous close, if any.
pub fn true_range(bar: &Bar, prev_close: Option<f64>) -> f64 {
    let hl = bar.high() - bar.low();
    match prev_close {
        Some(pc) => {
            let hc = (bar.high() - pc).abs();
            let lc = (bar.low() - pc).abs();
            hl.max(hc).max(lc)
        }
        None => hl,
    }
}

/// True Range for every bar, oldest first.  Element 0 is `high - low`.
pub fn true_range_series(bars: &[Bar]) -> Vec<f64> {
    let mut out = Vec::with_capacity(bars.len());
    let mut prev_close = None;
    for bar in bars {
        out.push(true_range(bar, prev_close));
        prev_close = Some(bar.close());
    }
    out
}

/// Most recent ATR: the mean of the last `period` True Range values.
///
/// # Returns
/// `None` when:
/// - `period` is zero.
/// - There are fewer than `period + 1` bars.
/// - The mean is non-finite.
pub fn calculate_atr(bars: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() <= period {
        return None;
    }

    let tr_values = true_range_series(bars);
    let window = &tr_values[tr_values.len() - period..];
    let atr = window.iter().sum::<f64>() / period as f64;

    atr.is_finite().then_some(atr)
}
