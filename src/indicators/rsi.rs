// =============================================================================
// Relative Strength Index (RSI): simple rolling averages
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1. Compute price changes (deltas) from consecutive closes.
// Step 2. gain = max(delta, 0), loss = max(-delta, 0).
// Step 3. avg_gain / avg_loss = arithmetic mean over the last `period`
//          deltas (no Wilder smoothing).
// Step 4. RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// avg_loss == 0 saturates to 100, including the flat-market case.
// =============================================================================

/// Most recent RSI value for `closes`.
///
/// # Edge cases
/// - `period == 0` => `None`
/// - `closes.len() < period + 1` => `None` (need `period` deltas)
/// - Average loss of zero => `Some(100.0)`
/// - Non-finite result => `None`
pub fn calculate_rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() <= period {
        return None;
    }

    let tail = &closes[closes.len() - period - 1..];
    let (sum_gain, sum_loss) = tail
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((0.0_f64, 0.0_f64), |(g, l), d| {
            if d > 0.0 {
                (g + d, l)
            } else {
                (g, l - d)
            }
        });

    let period_f = period as f64;
    rsi_from_averages(sum_gain / period_f, sum_loss / period_f)
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Convert average gain / average loss into an RSI value in [0, 100].
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    let rsi = if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    };

    rsi.is_finite().then_some(rsi)
}
