// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_0      = close_0
//   EMA_t      = EMA_{t-1} + multiplier * (close_t - EMA_{t-1})
//
// The increment form keeps a constant series exactly constant.
//
// The recurrence runs over the full history (no SMA seed, no bias
// adjustment).  Values before `period` closes are warm-up state: the series
// is computed but `latest_ema` refuses to report it.
// =============================================================================

/// Compute the EMA series for `closes`, one output per input close.
///
/// Returns an empty `Vec` when the input is empty or the period is zero.
/// Production stops at the first non-finite value.
pub fn calculate_ema(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.is_empty() {
        return Vec::new();
    }

    let multiplier = 2.0 / (period as f64 + 1.0);

    let mut result = Vec::with_capacity(closes.len());
    let mut prev_ema = closes[0];
    if !prev_ema.is_finite() {
        return result;
    }
    result.push(prev_ema);

    for &close in &closes[1..] {
        let ema = prev_ema + multiplier * (close - prev_ema);
        if !ema.is_finite() {
            break;
        }
        result.push(ema);
        prev_ema = ema;
    }

    result
}

/// Most recent EMA value, reported only once at least `period` closes exist.
pub fn latest_ema(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }
    let series = calculate_ema(closes, period);
    // A truncated series means a non-finite value appeared mid-history.
    if series.len() != closes.len() {
        return None;
    }
    series.last().copied()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    // ---- calculate_ema ---------------------------------------------------

    #[test]
    fn ema_empty_input() {
        assert!(calculate_ema(&[], 5).is_empty());
    }

    #[test]
    fn ema_period_zero() {
        assert!(calculate_ema(&[1.0, 2.0, 3.0], 0).is_empty());
    }

    #[test]
    fn ema_seeded_by_first_close() {
        let ema = calculate_ema(&[5.0, 5.0, 5.0], 14);
        assert_eq!(ema.len(), 3);
        assert!((ema[0] - 5.0).abs() < 1e-12);
        assert!((ema[2] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn ema_known_values() {
        // 3-period EMA, multiplier = 0.5
        let ema = calculate_ema(&[2.0, 4.0, 8.0], 3);
        assert_eq!(ema, vec![2.0, 3.0, 5.5]);
    }

    #[test]
    fn ema_of_flat_series_is_exact() {
        let closes = [10.0; 30];
        for period in [3, 9, 14, 20] {
            assert!(calculate_ema(&closes, period).iter().all(|&v| v == 10.0));
            assert_eq!(latest_ema(&closes, period), Some(10.0));
        }
        let pennies = [0.1; 25];
        assert_eq!(latest_ema(&pennies, 14), Some(0.1));
    }

    #[test]
    fn ema_handles_nan_in_input() {
        let ema = calculate_ema(&[1.0, 2.0, f64::NAN, 4.0], 3);
        assert_eq!(ema.len(), 2);
    }

    // ---- latest_ema ------------------------------------------------------

    #[test]
    fn latest_ema_needs_full_window() {
        let closes: Vec<f64> = (1..=13).map(|x| x as f64).collect();
        assert!(latest_ema(&closes, 14).is_none());
    }

    #[test]
    fn latest_ema_worked_example() {
        // alpha = 2/15, seeded at 1, applied across 1..=14.
        let closes: Vec<f64> = (1..=14).map(|x| x as f64).collect();
        let ema = latest_ema(&closes, 14).unwrap();
        assert!((ema - 8.511557487148107).abs() < 1e-9, "got {ema}");
    }

    #[test]
    fn latest_ema_rejects_broken_history() {
        let mut closes: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        closes[10] = f64::NAN;
        assert!(latest_ema(&closes, 14).is_none());
    }
}
