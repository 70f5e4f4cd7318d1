// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
//   SMA = (close_{t-n+1} + ... + close_t) / n
//
// Only the trailing `period` closes contribute.  The mean is taken as the
// oldest close plus the mean offset from it, so a flat window yields its
// level exactly.
// =============================================================================

/// Arithmetic mean of the last `period` closes.
///
/// Returns `None` when `period` is zero, when there are fewer than `period`
/// closes, or when the mean is non-finite.
pub fn calculate_sma(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }

    let window = &closes[closes.len() - period..];
    let anchor = window[0];
    let offset = window.iter().map(|c| c - anchor).sum::<f64>() / period as f64;
    let mean = anchor + offset;

    mean.is_finite().then_some(mean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_period_zero() {
        assert!(calculate_sma(&[1.0, 2.0], 0).is_none());
    }

    #[test]
    fn sma_insufficient_data() {
        let closes: Vec<f64> = (1..=13).map(|x| x as f64).collect();
        assert!(calculate_sma(&closes, 14).is_none());
    }

    #[test]
    fn sma_worked_example() {
        // 1..=14 => mean 7.5
        let closes: Vec<f64> = (1..=14).map(|x| x as f64).collect();
        let sma = calculate_sma(&closes, 14).unwrap();
        assert!((sma - 7.5).abs() < 1e-12, "got {sma}");
    }

    #[test]
    fn sma_uses_trailing_window_only() {
        // Leading 1000.0 falls outside the 3-bar window.
        let sma = calculate_sma(&[1000.0, 2.0, 4.0, 6.0], 3).unwrap();
        assert!((sma - 4.0).abs() < 1e-12);
    }

    #[test]
    fn sma_of_flat_window_is_exact() {
        for level in [0.1, 0.37, 3.3, 123.45] {
            assert_eq!(calculate_sma(&[level; 20], 14), Some(level));
        }
    }

    #[test]
    fn sma_non_finite_is_none() {
        assert!(calculate_sma(&[1.0, f64::NAN, 3.0], 3).is_none());
    }
}
