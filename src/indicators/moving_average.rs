/// Simple Moving Average over the trailing `period` closes
///
/// Returns `None` when fewer than `period` closes are available. Callers must
/// not substitute a default for a missing value.
pub fn calculate_sma(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }

    let window = &closes[closes.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Exponential Moving Average with smoothing factor `2 / (period + 1)`
///
/// Seeded with the SMA of the first `period` closes, then applied forward
/// across every later close. Recomputed from scratch on every call.
pub fn calculate_ema(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let seed = calculate_sma(&closes[..period], period)?;

    let ema = closes[period..]
        .iter()
        .fold(seed, |ema, close| (close - ema) * alpha + ema);

    Some(ema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_uses_trailing_window() {
        let closes = vec![1.0, 2.0, 100.0, 102.0, 104.0, 106.0, 108.0];
        assert_eq!(calculate_sma(&closes, 5), Some(104.0));
    }

    #[test]
    fn test_sma_insufficient_data() {
        let closes = vec![100.0, 102.0];
        assert!(calculate_sma(&closes, 5).is_none());
        assert!(calculate_sma(&[], 1).is_none());
    }

    #[test]
    fn test_sma_exact_length() {
        let closes = vec![2.0, 4.0, 6.0];
        assert_eq!(calculate_sma(&closes, 3), Some(4.0));
    }

    #[test]
    fn test_ema_seeded_by_sma() {
        // Exactly `period` closes: EMA is the seed itself
        let closes = vec![10.0, 20.0, 30.0];
        assert_eq!(calculate_ema(&closes, 3), Some(20.0));
    }

    #[test]
    fn test_ema_recurrence() {
        // seed = 20, alpha = 0.5
        // 40 -> 30, 50 -> 40
        let closes = vec![10.0, 20.0, 30.0, 40.0, 50.0];
        let ema = calculate_ema(&closes, 3).unwrap();
        assert!((ema - 40.0).abs() < 1e-12);
    }

    #[test]
    fn test_ema_insufficient_data() {
        assert!(calculate_ema(&[1.0, 2.0], 3).is_none());
    }

    #[test]
    fn test_ema_constant_series() {
        let closes = vec![42.0; 30];
        let ema = calculate_ema(&closes, 9).unwrap();
        assert!((ema - 42.0).abs() < 1e-12);
    }
}
