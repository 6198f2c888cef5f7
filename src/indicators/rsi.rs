/// Calculate Relative Strength Index (RSI)
///
/// Uses the `period` most recent close-to-close differences. Gains and losses
/// are averaged over `period` (a window with no losses averages to zero).
///
/// Values:
/// - RSI > 70: Overbought
/// - RSI < 30: Oversold
///
/// When the average loss is exactly zero the RSI is 100, even if there were no
/// gains either (a flat window).
pub fn calculate_rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let window = &closes[closes.len() - (period + 1)..];

    let (gain_sum, loss_sum) = window
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .fold((0.0, 0.0), |(gains, losses), change| {
            if change >= 0.0 {
                (gains + change, losses)
            } else {
                (gains, losses + change.abs())
            }
        });

    let avg_gain = gain_sum / period as f64;
    let avg_loss = loss_sum / period as f64;

    if avg_loss == 0.0 {
        return Some(100.0);
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - (100.0 / (1.0 + rs)))
}
