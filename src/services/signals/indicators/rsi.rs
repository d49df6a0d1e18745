//! Relative Strength Index (RSI) indicator.

use super::trailing_mean;
use crate::services::signals::Indicator;
use crate::types::PriceBar;

/// RSI (Relative Strength Index) indicator.
///
/// Mean gain over mean loss of the trailing `period` close-to-close changes.
/// Values range from 0-100:
/// - Below 30: Oversold
/// - Above 70: Overbought
///
/// A window with no losses yields 100.
pub struct Rsi {
    period: usize,
}

impl Default for Rsi {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// Calculate RSI value from price changes.
    fn calculate_rsi(bars: &[PriceBar], period: usize) -> Option<f64> {
        if period == 0 || bars.len() < period + 1 {
            return None;
        }

        let mut gains = Vec::with_capacity(bars.len() - 1);
        let mut losses = Vec::with_capacity(bars.len() - 1);

        for pair in bars.windows(2) {
            let change = pair[1].close - pair[0].close;
            if change > 0.0 {
                gains.push(change);
                losses.push(0.0);
            } else {
                gains.push(0.0);
                losses.push(-change);
            }
        }

        let avg_gain = trailing_mean(&gains, period)?;
        let avg_loss = trailing_mean(&losses, period)?;

        if avg_loss == 0.0 {
            return Some(100.0);
        }

        let rs = avg_gain / avg_loss;
        Some(100.0 - (100.0 / (1.0 + rs)))
    }
}

impl Indicator for Rsi {
    type Output = f64;

    fn id(&self) -> &str {
        "rsi"
    }

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, bars: &[PriceBar]) -> Option<f64> {
        Self::calculate_rsi(bars, self.period)
    }
}
