//! MACD (Moving Average Convergence Divergence) indicator.

use super::Ema;
use crate::services::signals::Indicator;
use crate::types::PriceBar;

/// MACD indicator.
///
/// Shows the relationship between two EMAs:
/// - MACD Line = EMA(12) - EMA(26)
/// - Signal Line = EMA(9) of MACD Line
/// - Histogram = MACD Line - Signal Line
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

/// MACD values for the last bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdOutput {
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

impl Macd {
    /// Bars needed before the signal line stops being dominated by warm-up noise.
    pub fn warmup_periods(&self) -> usize {
        self.slow_period + self.signal_period
    }
}

impl Indicator for Macd {
    type Output = MacdOutput;

    fn id(&self) -> &str {
        "macd"
    }

    fn min_periods(&self) -> usize {
        1
    }

    fn calculate(&self, bars: &[PriceBar]) -> Option<MacdOutput> {
        if bars.is_empty() {
            return None;
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let fast_ema = Ema::series(&closes, self.fast_period);
        let slow_ema = Ema::series(&closes, self.slow_period);

        // Both EMAs are defined from the first bar, so they align index by index
        let macd_line: Vec<f64> = fast_ema
            .iter()
            .zip(slow_ema.iter())
            .map(|(f, s)| f - s)
            .collect();
        let signal_line = Ema::series(&macd_line, self.signal_period);

        let macd = *macd_line.last()?;
        let signal = *signal_line.last()?;

        Some(MacdOutput {
            ema_fast: *fast_ema.last()?,
            ema_slow: *slow_ema.last()?,
            macd,
            signal,
            histogram: macd - signal,
        })
    }
}
