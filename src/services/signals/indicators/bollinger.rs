//! Bollinger Bands indicator.

use super::sma::{population_std_dev, trailing_mean};
use crate::services::signals::Indicator;
use crate::types::PriceBar;

/// Bollinger Bands indicator.
///
/// Consists of:
/// - Middle band: SMA(20)
/// - Upper band: SMA + 2 * StdDev
/// - Lower band: SMA - 2 * StdDev
///
/// StdDev is the population standard deviation of the same 20 closes.
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

/// Band values for the last bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerOutput {
    pub middle: f64,
    pub upper: f64,
    pub lower: f64,
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: 2.0,
        }
    }
}

impl Indicator for BollingerBands {
    type Output = BollingerOutput;

    fn id(&self) -> &str {
        "bollinger"
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, bars: &[PriceBar]) -> Option<BollingerOutput> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let middle = trailing_mean(&closes, self.period)?;
        let std_dev = population_std_dev(&closes[closes.len() - self.period..], middle);

        Some(BollingerOutput {
            middle,
            upper: middle + self.std_dev_multiplier * std_dev,
            lower: middle - self.std_dev_multiplier * std_dev,
        })
    }
}
