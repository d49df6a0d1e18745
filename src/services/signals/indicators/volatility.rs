//! Realized volatility of period-over-period returns.

use super::sma::sample_std_dev;
use crate::services::signals::Indicator;
use crate::types::PriceBar;

/// Sample standard deviation of close-to-close percentage returns.
///
/// Returns with a zero previous close are dropped.
#[derive(Default)]
pub struct ReturnVolatility;

impl Indicator for ReturnVolatility {
    type Output = f64;

    fn id(&self) -> &str {
        "return_volatility"
    }

    fn min_periods(&self) -> usize {
        3
    }

    fn calculate(&self, bars: &[PriceBar]) -> Option<f64> {
        let returns: Vec<f64> = bars
            .windows(2)
            .filter(|pair| pair[0].close != 0.0)
            .map(|pair| pair[1].close / pair[0].close - 1.0)
            .filter(|r| r.is_finite())
            .collect();

        sample_std_dev(&returns).filter(|v| v.is_finite())
    }
}
