//! Volume surge indicator.

use super::trailing_mean;
use crate::services::signals::Indicator;
use crate::types::PriceBar;

/// Current-bar volume relative to its own moving average.
pub struct VolumeRatio {
    period: usize,
}

/// Volume average and ratio for the last bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeOutput {
    pub average: f64,
    /// None when the average is zero.
    pub ratio: Option<f64>,
}

impl Default for VolumeRatio {
    fn default() -> Self {
        Self { period: 20 }
    }
}

impl Indicator for VolumeRatio {
    type Output = VolumeOutput;

    fn id(&self) -> &str {
        "volume_ratio"
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, bars: &[PriceBar]) -> Option<VolumeOutput> {
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
        let average = trailing_mean(&volumes, self.period)?;
        let current = *volumes.last()?;

        let ratio = if average > 0.0 && average.is_finite() {
            Some(current / average)
        } else {
            None
        };

        Some(VolumeOutput { average, ratio })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn bars_with_volumes(volumes: &[f64]) -> Vec<PriceBar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 9, 15, 0).unwrap();
        volumes
            .iter()
            .enumerate()
            .map(|(i, volume)| PriceBar {
                timestamp: start + Duration::minutes(5 * i as i64),
                open: 100.0,
                high: 100.0,
                low: 100.0,
                close: 100.0,
                volume: *volume,
            })
            .collect()
    }

    #[test]
    fn test_volume_surge_ratio() {
        let mut volumes = vec![100.0; 19];
        volumes.push(290.0);
        let output = VolumeRatio::default().calculate(&bars_with_volumes(&volumes)).unwrap();
        assert!((output.average - 109.5).abs() < 1e-12);
        assert!(output.ratio.unwrap() > 2.0);
    }

    #[test]
    fn test_zero_average_volume_has_no_ratio() {
        let volumes = vec![0.0; 20];
        let output = VolumeRatio::default().calculate(&bars_with_volumes(&volumes)).unwrap();
        assert_eq!(output.average, 0.0);
        assert_eq!(output.ratio, None);
    }

    #[test]
    fn test_volume_insufficient_data() {
        let volumes = vec![100.0; 19];
        assert!(VolumeRatio::default().calculate(&bars_with_volumes(&volumes)).is_none());
    }
}
