//! Price band projection.

use super::indicators::ReturnVolatility;
use super::Indicator;
use crate::types::{ConfidenceScore, PricePrediction, PriceSeries};

/// Volatility substituted when it cannot be determined from history.
pub const DEFAULT_VOLATILITY: f64 = 0.01;

/// Upper bound of the band widening term.
pub const MAX_VOLATILITY_WIDENING: f64 = 0.05;

/// Maps a confidence score and realized volatility to a price band.
#[derive(Debug, Default, Clone, Copy)]
pub struct RangePredictor;

impl RangePredictor {
    pub fn new() -> Self {
        Self
    }

    /// Volatility of a window's returns, or the default when undetermined.
    pub fn volatility(series: &PriceSeries) -> f64 {
        ReturnVolatility
            .calculate(series.bars())
            .unwrap_or(DEFAULT_VOLATILITY)
    }

    /// Widening applied to the tier's base changes. Negative or non-finite
    /// volatility widens by nothing.
    pub fn widening(volatility: f64) -> f64 {
        if !volatility.is_finite() || volatility <= 0.0 {
            return 0.0;
        }
        (volatility * 2.0).min(MAX_VOLATILITY_WIDENING)
    }

    /// Project a band around `reference_close`.
    ///
    /// Returns None when the reference close is not a positive finite price.
    pub fn predict(
        &self,
        reference_close: f64,
        volatility: f64,
        confidence: ConfidenceScore,
    ) -> Option<PricePrediction> {
        if !reference_close.is_finite() || reference_close <= 0.0 {
            return None;
        }

        let (mut min_change, mut max_change, mut mid_change) = confidence.tier().base_changes();

        let widening = Self::widening(volatility);
        min_change -= widening;
        max_change += widening;
        mid_change += widening * 0.5;

        let prediction = PricePrediction {
            predicted_min: reference_close * (1.0 + min_change),
            predicted_price: reference_close * (1.0 + mid_change),
            predicted_max: reference_close * (1.0 + max_change),
        };

        debug_assert!(prediction.predicted_min <= prediction.predicted_price);
        debug_assert!(prediction.predicted_price <= prediction.predicted_max);

        Some(prediction)
    }

    /// Predict from a training window: its last close and return volatility.
    pub fn predict_from_window(
        &self,
        series: &PriceSeries,
        confidence: ConfidenceScore,
    ) -> Option<PricePrediction> {
        let reference_close = series.last()?.close;
        self.predict(reference_close, Self::volatility(series), confidence)
    }
}
