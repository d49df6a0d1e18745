//! Forecasting signals.
//!
//! Technical indicator calculations, the composite confidence score,
//! price band projection and end-of-day accuracy evaluation.

pub mod accuracy;
pub mod engine;
pub mod forecaster;
pub mod indicators;
pub mod predictions;
pub mod range;
pub mod scorer;

pub use accuracy::AccuracyEvaluator;
pub use engine::IndicatorEngine;
pub use forecaster::{ForecastRun, Forecaster};
pub use predictions::{ForecastStore, StoreError};
pub use range::RangePredictor;
pub use scorer::ConfidenceScorer;

use crate::types::PriceBar;

/// Trait for implementing technical indicators.
pub trait Indicator: Send + Sync {
    /// Value produced for the last bar of a window.
    type Output;

    /// Unique identifier for this indicator.
    fn id(&self) -> &str;

    /// Minimum number of bars required for a defined value.
    fn min_periods(&self) -> usize;

    /// Calculate the indicator for the last bar of `bars`.
    /// Returns None if there is insufficient data.
    fn calculate(&self, bars: &[PriceBar]) -> Option<Self::Output>;
}
