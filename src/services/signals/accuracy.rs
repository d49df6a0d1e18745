//! End-of-day accuracy evaluation of same-day forecasts.

use crate::services::historical::PriceSource;
use crate::types::{
    EvaluationRecord, EvaluationResult, ForecastRecord, Interval, Metric, PriceSeries,
};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

/// Default tolerance for a HIT, in percent of the actual close.
pub const DEFAULT_TOLERANCE_PCT: f64 = 2.0;

/// Classifies a forecast close against the realized close.
///
/// This is a point test, separate from the band-overlap test used by the
/// walk-forward backtester.
#[derive(Debug, Clone, Copy)]
pub struct AccuracyEvaluator {
    tolerance_pct: f64,
}

impl Default for AccuracyEvaluator {
    fn default() -> Self {
        Self {
            tolerance_pct: DEFAULT_TOLERANCE_PCT,
        }
    }
}

impl AccuracyEvaluator {
    pub fn new(tolerance_pct: f64) -> Self {
        Self { tolerance_pct }
    }

    pub fn tolerance_pct(&self) -> f64 {
        self.tolerance_pct
    }

    /// Percentage difference `|predicted - actual| / actual * 100`.
    pub fn diff_pct(predicted: f64, actual: f64) -> Option<f64> {
        if !predicted.is_finite() || !actual.is_finite() || actual == 0.0 {
            return None;
        }
        Some((predicted - actual).abs() * 100.0 / actual.abs())
    }

    /// Compare a predicted close with the actual close.
    ///
    /// NO_DATA when either side is missing, ERROR when either side is not a
    /// usable number (unparseable, non-finite, or a zero actual).
    pub fn evaluate(&self, predicted: &Metric, actual: &Metric) -> EvaluationResult {
        if actual.is_missing() || predicted.is_missing() {
            return EvaluationResult::NoData;
        }

        let (Some(predicted), Some(actual)) = (predicted.value(), actual.value()) else {
            return EvaluationResult::Error;
        };

        match Self::diff_pct(predicted, actual) {
            Some(diff) if diff <= self.tolerance_pct => EvaluationResult::Hit,
            Some(_) => EvaluationResult::Miss,
            None => EvaluationResult::Error,
        }
    }

    /// Evaluate a day's forecasts against the realized daily bar at `as_of`.
    ///
    /// One record per forecast; symbols without a realized bar get NO_DATA.
    pub fn evaluate_forecasts(
        &self,
        forecasts: &[ForecastRecord],
        source: &dyn PriceSource,
        as_of: DateTime<Utc>,
    ) -> Vec<EvaluationRecord> {
        let day_start = as_of
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|d| d.and_utc())
            .unwrap_or(as_of);
        // Realized prices stop at `as_of`
        let day_end = (day_start + Duration::days(1)).min(as_of);

        let evaluations: Vec<EvaluationRecord> = forecasts
            .iter()
            .map(|forecast| {
                let fetched = if day_end > day_start {
                    source.fetch(&forecast.symbol, day_start, day_end, Interval::Daily)
                } else {
                    Ok(PriceSeries::empty(&forecast.symbol, Interval::Daily))
                };
                let (open, close, high, low) = match fetched {
                    Ok(series) if !series.is_empty() => {
                        let open = series.first().map(|b| b.open);
                        let extremes = series.extremes();
                        (
                            Metric::from_option(open),
                            Metric::from_option(extremes.map(|e| e.2)),
                            Metric::from_option(extremes.map(|e| e.1)),
                            Metric::from_option(extremes.map(|e| e.0)),
                        )
                    }
                    Ok(_) => {
                        debug!(
                            "No realized bar for {} on {}",
                            forecast.symbol,
                            day_start.date_naive()
                        );
                        (Metric::Missing, Metric::Missing, Metric::Missing, Metric::Missing)
                    }
                    Err(e) => {
                        warn!("Failed to fetch realized prices for {}: {}", forecast.symbol, e);
                        (Metric::Missing, Metric::Missing, Metric::Missing, Metric::Missing)
                    }
                };

                let result = self.evaluate(&forecast.predicted_close, &close);

                EvaluationRecord {
                    rank: forecast.rank,
                    symbol: forecast.symbol.clone(),
                    date: day_start.date_naive(),
                    confidence_score: forecast.confidence_score,
                    predicted_close: forecast.predicted_close.clone(),
                    recommendation: forecast.recommendation,
                    reason: forecast.reason.clone(),
                    actual_open: open,
                    actual_close: close,
                    actual_high: high,
                    actual_low: low,
                    result,
                }
            })
            .collect();

        info!(
            "Evaluated {} forecasts for {}",
            evaluations.len(),
            day_start.date_naive()
        );

        evaluations
    }
}
