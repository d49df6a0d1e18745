//! Morning forecast cycle: rank symbols by confidence and project their bands.

use super::{ConfidenceScorer, IndicatorEngine, RangePredictor};
use crate::services::historical::PriceSource;
use crate::types::{
    ConfidenceScore, ForecastRecord, Interval, Metric, PricePrediction, Recommendation,
};
use chrono::{DateTime, Duration, Utc};
use std::cmp::Ordering;
use tracing::{debug, info, warn};

/// Default number of symbols kept per forecast run.
pub const DEFAULT_TOP_N: usize = 5;

/// Output of one forecast cycle.
#[derive(Debug, Clone, Default)]
pub struct ForecastRun {
    /// Ranked forecasts, best confidence first.
    pub forecasts: Vec<ForecastRecord>,
    /// Symbols without usable history.
    pub skipped: Vec<String>,
}

struct Candidate {
    symbol: String,
    confidence: ConfidenceScore,
    current_close: Option<f64>,
    prediction: Option<PricePrediction>,
}

/// Produces ranked same-day forecasts from trailing price windows.
pub struct Forecaster {
    engine: IndicatorEngine,
    scorer: ConfidenceScorer,
    predictor: RangePredictor,
    lookback_days: i64,
    interval: Interval,
    top_n: usize,
}

impl Default for Forecaster {
    fn default() -> Self {
        Self::new(30, DEFAULT_TOP_N)
    }
}

impl Forecaster {
    pub fn new(lookback_days: i64, top_n: usize) -> Self {
        Self {
            engine: IndicatorEngine::new(),
            scorer: ConfidenceScorer::new(),
            predictor: RangePredictor::new(),
            lookback_days,
            interval: Interval::FiveMinute,
            top_n,
        }
    }

    pub fn with_interval(mut self, interval: Interval) -> Self {
        self.interval = interval;
        self
    }

    /// Forecast `symbols` from the `lookback_days` of history before `as_of`.
    pub fn forecast(
        &self,
        symbols: &[String],
        source: &dyn PriceSource,
        as_of: DateTime<Utc>,
    ) -> ForecastRun {
        let start = as_of - Duration::days(self.lookback_days);
        let mut run = ForecastRun::default();
        let mut candidates = Vec::with_capacity(symbols.len());

        for symbol in symbols {
            let window = match source.fetch(symbol, start, as_of, self.interval) {
                Ok(window) if !window.is_empty() => window,
                Ok(_) => {
                    debug!("No history for {} before {}", symbol, as_of);
                    run.skipped.push(symbol.clone());
                    continue;
                }
                Err(e) => {
                    warn!("Failed to fetch history for {}: {}", symbol, e);
                    run.skipped.push(symbol.clone());
                    continue;
                }
            };

            let snapshot = self.engine.compute(&window);
            let confidence = self.scorer.score(snapshot.as_ref());
            let prediction = self.predictor.predict_from_window(&window, confidence);

            candidates.push(Candidate {
                symbol: symbol.clone(),
                confidence,
                current_close: window.last().map(|b| b.close),
                prediction,
            });
        }

        candidates.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        candidates.truncate(self.top_n);

        let date = as_of.date_naive();
        run.forecasts = candidates
            .into_iter()
            .enumerate()
            .map(|(i, c)| {
                let recommendation = Recommendation::from_score(c.confidence);
                ForecastRecord {
                    rank: i as u32 + 1,
                    symbol: c.symbol,
                    date,
                    confidence_score: c.confidence,
                    current_close: Metric::from_option(c.current_close),
                    predicted_min: Metric::from_option(c.prediction.map(|p| p.predicted_min)),
                    predicted_close: Metric::from_option(c.prediction.map(|p| p.predicted_price)),
                    predicted_max: Metric::from_option(c.prediction.map(|p| p.predicted_max)),
                    recommendation,
                    reason: recommendation.reason().to_string(),
                }
            })
            .collect();

        info!(
            "Forecast {} symbols for {} ({} skipped)",
            run.forecasts.len(),
            date,
            run.skipped.len()
        );

        run
    }
}
