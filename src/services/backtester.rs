//! Walk-forward backtesting.
//!
//! Replays the forecasting pipeline over past dates. Each simulated date is
//! predicted from a training window that ends four days before it, and the
//! prediction is judged against the realized range of the following test
//! days. Iterations whose windows reach past the retained history are
//! skipped, never truncated.

use crate::services::historical::PriceSource;
use crate::services::signals::{ConfidenceScorer, IndicatorEngine, RangePredictor};
use crate::types::{
    BacktestConfig, BacktestRecord, BacktestRun, SkipReason, SkippedIteration, TestOffset,
    TEST_OFFSETS, TRAINING_GAP_DAYS,
};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Backtesting errors.
#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Walk-forward backtester.
#[derive(Default)]
pub struct WalkForwardBacktester {
    engine: IndicatorEngine,
    scorer: ConfidenceScorer,
    predictor: RangePredictor,
}

impl WalkForwardBacktester {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject configurations that cannot describe a walk-forward run.
    pub fn validate(config: &BacktestConfig) -> Result<(), BacktestError> {
        if config.lookback_days <= 0 {
            return Err(BacktestError::InvalidConfig(format!(
                "lookback_days must be positive, got {}",
                config.lookback_days
            )));
        }
        if config.test_days < 0 {
            return Err(BacktestError::InvalidConfig(format!(
                "test_days must not be negative, got {}",
                config.test_days
            )));
        }
        if config.max_history_days <= 0 {
            return Err(BacktestError::InvalidConfig(format!(
                "max_history_days must be positive, got {}",
                config.max_history_days
            )));
        }
        Ok(())
    }

    /// Run every configured symbol sequentially.
    pub fn run(
        &self,
        config: &BacktestConfig,
        source: &dyn PriceSource,
    ) -> Result<BacktestRun, BacktestError> {
        Self::validate(config)?;

        info!(
            "Running backtest for {} symbols over {} simulated dates as of {}",
            config.symbols.len(),
            config.iterations(),
            config.as_of
        );

        let mut run = BacktestRun::default();
        for symbol in &config.symbols {
            run.merge(self.run_symbol(config, symbol, source));
        }

        info!(
            "Backtest complete: {} records, {} skipped",
            run.records.len(),
            run.skipped.len()
        );

        Ok(run)
    }

    /// Run every configured symbol on its own blocking worker.
    ///
    /// Results are joined in symbol order. A worker that fails is logged and
    /// contributes nothing.
    pub async fn run_parallel(
        self: Arc<Self>,
        config: &BacktestConfig,
        source: Arc<dyn PriceSource>,
    ) -> Result<BacktestRun, BacktestError> {
        Self::validate(config)?;

        let handles: Vec<_> = config
            .symbols
            .iter()
            .map(|symbol| {
                let backtester = Arc::clone(&self);
                let source = Arc::clone(&source);
                let config = config.clone();
                let symbol = symbol.clone();
                tokio::task::spawn_blocking(move || {
                    backtester.run_symbol(&config, &symbol, source.as_ref())
                })
            })
            .collect();

        let mut run = BacktestRun::default();
        for (symbol, handle) in config.symbols.iter().zip(handles) {
            match handle.await {
                Ok(symbol_run) => run.merge(symbol_run),
                Err(e) => warn!("Backtest worker for {} failed: {}", symbol, e),
            }
        }

        info!(
            "Parallel backtest complete: {} records, {} skipped",
            run.records.len(),
            run.skipped.len()
        );

        Ok(run)
    }

    /// Walk backward from `as_of` for one symbol.
    pub fn run_symbol(
        &self,
        config: &BacktestConfig,
        symbol: &str,
        source: &dyn PriceSource,
    ) -> BacktestRun {
        let mut run = BacktestRun::default();
        for day in 0..config.iterations() {
            let current = config.as_of - Duration::days(day);
            self.run_iteration(config, symbol, current, source, &mut run);
        }

        debug!(
            "{}: {} records, {} skipped",
            symbol,
            run.records.len(),
            run.skipped.len()
        );
        run
    }

    fn run_iteration(
        &self,
        config: &BacktestConfig,
        symbol: &str,
        current: DateTime<Utc>,
        source: &dyn PriceSource,
        run: &mut BacktestRun,
    ) {
        let prediction_date = current.date_naive();
        let skip = |run: &mut BacktestRun, test_offset: Option<TestOffset>, reason: SkipReason| {
            debug!(
                "Skipping {} {} {}: {}",
                symbol,
                prediction_date,
                test_offset.map(|o| o.to_string()).unwrap_or_default(),
                reason
            );
            run.skipped.push(SkippedIteration {
                symbol: symbol.to_string(),
                prediction_date,
                test_offset,
                reason,
            });
        };

        let train_end = current - Duration::days(TRAINING_GAP_DAYS);
        let train_start = train_end - Duration::days(config.lookback_days);
        let boundary = config.retention_boundary();

        let mut required = vec![train_start, train_end];
        required.extend(
            TEST_OFFSETS
                .iter()
                .filter(|o| o.days() > 0)
                .map(|o| current - Duration::days(o.days())),
        );
        if required.iter().any(|instant| *instant < boundary) {
            skip(run, None, SkipReason::BeyondRetention);
            return;
        }

        let training = match source.fetch(symbol, train_start, train_end, config.interval) {
            Ok(series) if !series.is_empty() => series,
            Ok(_) => {
                skip(run, None, SkipReason::EmptyTrainingWindow);
                return;
            }
            Err(e) => {
                warn!("Training window fetch failed for {}: {}", symbol, e);
                skip(run, None, SkipReason::SourceUnavailable);
                return;
            }
        };

        let snapshot = self.engine.compute(&training);
        let confidence = self.scorer.score(snapshot.as_ref());
        let Some(prediction) = self.predictor.predict_from_window(&training, confidence) else {
            skip(run, None, SkipReason::NoPrediction);
            return;
        };

        for offset in TEST_OFFSETS {
            let test_start = current - Duration::days(offset.days());
            // Bars after `as_of` are never part of a test window
            let test_end = (test_start + Duration::days(1)).min(config.as_of);

            let extremes = if test_end <= test_start {
                None
            } else {
                match source.fetch(symbol, test_start, test_end, config.interval) {
                    Ok(series) => series.extremes(),
                    Err(e) => {
                        warn!("Test window fetch failed for {} {}: {}", symbol, offset, e);
                        None
                    }
                }
            };

            let Some((actual_low, actual_high, actual_close)) = extremes else {
                skip(run, Some(offset), SkipReason::EmptyTestWindow);
                continue;
            };

            run.records.push(BacktestRecord {
                symbol: symbol.to_string(),
                prediction_date,
                test_offset: offset,
                test_date: test_start.date_naive(),
                confidence_score: confidence,
                predicted_price: prediction.predicted_price,
                predicted_min: prediction.predicted_min,
                predicted_max: prediction.predicted_max,
                actual_low,
                actual_high,
                actual_close,
                touched_range: prediction.overlaps(actual_low, actual_high),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::historical::InMemoryPriceSource;
    use crate::types::{Interval, PriceBar};
    use chrono::TimeZone;

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 14, 10, 0, 0).unwrap()
    }

    /// Hourly bars spanning `days` before `as_of`, drifting upward.
    fn source_with_history(days: i64) -> InMemoryPriceSource {
        let start = as_of() - Duration::days(days);
        let bars: Vec<PriceBar> = (0..days * 24)
            .map(|i| {
                let close = 500.0 + i as f64 * 0.05;
                PriceBar {
                    timestamp: start + Duration::hours(i),
                    open: close,
                    high: close * 1.002,
                    low: close * 0.998,
                    close,
                    volume: 1_000.0,
                }
            })
            .collect();
        let source = InMemoryPriceSource::new();
        source
            .insert_bars("RELIANCE.NS", Interval::FiveMinute, bars)
            .unwrap();
        source
    }

    fn config() -> BacktestConfig {
        BacktestConfig::new(vec!["RELIANCE.NS".to_string()], as_of())
    }

    #[test]
    fn test_invalid_config_rejected() {
        let source = InMemoryPriceSource::new();
        let mut config = config();
        config.lookback_days = 0;
        assert!(matches!(
            WalkForwardBacktester::new().run(&config, &source),
            Err(BacktestError::InvalidConfig(_))
        ));

        let mut config = self::config();
        config.test_days = -1;
        assert!(WalkForwardBacktester::validate(&config).is_err());
    }

    #[test]
    fn test_iterations_and_offsets() {
        let source = source_with_history(59);
        let run = WalkForwardBacktester::new().run(&config(), &source).unwrap();

        // 12 simulated dates; D-0 of the first date lies in the future
        assert_eq!(run.records.len(), 12 * 4 - 1);
        assert_eq!(run.skipped.len(), 1);
        assert_eq!(run.skipped[0].reason, SkipReason::EmptyTestWindow);
        assert_eq!(run.skipped[0].test_offset, Some(TestOffset(0)));

        for record in &run.records {
            assert_eq!(
                record.prediction_date - record.test_date,
                Duration::days(record.test_offset.days())
            );
            assert!(record.predicted_min <= record.predicted_price);
            assert!(record.predicted_price <= record.predicted_max);
        }
    }

    #[test]
    fn test_bars_after_as_of_are_ignored() {
        let source = source_with_history(59);
        let future: Vec<PriceBar> = (0..5 * 24)
            .map(|i| PriceBar {
                timestamp: as_of() + Duration::hours(i),
                open: 9_999.0,
                high: 9_999.0,
                low: 9_999.0,
                close: 9_999.0,
                volume: 1_000.0,
            })
            .collect();
        let mut bars = source
            .fetch(
                "RELIANCE.NS",
                as_of() - Duration::days(59),
                as_of(),
                Interval::FiveMinute,
            )
            .unwrap()
            .bars()
            .to_vec();
        bars.extend(future);
        source
            .insert_bars("RELIANCE.NS", Interval::FiveMinute, bars)
            .unwrap();

        let run = WalkForwardBacktester::new().run(&config(), &source).unwrap();

        assert_eq!(run.records.len(), 12 * 4 - 1);
        assert!(run.records.iter().all(|r| r.actual_high < 9_999.0));
        assert_eq!(run.skipped.len(), 1);
        assert_eq!(run.skipped[0].reason, SkipReason::EmptyTestWindow);
        assert_eq!(run.skipped[0].test_offset, Some(TestOffset(0)));
    }

    #[test]
    fn test_training_precedes_test_days() {
        let source = source_with_history(59);
        let config = config();
        let run = WalkForwardBacktester::new().run(&config, &source).unwrap();
        for record in &run.records {
            let train_end = record.prediction_date - Duration::days(TRAINING_GAP_DAYS);
            assert!(train_end < record.test_date);
        }
    }

    #[test]
    fn test_empty_source_skips_every_iteration() {
        let source = InMemoryPriceSource::new();
        let run = WalkForwardBacktester::new().run(&config(), &source).unwrap();
        assert!(run.records.is_empty());
        assert_eq!(run.skipped.len(), 12);
        assert!(run
            .skipped
            .iter()
            .all(|s| s.reason == SkipReason::EmptyTrainingWindow));
    }
}
