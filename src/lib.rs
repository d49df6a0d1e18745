//! Rangecast - indicator-driven price range forecasting with walk-forward backtesting

pub mod config;
pub mod error;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
pub use services::{
    AccuracyEvaluator, AliasedSource, BacktestError, ConfidenceScorer, ForecastRun,
    ForecastStore, Forecaster, InMemoryPriceSource, IndicatorEngine, PriceSource,
    RangePredictor, ReportAggregator, SourceError, StoreError, WalkForwardBacktester,
};
pub use types::*;
