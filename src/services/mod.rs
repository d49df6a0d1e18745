pub mod backtester;
pub mod historical;
pub mod report;
pub mod signals;

pub use backtester::{BacktestError, WalkForwardBacktester};
pub use historical::{AliasedSource, InMemoryPriceSource, PriceSource, SourceError};
pub use report::ReportAggregator;
pub use signals::{
    AccuracyEvaluator, ConfidenceScorer, ForecastRun, ForecastStore, Forecaster,
    IndicatorEngine, RangePredictor, StoreError,
};
