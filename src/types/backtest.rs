use super::{ConfidenceScore, Interval};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Days between the end of a training window and the simulated prediction date.
/// The earliest test offset (3 days ahead) still falls after the training data.
pub const TRAINING_GAP_DAYS: i64 = 4;

/// Test offsets checked for every simulated date, in evaluation order.
pub const TEST_OFFSETS: [TestOffset; 4] = [
    TestOffset(3),
    TestOffset(2),
    TestOffset(1),
    TestOffset(0),
];

/// Configuration for a walk-forward backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestConfig {
    /// Symbols to test
    pub symbols: Vec<String>,
    /// Length of each training window in days
    pub lookback_days: i64,
    /// Number of days to walk back from `as_of`
    pub test_days: i64,
    /// Oldest history the price source retains, in days before `as_of`
    pub max_history_days: i64,
    /// Bar interval fed to the indicator engine
    pub interval: Interval,
    /// The simulated "present"
    pub as_of: DateTime<Utc>,
}

impl BacktestConfig {
    /// Create a new backtest config with defaults.
    pub fn new(symbols: Vec<String>, as_of: DateTime<Utc>) -> Self {
        Self {
            symbols,
            lookback_days: 30,
            test_days: 15,
            max_history_days: 60, // 5-minute history horizon
            interval: Interval::FiveMinute,
            as_of,
        }
    }

    /// Oldest instant a window may start at.
    pub fn retention_boundary(&self) -> DateTime<Utc> {
        self.as_of - chrono::Duration::days(self.max_history_days)
    }

    /// Number of simulated prediction dates per symbol.
    pub fn iterations(&self) -> i64 {
        (self.test_days - 3).max(0)
    }
}

/// How many days after the simulated date a prediction is judged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestOffset(pub u8);

impl TestOffset {
    pub fn days(&self) -> i64 {
        self.0 as i64
    }
}

impl fmt::Display for TestOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D-{}", self.0)
    }
}

/// One judged prediction: (symbol, prediction date, test offset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRecord {
    pub symbol: String,
    pub prediction_date: NaiveDate,
    pub test_offset: TestOffset,
    pub test_date: NaiveDate,
    pub confidence_score: ConfidenceScore,
    pub predicted_price: f64,
    pub predicted_min: f64,
    pub predicted_max: f64,
    pub actual_low: f64,
    pub actual_high: f64,
    pub actual_close: f64,
    pub touched_range: bool,
}

/// Why a backtest iteration produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The training window or a test day starts before the retention boundary.
    BeyondRetention,
    /// The training window had no bars.
    EmptyTrainingWindow,
    /// The price source failed for the training window.
    SourceUnavailable,
    /// No prediction could be derived from the training window.
    NoPrediction,
    /// The test day had no bars.
    EmptyTestWindow,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SkipReason::BeyondRetention => "beyond retention",
            SkipReason::EmptyTrainingWindow => "empty training window",
            SkipReason::SourceUnavailable => "source unavailable",
            SkipReason::NoPrediction => "no prediction",
            SkipReason::EmptyTestWindow => "empty test window",
        };
        f.write_str(label)
    }
}

/// A skipped candidate iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedIteration {
    pub symbol: String,
    pub prediction_date: NaiveDate,
    /// Set when only a single test day was skipped.
    pub test_offset: Option<TestOffset>,
    pub reason: SkipReason,
}

/// Output of a backtest run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BacktestRun {
    pub records: Vec<BacktestRecord>,
    pub skipped: Vec<SkippedIteration>,
}

impl BacktestRun {
    pub fn merge(&mut self, other: BacktestRun) {
        self.records.extend(other.records);
        self.skipped.extend(other.skipped);
    }
}
