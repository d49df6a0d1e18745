use super::EvaluationSummary;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Success counts for one group of records.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupStats {
    pub count: u32,
    pub successes: u32,
    /// successes / count, 0 for an empty group.
    pub rate: f64,
}

impl GroupStats {
    /// Record one decisive outcome.
    pub fn record(&mut self, success: bool) {
        self.count += 1;
        if success {
            self.successes += 1;
        }
        self.recalculate_rate();
    }

    fn recalculate_rate(&mut self) {
        self.rate = if self.count > 0 {
            self.successes as f64 / self.count as f64
        } else {
            0.0
        };
    }
}

/// A flat table keyed by group label.
pub type GroupTable = BTreeMap<String, GroupStats>;

/// Aggregated metrics for a backtest run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestReport {
    pub overall: GroupStats,
    /// Keyed by the exact score, e.g. `"2.5"`.
    pub by_confidence: GroupTable,
    pub by_tier: GroupTable,
    pub by_offset: GroupTable,
    pub by_symbol: GroupTable,
    pub skipped_iterations: u32,
}

/// Aggregated metrics for evaluation cycles.
///
/// Grouped rates count decisive outcomes (HIT or MISS) only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    pub summary: EvaluationSummary,
    pub overall: GroupStats,
    pub by_tier: GroupTable,
    pub by_symbol: GroupTable,
}
