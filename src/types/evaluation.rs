use super::{ConfidenceScore, ConfidenceTier, Metric};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A ranked forecast issued for one symbol on one day.
///
/// Flat, field-keyed record; numeric fields are a number or `"-"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub rank: u32,
    pub symbol: String,
    pub date: NaiveDate,
    pub confidence_score: ConfidenceScore,
    pub current_close: Metric,
    pub predicted_min: Metric,
    pub predicted_close: Metric,
    pub predicted_max: Metric,
    #[serde(default)]
    pub recommendation: Recommendation,
    #[serde(default)]
    pub reason: String,
}

/// Trading stance attached to a forecast, derived from its confidence tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Buy,
    #[default]
    Hold,
    Sell,
}

impl Recommendation {
    pub fn from_score(score: ConfidenceScore) -> Self {
        match score.tier() {
            ConfidenceTier::High | ConfidenceTier::Moderate => Self::Buy,
            ConfidenceTier::Low => Self::Hold,
            ConfidenceTier::Weak => Self::Sell,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Self::Buy => "Strong technical indicators",
            Self::Hold => "Mixed signals, maintain current position",
            Self::Sell => "Weak technical indicators",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Hold => "HOLD",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of comparing a forecast close with the realized close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationResult {
    Hit,
    Miss,
    NoData,
    Error,
}

impl EvaluationResult {
    /// Whether the outcome counts toward a hit rate.
    pub fn is_decisive(&self) -> bool {
        matches!(self, Self::Hit | Self::Miss)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
            Self::NoData => "NO_DATA",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for EvaluationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// End-of-day result for one forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub rank: u32,
    pub symbol: String,
    pub date: NaiveDate,
    pub confidence_score: ConfidenceScore,
    pub predicted_close: Metric,
    #[serde(default)]
    pub recommendation: Recommendation,
    #[serde(default)]
    pub reason: String,
    pub actual_open: Metric,
    pub actual_close: Metric,
    pub actual_high: Metric,
    pub actual_low: Metric,
    pub result: EvaluationResult,
}

/// Tallies of an evaluation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationSummary {
    pub total: u32,
    pub hits: u32,
    pub misses: u32,
    pub no_data: u32,
    pub errors: u32,
    /// hits / (hits + misses) * 100, or 0 with no decisive outcomes.
    pub success_rate_pct: f64,
}

impl EvaluationSummary {
    pub fn from_records(records: &[EvaluationRecord]) -> Self {
        let mut summary = Self::default();
        for record in records {
            summary.total += 1;
            match record.result {
                EvaluationResult::Hit => summary.hits += 1,
                EvaluationResult::Miss => summary.misses += 1,
                EvaluationResult::NoData => summary.no_data += 1,
                EvaluationResult::Error => summary.errors += 1,
            }
        }
        let decisive = summary.hits + summary.misses;
        if decisive > 0 {
            summary.success_rate_pct = summary.hits as f64 / decisive as f64 * 100.0;
        }
        summary
    }
}
