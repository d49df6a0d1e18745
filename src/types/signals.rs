use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Sentinel written in place of a numeric field that could not be determined.
pub const MISSING_SENTINEL: &str = "-";

/// A numeric field that may be undeterminable.
///
/// Serializes as a JSON number, or as the `"-"` sentinel when missing. Text
/// that is neither a number nor the sentinel is kept as `Invalid` so that
/// evaluation can classify it as an error instead of silently dropping it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Metric {
    Value(f64),
    #[default]
    Missing,
    Invalid(String),
}

impl Metric {
    /// Wrap an optional value; non-finite numbers become `Missing`.
    pub fn from_option(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => Metric::Value(v),
            _ => Metric::Missing,
        }
    }

    /// Parse a textual field the way stored records write them.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == MISSING_SENTINEL {
            return Metric::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(v) => Metric::Value(v),
            Err(_) => Metric::Invalid(raw.to_string()),
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Metric::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Metric::Missing)
    }
}

impl From<f64> for Metric {
    fn from(value: f64) -> Self {
        Metric::from_option(Some(value))
    }
}

impl From<Option<f64>> for Metric {
    fn from(value: Option<f64>) -> Self {
        Metric::from_option(value)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Value(v) => write!(f, "{:.2}", v),
            Metric::Missing => write!(f, "{}", MISSING_SENTINEL),
            Metric::Invalid(raw) => write!(f, "{}", raw),
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Metric::Value(v) if v.is_finite() => serializer.serialize_f64(*v),
            Metric::Value(_) | Metric::Missing => serializer.serialize_str(MISSING_SENTINEL),
            Metric::Invalid(raw) => serializer.serialize_str(raw),
        }
    }
}

impl<'de> Deserialize<'de> for Metric {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MetricVisitor;

        impl<'de> Visitor<'de> for MetricVisitor {
            type Value = Metric;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a number or the \"-\" sentinel")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Metric, E> {
                Ok(Metric::from(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Metric, E> {
                Ok(Metric::Value(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Metric, E> {
                Ok(Metric::Value(v as f64))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Metric, E> {
                Ok(Metric::parse(v))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Metric, E> {
                Ok(Metric::Missing)
            }

            fn visit_none<E: de::Error>(self) -> Result<Metric, E> {
                Ok(Metric::Missing)
            }
        }

        deserializer.deserialize_any(MetricVisitor)
    }
}

/// Indicator values attached to the last bar of a price window.
///
/// Each field is `None` when the window was too short to define it. Missing
/// values are never substituted with zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub volume: f64,
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub rsi: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
    pub volume_ma: Option<f64>,
    pub volume_ratio: Option<f64>,
}

/// Upper bound of the composite confidence score.
pub const MAX_CONFIDENCE: f64 = 3.0;

/// Composite confidence score in the closed range [0, 3]. Not a probability.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[serde(transparent)]
pub struct ConfidenceScore(f64);

// Stored scores go through the same clamp as computed ones.
impl<'de> Deserialize<'de> for ConfidenceScore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f64::deserialize(deserializer).map(Self::new)
    }
}

impl ConfidenceScore {
    pub const ZERO: ConfidenceScore = ConfidenceScore(0.0);

    /// Create a score, clamping into [0, 3]. NaN maps to zero.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self(value.clamp(0.0, MAX_CONFIDENCE))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn tier(&self) -> ConfidenceTier {
        ConfidenceTier::from_score(*self)
    }
}

impl fmt::Display for ConfidenceScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bands of the confidence score that select a prediction profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    /// score < 0.5
    Weak,
    /// 0.5 <= score < 1.5
    Low,
    /// 1.5 <= score < 2.5
    Moderate,
    /// score >= 2.5
    High,
}

impl ConfidenceTier {
    pub fn from_score(score: ConfidenceScore) -> Self {
        match score.value() {
            s if s >= 2.5 => Self::High,
            s if s >= 1.5 => Self::Moderate,
            s if s >= 0.5 => Self::Low,
            _ => Self::Weak,
        }
    }

    /// Base (min, max, mid) fractional change for this tier.
    pub fn base_changes(&self) -> (f64, f64, f64) {
        match self {
            Self::High => (0.01, 0.03, 0.02),
            Self::Moderate => (0.005, 0.02, 0.0125),
            Self::Low => (-0.005, 0.015, 0.005),
            Self::Weak => (-0.02, 0.01, -0.005),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Moderate => "moderate",
            Self::Low => "low",
            Self::Weak => "weak",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Predicted price band. Always satisfies `min <= price <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePrediction {
    pub predicted_min: f64,
    pub predicted_price: f64,
    pub predicted_max: f64,
}

impl PricePrediction {
    /// Whether the predicted band intersects the realized `[low, high]` interval.
    pub fn overlaps(&self, actual_low: f64, actual_high: f64) -> bool {
        actual_low <= self.predicted_max && actual_high >= self.predicted_min
    }
}
