use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Sampling interval of a price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    /// Intraday 5-minute bars.
    #[default]
    #[serde(rename = "5m")]
    FiveMinute,
    /// One bar per trading day.
    #[serde(rename = "1d")]
    Daily,
}

impl Interval {
    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "5m" | "5min" | "five_minute" => Some(Self::FiveMinute),
            "1d" | "day" | "daily" => Some(Self::Daily),
            _ => None,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interval::FiveMinute => write!(f, "5m"),
            Interval::Daily => write!(f, "1d"),
        }
    }
}

/// One OHLCV sample for a fixed time interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Errors raised when building a [`PriceSeries`].
#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("Bars for {symbol} are out of order at {timestamp}")]
    OutOfOrder {
        symbol: String,
        timestamp: DateTime<Utc>,
    },
    #[error("Duplicate bar for {symbol} at {timestamp}")]
    DuplicateTimestamp {
        symbol: String,
        timestamp: DateTime<Utc>,
    },
}

/// Chronologically ordered bars for one symbol.
///
/// Timestamps are strictly increasing. Windows and aggregations produce new
/// series; a series is never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    symbol: String,
    interval: Interval,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series, rejecting out-of-order or duplicate timestamps.
    pub fn new(
        symbol: impl Into<String>,
        interval: Interval,
        bars: Vec<PriceBar>,
    ) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        for pair in bars.windows(2) {
            if pair[1].timestamp == pair[0].timestamp {
                return Err(SeriesError::DuplicateTimestamp {
                    symbol,
                    timestamp: pair[1].timestamp,
                });
            }
            if pair[1].timestamp < pair[0].timestamp {
                return Err(SeriesError::OutOfOrder {
                    symbol,
                    timestamp: pair[1].timestamp,
                });
            }
        }
        Ok(Self {
            symbol,
            interval,
            bars,
        })
    }

    /// An explicit "no data" result.
    pub fn empty(symbol: impl Into<String>, interval: Interval) -> Self {
        Self {
            symbol: symbol.into(),
            interval,
            bars: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&PriceBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Bars with `start <= timestamp < end`.
    pub fn window(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> PriceSeries {
        let from = self.bars.partition_point(|b| b.timestamp < start);
        let to = self.bars.partition_point(|b| b.timestamp < end);
        let bars = if from < to {
            self.bars[from..to].to_vec()
        } else {
            Vec::new()
        };
        Self {
            symbol: self.symbol.clone(),
            interval: self.interval,
            bars,
        }
    }

    /// Relabel the series under another symbol (used when an alias resolved it).
    pub fn with_symbol(self, symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..self
        }
    }

    /// Collapse intraday bars into one bar per UTC calendar day.
    pub fn to_daily(&self) -> PriceSeries {
        if self.interval == Interval::Daily {
            return self.clone();
        }

        let mut days: Vec<PriceBar> = Vec::new();
        let mut current_day: Option<NaiveDate> = None;

        for bar in &self.bars {
            let day = bar.timestamp.date_naive();
            match days.last_mut() {
                Some(last) if current_day == Some(day) => {
                    last.high = last.high.max(bar.high);
                    last.low = last.low.min(bar.low);
                    last.close = bar.close;
                    last.volume += bar.volume;
                }
                _ => {
                    let Some(midnight) = day.and_hms_opt(0, 0, 0) else {
                        continue;
                    };
                    days.push(PriceBar {
                        timestamp: midnight.and_utc(),
                        ..*bar
                    });
                    current_day = Some(day);
                }
            }
        }

        Self {
            symbol: self.symbol.clone(),
            interval: Interval::Daily,
            bars: days,
        }
    }

    /// Realized extremes of the series: (low, high, last close).
    pub fn extremes(&self) -> Option<(f64, f64, f64)> {
        let last = self.bars.last()?;
        let low = self.bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let high = self
            .bars
            .iter()
            .map(|b| b.high)
            .fold(f64::NEG_INFINITY, f64::max);
        Some((low, high, last.close))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn bar(minutes: i64, close: f64) -> PriceBar {
        PriceBar {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 4, 9, 15, 0).unwrap()
                + Duration::minutes(minutes),
            open: close - 0.5,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 100.0,
        }
    }

    #[test]
    fn test_series_rejects_duplicates() {
        let result = PriceSeries::new("TCS", Interval::FiveMinute, vec![bar(0, 1.0), bar(0, 2.0)]);
        assert!(matches!(result, Err(SeriesError::DuplicateTimestamp { .. })));
    }

    #[test]
    fn test_series_rejects_out_of_order() {
        let result = PriceSeries::new("TCS", Interval::FiveMinute, vec![bar(5, 1.0), bar(0, 2.0)]);
        assert!(matches!(result, Err(SeriesError::OutOfOrder { .. })));
    }

    #[test]
    fn test_window_is_half_open() {
        let series = PriceSeries::new(
            "TCS",
            Interval::FiveMinute,
            (0..6).map(|i| bar(i * 5, 100.0 + i as f64)).collect(),
        )
        .unwrap();
        let start = series.bars()[1].timestamp;
        let end = series.bars()[4].timestamp;
        let window = series.window(start, end);
        assert_eq!(window.len(), 3);
        assert_eq!(window.first().unwrap().close, 101.0);
        assert_eq!(window.last().unwrap().close, 103.0);
        assert!(series.window(end, start).is_empty());
    }

    #[test]
    fn test_to_daily_aggregates_bars() {
        let mut bars: Vec<PriceBar> = (0..3).map(|i| bar(i * 5, 100.0 + i as f64)).collect();
        bars.push(bar(24 * 60, 90.0));
        let series = PriceSeries::new("TCS", Interval::FiveMinute, bars).unwrap();
        let daily = series.to_daily();

        assert_eq!(daily.interval(), Interval::Daily);
        assert_eq!(daily.len(), 2);
        let first = daily.bars()[0];
        assert_eq!(first.open, 99.5);
        assert_eq!(first.close, 102.0);
        assert_eq!(first.high, 103.0);
        assert_eq!(first.low, 99.0);
        assert_eq!(first.volume, 300.0);
    }

    #[test]
    fn test_extremes() {
        let series = PriceSeries::new(
            "TCS",
            Interval::FiveMinute,
            vec![bar(0, 100.0), bar(5, 104.0), bar(10, 102.0)],
        )
        .unwrap();
        assert_eq!(series.extremes(), Some((99.0, 105.0, 102.0)));
        assert_eq!(PriceSeries::empty("TCS", Interval::Daily).extremes(), None);
    }
}
