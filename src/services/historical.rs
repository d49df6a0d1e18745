//! Historical price retrieval.
//!
//! The market-data source is a collaborator behind the [`PriceSource`] trait.
//! A fetch returns either a populated series or an explicit empty one; the
//! forecasting core tolerates any number of empty results.

use crate::types::{Interval, PriceBar, PriceSeries, SeriesError};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Price source errors.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{symbol} history is only available at {available}, not {requested}")]
    UnsupportedInterval {
        symbol: String,
        available: Interval,
        requested: Interval,
    },
    #[error("Price source unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Series(#[from] SeriesError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] serde_json::Error),
}

/// A market-data collaborator.
pub trait PriceSource: Send + Sync {
    /// Bars for `symbol` with `start <= timestamp < end` at `interval`.
    /// An empty series means "no data"; it is not an error.
    fn fetch(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: Interval,
    ) -> Result<PriceSeries, SourceError>;
}

impl<S: PriceSource + ?Sized> PriceSource for Arc<S> {
    fn fetch(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: Interval,
    ) -> Result<PriceSeries, SourceError> {
        (**self).fetch(symbol, start, end, interval)
    }
}

/// On-disk layout of one symbol's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryFile {
    pub symbol: String,
    #[serde(default)]
    pub interval: Interval,
    pub bars: Vec<PriceBar>,
}

/// Full histories held in memory; windows are sliced on request.
#[derive(Default)]
pub struct InMemoryPriceSource {
    /// Histories keyed by uppercase symbol.
    series: DashMap<String, PriceSeries>,
}

impl InMemoryPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) the full history of a symbol.
    pub fn insert(&self, series: PriceSeries) {
        debug!("Stored {} bars for {}", series.len(), series.symbol());
        self.series.insert(series.symbol().to_uppercase(), series);
    }

    /// Build a series from unsorted bars and store it.
    pub fn insert_bars(
        &self,
        symbol: &str,
        interval: Interval,
        mut bars: Vec<PriceBar>,
    ) -> Result<(), SourceError> {
        bars.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        let series = PriceSeries::new(symbol, interval, bars)?;
        self.insert(series);
        Ok(())
    }

    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.series.iter().map(|e| e.key().clone()).collect();
        symbols.sort();
        symbols
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Load every `*.json` [`HistoryFile`] in `dir`.
    ///
    /// Unreadable or invalid files are logged and skipped.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, SourceError> {
        let source = Self::new();

        for entry in fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let content = match fs::read_to_string(&path) {
                Ok(c) => c,
                Err(e) => {
                    warn!("Failed to read {}: {}", path.display(), e);
                    continue;
                }
            };

            let file: HistoryFile = match serde_json::from_str(&content) {
                Ok(f) => f,
                Err(e) => {
                    warn!("Failed to parse {}: {}", path.display(), e);
                    continue;
                }
            };

            if let Err(e) = source.insert_bars(&file.symbol, file.interval, file.bars) {
                warn!("Rejected history in {}: {}", path.display(), e);
            }
        }

        info!("Loaded price history for {} symbols", source.len());
        Ok(source)
    }
}

impl PriceSource for InMemoryPriceSource {
    fn fetch(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: Interval,
    ) -> Result<PriceSeries, SourceError> {
        let Some(stored) = self.series.get(&symbol.to_uppercase()) else {
            return Ok(PriceSeries::empty(symbol, interval));
        };

        match (stored.interval(), interval) {
            (available, requested) if available == requested => Ok(stored.window(start, end)),
            (Interval::FiveMinute, Interval::Daily) => Ok(stored.window(start, end).to_daily()),
            (available, requested) => Err(SourceError::UnsupportedInterval {
                symbol: symbol.to_string(),
                available,
                requested,
            }),
        }
    }
}

/// Resolves a symbol through its configured aliases.
///
/// Returns the first non-empty series among the symbol itself and its aliases,
/// relabeled with the requested symbol.
pub struct AliasedSource<S> {
    inner: S,
    aliases: HashMap<String, Vec<String>>,
}

impl<S: PriceSource> AliasedSource<S> {
    pub fn new(inner: S, aliases: HashMap<String, Vec<String>>) -> Self {
        let aliases = aliases
            .into_iter()
            .map(|(k, v)| (k.to_uppercase(), v))
            .collect();
        Self { inner, aliases }
    }

    fn candidates<'a>(&'a self, symbol: &'a str) -> Vec<&'a str> {
        let mut candidates = vec![symbol];
        if let Some(aliases) = self.aliases.get(&symbol.to_uppercase()) {
            candidates.extend(aliases.iter().map(String::as_str));
        }
        candidates
    }
}

impl<S: PriceSource> PriceSource for AliasedSource<S> {
    fn fetch(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: Interval,
    ) -> Result<PriceSeries, SourceError> {
        let mut last_error = None;
        let mut saw_empty = false;

        for candidate in self.candidates(symbol) {
            match self.inner.fetch(candidate, start, end, interval) {
                Ok(series) if !series.is_empty() => {
                    if candidate != symbol {
                        debug!("Resolved {} via alias {}", symbol, candidate);
                    }
                    return Ok(series.with_symbol(symbol));
                }
                Ok(_) => saw_empty = true,
                Err(e) => {
                    debug!("Alias {} for {} failed: {}", candidate, symbol, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !saw_empty => Err(e),
            _ => Ok(PriceSeries::empty(symbol, interval)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn bars(start: DateTime<Utc>, count: usize) -> Vec<PriceBar> {
        (0..count)
            .map(|i| {
                let close = 100.0 + i as f64;
                PriceBar {
                    timestamp: start + Duration::minutes(5 * i as i64),
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 10.0,
                }
            })
            .collect()
    }

    #[test]
    fn test_unknown_symbol_is_empty() {
        let source = InMemoryPriceSource::new();
        let now = Utc::now();
        let series = source
            .fetch("NOPE", now - Duration::days(1), now, Interval::FiveMinute)
            .unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_fetch_windows_and_aggregates() {
        let start = Utc.with_ymd_and_hms(2024, 5, 6, 3, 45, 0).unwrap();
        let source = InMemoryPriceSource::new();
        source
            .insert_bars("tcs.ns", Interval::FiveMinute, bars(start, 10))
            .unwrap();

        let window = source
            .fetch("TCS.NS", start, start + Duration::minutes(25), Interval::FiveMinute)
            .unwrap();
        assert_eq!(window.len(), 5);

        let daily = source
            .fetch("TCS.NS", start, start + Duration::days(1), Interval::Daily)
            .unwrap();
        assert_eq!(daily.len(), 1);
        assert_eq!(daily.bars()[0].close, 109.0);
    }

    #[test]
    fn test_daily_history_cannot_serve_intraday() {
        let start = Utc.with_ymd_and_hms(2024, 5, 6, 0, 0, 0).unwrap();
        let source = InMemoryPriceSource::new();
        source.insert_bars("TCS", Interval::Daily, bars(start, 3)).unwrap();
        let result = source.fetch("TCS", start, start + Duration::days(1), Interval::FiveMinute);
        assert!(matches!(result, Err(SourceError::UnsupportedInterval { .. })));
    }

    #[test]
    fn test_alias_resolution_returns_first_non_empty() {
        let start = Utc.with_ymd_and_hms(2024, 5, 6, 3, 45, 0).unwrap();
        let inner = InMemoryPriceSource::new();
        inner
            .insert_bars("HDFCBANK.BO", Interval::FiveMinute, bars(start, 4))
            .unwrap();

        let mut aliases = HashMap::new();
        aliases.insert(
            "hdfcbank.ns".to_string(),
            vec!["HDFCBANK".to_string(), "HDFCBANK.BO".to_string()],
        );
        let source = AliasedSource::new(inner, aliases);

        let series = source
            .fetch("HDFCBANK.NS", start, start + Duration::hours(1), Interval::FiveMinute)
            .unwrap();
        assert_eq!(series.len(), 4);
        assert_eq!(series.symbol(), "HDFCBANK.NS");

        let missing = source
            .fetch("WIPRO.NS", start, start + Duration::hours(1), Interval::FiveMinute)
            .unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn test_load_dir_reads_history_files() {
        let dir = std::env::temp_dir().join(format!("rangecast-history-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let start = Utc.with_ymd_and_hms(2024, 5, 6, 3, 45, 0).unwrap();
        let mut shuffled = bars(start, 6);
        shuffled.reverse();
        let file = HistoryFile {
            symbol: "INFY.NS".to_string(),
            interval: Interval::FiveMinute,
            bars: shuffled,
        };
        fs::write(dir.join("infy.json"), serde_json::to_string(&file).unwrap()).unwrap();
        fs::write(dir.join("broken.json"), "{not json").unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let source = InMemoryPriceSource::load_dir(&dir).unwrap();
        assert_eq!(source.symbols(), vec!["INFY.NS".to_string()]);

        fs::remove_dir_all(&dir).unwrap();
    }
}
