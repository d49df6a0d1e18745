use crate::types::{BacktestConfig, Interval};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

/// Symbols used when `RANGECAST_SYMBOLS` is unset.
pub const DEFAULT_SYMBOLS: &[&str] = &[
    "RELIANCE.NS",
    "TCS.NS",
    "HDFCBANK.NS",
    "INFY.NS",
    "ICICIBANK.NS",
    "HINDUNILVR.NS",
    "ITC.NS",
    "LT.NS",
    "SBIN.NS",
    "BHARTIARTL.NS",
    "BAJFINANCE.NS",
    "KOTAKBANK.NS",
    "ASIANPAINT.NS",
    "HCLTECH.NS",
    "MARUTI.NS",
    "AXISBANK.NS",
    "SUNPHARMA.NS",
    "TITAN.NS",
    "ULTRACEMCO.NS",
    "WIPRO.NS",
];

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Symbols to forecast and backtest.
    pub symbols: Vec<String>,
    /// Alternative tickers tried when a symbol has no data.
    pub aliases: HashMap<String, Vec<String>>,
    /// Directory of JSON price histories.
    pub data_dir: Option<PathBuf>,
    /// Directory for forecast and evaluation files.
    pub forecast_dir: Option<PathBuf>,
    pub lookback_days: i64,
    pub test_days: i64,
    pub max_history_days: i64,
    /// Bar interval fed to the indicator engine.
    pub interval: Interval,
    /// HIT tolerance in percent of the actual close.
    pub hit_tolerance_pct: f64,
    /// Forecasts kept per day.
    pub top_n: usize,
    /// The instant every cycle runs as of.
    pub as_of: DateTime<Utc>,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Format: "SYM1,SYM2,..."
        let symbols = lookup("RANGECAST_SYMBOLS")
            .map(|s| {
                s.split(',')
                    .map(|sym| sym.trim().to_uppercase())
                    .filter(|sym| !sym.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|symbols| !symbols.is_empty())
            .unwrap_or_else(|| DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect());

        // Format: "SYM|ALIAS1|ALIAS2,SYM2|ALIAS3"
        let aliases = lookup("RANGECAST_ALIASES")
            .map(|s| {
                s.split(',')
                    .filter_map(|entry| {
                        let parts: Vec<&str> = entry.split('|').map(str::trim).collect();
                        if parts.len() >= 2 && !parts[0].is_empty() {
                            Some((
                                parts[0].to_uppercase(),
                                parts[1..].iter().map(|a| a.to_string()).collect(),
                            ))
                        } else {
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            symbols,
            aliases,
            data_dir: lookup("DATA_DIR").map(PathBuf::from),
            forecast_dir: lookup("FORECAST_DIR").map(PathBuf::from),
            lookback_days: lookup("LOOKBACK_DAYS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            test_days: lookup("TEST_DAYS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
            max_history_days: lookup("MAX_HISTORY_DAYS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            interval: lookup("RANGECAST_INTERVAL")
                .and_then(|v| Interval::from_str(&v))
                .unwrap_or_default(),
            hit_tolerance_pct: lookup("HIT_TOLERANCE_PCT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(2.0),
            top_n: lookup("TOP_N")
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            as_of: lookup("AS_OF")
                .and_then(|v| DateTime::parse_from_rfc3339(&v).ok())
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(Utc::now),
        }
    }

    /// Backtest configuration derived from these settings.
    pub fn backtest_config(&self) -> BacktestConfig {
        BacktestConfig {
            lookback_days: self.lookback_days,
            test_days: self.test_days,
            max_history_days: self.max_history_days,
            interval: self.interval,
            ..BacktestConfig::new(self.symbols.clone(), self.as_of)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.symbols.len(), DEFAULT_SYMBOLS.len());
        assert!(config.aliases.is_empty());
        assert_eq!(config.lookback_days, 30);
        assert_eq!(config.test_days, 15);
        assert_eq!(config.max_history_days, 60);
        assert_eq!(config.hit_tolerance_pct, 2.0);
        assert_eq!(config.top_n, 5);
        assert_eq!(config.interval, Interval::FiveMinute);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_parses_values() {
        let config = Config::from_lookup(lookup(&[
            ("RANGECAST_SYMBOLS", "tcs.ns, infy.ns,,"),
            ("RANGECAST_ALIASES", "TCS.NS|TCS|TCS.BO,bad"),
            ("LOOKBACK_DAYS", "20"),
            ("TEST_DAYS", "not-a-number"),
            ("AS_OF", "2024-06-14T10:00:00+05:30"),
            ("DATA_DIR", "/tmp/history"),
            ("RANGECAST_INTERVAL", "1D"),
        ]));

        assert_eq!(config.symbols, vec!["TCS.NS".to_string(), "INFY.NS".to_string()]);
        assert_eq!(
            config.aliases.get("TCS.NS"),
            Some(&vec!["TCS".to_string(), "TCS.BO".to_string()])
        );
        assert_eq!(config.aliases.len(), 1);
        assert_eq!(config.lookback_days, 20);
        assert_eq!(config.test_days, 15);
        assert_eq!(config.as_of.to_rfc3339(), "2024-06-14T04:30:00+00:00");
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/history")));

        let backtest = config.backtest_config();
        assert_eq!(backtest.lookback_days, 20);
        assert_eq!(backtest.symbols.len(), 2);
        assert_eq!(backtest.as_of, config.as_of);
        assert_eq!(backtest.interval, Interval::Daily);
    }
}
