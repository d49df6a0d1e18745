//! Indicator snapshot computation.

use super::indicators::{BollingerBands, Macd, Rsi, VolumeRatio};
use super::Indicator;
use crate::types::{IndicatorSnapshot, PriceSeries};
use tracing::debug;

/// Computes the fixed indicator set for the last bar of a price window.
///
/// Pure function of its input: the series is only read.
#[derive(Default)]
pub struct IndicatorEngine {
    macd: Macd,
    rsi: Rsi,
    bollinger: BollingerBands,
    volume: VolumeRatio,
}

impl IndicatorEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot for the last bar of `series`.
    ///
    /// Returns None for an empty series or one containing non-finite closes;
    /// callers treat that as "no signal". Indicators needing more bars than
    /// the series holds are left unset.
    pub fn compute(&self, series: &PriceSeries) -> Option<IndicatorSnapshot> {
        let bars = series.bars();
        let last = bars.last()?;

        if bars.iter().any(|b| !b.close.is_finite()) {
            debug!("Non-finite close in {} window, no snapshot", series.symbol());
            return None;
        }

        if bars.len() < self.macd.warmup_periods() {
            debug!(
                "{} window has {} bars (< {}), MACD values are warm-up noise",
                series.symbol(),
                bars.len(),
                self.macd.warmup_periods()
            );
        }

        let unset = self.unset_indicators(bars.len());
        if !unset.is_empty() {
            debug!(
                "{} window has {} bars, unset: {}",
                series.symbol(),
                bars.len(),
                unset.join(", ")
            );
        }

        let macd = self.macd.calculate(bars);
        let bands = self.bollinger.calculate(bars);
        let volume = self.volume.calculate(bars);

        Some(IndicatorSnapshot {
            timestamp: last.timestamp,
            close: last.close,
            volume: last.volume,
            ema_fast: macd.map(|m| m.ema_fast),
            ema_slow: macd.map(|m| m.ema_slow),
            macd: macd.map(|m| m.macd),
            macd_signal: macd.map(|m| m.signal),
            macd_hist: macd.map(|m| m.histogram),
            rsi: self.rsi.calculate(bars),
            bb_middle: bands.map(|b| b.middle),
            bb_upper: bands.map(|b| b.upper),
            bb_lower: bands.map(|b| b.lower),
            volume_ma: volume.map(|v| v.average),
            volume_ratio: volume.and_then(|v| v.ratio),
        })
    }

    /// Ids of the windowed indicators that `len` bars cannot define.
    pub fn unset_indicators(&self, len: usize) -> Vec<&str> {
        [
            (self.rsi.id(), self.rsi.min_periods()),
            (self.bollinger.id(), self.bollinger.min_periods()),
            (self.volume.id(), self.volume.min_periods()),
        ]
        .into_iter()
        .filter(|(_, min_periods)| len < *min_periods)
        .map(|(id, _)| id)
        .collect()
    }
}
