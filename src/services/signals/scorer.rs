//! Rule-based confidence scoring.

use crate::types::{ConfidenceScore, IndicatorSnapshot};

const MACD_ABOVE_SIGNAL_POINTS: f64 = 1.0;
const MACD_HISTOGRAM_POINTS: f64 = 1.0;
const EMA_CROSS_POINTS: f64 = 1.0;
const RSI_MID_BAND_POINTS: f64 = 0.5;
const RSI_OVERSOLD_POINTS: f64 = 1.0;
const ABOVE_BB_MIDDLE_POINTS: f64 = 0.5;
const VOLUME_SURGE_POINTS: f64 = 0.5;

const RSI_OVERSOLD: f64 = 30.0;
const RSI_OVERBOUGHT: f64 = 70.0;
const VOLUME_SURGE_RATIO: f64 = 1.2;

/// Maps an indicator snapshot to a bounded composite score.
///
/// Each check contributes zero or a fixed positive amount; an indicator
/// missing from the snapshot contributes zero. The sum saturates at 3.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfidenceScorer;

impl ConfidenceScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score a snapshot. An absent snapshot scores zero.
    pub fn score(&self, snapshot: Option<&IndicatorSnapshot>) -> ConfidenceScore {
        let Some(s) = snapshot else {
            return ConfidenceScore::ZERO;
        };

        let mut points = 0.0;

        if let (Some(macd), Some(signal)) = (s.macd, s.macd_signal) {
            if macd > signal {
                points += MACD_ABOVE_SIGNAL_POINTS;
            }
        }

        if matches!(s.macd_hist, Some(hist) if hist > 0.0) {
            points += MACD_HISTOGRAM_POINTS;
        }

        if let (Some(fast), Some(slow)) = (s.ema_fast, s.ema_slow) {
            if fast > slow {
                points += EMA_CROSS_POINTS;
            }
        }

        // Mid-band and oversold are mutually exclusive
        match s.rsi {
            Some(rsi) if rsi <= RSI_OVERSOLD => points += RSI_OVERSOLD_POINTS,
            Some(rsi) if rsi < RSI_OVERBOUGHT => points += RSI_MID_BAND_POINTS,
            _ => {}
        }

        if matches!(s.bb_middle, Some(middle) if s.close > middle) {
            points += ABOVE_BB_MIDDLE_POINTS;
        }

        if matches!(s.volume_ratio, Some(ratio) if ratio > VOLUME_SURGE_RATIO) {
            points += VOLUME_SURGE_POINTS;
        }

        ConfidenceScore::new(points)
    }
}
