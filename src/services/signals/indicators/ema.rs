//! Exponential Moving Average (EMA) indicator.

/// EMA (Exponential Moving Average) indicator.
///
/// Smoothing factor `alpha = 2 / (span + 1)`, bias-adjusted: every value is
/// the decay-weighted mean of all observations so far, normalized by the sum
/// of the weights. The average is therefore defined from the first bar on,
/// with noisy leading values until roughly `span` bars have been seen.
pub struct Ema;

impl Ema {
    /// Bias-adjusted EMA of every prefix of `values`.
    pub fn series(values: &[f64], span: usize) -> Vec<f64> {
        let alpha = 2.0 / (span as f64 + 1.0);
        let decay = 1.0 - alpha;

        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;
        values
            .iter()
            .map(|value| {
                weighted_sum = value + decay * weighted_sum;
                weight_total = 1.0 + decay * weight_total;
                weighted_sum / weight_total
            })
            .collect()
    }
}
