//! Technical indicator implementations.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod volatility;
pub mod volume;

pub use bollinger::{BollingerBands, BollingerOutput};
pub use ema::Ema;
pub use macd::{Macd, MacdOutput};
pub use rsi::Rsi;
pub use sma::trailing_mean;
pub use volatility::ReturnVolatility;
pub use volume::{VolumeOutput, VolumeRatio};
