pub mod backtest;
pub mod evaluation;
pub mod price;
pub mod report;
pub mod signals;

pub use backtest::*;
pub use evaluation::*;
pub use price::*;
pub use report::*;
pub use signals::*;
