// Analyzer module: the numeric work behind the reports.

pub mod histogram;
pub mod indicators;
pub mod returns;

pub use histogram::Histogram;
pub use indicators::simple_moving_average;
pub use returns::RiskReturn;
