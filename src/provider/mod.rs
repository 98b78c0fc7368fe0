pub mod traits;
pub mod yahoo;

#[cfg(test)]
pub mod fixture;

pub use traits::MarketData;
pub use yahoo::YahooClient;
