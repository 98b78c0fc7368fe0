use crate::model::{PriceHistory, ProviderError, TickerInfo, TickerSymbol};

/// Source of market data. Every call goes to the provider; nothing is cached.
#[async_trait::async_trait]
pub trait MarketData: Send + Sync {
    /// Fundamentals snapshot for `symbol`.
    async fn fetch_info(&self, symbol: &TickerSymbol) -> Result<TickerInfo, ProviderError>;

    /// Entire available daily history for `symbol`.
    async fn fetch_history(&self, symbol: &TickerSymbol) -> Result<PriceHistory, ProviderError>;
}
