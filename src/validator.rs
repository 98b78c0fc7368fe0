use crate::model::TickerSymbol;
use crate::provider::MarketData;
use tracing::debug;

/// True iff the provider returns fundamentals for `symbol`; the failure reason is discarded.
pub async fn is_valid(provider: &dyn MarketData, symbol: &TickerSymbol) -> bool {
    match provider.fetch_info(symbol).await {
        Ok(_) => true,
        Err(e) => {
            debug!("Ticker '{}' rejected: {}", symbol, e);
            false
        }
    }
}
