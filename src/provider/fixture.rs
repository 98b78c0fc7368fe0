// In-memory provider for tests
use crate::model::*;
use crate::provider::MarketData;

use chrono::{Days, NaiveDate};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub struct FixtureProvider {
    info: Option<TickerInfo>,
    history: Option<PriceHistory>,
    pub info_calls: AtomicUsize,
    pub history_calls: AtomicUsize,
}

impl FixtureProvider {
    /// Every fetch fails, like an unknown symbol.
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn new(info: TickerInfo, history: PriceHistory) -> Self {
        Self {
            info: Some(info),
            history: Some(history),
            ..Self::default()
        }
    }

    pub fn info_calls(&self) -> usize {
        self.info_calls.load(Ordering::SeqCst)
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MarketData for FixtureProvider {
    async fn fetch_info(&self, symbol: &TickerSymbol) -> Result<TickerInfo, ProviderError> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        self.info.clone().ok_or_else(|| ProviderError::Api {
            code: "Not Found".into(),
            description: format!("Quote not found for symbol: {symbol}"),
        })
    }

    async fn fetch_history(&self, symbol: &TickerSymbol) -> Result<PriceHistory, ProviderError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        self.history
            .clone()
            .ok_or_else(|| ProviderError::NoData(symbol.to_string()))
    }
}

/// Info map carrying every field the reports read.
pub fn complete_info() -> TickerInfo {
    let fields: [(&str, Value); 13] = [
        (FIELD_LONG_NAME, json!("Apple Inc.")),
        (FIELD_INDUSTRY, json!("Consumer Electronics")),
        (FIELD_SECTOR, json!("Technology")),
        (FIELD_COUNTRY, json!("United States")),
        (FIELD_MARKET_CAP, json!(2950000000000u64)),
        (FIELD_TRAILING_PE, json!(30.123456)),
        (FIELD_FORWARD_PE, json!(27.5)),
        (FIELD_PEG_RATIO, json!(2.456)),
        (FIELD_PRICE_TO_SALES, json!(7.891)),
        (FIELD_PRICE_TO_BOOK, json!(45.0)),
        (FIELD_52W_HIGH, json!(199.62)),
        (FIELD_52W_LOW, json!(164.075)),
        (FIELD_DIVIDEND_YIELD, json!(0.0051)),
    ];
    fields
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

pub fn info_without(field: &str) -> TickerInfo {
    let info = complete_info();
    let fields = [
        FIELD_LONG_NAME,
        FIELD_INDUSTRY,
        FIELD_SECTOR,
        FIELD_COUNTRY,
        FIELD_MARKET_CAP,
        FIELD_TRAILING_PE,
        FIELD_FORWARD_PE,
        FIELD_PEG_RATIO,
        FIELD_PRICE_TO_SALES,
        FIELD_PRICE_TO_BOOK,
        FIELD_52W_HIGH,
        FIELD_52W_LOW,
        FIELD_DIVIDEND_YIELD,
    ];
    fields
        .into_iter()
        .filter(|f| *f != field)
        .filter_map(|f| info.get(f).ok().map(|v| (f.to_string(), v.clone())))
        .collect()
}

/// Closes compounding the given daily returns from 100.0, one bar per day.
pub fn history_from_returns(returns: &[f64]) -> PriceHistory {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let mut close = 100.0;
    let mut closes = vec![close];
    for r in returns {
        close *= 1.0 + r;
        closes.push(close);
    }
    let bars = closes
        .into_iter()
        .enumerate()
        .map(|(i, close)| PriceBar {
            date: start.checked_add_days(Days::new(i as u64)).unwrap(),
            open: close * 0.99,
            close,
        })
        .collect();
    PriceHistory::new(bars)
}

/// Alternating +2% / -1% daily returns over `rows` bars.
pub fn alternating_history(rows: usize) -> PriceHistory {
    let returns: Vec<f64> = (0..rows.saturating_sub(1))
        .map(|i| if i % 2 == 0 { 0.02 } else { -0.01 })
        .collect();
    history_from_returns(&returns)
}
