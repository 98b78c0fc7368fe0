use crate::analyzer::histogram::RETURN_BINS;
use crate::analyzer::indicators::{SMA_LONG, SMA_SHORT};
use crate::analyzer::{Histogram, RiskReturn, simple_moving_average};
use crate::model::*;
use crate::presenter::{Chart, Marker, Series};
use crate::provider::MarketData;
use crate::report::format_percent;
use crate::validator::is_valid;
use tracing::debug;

pub const INVALID_TICKER: &str = "Invalid ticker symbol. Please enter a valid ticker symbol.";
pub const DATA_NOT_AVAILABLE: &str = "Data not available for this stock.";

/// One push-button of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    BasicInfo,
    HistoricalData,
    RiskReturn,
    DividendYield,
    TechnicalIndicators,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::BasicInfo,
        Action::HistoricalData,
        Action::RiskReturn,
        Action::DividendYield,
        Action::TechnicalIndicators,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Action::BasicInfo => "Basic Info",
            Action::HistoricalData => "Historical Data",
            Action::RiskReturn => "Risk and Return",
            Action::DividendYield => "Dividend Yield",
            Action::TechnicalIndicators => "Technical Indicators",
        }
    }
}

/// What a click produces: new label text or a chart window.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Text(String),
    Chart(Chart),
}

/// Validate, fetch, compute. Every failure collapses into one of the two fixed messages.
pub async fn run(provider: &dyn MarketData, action: Action, symbol: &TickerSymbol) -> Outcome {
    if !is_valid(provider, symbol).await {
        return Outcome::Text(INVALID_TICKER.to_string());
    }

    let result = match action {
        Action::BasicInfo => basic_info(provider, symbol).await.map(Outcome::Text),
        Action::HistoricalData => historical_data(provider, symbol).await.map(Outcome::Chart),
        Action::RiskReturn => risk_return(provider, symbol).await.map(Outcome::Chart),
        Action::DividendYield => dividend_yield(provider, symbol).await.map(Outcome::Text),
        Action::TechnicalIndicators => {
            technical_indicators(provider, symbol).await.map(Outcome::Chart)
        }
    };

    result.unwrap_or_else(|e| {
        debug!("{} for '{}' failed: {}", action.label(), symbol, e);
        Outcome::Text(DATA_NOT_AVAILABLE.to_string())
    })
}

pub async fn basic_info(
    provider: &dyn MarketData,
    symbol: &TickerSymbol,
) -> Result<String, AnalysisError> {
    let info = provider.fetch_info(symbol).await?;
    basic_info_text(&info)
}

/// Twelve labelled lines; ratios and 52-week prices to two decimals.
pub fn basic_info_text(info: &TickerInfo) -> Result<String, AnalysisError> {
    let ratio = |field: &str| info.number(field).map(|v| format!("{v:.2}"));
    let lines = [
        format!("Name: {}", info.display(FIELD_LONG_NAME)?),
        format!("Industry: {}", info.display(FIELD_INDUSTRY)?),
        format!("Market Cap: {}", info.display(FIELD_MARKET_CAP)?),
        format!("Country: {}", info.display(FIELD_COUNTRY)?),
        format!("Sector: {}", info.display(FIELD_SECTOR)?),
        format!("PE Ratio: {}", ratio(FIELD_TRAILING_PE)?),
        format!("Forward PE Ratio: {}", ratio(FIELD_FORWARD_PE)?),
        format!("PEG Ratio: {}", ratio(FIELD_PEG_RATIO)?),
        format!("Price-to-Sales Ratio: {}", ratio(FIELD_PRICE_TO_SALES)?),
        format!("Price-to-Book Ratio: {}", ratio(FIELD_PRICE_TO_BOOK)?),
        format!("52-Week High: {}", ratio(FIELD_52W_HIGH)?),
        format!("52-Week Low: {}", ratio(FIELD_52W_LOW)?),
    ];
    Ok(lines.join("\n"))
}

pub async fn historical_data(
    provider: &dyn MarketData,
    symbol: &TickerSymbol,
) -> Result<Chart, AnalysisError> {
    let history = provider.fetch_history(symbol).await?;
    Ok(historical_chart(symbol, &history))
}

pub fn historical_chart(symbol: &TickerSymbol, history: &PriceHistory) -> Chart {
    let dates = history.dates();
    Chart::lines(
        format!("{symbol} Historical Data"),
        "Date",
        "Price",
        vec![
            Series::new("Close", &dates, &history.closes()),
            Series::new("Open", &dates, &history.opens()),
        ],
    )
}

pub async fn risk_return(
    provider: &dyn MarketData,
    symbol: &TickerSymbol,
) -> Result<Chart, AnalysisError> {
    let history = provider.fetch_history(symbol).await?;
    risk_return_chart(symbol, &history)
}

/// Histogram of daily returns with the volatility marked on the returns axis.
pub fn risk_return_chart(
    symbol: &TickerSymbol,
    history: &PriceHistory,
) -> Result<Chart, AnalysisError> {
    let stats = RiskReturn::from_closes(&history.closes())?;
    let chart = Chart::histogram(
        format!("{symbol} Risk and Return"),
        "Returns",
        "Frequency",
        Histogram::new(&stats.daily_returns, RETURN_BINS),
        vec![Marker {
            label: "Volatility".to_string(),
            x: stats.volatility,
        }],
    )
    .with_note(format!(
        "Annualized Return: {}",
        format_percent(stats.annualized_return, 4)
    ));
    Ok(chart)
}

pub async fn dividend_yield(
    provider: &dyn MarketData,
    symbol: &TickerSymbol,
) -> Result<String, AnalysisError> {
    let info = provider.fetch_info(symbol).await?;
    let dividend_yield = info.number(FIELD_DIVIDEND_YIELD)?;
    Ok(format!("Dividend Yield: {dividend_yield:.4}"))
}

pub async fn technical_indicators(
    provider: &dyn MarketData,
    symbol: &TickerSymbol,
) -> Result<Chart, AnalysisError> {
    let history = provider.fetch_history(symbol).await?;
    Ok(technical_chart(symbol, &history))
}

/// Close price with its 50- and 200-day simple moving averages.
pub fn technical_chart(symbol: &TickerSymbol, history: &PriceHistory) -> Chart {
    let dates = history.dates();
    let closes = history.closes();
    Chart::lines(
        format!("{symbol} Technical Indicators"),
        "Date",
        "Price",
        vec![
            Series::new("Close", &dates, &closes),
            Series::with_gaps("SMA 50", &dates, &simple_moving_average(&closes, SMA_SHORT)),
            Series::with_gaps("SMA 200", &dates, &simple_moving_average(&closes, SMA_LONG)),
        ],
    )
}
