use crate::analyzer::RiskReturn;
use crate::model::*;
use crate::presenter::{Chart, Presenter, Series};
use crate::provider::MarketData;
use crate::report::format_percent;

/// A numbered entry of the action menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    BasicInfo,
    HistoricalData,
    RiskReturn,
    DividendYield,
    Exit,
}

impl MenuChoice {
    /// Exactly "1" to "5"; anything else is not a choice.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim_end_matches(['\r', '\n']) {
            "1" => Some(MenuChoice::BasicInfo),
            "2" => Some(MenuChoice::HistoricalData),
            "3" => Some(MenuChoice::RiskReturn),
            "4" => Some(MenuChoice::DividendYield),
            "5" => Some(MenuChoice::Exit),
            _ => None,
        }
    }
}

/// Runs one menu action. Errors are returned to the caller untouched.
pub async fn run(
    provider: &dyn MarketData,
    choice: MenuChoice,
    symbol: &TickerSymbol,
    presenter: &mut dyn Presenter,
) -> Result<(), AnalysisError> {
    match choice {
        MenuChoice::BasicInfo => show_basic_info(provider, symbol, presenter).await,
        MenuChoice::HistoricalData => show_historical_data(provider, symbol, presenter).await,
        MenuChoice::RiskReturn => calculate_risk_return(provider, symbol, presenter).await,
        MenuChoice::DividendYield => calculate_dividend_yield(provider, symbol, presenter).await,
        MenuChoice::Exit => Ok(()),
    }
}

/// Prints line by line, so a missing field stops the listing midway.
pub async fn show_basic_info(
    provider: &dyn MarketData,
    symbol: &TickerSymbol,
    presenter: &mut dyn Presenter,
) -> Result<(), AnalysisError> {
    let info = provider.fetch_info(symbol).await?;
    let fields = [
        ("Name", FIELD_LONG_NAME),
        ("Industry", FIELD_INDUSTRY),
        ("Sector", FIELD_SECTOR),
        ("Country", FIELD_COUNTRY),
        ("Market Cap", FIELD_MARKET_CAP),
        ("PE Ratio", FIELD_TRAILING_PE),
        ("Forward PE Ratio", FIELD_FORWARD_PE),
        ("PEG Ratio", FIELD_PEG_RATIO),
    ];
    for (label, field) in fields {
        presenter.display_text(&format!("{label}: {}", info.display(field)?))?;
    }
    Ok(())
}

pub async fn show_historical_data(
    provider: &dyn MarketData,
    symbol: &TickerSymbol,
    presenter: &mut dyn Presenter,
) -> Result<(), AnalysisError> {
    let history = provider.fetch_history(symbol).await?;
    let chart = Chart::lines(
        "Historical Stock Prices".to_string(),
        "Date",
        "Price",
        vec![Series::new("Close", &history.dates(), &history.closes())],
    );
    presenter.display_chart(&chart)?;
    Ok(())
}

/// Prints annualized figures, then plots the daily-return time series.
pub async fn calculate_risk_return(
    provider: &dyn MarketData,
    symbol: &TickerSymbol,
    presenter: &mut dyn Presenter,
) -> Result<(), AnalysisError> {
    let history = provider.fetch_history(symbol).await?;
    let stats = RiskReturn::from_closes(&history.closes())?;

    presenter.display_text(&format!(
        "Annualized Return: {}",
        format_percent(stats.annualized_return, 4)
    ))?;
    presenter.display_text(&format!(
        "Annualized Volatility: {}",
        format_percent(stats.annualized_volatility, 4)
    ))?;

    // Returns start at the second bar.
    let dates = history.dates();
    let chart = Chart::lines(
        "Daily Returns".to_string(),
        "Date",
        "Daily Return",
        vec![Series::new("Daily Return", &dates[1..], &stats.daily_returns)],
    );
    presenter.display_chart(&chart)?;
    Ok(())
}

pub async fn calculate_dividend_yield(
    provider: &dyn MarketData,
    symbol: &TickerSymbol,
    presenter: &mut dyn Presenter,
) -> Result<(), AnalysisError> {
    let info = provider.fetch_info(symbol).await?;
    let dividend_yield = info.number(FIELD_DIVIDEND_YIELD)?;
    presenter.display_text(&format!(
        "Dividend Yield: {}",
        format_percent(dividend_yield, 4)
    ))?;
    Ok(())
}
