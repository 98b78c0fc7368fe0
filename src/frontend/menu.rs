use crate::model::{AnalysisError, TickerSymbol};
use crate::presenter::TerminalPresenter;
use crate::provider::MarketData;
use crate::report::terminal::{self, MenuChoice};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

pub const TICKER_PROMPT: &str = "Enter a ticker symbol (or QUIT to exit): ";
pub const MENU_PROMPT: &str = "What would you like to do?\n1. Show basic info\n2. Show historical data\n3. Calculate risk and return\n4. Calculate dividend yield\n5. Exit\nEnter a number: ";
pub const QUIT: &str = "QUIT";

/// Outer loop asks for a ticker, inner loop for actions on it.
/// Analysis errors end the loop and are returned; end of input ends it quietly.
pub async fn run_menu<R, W>(
    provider: &dyn MarketData,
    input: R,
    presenter: &mut TerminalPresenter<W>,
) -> Result<(), AnalysisError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    loop {
        presenter.prompt(TICKER_PROMPT)?;
        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        let symbol = TickerSymbol::from_input(&line);
        if symbol.as_str() == QUIT {
            return Ok(());
        }
        info!("Ticker selected: {}", symbol);

        loop {
            presenter.prompt(MENU_PROMPT)?;
            let Some(line) = lines.next_line().await? else {
                return Ok(());
            };
            match MenuChoice::parse(&line) {
                Some(MenuChoice::Exit) => break,
                Some(choice) => terminal::run(provider, choice, &symbol, presenter).await?,
                None => debug!("Ignoring menu input '{}'", line),
            }
        }
    }
}
