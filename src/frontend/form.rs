use crate::frontend::worker::AnalysisWorker;
use crate::model::TickerSymbol;
use crate::presenter::Presenter;
use crate::provider::MarketData;
use crate::report::form::{Action, Outcome};
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

pub const TICKER_LABEL: &str = "Enter a Ticker Symbol:";

/// Widget state: the ticker field and the result label.
#[derive(Debug, Default)]
pub struct Form {
    ticker: String,
    label: String,
}

/// Something the user did to the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    Edit(String),
    Click(Action),
}

impl FormEvent {
    /// A button number clicks that button; any other line becomes the field text.
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        let button = line
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| Action::ALL.get(i).copied());
        match button {
            Some(action) if line.len() == 1 => FormEvent::Click(action),
            _ => FormEvent::Edit(line.to_string()),
        }
    }
}

impl Form {
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn set_ticker(&mut self, text: String) {
        self.ticker = text;
    }

    /// Text replaces the label; a chart opens without touching it.
    pub fn apply(&mut self, outcome: Outcome, presenter: &mut dyn Presenter) -> io::Result<()> {
        match outcome {
            Outcome::Text(text) => {
                self.label = text;
                presenter.display_text(&self.label)
            }
            Outcome::Chart(chart) => presenter.display_chart(&chart),
        }
    }

    pub fn layout() -> String {
        let buttons: Vec<String> = Action::ALL
            .iter()
            .enumerate()
            .map(|(i, action)| format!("[{}] {}", i + 1, action.label()))
            .collect();
        format!(
            "{TICKER_LABEL}\n{}\nType a ticker to fill the field, or a button number to click it.",
            buttons.join("  ")
        )
    }
}

/// Drives the form from `input` until it closes (EOF).
pub async fn run_form<R>(
    provider: Arc<dyn MarketData>,
    input: R,
    presenter: &mut dyn Presenter,
) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut form = Form::default();
    let mut worker = AnalysisWorker::new(provider);
    let mut lines = input.lines();

    presenter.display_text(&Form::layout())?;
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match FormEvent::parse(&line) {
                    FormEvent::Edit(text) => form.set_ticker(text),
                    FormEvent::Click(action) => {
                        let ticket = worker.submit(action, TickerSymbol::new(form.ticker()));
                        info!("Clicked {} for '{}' (job #{})", action.label(), form.ticker(), ticket);
                    }
                }
            }
            Some(done) = worker.next_current() => {
                debug!("Applying {} result of job #{}", done.action.label(), done.ticket);
                form.apply(done.outcome, presenter)?;
            }
        }
    }

    // Closing the window still shows the last click's result.
    if worker.has_pending() {
        if let Some(done) = worker.next_current().await {
            form.apply(done.outcome, presenter)?;
        }
    }
    Ok(())
}
