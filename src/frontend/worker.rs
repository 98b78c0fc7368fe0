use crate::model::TickerSymbol;
use crate::provider::MarketData;
use crate::report::form::{self, Action, Outcome};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Result of one click, tagged with the click's ticket.
#[derive(Debug)]
pub struct Completion {
    pub ticket: u64,
    pub action: Action,
    pub outcome: Outcome,
}

/// Runs form analyses on tokio tasks and hands back only the newest click's result.
pub struct AnalysisWorker {
    provider: Arc<dyn MarketData>,
    latest: u64,
    delivered: u64,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl AnalysisWorker {
    pub fn new(provider: Arc<dyn MarketData>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            provider,
            latest: 0,
            delivered: 0,
            tx,
            rx,
        }
    }

    /// Starts `action` for `symbol`; any earlier click still running becomes stale.
    pub fn submit(&mut self, action: Action, symbol: TickerSymbol) -> u64 {
        self.latest += 1;
        let ticket = self.latest;
        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();

        tokio::spawn(async move {
            debug!("Job #{} started: {} for '{}'", ticket, action.label(), symbol);
            let outcome = form::run(provider.as_ref(), action, &symbol).await;
            debug!("Job #{} finished", ticket);
            // The receiver lives as long as the worker.
            let _ = tx.send(Completion {
                ticket,
                action,
                outcome,
            });
        });

        ticket
    }

    /// True while the newest click has not been delivered yet.
    pub fn has_pending(&self) -> bool {
        self.delivered < self.latest
    }

    /// Waits for the newest click's result, dropping stale ones on the way.
    pub async fn next_current(&mut self) -> Option<Completion> {
        loop {
            let completion = self.rx.recv().await?;
            if completion.ticket == self.latest {
                self.delivered = completion.ticket;
                return Some(completion);
            }
            debug!(
                "Dropping stale result of job #{} (latest is #{})",
                completion.ticket, self.latest
            );
        }
    }
}
