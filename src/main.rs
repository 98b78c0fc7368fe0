mod analyzer;
mod cli;
mod config;
mod frontend;
mod model;
mod presenter;
mod provider;
mod report;
mod validator;

use clap::Parser;
use cli::{Cli, Commands};
use config::{AppConfig, load_config};
use presenter::TerminalPresenter;
use provider::{MarketData, YahooClient};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.log_level.as_deref());

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Panic occurred: {:?}", panic_info);
    }));

    // Load configuration from file, or run on defaults
    let config = match &cli.config {
        Some(path) => {
            let cfg = load_config(path)?;
            info!("Loaded config from {}", path.display());
            cfg
        }
        None => AppConfig::default(),
    };

    let provider: Arc<dyn MarketData> = Arc::new(YahooClient::new(&config.provider)?);
    let input = BufReader::new(tokio::io::stdin());
    let mut presenter = TerminalPresenter::new(std::io::stdout(), config.chart.clone());

    match cli.command.unwrap_or(Commands::Menu) {
        Commands::Menu => frontend::run_menu(provider.as_ref(), input, &mut presenter).await?,
        Commands::Form => frontend::run_form(provider, input, &mut presenter).await?,
    }
    Ok(())
}

/// Logs go to stderr so they never mix with prompts and results on stdout.
fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
