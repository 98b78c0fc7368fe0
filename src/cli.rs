use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about = "Stock fundamentals, price history and return statistics", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// JSON configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter such as "debug" or "tickview=trace"; logs go to stderr.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Numbered-menu loop: pick a ticker, then actions on it (the default).
    Menu,

    /// Form with a ticker field and one button per analysis.
    Form,
}
