//! Command line interface for batch-downloading conference paper PDFs.
//!
//! Reads a list of paper titles, looks each one up, downloads the matching PDFs and prints how
//! many were downloaded, failed or not found.
//!
//! # Usage
//!
//! ```bash
//! # Read papers.txt, write into paper_downloads/
//! paperfetch
//!
//! # Explicit input and output locations
//! paperfetch icassp_titles.txt --output icassp_pdfs
//!
//! # Use a configuration file and show per-request logging
//! paperfetch --config paperfetch.toml -vvv
//! ```
//!
//! Logs go to stderr and respect `RUST_LOG`; stdout carries the per-entry lines and the summary.

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::path::PathBuf;

use clap::{builder::ArgAction, Parser};
use paperfetch::{prelude::*, retriever::Retriever, Config, Pipeline};
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub mod error;
pub mod interaction;

use crate::{error::*, interaction::*};

/// Command line interface configuration and argument parsing
#[derive(Parser)]
#[command(author, version, about = "Download the PDFs for a list of paper titles")]
pub struct Cli {
  /// Verbose mode (-v, -vv, -vvv) for different levels of logging detail
  #[arg(
        short,
        long,
        action = ArgAction::Count,
        help = "Increase logging verbosity"
    )]
  verbose: u8,

  /// Title list, one paper per line [default: papers.txt]
  input: Option<PathBuf>,

  /// Directory the PDFs are written to [default: paper_downloads]
  #[arg(long, short)]
  output: Option<PathBuf>,

  /// TOML configuration file. Without it the per-user configuration is used if present.
  #[arg(long, short)]
  config: Option<PathBuf>,

  /// Run log path [default: download_results.log]
  #[arg(long)]
  log: Option<PathBuf>,
}

impl Cli {
  /// Loads the configuration and applies the command line overrides on top.
  fn config(&self) -> Result<Config> {
    let mut config = Config::load_or_default(self.config.as_deref())?;
    if let Some(input) = &self.input {
      config = config.with_input_path(input);
    }
    if let Some(output) = &self.output {
      config = config.with_output_dir(output);
    }
    if let Some(log) = &self.log {
      config = config.with_log_path(log);
    }
    Ok(config)
  }
}

/// Configures the logging system based on the verbosity level
///
/// The verbosity levels are:
/// - 0: error (default)
/// - 1: warn
/// - 2: info
/// - 3: debug
/// - 4+: trace
fn setup_logging(verbosity: u8) {
  let filter = match verbosity {
    0 => "error",
    1 => "warn",
    2 => "info",
    3 => "debug",
    _ => "trace",
  };

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_file(true)
    .with_line_number(true)
    .with_target(true)
    .init();
}

/// Runs the pipeline and reports progress to `terminal`.
async fn run(cli: &Cli, terminal: &impl UserInteraction) -> Result<()> {
  let config = cli.config()?;
  debug!("Effective configuration: {config:?}");

  terminal.reply(ResponseContent::Info(&format!(
    "Reading titles from {}, saving PDFs to {}",
    config.input_path.display(),
    config.output_dir.display()
  )))?;

  let retriever = Retriever::from_config(&config)?;
  let mut reply_error = None;
  let report = Pipeline::new(config, Box::new(retriever))
    .run_with(|outcome| {
      if let Err(e) = terminal.reply(ResponseContent::Outcome(outcome)) {
        reply_error.get_or_insert(e);
      }
    })
    .await?;
  if let Some(e) = reply_error {
    return Err(e);
  }

  terminal.reply(ResponseContent::Summary(&report.summary))
}

/// Entry point for the paperfetch CLI
///
/// # Errors
///
/// Fails with a non-zero exit code when the run cannot start: the title list is missing, the
/// configuration is invalid, or the output directory or run log cannot be created. Individual
/// failed or unmatched papers do not make the run fail.
#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  setup_logging(cli.verbose);

  let terminal = Terminal;
  if let Err(e) = run(&cli, &terminal).await {
    terminal.reply(ResponseContent::Error(&e))?;
    return Err(e);
  }
  Ok(())
}
