//! Error types for the paperfetch CLI.

use paperfetch::error::PaperfetchError;
use thiserror::Error;

/// Error type alias used for the CLI.
pub type Result<T> = core::result::Result<T, PaperfetchCliError>;

/// Errors that end a CLI invocation with a non-zero exit code.
#[derive(Error, Debug)]
pub enum PaperfetchCliError {
  /// The library refused to start the run.
  #[error(transparent)]
  Paperfetch(#[from] PaperfetchError),

  /// Writing to the terminal failed.
  #[error(transparent)]
  Io(#[from] std::io::Error),
}
