//! Error types for the paperfetch library.
//!
//! Errors fall into three classes that decide how far they travel:
//!
//! - [`PaperfetchError::Config`]: the run cannot start (missing title list, bad configuration,
//!   output location that cannot be created). These abort the run.
//! - [`PaperfetchError::Resolution`]: a search for one title went wrong. The resolver downgrades
//!   these to an unresolved entry.
//! - [`PaperfetchError::Download`]: fetching one PDF went wrong. The fetcher downgrades these to a
//!   failed outcome.
//!
//! The transparent variants wrap the underlying library errors and are classified by whichever
//! stage they surface in.
//!
//! # Examples
//!
//! ```
//! use paperfetch::{entry, error::PaperfetchError};
//!
//! match entry::load_entries("does/not/exist.txt") {
//!   Err(PaperfetchError::Config(msg)) => println!("cannot start: {msg}"),
//!   Err(e) => println!("other error: {e}"),
//!   Ok(entries) => println!("{} entries", entries.len()),
//! }
//! ```

use thiserror::Error;

/// Error type alias used for the [`paperfetch`](crate) crate.
pub type Result<T> = core::result::Result<T, PaperfetchError>;

/// Errors that can occur while loading, resolving or downloading papers.
#[derive(Error, Debug)]
pub enum PaperfetchError {
  /// The run cannot proceed.
  ///
  /// Raised when the title list is missing or unreadable, when a configuration file cannot be
  /// parsed, or when the output directory or run log cannot be created.
  #[error("Configuration error: {0}")]
  Config(String),

  /// A search request for a single title failed.
  ///
  /// Covers unexpected HTTP statuses from the search backend and responses that do not have the
  /// shape the retriever configuration describes.
  #[error("Resolution error: {0}")]
  Resolution(String),

  /// A PDF download for a single entry failed.
  ///
  /// Covers error statuses, empty bodies and responses that are not PDFs.
  #[error("Download error: {0}")]
  Download(String),

  /// A network request failed (unreachable host, timeout, TLS).
  #[error(transparent)]
  Network(#[from] reqwest::Error),

  /// A file system operation failed.
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// A TOML document could not be deserialized.
  #[error(transparent)]
  TomlDe(#[from] toml::de::Error),

  /// A JSON document could not be parsed.
  #[error(transparent)]
  Json(#[from] serde_json::Error),
}
