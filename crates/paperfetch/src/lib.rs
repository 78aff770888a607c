//! Batch retrieval of conference paper PDFs from a curated list of titles.
//!
//! `paperfetch` takes a flat text file of paper titles (typically copied out of a conference
//! program page), looks each title up in a bibliographic search API, and downloads the PDF of the
//! best match into a local directory. Every title ends up in exactly one of three buckets:
//!
//! - **downloaded**: a non-empty PDF now sits in the output directory
//! - **failed**: a PDF link was found but the download did not complete
//! - **not found**: no search result was similar enough to the title
//!
//! # Features
//!
//! - **Explicit overrides**: a line may carry its own `http(s)://` or `www.` link which bypasses
//!   search
//! - **Configuration-driven search**: backends are described by TOML files (arXiv built in)
//! - **Fuzzy title matching**: normalized exact match or similarity above a threshold
//! - **Idempotent runs**: existing non-empty files are skipped, downloads land atomically
//! - **Run log**: one `status, title, detail` line per entry plus a summary of counts
//!
//! # Getting Started
//!
//! ```no_run
//! use paperfetch::{prelude::*, retriever::Retriever, Config, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), PaperfetchError> {
//!   let config = Config::default().with_input_path("papers.txt").with_output_dir("pdfs");
//!   let retriever = Retriever::from_config(&config)?;
//!
//!   let report = Pipeline::new(config, Box::new(retriever)).run().await?;
//!   println!("downloaded {}", report.summary.count(Status::Downloaded));
//!   Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`entry`]: Loading the title list into [`entry::Entry`] values
//! - [`retriever`]: The [`retriever::SearchApi`] seam and the TOML-configured search backend
//! - [`resolver`]: Title matching and query pacing
//! - [`fetcher`]: Filenames, atomic downloads and the skip policy
//! - [`record`]: Outcomes, the run log and summary counters
//! - [`format`]: Title normalization, similarity and filename sanitizing
//! - [`configuration`]: The [`Config`] type and its TOML loading

#![warn(missing_docs)]

use std::{
  collections::BTreeMap,
  fmt::Display,
  path::{Path, PathBuf},
  time::Duration,
};

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};
#[cfg(test)]
use {tempfile::tempdir, tracing_test::traced_test};

pub mod client;
pub mod configuration;
pub mod entry;
pub mod error;
pub mod fetcher;
pub mod format;
pub mod pipeline;
pub mod record;
pub mod resolver;
pub mod retriever;

pub use configuration::Config;
pub use pipeline::Pipeline;

use crate::{
  entry::Entry,
  error::*,
  record::{Outcome, Status},
  resolver::Resolution,
  retriever::{Candidate, SearchApi, SearchFilters},
};

/// Common traits and types for ergonomic imports.
///
/// ```no_run
/// use paperfetch::prelude::*;
///
/// fn bucket(outcome: &Outcome) -> &'static str {
///   match outcome.status {
///     Status::Downloaded => "ok",
///     Status::Failed | Status::NotFound => "needs attention",
///   }
/// }
/// ```
pub mod prelude {
  pub use crate::{
    error::PaperfetchError,
    record::{Outcome, Status},
    retriever::SearchApi,
  };
}
