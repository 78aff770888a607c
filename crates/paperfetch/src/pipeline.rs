//! The end-to-end run: load, resolve, fetch, record.
//!
//! Entries are processed one at a time in input order. Only problems that prevent the run from
//! starting are returned as errors; everything that goes wrong for a single entry ends up in that
//! entry's [`Outcome`].

use super::*;
use crate::{
  entry::load_entries,
  fetcher::Fetcher,
  record::{RunLog, RunReport},
  resolver::Resolver,
};

/// A configured run over one title list.
pub struct Pipeline {
  config: Config,
  api:    Box<dyn SearchApi>,
}

impl Pipeline {
  /// Creates a pipeline searching through `api`.
  pub fn new(config: Config, api: Box<dyn SearchApi>) -> Self { Self { config, api } }

  /// The configuration this pipeline runs with.
  pub fn config(&self) -> &Config { &self.config }

  /// Runs to completion.
  pub async fn run(self) -> Result<RunReport> { self.run_with(|_| {}).await }

  /// Runs to completion, calling `on_outcome` after each entry is recorded.
  ///
  /// # Errors
  ///
  /// Returns [`PaperfetchError::Config`] if the title list cannot be read, or the output directory
  /// or run log cannot be created. Nothing is downloaded in that case.
  pub async fn run_with(self, mut on_outcome: impl FnMut(&Outcome)) -> Result<RunReport> {
    let Self { config, api } = self;

    let entries = load_entries(&config.input_path)?;
    let client = client::build_client(config.timeout())?;
    let mut fetcher = Fetcher::from_config(&config, client);
    fetcher.prepare()?;
    let mut log = RunLog::create(&config.log_path)?;

    info!(
      "Processing {} entries from {} into {}",
      entries.len(),
      config.input_path.display(),
      fetcher.output_dir().display()
    );

    let mut resolver = Resolver::new(api)
      .with_filters(config.filters.clone())
      .with_policy(config.matching.clone())
      .with_pause(config.pause());

    let mut report = RunReport::new();
    for entry in entries {
      let resolution = resolver.resolve(entry).await;
      let outcome = fetcher.fetch(&resolution).await;

      info!("{}", outcome.log_line());
      if let Err(e) = log.append(&outcome) {
        warn!("Failed to write to run log {}: {e}", log.path().display());
      }
      on_outcome(&outcome);
      report.record(outcome);
    }

    info!("Finished: {}", report.summary);
    Ok(report)
  }
}
