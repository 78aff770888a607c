//! Run configuration.
//!
//! Every field has a default, so a configuration file only needs to name what it changes:
//!
//! ```toml
//! output_dir = "pdfs"
//! pause_ms = 5000
//! max_results = 20
//!
//! [matching]
//! threshold = 0.85
//!
//! [filters]
//! categories = ["cs.SD", "eess.AS"]
//! min_year = 2020
//! ```

use crate::resolver::MatchPolicy;

use super::*;

/// Settings for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Title list to read
  pub input_path:               PathBuf,
  /// Directory the PDFs are written to
  pub output_dir:               PathBuf,
  /// Run log, truncated at the start of every run
  pub log_path:                 PathBuf,
  /// Minimum pause between search queries, in milliseconds
  pub pause_ms:                 u64,
  /// Timeout for every HTTP request, in seconds
  pub timeout_secs:             u64,
  /// Byte cap on generated filename stems
  pub max_filename_len:         usize,
  /// Reject downloads whose `Content-Type` is neither PDF nor octet-stream
  pub require_pdf_content_type: bool,
  /// Search results requested per query, all of which are scored
  pub max_results:              usize,
  /// Title matching rules
  pub matching:                 MatchPolicy,
  /// Search narrowing
  pub filters:                  SearchFilters,
  /// Retriever configuration file; the built-in arXiv backend when unset
  pub retriever:                Option<PathBuf>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      input_path:               PathBuf::from("papers.txt"),
      output_dir:               PathBuf::from("paper_downloads"),
      log_path:                 PathBuf::from("download_results.log"),
      pause_ms:                 resolver::DEFAULT_QUERY_PAUSE.as_millis() as u64,
      timeout_secs:             client::DEFAULT_TIMEOUT.as_secs(),
      max_filename_len:         format::DEFAULT_MAX_FILENAME_LEN,
      require_pdf_content_type: true,
      max_results:              retriever::DEFAULT_MAX_RESULTS,
      matching:                 MatchPolicy::default(),
      filters:                  SearchFilters::default(),
      retriever:                None,
    }
  }
}

impl Config {
  /// Location of the per-user configuration file.
  pub fn default_path() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("paperfetch").join("config.toml")
  }

  /// Reads a configuration from a TOML file.
  ///
  /// # Errors
  ///
  /// Returns [`PaperfetchError::Config`] if the file cannot be read or is not valid TOML.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
      PaperfetchError::Config(format!("Failed to read configuration {}: {e}", path.display()))
    })?;
    let config: Config = toml::from_str(&content).map_err(|e| {
      PaperfetchError::Config(format!("Invalid configuration {}: {e}", path.display()))
    })?;
    config.validate()?;
    debug!("Loaded configuration from {}", path.display());
    Ok(config)
  }

  /// Loads `path` if given, else the per-user file if it exists, else the defaults.
  pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
    match path {
      Some(path) => Self::load(path),
      None => {
        let default_path = Self::default_path();
        if default_path.is_file() {
          Self::load(default_path)
        } else {
          trace!("No configuration at {}, using defaults", default_path.display());
          Ok(Self::default())
        }
      },
    }
  }

  fn validate(&self) -> Result<()> {
    if !(0.0..=1.0).contains(&self.matching.threshold) {
      return Err(PaperfetchError::Config(format!(
        "Similarity threshold must be between 0 and 1, got {}",
        self.matching.threshold
      )));
    }
    if let (Some(min), Some(max)) = (self.filters.min_year, self.filters.max_year) {
      if min > max {
        return Err(PaperfetchError::Config(format!("Year range {min}..{max} is empty")));
      }
    }
    Ok(())
  }

  /// The request timeout.
  pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }

  /// The pause between search queries.
  pub fn pause(&self) -> Duration { Duration::from_millis(self.pause_ms) }

  /// Sets the title list path.
  pub fn with_input_path(mut self, path: impl Into<PathBuf>) -> Self {
    self.input_path = path.into();
    self
  }

  /// Sets the output directory.
  pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
    self.output_dir = path.into();
    self
  }

  /// Sets the run log path.
  pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
    self.log_path = path.into();
    self
  }

  /// Sets the pause between search queries.
  pub fn with_pause(mut self, pause: Duration) -> Self {
    self.pause_ms = pause.as_millis() as u64;
    self
  }

  /// Sets the number of search results requested per query.
  pub fn with_max_results(mut self, max_results: usize) -> Self {
    self.max_results = max_results;
    self
  }

  /// Sets the search filters.
  pub fn with_filters(mut self, filters: SearchFilters) -> Self {
    self.filters = filters;
    self
  }

  /// Sets the retriever configuration file.
  pub fn with_retriever(mut self, path: impl Into<PathBuf>) -> Self {
    self.retriever = Some(path.into());
    self
  }
}
