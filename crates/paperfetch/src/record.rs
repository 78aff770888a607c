//! Per-entry outcomes, the run log and the summary counters.
//!
//! Every processed entry produces exactly one [`Outcome`]. The outcome is written to the
//! [`RunLog`] as a single line and counted in the [`Summary`]:
//!
//! ```text
//! downloaded, Deep Beats
//! downloaded, Deep Beats, skipped-existing
//! not_found, Totally Obscure Talk, no search results
//! failed, Foo: A Study (2024), HTTP 500 Internal Server Error
//! ```

use std::{fs::File, io::Write};

use chrono::{DateTime, Utc};

use super::*;

/// Detail recorded when the target file was already present.
pub const SKIPPED_EXISTING: &str = "skipped-existing";

/// The bucket an entry ends up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
  /// A non-empty PDF is in the output directory
  Downloaded,
  /// A link was found but the download did not complete
  Failed,
  /// No usable link was found
  NotFound,
}

impl Status {
  /// All statuses, in summary order.
  pub const ALL: [Status; 3] = [Status::Downloaded, Status::Failed, Status::NotFound];

  /// The label used in the run log and the summary.
  pub fn as_str(&self) -> &'static str {
    match self {
      Status::Downloaded => "downloaded",
      Status::Failed => "failed",
      Status::NotFound => "not_found",
    }
  }
}

impl Display for Status {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

/// The final result for one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
  /// Title of the entry as read from the input
  pub title:  String,
  /// Which bucket the entry landed in
  pub status: Status,
  /// Extra context: the error text, the unresolved reason or `skipped-existing`
  pub detail: Option<String>,
  /// Where the PDF is, for downloaded entries
  pub path:   Option<PathBuf>,
}

impl Outcome {
  /// A freshly downloaded file.
  pub fn downloaded(title: impl Into<String>, path: PathBuf) -> Self {
    Self { title: title.into(), status: Status::Downloaded, detail: None, path: Some(path) }
  }

  /// A file that was already present and was left alone.
  pub fn skipped(title: impl Into<String>, path: PathBuf) -> Self {
    Self {
      title:  title.into(),
      status: Status::Downloaded,
      detail: Some(SKIPPED_EXISTING.to_string()),
      path:   Some(path),
    }
  }

  /// A download that did not complete.
  pub fn failed(title: impl Into<String>, detail: impl Into<String>) -> Self {
    Self { title: title.into(), status: Status::Failed, detail: Some(detail.into()), path: None }
  }

  /// An entry without a usable link.
  pub fn not_found(title: impl Into<String>, detail: Option<String>) -> Self {
    Self { title: title.into(), status: Status::NotFound, detail, path: None }
  }

  /// Whether the file was already present before this run.
  pub fn is_skipped(&self) -> bool { self.detail.as_deref() == Some(SKIPPED_EXISTING) }

  /// The run log line for this outcome, without the trailing newline.
  ///
  /// Line breaks inside the title or detail are flattened so every outcome stays on one line.
  pub fn log_line(&self) -> String {
    let flatten = |s: &str| s.replace(['\r', '\n'], " ");
    match &self.detail {
      Some(detail) => format!("{}, {}, {}", self.status, flatten(&self.title), flatten(detail)),
      None => format!("{}, {}", self.status, flatten(&self.title)),
    }
  }
}

/// The append-only run log.
#[derive(Debug)]
pub struct RunLog {
  path: PathBuf,
  file: File,
}

impl RunLog {
  /// Creates the log at `path`, truncating anything from a previous run.
  ///
  /// # Errors
  ///
  /// Returns [`PaperfetchError::Config`] if the file cannot be created.
  pub fn create(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent).map_err(|e| {
        PaperfetchError::Config(format!("Failed to create log directory {}: {e}", parent.display()))
      })?;
    }
    let file = File::create(path).map_err(|e| {
      PaperfetchError::Config(format!("Failed to create run log {}: {e}", path.display()))
    })?;
    Ok(Self { path: path.to_path_buf(), file })
  }

  /// Appends one outcome line and flushes it.
  pub fn append(&mut self, outcome: &Outcome) -> Result<()> {
    writeln!(self.file, "{}", outcome.log_line())?;
    self.file.flush()?;
    Ok(())
  }

  /// Where the log is written.
  pub fn path(&self) -> &Path { &self.path }
}

/// Counts of outcomes per status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
  counts: BTreeMap<Status, usize>,
}

impl Summary {
  /// Counts one more outcome with `status`.
  pub fn increment(&mut self, status: Status) { *self.counts.entry(status).or_default() += 1; }

  /// How many outcomes had `status`.
  pub fn count(&self, status: Status) -> usize { self.counts.get(&status).copied().unwrap_or(0) }

  /// Total outcomes counted.
  pub fn total(&self) -> usize { self.counts.values().sum() }
}

impl Display for Summary {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let parts: Vec<String> =
      Status::ALL.iter().map(|status| format!("{status}: {}", self.count(*status))).collect();
    write!(f, "{}", parts.join(", "))
  }
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
  /// One outcome per entry, in input order
  pub outcomes:    Vec<Outcome>,
  /// Counts per status
  pub summary:     Summary,
  /// When the run started
  pub started_at:  DateTime<Utc>,
  /// When the last entry was recorded
  pub finished_at: DateTime<Utc>,
}

impl RunReport {
  /// Starts an empty report now.
  pub fn new() -> Self {
    let now = Utc::now();
    Self { outcomes: Vec::new(), summary: Summary::default(), started_at: now, finished_at: now }
  }

  /// Counts and keeps an outcome.
  pub fn record(&mut self, outcome: Outcome) {
    self.summary.increment(outcome.status);
    self.outcomes.push(outcome);
    self.finished_at = Utc::now();
  }

  /// Outcomes with the given status.
  pub fn with_status(&self, status: Status) -> impl Iterator<Item = &Outcome> {
    self.outcomes.iter().filter(move |o| o.status == status)
  }
}

impl Default for RunReport {
  fn default() -> Self { Self::new() }
}
