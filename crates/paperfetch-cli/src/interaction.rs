//! Terminal output for a run.

use std::io::Write;

use console::style;
use paperfetch::record::Summary;

use super::*;

/// Prefix for information messages
pub static INFO_PREFIX: &str = "ℹ ";
/// Prefix for downloaded entries
pub static SUCCESS_PREFIX: &str = "✓ ";
/// Prefix for entries whose file was already present
pub static SKIPPED_PREFIX: &str = "» ";
/// Prefix for failed entries and fatal errors
pub static ERROR_PREFIX: &str = "✗ ";
/// Prefix for entries that were not found
pub static WARNING_PREFIX: &str = "! ";

/// Something to show the user.
#[derive(Debug)]
pub enum ResponseContent<'a> {
  /// The result for one entry
  Outcome(&'a Outcome),
  /// The final counts
  Summary(&'a Summary),
  /// A neutral status message
  Info(&'a str),
  /// A fatal problem
  Error(&'a PaperfetchCliError),
}

/// How the CLI talks to the user.
pub trait UserInteraction {
  /// Shows `content`.
  fn reply(&self, content: ResponseContent) -> Result<()>;
}

/// Styled output on stdout, errors on stderr.
#[derive(Debug, Default)]
pub struct Terminal;

impl UserInteraction for Terminal {
  fn reply(&self, content: ResponseContent) -> Result<()> {
    let mut out = std::io::stdout().lock();
    match content {
      ResponseContent::Outcome(outcome) => {
        let prefix = match outcome.status {
          Status::Downloaded if outcome.is_skipped() => style(SKIPPED_PREFIX).cyan(),
          Status::Downloaded => style(SUCCESS_PREFIX).green(),
          Status::Failed => style(ERROR_PREFIX).red(),
          Status::NotFound => style(WARNING_PREFIX).yellow(),
        };
        match &outcome.detail {
          Some(detail) =>
            writeln!(out, "{prefix}{} {}", style(&outcome.title).bold(), style(detail).dim())?,
          None => writeln!(out, "{prefix}{}", style(&outcome.title).bold())?,
        }
      },
      ResponseContent::Summary(summary) => {
        writeln!(out)?;
        writeln!(out, "{}Summary", style(INFO_PREFIX).blue())?;
        for status in Status::ALL {
          let count = style(summary.count(status));
          let count = match status {
            Status::Downloaded => count.green(),
            Status::Failed => count.red(),
            Status::NotFound => count.yellow(),
          };
          writeln!(out, "  {status}: {count}")?;
        }
      },
      ResponseContent::Info(message) => writeln!(out, "{}{message}", style(INFO_PREFIX).blue())?,
      ResponseContent::Error(error) =>
        eprintln!("{}{}", style(ERROR_PREFIX).red(), style(error).red()),
    }
    Ok(())
  }
}
