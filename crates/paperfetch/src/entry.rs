//! Loading the curated title list.
//!
//! The input is a plain text file with one paper per line, usually pasted from a conference
//! program page. Lines may be tab-separated table rows, in which case the first column is the
//! title. A contributor can embed a direct `http(s)://` or `www.` link anywhere on the line to
//! bypass the search step for that paper. Scheme-less `www.` links are fetched over `https`.
//!
//! ```text
//! Paper Title	Authors
//! Deep Beats	A. Author, B. Author
//! Totally Obscure Talk https://example.org/obscure.pdf
//! ```
//!
//! The header row and blank lines are skipped; everything else becomes an [`Entry`] in input
//! order.

use super::*;
use crate::format::collapse_whitespace;

lazy_static! {
  /// Matches an embedded `http://`, `https://` or scheme-less `www.` link.
  static ref URL_PATTERN: Regex =
    Regex::new(r#"https?://[^\s<>"]+|\bwww\.[^\s<>".]+\.[^\s<>"]+"#).unwrap();
}

/// Marker for the header row of a pasted program table.
const HEADER_MARKER: &str = "Paper Title";

/// Sentence punctuation that is never the last character of a link.
const URL_TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?'];

/// One paper from the title list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
  /// The line exactly as it appeared in the input file
  pub raw_line:     String,
  /// The whitespace-collapsed title, case preserved
  pub title:        String,
  /// A contributor-supplied link that bypasses search
  pub explicit_url: Option<String>,
}

impl Entry {
  /// Parses a single input line.
  ///
  /// Returns `None` for blank lines and for the table header row.
  ///
  /// # Examples
  ///
  /// ```
  /// use paperfetch::entry::Entry;
  ///
  /// let entry = Entry::parse("Deep Beats https://example.org/deepbeats.pdf").unwrap();
  /// assert_eq!(entry.title, "Deep Beats");
  /// assert_eq!(entry.explicit_url.as_deref(), Some("https://example.org/deepbeats.pdf"));
  ///
  /// assert!(Entry::parse("   ").is_none());
  /// ```
  pub fn parse(line: &str) -> Option<Self> {
    if line.trim().is_empty() || line.contains(HEADER_MARKER) {
      return None;
    }

    let explicit_url = URL_PATTERN.find(line).map(|m| with_scheme(trim_url(m.as_str())));

    let first_column = line.split('\t').next().unwrap_or(line);
    let mut title = collapse_whitespace(&URL_PATTERN.replace_all(first_column, " "));
    if title.is_empty() {
      title = collapse_whitespace(&URL_PATTERN.replace_all(line, " "));
    }
    if title.is_empty() {
      title = explicit_url.clone().unwrap_or_default();
    }

    Some(Self { raw_line: line.to_string(), title, explicit_url })
  }

  /// Whether this entry skips the search step.
  pub fn has_explicit_url(&self) -> bool { self.explicit_url.is_some() }
}

/// Strips punctuation that follows a link in running text.
///
/// A closing `)` or `]` is kept while it balances an opening one inside the link, so
/// `https://en.wikipedia.org/wiki/Foo_(bar)` survives intact.
fn trim_url(url: &str) -> &str {
  let mut url = url;
  loop {
    let trimmed = url.trim_end_matches(URL_TRAILING_PUNCTUATION);
    let trimmed = match trimmed.chars().last() {
      Some(')') if trimmed.matches(')').count() > trimmed.matches('(').count() =>
        &trimmed[..trimmed.len() - 1],
      Some(']') if trimmed.matches(']').count() > trimmed.matches('[').count() =>
        &trimmed[..trimmed.len() - 1],
      _ => trimmed,
    };
    if trimmed.len() == url.len() {
      return url;
    }
    url = trimmed;
  }
}

fn with_scheme(url: &str) -> String {
  if url.starts_with("http://") || url.starts_with("https://") {
    url.to_string()
  } else {
    format!("https://{url}")
  }
}

/// Parses the full contents of a title list, preserving input order.
pub fn parse_entries(text: &str) -> Vec<Entry> { text.lines().filter_map(Entry::parse).collect() }

/// Reads and parses the title list at `path`.
///
/// # Errors
///
/// Returns [`PaperfetchError::Config`] if the file is missing or unreadable. The run cannot
/// proceed without it.
pub fn load_entries(path: impl AsRef<Path>) -> Result<Vec<Entry>> {
  let path = path.as_ref();
  let text = std::fs::read_to_string(path).map_err(|e| {
    PaperfetchError::Config(format!("Failed to read title list {}: {e}", path.display()))
  })?;
  let entries = parse_entries(&text);
  debug!("Loaded {} entries from {}", entries.len(), path.display());
  Ok(entries)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_bare_title() {
    let entry = Entry::parse("  Deep   Beats ").unwrap();
    assert_eq!(entry.title, "Deep Beats");
    assert_eq!(entry.raw_line, "  Deep   Beats ");
    assert!(!entry.has_explicit_url());
  }

  #[test]
  fn test_title_with_url_override() {
    let entry = Entry::parse("Foo: A Study (2024) https://example.org/foo.pdf").unwrap();
    assert_eq!(entry.title, "Foo: A Study (2024)");
    assert_eq!(entry.explicit_url.as_deref(), Some("https://example.org/foo.pdf"));
  }

  #[test]
  fn test_url_trailing_punctuation_is_dropped() {
    let entry = Entry::parse("Some Talk, see http://example.org/talk.pdf.").unwrap();
    assert_eq!(entry.explicit_url.as_deref(), Some("http://example.org/talk.pdf"));
    assert_eq!(entry.title, "Some Talk, see");
  }

  #[test]
  fn test_www_link_override() {
    let entry = Entry::parse("Deep Beats www.example.org/deepbeats.pdf").unwrap();
    assert_eq!(entry.title, "Deep Beats");
    assert_eq!(entry.explicit_url.as_deref(), Some("https://www.example.org/deepbeats.pdf"));

    let entry = Entry::parse("Deep Beats (see www.example.org/deepbeats.pdf).").unwrap();
    assert_eq!(entry.title, "Deep Beats (see");
    assert_eq!(entry.explicit_url.as_deref(), Some("https://www.example.org/deepbeats.pdf"));
  }

  #[test]
  fn test_www_word_without_domain_is_title_text() {
    let entry = Entry::parse("Why the www. Prefix Persists").unwrap();
    assert_eq!(entry.title, "Why the www. Prefix Persists");
    assert!(!entry.has_explicit_url());
  }

  #[test]
  fn test_balanced_parentheses_stay_in_url() {
    let entry = Entry::parse("Foo https://en.wikipedia.org/wiki/Foo_(bar)").unwrap();
    assert_eq!(entry.explicit_url.as_deref(), Some("https://en.wikipedia.org/wiki/Foo_(bar)"));
    assert_eq!(entry.title, "Foo");

    let entry = Entry::parse("Bar (https://example.org/bar.pdf)").unwrap();
    assert_eq!(entry.explicit_url.as_deref(), Some("https://example.org/bar.pdf"));

    let entry = Entry::parse("Baz [https://example.org/a_(b).pdf].").unwrap();
    assert_eq!(entry.explicit_url.as_deref(), Some("https://example.org/a_(b).pdf"));
  }

  #[test]
  fn test_tab_separated_row_uses_first_column() {
    let entry = Entry::parse("Deep Beats\tA. Author, B. Author\thttps://example.org/d.pdf").unwrap();
    assert_eq!(entry.title, "Deep Beats");
    assert_eq!(entry.explicit_url.as_deref(), Some("https://example.org/d.pdf"));
  }

  #[test]
  fn test_url_only_line_uses_url_as_title() {
    let entry = Entry::parse("https://example.org/only.pdf").unwrap();
    assert_eq!(entry.title, "https://example.org/only.pdf");
    assert_eq!(entry.explicit_url.as_deref(), Some("https://example.org/only.pdf"));
  }

  #[test]
  fn test_header_and_blank_lines_are_skipped() {
    let text = "Paper Title\tAuthors\n\nDeep Beats\n   \nDeep Beats\nTotally Obscure Talk\n";
    let entries = parse_entries(text);
    let titles: Vec<_> = entries.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Deep Beats", "Deep Beats", "Totally Obscure Talk"]);
  }

  #[traced_test]
  #[test]
  fn test_load_entries_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("papers.txt");
    std::fs::write(&path, "Deep Beats\r\nTotally Obscure Talk\r\n").unwrap();

    let entries = load_entries(&path).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].title, "Deep Beats");
    assert_eq!(entries[1].title, "Totally Obscure Talk");
  }

  #[test]
  fn test_missing_file_is_config_error() {
    let dir = tempdir().unwrap();
    let result = load_entries(dir.path().join("missing.txt"));
    assert!(matches!(result, Err(PaperfetchError::Config(_))));
  }
}
