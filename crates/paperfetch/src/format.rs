//! Text utilities for titles: whitespace handling, comparison keys, similarity scores and
//! filesystem-safe filenames.
//!
//! # Examples
//!
//! ```
//! use paperfetch::format::{sanitize_filename, title_similarity};
//!
//! assert_eq!(title_similarity("Deep  Beats!", "deep beats"), 1.0);
//! assert_eq!(sanitize_filename("Foo: A Study (2024)", 240), "Foo_A_Study_(2024).pdf");
//! ```

use std::collections::BTreeSet;

/// Default cap on the byte length of a generated filename stem.
pub const DEFAULT_MAX_FILENAME_LEN: usize = 240;

/// Characters that are rejected by at least one common filesystem.
const ILLEGAL_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Collapses every run of whitespace into a single space and trims the ends.
///
/// Case and punctuation are preserved.
pub fn collapse_whitespace(text: &str) -> String {
  text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Builds the comparison key for a title.
///
/// The key is lowercased, stripped of everything that is not alphanumeric or whitespace, and
/// whitespace-collapsed, so `"Deep Beats: A Study"` and `"deep beats a study"` share a key.
pub fn normalize_title(title: &str) -> String {
  let stripped: String = title
    .to_lowercase()
    .chars()
    .filter(|c| c.is_alphanumeric() || c.is_whitespace())
    .collect();
  collapse_whitespace(&stripped)
}

/// Scores how alike two titles are, from `0.0` to `1.0`.
///
/// Both titles are normalized with [`normalize_title`] first. Equal keys score `1.0`. Otherwise
/// the score is the larger of:
///
/// - the token-set overlap (Jaccard index over the sets of words), which tolerates reordered words
/// - the normalized Levenshtein similarity, which tolerates small spelling differences
pub fn title_similarity(a: &str, b: &str) -> f64 {
  let a = normalize_title(a);
  let b = normalize_title(b);

  if a == b {
    return 1.0;
  }
  if a.is_empty() || b.is_empty() {
    return 0.0;
  }

  token_set_overlap(&a, &b).max(strsim::normalized_levenshtein(&a, &b))
}

/// Jaccard index of the word sets of two already normalized strings.
fn token_set_overlap(a: &str, b: &str) -> f64 {
  let a: BTreeSet<&str> = a.split(' ').collect();
  let b: BTreeSet<&str> = b.split(' ').collect();
  let union = a.union(&b).count();
  if union == 0 {
    return 0.0;
  }
  a.intersection(&b).count() as f64 / union as f64
}

/// Turns a paper title into a filename that is safe on Linux, macOS and Windows.
///
/// - Removes `< > : " / \ | ? *` and control characters
/// - Replaces whitespace with `_` and collapses repeated underscores
/// - Trims leading and trailing dots and underscores
/// - Truncates the stem to `max_len` bytes on a char boundary
/// - Falls back to `untitled` for titles with nothing usable left
/// - Appends `.pdf`
pub fn sanitize_filename(title: &str, max_len: usize) -> String {
  let mut stem = String::with_capacity(title.len());
  let mut prev_underscore = false;

  for c in title.chars() {
    if ILLEGAL_FILENAME_CHARS.contains(&c) || (c.is_control() && !c.is_whitespace()) {
      continue;
    }
    let c = if c.is_whitespace() { '_' } else { c };
    if c == '_' {
      if !prev_underscore {
        stem.push('_');
      }
      prev_underscore = true;
    } else {
      stem.push(c);
      prev_underscore = false;
    }
  }

  let trimmed = stem.trim_matches(|c| c == '.' || c == '_');

  let mut take = trimmed.len().min(max_len);
  while take > 0 && !trimmed.is_char_boundary(take) {
    take -= 1;
  }
  let truncated = trimmed[..take].trim_end_matches(|c| c == '.' || c == '_');

  if truncated.is_empty() {
    "untitled.pdf".to_string()
  } else {
    format!("{truncated}.pdf")
  }
}
