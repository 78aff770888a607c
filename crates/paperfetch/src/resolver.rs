//! Turning entries into downloadable links.
//!
//! An [`Entry`] with an explicit URL resolves to that URL verbatim without touching the network.
//! Every other entry costs exactly one search query, issued through a [`Pacer`] so consecutive
//! queries are spaced out. The returned candidates are scored against the entry's title by
//! [`MatchPolicy`]; the best qualifying candidate wins.
//!
//! Resolution never fails: search errors and weak matches both produce an unresolved
//! [`Resolution`] carrying a human-readable reason.

use tokio::time::Instant;

use super::*;
use crate::format::{collapse_whitespace, title_similarity};

/// Minimum similarity for a candidate title to count as a match, unless configured otherwise.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.9;

/// Minimum pause between two consecutive search queries, unless configured otherwise.
pub const DEFAULT_QUERY_PAUSE: Duration = Duration::from_secs(3);

/// Scoring rules for picking a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchPolicy {
  /// Minimum [`title_similarity`] score, between 0 and 1
  pub threshold: f64,
}

impl Default for MatchPolicy {
  fn default() -> Self { Self { threshold: DEFAULT_SIMILARITY_THRESHOLD } }
}

impl MatchPolicy {
  /// Picks the best candidate for `title`.
  ///
  /// Candidates without a PDF link or outside the filters' year range are ignored. Among the
  /// rest, the highest score at or above the threshold wins; ties keep the earlier (higher
  /// ranked) candidate.
  pub fn best_match<'a>(
    &self,
    title: &str,
    candidates: &'a [Candidate],
    filters: &SearchFilters,
  ) -> Option<(&'a Candidate, f64)> {
    let mut best: Option<(&Candidate, f64)> = None;
    for candidate in candidates {
      if candidate.pdf_url.is_none() || !filters.admits_year(candidate.year) {
        trace!("Skipping candidate {:?}", candidate.title);
        continue;
      }
      let score = title_similarity(title, &candidate.title);
      trace!("Candidate {:?} scored {score:.3}", candidate.title);
      if score >= self.threshold && best.map_or(true, |(_, best_score)| score > best_score) {
        best = Some((candidate, score));
      }
    }
    best
  }
}

/// Enforces a minimum delay between consecutive search queries.
#[derive(Debug)]
pub struct Pacer {
  interval: Duration,
  last:     Option<Instant>,
}

impl Pacer {
  /// Creates a pacer; the first call to [`Pacer::wait`] never sleeps.
  pub fn new(interval: Duration) -> Self { Self { interval, last: None } }

  /// Sleeps until `interval` has passed since the previous call returned.
  pub async fn wait(&mut self) {
    if let Some(last) = self.last {
      let elapsed = last.elapsed();
      if elapsed < self.interval {
        tokio::time::sleep(self.interval - elapsed).await;
      }
    }
    self.last = Some(Instant::now());
  }
}

/// The outcome of looking up one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
  /// The entry this resolution belongs to
  pub entry:         Entry,
  /// Whether a downloadable link was found
  pub matched:       bool,
  /// Backend identifier of the matched document
  pub identifier:    Option<String>,
  /// Link to download
  pub pdf_url:       Option<String>,
  /// Title of the matched candidate as the backend reports it
  pub matched_title: Option<String>,
  /// Similarity score of the matched candidate
  pub similarity:    Option<f64>,
  /// Why the entry is unresolved
  pub reason:        Option<String>,
}

impl Resolution {
  /// An entry resolved through its explicit URL override.
  pub fn explicit(entry: Entry, url: String) -> Self {
    Self {
      entry,
      matched: true,
      identifier: None,
      pdf_url: Some(url),
      matched_title: None,
      similarity: None,
      reason: None,
    }
  }

  /// An entry matched to a search candidate.
  pub fn matched(entry: Entry, candidate: &Candidate, similarity: f64) -> Self {
    Self {
      entry,
      matched: true,
      identifier: Some(candidate.identifier.clone()),
      pdf_url: candidate.pdf_url.clone(),
      matched_title: Some(candidate.title.clone()),
      similarity: Some(similarity),
      reason: None,
    }
  }

  /// An entry with no usable link.
  pub fn unresolved(entry: Entry, reason: impl Into<String>) -> Self {
    Self {
      entry,
      matched: false,
      identifier: None,
      pdf_url: None,
      matched_title: None,
      similarity: None,
      reason: Some(reason.into()),
    }
  }
}

/// Resolves entries one at a time against a [`SearchApi`].
pub struct Resolver {
  api:     Box<dyn SearchApi>,
  filters: SearchFilters,
  policy:  MatchPolicy,
  pacer:   Pacer,
}

impl Resolver {
  /// Creates a resolver with the default policy, no filters and the default query pause.
  pub fn new(api: Box<dyn SearchApi>) -> Self {
    Self {
      api,
      filters: SearchFilters::default(),
      policy: MatchPolicy::default(),
      pacer: Pacer::new(DEFAULT_QUERY_PAUSE),
    }
  }

  /// Sets the search filters.
  pub fn with_filters(mut self, filters: SearchFilters) -> Self {
    self.filters = filters;
    self
  }

  /// Sets the match policy.
  pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
    self.policy = policy;
    self
  }

  /// Sets the minimum pause between queries.
  pub fn with_pause(mut self, pause: Duration) -> Self {
    self.pacer = Pacer::new(pause);
    self
  }

  /// Resolves one entry. Never fails; problems become an unresolved [`Resolution`].
  pub async fn resolve(&mut self, entry: Entry) -> Resolution {
    if let Some(url) = entry.explicit_url.clone() {
      debug!("Using explicit URL for {:?}: {url}", entry.title);
      return Resolution::explicit(entry, url);
    }

    let title = collapse_whitespace(&entry.title);
    self.pacer.wait().await;

    let candidates = match self.api.query(&title, &self.filters).await {
      Ok(candidates) => candidates,
      Err(e) => {
        warn!("Search failed for {title:?}: {e}");
        return Resolution::unresolved(entry, format!("search failed: {e}"));
      },
    };

    match self.policy.best_match(&title, &candidates, &self.filters) {
      Some((candidate, score)) => {
        debug!("Matched {title:?} to {:?} ({score:.2})", candidate.title);
        Resolution::matched(entry, candidate, score)
      },
      None => {
        let reason = if candidates.is_empty() {
          "no search results".to_string()
        } else {
          format!(
            "no match among {} results at similarity >= {:.2}",
            candidates.len(),
            self.policy.threshold
          )
        };
        debug!("No match for {title:?}: {reason}");
        Resolution::unresolved(entry, reason)
      },
    }
  }
}
