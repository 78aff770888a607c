//! Title search against bibliographic APIs.
//!
//! The rest of the crate only depends on the narrow [`SearchApi`] capability: given a title and
//! some [`SearchFilters`], return an ordered list of [`Candidate`]s. Tests substitute a
//! deterministic fake; production runs use a [`Retriever`], which is driven entirely by a
//! [`RetrieverConfig`] loaded from TOML.
//!
//! # Configuration
//!
//! A retriever configuration describes how to build the search URL and how to map each result
//! entry in the response onto a [`Candidate`]:
//!
//! ```toml
//! name = "arxiv"
//! source = "arxiv"
//! search_template = "http://export.arxiv.org/api/query?search_query={query}&max_results={max_results}"
//! query_template = "{title}"
//! category_template = "cat:{category}"
//! date_template = "submittedDate:[{from}01010000 TO {to}12312359]"
//!
//! [response_format]
//! type = "xml"
//! strip_namespaces = true
//! entry_path = "feed/entry"
//!
//! [field_maps]
//! title = { path = "title" }
//! identifier = { path = "id", transform = { type = "replace", pattern = "^https?://arxiv\\.org/abs/", replacement = "" } }
//! pdf_url = { path = "id", transform = { type = "replace", pattern = "/abs/", replacement = "/pdf/" } }
//! published = { path = "published" }
//! ```
//!
//! The built-in configurations live in [`ARXIV_CONFIG`] and [`CROSSREF_CONFIG`].
//!
//! # Examples
//!
//! ```no_run
//! use paperfetch::{
//!   client,
//!   retriever::{Retriever, RetrieverConfig, SearchApi, SearchFilters},
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = client::build_client(std::time::Duration::from_secs(30))?;
//! let retriever = Retriever::new(RetrieverConfig::arxiv()?, client);
//!
//! let candidates = retriever.query("Attention Is All You Need", &SearchFilters::default()).await?;
//! for candidate in candidates {
//!   println!("{} ({})", candidate.title, candidate.identifier);
//! }
//! # Ok(())
//! # }
//! ```

use crate::format::collapse_whitespace;

use super::*;

mod json;
mod xml;

pub use json::JsonConfig;
pub use xml::XmlConfig;

/// Built-in configuration for the arXiv export API (Atom/XML).
pub const ARXIV_CONFIG: &str = include_str!("../../config/retrievers/arxiv.toml");

/// Built-in configuration for the Crossref works API (JSON).
pub const CROSSREF_CONFIG: &str = include_str!("../../config/retrievers/crossref.toml");

/// Number of results requested per query unless configured otherwise.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Field maps every retriever configuration has to provide.
const REQUIRED_FIELDS: [&str; 3] = ["title", "identifier", "pdf_url"];

/// The search capability the resolver depends on.
///
/// Implementations return candidates in the backend's ranking order, best first.
#[async_trait]
pub trait SearchApi: Send + Sync {
  /// Searches for documents matching `title`, narrowed by `filters` where the backend supports it.
  async fn query(&self, title: &str, filters: &SearchFilters) -> Result<Vec<Candidate>>;
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
  /// Title as reported by the backend, whitespace-collapsed
  pub title:      String,
  /// Stable identifier in the backend (arXiv id, DOI, ...)
  pub identifier: String,
  /// Direct link to the PDF, if the backend has one
  pub pdf_url:    Option<String>,
  /// Publication year, if the backend reports it
  pub year:       Option<i32>,
}

impl Candidate {
  /// Creates a candidate with no PDF link and no year.
  pub fn new(title: impl Into<String>, identifier: impl Into<String>) -> Self {
    Self { title: title.into(), identifier: identifier.into(), pdf_url: None, year: None }
  }

  /// Sets the PDF link.
  pub fn with_pdf_url(mut self, pdf_url: impl Into<String>) -> Self {
    self.pdf_url = Some(pdf_url.into());
    self
  }

  /// Sets the publication year.
  pub fn with_year(mut self, year: i32) -> Self {
    self.year = Some(year);
    self
  }
}

/// Restrictions applied to a search to cut down on false positives.
///
/// Categories are only sent to backends whose configuration has a `category_template`. The year
/// range is sent when the backend has a `date_template`, and is always checked against the
/// `year` of returned candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
  /// Subject categories, any of which may match (e.g. `cs.SD`, `eess.AS`)
  pub categories: Vec<String>,
  /// Earliest accepted publication year
  pub min_year:   Option<i32>,
  /// Latest accepted publication year
  pub max_year:   Option<i32>,
}

impl SearchFilters {
  /// Whether a candidate published in `year` passes the year range.
  ///
  /// Candidates with no known year always pass.
  pub fn admits_year(&self, year: Option<i32>) -> bool {
    let Some(year) = year else { return true };
    self.min_year.map_or(true, |min| year >= min) && self.max_year.map_or(true, |max| year <= max)
  }
}

/// Configuration for one search backend.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrieverConfig {
  /// Name of this retriever configuration
  pub name:              String,
  /// Source label attached to results from this backend
  pub source:            String,
  /// Search URL with `{query}` and `{max_results}` placeholders
  pub search_template:   String,
  /// How the title becomes the query text, with a `{title}` placeholder
  #[serde(default = "default_query_template")]
  pub query_template:    String,
  /// Query clause for one category, with a `{category}` placeholder
  #[serde(default)]
  pub category_template: Option<String>,
  /// Query clause for a year range, with `{from}` and `{to}` placeholders
  #[serde(default)]
  pub date_template:     Option<String>,
  /// Format and parsing configuration for search responses
  pub response_format:   ResponseFormat,
  /// How to build candidate fields from a response entry
  pub field_maps:        BTreeMap<String, FieldMap>,
  /// Optional HTTP headers for search requests
  #[serde(default)]
  pub headers:           BTreeMap<String, String>,
}

/// Available response format handlers.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ResponseFormat {
  /// XML response parser configuration
  #[serde(rename = "xml")]
  Xml(XmlConfig),
  /// JSON response parser configuration
  #[serde(rename = "json")]
  Json(JsonConfig),
}

/// Field mapping configuration.
///
/// ```toml
/// [field_maps.pdf_url]
/// path = "id"
/// transform = { type = "replace", pattern = "/abs/", replacement = "/pdf/" }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct FieldMap {
  /// Path to the field inside one response entry, `/`-separated
  pub path:      String,
  /// Optional transformation to apply to the extracted value
  #[serde(default)]
  pub transform: Option<Transform>,
}

/// Available field value transformations.
///
/// ```toml
/// # Clean up whitespace
/// transform = { type = "replace", pattern = "\\s+", replacement = " " }
///
/// # Convert date format
/// transform = { type = "date", from_format = "%Y-%m-%dT%H:%M:%SZ", to_format = "%Y" }
///
/// # Construct full URL
/// transform = { type = "url", base = "https://arxiv.org/pdf/{value}", suffix = ".pdf" }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Transform {
  /// Replace text using regex pattern
  Replace {
    /// Regular expression pattern to match
    pattern:     String,
    /// Text to replace matched patterns with
    replacement: String,
  },
  /// Convert between date formats
  Date {
    /// Source date format string using chrono syntax (e.g., "%Y-%m-%d")
    from_format: String,
    /// Target date format string using chrono syntax (e.g., "%Y")
    to_format:   String,
  },
  /// Construct URL from parts
  Url {
    /// Base URL template, may contain {value} placeholder
    base:   String,
    /// Optional suffix to append to the URL (e.g., ".pdf")
    suffix: Option<String>,
  },
}

/// Turns a raw search response into candidates.
///
/// Implemented once per [`ResponseFormat`] so the retriever can stay format-agnostic.
pub trait ResponseProcessor: Send + Sync {
  /// Parses `data` and maps every result entry through `field_maps`.
  ///
  /// Entries without a title or identifier are dropped. A response that cannot be parsed at all
  /// is a [`PaperfetchError::Resolution`].
  fn process_response(
    &self,
    data: &[u8],
    field_maps: &BTreeMap<String, FieldMap>,
  ) -> Result<Vec<Candidate>>;
}

fn default_query_template() -> String { "{title}".to_string() }

impl RetrieverConfig {
  /// Parses and validates a configuration from a TOML string.
  ///
  /// # Errors
  ///
  /// Returns [`PaperfetchError::Config`] if the TOML is invalid or a required field map
  /// (`title`, `identifier`, `pdf_url`) is missing.
  pub fn from_toml_str(toml_str: &str) -> Result<Self> {
    let config: RetrieverConfig = toml::from_str(toml_str)
      .map_err(|e| PaperfetchError::Config(format!("Invalid retriever configuration: {e}")))?;
    config.validate()?;
    Ok(config)
  }

  /// Reads a configuration from a TOML file.
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
      PaperfetchError::Config(format!("Failed to read retriever config {}: {e}", path.display()))
    })?;
    Self::from_toml_str(&content)
  }

  /// The built-in arXiv configuration.
  pub fn arxiv() -> Result<Self> { Self::from_toml_str(ARXIV_CONFIG) }

  /// The built-in Crossref configuration.
  pub fn crossref() -> Result<Self> { Self::from_toml_str(CROSSREF_CONFIG) }

  fn validate(&self) -> Result<()> {
    let missing: Vec<&str> =
      REQUIRED_FIELDS.iter().copied().filter(|f| !self.field_maps.contains_key(*f)).collect();
    if !missing.is_empty() {
      return Err(PaperfetchError::Config(format!(
        "Retriever {} is missing field maps: {}",
        self.name,
        missing.join(", ")
      )));
    }
    Ok(())
  }

  /// Builds the backend query text for a title.
  ///
  /// Colons and hyphens are replaced with spaces since most search syntaxes treat them as
  /// operators. Category and date clauses are AND-ed on when the backend supports them.
  pub fn build_query(&self, title: &str, filters: &SearchFilters) -> String {
    let cleaned = collapse_whitespace(&title.replace([':', '-'], " "));
    let mut clauses = vec![self.query_template.replace("{title}", &cleaned)];

    if let Some(template) = &self.category_template {
      if !filters.categories.is_empty() {
        let categories: Vec<String> =
          filters.categories.iter().map(|c| template.replace("{category}", c)).collect();
        clauses.push(if categories.len() == 1 {
          categories.join("")
        } else {
          format!("({})", categories.join(" OR "))
        });
      }
    }

    if let Some(template) = &self.date_template {
      if filters.min_year.is_some() || filters.max_year.is_some() {
        let from = filters.min_year.unwrap_or(1900).to_string();
        let to = filters.max_year.unwrap_or(9999).to_string();
        clauses.push(template.replace("{from}", &from).replace("{to}", &to));
      }
    }

    clauses.join(" AND ")
  }

  /// Substitutes the URL-encoded query and the result limit into the search template.
  pub fn search_url(&self, query: &str, max_results: usize) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    self
      .search_template
      .replace("{query}", &encoded)
      .replace("{max_results}", &max_results.to_string())
  }

  /// The processor for this configuration's response format.
  fn processor(&self) -> &dyn ResponseProcessor {
    match &self.response_format {
      ResponseFormat::Xml(config) => config as &dyn ResponseProcessor,
      ResponseFormat::Json(config) => config as &dyn ResponseProcessor,
    }
  }
}

/// A [`SearchApi`] backed by an HTTP search endpoint described by a [`RetrieverConfig`].
#[derive(Debug, Clone)]
pub struct Retriever {
  /// The backend description
  config:      RetrieverConfig,
  /// Shared HTTP client (carries the timeout and user agent)
  client:      reqwest::Client,
  /// Results requested per query
  max_results: usize,
}

impl Retriever {
  /// Creates a retriever requesting [`DEFAULT_MAX_RESULTS`] results per query.
  pub fn new(config: RetrieverConfig, client: reqwest::Client) -> Self {
    Self { config, client, max_results: DEFAULT_MAX_RESULTS }
  }

  /// Sets the number of results requested per query.
  pub fn with_max_results(mut self, max_results: usize) -> Self {
    self.max_results = max_results.max(1);
    self
  }

  /// Builds the retriever described by a run [`Config`].
  ///
  /// Uses the retriever file named in the configuration, or the built-in arXiv backend.
  pub fn from_config(config: &Config) -> Result<Self> {
    let retriever_config = match &config.retriever {
      Some(path) => RetrieverConfig::from_file(path)?,
      None => RetrieverConfig::arxiv()?,
    };
    let client = client::build_client(config.timeout())?;
    Ok(Self::new(retriever_config, client).with_max_results(config.max_results))
  }

  /// The backend description in use.
  pub fn config(&self) -> &RetrieverConfig { &self.config }
}

#[async_trait]
impl SearchApi for Retriever {
  async fn query(&self, title: &str, filters: &SearchFilters) -> Result<Vec<Candidate>> {
    let query = self.config.build_query(title, filters);
    let url = self.config.search_url(&query, self.max_results);

    debug!("Searching {} via: {}", self.config.name, url);

    let mut request = self.client.get(&url);
    for (key, value) in &self.config.headers {
      request = request.header(key, value);
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
      return Err(PaperfetchError::Resolution(format!(
        "{} search returned HTTP {status}",
        self.config.name
      )));
    }
    let data = response.bytes().await?;

    trace!("{} response: {}", self.config.name, String::from_utf8_lossy(&data));

    let candidates = self.config.processor().process_response(&data, &self.config.field_maps)?;
    debug!("{} returned {} candidates for {:?}", self.config.name, candidates.len(), title);
    Ok(candidates)
  }
}

/// Builds a candidate from one response entry.
///
/// `lookup` resolves a field path inside the entry. Returns `None` when the entry has no title
/// or identifier.
fn build_candidate(
  field_maps: &BTreeMap<String, FieldMap>,
  lookup: impl Fn(&str) -> Option<String>,
) -> Option<Candidate> {
  let field = |name: &str| -> Option<String> {
    let map = field_maps.get(name)?;
    let value = lookup(&map.path)?;
    match &map.transform {
      Some(transform) => apply_transform(&value, transform)
        .map_err(|e| warn!("Dropping field {name}: {e}"))
        .ok(),
      None => Some(value),
    }
  };

  let title = collapse_whitespace(&field("title")?);
  let identifier = field("identifier")?;
  if title.is_empty() || identifier.is_empty() {
    return None;
  }

  Some(Candidate {
    title,
    identifier,
    pdf_url: field("pdf_url").filter(|url| !url.is_empty()),
    year: field("published").and_then(|published| parse_year(&published)),
  })
}

/// Reads a leading four-digit year out of a date-ish string (`2023-01-15T10:00:00Z`, `2023`).
fn parse_year(value: &str) -> Option<i32> {
  let digits: String = value.trim().chars().take(4).collect();
  if digits.len() == 4 && digits.chars().all(|c| c.is_ascii_digit()) {
    digits.parse().ok()
  } else {
    None
  }
}

/// Applies a transformation to a string value based on the transform type.
///
/// # Errors
///
/// Returns a [`PaperfetchError::Resolution`] if the regex pattern is invalid or the date does not
/// parse with the configured format.
fn apply_transform(value: &str, transform: &Transform) -> Result<String> {
  match transform {
    Transform::Replace { pattern, replacement } => Regex::new(pattern)
      .map_err(|e| PaperfetchError::Resolution(format!("Invalid regex: {e}")))
      .map(|re| re.replace_all(value, replacement.as_str()).into_owned()),
    Transform::Date { from_format, to_format } =>
      chrono::NaiveDateTime::parse_from_str(value, from_format)
        .map(|dt| dt.format(to_format).to_string())
        .or_else(|_| {
          chrono::NaiveDate::parse_from_str(value, from_format)
            .map(|d| d.format(to_format).to_string())
        })
        .map_err(|e| PaperfetchError::Resolution(format!("Invalid date: {e}"))),
    Transform::Url { base, suffix } =>
      Ok(format!("{}{}", base.replace("{value}", value), suffix.as_deref().unwrap_or(""))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_builtin_configs_parse() {
    let arxiv = RetrieverConfig::arxiv().unwrap();
    assert_eq!(arxiv.name, "arxiv");
    assert!(matches!(arxiv.response_format, ResponseFormat::Xml(_)));

    let crossref = RetrieverConfig::crossref().unwrap();
    assert_eq!(crossref.name, "crossref");
    assert!(matches!(crossref.response_format, ResponseFormat::Json(_)));
  }

  #[test]
  fn test_missing_field_map_is_rejected() {
    let toml = r#"
      name = "broken"
      source = "broken"
      search_template = "http://localhost/?q={query}"

      [response_format]
      type = "json"
      entries_path = "items"

      [field_maps]
      title = { path = "title" }
    "#;
    match RetrieverConfig::from_toml_str(toml) {
      Err(PaperfetchError::Config(msg)) => {
        assert!(msg.contains("identifier"));
        assert!(msg.contains("pdf_url"));
      },
      other => panic!("expected config error, got {other:?}"),
    }
  }

  #[test]
  fn test_build_query_plain_title() {
    let config = RetrieverConfig::arxiv().unwrap();
    let query = config.build_query("Deep-Beats:  A Study", &SearchFilters::default());
    assert_eq!(query, "Deep Beats A Study");
  }

  #[test]
  fn test_build_query_with_filters() {
    let config = RetrieverConfig::arxiv().unwrap();
    let filters = SearchFilters {
      categories: vec!["cs.SD".into(), "eess.AS".into()],
      min_year:   Some(2020),
      max_year:   None,
    };
    let query = config.build_query("Deep Beats", &filters);
    assert_eq!(
      query,
      "Deep Beats AND (cat:cs.SD OR cat:eess.AS) AND submittedDate:[202001010000 TO 999912312359]"
    );
  }

  #[test]
  fn test_backend_without_templates_ignores_filters() {
    let config = RetrieverConfig::crossref().unwrap();
    let filters =
      SearchFilters { categories: vec!["cs.SD".into()], min_year: Some(2020), max_year: None };
    assert_eq!(config.build_query("Deep Beats", &filters), "Deep Beats");
  }

  #[test]
  fn test_search_url_encodes_query() {
    let config = RetrieverConfig::arxiv().unwrap();
    let url = config.search_url("Deep Beats AND cat:cs.SD", 5);
    assert!(url.contains("search_query=Deep+Beats+AND+cat%3Acs.SD"));
    assert!(url.contains("max_results=5"));
  }

  #[test]
  fn test_admits_year() {
    let filters = SearchFilters { categories: vec![], min_year: Some(2019), max_year: Some(2021) };
    assert!(filters.admits_year(None));
    assert!(filters.admits_year(Some(2020)));
    assert!(!filters.admits_year(Some(2018)));
    assert!(!filters.admits_year(Some(2022)));
  }

  #[test]
  fn test_apply_transforms() {
    let replace = Transform::Replace { pattern: "/abs/".into(), replacement: "/pdf/".into() };
    assert_eq!(
      apply_transform("http://arxiv.org/abs/2301.12345v1", &replace).unwrap(),
      "http://arxiv.org/pdf/2301.12345v1"
    );

    let date = Transform::Date { from_format: "%Y-%m-%dT%H:%M:%SZ".into(), to_format: "%Y".into() };
    assert_eq!(apply_transform("2023-01-15T10:00:00Z", &date).unwrap(), "2023");
    assert!(apply_transform("yesterday", &date).is_err());

    let url = Transform::Url { base: "https://arxiv.org/pdf/{value}".into(), suffix: Some(".pdf".into()) };
    assert_eq!(apply_transform("2301.12345", &url).unwrap(), "https://arxiv.org/pdf/2301.12345.pdf");
  }

  #[test]
  fn test_from_config_uses_result_limit() {
    let retriever = Retriever::from_config(&Config::default().with_max_results(3)).unwrap();
    assert_eq!(retriever.max_results, 3);
    assert_eq!(retriever.config().name, "arxiv");
  }

  #[test]
  fn test_parse_year() {
    assert_eq!(parse_year("2023-01-15T10:00:00Z"), Some(2023));
    assert_eq!(parse_year("1999"), Some(1999));
    assert_eq!(parse_year("n/a"), None);
  }
}
