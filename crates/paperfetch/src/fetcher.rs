//! Downloading resolved PDFs into the output directory.
//!
//! Downloads are atomic from the point of view of the output directory: the body is streamed into
//! `<target>.part` and only renamed onto `<target>` once the whole body has arrived. A failed
//! download never leaves a file behind, and a target that already exists with content is never
//! fetched again.
//!
//! Distinct titles that sanitize to the same filename get numbered names (`Stem_2.pdf`,
//! `Stem_3.pdf`, ...) in the order they are fetched, so neither is mistaken for the other.

use std::collections::HashMap;

use tokio::io::AsyncWriteExt;

use super::*;
use crate::format::{collapse_whitespace, sanitize_filename};

/// Extension of in-progress downloads.
const PARTIAL_EXTENSION: &str = "part";

/// Suffix of the partial files this fetcher writes, and the only ones [`Fetcher::prepare`] removes.
const PARTIAL_PDF_SUFFIX: &str = ".pdf.part";

/// Writes PDFs for resolved entries.
#[derive(Debug, Clone)]
pub struct Fetcher {
  client:                   reqwest::Client,
  output_dir:               PathBuf,
  max_filename_len:         usize,
  require_pdf_content_type: bool,
  /// Target paths handed out this run, keyed to the title that owns them
  claimed:                  HashMap<PathBuf, String>,
}

impl Fetcher {
  /// Creates a fetcher writing into `output_dir`.
  pub fn new(client: reqwest::Client, output_dir: impl Into<PathBuf>) -> Self {
    Self {
      client,
      output_dir: output_dir.into(),
      max_filename_len: format::DEFAULT_MAX_FILENAME_LEN,
      require_pdf_content_type: true,
      claimed: HashMap::new(),
    }
  }

  /// Builds a fetcher from the run configuration.
  pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
    Self::new(client, &config.output_dir)
      .with_max_filename_len(config.max_filename_len)
      .with_pdf_content_type_check(config.require_pdf_content_type)
  }

  /// Sets the byte cap on filename stems.
  pub fn with_max_filename_len(mut self, max_len: usize) -> Self {
    self.max_filename_len = max_len.max(1);
    self
  }

  /// Turns the `Content-Type` check on or off.
  pub fn with_pdf_content_type_check(mut self, enabled: bool) -> Self {
    self.require_pdf_content_type = enabled;
    self
  }

  /// The output directory.
  pub fn output_dir(&self) -> &Path { &self.output_dir }

  /// Creates the output directory and removes `*.pdf.part` files left by an interrupted run.
  ///
  /// Other files are left alone, including `.part` files that do not belong to a PDF.
  ///
  /// # Errors
  ///
  /// Returns [`PaperfetchError::Config`] if the directory cannot be created or listed.
  pub fn prepare(&self) -> Result<()> {
    std::fs::create_dir_all(&self.output_dir).map_err(|e| {
      PaperfetchError::Config(format!(
        "Failed to create output directory {}: {e}",
        self.output_dir.display()
      ))
    })?;

    let entries = std::fs::read_dir(&self.output_dir).map_err(|e| {
      PaperfetchError::Config(format!(
        "Failed to read output directory {}: {e}",
        self.output_dir.display()
      ))
    })?;
    for entry in entries.flatten() {
      let path = entry.path();
      if is_partial_pdf(&path) && path.is_file() {
        debug!("Removing stale partial download {}", path.display());
        if let Err(e) = std::fs::remove_file(&path) {
          warn!("Could not remove {}: {e}", path.display());
        }
      }
    }
    Ok(())
  }

  /// Where the PDF for `title` goes, ignoring collisions with other titles.
  pub fn target_path(&self, title: &str) -> PathBuf {
    self.output_dir.join(sanitize_filename(title, self.max_filename_len))
  }

  /// Reserves a target path for `title` for the rest of the run.
  ///
  /// A title keeps the path it claimed first. A different title whose filename collides gets the
  /// first free numbered variant.
  fn claim_target(&mut self, title: &str) -> PathBuf {
    let owner = collapse_whitespace(title);
    let base = self.target_path(title);
    let stem = base.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();

    let mut candidate = base.clone();
    let mut n = 1;
    loop {
      match self.claimed.get(&candidate) {
        None => {
          self.claimed.insert(candidate.clone(), owner);
          return candidate;
        },
        Some(existing) if *existing == owner => return candidate,
        Some(existing) => {
          n += 1;
          trace!("{} is taken by {existing:?}, trying suffix {n}", candidate.display());
          candidate = base.with_file_name(format!("{stem}_{n}.pdf"));
        },
      }
    }
  }

  /// Turns a resolution into an outcome, downloading if needed.
  ///
  /// Unresolved entries become `not_found` and existing non-empty targets are reported as
  /// `skipped-existing`; neither touches the network. Download errors become `failed`.
  pub async fn fetch(&mut self, resolution: &Resolution) -> Outcome {
    let title = resolution.entry.title.clone();

    let Some(url) = resolution.pdf_url.as_deref().filter(|_| resolution.matched) else {
      return Outcome::not_found(title, resolution.reason.clone());
    };

    let target = self.claim_target(&title);
    if is_non_empty_file(&target) {
      debug!("{} already exists, skipping", target.display());
      return Outcome::skipped(title, target);
    }

    match self.download(url, &target).await {
      Ok(()) => Outcome::downloaded(title, target),
      Err(e) => {
        warn!("Download of {url} failed: {e}");
        Outcome::failed(title, e.to_string())
      },
    }
  }

  /// Downloads `url` to `target` through a temporary file, removing it on any error.
  async fn download(&self, url: &str, target: &Path) -> Result<()> {
    let temp = temp_path(target);
    let result = self.download_to(url, &temp).await;
    match result {
      Ok(()) => tokio::fs::rename(&temp, target).await.map_err(|e| {
        remove_quietly(&temp);
        PaperfetchError::from(e)
      }),
      Err(e) => {
        remove_quietly(&temp);
        Err(e)
      },
    }
  }

  async fn download_to(&self, url: &str, temp: &Path) -> Result<()> {
    debug!("Downloading {url}");
    let mut response = self.client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
      return Err(PaperfetchError::Download(format!("HTTP {status}")));
    }

    if self.require_pdf_content_type {
      if let Some(content_type) = response.headers().get(reqwest::header::CONTENT_TYPE) {
        let content_type = content_type.to_str().unwrap_or_default().to_ascii_lowercase();
        if !content_type.contains("pdf") && !content_type.contains("octet-stream") {
          return Err(PaperfetchError::Download(format!("Not a PDF (Content-Type: {content_type})")));
        }
      }
    }

    let mut file = tokio::fs::File::create(temp).await?;
    let mut written = 0usize;
    while let Some(chunk) = response.chunk().await? {
      file.write_all(&chunk).await?;
      written += chunk.len();
    }
    file.flush().await?;
    drop(file);

    if written == 0 {
      return Err(PaperfetchError::Download("Empty response body".into()));
    }
    trace!("Wrote {written} bytes to {}", temp.display());
    Ok(())
  }
}

/// The in-progress path for `target`.
pub fn temp_path(target: &Path) -> PathBuf {
  let mut name = target.file_name().map(|n| n.to_os_string()).unwrap_or_default();
  name.push(".");
  name.push(PARTIAL_EXTENSION);
  target.with_file_name(name)
}

fn is_partial_pdf(path: &Path) -> bool {
  path
    .file_name()
    .and_then(|name| name.to_str())
    .is_some_and(|name| name.ends_with(PARTIAL_PDF_SUFFIX))
}

fn is_non_empty_file(path: &Path) -> bool {
  std::fs::metadata(path).is_ok_and(|meta| meta.is_file() && meta.len() > 0)
}

fn remove_quietly(path: &Path) {
  if let Err(e) = std::fs::remove_file(path) {
    if e.kind() != std::io::ErrorKind::NotFound {
      warn!("Could not remove {}: {e}", path.display());
    }
  }
}
