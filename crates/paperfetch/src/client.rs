//! Construction of the HTTP client shared by searches and downloads.

use super::*;

/// User agent sent with every request so API operators can identify the traffic.
pub const USER_AGENT: &str = concat!("paperfetch/", env!("CARGO_PKG_VERSION"));

/// Default bound on a single HTTP request, connection through last body byte.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds a client with the given per-request timeout.
///
/// One client is meant to be built per run and cloned into the retriever and the fetcher, which
/// shares its connection pool.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
  let client = reqwest::Client::builder().user_agent(USER_AGENT).timeout(timeout).build()?;
  Ok(client)
}
