use mockito::{Matcher, Server};

use super::*;

mod atom_search;
mod rerun;

#[traced_test]
#[tokio::test]
async fn test_explicit_url_skips_search() -> TestResult<()> {
  let mut server = Server::new_async().await;
  let pdf = server
    .mock("GET", "/files/foo.pdf")
    .match_query(Matcher::UrlEncoded("dl".into(), "1".into()))
    .with_header("content-type", "application/pdf")
    .with_body(PDF_BYTES)
    .expect(1)
    .create_async()
    .await;

  let workspace = Workspace::new(&format!("Foo: A Study (2024) {}/files/foo.pdf?dl=1\n", server.url()));
  let search = FakeSearch::default();
  let report = Pipeline::new(workspace.config(), Box::new(search.clone())).run().await?;

  pdf.assert_async().await;
  assert_eq!(search.calls(), 0);
  assert_counts(&report, 1, 0, 0);
  assert!(exists_non_empty(&workspace.pdf("Foo_A_Study_(2024).pdf")));
  assert_eq!(workspace.log(), "downloaded, Foo: A Study (2024)\n");
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_counters_cover_every_listed_title() -> TestResult<()> {
  let mut server = Server::new_async().await;
  server
    .mock("GET", "/a.pdf")
    .with_header("content-type", "application/pdf")
    .with_body(PDF_BYTES)
    .create_async()
    .await;
  server.mock("GET", "/b.pdf").with_status(404).create_async().await;

  let workspace = Workspace::new(
    "Paper Title\tAuthors\n\nAlpha Paper\tA. Author\n   \nBeta Paper\nGamma Paper\n\nDelta Paper\n",
  );
  let search = FakeSearch::default()
    .with_result("Alpha Paper", vec![
      Candidate::new("Alpha Paper", "a").with_pdf_url(format!("{}/a.pdf", server.url()))
    ])
    .with_result("Beta Paper", vec![
      Candidate::new("Beta Paper", "b").with_pdf_url(format!("{}/b.pdf", server.url()))
    ])
    .with_result("Gamma Paper", vec![Candidate::new("Completely Different", "c")
      .with_pdf_url(format!("{}/c.pdf", server.url()))]);

  let report = Pipeline::new(workspace.config(), Box::new(search.clone())).run().await?;

  assert_eq!(search.calls(), 4);
  assert_counts(&report, 1, 1, 2);
  assert_eq!(report.summary.total(), 4);
  assert_eq!(workspace.log().lines().count(), 4);
  assert!(workspace.partial_files().is_empty());
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_year_filter_rejects_old_candidates() -> TestResult<()> {
  let workspace = Workspace::new("Deep Beats\n");
  let search = FakeSearch::default().with_result("Deep Beats", vec![Candidate::new(
    "Deep Beats",
    "old",
  )
  .with_pdf_url("http://127.0.0.1:9/old.pdf")
  .with_year(2012)]);
  let config = workspace.config().with_filters(SearchFilters {
    categories: vec![],
    min_year:   Some(2020),
    max_year:   None,
  });

  let report = Pipeline::new(config, Box::new(search)).run().await?;

  assert_counts(&report, 0, 0, 1);
  assert!(!workspace.pdf("Deep_Beats.pdf").exists());
  Ok(())
}
