use super::*;

async fn search_mock(server: &mut Server, title: &str, feed: String) -> mockito::Mock {
  server
    .mock("GET", "/api/query")
    .match_query(Matcher::UrlEncoded("search_query".into(), title.into()))
    .with_header("content-type", "application/atom+xml")
    .with_body(feed)
    .expect(1)
    .create_async()
    .await
}

#[traced_test]
#[tokio::test]
async fn test_deep_beats_is_downloaded() -> TestResult<()> {
  let mut server = Server::new_async().await;
  let base = server.url();
  let search = search_mock(
    &mut server,
    "Deep Beats",
    atom_feed(&[
      ("Shallow Drums", &format!("{base}/abs/1111.00001"), "2021-01-01T00:00:00Z"),
      ("Deep Beats", &format!("{base}/abs/2301.00001"), "2023-01-15T10:00:00Z"),
    ]),
  )
  .await;
  let pdf = server
    .mock("GET", "/pdf/2301.00001")
    .with_header("content-type", "application/pdf")
    .with_body(PDF_BYTES)
    .expect(1)
    .create_async()
    .await;

  let workspace = Workspace::new("Deep Beats\n");
  let report = Pipeline::new(workspace.config(), Box::new(atom_retriever(&base))).run().await?;

  search.assert_async().await;
  pdf.assert_async().await;
  assert_counts(&report, 1, 0, 0);
  assert_eq!(std::fs::read(workspace.pdf("Deep_Beats.pdf"))?, PDF_BYTES);
  assert_eq!(workspace.log(), "downloaded, Deep Beats\n");
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_obscure_talk_is_not_found_without_download() -> TestResult<()> {
  let mut server = Server::new_async().await;
  let base = server.url();
  let search = search_mock(&mut server, "Totally Obscure Talk", atom_feed(&[])).await;
  let pdf = server.mock("GET", Matcher::Regex("^/pdf/".into())).expect(0).create_async().await;

  let workspace = Workspace::new("Totally Obscure Talk\n");
  let report = Pipeline::new(workspace.config(), Box::new(atom_retriever(&base))).run().await?;

  search.assert_async().await;
  pdf.assert_async().await;
  assert_counts(&report, 0, 0, 1);
  assert!(workspace.log().starts_with("not_found, Totally Obscure Talk"));
  assert_eq!(std::fs::read_dir(workspace.output_dir())?.count(), 0);
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_server_error_is_recorded_as_failed() -> TestResult<()> {
  let mut server = Server::new_async().await;
  let base = server.url();
  search_mock(
    &mut server,
    "Broken Paper",
    atom_feed(&[("Broken Paper", &format!("{base}/abs/500"), "2022-05-01T00:00:00Z")]),
  )
  .await;
  server.mock("GET", "/pdf/500").with_status(500).create_async().await;

  let workspace = Workspace::new("Broken Paper\n");
  let report = Pipeline::new(workspace.config(), Box::new(atom_retriever(&base))).run().await?;

  assert_counts(&report, 0, 1, 0);
  assert!(!workspace.pdf("Broken_Paper.pdf").exists());
  assert!(workspace.partial_files().is_empty());
  let log = workspace.log();
  assert!(log.starts_with("failed, Broken Paper, "));
  assert!(log.contains("500"));
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_search_outage_becomes_not_found() -> TestResult<()> {
  let mut server = Server::new_async().await;
  let base = server.url();
  server
    .mock("GET", "/api/query")
    .match_query(Matcher::Any)
    .with_status(503)
    .expect(2)
    .create_async()
    .await;

  let workspace = Workspace::new("Deep Beats\nBroken Paper\n");
  let report = Pipeline::new(workspace.config(), Box::new(atom_retriever(&base))).run().await?;

  assert_counts(&report, 0, 0, 2);
  assert_eq!(workspace.log().matches("search failed").count(), 2);
  Ok(())
}
