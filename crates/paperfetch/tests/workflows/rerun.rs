use super::*;

#[traced_test]
#[tokio::test]
async fn test_second_run_skips_existing_files() -> TestResult<()> {
  let mut server = Server::new_async().await;
  let pdf = server
    .mock("GET", "/deepbeats.pdf")
    .with_header("content-type", "application/pdf")
    .with_body(PDF_BYTES)
    .expect(1)
    .create_async()
    .await;

  let workspace = Workspace::new("Deep Beats\nTotally Obscure Talk\n");
  let search = FakeSearch::default().with_result("Deep Beats", vec![Candidate::new(
    "Deep Beats",
    "2301.00001",
  )
  .with_pdf_url(format!("{}/deepbeats.pdf", server.url()))]);

  let first = Pipeline::new(workspace.config(), Box::new(search.clone())).run().await?;
  assert_counts(&first, 1, 0, 1);
  assert_eq!(workspace.log(), "downloaded, Deep Beats\nnot_found, Totally Obscure Talk, no search results\n");

  let second = Pipeline::new(workspace.config(), Box::new(search.clone())).run().await?;
  assert_counts(&second, 1, 0, 1);
  assert!(second.outcomes[0].is_skipped());
  assert_eq!(
    workspace.log(),
    "downloaded, Deep Beats, skipped-existing\nnot_found, Totally Obscure Talk, no search results\n"
  );

  pdf.assert_async().await;
  assert_eq!(std::fs::read(workspace.pdf("Deep_Beats.pdf"))?, PDF_BYTES);
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_interrupted_download_is_cleaned_up() -> TestResult<()> {
  let workspace = Workspace::new("Deep Beats\n");
  std::fs::create_dir_all(workspace.output_dir())?;
  std::fs::write(workspace.pdf("Deep_Beats.pdf.part"), b"%PDF-1.4 trunc")?;

  let report = Pipeline::new(workspace.config(), Box::new(FakeSearch::default())).run().await?;

  assert_counts(&report, 0, 0, 1);
  assert!(workspace.partial_files().is_empty());
  Ok(())
}
