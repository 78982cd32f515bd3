use crate::*;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use spacesync::error::{Error, Result};
use spacesync::storage::StorageClient;
use spacesync::storage::operations::SyncOptions;
use tokio::fs;
use tokio_util::sync::CancellationToken;

pub fn tests(client: &StorageClient, tests: &mut Vec<Trial>) {
    tests.extend(async_trials!(
        client,
        test_upload_folder_collects_urls,
        test_upload_folder_skips_subdirectories,
        test_upload_missing_source,
        test_upload_large_file
    ));

    tests.extend(async_trials!(
        client,
        e2e_test_upload_command_prints_urls,
        e2e_test_upload_json_output,
        e2e_test_upload_requires_confirmation,
        e2e_test_upload_missing_source_fails
    ));
}

async fn test_upload_folder_collects_urls(client: StorageClient) -> Result<()> {
    let source = local_tree(&[("a.txt", b"hello"), ("b.txt", b"world")], &[]);
    let prefix = TEST_FIXTURE.new_prefix();

    let report = client
        .upload_folder(&source, &prefix, &SyncOptions::default(), &CancellationToken::new())
        .await?;

    assert!(report.is_complete());
    assert_eq!(report.urls.len(), 2);
    for name in ["a.txt", "b.txt"] {
        let key = format!("{prefix}/{name}");
        assert!(report.urls.iter().any(|url| url.ends_with(&key)), "{key}");
        let uploaded = client.operator().read(&key).await?;
        assert_eq!(uploaded.to_vec(), read_local(&source.join(name)));
    }
    assert!(client.operator().exists(&format!("{prefix}/")).await?);

    let _ = fs::remove_dir_all(&source).await;
    Ok(())
}

async fn test_upload_folder_skips_subdirectories(client: StorageClient) -> Result<()> {
    let source = local_tree(&[("top.txt", b"top")], &["nested", "other"]);
    std::fs::write(source.join("nested").join("inner.txt"), b"inner")?;
    let prefix = TEST_FIXTURE.new_prefix();

    let report = client
        .upload_folder(&source, &prefix, &SyncOptions::default(), &CancellationToken::new())
        .await?;

    assert_eq!(report.urls.len(), 1);
    assert_eq!(report.skipped.len(), 2);
    assert!(!client.operator().exists(&format!("{prefix}/nested/inner.txt")).await?);

    let _ = fs::remove_dir_all(&source).await;
    Ok(())
}

async fn test_upload_missing_source(client: StorageClient) -> Result<()> {
    let source = fresh_local_dir("missing");
    let prefix = TEST_FIXTURE.new_prefix();

    let result = client
        .upload_folder(&source, &prefix, &SyncOptions::default(), &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(Error::SourceNotFound { .. })));
    assert!(!client.operator().exists(&format!("{prefix}/")).await?);
    Ok(())
}

async fn test_upload_large_file(client: StorageClient) -> Result<()> {
    let content = TEST_FIXTURE.random_content(8 * 1024 * 1024..24 * 1024 * 1024);
    let source = local_tree(&[("large.bin", &content)], &[]);
    let prefix = TEST_FIXTURE.new_prefix();

    let report = client
        .upload_folder(&source, &prefix, &SyncOptions::default(), &CancellationToken::new())
        .await?;

    assert_eq!(report.bytes, content.len() as u64);
    let uploaded = client.operator().read(&format!("{prefix}/large.bin")).await?;
    assert_eq!(uploaded.len(), content.len());
    assert_eq!(uploaded.to_vec(), content);

    let _ = fs::remove_dir_all(&source).await;
    Ok(())
}

async fn e2e_test_upload_command_prints_urls(client: StorageClient) -> Result<()> {
    let source = local_tree(&[("one.txt", b"1"), ("two.txt", b"2")], &["skipped"]);
    let prefix = TEST_FIXTURE.new_prefix();

    spacesync_cmd()
        .arg("upload")
        .arg(&source)
        .arg("--prefix")
        .arg(&prefix)
        .arg("--yes")
        .assert()
        .success()
        .stdout(predicate::str::contains("Uploaded:"))
        .stdout(predicate::str::contains("Urls:"))
        .stdout(predicate::str::contains(format!("{prefix}/one.txt")))
        .stdout(predicate::str::contains("Skipping directory"));

    let uploaded = client.operator().read(&format!("{prefix}/two.txt")).await?;
    assert_eq!(uploaded.to_vec(), b"2");

    let _ = fs::remove_dir_all(&source).await;
    Ok(())
}

async fn e2e_test_upload_json_output(_client: StorageClient) -> Result<()> {
    let source = local_tree(&[("a.txt", b"a"), ("b.txt", b"b"), ("c.txt", b"c")], &[]);
    let prefix = TEST_FIXTURE.new_prefix();

    let output = spacesync_cmd()
        .arg("put")
        .arg(&source)
        .arg("-p")
        .arg(&prefix)
        .arg("-y")
        .arg("--format")
        .arg("json")
        .output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let json_line = stdout.lines().last().unwrap_or_default();
    let report: serde_json::Value = serde_json::from_str(json_line)?;
    assert_eq!(report["prefix"], prefix.as_str());
    assert_eq!(report["urls"].as_array().map(Vec::len), Some(3));
    assert_eq!(report["failures"].as_array().map(Vec::len), Some(0));

    let _ = fs::remove_dir_all(&source).await;
    Ok(())
}

async fn e2e_test_upload_requires_confirmation(client: StorageClient) -> Result<()> {
    let source = local_tree(&[("a.txt", b"a")], &[]);
    let prefix = TEST_FIXTURE.new_prefix();

    spacesync_cmd()
        .arg("upload")
        .arg(&source)
        .arg("--prefix")
        .arg(&prefix)
        .write_stdin("n\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Aborted"));

    assert!(!client.operator().exists(&format!("{prefix}/a.txt")).await?);

    let _ = fs::remove_dir_all(&source).await;
    Ok(())
}

async fn e2e_test_upload_missing_source_fails(_client: StorageClient) -> Result<()> {
    let source = fresh_local_dir("absent");
    let prefix = TEST_FIXTURE.new_prefix();

    spacesync_cmd()
        .arg("upload")
        .arg(&source)
        .arg("--prefix")
        .arg(&prefix)
        .arg("--yes")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Folder does not exist"));

    Ok(())
}
