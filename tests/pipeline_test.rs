//! Pipeline tests against a stubbed extraction backend
//!
//! Run with: cargo test --test pipeline_test

mod common;

use common::{wait_until_empty, StubBackend};
use media_fetch_lib::downloader::{
    AcquireOptions, AcquisitionRequest, CredentialHandle, CredentialMaterializer, Downloader, ErrorKind,
    ToolAvailability,
};
use std::sync::Arc;

#[tokio::test]
async fn test_distinct_urls_concurrently_do_not_mix() {
    let root = tempfile::tempdir().unwrap();
    let backend = Arc::new(StubBackend::ok(b"media:"));
    let dl = Arc::new(Downloader::new(backend.clone(), root.path(), AcquireOptions::default()));

    let urls: Vec<String> = (0..6).map(|i| format!("https://example.com/v/clip{}", i)).collect();
    let tasks: Vec<_> = urls
        .iter()
        .cloned()
        .map(|url| {
            let dl = dl.clone();
            tokio::spawn(async move {
                let delivery = dl
                    .fetch_with(
                        &AcquisitionRequest::new(url.clone()),
                        &ToolAvailability::unavailable(),
                        &CredentialHandle::absent(),
                    )
                    .await
                    .map_err(|e| e.message)?;
                let bytes = tokio::fs::read(&delivery.result.source_file)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok::<_, String>((url, delivery.download_name.clone(), bytes))
            })
        })
        .collect();

    for task in tasks {
        let (url, name, bytes) = task.await.unwrap().unwrap();
        assert_eq!(bytes, backend.contents_for(&url));
        assert_eq!(name, format!("Title_{}.mp4", StubBackend::id_for(&url)));
    }

    assert_eq!(backend.calls(), urls.len());
    assert!(wait_until_empty(root.path()).await);
}

#[tokio::test]
async fn test_shared_jar_survives_concurrent_backend_writes() {
    use base64::Engine as _;

    let root = tempfile::tempdir().unwrap();
    let jar_dir = tempfile::tempdir().unwrap();
    let jar = jar_dir.path().join("jar.txt");
    let blob = base64::engine::general_purpose::STANDARD.encode("# Netscape HTTP Cookie File\n");

    let backend = Arc::new(StubBackend::ok(b""));
    let dl = Arc::new(Downloader::new(backend, root.path(), AcquireOptions::default()));

    let tasks: Vec<_> = (0..4)
        .map(|i| {
            let dl = dl.clone();
            let materializer =
                CredentialMaterializer::new(Some(blob.clone()), None, jar_dir.path().join("none"), jar.clone());
            tokio::spawn(async move {
                let creds = materializer.materialize().await;
                let delivery = dl
                    .fetch_with(
                        &AcquisitionRequest::new(format!("https://example.com/{}", i)),
                        &ToolAvailability::unavailable(),
                        &creds,
                    )
                    .await
                    .map_err(|e| e.message)?;
                Ok::<_, String>((creds, delivery.result.source_file.clone()))
            })
        })
        .collect();

    for task in tasks {
        let (creds, _file) = task.await.unwrap().unwrap();
        assert!(creds.is_temporary);
        assert_eq!(creds.path.as_deref(), Some(jar.as_path()));
    }
    assert_eq!(std::fs::read_to_string(&jar).unwrap(), "# Netscape HTTP Cookie File\n");
}

#[tokio::test]
async fn test_failure_leaves_nothing_behind() {
    let root = tempfile::tempdir().unwrap();
    let backend = Arc::new(StubBackend::failing("ERROR: Unsupported URL: https://example.com/x"));
    let dl = Downloader::new(backend.clone(), root.path(), AcquireOptions::default());

    let err = dl
        .fetch_with(
            &AcquisitionRequest::new("https://example.com/x"),
            &ToolAvailability::available("/usr/bin"),
            &CredentialHandle::absent(),
        )
        .await
        .err()
        .unwrap();

    assert_eq!(err.kind, ErrorKind::ExtractionFailed);
    assert!(err.message.contains("Unsupported URL"));
    assert_eq!(backend.calls(), 1);
    assert!(wait_until_empty(root.path()).await);
}

#[tokio::test]
async fn test_missing_format_without_ffmpeg_explains_downgrade() {
    let root = tempfile::tempdir().unwrap();
    let backend = Arc::new(StubBackend::failing("ERROR: [vimeo] 1: Requested format is not available"));
    let dl = Downloader::new(backend, root.path(), AcquireOptions::default());

    let err = dl
        .fetch_with(
            &AcquisitionRequest::new("https://vimeo.com/1"),
            &ToolAvailability::unavailable(),
            &CredentialHandle::absent(),
        )
        .await
        .err()
        .unwrap();

    assert_eq!(err.kind, ErrorKind::ToolUnavailable);
    assert!(err.hint.unwrap().contains("ffmpeg"));
}
