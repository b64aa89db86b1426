//! Shared stub backend for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use media_fetch_lib::downloader::{BackendError, BackendRequest, ExtractedInfo, ExtractionBackend, PipelineFailure};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Guard cleanup runs on the blocking pool; poll until `dir` has no entries.
pub async fn wait_until_empty(dir: &Path) -> bool {
    for _ in 0..200 {
        if std::fs::read_dir(dir).map(|d| d.count() == 0).unwrap_or(true) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Writes `<id>.mp4` with `<payload><url>` as content, where id is the last
/// path segment of the URL, and overwrites any cookie jar it was handed.
/// Fails with `failure` when set.
pub struct StubBackend {
    pub payload: Vec<u8>,
    pub failure: Option<String>,
    pub calls: AtomicUsize,
}

impl StubBackend {
    pub fn ok(payload: &[u8]) -> Self {
        Self {
            payload: payload.to_vec(),
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            payload: Vec::new(),
            failure: Some(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn id_for(url: &str) -> String {
        url.rsplit('/').next().unwrap_or("video").to_string()
    }

    pub fn contents_for(&self, url: &str) -> Vec<u8> {
        let mut bytes = self.payload.clone();
        bytes.extend_from_slice(url.as_bytes());
        bytes
    }
}

#[async_trait]
impl ExtractionBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn extract(&self, url: &str, request: &BackendRequest) -> Result<ExtractedInfo, PipelineFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            return Err(BackendError::new(message.clone()).into());
        }

        // yt-dlp saves the cookie jar back when it exits
        if let Some(jar) = &request.cookie_file {
            tokio::fs::write(jar, b"# rewritten by backend\n").await?;
        }

        let id = Self::id_for(url);
        let path = request.output_template.replace("%(id)s", &id).replace("%(ext)s", "mp4");
        tokio::time::sleep(Duration::from_millis(10)).await;
        tokio::fs::write(&path, self.contents_for(url)).await?;

        Ok(ExtractedInfo {
            id: Some(id.clone()),
            ext: Some("mp4".to_string()),
            title: Some(format!("Title {}", id)),
            ..Default::default()
        })
    }
}
