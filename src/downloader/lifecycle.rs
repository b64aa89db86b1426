// Lifecycle guard - removes a request's work directory (and the file in it)
// once the response body is dropped, whether it was fully sent or not.

use futures_util::stream::{BoxStream, StreamExt};
use std::path::{Path, PathBuf};
use tokio_util::io::ReaderStream;
use tracing::debug;
use uuid::Uuid;

/// Byte stream that owns an [`OutputGuard`]; dropping it removes the file
pub type GuardedBody = BoxStream<'static, std::io::Result<axum::body::Bytes>>;

pub struct OutputGuard {
    work_dir: PathBuf,
    file: Option<PathBuf>,
}

impl OutputGuard {
    /// Take ownership of a fresh per-request directory
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            file: None,
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Record the produced file so it is removed even if it sits outside the work dir
    pub fn track_file(&mut self, file: impl Into<PathBuf>) {
        self.file = Some(file.into());
    }

    /// Remove everything this guard owns. Safe to call repeatedly; failures
    /// (already gone, permissions) are logged and ignored.
    pub fn cleanup(&self) {
        remove_owned(self.file.as_deref(), &self.work_dir);
    }

    /// Stream `file` and clean up when the stream is dropped
    pub fn into_body(self, file: tokio::fs::File) -> GuardedBody {
        let guard = self;
        ReaderStream::new(file)
            .map(move |chunk| {
                let _held = &guard;
                chunk
            })
            .boxed()
    }
}

impl Drop for OutputGuard {
    /// Inside a runtime the removal goes to the blocking pool; otherwise it
    /// runs inline.
    fn drop(&mut self) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let file = self.file.take();
                let work_dir = std::mem::take(&mut self.work_dir);
                handle.spawn_blocking(move || remove_owned(file.as_deref(), &work_dir));
            }
            Err(_) => self.cleanup(),
        }
    }
}

fn remove_owned(file: Option<&Path>, work_dir: &Path) {
    if let Some(file) = file {
        match std::fs::remove_file(file) {
            Ok(()) => debug!(path = %file.display(), "[Lifecycle] removed output"),
            Err(e) => debug!(path = %file.display(), "[Lifecycle] remove_file ignored: {}", e),
        }
    }
    match std::fs::remove_dir_all(work_dir) {
        Ok(()) => debug!(path = %work_dir.display(), "[Lifecycle] removed work dir"),
        Err(e) => debug!(path = %work_dir.display(), "[Lifecycle] remove_dir_all ignored: {}", e),
    }
}

/// Remove per-request directories left over from a previous run.
///
/// Only directories named by a UUID are touched; anything else under `root`
/// belongs to someone else.
pub async fn sweep_stale(root: &Path) {
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(_) => return,
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let is_work_dir = entry
            .file_name()
            .to_str()
            .is_some_and(|name| Uuid::parse_str(name).is_ok());
        if !is_work_dir || !path.is_dir() {
            debug!(path = %path.display(), "[Lifecycle] sweep skipped foreign entry");
            continue;
        }

        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => debug!(path = %path.display(), "[Lifecycle] swept stale entry"),
            Err(e) => debug!(path = %path.display(), "[Lifecycle] sweep ignored: {}", e),
        }
    }
}
