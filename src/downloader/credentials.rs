// Cookie jar resolution for the extraction backend
//
// Priority:
// 1. YTDLP_COOKIES_B64 - inline blob, decoded into a fixed temp file
// 2. YTDLP_COOKIES     - an existing file path
// 3. cookies.txt       - default local file
//
// A bad inline blob is logged and skipped; the request still runs, just
// without that tier.

use base64::{engine::general_purpose, Engine as _};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::errors::PipelineFailure;
use super::models::CredentialHandle;
use crate::config::Config;

lazy_static::lazy_static! {
    // Concurrent requests share the temp jar path; writes go one at a time.
    static ref COOKIES_WRITE_MUTEX: Mutex<()> = Mutex::new(());
}

/// File name of the per-request jar copy inside a work directory
pub const REQUEST_JAR_NAME: &str = "cookies.txt";

pub struct CredentialMaterializer {
    inline_blob: Option<String>,
    file_path: Option<PathBuf>,
    default_path: PathBuf,
    temp_path: PathBuf,
}

impl CredentialMaterializer {
    pub fn new(
        inline_blob: Option<String>,
        file_path: Option<PathBuf>,
        default_path: PathBuf,
        temp_path: PathBuf,
    ) -> Self {
        Self {
            inline_blob,
            file_path,
            default_path,
            temp_path,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.cookies_inline.clone(),
            config.cookies_file.clone(),
            config.cookies_default.clone(),
            config.cookies_temp_path.clone(),
        )
    }

    pub async fn materialize(&self) -> CredentialHandle {
        if let Some(blob) = &self.inline_blob {
            match write_inline_blob(blob, &self.temp_path).await {
                Ok(()) => {
                    info!(path = %self.temp_path.display(), "[Credentials] using inline cookie blob");
                    return CredentialHandle::temporary(&self.temp_path);
                }
                Err(e) => {
                    warn!("[Credentials] inline cookie blob unusable, skipping: {}", e);
                }
            }
        }

        if let Some(path) = &self.file_path {
            if path.exists() {
                info!(path = %path.display(), "[Credentials] using configured cookie file");
                return CredentialHandle::file(path);
            }
            warn!(path = %path.display(), "[Credentials] configured cookie file does not exist");
        }

        if self.default_path.exists() {
            info!(path = %self.default_path.display(), "[Credentials] using default cookie file");
            return CredentialHandle::file(&self.default_path);
        }

        debug!("[Credentials] no cookies available");
        CredentialHandle::absent()
    }
}

/// Copy the resolved jar into `work_dir`.
///
/// yt-dlp writes the jar back when it exits, so each run gets a private
/// copy and the shared jar stays untouched.
pub async fn isolate_for_request(
    handle: &CredentialHandle,
    work_dir: &Path,
) -> Result<CredentialHandle, PipelineFailure> {
    let Some(source) = &handle.path else {
        return Ok(CredentialHandle::absent());
    };

    let target = work_dir.join(REQUEST_JAR_NAME);
    {
        let _lock = COOKIES_WRITE_MUTEX.lock().await;
        tokio::fs::copy(source, &target).await?;
    }

    debug!(
        source = %source.display(),
        copy = %target.display(),
        "[Credentials] jar copied for request"
    );
    Ok(CredentialHandle::temporary(target))
}

/// Decode and write atomically: temp file in the same directory, then rename
async fn write_inline_blob(blob: &str, target: &Path) -> Result<(), PipelineFailure> {
    let compact: String = blob.split_whitespace().collect();
    let decoded = general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| PipelineFailure::Parse(format!("Invalid base64: {}", e)))?;

    if decoded.is_empty() {
        return Err(PipelineFailure::Parse("cookie blob decodes to nothing".to_string()));
    }

    let _lock = COOKIES_WRITE_MUTEX.lock().await;

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let temp_path = PathBuf::from(format!(
        "{}.tmp.{}",
        target.display(),
        std::process::id()
    ));
    tokio::fs::write(&temp_path, &decoded).await?;

    if let Err(e) = tokio::fs::rename(&temp_path, target).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e.into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const JAR: &str = "# Netscape HTTP Cookie File\n.example.com\tTRUE\t/\tTRUE\t0\tSID\tabc\n";

    fn encoded() -> String {
        general_purpose::STANDARD.encode(JAR)
    }

    #[tokio::test]
    async fn test_inline_blob_written_to_temp_path() {
        let dir = tempfile::tempdir().unwrap();
        let temp = dir.path().join("jar.txt");
        std::fs::write(&temp, "stale").unwrap();

        let materializer =
            CredentialMaterializer::new(Some(encoded()), None, dir.path().join("none.txt"), temp.clone());
        let handle = materializer.materialize().await;

        assert_eq!(handle, CredentialHandle::temporary(&temp));
        assert_eq!(std::fs::read_to_string(&temp).unwrap(), JAR);
    }

    #[tokio::test]
    async fn test_blob_with_line_breaks_decodes() {
        let dir = tempfile::tempdir().unwrap();
        let temp = dir.path().join("jar.txt");
        let wrapped: String = encoded()
            .as_bytes()
            .chunks(16)
            .map(|c| String::from_utf8_lossy(c).to_string())
            .collect::<Vec<_>>()
            .join("\n");

        let materializer =
            CredentialMaterializer::new(Some(wrapped), None, dir.path().join("none.txt"), temp.clone());
        assert!(materializer.materialize().await.is_temporary);
        assert_eq!(std::fs::read_to_string(&temp).unwrap(), JAR);
    }

    #[tokio::test]
    async fn test_bad_blob_falls_through_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("operator.txt");
        std::fs::write(&file, JAR).unwrap();

        let materializer = CredentialMaterializer::new(
            Some("%%% not base64 %%%".to_string()),
            Some(file.clone()),
            dir.path().join("none.txt"),
            dir.path().join("jar.txt"),
        );
        let handle = materializer.materialize().await;

        assert_eq!(handle, CredentialHandle::file(&file));
        assert!(!dir.path().join("jar.txt").exists());
    }

    #[tokio::test]
    async fn test_missing_file_falls_through_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let default = dir.path().join("cookies.txt");
        std::fs::write(&default, JAR).unwrap();

        let materializer = CredentialMaterializer::new(
            None,
            Some(dir.path().join("gone.txt")),
            default.clone(),
            dir.path().join("jar.txt"),
        );
        assert_eq!(materializer.materialize().await, CredentialHandle::file(&default));
    }

    #[tokio::test]
    async fn test_nothing_configured_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let materializer =
            CredentialMaterializer::new(None, None, dir.path().join("cookies.txt"), dir.path().join("jar.txt"));
        let handle = materializer.materialize().await;
        assert!(!handle.is_present());
        assert!(!handle.is_temporary);
    }

    #[tokio::test]
    async fn test_isolate_copies_into_work_dir() {
        let dir = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let shared = dir.path().join("shared.txt");
        std::fs::write(&shared, JAR).unwrap();

        let copy = isolate_for_request(&CredentialHandle::file(&shared), work.path())
            .await
            .unwrap();

        let copy_path = copy.path.clone().unwrap();
        assert!(copy.is_temporary);
        assert_eq!(copy_path, work.path().join(REQUEST_JAR_NAME));
        assert_eq!(std::fs::read_to_string(&copy_path).unwrap(), JAR);

        std::fs::write(&copy_path, "rewritten by the backend").unwrap();
        assert_eq!(std::fs::read_to_string(&shared).unwrap(), JAR);
    }

    #[tokio::test]
    async fn test_isolate_absent_stays_absent() {
        let work = tempfile::tempdir().unwrap();
        let handle = isolate_for_request(&CredentialHandle::absent(), work.path())
            .await
            .unwrap();
        assert!(!handle.is_present());
        assert!(!work.path().join(REQUEST_JAR_NAME).exists());
    }

    #[tokio::test]
    async fn test_isolate_missing_source_is_error() {
        let work = tempfile::tempdir().unwrap();
        let handle = CredentialHandle::file(work.path().join("gone.txt"));
        assert!(isolate_for_request(&handle, work.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_writes_leave_complete_jar() {
        let dir = tempfile::tempdir().unwrap();
        let temp = dir.path().join("jar.txt");

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let materializer = CredentialMaterializer::new(
                    Some(encoded()),
                    None,
                    dir.path().join("none.txt"),
                    temp.clone(),
                );
                tokio::spawn(async move { materializer.materialize().await })
            })
            .collect();

        for task in tasks {
            assert!(task.await.unwrap().is_temporary);
        }
        assert_eq!(std::fs::read_to_string(&temp).unwrap(), JAR);
    }
}
