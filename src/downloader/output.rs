// Output resolution - the backend may rename its file while post-processing
// (a merge or remux changes the extension), so the reported extension alone
// is not enough.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::errors::ClassifiedError;
use super::models::ExtractedInfo;

pub struct OutputResolver;

impl OutputResolver {
    /// Candidates in priority order: target container, reported extension,
    /// then the backend's own reported path if it lies inside `dir`.
    pub fn candidates(
        dir: &Path,
        id: &str,
        reported_ext: &str,
        reported_path: Option<&Path>,
        target_container: Option<&str>,
    ) -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Some(container) = target_container {
            candidates.push(dir.join(format!("{}.{}", id, container)));
        }

        let reported = dir.join(format!("{}.{}", id, reported_ext));
        if !candidates.contains(&reported) {
            candidates.push(reported);
        }

        if let Some(path) = reported_path {
            if path.starts_with(dir) && !candidates.iter().any(|c| c == path) {
                candidates.push(path.to_path_buf());
            }
        }

        candidates
    }

    pub fn resolve(
        dir: &Path,
        info: &ExtractedInfo,
        target_container: Option<&str>,
    ) -> Result<PathBuf, ClassifiedError> {
        let id = info
            .id
            .as_deref()
            .ok_or_else(|| ClassifiedError::output_missing("Backend reported no identifier for the download"))?;
        let ext = info.ext.as_deref().unwrap_or(super::models::TARGET_EXTENSION);

        let candidates = Self::candidates(dir, id, ext, info.reported_filepath(), target_container);
        for candidate in &candidates {
            if candidate.is_file() {
                debug!(path = %candidate.display(), "[OutputResolver] resolved");
                return Ok(candidate.clone());
            }
        }

        warn!(id, ?candidates, "[OutputResolver] no output file on disk");
        Err(ClassifiedError::output_missing(
            "Download finished but output file not found. Check logs/ffmpeg.",
        ))
    }
}
