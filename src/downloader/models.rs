// Common data models for the acquisition pipeline

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Extension every delivered file is named with
pub const TARGET_EXTENSION: &str = "mp4";

/// MIME type of the delivered stream
pub const TARGET_MIME: &str = "video/mp4";

/// One incoming fetch
#[derive(Debug, Clone)]
pub struct AcquisitionRequest {
    pub url: String,
    /// Caller asked for a JSON error payload instead of a page
    pub wants_structured_response: bool,
}

impl AcquisitionRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            wants_structured_response: false,
        }
    }

    pub fn structured(mut self, yes: bool) -> Self {
        self.wants_structured_response = yes;
        self
    }
}

/// Where the merge tool lives, if anywhere
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolAvailability {
    pub path: Option<PathBuf>,
}

impl ToolAvailability {
    pub fn available(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn unavailable() -> Self {
        Self { path: None }
    }

    pub fn is_available(&self) -> bool {
        self.path.is_some()
    }
}

/// Cookie jar handed to the backend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialHandle {
    pub path: Option<PathBuf>,
    /// Written by us from an inline blob rather than supplied by the operator
    pub is_temporary: bool,
}

impl CredentialHandle {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            is_temporary: false,
        }
    }

    pub fn temporary(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            is_temporary: true,
        }
    }

    pub fn is_present(&self) -> bool {
        self.path.is_some()
    }
}

/// Format expression plus the container to merge into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatPlan {
    pub expression: String,
    pub target_container: Option<String>,
}

/// Everything the backend needs for one run
#[derive(Debug, Clone)]
pub struct BackendRequest {
    pub output_template: String,
    pub format: String,
    pub merge_output_format: Option<String>,
    pub no_playlist: bool,
    pub retries: u32,
    pub fragment_retries: u32,
    pub restrict_filenames: bool,
    pub cookie_file: Option<PathBuf>,
    pub ffmpeg_location: Option<PathBuf>,
    pub headers: Vec<(String, String)>,
    pub sleep_requests: Option<f64>,
}

/// Metadata the backend reports after a run
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractedInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "_type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub entries: Option<Vec<ExtractedInfo>>,
    #[serde(default)]
    pub filepath: Option<PathBuf>,
    /// Per-format download records; yt-dlp puts the post-processed path here
    #[serde(default)]
    pub requested_downloads: Option<Vec<RequestedDownload>>,
}

/// One entry of `requested_downloads`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestedDownload {
    #[serde(default)]
    pub filepath: Option<PathBuf>,
}

impl ExtractedInfo {
    pub fn is_playlist(&self) -> bool {
        self.kind.as_deref() == Some("playlist")
    }

    /// Final path after post-processing, when the backend reports one
    pub fn reported_filepath(&self) -> Option<&Path> {
        self.requested_downloads
            .iter()
            .flatten()
            .find_map(|d| d.filepath.as_deref())
            .or(self.filepath.as_deref())
    }

    /// First entry for playlist-shaped results, the result itself otherwise
    pub fn into_first_entry(self) -> Option<ExtractedInfo> {
        if !self.is_playlist() {
            return Some(self);
        }
        self.entries
            .and_then(|entries| entries.into_iter().next())
            .and_then(ExtractedInfo::into_first_entry)
    }
}

/// A produced file, guaranteed to exist when constructed
#[derive(Debug, Clone)]
pub struct AcquisitionResult {
    pub source_file: PathBuf,
    pub id: String,
    pub extension: String,
    pub title: Option<String>,
}
