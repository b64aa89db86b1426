// Extraction backend trait definition

use async_trait::async_trait;

use super::errors::PipelineFailure;
use super::models::{BackendRequest, ExtractedInfo};

/// Fetches a URL to disk according to a [`BackendRequest`] and reports what it wrote
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    /// Name of the backend (for logging)
    fn name(&self) -> &'static str;

    /// Download `url` and return the reported metadata.
    ///
    /// Failures the backend itself reports come back as
    /// [`PipelineFailure::Backend`]; anything else (spawn, I/O, bad output)
    /// uses the other variants.
    async fn extract(&self, url: &str, request: &BackendRequest) -> Result<ExtractedInfo, PipelineFailure>;
}
