// Acquisition orchestrator - one URL in, one guarded file out

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::classifier::classify;
use super::credentials::{isolate_for_request, CredentialMaterializer};
use super::errors::{ClassifiedError, ErrorKind, PipelineFailure};
use super::format_selector::FormatSelector;
use super::lifecycle::OutputGuard;
use super::models::{
    AcquisitionRequest, AcquisitionResult, BackendRequest, CredentialHandle, FormatPlan, ToolAvailability,
};
use super::output::OutputResolver;
use super::tools::ToolLocator;
use super::traits::ExtractionBackend;
use super::utils::sanitize_filename;
use crate::config::Config;

/// Output template relative to the per-request work directory
const OUTPUT_TEMPLATE: &str = "%(id)s.%(ext)s";

/// Knobs that shape every backend request
#[derive(Debug, Clone)]
pub struct AcquireOptions {
    pub retries: u32,
    pub fragment_retries: u32,
    pub sleep_requests: Option<f64>,
    pub headers: Vec<(String, String)>,
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            retries: 10,
            fragment_retries: 10,
            sleep_requests: None,
            headers: Vec::new(),
        }
    }
}

impl From<&Config> for AcquireOptions {
    fn from(config: &Config) -> Self {
        Self {
            retries: config.retries,
            fragment_retries: config.fragment_retries,
            sleep_requests: config.sleep_requests,
            headers: config.request_headers.clone(),
        }
    }
}

/// A produced file ready to stream. Dropping it (or the body made from its
/// guard) removes the file.
pub struct Delivery {
    pub result: AcquisitionResult,
    pub download_name: String,
    pub guard: OutputGuard,
}

pub struct Downloader {
    backend: Arc<dyn ExtractionBackend>,
    root: PathBuf,
    options: AcquireOptions,
}

impl Downloader {
    pub fn new(backend: Arc<dyn ExtractionBackend>, root: impl Into<PathBuf>, options: AcquireOptions) -> Self {
        Self {
            backend,
            root: root.into(),
            options,
        }
    }

    /// Build the backend configuration for one request
    pub fn backend_request(
        &self,
        work_dir: &Path,
        plan: &FormatPlan,
        tool: &ToolAvailability,
        credentials: &CredentialHandle,
    ) -> BackendRequest {
        BackendRequest {
            output_template: work_dir.join(OUTPUT_TEMPLATE).to_string_lossy().to_string(),
            format: plan.expression.clone(),
            merge_output_format: plan.target_container.clone(),
            no_playlist: true,
            retries: self.options.retries,
            fragment_retries: self.options.fragment_retries,
            restrict_filenames: true,
            cookie_file: credentials.path.clone(),
            ffmpeg_location: tool.path.clone(),
            headers: self.options.headers.clone(),
            sleep_requests: self.options.sleep_requests,
        }
    }

    /// Run the backend for `req` inside `work_dir` and resolve the produced file.
    ///
    /// `tool` and `credentials` are resolved by the caller once per request.
    pub async fn acquire(
        &self,
        req: &AcquisitionRequest,
        work_dir: &Path,
        tool: &ToolAvailability,
        credentials: &CredentialHandle,
    ) -> Result<AcquisitionResult, ClassifiedError> {
        let url = req.url.trim();
        if url.is_empty() {
            return Err(ClassifiedError::invalid_input("Please paste a URL."));
        }

        let plan = FormatSelector::select(tool);
        let request = self.backend_request(work_dir, &plan, tool, credentials);

        info!(
            url,
            backend = self.backend.name(),
            format = %plan.expression,
            merge = tool.is_available(),
            cookies = credentials.is_present(),
            "[Downloader] starting acquisition"
        );

        let reported = match self.backend.extract(url, &request).await {
            Ok(info) => info,
            Err(failure) => {
                let classified = classify(&failure, tool);
                warn!(url, kind = %classified.kind, "[Downloader] backend failed: {}", classified.message);
                return Err(classified);
            }
        };

        let entry = reported.into_first_entry().ok_or_else(|| {
            ClassifiedError::new(ErrorKind::ExtractionFailed, "The URL resolved to an empty playlist")
        })?;

        let source_file = OutputResolver::resolve(work_dir, &entry, plan.target_container.as_deref())?;
        let extension = source_file
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .or_else(|| entry.ext.clone())
            .unwrap_or_default();

        Ok(AcquisitionResult {
            source_file,
            id: entry.id.unwrap_or_default(),
            extension,
            title: entry.title,
        })
    }

    /// Full pipeline with explicit tool/credential state: isolated work dir,
    /// acquisition, download name, and a guard that owns the file.
    pub async fn fetch_with(
        &self,
        req: &AcquisitionRequest,
        tool: &ToolAvailability,
        credentials: &CredentialHandle,
    ) -> Result<Delivery, ClassifiedError> {
        if req.url.trim().is_empty() {
            return Err(ClassifiedError::invalid_input("Please paste a URL."));
        }

        let work_dir = self.root.join(Uuid::new_v4().to_string());
        if let Err(e) = tokio::fs::create_dir_all(&work_dir).await {
            error!(path = %work_dir.display(), "[Downloader] cannot create work dir: {}", e);
            return Err(classify(&PipelineFailure::Io(e), tool));
        }

        // From here on, every return path drops or hands off the guard.
        let mut guard = OutputGuard::new(&work_dir);

        let credentials = match isolate_for_request(credentials, &work_dir).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!("[Downloader] cookie jar copy failed, continuing without cookies: {}", e);
                CredentialHandle::absent()
            }
        };

        let result = self.acquire(req, &work_dir, tool, &credentials).await?;
        guard.track_file(&result.source_file);

        let download_name = sanitize_filename(result.title.as_deref().unwrap_or("video"));
        info!(
            id = %result.id,
            file = %result.source_file.display(),
            download_name = %download_name,
            "[Downloader] ready to stream"
        );

        Ok(Delivery {
            result,
            download_name,
            guard,
        })
    }

    /// Full pipeline, resolving the merge tool and cookies from `config`
    pub async fn fetch(&self, req: &AcquisitionRequest, config: &Config) -> Result<Delivery, ClassifiedError> {
        if req.url.trim().is_empty() {
            return Err(ClassifiedError::invalid_input("Please paste a URL."));
        }

        let tool = ToolLocator::from_config(config).locate();
        let credentials = CredentialMaterializer::from_config(config).materialize().await;
        self.fetch_with(req, &tool, &credentials).await
    }
}
