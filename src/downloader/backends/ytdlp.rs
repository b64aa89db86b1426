// yt-dlp CLI backend
//
// Runs `yt-dlp --dump-single-json --no-simulate`, which downloads and then
// prints the final info dict on stdout.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::downloader::errors::{BackendError, PipelineFailure};
use crate::downloader::models::{BackendRequest, ExtractedInfo};
use crate::downloader::traits::ExtractionBackend;
use crate::downloader::utils::run_output;

pub struct YtDlpBackend {
    ytdlp_bin: String,
}

impl YtDlpBackend {
    pub fn new(ytdlp_bin: impl Into<String>) -> Self {
        Self {
            ytdlp_bin: ytdlp_bin.into(),
        }
    }

    pub fn build_args(url: &str, request: &BackendRequest) -> Vec<String> {
        let mut args = vec![
            "--dump-single-json".to_string(),
            "--no-simulate".to_string(),
            "--quiet".to_string(),
            "--no-warnings".to_string(),
            "--no-progress".to_string(),
            "-o".to_string(),
            request.output_template.clone(),
            "-f".to_string(),
            request.format.clone(),
            "--retries".to_string(),
            request.retries.to_string(),
            "--fragment-retries".to_string(),
            request.fragment_retries.to_string(),
        ];

        if request.no_playlist {
            args.push("--no-playlist".to_string());
        }

        if request.restrict_filenames {
            args.push("--restrict-filenames".to_string());
        }

        if let Some(container) = &request.merge_output_format {
            args.push("--merge-output-format".to_string());
            args.push(container.clone());
        }

        if let Some(location) = &request.ffmpeg_location {
            args.push("--ffmpeg-location".to_string());
            args.push(location.to_string_lossy().to_string());
        }

        if let Some(cookies) = &request.cookie_file {
            args.push("--cookies".to_string());
            args.push(cookies.to_string_lossy().to_string());
        }

        if let Some(seconds) = request.sleep_requests {
            args.push("--sleep-requests".to_string());
            args.push(seconds.to_string());
        }

        for (name, value) in &request.headers {
            args.push("--add-header".to_string());
            args.push(format!("{}:{}", name, value));
        }

        // Everything after `--` is a URL, even if it starts with a dash.
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }

    /// The info dict is the last JSON line on stdout
    pub fn parse_info(stdout: &[u8]) -> Result<ExtractedInfo, PipelineFailure> {
        let text = String::from_utf8_lossy(stdout);
        let line = text
            .lines()
            .rev()
            .map(str::trim)
            .find(|l| l.starts_with('{'))
            .ok_or_else(|| PipelineFailure::Parse("yt-dlp printed no JSON".to_string()))?;

        Ok(serde_json::from_str(line)?)
    }
}

impl Default for YtDlpBackend {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

#[async_trait]
impl ExtractionBackend for YtDlpBackend {
    fn name(&self) -> &'static str {
        "yt-dlp-cli"
    }

    async fn extract(&self, url: &str, request: &BackendRequest) -> Result<ExtractedInfo, PipelineFailure> {
        let args = Self::build_args(url, request);
        debug!(program = %self.ytdlp_bin, ?args, "[yt-dlp] starting");

        let output = run_output(&self.ytdlp_bin, args).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = ?output.status.code(), "[yt-dlp] failed: {}", stderr.trim());
            return Err(BackendError::from_stderr(&stderr).into());
        }

        let info = Self::parse_info(&output.stdout)?;
        info!(id = ?info.id, ext = ?info.ext, "[yt-dlp] finished");
        Ok(info)
    }
}
