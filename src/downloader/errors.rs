// Error types for the acquisition pipeline

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Caller-facing failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Empty or unusable input from the caller
    InvalidInput,

    /// The request failed because no merge tool was available
    ToolUnavailable,

    /// The extraction backend reported a failure
    ExtractionFailed,

    /// The source wants a signed-in / verified session
    AuthRequired,

    /// The backend reported success but no output file was found
    OutputMissing,

    /// Anything that did not come from the backend
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::ToolUnavailable => "tool_unavailable",
            Self::ExtractionFailed => "extraction_failed",
            Self::AuthRequired => "auth_required",
            Self::OutputMissing => "output_missing",
            Self::Internal => "internal",
        }
    }

    /// Whether the failure is attributable to the request rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput | Self::ToolUnavailable | Self::ExtractionFailed | Self::AuthRequired
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure after classification. `message` always carries the original text.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
    pub hint: Option<String>,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn output_missing(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OutputMissing, message)
    }

    /// Message followed by the hint, for plain-text rendering
    pub fn display_with_hint(&self) -> String {
        match &self.hint {
            Some(hint) => format!("{}\n\n{}", self.message, hint),
            None => self.message.clone(),
        }
    }
}

/// Failure reported by the extraction backend itself
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build from the backend's stderr, keeping only `ERROR:` lines when present
    pub fn from_stderr(stderr: &str) -> Self {
        let errors: Vec<&str> = stderr
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with("ERROR:"))
            .collect();

        let message = if errors.is_empty() {
            stderr.trim().to_string()
        } else {
            errors.join("\n")
        };

        if message.is_empty() {
            Self::new("backend exited without an error message")
        } else {
            Self::new(message)
        }
    }
}

/// Raw failure anywhere in the pipeline, before classification
#[derive(Debug, Error)]
pub enum PipelineFailure {
    #[error("{0}")]
    Backend(#[from] BackendError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for PipelineFailure {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}
