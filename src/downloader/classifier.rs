// Error classification - turns raw failures into caller-facing categories
//
// Matching is on backend message text, so it is a heuristic that needs
// updating when yt-dlp changes its wording. Patterns are checked most
// specific first.

use tracing::debug;

use super::errors::{ClassifiedError, ErrorKind, PipelineFailure};
use super::models::ToolAvailability;

/// Identity / consent checks: bot verification, sign-in walls
const AUTH_PATTERNS: &[&str] = &[
    "sign in to confirm",
    "not a bot",
    "confirm your age",
    "sign in",
    "login required",
    "log in to",
    "requires authentication",
    "use --cookies",
    "cookies-from-browser",
    "verify you are human",
    "captcha",
    "private video",
];

/// Failures consistent with a format that only exists as separate streams
const MISSING_FORMAT_PATTERNS: &[&str] = &[
    "requested format is not available",
    "requested format not available",
    "no video formats found",
    "format is not available",
    "ffmpeg is not installed",
    "ffmpeg not found",
    "you have requested merging",
];

pub const AUTH_HINT: &str = "The source requires a signed-in session. \
    Supply a cookie jar via YTDLP_COOKIES_B64 (base64 of a Netscape cookies.txt), \
    YTDLP_COOKIES (path to the file), or place cookies.txt next to the server.";

pub const TOOL_HINT: &str = "ffmpeg was not found, so only single-file formats could be requested \
    and none was available for this URL. Install ffmpeg on PATH, bundle it under ./bin, \
    or set FFMPEG_PATH.";

pub fn classify(failure: &PipelineFailure, tool: &ToolAvailability) -> ClassifiedError {
    let raw = match failure {
        PipelineFailure::Backend(e) => e.message.as_str(),
        other => {
            debug!("[Classifier] non-backend failure: {}", other);
            return ClassifiedError::new(ErrorKind::Internal, other.to_string());
        }
    };

    let lower = raw.to_lowercase();

    if matches_any(&lower, AUTH_PATTERNS) {
        return ClassifiedError::new(ErrorKind::AuthRequired, raw).with_hint(AUTH_HINT);
    }

    if !tool.is_available() && matches_any(&lower, MISSING_FORMAT_PATTERNS) {
        return ClassifiedError::new(ErrorKind::ToolUnavailable, raw).with_hint(TOOL_HINT);
    }

    ClassifiedError::new(ErrorKind::ExtractionFailed, raw)
}

fn matches_any(haystack: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|p| haystack.contains(p))
}
