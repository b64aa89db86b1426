// FormatSelector - picks the yt-dlp format expression
//
// With ffmpeg:    best video + best audio merged into mp4, falling back to
//                 the best single file.
// Without ffmpeg: single files only (audio and video already muxed),
//                 preferring plain HTTP delivery over HLS/DASH, since
//                 nothing can be merged.

use super::models::{FormatPlan, ToolAvailability, TARGET_EXTENSION};

/// Independent streams, then the best progressive file
pub const MERGE_EXPRESSION: &str = "bv*+ba/b";

/// Progressive files only
pub const PROGRESSIVE_EXPRESSION: &str = "b[ext=mp4][protocol^=http]/b[protocol^=http]/b";

pub struct FormatSelector;

impl FormatSelector {
    pub fn select(tool: &ToolAvailability) -> FormatPlan {
        if tool.is_available() {
            FormatPlan {
                expression: MERGE_EXPRESSION.to_string(),
                target_container: Some(TARGET_EXTENSION.to_string()),
            }
        } else {
            FormatPlan {
                expression: PROGRESSIVE_EXPRESSION.to_string(),
                target_container: None,
            }
        }
    }
}
