// Helper functions shared by the pipeline

use regex::Regex;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use unicode_normalization::UnicodeNormalization;

use super::errors::PipelineFailure;
use super::models::TARGET_EXTENSION;

lazy_static::lazy_static! {
    static ref UNSAFE_CHARS: Regex = Regex::new(r"[^A-Za-z0-9._-]").unwrap();
}

/// Run a command to completion, collecting stdout and stderr.
///
/// No timeout: the backend runs until it finishes or exhausts its own retries.
pub async fn run_output(program: &str, args: Vec<String>) -> Result<std::process::Output, PipelineFailure> {
    let spawn_err = |source| PipelineFailure::Spawn {
        program: program.to_string(),
        source,
    };

    let mut child = TokioCommand::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(spawn_err)?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| PipelineFailure::Parse(format!("Failed to capture stdout from {}", program)))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| PipelineFailure::Parse(format!("Failed to capture stderr from {}", program)))?;

    // Drain both pipes concurrently so a chatty stderr cannot block stdout.
    let stdout_task = async {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).await.map(|_| buf)
    };
    let stderr_task = async {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).await.map(|_| buf)
    };

    let (stdout, stderr, status) = tokio::join!(stdout_task, stderr_task, child.wait());

    Ok(std::process::Output {
        status: status?,
        stdout: stdout?,
        stderr: stderr?,
    })
}

/// Caller-visible download name for a title: ASCII only, `[A-Za-z0-9._-]`,
/// always ending in `.mp4`.
pub fn sanitize_filename(title: &str) -> String {
    let ascii: String = title.nfkd().filter(char::is_ascii).collect();
    let mut name = UNSAFE_CHARS.replace_all(&ascii, "_").into_owned();

    if name.is_empty() {
        name = "video".to_string();
    }

    let suffix = format!(".{}", TARGET_EXTENSION);
    if !name.to_ascii_lowercase().ends_with(&suffix) {
        name.push_str(&suffix);
    }
    name
}
