// Merge tool (ffmpeg) discovery

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::models::ToolAvailability;
use crate::config::Config;

/// Executable names the bundled tool may ship under
const FFMPEG_NAMES: &[&str] = &["ffmpeg", "ffmpeg.exe"];

/// Finds ffmpeg from, in order: an explicit override, `PATH`, bundled copies.
pub struct ToolLocator {
    override_path: Option<PathBuf>,
    search_path: Option<OsString>,
    bundled_dirs: Vec<PathBuf>,
    names: Vec<&'static str>,
}

impl ToolLocator {
    pub fn new(
        override_path: Option<PathBuf>,
        search_path: Option<OsString>,
        bundled_dirs: Vec<PathBuf>,
    ) -> Self {
        Self {
            override_path,
            search_path,
            bundled_dirs,
            names: FFMPEG_NAMES.to_vec(),
        }
    }

    /// Locator for the running process: FFMPEG_PATH, the process PATH, and
    /// `bin/` next to the executable or the working directory.
    pub fn from_config(config: &Config) -> Self {
        let mut bundled_dirs = Vec::new();
        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            bundled_dirs.push(exe_dir.join("bin"));
            bundled_dirs.push(exe_dir);
        }
        if let Ok(cwd) = std::env::current_dir() {
            bundled_dirs.push(cwd.join("bin"));
        }

        Self::new(
            config.ffmpeg_override.clone(),
            std::env::var_os("PATH"),
            bundled_dirs,
        )
    }

    pub fn locate(&self) -> ToolAvailability {
        for candidate in self.candidates() {
            if !candidate.exists() {
                continue;
            }

            let location = if candidate.is_file() {
                candidate
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| candidate.clone())
            } else {
                candidate.clone()
            };

            info!(
                candidate = %candidate.display(),
                location = %location.display(),
                "[ToolLocator] ffmpeg found"
            );
            return ToolAvailability::available(location);
        }

        info!("[ToolLocator] ffmpeg not found, merging disabled");
        ToolAvailability::unavailable()
    }

    fn candidates(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Some(path) = &self.override_path {
            candidates.push(path.clone());
        }

        if let Some(search_path) = &self.search_path {
            for dir in std::env::split_paths(search_path) {
                for name in &self.names {
                    let path = dir.join(name);
                    if path.is_file() {
                        debug!(path = %path.display(), "[ToolLocator] found on PATH");
                        candidates.push(path);
                    }
                }
            }
        }

        for dir in &self.bundled_dirs {
            for name in &self.names {
                candidates.push(dir.join(name));
            }
        }

        candidates
    }
}
