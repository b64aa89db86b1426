// Process configuration read from the environment

use std::path::PathBuf;
use tracing::warn;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_RETRIES: u32 = 10;
const DEFAULT_SLEEP_REQUESTS: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Root under which every request gets its own work directory
    pub download_dir: PathBuf,
    /// yt-dlp program name or path
    pub ytdlp_path: String,
    pub retries: u32,
    pub fragment_retries: u32,
    pub sleep_requests: Option<f64>,
    pub request_headers: Vec<(String, String)>,
    /// FFMPEG_PATH
    pub ffmpeg_override: Option<PathBuf>,
    /// YTDLP_COOKIES_B64
    pub cookies_inline: Option<String>,
    /// YTDLP_COOKIES
    pub cookies_file: Option<PathBuf>,
    /// Checked last, relative to the working directory
    pub cookies_default: PathBuf,
    /// Where an inline cookie blob gets written
    pub cookies_temp_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let tmp = std::env::temp_dir();
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            download_dir: tmp.join("media-fetch"),
            ytdlp_path: "yt-dlp".to_string(),
            retries: DEFAULT_RETRIES,
            fragment_retries: DEFAULT_RETRIES,
            sleep_requests: Some(DEFAULT_SLEEP_REQUESTS),
            request_headers: Vec::new(),
            ffmpeg_override: None,
            cookies_inline: None,
            cookies_file: None,
            cookies_default: PathBuf::from("cookies.txt"),
            cookies_temp_path: tmp.join("media-fetch-cookies.txt"),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let sleep_requests = match get("YTDLP_SLEEP_REQUESTS") {
            Some(raw) => match raw.parse::<f64>() {
                Ok(v) if v > 0.0 => Some(v),
                Ok(_) => None,
                Err(_) => {
                    warn!("[Config] YTDLP_SLEEP_REQUESTS={raw:?} is not a number, using default");
                    defaults.sleep_requests
                }
            },
            None => defaults.sleep_requests,
        };

        Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or("PORT", get("PORT"), defaults.port),
            download_dir: get("DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.download_dir),
            ytdlp_path: get("YTDLP_PATH").unwrap_or(defaults.ytdlp_path),
            retries: parse_or("YTDLP_RETRIES", get("YTDLP_RETRIES"), defaults.retries),
            fragment_retries: parse_or(
                "YTDLP_FRAGMENT_RETRIES",
                get("YTDLP_FRAGMENT_RETRIES"),
                defaults.fragment_retries,
            ),
            sleep_requests,
            request_headers: get("YTDLP_HEADERS")
                .map(|raw| parse_headers(&raw))
                .unwrap_or_default(),
            ffmpeg_override: get("FFMPEG_PATH").map(PathBuf::from),
            cookies_inline: get("YTDLP_COOKIES_B64"),
            cookies_file: get("YTDLP_COOKIES").map(PathBuf::from),
            cookies_default: get("YTDLP_COOKIES_DEFAULT")
                .map(PathBuf::from)
                .unwrap_or(defaults.cookies_default),
            cookies_temp_path: defaults.cookies_temp_path,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr + Copy>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        Some(value) => value.parse().unwrap_or_else(|_| {
            warn!("[Config] {key}={value:?} is not valid, using default");
            default
        }),
        None => default,
    }
}

/// `Name: value` pairs separated by `;` or newlines
pub fn parse_headers(raw: &str) -> Vec<(String, String)> {
    raw.split(['\n', ';'])
        .filter_map(|pair| {
            let (name, value) = pair.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}
