pub mod config;
pub mod downloader;
pub mod web;

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use downloader::{lifecycle, AcquireOptions, Downloader, YtDlpBackend};

/// Install the tracing subscriber; `RUST_LOG` overrides the default filter
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("media_fetch_lib=info,media_fetch=info,tower_http=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Shared state for a config: the yt-dlp backend rooted at `download_dir`
pub fn build_state(config: Config) -> web::AppState {
    let backend = Arc::new(YtDlpBackend::new(config.ytdlp_path.clone()));
    let downloader = Downloader::new(backend, config.download_dir.clone(), AcquireOptions::from(&config));
    web::AppState {
        downloader: Arc::new(downloader),
        config: Arc::new(config),
    }
}

pub async fn run() -> std::io::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Config::from_env();
    tokio::fs::create_dir_all(&config.download_dir).await?;
    lifecycle::sweep_stale(&config.download_dir).await;

    let addr = config.bind_addr();
    info!(
        download_dir = %config.download_dir.display(),
        ytdlp = %config.ytdlp_path,
        "[Server] configuration loaded"
    );

    let app = web::router(build_state(config));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("[Server] listening on http://{}", addr);
    axum::serve(listener, app).await
}
