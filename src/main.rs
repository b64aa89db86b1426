#[tokio::main]
async fn main() {
    if let Err(e) = media_fetch_lib::run().await {
        tracing::error!("[Server] fatal: {}", e);
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
