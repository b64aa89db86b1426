// HTTP shell - form page, download endpoint, health check

use axum::{
    body::Body,
    extract::{rejection::FormRejection, State},
    http::{
        header::{ACCEPT, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::downloader::models::TARGET_MIME;
use crate::downloader::{AcquisitionRequest, ClassifiedError, Delivery, Downloader, ErrorKind};

#[derive(Clone)]
pub struct AppState {
    pub downloader: Arc<Downloader>,
    pub config: Arc<Config>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadForm {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'a str>,
}

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Media Fetch</title>
<style>
body { font-family: system-ui, sans-serif; max-width: 40rem; margin: 4rem auto; padding: 0 1rem; }
input[type=url] { width: 100%; padding: .5rem; }
.error { color: #a00; white-space: pre-wrap; }
</style>
</head>
<body>
<h1>Media Fetch</h1>
{{error}}
<form method="post" action="/download">
<input type="url" name="url" placeholder="Paste a video URL" required autofocus>
<button type="submit">Download</button>
</form>
</body>
</html>
"#;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/download", post(download))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn index() -> Html<String> {
    render_page(None)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn download(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<DownloadForm>, FormRejection>,
) -> Response {
    let structured = wants_structured_response(&headers);
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => {
            info!("[Web] rejected form submission: {}", rejection.body_text());
            let err = ClassifiedError::invalid_input(format!(
                "Could not read the submitted form: {}",
                rejection.body_text()
            ));
            return error_response(&err, structured);
        }
    };
    let req = AcquisitionRequest::new(form.url.trim()).structured(structured);

    let delivery = match state.downloader.fetch(&req, &state.config).await {
        Ok(delivery) => delivery,
        Err(e) => return error_response(&e, req.wants_structured_response),
    };

    match stream_delivery(delivery).await {
        Ok(response) => response,
        Err(e) => error_response(&e, req.wants_structured_response),
    }
}

/// Programmatic callers get JSON errors, browsers get the page back
pub fn wants_structured_response(headers: &HeaderMap) -> bool {
    if headers.contains_key("x-requested-with") {
        return true;
    }
    headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}

async fn stream_delivery(delivery: Delivery) -> Result<Response, ClassifiedError> {
    let Delivery {
        result,
        download_name,
        guard,
    } = delivery;

    let internal = |e: std::io::Error| ClassifiedError::new(ErrorKind::Internal, e.to_string());
    let file = tokio::fs::File::open(&result.source_file).await.map_err(internal)?;
    let length = file.metadata().await.map_err(internal)?.len();

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", download_name))
        .map_err(|e| ClassifiedError::new(ErrorKind::Internal, e.to_string()))?;

    info!(
        file = %result.source_file.display(),
        bytes = length,
        "[Web] streaming {}",
        download_name
    );

    let body = Body::from_stream(guard.into_body(file));
    let mut response = Response::new(body);
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(TARGET_MIME));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    headers.insert(CONTENT_DISPOSITION, disposition);
    Ok(response)
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    if kind.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

pub fn error_response(err: &ClassifiedError, structured: bool) -> Response {
    let status = status_for(err.kind);
    if status.is_server_error() {
        error!(kind = %err.kind, "[Web] request failed: {}", err.message);
    }

    if structured {
        let body = ErrorBody {
            error: &err.message,
            kind: err.kind,
            hint: err.hint.as_deref(),
        };
        return (status, Json(body)).into_response();
    }

    let prefix = match err.kind {
        ErrorKind::InvalidInput | ErrorKind::OutputMissing => "",
        ErrorKind::ExtractionFailed | ErrorKind::AuthRequired | ErrorKind::ToolUnavailable => "Download error: ",
        ErrorKind::Internal => "Failed: ",
    };
    let text = format!("{}{}", prefix, err.display_with_hint());
    (status, render_page(Some(&text))).into_response()
}

fn render_page(error: Option<&str>) -> Html<String> {
    let block = error
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape_html(e)))
        .unwrap_or_default();
    Html(INDEX_HTML.replace("{{error}}", &block))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
