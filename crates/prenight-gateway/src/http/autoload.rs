use axum::{http::header, response::IntoResponse};

static AUTOLOAD_JS: &str = include_str!("../../static/autoload.js");

/// Serve the client script that embeds plot documents at `GET /autoload.js`.
pub async fn autoload_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        AUTOLOAD_JS,
    )
}
