use axum::http::{StatusCode, header};
use axum::response::IntoResponse;

// Liveness only; does not reflect scrape state
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain")], "OK")
}
