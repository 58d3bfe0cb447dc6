//! Crawler exclusion endpoint.

use axum::http::StatusCode;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::response::IntoResponse;
use hshare_core::ROBOTS_TXT;

/// GET /robots.txt - Disallow everything. Served without the secret.
pub async fn robots_txt() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (CONTENT_LENGTH, ROBOTS_TXT.len().to_string()),
        ],
        ROBOTS_TXT,
    )
}
