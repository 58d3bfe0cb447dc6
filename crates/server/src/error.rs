//! API error types.

use axum::body::Body;
use axum::http::header::{CONTENT_RANGE, CONTENT_TYPE};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};

/// Description of an unexpected fault, attached to the response so the
/// access log can record it.
#[derive(Clone, Debug)]
pub struct FaultReport(pub String);

/// API error type.
///
/// Client-visible bodies carry no detail beyond the status reason; the
/// message fields only reach tracing output and the request log.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("forbidden")]
    Forbidden,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("range not satisfiable for {size} byte file")]
    RangeNotSatisfiable { size: u64 },

    #[error("unsupported method: {0}")]
    NotImplemented(Method),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this error is a server fault rather than a client outcome.
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Internal(_))
    }
}

impl From<hshare_core::Unsatisfiable> for ApiError {
    fn from(e: hshare_core::Unsatisfiable) -> Self {
        Self::RangeNotSatisfiable { size: e.size }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            Self::RangeNotSatisfiable { size } => {
                return (
                    status,
                    [(CONTENT_RANGE, format!("bytes */{size}"))],
                    Body::empty(),
                )
                    .into_response();
            }
            Self::NotFound(detail) => tracing::debug!(detail = %detail, "not found"),
            _ if self.is_fault() => tracing::error!(error = %self, "request failed"),
            _ => {}
        }

        let reason = status.canonical_reason().unwrap_or("Error");
        let mut response = (
            status,
            [(CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("{} {}\n", status.as_u16(), reason),
        )
            .into_response();
        if self.is_fault() {
            response
                .extensions_mut()
                .insert(FaultReport(self.to_string()));
        }
        response
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
