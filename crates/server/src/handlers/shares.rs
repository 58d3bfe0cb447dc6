//! Share endpoints: the directory index and file downloads.
//!
//! Routing under the secret is done by hand because the prefix is only known
//! at runtime and anything outside it must be answered with 403, not 404:
//!
//! - `/{secret}/` - HTML index of the current shares
//! - `/{secret}/{name}` - file download, with `If-Modified-Since` and `Range`
//! - `/{secret}/a/b` - 404
//! - anything else - 403

use crate::access_log::ClientAddr;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Extension;
use axum::body::Body;
use axum::extract::State;
use axum::http::header::{
    ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, IF_MODIFIED_SINCE, LAST_MODIFIED,
    RANGE,
};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use futures::TryStreamExt;
use hshare_core::{
    ByteRange, decode_name, http_date, is_not_modified, parse_range, render_index, validate_range,
};
use std::io::SeekFrom;
use std::path::Path;
use std::time::SystemTime;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

/// What the caller wants done with the body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BodyMode {
    Send,
    Omit,
}

impl BodyMode {
    fn for_method(method: &Method) -> ApiResult<Self> {
        match *method {
            Method::GET => Ok(Self::Send),
            Method::HEAD => Ok(Self::Omit),
            _ => Err(ApiError::NotImplemented(method.clone())),
        }
    }
}

/// Fallback handler for every path except `/robots.txt`.
pub async fn share_fallback(
    State(state): State<AppState>,
    Extension(client): Extension<ClientAddr>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let mode = BodyMode::for_method(&method)?;

    let Some(rest) = state.secret.strip_prefix(uri.path()) else {
        return Err(ApiError::Forbidden);
    };

    if rest.is_empty() {
        return index_response(&state, mode);
    }
    if rest.contains('/') {
        return Err(ApiError::NotFound(format!("nested path: {rest}")));
    }

    let name = decode_name(rest);
    file_response(&state, &client, &name, &headers, mode).await
}

/// GET|HEAD /{secret}/ - Directory index.
fn index_response(state: &AppState, mode: BodyMode) -> ApiResult<Response> {
    // Snapshot first; rendering happens with the registry unlocked.
    let names = state.registry.list_names();
    let html = render_index(&state.secret.root_path(), &names)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let headers = [
        (CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
        (CONTENT_LENGTH, html.len().to_string()),
    ];
    Ok(match mode {
        BodyMode::Send => (StatusCode::OK, headers, html).into_response(),
        BodyMode::Omit => (StatusCode::OK, headers, Body::empty()).into_response(),
    })
}

/// Size and modification time of a shared file, read fresh per request.
struct FileMeta {
    size: u64,
    mtime: SystemTime,
}

/// Stat the shared file. Missing, non-regular and empty files are all 404.
async fn stat_share(name: &str, path: &Path) -> ApiResult<FileMeta> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound(format!("share vanished: {name}")));
        }
        Err(e) => return Err(e.into()),
    };
    if !metadata.is_file() {
        return Err(ApiError::NotFound(format!("share is not a file: {name}")));
    }
    if metadata.len() == 0 {
        return Err(ApiError::NotFound(format!("share is empty: {name}")));
    }
    Ok(FileMeta {
        size: metadata.len(),
        mtime: metadata.modified()?,
    })
}

/// GET|HEAD /{secret}/{name} - Serve a shared file.
async fn file_response(
    state: &AppState,
    client: &ClientAddr,
    name: &str,
    headers: &HeaderMap,
    mode: BodyMode,
) -> ApiResult<Response> {
    let path = state
        .registry
        .get(name)
        .ok_or_else(|| ApiError::NotFound(format!("not shared: {name}")))?;
    let meta = stat_share(name, &path).await?;

    if let Some(since) = headers
        .get(IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        && is_not_modified(since, meta.mtime)
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let content_type = mime_guess::from_path(name)
        .first_or_octet_stream()
        .to_string();
    let last_modified = http_date(meta.mtime);

    // A Range header that does not parse is ignored rather than rejected.
    let requested = headers
        .get(RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_range);

    if let Some((start, end)) = requested {
        let range = validate_range(start, end, meta.size)?;
        let response_headers = [
            (CONTENT_TYPE, content_type),
            (CONTENT_RANGE, range.content_range(meta.size)),
            (CONTENT_LENGTH, range.len().to_string()),
            (LAST_MODIFIED, last_modified),
            (ACCEPT_RANGES, "bytes".to_string()),
        ];
        let body = match mode {
            BodyMode::Send => stream_file(state, client, name, &path, range).await?,
            BodyMode::Omit => Body::empty(),
        };
        return Ok((StatusCode::PARTIAL_CONTENT, response_headers, body).into_response());
    }

    let response_headers = [
        (CONTENT_TYPE, content_type),
        (CONTENT_LENGTH, meta.size.to_string()),
        (LAST_MODIFIED, last_modified),
        (ACCEPT_RANGES, "bytes".to_string()),
    ];
    let body = match mode {
        BodyMode::Send => {
            let whole = ByteRange {
                start: 0,
                end: meta.size - 1,
            };
            stream_file(state, client, name, &path, whole).await?
        }
        BodyMode::Omit => Body::empty(),
    };
    Ok((StatusCode::OK, response_headers, body).into_response())
}

/// Open `path` and stream exactly the bytes of `range` in bounded chunks.
///
/// Opening happens before any header is sent, so a file that vanished since
/// the stat is still a clean 404. Read errors after that point abort the
/// body and are recorded in the request log.
async fn stream_file(
    state: &AppState,
    client: &ClientAddr,
    name: &str,
    path: &Path,
    range: ByteRange,
) -> ApiResult<Body> {
    let mut file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound(format!("share vanished: {name}")));
        }
        Err(e) => return Err(e.into()),
    };
    if range.start > 0 {
        file.seek(SeekFrom::Start(range.start)).await?;
    }

    let log = state.log.clone();
    let client = client.as_str().to_string();
    let name = name.to_string();
    let stream = ReaderStream::with_capacity(file.take(range.len()), state.chunk_size())
        .inspect_err(move |e| {
            tracing::warn!(share = %name, error = %e, "file streaming failed mid-transfer");
            log.record(&client, &format!("error while streaming {name}: {e}"));
        });

    Ok(Body::from_stream(stream))
}
