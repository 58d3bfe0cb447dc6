//! Request logging middleware.
//!
//! Every request that reaches the router appends one line to the shared
//! [`RequestLog`]: client address, timestamp, request line and status, plus
//! the fault description when the handler failed unexpectedly.

use crate::error::FaultReport;
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use hshare_core::RequestLog;
use std::net::SocketAddr;

/// Client address of the current request, inserted into request extensions.
#[derive(Clone, Debug)]
pub struct ClientAddr(pub String);

impl ClientAddr {
    /// Get the address as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Extract the peer IP from request extensions (set by ConnectInfo).
fn client_addr(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Record each request in the request log.
pub async fn access_log_middleware(
    State(log): State<RequestLog>,
    mut req: Request,
    next: Next,
) -> Response {
    let client = client_addr(&req);
    let request_line = format!("{} {} {:?}", req.method(), req.uri(), req.version());
    req.extensions_mut().insert(ClientAddr(client.clone()));

    let response = next.run(req).await;

    let status = response.status().as_u16();
    // No other lock is held at this point.
    log.record(&client, &format!("\"{request_line}\" {status} -"));
    if let Some(FaultReport(fault)) = response.extensions().get::<FaultReport>() {
        log.record(&client, fault);
    }

    response
}
