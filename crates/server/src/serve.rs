//! Server loop.

use crate::routes::create_router;
use crate::state::AppState;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Bind the configured listen address.
pub async fn bind(state: &AppState) -> std::io::Result<TcpListener> {
    let addr = state
        .config
        .server
        .bind_addr()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    Ok(listener)
}

/// Accept connections until `shutdown` resolves.
///
/// Each connection is served on its own task, so a slow or failing client
/// never blocks accepting others. Accept errors are logged and retried by
/// the underlying server.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}

/// Spawn the server loop in the background and return its local address.
pub async fn spawn(
    state: AppState,
) -> std::io::Result<(SocketAddr, tokio::task::JoinHandle<std::io::Result<()>>)> {
    let listener = bind(&state).await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(serve(listener, state, std::future::pending()));
    Ok((addr, handle))
}
