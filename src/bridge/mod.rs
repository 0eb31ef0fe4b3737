//! Host bridge - an HTTP surface through which a host delivers events
//!
//! Each endpoint maps to one agent event. The bridge owns an [`InMemoryHost`]
//! so displayed notifications and opened windows can be inspected over HTTP.
//!
//! [`InMemoryHost`]: crate::host::InMemoryHost

mod handler;

pub use handler::{router, BridgeState, SOURCE_HEADER};

use crate::error::Result;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Serve the bridge until `shutdown` resolves
pub async fn serve<F>(state: BridgeState, addr: SocketAddr, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Host bridge listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Host bridge stopped");
    Ok(())
}
