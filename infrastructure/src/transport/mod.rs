//! Wire bindings
//!
//! Both protocols implement
//! [`TransportBinding`](strix_application::TransportBinding) on the client
//! side and serve a shared [`ToolService`](strix_application::ToolService)
//! on the server side.

pub mod grpc;
pub mod http;
pub mod url;

use crate::config::{FileClientConfig, FilePoolConfig};
use std::sync::Arc;
use strix_application::{ConnectionPool, Protocol, TransportBinding, TransportError};
use strix_domain::ErrorKind;
use thiserror::Error;
use tokio::task::JoinHandle;

pub use grpc::{GrpcBinding, GrpcChannelFactory};
pub use http::{HttpBinding, HttpChannelFactory};

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),

    #[error("gRPC server error: {0}")]
    Grpc(#[from] tonic::transport::Error),
}

/// A client binding plus the task pruning its idle channels.
pub struct ConnectedBinding {
    pub binding: Arc<dyn TransportBinding>,
    pub reaper: JoinHandle<()>,
}

/// Build the configured client binding over its own connection pool.
///
/// Must be called inside a tokio runtime.
pub fn connect(
    client: &FileClientConfig,
    pool: &FilePoolConfig,
) -> Result<ConnectedBinding, TransportError> {
    let server_url = client.server_url.as_deref().ok_or_else(|| {
        TransportError::new(
            ErrorKind::InvalidArguments,
            "No server URL configured (set STRIX_SERVER_URL or client.server_url)",
        )
    })?;
    let token = client.auth_token.clone();

    Ok(match client.transport {
        Protocol::Grpc => {
            let pool_handle = Arc::new(ConnectionPool::new(GrpcChannelFactory, pool.to_pool_config()));
            let reaper = pool_handle.spawn_idle_reaper(pool.cleanup_interval());
            ConnectedBinding {
                binding: Arc::new(GrpcBinding::new(server_url, token, pool_handle)?),
                reaper,
            }
        }
        Protocol::Http => {
            let pool_handle = Arc::new(ConnectionPool::new(HttpChannelFactory, pool.to_pool_config()));
            let reaper = pool_handle.spawn_idle_reaper(pool.cleanup_interval());
            ConnectedBinding {
                binding: Arc::new(HttpBinding::new(server_url, token, pool_handle)?),
                reaper,
            }
        }
    })
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("Shutdown signal received, draining in-flight requests");
}
