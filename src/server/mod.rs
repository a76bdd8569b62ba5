//! HTTP/JSON front end.
//!
//! Transport concerns only: routing, body parsing and translating error
//! kinds into statuses. Every operation runs through
//! [`crate::service::dispatch`].

pub mod config;
pub mod error;
pub mod http;

pub use config::Config;
pub use error::ApiError;
pub use http::router;

use crate::service::Service;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

/// Bind `config`'s address and serve until Ctrl+C or SIGTERM.
pub async fn serve(config: &Config) -> std::io::Result<()> {
    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router(Service::new()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, initiating shutdown"),
            Err(e) => {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, initiating shutdown");
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
