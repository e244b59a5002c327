//! HTTP surface: router, startup and graceful shutdown.

mod error;
mod handler;

pub use error::{HttpError, Result};
pub use handler::{FILES_FIELD, ZIP_CONTENT_TYPE, zip_files};

use std::io;
use std::net::SocketAddr;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::archive::Archiver;
use crate::cli::ServeArgs;

/// Tracing target for server lifecycle events.
const TRACING_TARGET: &str = "zipcast::server";

/// Build the application router.
///
/// `max_upload_size` bounds the whole request body in bytes.
pub fn router(archiver: Archiver, max_upload_size: usize) -> Router {
    Router::new()
        .route("/api/zip", post(zip_files))
        .layer(DefaultBodyLimit::max(max_upload_size))
        .layer(TraceLayer::new_for_http())
        .with_state(archiver)
}

/// Bind and serve until Ctrl+C or SIGTERM.
pub async fn serve(args: &ServeArgs) -> io::Result<()> {
    let addr = SocketAddr::new(args.host, args.port);
    let listener = TcpListener::bind(addr).await.inspect_err(|err| {
        tracing::error!(target: TRACING_TARGET, addr = %addr, error = %err, "failed to bind");
    })?;

    tracing::info!(
        target: TRACING_TARGET,
        addr = %listener.local_addr()?,
        max_upload_size = args.max_upload_size,
        "server is listening"
    );

    let app = router(Archiver::new(), args.max_upload_size);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(target: TRACING_TARGET, "server shut down gracefully");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(
                target: TRACING_TARGET,
                error = %err,
                "failed to install Ctrl+C handler"
            );
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
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %err,
                    "failed to install SIGTERM handler"
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!(target: TRACING_TARGET, "shutdown signal received");
}
