//! Server startup and graceful shutdown

use std::ops::{Range, RangeInclusive};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use libunftp::options::Shutdown;
use libunftp::ServerBuilder;
use tokio::sync::oneshot;

use intake_core::{Config, FileEventHandler};

use crate::constants::{GREETING, SHUTDOWN_GRACE_PERIOD_SECS};
use crate::ftp::{AnonymousAuthenticator, IntakeBackend};

/// Start the FTP server with graceful shutdown
pub async fn start_server(config: &Config, handler: Arc<dyn FileEventHandler>) -> Result<()> {
    let backend = IntakeBackend::new(config.upload_root(), handler);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(());
    });

    let server = ServerBuilder::with_authenticator(
        Box::new(move || backend.clone()),
        Arc::new(AnonymousAuthenticator),
    )
    .greeting(GREETING)
    .passive_ports(passive_range(config.passive_ports()))
    .idle_session_timeout(config.idle_timeout_secs())
    .shutdown_indicator(async move {
        let _ = shutdown_rx.await;
        Shutdown::new().grace_period(Duration::from_secs(SHUTDOWN_GRACE_PERIOD_SECS))
    })
    .build()
    .context("Failed to build FTP server")?;

    let addr = config.listen_addr();
    let passive = config.passive_ports();
    tracing::info!(
        addr = %addr,
        passive_ports = %format!("{}-{}", passive.start(), passive.end()),
        idle_timeout_secs = config.idle_timeout_secs(),
        upload_rate_limit = config.upload_rate_limit(),
        upload_rate_window_secs = config.upload_rate_window().as_secs(),
        "FTP server ready and accepting connections"
    );

    server.listen(addr).await.context("FTP server failed")?;

    tracing::info!("FTP server stopped");
    Ok(())
}

/// The engine takes an exclusive range; the configured range is inclusive.
///
/// Port 65535 cannot be expressed as an exclusive end and is left out.
fn passive_range(ports: RangeInclusive<u16>) -> Range<u16> {
    let (start, end) = ports.into_inner();
    if end == u16::MAX {
        tracing::warn!(
            start,
            end,
            "Passive port 65535 cannot be offered, using {}-{}",
            start,
            end - 1
        );
    }
    start..end.saturating_add(1)
}

/// Signal handler for graceful shutdown
///
/// Listens for Ctrl+C (SIGINT) and SIGTERM signals to initiate graceful shutdown.
///
/// # Panics
/// - Panics if Ctrl+C signal handler cannot be installed (unrecoverable system error)
/// - On Unix systems, panics if SIGTERM signal handler cannot be installed (unrecoverable system error)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal");
        },
    }

    tracing::info!("Shutting down gracefully...");
}
