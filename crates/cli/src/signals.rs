//! Translates SIGINT/SIGTERM into a fired [`CancelSource`].

use std::sync::Arc;

use tracing::info;
use tracker::CancelSource;

/// Waits for an interrupt and fires `source`. Runs until a signal arrives.
pub async fn cancel_on_signal(source: Arc<CancelSource>) {
    let name = wait_for_signal().await;
    info!(signal = name, "received signal, cancelling");
    source.cancel();
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            tracing::debug!(error = %e, "SIGTERM handler unavailable");
            return ctrl_c().await;
        }
    };

    tokio::select! {
        name = ctrl_c() => name,
        _ = terminate.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::debug!(error = %e, "SIGINT handler unavailable");
        std::future::pending::<()>().await;
    }
    "SIGINT"
}
