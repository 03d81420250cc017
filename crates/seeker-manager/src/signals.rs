use tokio::signal::unix::{signal, SignalKind};

/// Resolves once either `SIGINT` or `SIGTERM` arrives.
pub async fn wait_for_shutdown() {
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}
