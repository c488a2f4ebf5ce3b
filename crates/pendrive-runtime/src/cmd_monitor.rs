//! `pendrive monitor`: run the background context until interrupted.

use pendrive_client::{CredentialFetcher, HttpHost};
use pendrive_runtime::background::BackgroundContext;
use pendrive_runtime::bus::AvailabilityBus;
use pendrive_runtime::config::RuntimeConfig;
use pendrive_runtime::monitor::AvailabilityMonitor;
use pendrive_runtime::sink::TracingSink;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub async fn cmd_monitor(config: &RuntimeConfig) -> anyhow::Result<()> {
    let host = HttpHost::new(&config.host_url, config.request_timeout)?;
    tracing::info!(
        "monitoring {} every {:?} (backstop {:?})",
        host.base_url(),
        config.poll_interval,
        config.backstop_interval
    );

    let bus = AvailabilityBus::new();
    let monitor =
        AvailabilityMonitor::broadcasting(CredentialFetcher::new(host), TracingSink::default(), bus);
    let background = BackgroundContext::new(monitor, config.domain_match);

    // No page or popup is attached in the CLI; keep the sender alive so the
    // request arm simply idles.
    let (_requests_tx, requests_rx) = mpsc::channel(16);
    let cancel = CancellationToken::new();
    let task = tokio::spawn({
        let config = config.clone();
        let cancel = cancel.clone();
        async move { background.run(&config, requests_rx, cancel).await }
    });

    shutdown_signal().await;
    tracing::info!("shutting down");
    cancel.cancel();
    task.await?;
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            tracing::warn!("cannot listen for SIGTERM: {e}");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
