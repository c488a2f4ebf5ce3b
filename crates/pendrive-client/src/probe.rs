use pendrive_core::ProbeOutcome;

use crate::api::HostApi;

/// Issue one status probe. Every failure mode becomes `ProbeOutcome::Failed`.
pub async fn probe<H: HostApi>(host: &H) -> ProbeOutcome {
    match host.status().await {
        Ok(report) => ProbeOutcome::Report(report),
        Err(e) => {
            tracing::debug!("status probe failed: {e}");
            ProbeOutcome::Failed(e.to_string())
        }
    }
}
