//! `pendrive status` and `pendrive list`.

use pendrive_client::{CredentialFetcher, HostApi, HttpHost};
use pendrive_core::{CredentialRecord, ProbeOutcome, Verdict};
use pendrive_runtime::config::RuntimeConfig;

/// JSON view of one probe: the raw report (if any) plus the verdict.
pub(crate) fn status_json(outcome: &ProbeOutcome) -> serde_json::Value {
    let verdict = outcome.verdict();
    match outcome {
        ProbeOutcome::Report(report) => serde_json::json!({
            "verdict": verdict.as_str(),
            "report": report,
            "missing": report.missing_condition(),
        }),
        ProbeOutcome::Failed(reason) => serde_json::json!({
            "verdict": verdict.as_str(),
            "report": null,
            "error": reason,
        }),
    }
}

/// One line per record. Secrets never leave this function.
pub(crate) fn format_list(records: &[CredentialRecord]) -> Vec<String> {
    let width = records
        .iter()
        .map(|r| r.website.chars().count())
        .max()
        .unwrap_or(0);
    records
        .iter()
        .map(|r| format!("{:<width$}  {}", r.website, r.username))
        .collect()
}

pub(crate) async fn list_records<H: HostApi>(
    fetcher: &CredentialFetcher<H>,
) -> anyhow::Result<Vec<CredentialRecord>> {
    let outcome = fetcher.probe().await;
    let verdict = outcome.verdict();
    if verdict == Verdict::Unavailable {
        let detail = match &outcome {
            ProbeOutcome::Report(report) => report.missing_condition().unwrap_or("unavailable"),
            ProbeOutcome::Failed(reason) => reason.as_str(),
        };
        anyhow::bail!("credential host unavailable: {detail}");
    }
    let fetched = fetcher.fetch_all(verdict).await;
    if let Some(error) = fetched.error {
        return Err(error.into());
    }
    Ok(fetched.records)
}

pub async fn cmd_status(config: &RuntimeConfig) -> anyhow::Result<()> {
    let host = HttpHost::new(&config.host_url, config.request_timeout)?;
    let outcome = pendrive_client::probe(&host).await;
    println!("{}", serde_json::to_string_pretty(&status_json(&outcome))?);
    Ok(())
}

pub async fn cmd_list(config: &RuntimeConfig) -> anyhow::Result<()> {
    let host = HttpHost::new(&config.host_url, config.request_timeout)?;
    let records = list_records(&CredentialFetcher::new(host)).await?;
    if records.is_empty() {
        println!("No saved passwords.");
        return Ok(());
    }
    for line in format_list(&records) {
        println!("{line}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pendrive_client::testing::FakeHost;
    use pendrive_core::StatusReport;
    use std::sync::Arc;

    #[test]
    fn status_json_reports_verdict_and_missing_condition() {
        let report = StatusReport {
            server_running: true,
            pendrive_detected: false,
            java_running: true,
            passwords_count: 2,
        };
        let json = status_json(&ProbeOutcome::Report(report));
        assert_eq!(json["verdict"], "unavailable");
        assert_eq!(json["missing"], "pendrive not detected");
        assert_eq!(json["report"]["passwords_count"], 2);
    }

    #[test]
    fn status_json_for_failed_probe() {
        let json = status_json(&ProbeOutcome::Failed("connection refused".into()));
        assert_eq!(json["verdict"], "unavailable");
        assert!(json["report"].is_null());
        assert_eq!(json["error"], "connection refused");
    }

    #[test]
    fn list_never_prints_secrets() {
        let lines = format_list(&[
            CredentialRecord::new("example.com", "ann", "hunter2"),
            CredentialRecord::new("a.io", "bob", "swordfish"),
        ]);
        assert_eq!(lines, vec!["example.com  ann", "a.io         bob"]);
        assert!(lines.iter().all(|l| !l.contains("hunter2") && !l.contains("swordfish")));
    }

    #[tokio::test]
    async fn list_refuses_when_unavailable() {
        let host = Arc::new(FakeHost::new());
        host.set_status(Some(FakeHost::report(false, 1)));
        let err = list_records(&CredentialFetcher::new(Arc::clone(&host)))
            .await
            .expect_err("unavailable");
        assert!(err.to_string().contains("pendrive not detected"));
        assert_eq!(host.credential_calls(), 0);
    }
}
