//! `pendrive save`: validate and store one credential.

use pendrive_client::{CredentialFetcher, HostApi, HttpHost};
use pendrive_core::CredentialRecord;
use pendrive_runtime::config::RuntimeConfig;

pub(crate) async fn save_record<H: HostApi>(
    fetcher: &CredentialFetcher<H>,
    record: &CredentialRecord,
) -> anyhow::Result<()> {
    // Validate before probing so a typo never costs a request.
    record.trimmed().validate()?;
    let verdict = fetcher.probe().await.verdict();
    fetcher.save(verdict, record).await?;
    Ok(())
}

pub async fn cmd_save(
    config: &RuntimeConfig,
    website: &str,
    username: &str,
    password: &str,
) -> anyhow::Result<()> {
    let host = HttpHost::new(&config.host_url, config.request_timeout)?;
    let record = CredentialRecord::new(website, username, password);
    save_record(&CredentialFetcher::new(host), &record).await?;
    println!("Saved credential for {} ({})", record.website.trim(), record.username.trim());
    Ok(())
}
