//! Verdict-gated credential requests.
//!
//! The fetcher holds no session state. Every call takes the caller's current
//! verdict; when it is `Unavailable` no request is issued at all, so the
//! host never sees traffic from a context that believes it is locked out.

use pendrive_core::{CredentialRecord, Verdict};

use crate::api::HostApi;
use crate::error::{HostError, SaveError};
use crate::probe::probe;

/// Records plus the error that cut the fetch short, if any.
///
/// A failed fetch yields an empty record list; the error is for display.
#[derive(Debug, Default)]
pub struct FetchResult {
    pub records: Vec<CredentialRecord>,
    pub error: Option<HostError>,
}

impl FetchResult {
    fn from_result(result: Result<Vec<CredentialRecord>, HostError>) -> Self {
        match result {
            Ok(records) => Self {
                records,
                error: None,
            },
            Err(e) => {
                tracing::warn!("credential fetch failed: {e}");
                Self {
                    records: Vec::new(),
                    error: Some(e),
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct CredentialFetcher<H> {
    host: H,
}

impl<H: HostApi> CredentialFetcher<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub async fn probe(&self) -> pendrive_core::ProbeOutcome {
        probe(&self.host).await
    }

    pub async fn fetch_all(&self, verdict: Verdict) -> FetchResult {
        if !verdict.is_available() {
            return FetchResult::default();
        }
        FetchResult::from_result(self.host.passwords().await)
    }

    pub async fn fetch_by_domain(&self, verdict: Verdict, domain: &str) -> FetchResult {
        if !verdict.is_available() || domain.trim().is_empty() {
            return FetchResult::default();
        }
        FetchResult::from_result(self.host.passwords_for(domain.trim()).await)
    }

    /// Validate locally, then save. Blank fields and an unavailable host are
    /// both rejected before any request is made.
    pub async fn save(&self, verdict: Verdict, record: &CredentialRecord) -> Result<(), SaveError> {
        let record = record.trimmed();
        record.validate()?;
        if !verdict.is_available() {
            return Err(SaveError::Unavailable);
        }
        self.host.save(&record).await?;
        tracing::info!("saved credential for {}", record.website);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHost;
    use pendrive_core::{StatusReport, ValidationError};
    use std::sync::Arc;

    fn fetcher(host: &Arc<FakeHost>) -> CredentialFetcher<Arc<FakeHost>> {
        CredentialFetcher::new(Arc::clone(host))
    }

    fn seeded() -> Arc<FakeHost> {
        let host = Arc::new(FakeHost::new());
        host.set_status(Some(StatusReport {
            server_running: true,
            pendrive_detected: true,
            java_running: true,
            passwords_count: 2,
        }));
        host.set_records(vec![
            CredentialRecord::new("example.com", "ann", "pw1"),
            CredentialRecord::new("other.org", "bob", "pw2"),
        ]);
        host
    }

    #[tokio::test]
    async fn unavailable_fetch_makes_no_request() {
        let host = seeded();
        let f = fetcher(&host);

        let all = f.fetch_all(Verdict::Unavailable).await;
        let by_domain = f.fetch_by_domain(Verdict::Unavailable, "example.com").await;

        assert!(all.is_empty() && all.error.is_none());
        assert!(by_domain.is_empty() && by_domain.error.is_none());
        assert_eq!(host.calls().list, 0);
        assert_eq!(host.calls().by_domain, 0);
    }

    #[tokio::test]
    async fn available_fetch_returns_records() {
        let host = seeded();
        let f = fetcher(&host);
        let all = f.fetch_all(Verdict::Available).await;
        assert_eq!(all.records.len(), 2);

        let scoped = f.fetch_by_domain(Verdict::Available, "example.com").await;
        assert_eq!(scoped.records.len(), 1);
        assert_eq!(host.calls().list, 1);
        assert_eq!(host.calls().by_domain, 1);
    }

    #[tokio::test]
    async fn fetch_failure_is_empty_plus_error() {
        let host = seeded();
        host.fail_fetches(true);
        let result = fetcher(&host).fetch_all(Verdict::Available).await;
        assert!(result.is_empty());
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn save_with_blank_website_never_reaches_host() {
        let host = seeded();
        let record = CredentialRecord::new("", "ann", "pw");
        let err = fetcher(&host)
            .save(Verdict::Available, &record)
            .await
            .expect_err("validation failure");
        assert!(matches!(
            err,
            SaveError::Validation(ValidationError::MissingField("website"))
        ));
        assert_eq!(host.calls().save, 0);
    }

    #[tokio::test]
    async fn save_while_unavailable_never_reaches_host() {
        let host = seeded();
        let record = CredentialRecord::new("example.com", "ann", "pw");
        let err = fetcher(&host)
            .save(Verdict::Unavailable, &record)
            .await
            .expect_err("unavailable");
        assert!(matches!(err, SaveError::Unavailable));
        assert_eq!(host.calls().save, 0);
    }

    #[tokio::test]
    async fn save_trims_and_forwards() {
        let host = seeded();
        let record = CredentialRecord::new(" new.io ", "carol", "pw3 ");
        fetcher(&host)
            .save(Verdict::Available, &record)
            .await
            .expect("saved");
        assert_eq!(
            host.saved(),
            vec![CredentialRecord::new("new.io", "carol", "pw3")]
        );
    }

    #[tokio::test]
    async fn host_rejection_surfaces_reason() {
        let host = seeded();
        host.reject_saves(Some("Failed to save password"));
        let record = CredentialRecord::new("new.io", "carol", "pw3");
        let err = fetcher(&host)
            .save(Verdict::Available, &record)
            .await
            .expect_err("rejected");
        assert_eq!(err.to_string(), "save rejected: Failed to save password");
    }
}
