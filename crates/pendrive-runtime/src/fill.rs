//! The single fill path every trigger funnels into.
//!
//! Context menu, keyboard shortcut and the in-page button all resolve a
//! credential here: gate on the local verdict, fetch by the page host (and,
//! under the suffix policy, its parent domains), keep the records the
//! configured policy accepts, take the first.

use pendrive_client::{CredentialFetcher, HostApi};
use pendrive_core::{CredentialRecord, DomainMatch, Verdict, host_of};

pub const BLOCKED_MESSAGE: &str =
    "Cannot access passwords: Server disconnected or pendrive removed";
pub const NO_MATCH_MESSAGE: &str = "No saved passwords found for this website";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillResolution {
    /// Local verdict is unavailable; nothing was requested.
    Blocked,
    /// The page has no usable host (e.g. `about:blank`).
    NoHost,
    NoMatch,
    /// The fetch failed; message is safe to display.
    Failed(String),
    Record(CredentialRecord),
}

impl FillResolution {
    /// User-facing message for every outcome but a resolved record.
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Blocked => Some(BLOCKED_MESSAGE.to_string()),
            Self::NoHost | Self::NoMatch => Some(NO_MATCH_MESSAGE.to_string()),
            Self::Failed(reason) => Some(format!("Failed to fetch passwords: {reason}")),
            Self::Record(_) => None,
        }
    }
}

pub async fn resolve_fill<H: HostApi>(
    fetcher: &CredentialFetcher<H>,
    verdict: Verdict,
    url: &str,
    policy: DomainMatch,
) -> FillResolution {
    if !verdict.is_available() {
        tracing::info!("fill blocked: host unavailable");
        return FillResolution::Blocked;
    }
    let Some(host) = host_of(url) else {
        return FillResolution::NoHost;
    };

    // Most specific lookup first; the first one with an accepted record wins.
    for domain in policy.lookup_domains(&host) {
        let fetched = fetcher.fetch_by_domain(verdict, &domain).await;
        if let Some(error) = fetched.error {
            return FillResolution::Failed(error.to_string());
        }
        if let Some(record) = policy.filter(&fetched.records, &host).first() {
            tracing::debug!("fill resolved {} for {host} via {domain}", record.website);
            return FillResolution::Record((*record).clone());
        }
    }
    FillResolution::NoMatch
}
