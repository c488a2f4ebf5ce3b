//! reqwest-backed `HostApi` talking to the host's loopback HTTP API.

use std::time::Duration;

use reqwest::{Client, Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use pendrive_core::{CredentialList, CredentialRecord, StatusReport};

use crate::api::HostApi;
use crate::error::HostError;

pub const DEFAULT_HOST_URL: &str = "http://127.0.0.1:5000";

/// Per-request timeout. Shorter than the fast poll interval so a hung host
/// cannot stack up probes.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 1_500;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Clone)]
pub struct HttpHost {
    base: Url,
    client: Client,
}

impl HttpHost {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, HostError> {
        let base = Url::parse(base_url).map_err(|e| HostError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(HostError::InvalidUrl(format!("{base_url}: not a base url")));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { base, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Append path segments to the base url, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, HostError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| HostError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, HostError> {
        let url = self.endpoint(segments)?;
        tracing::debug!("GET {}", url.path());
        let response = self.client.get(url).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, HostError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(HostError::Status {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }
    serde_json::from_str(&body).map_err(|e| HostError::Decode(e.to_string()))
}

/// Prefer the host's `{"error": ...}` message over the raw body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if body.trim().is_empty() => "no response body".to_string(),
        Err(_) => body.trim().chars().take(200).collect(),
    }
}

impl HostApi for HttpHost {
    async fn status(&self) -> Result<StatusReport, HostError> {
        self.get_json(&["api", "status"]).await
    }

    async fn passwords(&self) -> Result<Vec<CredentialRecord>, HostError> {
        let list: CredentialList = self.get_json(&["api", "passwords"]).await?;
        Ok(list.passwords)
    }

    async fn passwords_for(&self, domain: &str) -> Result<Vec<CredentialRecord>, HostError> {
        let list: CredentialList = self.get_json(&["api", "passwords", domain]).await?;
        Ok(list.passwords)
    }

    async fn save(&self, record: &CredentialRecord) -> Result<(), HostError> {
        let url = self.endpoint(&["api", "save"])?;
        tracing::debug!("POST {} website={}", url.path(), record.website);
        let response = self.client.post(url).json(record).send().await?;
        let _: serde_json::Value = decode(response).await?;
        Ok(())
    }
}
