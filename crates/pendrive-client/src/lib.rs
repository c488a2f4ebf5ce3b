//! pendrive-client: IO boundary to the credential host.
//! Provides the `HostApi` seam, its reqwest implementation, the status
//! probe and the verdict-gated credential fetcher. No session state lives
//! here; callers pass in their current verdict.

pub mod api;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod probe;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use api::HostApi;
pub use error::{HostError, SaveError};
pub use fetcher::{CredentialFetcher, FetchResult};
pub use http::{DEFAULT_HOST_URL, DEFAULT_REQUEST_TIMEOUT_MS, HttpHost};
pub use probe::probe;
