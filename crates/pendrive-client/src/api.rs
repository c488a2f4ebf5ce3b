//! `HostApi` trait: the credential host as seen by every context.
//! Enables fake injection in tests.

use std::future::Future;
use std::sync::Arc;

use pendrive_core::{CredentialRecord, StatusReport};

use crate::error::HostError;

pub trait HostApi: Send + Sync {
    /// `GET /api/status`
    fn status(&self) -> impl Future<Output = Result<StatusReport, HostError>> + Send;

    /// `GET /api/passwords`
    fn passwords(&self) -> impl Future<Output = Result<Vec<CredentialRecord>, HostError>> + Send;

    /// `GET /api/passwords/{domain}`
    fn passwords_for(
        &self,
        domain: &str,
    ) -> impl Future<Output = Result<Vec<CredentialRecord>, HostError>> + Send;

    /// `POST /api/save`
    fn save(&self, record: &CredentialRecord) -> impl Future<Output = Result<(), HostError>> + Send;
}

impl<T: HostApi> HostApi for Arc<T> {
    fn status(&self) -> impl Future<Output = Result<StatusReport, HostError>> + Send {
        (**self).status()
    }

    fn passwords(&self) -> impl Future<Output = Result<Vec<CredentialRecord>, HostError>> + Send {
        (**self).passwords()
    }

    fn passwords_for(
        &self,
        domain: &str,
    ) -> impl Future<Output = Result<Vec<CredentialRecord>, HostError>> + Send {
        (**self).passwords_for(domain)
    }

    fn save(&self, record: &CredentialRecord) -> impl Future<Output = Result<(), HostError>> + Send {
        (**self).save(record)
    }
}
