//! In-memory `HostApi` for tests.
//!
//! Status can be changed between ticks, fetches and saves can be made to
//! fail, and every call is counted so tests can assert that gated paths
//! never touched the host.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use pendrive_core::{CredentialRecord, StatusReport};

use crate::api::HostApi;
use crate::error::HostError;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub status: usize,
    pub list: usize,
    pub by_domain: usize,
    pub save: usize,
}

#[derive(Debug, Default)]
pub struct FakeHost {
    /// `None` makes the status endpoint unreachable.
    status: Mutex<Option<StatusReport>>,
    records: Mutex<Vec<CredentialRecord>>,
    saved: Mutex<Vec<CredentialRecord>>,
    save_rejection: Mutex<Option<String>>,
    fail_fetches: AtomicBool,
    status_calls: AtomicUsize,
    list_calls: AtomicUsize,
    by_domain_calls: AtomicUsize,
    save_calls: AtomicUsize,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn unreachable_error() -> HostError {
    HostError::Status {
        status: 503,
        message: "fake host unreachable".to_string(),
    }
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience: a report with all three conditions set to `available`.
    pub fn report(available: bool, passwords_count: u64) -> StatusReport {
        StatusReport {
            server_running: true,
            pendrive_detected: available,
            java_running: true,
            passwords_count,
        }
    }

    pub fn set_status(&self, status: Option<StatusReport>) {
        *lock(&self.status) = status;
    }

    pub fn set_records(&self, records: Vec<CredentialRecord>) {
        *lock(&self.records) = records;
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    pub fn reject_saves(&self, reason: Option<&str>) {
        *lock(&self.save_rejection) = reason.map(str::to_string);
    }

    pub fn saved(&self) -> Vec<CredentialRecord> {
        lock(&self.saved).clone()
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            status: self.status_calls.load(Ordering::SeqCst),
            list: self.list_calls.load(Ordering::SeqCst),
            by_domain: self.by_domain_calls.load(Ordering::SeqCst),
            save: self.save_calls.load(Ordering::SeqCst),
        }
    }

    /// Credential calls only; status probes are expected traffic.
    pub fn credential_calls(&self) -> usize {
        let c = self.calls();
        c.list + c.by_domain + c.save
    }
}

impl HostApi for FakeHost {
    async fn status(&self) -> Result<StatusReport, HostError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        (*lock(&self.status)).ok_or_else(unreachable_error)
    }

    async fn passwords(&self) -> Result<Vec<CredentialRecord>, HostError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(HostError::Decode("fake fetch failure".to_string()));
        }
        Ok(lock(&self.records).clone())
    }

    async fn passwords_for(&self, domain: &str) -> Result<Vec<CredentialRecord>, HostError> {
        self.by_domain_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(HostError::Decode("fake fetch failure".to_string()));
        }
        let domain = domain.to_ascii_lowercase();
        Ok(lock(&self.records)
            .iter()
            .filter(|r| r.website.to_ascii_lowercase().contains(&domain))
            .cloned()
            .collect())
    }

    async fn save(&self, record: &CredentialRecord) -> Result<(), HostError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = lock(&self.save_rejection).clone() {
            return Err(HostError::Status {
                status: 500,
                message: reason,
            });
        }
        lock(&self.saved).push(record.clone());
        lock(&self.records).push(record.clone());
        Ok(())
    }
}
