//! Per-context session state and the clearing protocol.
//!
//! Each context owns exactly one [`SessionState`]. It changes only through
//! [`SessionState::observe`] (local probe tick), [`SessionState::receive`]
//! (broadcast event) and [`SessionState::store_credentials`] (completion of
//! a fetch started under the current epoch). Every path that ends in
//! `Unavailable` goes through [`SessionState::clear`].

use std::fmt;

use crate::availability::AvailabilityTransition;
use crate::types::{AvailabilityEvent, CredentialRecord, Verdict};

/// In-progress "new credential" entry bound to the popup's save form.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialDraft {
    pub website: String,
    pub username: String,
    pub secret: String,
}

impl CredentialDraft {
    pub fn is_empty(&self) -> bool {
        self.website.is_empty() && self.username.is_empty() && self.secret.is_empty()
    }

    pub fn clear(&mut self) {
        self.website.clear();
        self.username.clear();
        self.secret.clear();
    }

    pub fn to_record(&self) -> CredentialRecord {
        CredentialRecord::new(&self.website, &self.username, &self.secret).trimmed()
    }
}

impl fmt::Debug for CredentialDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialDraft")
            .field("website", &self.website)
            .field("username", &self.username)
            .field("secret_len", &self.secret.len())
            .finish()
    }
}

/// What a context must do after a broadcast was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// State was purged; remove UI that referenced it.
    Cleared,
    /// Available again; fetch fresh data and re-render.
    Refetch,
}

/// Token identifying the session generation a fetch was started in.
///
/// Bumped on every [`SessionState::clear`], so results of a fetch that
/// straddled a loss are rejected even if availability came back meanwhile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionEpoch(u64);

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionState {
    verdict: Verdict,
    credentials: Vec<CredentialRecord>,
    draft: CredentialDraft,
    epoch: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn credentials(&self) -> &[CredentialRecord] {
        &self.credentials
    }

    pub fn draft(&self) -> &CredentialDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut CredentialDraft {
        &mut self.draft
    }

    pub fn epoch(&self) -> SessionEpoch {
        SessionEpoch(self.epoch)
    }

    /// Purge all credential material held by this session.
    ///
    /// Total and idempotent: a second call leaves the same empty state. The
    /// verdict is left alone; callers set it through `observe`/`receive`.
    pub fn clear(&mut self) {
        self.credentials.clear();
        self.draft.clear();
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Apply a local probe tick. Returns `true` if the session was cleared.
    ///
    /// An unavailable verdict clears on every tick, not only on the edge,
    /// so a context that starts unavailable is purged on its first probe.
    pub fn observe(&mut self, transition: &AvailabilityTransition) -> bool {
        self.verdict = transition.state.verdict;
        if self.verdict.is_available() {
            false
        } else {
            self.clear();
            true
        }
    }

    /// Apply a broadcast event received from another context.
    pub fn receive(&mut self, event: &AvailabilityEvent) -> SessionAction {
        self.verdict = event.verdict();
        match event {
            AvailabilityEvent::Lost => {
                self.clear();
                SessionAction::Cleared
            }
            AvailabilityEvent::Restored { .. } => {
                // Nothing cached may outlive a loss; drop whatever is left
                // and let the caller fetch again.
                self.credentials.clear();
                SessionAction::Refetch
            }
        }
    }

    /// Cache fetched records.
    ///
    /// Accepted only if the session is still available and no clear has
    /// happened since `epoch` was taken. Returns whether they were kept.
    pub fn store_credentials(&mut self, epoch: SessionEpoch, records: Vec<CredentialRecord>) -> bool {
        if !self.verdict.is_available() || epoch != self.epoch() {
            return false;
        }
        self.credentials = records;
        true
    }
}
