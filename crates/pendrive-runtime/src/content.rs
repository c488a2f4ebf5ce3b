//! Content context: one per page.
//!
//! Owns the page model, its session and the rescan debouncer. It never
//! caches credentials across events: a fill always goes through the shared
//! fill path and the record is written straight into the page.

use std::time::Duration;

use chrono::Utc;
use pendrive_client::{CredentialFetcher, HostApi};
use pendrive_core::autofill::CONFIRMATION_TTL_SECS;
use pendrive_core::{
    AffordanceKind, AvailabilityEvent, CredentialRecord, DomainMatch, FillOutcome, FormCandidate,
    Mutation, Page, RescanDebouncer, SessionAction, SessionState, Tone, Verdict, apply, locate,
    transition_availability,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::fill::{FillResolution, resolve_fill};
use crate::monitor::sleep_until_opt;
use crate::tabs::TabCommand;

pub const FILL_BUTTON_LABEL: &str = "Fill from Pendrive";
pub const NO_FORM_MESSAGE: &str = "No login form found on this page";
pub const CONNECTION_LOST_TOAST: &str = "Connection lost. Cleared page helpers.";
pub const CONNECTION_RESTORED_TOAST: &str = "Connection restored.";

fn now() -> std::time::Instant {
    Instant::now().into_std()
}

pub struct ContentContext<H> {
    fetcher: CredentialFetcher<H>,
    policy: DomainMatch,
    page: Page,
    session: SessionState,
    debouncer: RescanDebouncer,
    candidates: Vec<FormCandidate>,
}

impl<H: HostApi> ContentContext<H> {
    pub fn new(fetcher: CredentialFetcher<H>, page: Page, policy: DomainMatch) -> Self {
        Self {
            fetcher,
            policy,
            page,
            session: SessionState::new(),
            debouncer: RescanDebouncer::default(),
            candidates: Vec::new(),
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn candidates(&self) -> &[FormCandidate] {
        &self.candidates
    }

    pub fn fill_buttons(&self) -> usize {
        self.page
            .affordances()
            .iter()
            .filter(|a| matches!(a.kind, AffordanceKind::FillButton { .. }))
            .count()
    }

    /// Probe once on load. A page that starts while the host is unavailable
    /// is cleared before anything is shown.
    pub async fn init(&mut self) -> Verdict {
        let outcome = self.fetcher.probe().await;
        let transition = transition_availability(None, &outcome, Utc::now());
        if self.session.observe(&transition) {
            self.clear();
        }
        self.rescan();
        self.session.verdict()
    }

    /// Drop everything this page holds: session data, buttons and toasts.
    pub fn clear(&mut self) {
        self.session.clear();
        let removed = self.page.clear_affordances();
        if removed > 0 {
            tracing::debug!("cleared {removed} affordances from {}", self.page.url);
        }
    }

    /// Re-run the locator and re-render the fill buttons.
    pub fn rescan(&mut self) -> usize {
        self.candidates = locate(&self.page);
        self.page.remove_fill_buttons();
        if !self.session.verdict().is_available() {
            return 0;
        }
        let at = now();
        let complete: Vec<usize> = self
            .candidates
            .iter()
            .filter(|c| c.is_complete())
            .map(|c| c.container)
            .collect();
        for container in &complete {
            self.page
                .inject(AffordanceKind::FillButton { container: *container }, at, None);
        }
        complete.len()
    }

    /// Clear the page and leave a single toast saying why.
    pub fn purge(&mut self) {
        self.clear();
        self.toast(CONNECTION_LOST_TOAST, Tone::Error);
    }

    pub fn on_event(&mut self, event: &AvailabilityEvent) {
        let was_available = self.session.verdict().is_available();
        match self.session.receive(event) {
            SessionAction::Cleared => self.purge(),
            SessionAction::Refetch => {
                self.rescan();
                // The first broadcast after page load is not a restore.
                if !was_available {
                    self.toast(CONNECTION_RESTORED_TOAST, Tone::Success);
                }
            }
        }
    }

    /// Returns `true` if a rescan was scheduled.
    pub fn on_mutation(&mut self, mutation: &Mutation, now: std::time::Instant) -> bool {
        self.debouncer.observe(mutation, now)
    }

    /// Run the pending rescan if its deadline has passed.
    pub fn poll_rescan(&mut self, now: std::time::Instant) -> bool {
        if self.debouncer.take_due(now) {
            self.rescan();
            true
        } else {
            false
        }
    }

    /// In-page button path: resolve through the shared fill path, then fill
    /// the form the button belongs to.
    pub async fn click_fill_button(&mut self, container: usize) -> Option<FillOutcome> {
        let resolution =
            resolve_fill(&self.fetcher, self.session.verdict(), &self.page.url, self.policy).await;
        let record = match resolution {
            FillResolution::Record(record) => record,
            other => {
                if let Some(message) = other.message() {
                    self.toast(&message, Tone::Error);
                }
                return None;
            }
        };
        let candidate = self
            .candidates
            .iter()
            .find(|c| c.container == container)
            .cloned();
        match candidate {
            Some(candidate) => Some(apply(&mut self.page, &candidate, &record, now())),
            None => {
                self.toast(NO_FORM_MESSAGE, Tone::Error);
                None
            }
        }
    }

    /// Fill a record resolved elsewhere (context menu, shortcut, popup).
    pub fn fill(&mut self, record: &CredentialRecord) -> Option<FillOutcome> {
        if !self.session.verdict().is_available() {
            self.toast(crate::fill::BLOCKED_MESSAGE, Tone::Error);
            return None;
        }
        let candidate = self
            .candidates
            .iter()
            .find(|c| c.is_complete())
            .or_else(|| self.candidates.first())
            .cloned();
        match candidate {
            Some(candidate) => Some(apply(&mut self.page, &candidate, record, now())),
            None => {
                self.toast(NO_FORM_MESSAGE, Tone::Error);
                None
            }
        }
    }

    pub async fn handle(&mut self, command: TabCommand) {
        match command {
            // Sent by the background sweep ahead of the Lost broadcast; either
            // order ends with one lost toast.
            TabCommand::Purge => self.purge(),
            TabCommand::Fill(record) => {
                self.fill(&record);
            }
            TabCommand::Mutation(mutation) => {
                self.on_mutation(&mutation, now());
            }
            TabCommand::ClickFillButton { container } => {
                self.click_fill_button(container).await;
            }
        }
    }

    fn toast(&mut self, message: &str, tone: Tone) {
        self.page.inject(
            AffordanceKind::Toast {
                message: message.to_string(),
                tone,
            },
            now(),
            Some(Duration::from_secs(CONFIRMATION_TTL_SECS)),
        );
    }

    fn next_expiry(&self) -> Option<std::time::Instant> {
        self.page
            .affordances()
            .iter()
            .filter_map(|a| a.ttl.map(|ttl| a.shown_at + ttl))
            .min()
    }

    /// Event loop for the page's lifetime. Returns the context once the page
    /// goes away (command channel closed) or `cancel` fires.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<TabCommand>,
        mut events: broadcast::Receiver<AvailabilityEvent>,
        cancel: CancellationToken,
    ) -> Self {
        loop {
            let rescan_at = self.debouncer.deadline().map(Instant::from_std);
            let expire_at = self.next_expiry().map(Instant::from_std);

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Ok(event) => self.on_event(&event),
                    Err(RecvError::Lagged(missed)) => {
                        // A missed event may have been a loss.
                        tracing::warn!("content context lagged by {missed} events; re-probing");
                        self.clear();
                        self.init().await;
                    }
                    Err(RecvError::Closed) => {
                        self.clear();
                        break;
                    }
                },
                command = commands.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
                () = sleep_until_opt(rescan_at) => {
                    self.poll_rescan(now());
                }
                () = sleep_until_opt(expire_at) => {
                    self.page.expire_affordances(now());
                }
            }
        }
        self
    }
}
