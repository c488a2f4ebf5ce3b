//! Popup context: lives only while the popup is open.
//!
//! Polls on its own timer, listens to the bus, and owns the credential list
//! and the "new credential" draft shown to the user.

use std::time::Duration;

use pendrive_client::{HostApi, SaveError};
use pendrive_core::{
    AvailabilityEvent, AvailabilityTransition, CredentialDraft, CredentialRecord, DomainMatch,
    SessionAction, SessionState, Verdict, host_of,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

use crate::fill::{BLOCKED_MESSAGE, NO_MATCH_MESSAGE};
use crate::monitor::{AvailabilityMonitor, LocalState, Wake, sleep_until_opt};
use crate::sink::{Notice, StatusSink};
use crate::tabs::{TabCommand, TabHandle};

/// How long a popup message stays visible.
pub const MESSAGE_TTL_SECS: u64 = 5;
pub const SAVE_SUCCESS: &str = "Password saved successfully!";
pub const NO_TAB_MESSAGE: &str = "No active tab to fill";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoFill {
    Blocked,
    NoTab,
    NoMatch,
    Filled(CredentialRecord),
    /// Several records match; the user must pick one.
    Choose(Vec<CredentialRecord>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupAction {
    Refresh,
    AutoFill,
    FillChoice(usize),
    EditDraft(CredentialDraft),
    Save,
}

/// Everything the popup must drop when the host goes away.
#[derive(Debug, Default)]
pub struct PopupState {
    pub session: SessionState,
    pub choices: Vec<CredentialRecord>,
    /// Visible message and when it expires.
    pub message: Option<(Notice, Instant)>,
}

impl PopupState {
    /// The one clear path, shared by the poll route and the bus route.
    pub fn clear(&mut self) {
        self.session.clear();
        self.choices.clear();
        self.message = None;
    }
}

impl LocalState for PopupState {
    fn observe(&mut self, transition: &AvailabilityTransition) {
        if self.session.observe(transition) {
            self.clear();
        }
    }
}

pub struct PopupContext<H, S> {
    monitor: AvailabilityMonitor<H, S>,
    state: PopupState,
    tab: Option<TabHandle>,
    policy: DomainMatch,
}

impl<H: HostApi, S: StatusSink> PopupContext<H, S> {
    pub fn new(monitor: AvailabilityMonitor<H, S>, tab: Option<TabHandle>, policy: DomainMatch) -> Self {
        Self {
            monitor,
            state: PopupState::default(),
            tab,
            policy,
        }
    }

    pub fn verdict(&self) -> Verdict {
        self.state.session.verdict()
    }

    pub fn credentials(&self) -> &[CredentialRecord] {
        self.state.session.credentials()
    }

    pub fn choices(&self) -> &[CredentialRecord] {
        &self.state.choices
    }

    pub fn draft(&self) -> &CredentialDraft {
        self.state.session.draft()
    }

    pub fn draft_mut(&mut self) -> &mut CredentialDraft {
        self.state.session.draft_mut()
    }

    /// Currently visible message, if it has not expired.
    pub fn message(&self) -> Option<&Notice> {
        self.state.message.as_ref().map(|(notice, _)| notice)
    }

    /// Drop the message once its time is up. Returns true if one was dropped.
    pub fn expire_message(&mut self, now: Instant) -> bool {
        match &self.state.message {
            Some((_, expires)) if *expires <= now => {
                self.state.message = None;
                true
            }
            _ => false,
        }
    }

    /// Probe, then load the list or clear.
    pub async fn open(&mut self) -> Verdict {
        self.poll(Wake::Startup).await;
        self.verdict()
    }

    pub async fn poll(&mut self, wake: Wake) {
        let event = self.monitor.tick(wake, &mut self.state).await;
        if matches!(event, Some(AvailabilityEvent::Restored { .. })) {
            self.load().await;
        }
    }

    /// Fetch the full list. Results of a fetch that straddled a clear are
    /// discarded.
    pub async fn load(&mut self) -> usize {
        let epoch = self.state.session.epoch();
        let fetched = self.monitor.fetcher().fetch_all(self.verdict()).await;
        if let Some(error) = &fetched.error {
            self.show(Notice::error(format!("Failed to load passwords: {error}")));
        }
        let count = fetched.records.len();
        if self.state.session.store_credentials(epoch, fetched.records) {
            count
        } else {
            0
        }
    }

    pub async fn on_event(&mut self, event: &AvailabilityEvent) {
        match self.state.session.receive(event) {
            SessionAction::Cleared => {
                self.state.clear();
                // Our own next available probe must count as a restore so
                // the list is fetched again.
                self.monitor.reset();
            }
            SessionAction::Refetch => {
                self.state.choices.clear();
                self.load().await;
            }
        }
    }

    pub fn auto_fill(&mut self) -> AutoFill {
        if !self.verdict().is_available() {
            self.show(Notice::error(BLOCKED_MESSAGE));
            return AutoFill::Blocked;
        }
        let Some(tab) = self.tab.clone() else {
            self.show(Notice::error(NO_TAB_MESSAGE));
            return AutoFill::NoTab;
        };
        let matches: Vec<CredentialRecord> = match host_of(&tab.url) {
            Some(host) => self
                .policy
                .filter(self.credentials(), &host)
                .into_iter()
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        match matches.as_slice() {
            [] => {
                self.show(Notice::error(NO_MATCH_MESSAGE));
                AutoFill::NoMatch
            }
            [record] => {
                let record = record.clone();
                self.send_fill(&tab, &record);
                AutoFill::Filled(record)
            }
            _ => {
                self.state.choices = matches.clone();
                AutoFill::Choose(matches)
            }
        }
    }

    /// Fill the record the user picked from the last `Choose` list.
    pub fn fill_choice(&mut self, index: usize) -> bool {
        let (Some(tab), Some(record)) = (self.tab.clone(), self.state.choices.get(index).cloned())
        else {
            return false;
        };
        self.state.choices.clear();
        self.send_fill(&tab, &record);
        true
    }

    fn send_fill(&mut self, tab: &TabHandle, record: &CredentialRecord) {
        if tab.send(TabCommand::Fill(record.clone())) {
            self.show(Notice::success(format!("Filled credentials for {}", record.website)));
        } else {
            self.show(Notice::error(NO_TAB_MESSAGE));
        }
    }

    /// Save the draft. On success the draft is cleared and the list reloaded.
    pub async fn save(&mut self) -> Result<(), SaveError> {
        let record = self.draft().to_record();
        match self.monitor.fetcher().save(self.verdict(), &record).await {
            Ok(()) => {
                self.state.session.draft_mut().clear();
                self.show(Notice::success(SAVE_SUCCESS));
                self.load().await;
                Ok(())
            }
            Err(e) => {
                self.show(Notice::error(format!("Failed to save password: {e}")));
                Err(e)
            }
        }
    }

    pub async fn handle(&mut self, action: PopupAction) {
        match action {
            PopupAction::Refresh => {
                self.load().await;
            }
            PopupAction::AutoFill => {
                self.auto_fill();
            }
            PopupAction::FillChoice(index) => {
                self.fill_choice(index);
            }
            PopupAction::EditDraft(draft) => *self.draft_mut() = draft,
            PopupAction::Save => {
                // save() has already shown the error notice
                if let Err(e) = self.save().await {
                    tracing::warn!("popup save failed: {e}");
                }
            }
        }
    }

    fn show(&mut self, notice: Notice) {
        self.monitor.sink_mut().notify(notice.clone());
        let expires = Instant::now() + Duration::from_secs(MESSAGE_TTL_SECS);
        self.state.message = Some((notice, expires));
    }

    /// Run until the popup closes (`cancel` fires or the action channel is
    /// dropped). The poll timer dies with the loop and the session is
    /// cleared on the way out.
    pub async fn run(
        mut self,
        poll_interval: Duration,
        mut events: broadcast::Receiver<AvailabilityEvent>,
        mut actions: mpsc::Receiver<PopupAction>,
        cancel: CancellationToken,
    ) -> Self {
        let mut timer = interval_at(Instant::now() + poll_interval, poll_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let message_expiry = self.state.message.as_ref().map(|(_, at)| *at);
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Ok(event) => self.on_event(&event).await,
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!("popup lagged by {missed} events; re-probing");
                        self.state.clear();
                        self.monitor.reset();
                        self.poll(Wake::Startup).await;
                    }
                    Err(RecvError::Closed) => break,
                },
                action = actions.recv() => match action {
                    Some(action) => self.handle(action).await,
                    None => break,
                },
                _ = timer.tick() => self.poll(Wake::Periodic).await,
                () = sleep_until_opt(message_expiry) => {
                    self.expire_message(Instant::now());
                }
            }
        }

        self.state.clear();
        self
    }
}
