//! Background context: the long-lived monitor, the tab registry and the
//! fill triggers that do not originate in a page.

use pendrive_client::HostApi;
use pendrive_core::{AvailabilityEvent, AvailabilityTransition, DomainMatch, SessionState};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::RuntimeConfig;
use crate::fill::{FillResolution, resolve_fill};
use crate::monitor::{AvailabilityMonitor, LocalState, Scheduler, Wake};
use crate::sink::{Notice, StatusSink};
use crate::tabs::{TabCommand, TabHandle, TabId, TabRegistry};

/// Title of the page context-menu entry.
pub const CONTEXT_MENU_TITLE: &str = "Fill Password from Pendrive";
/// Name of the keyboard command.
pub const FILL_COMMAND: &str = "fill-password";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    ContextMenu,
    Shortcut,
}

impl Trigger {
    /// Map a keyboard command name to a trigger.
    pub fn from_command(name: &str) -> Option<Self> {
        (name == FILL_COMMAND).then_some(Self::Shortcut)
    }
}

#[derive(Debug)]
pub enum BackgroundRequest {
    RegisterTab(TabHandle),
    CloseTab(TabId),
    ActivateTab(TabId),
    Trigger(Trigger),
}

/// State the background purges before it broadcasts anything.
#[derive(Debug, Default)]
pub struct BackgroundStore {
    pub session: SessionState,
    pub tabs: TabRegistry,
}

impl LocalState for BackgroundStore {
    fn observe(&mut self, transition: &AvailabilityTransition) {
        self.session.observe(transition);
        if transition.is_lost() {
            let reached = self.tabs.sweep_purge();
            debug!("purge sweep reached {reached} tabs");
        }
    }
}

pub struct BackgroundContext<H, S> {
    monitor: AvailabilityMonitor<H, S>,
    store: BackgroundStore,
    policy: DomainMatch,
}

impl<H: HostApi, S: StatusSink> BackgroundContext<H, S> {
    pub fn new(monitor: AvailabilityMonitor<H, S>, policy: DomainMatch) -> Self {
        Self {
            monitor,
            store: BackgroundStore::default(),
            policy,
        }
    }

    pub fn monitor(&self) -> &AvailabilityMonitor<H, S> {
        &self.monitor
    }

    pub fn store(&self) -> &BackgroundStore {
        &self.store
    }

    pub async fn tick(&mut self, wake: Wake) -> Option<AvailabilityEvent> {
        self.monitor.tick(wake, &mut self.store).await
    }

    pub async fn handle(&mut self, request: BackgroundRequest) {
        match request {
            BackgroundRequest::RegisterTab(handle) => {
                debug!("tab {} registered: {}", handle.tab_id, handle.url);
                self.store.tabs.register(handle);
            }
            BackgroundRequest::CloseTab(tab_id) => self.store.tabs.close(tab_id),
            BackgroundRequest::ActivateTab(tab_id) => {
                self.store.tabs.activate(tab_id);
            }
            BackgroundRequest::Trigger(trigger) => {
                self.trigger(trigger).await;
            }
        }
    }

    /// Context-menu and shortcut path: resolve against the active tab and
    /// hand the record to its content context.
    pub async fn trigger(&mut self, trigger: Trigger) -> FillResolution {
        let Some(tab) = self.store.tabs.active().cloned() else {
            debug!("{trigger:?} ignored: no active tab");
            return FillResolution::NoHost;
        };
        let resolution =
            resolve_fill(self.monitor.fetcher(), self.monitor.verdict(), &tab.url, self.policy)
                .await;

        match &resolution {
            FillResolution::Record(record) => {
                if !tab.send(TabCommand::Fill(record.clone())) {
                    debug!("tab {} went away before fill", tab.tab_id);
                    self.store.tabs.close(tab.tab_id);
                }
            }
            other => {
                if let Some(message) = other.message() {
                    self.monitor.sink_mut().notify(Notice::error(message));
                }
            }
        }
        resolution
    }

    /// Run until `cancel` fires. The request channel closing does not stop
    /// the monitor.
    pub async fn run(
        mut self,
        config: &RuntimeConfig,
        mut requests: mpsc::Receiver<BackgroundRequest>,
        cancel: CancellationToken,
    ) -> Self {
        info!("background context started");
        let mut scheduler = Scheduler::new(config.poll_interval, config.backstop_interval);
        let mut requests_open = true;
        loop {
            tokio::select! {
                biased;
                wake = scheduler.next(&cancel) => match wake {
                    Some(wake) => {
                        self.tick(wake).await;
                    }
                    None => break,
                },
                request = requests.recv(), if requests_open => match request {
                    Some(request) => self.handle(request).await,
                    None => requests_open = false,
                },
            }
        }
        info!("background context stopped");
        self
    }
}
