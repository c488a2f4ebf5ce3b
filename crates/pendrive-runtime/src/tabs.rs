//! Handles to open content contexts, one per browser tab.

use std::collections::BTreeMap;

use pendrive_core::{CredentialRecord, Mutation};
use tokio::sync::mpsc;

pub type TabId = u32;

/// Commands a content context accepts from the rest of the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabCommand {
    /// Drop every credential and injected affordance.
    Purge,
    /// Fill this record into the page's login form.
    Fill(CredentialRecord),
    /// Structural change reported by the page.
    Mutation(Mutation),
    /// User clicked the fill button next to a container.
    ClickFillButton { container: usize },
}

/// Sending side of a content context's command channel.
#[derive(Debug, Clone)]
pub struct TabHandle {
    pub tab_id: TabId,
    pub url: String,
    tx: mpsc::UnboundedSender<TabCommand>,
}

impl TabHandle {
    pub fn channel(tab_id: TabId, url: &str) -> (Self, mpsc::UnboundedReceiver<TabCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tab_id,
                url: url.to_string(),
                tx,
            },
            rx,
        )
    }

    /// Returns `false` if the tab is gone.
    pub fn send(&self, command: TabCommand) -> bool {
        self.tx.send(command).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[derive(Debug, Default)]
pub struct TabRegistry {
    tabs: BTreeMap<TabId, TabHandle>,
    active: Option<TabId>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace, after a navigation) a tab. The newest tab
    /// becomes active.
    pub fn register(&mut self, handle: TabHandle) {
        self.active = Some(handle.tab_id);
        self.tabs.insert(handle.tab_id, handle);
    }

    pub fn close(&mut self, tab_id: TabId) {
        self.tabs.remove(&tab_id);
        if self.active == Some(tab_id) {
            self.active = None;
        }
    }

    pub fn activate(&mut self, tab_id: TabId) -> bool {
        if self.tabs.contains_key(&tab_id) {
            self.active = Some(tab_id);
            true
        } else {
            false
        }
    }

    pub fn active(&self) -> Option<&TabHandle> {
        self.active.and_then(|id| self.tabs.get(&id))
    }

    pub fn get(&self, tab_id: TabId) -> Option<&TabHandle> {
        self.tabs.get(&tab_id)
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// Send `Purge` to every registered tab. Tabs that cannot be reached are
    /// dropped from the registry and the sweep moves on. Returns how many
    /// tabs were reached.
    pub fn sweep_purge(&mut self) -> usize {
        let mut gone = Vec::new();
        let mut reached = 0;
        for (id, handle) in &self.tabs {
            if handle.send(TabCommand::Purge) {
                reached += 1;
            } else {
                tracing::debug!("tab {id} unreachable during purge sweep");
                gone.push(*id);
            }
        }
        for id in gone {
            self.close(id);
        }
        reached
    }
}
