//! Debounced re-run of the form locator on structural page changes.

use std::time::{Duration, Instant};

use crate::page::Mutation;

/// Delay between the first structural mutation and the rescan.
pub const RESCAN_DEBOUNCE_MS: u64 = 100;

/// Collapses bursts of structural mutations into a single rescan.
///
/// The deadline is armed by the first element-adding mutation and is not
/// pushed back by later ones, so a page that keeps mutating is still
/// rescanned at most once per window.
#[derive(Debug, Clone)]
pub struct RescanDebouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Default for RescanDebouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(RESCAN_DEBOUNCE_MS))
    }
}

impl RescanDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Record a mutation. Returns `true` if a rescan was newly scheduled.
    pub fn observe(&mut self, mutation: &Mutation, now: Instant) -> bool {
        if !mutation.adds_elements() || self.deadline.is_some() {
            return false;
        }
        self.deadline = Some(now + self.delay);
        true
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns `true` (once) when the pending rescan is due.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}
