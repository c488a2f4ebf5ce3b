//! Status indicator and user notifications.
//!
//! Rendering (badge, notification popups, in-page banners) is external; the
//! contexts only describe what should be shown.

use std::sync::{Arc, Mutex, PoisonError};

/// Persistent availability indicator (the toolbar badge).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Connected { passwords_count: u64 },
    Disconnected,
}

impl Indicator {
    pub fn badge_text(&self) -> String {
        match self {
            Self::Connected { passwords_count } => passwords_count.to_string(),
            Self::Disconnected => "!".to_string(),
        }
    }

    pub fn badge_color(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "#4CAF50",
            Self::Disconnected => "#F44336",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// One-shot, dismissible user message. Never carries secret material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

pub const CONNECTION_LOST_ALERT: &str =
    "Connection lost! All password data has been cleared for security.";

pub trait StatusSink: Send {
    fn indicator(&mut self, indicator: Indicator);
    fn notify(&mut self, notice: Notice);
}

/// Sink that renders into the log.
#[derive(Debug, Default)]
pub struct TracingSink {
    last: Option<Indicator>,
}

impl StatusSink for TracingSink {
    fn indicator(&mut self, indicator: Indicator) {
        if self.last == Some(indicator) {
            return;
        }
        self.last = Some(indicator);
        match indicator {
            Indicator::Connected { passwords_count } => {
                tracing::info!("host available ({passwords_count} credentials)");
            }
            Indicator::Disconnected => tracing::warn!("host unavailable"),
        }
    }

    fn notify(&mut self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => tracing::warn!("{}", notice.message),
            NoticeLevel::Info | NoticeLevel::Success => tracing::info!("{}", notice.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEntry {
    Indicator(Indicator),
    Notice(Notice),
}

/// Sink that keeps everything it was given; clones share the same record.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    entries: Arc<Mutex<Vec<SinkEntry>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<SinkEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.entries()
            .into_iter()
            .filter_map(|e| match e {
                SinkEntry::Notice(n) => Some(n),
                SinkEntry::Indicator(_) => None,
            })
            .collect()
    }

    pub fn last_indicator(&self) -> Option<Indicator> {
        self.entries().into_iter().rev().find_map(|e| match e {
            SinkEntry::Indicator(i) => Some(i),
            SinkEntry::Notice(_) => None,
        })
    }

    fn push(&self, entry: SinkEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}

impl StatusSink for RecordingSink {
    fn indicator(&mut self, indicator: Indicator) {
        self.push(SinkEntry::Indicator(indicator));
    }

    fn notify(&mut self, notice: Notice) {
        self.push(SinkEntry::Notice(notice));
    }
}
