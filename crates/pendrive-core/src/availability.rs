//! Availability edge detection.
//!
//! A pure, side-effect-free state machine. [`transition_availability`] is the
//! single entry point: every context feeds it one [`ProbeOutcome`] per tick
//! (periodic or backstop) and applies the returned event, if any.

use chrono::{DateTime, Utc};

use crate::types::{AvailabilityEvent, StatusReport, Verdict};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Poll interval while any UI surface is open (milliseconds).
pub const FAST_POLL_INTERVAL_MS: u64 = 2_000;

/// Low-frequency recovery wake for a possibly suspended background (seconds).
pub const BACKSTOP_INTERVAL_SECS: u64 = 60;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Result of one status probe.
///
/// Network errors, non-success statuses and malformed payloads all collapse
/// into `Failed`; callers never distinguish them from an explicit
/// "unavailable" report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Report(StatusReport),
    Failed(String),
}

impl ProbeOutcome {
    pub fn verdict(&self) -> Verdict {
        match self {
            Self::Report(report) => report.verdict(),
            Self::Failed(_) => Verdict::Unavailable,
        }
    }

    pub fn passwords_count(&self) -> u64 {
        match self {
            Self::Report(report) => report.passwords_count,
            Self::Failed(_) => 0,
        }
    }

    fn reason(&self) -> String {
        match self {
            Self::Report(report) => report
                .missing_condition()
                .unwrap_or("host available")
                .to_string(),
            Self::Failed(reason) => format!("probe failed: {reason}"),
        }
    }
}

/// Last-known availability of the credential host, as seen by one context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityState {
    pub verdict: Verdict,
    pub reason: String,
    pub checked_at: DateTime<Utc>,
    pub passwords_count: u64,
}

impl AvailabilityState {
    /// Initial state of a freshly started (or resumed) context.
    ///
    /// Starts `Unavailable` so that a first successful probe is reported as
    /// a restore edge.
    pub fn unknown(now: DateTime<Utc>) -> Self {
        Self {
            verdict: Verdict::Unavailable,
            reason: "not probed yet".to_string(),
            checked_at: now,
            passwords_count: 0,
        }
    }
}

/// Output of one transition step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityTransition {
    pub state: AvailabilityState,
    /// Present only when the verdict changed.
    pub event: Option<AvailabilityEvent>,
}

impl AvailabilityTransition {
    pub fn is_lost(&self) -> bool {
        self.event == Some(AvailabilityEvent::Lost)
    }
}

// ---------------------------------------------------------------------------
// Transition function
// ---------------------------------------------------------------------------

/// Derive the next availability state from a probe outcome.
///
/// When `previous` is `None` the context is treated as freshly started
/// ([`AvailabilityState::unknown`]).
pub fn transition_availability(
    previous: Option<&AvailabilityState>,
    outcome: &ProbeOutcome,
    now: DateTime<Utc>,
) -> AvailabilityTransition {
    let previous_verdict = previous.map_or(Verdict::Unavailable, |p| p.verdict);
    let verdict = outcome.verdict();

    let event = match (previous_verdict, verdict) {
        (Verdict::Unavailable, Verdict::Available) => Some(AvailabilityEvent::Restored {
            passwords_count: outcome.passwords_count(),
        }),
        (Verdict::Available, Verdict::Unavailable) => Some(AvailabilityEvent::Lost),
        _ => None,
    };

    AvailabilityTransition {
        state: AvailabilityState {
            verdict,
            reason: outcome.reason(),
            checked_at: now,
            passwords_count: outcome.passwords_count(),
        },
        event,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
