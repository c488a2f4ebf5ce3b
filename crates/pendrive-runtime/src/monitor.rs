//! Availability monitor: probe, edge detection and the ordered effects of
//! an edge.
//!
//! On a loss the order is fixed: purge local state, then broadcast, then
//! update the indicator and alert. A receiver can therefore never see
//! `CONNECTION_LOST` before the sender has already dropped its own secrets.

use std::time::Duration;

use chrono::Utc;
use pendrive_client::{CredentialFetcher, HostApi};
use pendrive_core::{
    AvailabilityEvent, AvailabilityState, AvailabilityTransition, ProbeOutcome, SessionState,
    Verdict, transition_availability,
};
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at};
use tokio_util::sync::CancellationToken;

use crate::bus::AvailabilityBus;
use crate::sink::{CONNECTION_LOST_ALERT, Indicator, Notice, StatusSink};

/// Context-local state the monitor updates before anything leaves the
/// context. Implementations must purge on every unavailable transition.
pub trait LocalState {
    fn observe(&mut self, transition: &AvailabilityTransition);
}

impl LocalState for SessionState {
    fn observe(&mut self, transition: &AvailabilityTransition) {
        SessionState::observe(self, transition);
    }
}

/// Which scheduler task woke the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Periodic,
    Backstop,
    Startup,
}

pub struct AvailabilityMonitor<H, S> {
    fetcher: CredentialFetcher<H>,
    sink: S,
    bus: Option<AvailabilityBus>,
    state: Option<AvailabilityState>,
}

impl<H: HostApi, S: StatusSink> AvailabilityMonitor<H, S> {
    /// A monitor that only reacts locally (popup polling).
    pub fn local(fetcher: CredentialFetcher<H>, sink: S) -> Self {
        Self {
            fetcher,
            sink,
            bus: None,
            state: None,
        }
    }

    /// A monitor that also broadcasts its edges (background context).
    pub fn broadcasting(fetcher: CredentialFetcher<H>, sink: S, bus: AvailabilityBus) -> Self {
        Self {
            bus: Some(bus),
            ..Self::local(fetcher, sink)
        }
    }

    pub fn verdict(&self) -> Verdict {
        self.state.as_ref().map_or(Verdict::Unavailable, |s| s.verdict)
    }

    pub fn state(&self) -> Option<&AvailabilityState> {
        self.state.as_ref()
    }

    pub fn fetcher(&self) -> &CredentialFetcher<H> {
        &self.fetcher
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Forget the previous verdict, as a resumed context must.
    pub fn reset(&mut self) {
        self.state = None;
    }

    /// Probe once and run the edge routine.
    pub async fn tick<L: LocalState>(&mut self, wake: Wake, local: &mut L) -> Option<AvailabilityEvent> {
        let outcome = self.fetcher.probe().await;
        tracing::trace!("{wake:?} probe: {outcome:?}");
        self.apply(outcome, local)
    }

    /// Edge routine for an already obtained probe outcome.
    pub fn apply<L: LocalState>(&mut self, outcome: ProbeOutcome, local: &mut L) -> Option<AvailabilityEvent> {
        let transition = transition_availability(self.state.as_ref(), &outcome, Utc::now());
        let verdict = transition.state.verdict;
        let passwords_count = transition.state.passwords_count;

        // Local purge happens before the broadcast and before any UI effect.
        local.observe(&transition);

        match transition.event {
            Some(AvailabilityEvent::Lost) => {
                tracing::warn!("credential host lost: {}", transition.state.reason);
                self.publish(AvailabilityEvent::Lost);
                self.sink.indicator(Indicator::Disconnected);
                self.sink.notify(Notice::error(CONNECTION_LOST_ALERT));
            }
            Some(event @ AvailabilityEvent::Restored { .. }) => {
                tracing::info!("credential host available ({passwords_count} credentials)");
                self.publish(event);
                self.sink.indicator(Indicator::Connected { passwords_count });
            }
            None => {
                self.sink.indicator(if verdict.is_available() {
                    Indicator::Connected { passwords_count }
                } else {
                    Indicator::Disconnected
                });
            }
        }

        let event = transition.event;
        self.state = Some(transition.state);
        event
    }

    fn publish(&self, event: AvailabilityEvent) {
        if let Some(bus) = &self.bus {
            bus.publish(event);
        }
    }
}

/// One periodic task plus one low-frequency recovery task.
///
/// Both feed the same wake stream. The periodic timer fires immediately on
/// start so a resumed context re-probes before trusting anything; the
/// backstop first fires one full period later. Missed ticks are skipped
/// rather than replayed, so a context that was suspended through many
/// periods probes once on wake.
pub struct Scheduler {
    periodic: tokio::time::Interval,
    backstop: tokio::time::Interval,
}

impl Scheduler {
    pub fn new(period: Duration, backstop: Duration) -> Self {
        let mut periodic = interval(period);
        periodic.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut backstop = interval_at(Instant::now() + backstop, backstop);
        backstop.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { periodic, backstop }
    }

    /// Wait for the next wake, or `None` once `cancel` fires.
    pub async fn next(&mut self, cancel: &CancellationToken) -> Option<Wake> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            _ = self.periodic.tick() => Some(Wake::Periodic),
            _ = self.backstop.tick() => Some(Wake::Backstop),
        }
    }
}

/// Sleep until `deadline`, or forever when there is none.
pub(crate) async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{RecordingSink, SinkEntry};
    use pendrive_client::testing::FakeHost;
    use pendrive_core::CredentialRecord;
    use std::sync::Arc;
    use tokio::sync::broadcast;

    fn monitor(
        host: &Arc<FakeHost>,
        sink: &RecordingSink,
        bus: &AvailabilityBus,
    ) -> AvailabilityMonitor<Arc<FakeHost>, RecordingSink> {
        AvailabilityMonitor::broadcasting(
            CredentialFetcher::new(Arc::clone(host)),
            sink.clone(),
            bus.clone(),
        )
    }

    /// Purge target that checks nothing was broadcast yet when it runs.
    struct OrderProbe {
        session: SessionState,
        rx: broadcast::Receiver<AvailabilityEvent>,
        purges: usize,
        saw_broadcast_before_purge: bool,
    }

    impl LocalState for OrderProbe {
        fn observe(&mut self, transition: &AvailabilityTransition) {
            if self.session.observe(transition) {
                self.purges += 1;
                if matches!(self.rx.try_recv(), Ok(AvailabilityEvent::Lost)) {
                    self.saw_broadcast_before_purge = true;
                }
            }
        }
    }

    #[tokio::test]
    async fn restore_then_loss_end_to_end() {
        let host = Arc::new(FakeHost::new());
        let sink = RecordingSink::new();
        let bus = AvailabilityBus::new();
        let mut listener = bus.subscribe();
        let mut m = monitor(&host, &sink, &bus);
        let mut session = SessionState::new();

        host.set_status(Some(FakeHost::report(true, 2)));
        let event = m.tick(Wake::Startup, &mut session).await;
        assert_eq!(event, Some(AvailabilityEvent::Restored { passwords_count: 2 }));
        assert_eq!(m.verdict(), Verdict::Available);
        assert_eq!(
            listener.try_recv().ok(),
            Some(AvailabilityEvent::Restored { passwords_count: 2 })
        );
        assert_eq!(
            sink.last_indicator(),
            Some(Indicator::Connected { passwords_count: 2 })
        );

        assert!(session.store_credentials(
            session.epoch(),
            vec![CredentialRecord::new("example.com", "ann", "pw")]
        ));

        host.set_status(Some(FakeHost::report(false, 2)));
        let event = m.tick(Wake::Periodic, &mut session).await;
        assert_eq!(event, Some(AvailabilityEvent::Lost));
        assert!(session.credentials().is_empty());
        assert_eq!(listener.try_recv().ok(), Some(AvailabilityEvent::Lost));
        assert_eq!(sink.last_indicator(), Some(Indicator::Disconnected));
        assert!(
            sink.entries()
                .contains(&SinkEntry::Notice(Notice::error(CONNECTION_LOST_ALERT)))
        );
    }

    #[tokio::test]
    async fn purge_runs_before_lost_is_broadcast() {
        let host = Arc::new(FakeHost::new());
        let sink = RecordingSink::new();
        let bus = AvailabilityBus::new();
        let mut m = monitor(&host, &sink, &bus);
        let mut probe = OrderProbe {
            session: SessionState::new(),
            rx: bus.subscribe(),
            purges: 0,
            saw_broadcast_before_purge: false,
        };

        m.apply(ProbeOutcome::Report(FakeHost::report(true, 1)), &mut probe);
        // drain the restore edge
        let _ = probe.rx.try_recv();

        m.apply(ProbeOutcome::Failed("connection refused".into()), &mut probe);
        assert_eq!(probe.purges, 1);
        assert!(!probe.saw_broadcast_before_purge);
        assert_eq!(probe.rx.try_recv().ok(), Some(AvailabilityEvent::Lost));
    }

    #[tokio::test]
    async fn steady_unavailable_never_rebroadcasts() {
        let host = Arc::new(FakeHost::new());
        let sink = RecordingSink::new();
        let bus = AvailabilityBus::new();
        let mut rx = bus.subscribe();
        let mut m = monitor(&host, &sink, &bus);
        let mut session = SessionState::new();

        host.set_status(Some(FakeHost::report(true, 1)));
        m.tick(Wake::Startup, &mut session).await;
        host.set_status(None);
        for _ in 0..3 {
            m.tick(Wake::Periodic, &mut session).await;
        }

        let mut received = Vec::new();
        while let Ok(event) = rx.try_recv() {
            received.push(event);
        }
        assert_eq!(
            received,
            vec![
                AvailabilityEvent::Restored { passwords_count: 1 },
                AvailabilityEvent::Lost
            ]
        );
        let alerts = sink
            .notices()
            .into_iter()
            .filter(|n| n.message == CONNECTION_LOST_ALERT)
            .count();
        assert_eq!(alerts, 1);
    }

    #[tokio::test]
    async fn initial_unavailable_probe_purges_without_event() {
        let host = Arc::new(FakeHost::new());
        let sink = RecordingSink::new();
        let bus = AvailabilityBus::new();
        let mut m = monitor(&host, &sink, &bus);
        let mut session = SessionState::new();
        session.draft_mut().website = "typed".into();

        host.set_status(Some(FakeHost::report(false, 0)));
        let event = m.tick(Wake::Startup, &mut session).await;
        assert_eq!(event, None);
        assert!(session.draft().is_empty());
        assert_eq!(sink.last_indicator(), Some(Indicator::Disconnected));
        assert!(sink.notices().is_empty(), "no alert outside the loss edge");
    }

    #[tokio::test]
    async fn reset_makes_next_available_tick_a_restore() {
        let host = Arc::new(FakeHost::new());
        let sink = RecordingSink::new();
        let bus = AvailabilityBus::new();
        let mut m = monitor(&host, &sink, &bus);
        let mut session = SessionState::new();

        host.set_status(Some(FakeHost::report(true, 3)));
        assert!(m.tick(Wake::Startup, &mut session).await.is_some());
        assert!(m.tick(Wake::Periodic, &mut session).await.is_none());
        m.reset();
        assert_eq!(
            m.tick(Wake::Backstop, &mut session).await,
            Some(AvailabilityEvent::Restored { passwords_count: 3 })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn scheduler_fires_immediately_then_backstop_later() {
        let cancel = CancellationToken::new();
        let mut scheduler = Scheduler::new(Duration::from_secs(2), Duration::from_secs(5));

        assert_eq!(scheduler.next(&cancel).await, Some(Wake::Periodic));
        let mut wakes = Vec::new();
        for _ in 0..3 {
            wakes.push(scheduler.next(&cancel).await);
        }
        // t=2 periodic, t=4 periodic, t=5 backstop
        assert_eq!(
            wakes,
            vec![Some(Wake::Periodic), Some(Wake::Periodic), Some(Wake::Backstop)]
        );

        cancel.cancel();
        assert_eq!(scheduler.next(&cancel).await, None);
    }
}
