use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::classifier::{StateClassifier, TransitionRecord, TransitionSummary};
use super::event::HostEvent;
use super::host::HostCapabilities;
use super::packet::{IdentityProvider, PacketBuilder, PacketSink};
use super::scheduler::{DueTick, Scheduler, TickerKind};
use super::signals::{SignalSnapshot, SignalSource};
use super::time::Clock;
use crate::config::PranaConfig;
use crate::error::PranaError;

/// What a step did, for the driver to log or inspect.
#[derive(Debug, Clone, PartialEq)]
pub enum StepEffect {
    Transition(TransitionRecord),
    PacketEmitted(Uuid),
    /// Emission tick with no resolved user; the window was discarded.
    EmissionSkipped,
}

/// Composes Signal Source -> State Classifier -> Packet Builder on the
/// explicit scheduler. Finished packets go to the sink.
///
/// The reactor never sleeps: `tick_step` fires whatever the scheduler says
/// is due at the clock's current time. Production drives it from a cadence
/// loop; tests drive it by advancing a `ManualClock`.
pub struct Reactor {
    clock: Arc<dyn Clock>,
    scheduler: Scheduler,
    signals: SignalSource,
    classifier: StateClassifier,
    builder: PacketBuilder,
    sink: Arc<dyn PacketSink>,
    packets_emitted: u64,
    destroyed: bool,
}

impl Reactor {
    pub fn new(
        config: &PranaConfig,
        host: &HostCapabilities,
        clock: Arc<dyn Clock>,
        identity: Arc<dyn IdentityProvider>,
        sink: Arc<dyn PacketSink>,
    ) -> Result<Self, PranaError> {
        config.validate()?;
        let now = clock.now_ms();

        let signals = SignalSource::new(config, host, now)?;
        let classifier = StateClassifier::new(config, now);
        let builder = PacketBuilder::new(config, identity, now);

        // Registration order is the same-instant firing order.
        let mut scheduler = Scheduler::new();
        if !config.disabled {
            scheduler.register(TickerKind::Signals, config.signal_tick_ms, now);
            scheduler.register(TickerKind::Classifier, config.classifier_tick_ms, now);
            scheduler.register(TickerKind::Accounting, config.accounting_ms, now);
            scheduler.register(TickerKind::Emission, config.window_ms, now);
        }

        Ok(Self {
            clock,
            scheduler,
            signals,
            classifier,
            builder,
            sink,
            packets_emitted: 0,
            destroyed: false,
        })
    }

    /// Apply one host event at the current time.
    pub fn handle_event(&mut self, event: &HostEvent) {
        let now = self.clock.now_ms();
        self.signals.handle_event(event, now);
    }

    /// Fire every tick due at the current time, then apply `events`.
    ///
    /// Ticks run first because they are all due at or before now; the
    /// events are seen by the next evaluation.
    pub fn tick_step(&mut self, events: Vec<HostEvent>) -> Vec<StepEffect> {
        let now = self.clock.now_ms();
        let mut effects = Vec::new();

        for tick in self.scheduler.due(now) {
            if let Some(effect) = self.fire(tick) {
                effects.push(effect);
            }
        }

        for event in &events {
            self.signals.handle_event(event, now);
        }

        effects
    }

    fn fire(&mut self, tick: DueTick) -> Option<StepEffect> {
        match tick.kind {
            TickerKind::Signals => {
                self.signals.tick(tick.at_ms);
                None
            }
            TickerKind::Classifier => {
                let snapshot = self.signals.signals();
                self.classifier
                    .evaluate(&snapshot, tick.at_ms, self.clock.wall_time())
                    .map(StepEffect::Transition)
            }
            TickerKind::Accounting => {
                let snapshot = self.signals.signals();
                self.builder
                    .account(self.classifier.current_state(), &snapshot, tick.at_ms);
                None
            }
            TickerKind::Emission => {
                let snapshot = self.signals.signals();
                let state = self.classifier.current_state();
                match self.builder.emit(state, snapshot, self.clock.wall_time()) {
                    Some(packet) => {
                        let id = packet.packet_id;
                        self.sink.enqueue_packet(packet);
                        self.packets_emitted += 1;
                        Some(StepEffect::PacketEmitted(id))
                    }
                    None => Some(StepEffect::EmissionSkipped),
                }
            }
        }
    }

    pub fn signals(&self) -> SignalSnapshot {
        self.signals.signals()
    }

    pub fn classifier(&self) -> &StateClassifier {
        &self.classifier
    }

    pub fn builder(&self) -> &PacketBuilder {
        &self.builder
    }

    pub fn packets_emitted(&self) -> u64 {
        self.packets_emitted
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.scheduler.next_due_ms()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Clears every ticker. Later steps are no-ops.
    pub fn destroy(&mut self) -> TransitionSummary {
        self.scheduler.clear();
        self.destroyed = true;
        let summary = self.classifier.summary();
        info!(
            transitions = summary.total_transitions,
            packets = self.packets_emitted,
            "reactor destroyed"
        );
        debug!(?summary, "transition summary");
        summary
    }
}
