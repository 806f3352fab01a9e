use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::PranaConfig;
use crate::error::PranaError;
use crate::kernel::classifier::TransitionSummary;
use crate::kernel::event::HostEvent;
use crate::kernel::host::HostCapabilities;
use crate::kernel::packet::IdentityProvider;
use crate::kernel::reactor::{Reactor, StepEffect};
use crate::kernel::time::Clock;
use crate::services::delivery::{DeliveryBridge, DeliveryStats, NetworkTransport, PersistentStore};

const EVENT_CHANNEL_CAPACITY: usize = 1_024;

/// The assembled pipeline, not yet running.
pub struct Prana {
    reactor: Reactor,
    bridge: DeliveryBridge,
    cadence_ms: u64,
    disabled: bool,
}

impl Prana {
    /// Wire every component from explicit collaborators. No global state.
    pub fn assemble(
        config: &PranaConfig,
        host: &HostCapabilities,
        clock: Arc<dyn Clock>,
        identity: Arc<dyn IdentityProvider>,
        transport: Arc<dyn NetworkTransport>,
        store: Arc<dyn PersistentStore>,
    ) -> Result<Self, PranaError> {
        let bridge = DeliveryBridge::new(config, clock.clone(), transport, store);
        let reactor = Reactor::new(config, host, clock, identity, Arc::new(bridge.clone()))?;

        // The fastest ticker sets the driver cadence.
        let cadence_ms = config
            .accounting_ms
            .min(config.signal_tick_ms)
            .min(config.classifier_tick_ms)
            .max(1);

        Ok(Self {
            reactor,
            bridge,
            cadence_ms,
            disabled: config.disabled,
        })
    }

    pub fn bridge(&self) -> &DeliveryBridge {
        &self.bridge
    }

    /// Spawn the cadence loop and the offline sweeper. Must be called inside
    /// a tokio runtime.
    pub fn start(self) -> PranaHandle {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();
        let bridge = self.bridge.clone();

        if self.disabled {
            info!("prana disabled, not starting tickers");
            return PranaHandle {
                events: tx,
                bridge,
                cancel,
                driver: None,
                sweeper: None,
            };
        }

        let sweeper = bridge.spawn_sweeper();
        let driver = tokio::spawn(drive(self.reactor, bridge.clone(), rx, cancel.clone(), self.cadence_ms));
        info!(cadence_ms = self.cadence_ms, "prana started");

        PranaHandle {
            events: tx,
            bridge,
            cancel,
            driver: Some(driver),
            sweeper: Some(sweeper),
        }
    }
}

/// Handle to a running pipeline.
pub struct PranaHandle {
    events: mpsc::Sender<HostEvent>,
    bridge: DeliveryBridge,
    cancel: CancellationToken,
    driver: Option<JoinHandle<TransitionSummary>>,
    sweeper: Option<JoinHandle<()>>,
}

impl PranaHandle {
    pub fn events(&self) -> mpsc::Sender<HostEvent> {
        self.events.clone()
    }

    pub async fn send(&self, event: HostEvent) {
        if self.events.send(event).await.is_err() {
            debug!("pipeline stopped, host event dropped");
        }
    }

    pub fn stats(&self) -> DeliveryStats {
        self.bridge.stats()
    }

    pub fn bridge(&self) -> &DeliveryBridge {
        &self.bridge
    }

    /// Stop every ticker and the sweeper, park undelivered packets in the
    /// durable store, and wait for the tasks to finish.
    pub async fn destroy(mut self) -> Option<TransitionSummary> {
        self.cancel.cancel();

        // The driver may still hand over a packet until it has exited.
        let mut summary = None;
        if let Some(driver) = self.driver.take() {
            match driver.await {
                Ok(s) => summary = Some(s),
                Err(err) => warn!(error = %err, "driver task failed to join"),
            }
        }
        self.bridge.shutdown();
        if let Some(sweeper) = self.sweeper.take() {
            if let Err(err) = sweeper.await {
                warn!(error = %err, "sweeper task failed to join");
            }
        }
        summary
    }
}

impl Drop for PranaHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn drive(
    mut reactor: Reactor,
    bridge: DeliveryBridge,
    mut events: mpsc::Receiver<HostEvent>,
    cancel: CancellationToken,
    cadence_ms: u64,
) -> TransitionSummary {
    let mut cadence = interval(Duration::from_millis(cadence_ms));
    cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            Some(event) = events.recv() => {
                match event {
                    HostEvent::Online => bridge.set_online(true),
                    HostEvent::Offline => bridge.set_online(false),
                    other => reactor.handle_event(&other),
                }
            }
            _ = cadence.tick() => {
                for effect in reactor.tick_step(Vec::new()) {
                    match effect {
                        StepEffect::Transition(record) => {
                            debug!(from = %record.from, to = %record.to, "transition applied");
                        }
                        StepEffect::PacketEmitted(id) => debug!(packet_id = %id, "packet handed to delivery"),
                        StepEffect::EmissionSkipped => {}
                    }
                }
            }
        }
    }

    reactor.destroy()
}
