use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::queue::{DeliveryStats, OfflineQueue, QueueEntry};
use super::store::PersistentStore;
use super::transport::NetworkTransport;
use crate::config::{DeliveryConfig, PranaConfig};
use crate::error::TransportError;
use crate::kernel::packet::{PacketSink, TelemetryPacket};
use crate::kernel::time::Clock;

/// Store-and-forward delivery of telemetry packets.
///
/// Per packet: `queued -> sending -> (sent | retrying -> sending)* -> (sent | offline)`.
/// A single drain task empties the live queue in batches; the `sending`
/// flag keeps a second drain from starting while one is running.
#[derive(Clone)]
pub struct DeliveryBridge {
    inner: Arc<BridgeInner>,
}

struct BridgeInner {
    enabled: bool,
    config: DeliveryConfig,
    clock: Arc<dyn Clock>,
    transport: Arc<dyn NetworkTransport>,
    store: Arc<dyn PersistentStore>,
    queues: Mutex<Queues>,
    sending: AtomicBool,
    online: AtomicBool,
    sent: AtomicU64,
    failed: AtomicU64,
    shutdown: CancellationToken,
}

struct Queues {
    live: VecDeque<QueueEntry>,
    offline: OfflineQueue,
    in_flight: usize,
    backing_off: usize,
}

impl DeliveryBridge {
    /// Reads the persisted offline queue once.
    pub fn new(
        config: &PranaConfig,
        clock: Arc<dyn Clock>,
        transport: Arc<dyn NetworkTransport>,
        store: Arc<dyn PersistentStore>,
    ) -> Self {
        let delivery = config.delivery.clone();
        let offline = if config.disabled {
            info!("delivery bridge disabled by kill switch");
            OfflineQueue::new(delivery.storage_key.clone(), delivery.offline_cap)
        } else {
            OfflineQueue::load(delivery.storage_key.clone(), delivery.offline_cap, store.as_ref())
        };
        if !offline.is_empty() {
            info!(offline = offline.len(), "restored offline queue");
        }

        Self {
            inner: Arc::new(BridgeInner {
                enabled: !config.disabled,
                online: AtomicBool::new(delivery.start_online),
                config: delivery,
                clock,
                transport,
                store,
                queues: Mutex::new(Queues {
                    live: VecDeque::new(),
                    offline,
                    in_flight: 0,
                    backing_off: 0,
                }),
                sending: AtomicBool::new(false),
                sent: AtomicU64::new(0),
                failed: AtomicU64::new(0),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Fire-and-forget. Invalid packets are dropped with a warning.
    pub fn enqueue_packet(&self, packet: TelemetryPacket) {
        let inner = &self.inner;
        if !inner.enabled {
            return;
        }
        if inner.shutdown.is_cancelled() {
            debug!(packet_id = %packet.packet_id, "bridge shut down, packet dropped");
            return;
        }
        if let Err(err) = packet.validate() {
            warn!(error = %err, packet_id = %packet.packet_id, "dropping invalid packet");
            return;
        }

        let entry = QueueEntry::new(packet, inner.clock.wall_time());
        if inner.is_online() {
            inner.lock().live.push_back(entry);
            BridgeInner::kick(inner);
        } else {
            debug!(packet_id = %entry.packet.packet_id, "offline, queueing packet for replay");
            let mut queues = inner.lock();
            queues.offline.push(entry);
            inner.persist(&mut queues);
        }
    }

    /// Host-built JSON packet. Non-objects and malformed payloads are dropped
    /// with a warning.
    pub fn enqueue_value(&self, value: serde_json::Value) {
        match TelemetryPacket::from_value(value) {
            Ok(packet) => self.enqueue_packet(packet),
            Err(err) => warn!(error = %err, "dropping malformed packet"),
        }
    }

    pub fn stats(&self) -> DeliveryStats {
        let queues = self.inner.lock();
        DeliveryStats {
            sent: self.inner.sent.load(Ordering::SeqCst),
            failed: self.inner.failed.load(Ordering::SeqCst),
            queued: queues.live.len() + queues.in_flight + queues.backing_off,
            offline: queues.offline.len(),
        }
    }

    pub fn offline_entries(&self) -> Vec<QueueEntry> {
        self.inner.lock().offline.entries().to_vec()
    }

    pub fn is_online(&self) -> bool {
        self.inner.is_online()
    }

    /// Connectivity report from the host. Going online replays the offline
    /// queue.
    pub fn set_online(&self, online: bool) {
        let was_online = self.inner.online.swap(online, Ordering::SeqCst);
        if online && !was_online {
            info!("connectivity restored");
            BridgeInner::replay_offline(&self.inner);
            BridgeInner::kick(&self.inner);
        } else if !online && was_online {
            info!("connectivity lost, new packets go to the offline queue");
            // Waiting live entries are older than anything enqueued from
            // now on; parking them keeps replay in enqueue order.
            self.inner.park_live("connectivity lost");
        }
    }

    /// Periodic offline sweep. Runs until `shutdown`.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let period = Duration::from_millis(inner.config.sweep_interval_ms.max(1));
            let mut sweep = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            sweep.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = sweep.tick() => {
                        if inner.is_online() {
                            BridgeInner::replay_offline(&inner);
                            BridgeInner::kick(&inner);
                        }
                    }
                    _ = inner.shutdown.cancelled() => break,
                }
            }
        })
    }

    /// Teardown: stop draining and sweeping, then park whatever is still
    /// live in the offline queue so a restart can replay it.
    pub fn shutdown(&self) {
        let inner = &self.inner;
        if inner.shutdown.is_cancelled() {
            return;
        }
        inner.shutdown.cancel();
        inner.park_live("shutdown");
    }
}

impl PacketSink for DeliveryBridge {
    fn enqueue_packet(&self, packet: TelemetryPacket) {
        DeliveryBridge::enqueue_packet(self, packet);
    }
}

impl BridgeInner {
    fn lock(&self) -> MutexGuard<'_, Queues> {
        self.queues.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Move every waiting live entry, in order, to the offline queue.
    fn park_live(&self, reason: &'static str) {
        let mut queues = self.lock();
        if queues.live.is_empty() {
            return;
        }
        let pending: Vec<QueueEntry> = queues.live.drain(..).collect();
        info!(pending = pending.len(), reason, "parking live queue offline");
        for entry in pending {
            queues.offline.push(entry);
        }
        self.persist(&mut queues);
    }

    fn persist(&self, queues: &mut Queues) {
        if let Err(err) = queues.offline.persist(self.store.as_ref()) {
            warn!(error = %err, offline = queues.offline.len(), "offline queue not persisted this cycle");
        }
    }

    /// Start a drain unless one is already running. Outside a runtime the
    /// entries simply wait for the next kick.
    fn kick(inner: &Arc<BridgeInner>) {
        if !inner.enabled || inner.shutdown.is_cancelled() || !inner.is_online() {
            return;
        }
        if inner
            .sending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(BridgeInner::drain(inner.clone()));
            }
            Err(_) => {
                inner.sending.store(false, Ordering::SeqCst);
                warn!("no async runtime, delivery deferred");
            }
        }
    }

    async fn drain(inner: Arc<BridgeInner>) {
        loop {
            if inner.shutdown.is_cancelled() || !inner.is_online() {
                break;
            }

            let batch: Vec<QueueEntry> = {
                let mut queues = inner.lock();
                let take = inner.config.batch_size.min(queues.live.len());
                let batch: Vec<QueueEntry> = queues.live.drain(..take).collect();
                queues.in_flight += batch.len();
                batch
            };
            if batch.is_empty() {
                break;
            }

            // Every send in the batch runs concurrently; each settles on its own.
            let timeout_ms = inner.config.send_timeout_ms;
            let handles: Vec<(QueueEntry, JoinHandle<Result<(), TransportError>>)> = batch
                .into_iter()
                .map(|entry| {
                    let transport = inner.transport.clone();
                    let packet = entry.packet.clone();
                    let handle = tokio::spawn(async move {
                        match tokio::time::timeout(Duration::from_millis(timeout_ms), transport.send(&packet)).await {
                            Ok(result) => result,
                            Err(_) => Err(TransportError::Timeout(timeout_ms)),
                        }
                    });
                    (entry, handle)
                })
                .collect();

            for (entry, handle) in handles {
                let outcome = match handle.await {
                    Ok(result) => result,
                    Err(join_err) => Err(TransportError::Network(join_err.to_string())),
                };
                inner.lock().in_flight -= 1;
                match outcome {
                    Ok(()) => {
                        inner.sent.fetch_add(1, Ordering::SeqCst);
                        debug!(packet_id = %entry.packet.packet_id, "packet delivered");
                    }
                    Err(err) => BridgeInner::on_failure(&inner, entry, err),
                }
            }
        }

        inner.sending.store(false, Ordering::SeqCst);

        // Entries that arrived after the last batch was taken.
        let pending = !inner.lock().live.is_empty();
        if pending {
            BridgeInner::kick(&inner);
        }
    }

    fn on_failure(inner: &Arc<BridgeInner>, mut entry: QueueEntry, err: TransportError) {
        entry.retry_count += 1;

        if inner.shutdown.is_cancelled() {
            let mut queues = inner.lock();
            queues.offline.push(entry);
            inner.persist(&mut queues);
            return;
        }

        if entry.retry_count > inner.config.max_retries {
            inner.failed.fetch_add(1, Ordering::SeqCst);
            warn!(
                packet_id = %entry.packet.packet_id,
                attempts = entry.retry_count,
                error = %err,
                "retry budget exhausted, moving packet offline"
            );
            let mut queues = inner.lock();
            queues.offline.push(entry);
            inner.persist(&mut queues);
            return;
        }

        // base * 2^retry, where retry counts the retries already scheduled.
        let exponent = (entry.retry_count - 1).min(16);
        let delay = inner.config.backoff_base_ms.saturating_mul(1u64 << exponent);
        debug!(
            packet_id = %entry.packet.packet_id,
            retry = entry.retry_count,
            delay_ms = delay,
            error = %err,
            "send failed, backing off"
        );

        inner.lock().backing_off += 1;
        let inner = inner.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(delay)) => {
                    let online = inner.is_online();
                    {
                        let mut queues = inner.lock();
                        queues.backing_off -= 1;
                        if online {
                            queues.live.push_back(entry);
                        } else {
                            queues.offline.push(entry);
                            inner.persist(&mut queues);
                        }
                    }
                    BridgeInner::kick(&inner);
                }
                _ = inner.shutdown.cancelled() => {
                    let mut queues = inner.lock();
                    queues.backing_off -= 1;
                    queues.offline.push(entry);
                    inner.persist(&mut queues);
                }
            }
        });
    }

    /// Merge the offline queue back ahead of the live queue. Callers kick
    /// the drain afterwards.
    fn replay_offline(inner: &BridgeInner) {
        if !inner.enabled || inner.shutdown.is_cancelled() {
            return;
        }
        let mut queues = inner.lock();
        if queues.offline.is_empty() {
            return;
        }
        let mut replay = queues.offline.take_all();
        info!(count = replay.len(), "replaying offline queue");
        for entry in replay.iter_mut() {
            entry.retry_count = 0;
        }
        let newer: Vec<QueueEntry> = queues.live.drain(..).collect();
        queues.live.extend(replay);
        queues.live.extend(newer);
        inner.persist(&mut queues);
    }
}
