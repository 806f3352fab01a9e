use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::identity::IdentityProvider;
use super::normalize::{normalize, WindowPartition};
use super::packet::{Tenths, TelemetryPacket};
use super::score::focus_score;
use crate::config::PranaConfig;
use crate::kernel::classifier::CognitiveState;
use crate::kernel::signals::SignalSnapshot;

/// Where finished packets go. Ownership moves on enqueue.
pub trait PacketSink: Send + Sync {
    fn enqueue_packet(&self, packet: TelemetryPacket);
}

/// Which bucket a slice of time lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBucket {
    Active,
    Idle,
    Away,
}

impl TimeBucket {
    pub fn classify(state: CognitiveState, signals: &SignalSnapshot) -> Self {
        match state {
            CognitiveState::Away => TimeBucket::Away,
            _ if !signals.tab_visible => TimeBucket::Away,
            CognitiveState::Idle => TimeBucket::Idle,
            _ => TimeBucket::Active,
        }
    }
}

/// Raw millisecond accumulators for the current window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowAccumulator {
    pub active_ms: u64,
    pub idle_ms: u64,
    pub away_ms: u64,
}

impl WindowAccumulator {
    pub fn add(&mut self, bucket: TimeBucket, ms: u64) {
        match bucket {
            TimeBucket::Active => self.active_ms += ms,
            TimeBucket::Idle => self.idle_ms += ms,
            TimeBucket::Away => self.away_ms += ms,
        }
    }

    pub fn total_ms(&self) -> u64 {
        self.active_ms + self.idle_ms + self.away_ms
    }
}

/// Windowed time accounting and packet assembly.
pub struct PacketBuilder {
    enabled: bool,
    window_ms: u64,
    system_type: String,
    role: String,
    identity: Arc<dyn IdentityProvider>,
    window: WindowAccumulator,
    last_accounting_ms: u64,
}

impl PacketBuilder {
    pub fn new(config: &PranaConfig, identity: Arc<dyn IdentityProvider>, now_ms: u64) -> Self {
        if config.disabled {
            info!("packet builder disabled by kill switch");
        }
        Self {
            enabled: !config.disabled,
            window_ms: config.window_ms,
            system_type: config.system_type.clone(),
            role: config.role.clone(),
            identity,
            window: WindowAccumulator::default(),
            last_accounting_ms: now_ms,
        }
    }

    pub fn accumulated(&self) -> WindowAccumulator {
        self.window
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Accounting tick: the time since the previous tick goes to exactly
    /// one bucket, chosen by the current state.
    pub fn account(&mut self, state: CognitiveState, signals: &SignalSnapshot, now_ms: u64) {
        let elapsed = now_ms.saturating_sub(self.last_accounting_ms);
        self.last_accounting_ms = now_ms;
        if !self.enabled || elapsed == 0 {
            return;
        }
        self.window.add(TimeBucket::classify(state, signals), elapsed);
    }

    /// Emission tick. Always resets the window; returns a packet only when
    /// the identity resolves to a user.
    pub fn emit(
        &mut self,
        state: CognitiveState,
        signals: SignalSnapshot,
        wall: DateTime<Utc>,
    ) -> Option<TelemetryPacket> {
        let window = std::mem::take(&mut self.window);
        if !self.enabled {
            return None;
        }

        let identity = self.identity.identity();
        let Some(user_id) = identity.resolved_user().map(str::to_string) else {
            debug!(accumulated_ms = window.total_ms(), "no resolved user, skipping emission");
            return None;
        };

        let partition = normalize(window.active_ms, window.idle_ms, window.away_ms, self.window_ms);
        let score = focus_score(state, &signals, partition.active_ratio());

        let packet = self.assemble(user_id, identity.session_id, identity.lesson_id, state, partition, score, signals, wall);
        debug!(
            packet_id = %packet.packet_id,
            state = %packet.cognitive_state,
            active = %packet.active_seconds,
            idle = %packet.idle_seconds,
            away = %packet.away_seconds,
            focus_score = packet.focus_score,
            "telemetry packet built"
        );
        Some(packet)
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        &self,
        user_id: String,
        session_id: Option<String>,
        lesson_id: Option<String>,
        state: CognitiveState,
        partition: WindowPartition,
        focus_score: u8,
        signals: SignalSnapshot,
        wall: DateTime<Utc>,
    ) -> TelemetryPacket {
        TelemetryPacket {
            packet_id: Uuid::new_v4(),
            user_id,
            session_id,
            lesson_id,
            system_type: self.system_type.clone(),
            role: self.role.clone(),
            timestamp: wall,
            cognitive_state: state,
            window_seconds: Tenths::from_ms(self.window_ms),
            active_seconds: partition.active,
            idle_seconds: partition.idle,
            away_seconds: partition.away,
            focus_score,
            raw_signals: signals,
        }
    }
}
