#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use prana::error::TransportError;
use prana::kernel::classifier::CognitiveState;
use prana::kernel::packet::{PacketSink, Tenths, TelemetryPacket};
use prana::kernel::signals::SignalSnapshot;
use prana::services::delivery::{NetworkTransport, SendFuture};

/// Transport that answers from a script, then falls back to a default.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<(), u16>>>,
    fail_by_default: bool,
    pub attempts: AtomicUsize,
    pub delivered: Mutex<Vec<Uuid>>,
}

impl ScriptedTransport {
    pub fn always_ok() -> Self {
        Self::with_script(Vec::new(), false)
    }

    pub fn always_failing() -> Self {
        Self::with_script(Vec::new(), true)
    }

    pub fn with_script(script: Vec<Result<(), u16>>, fail_by_default: bool) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fail_by_default,
            attempts: AtomicUsize::new(0),
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn delivered(&self) -> Vec<Uuid> {
        self.delivered.lock().unwrap().clone()
    }
}

impl NetworkTransport for ScriptedTransport {
    fn send<'a>(&'a self, packet: &'a TelemetryPacket) -> SendFuture<'a> {
        Box::pin(async move {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let scripted = self.script.lock().unwrap().pop_front();
            let outcome = scripted.unwrap_or(if self.fail_by_default { Err(503) } else { Ok(()) });
            match outcome {
                Ok(()) => {
                    self.delivered.lock().unwrap().push(packet.packet_id);
                    Ok(())
                }
                Err(status) => Err(TransportError::Status(status)),
            }
        })
    }
}

/// Transport that never answers; only the bridge's timeout ends a send.
pub struct HangingTransport;

impl NetworkTransport for HangingTransport {
    fn send<'a>(&'a self, _packet: &'a TelemetryPacket) -> SendFuture<'a> {
        Box::pin(std::future::pending())
    }
}

/// Sink that keeps every packet handed to it.
#[derive(Default)]
pub struct RecordingSink {
    pub packets: Mutex<Vec<TelemetryPacket>>,
}

impl RecordingSink {
    pub fn packets(&self) -> Vec<TelemetryPacket> {
        self.packets.lock().unwrap().clone()
    }
}

impl PacketSink for RecordingSink {
    fn enqueue_packet(&self, packet: TelemetryPacket) {
        self.packets.lock().unwrap().push(packet);
    }
}

pub fn packet(user: &str) -> TelemetryPacket {
    TelemetryPacket {
        packet_id: Uuid::new_v4(),
        user_id: user.to_string(),
        session_id: Some("session-1".to_string()),
        lesson_id: None,
        system_type: "SCHOOL".to_string(),
        role: "STUDENT".to_string(),
        timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        cognitive_state: CognitiveState::OnTask,
        window_seconds: Tenths(50),
        active_seconds: Tenths(40),
        idle_seconds: Tenths(5),
        away_seconds: Tenths(5),
        focus_score: 72,
        raw_signals: SignalSnapshot::default(),
    }
}
