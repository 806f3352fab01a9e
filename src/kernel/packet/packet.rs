use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Add;
use uuid::Uuid;

use crate::error::PacketError;
use crate::kernel::classifier::CognitiveState;
use crate::kernel::signals::SignalSnapshot;

/// A duration in tenths of a second.
///
/// Window partitions are computed and summed in this unit so the exact-sum
/// invariant holds on integers. On the wire it is a decimal seconds value
/// with one fractional digit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tenths(pub u32);

impl Tenths {
    pub fn from_ms(ms: u64) -> Self {
        Tenths(((ms + 50) / 100) as u32)
    }

    pub fn tenths(self) -> u32 {
        self.0
    }

    pub fn as_secs(self) -> f64 {
        f64::from(self.0) / 10.0
    }
}

impl Add for Tenths {
    type Output = Tenths;

    fn add(self, rhs: Tenths) -> Tenths {
        Tenths(self.0 + rhs.0)
    }
}

impl fmt::Display for Tenths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

impl Serialize for Tenths {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_secs())
    }
}

impl<'de> Deserialize<'de> for Tenths {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(serde::de::Error::custom(format!("invalid duration {secs}")));
        }
        Ok(Tenths((secs * 10.0).round() as u32))
    }
}

/// The unit shipped to the ingest endpoint, one per window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryPacket {
    #[serde(default = "Uuid::new_v4")]
    pub packet_id: Uuid,
    pub user_id: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub lesson_id: Option<String>,
    pub system_type: String,
    pub role: String,
    pub timestamp: DateTime<Utc>,
    pub cognitive_state: CognitiveState,
    /// Nominal window length; zero when the producer did not report one.
    #[serde(default)]
    pub window_seconds: Tenths,
    pub active_seconds: Tenths,
    pub idle_seconds: Tenths,
    pub away_seconds: Tenths,
    pub focus_score: u8,
    pub raw_signals: SignalSnapshot,
}

impl TelemetryPacket {
    /// Parse a host-built JSON packet.
    pub fn from_value(value: serde_json::Value) -> Result<Self, PacketError> {
        if !value.is_object() {
            return Err(PacketError::NotAnObject);
        }
        let packet: TelemetryPacket = serde_json::from_value(value)?;
        packet.validate()?;
        Ok(packet)
    }

    pub fn validate(&self) -> Result<(), PacketError> {
        if self.user_id.trim().is_empty() {
            return Err(PacketError::MissingUser);
        }
        if self.focus_score > 100 {
            return Err(PacketError::ScoreOutOfRange(self.focus_score));
        }
        let got = self.active_seconds + self.idle_seconds + self.away_seconds;
        if self.window_seconds.0 > 0 && got != self.window_seconds {
            return Err(PacketError::PartitionMismatch {
                got: got.0,
                expected: self.window_seconds.0,
            });
        }
        Ok(())
    }
}
