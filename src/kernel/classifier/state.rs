use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::kernel::signals::SignalSnapshot;

/// Inferred engagement. Exactly one is active at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CognitiveState {
    OnTask,
    Thinking,
    Idle,
    Distracted,
    Away,
    OffTask,
    DeepFocus,
}

impl Default for CognitiveState {
    fn default() -> Self {
        Self::OnTask
    }
}

impl CognitiveState {
    pub const ALL: [CognitiveState; 7] = [
        CognitiveState::OnTask,
        CognitiveState::Thinking,
        CognitiveState::Idle,
        CognitiveState::Distracted,
        CognitiveState::Away,
        CognitiveState::OffTask,
        CognitiveState::DeepFocus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CognitiveState::OnTask => "ON_TASK",
            CognitiveState::Thinking => "THINKING",
            CognitiveState::Idle => "IDLE",
            CognitiveState::Distracted => "DISTRACTED",
            CognitiveState::Away => "AWAY",
            CognitiveState::OffTask => "OFF_TASK",
            CognitiveState::DeepFocus => "DEEP_FOCUS",
        }
    }
}

impl fmt::Display for CognitiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Redacted view of the snapshot kept with each transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalExtract {
    pub tab_visible: bool,
    pub window_focus: bool,
    pub panel_focused: bool,
    pub inactivity_ms: u64,
    pub mouse_velocity: f64,
    pub rapid_click_count: u32,
    pub dwell_time_ms: u64,
}

impl From<&SignalSnapshot> for SignalExtract {
    fn from(s: &SignalSnapshot) -> Self {
        Self {
            tab_visible: s.tab_visible,
            window_focus: s.window_focus,
            panel_focused: s.panel_focused,
            inactivity_ms: s.inactivity_ms,
            mouse_velocity: s.mouse_velocity,
            rapid_click_count: s.rapid_click_count,
            dwell_time_ms: s.dwell_time_ms,
        }
    }
}

/// Audit entry for one applied transition. Never read back into decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub timestamp: DateTime<Utc>,
    pub at_ms: u64,
    pub from: CognitiveState,
    pub to: CognitiveState,
    pub reason: String,
    pub previous_duration_ms: u64,
    pub signals: SignalExtract,
}
