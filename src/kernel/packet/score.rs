use crate::kernel::classifier::CognitiveState;
use crate::kernel::signals::SignalSnapshot;

pub const HIGH_VELOCITY_PX_S: f64 = 1_500.0;
pub const LOW_DWELL_MS: u64 = 30_000;

pub const VELOCITY_PENALTY: i32 = 15;
pub const RAPID_CLICK_PENALTY: i32 = 20;
pub const LOW_DWELL_PENALTY: i32 = 10;
pub const PANEL_FOCUS_PENALTY: i32 = 15;

pub fn base_score(state: CognitiveState) -> i32 {
    match state {
        CognitiveState::DeepFocus => 95,
        CognitiveState::OnTask => 80,
        CognitiveState::Thinking => 70,
        CognitiveState::Distracted => 35,
        CognitiveState::Away => 25,
        CognitiveState::Idle => 15,
        CognitiveState::OffTask => 15,
    }
}

/// Deterministic engagement score in [0, 100].
///
/// Base score for the state, minus independent penalties, scaled by the
/// share of the window that was genuinely active.
pub fn focus_score(state: CognitiveState, signals: &SignalSnapshot, active_ratio: f64) -> u8 {
    let mut score = base_score(state);

    if signals.mouse_velocity > HIGH_VELOCITY_PX_S {
        score -= VELOCITY_PENALTY;
    }
    if signals.rapid_click_count > 0 {
        score -= RAPID_CLICK_PENALTY;
    }
    if signals.dwell_time_ms < LOW_DWELL_MS {
        score -= LOW_DWELL_PENALTY;
    }
    if !signals.panel_focused {
        score -= PANEL_FOCUS_PENALTY;
    }

    let ratio = if active_ratio.is_finite() { active_ratio.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = (f64::from(score.max(0)) * ratio).round();
    scaled.clamp(0.0, 100.0) as u8
}
