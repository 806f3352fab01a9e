use super::state::CognitiveState;
use crate::config::ClassifierConfig;
use crate::kernel::event::Visibility;
use crate::kernel::signals::SignalSnapshot;

/// Result of running the rule list once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleOutcome {
    pub state: CognitiveState,
    pub reason: &'static str,
}

impl RuleOutcome {
    fn new(state: CognitiveState, reason: &'static str) -> Self {
        Self { state, reason }
    }
}

/// The DEEP_FOCUS qualifying condition, before the sustain requirement.
pub fn deep_focus_qualifies(s: &SignalSnapshot, cfg: &ClassifierConfig) -> bool {
    s.tab_visible
        && s.window_focus
        && s.dwell_time_ms > cfg.deep_focus_min_dwell_ms
        && s.mouse_velocity < cfg.deep_focus_max_velocity
        && s.inactivity_ms < cfg.deep_focus_max_inactivity_ms
        && s.rapid_click_count == 0
}

/// Priority-ordered, first match wins. `deep_focus_sustained` is supplied by
/// the caller, which owns the candidate timer.
pub fn evaluate(s: &SignalSnapshot, cfg: &ClassifierConfig, deep_focus_sustained: bool) -> RuleOutcome {
    use CognitiveState::*;

    // 1. AWAY pre-empts everything.
    if !s.tab_visible {
        return RuleOutcome::new(Away, "tab_hidden");
    }
    if s.browser_visibility == Visibility::Hidden {
        return RuleOutcome::new(Away, "browser_hidden");
    }
    if !s.window_focus {
        return RuleOutcome::new(Away, "window_blurred");
    }

    // 2. Visible, but focus left the task panel.
    if !s.panel_focused {
        return RuleOutcome::new(Distracted, "panel_unfocused");
    }

    // 3.
    if s.inactivity_ms >= cfg.idle_threshold_ms {
        return RuleOutcome::new(Idle, "inactivity_threshold");
    }

    // 4. Anxious or frustrated motion.
    if s.rapid_click_count >= cfg.rapid_click_threshold {
        return RuleOutcome::new(OffTask, "rapid_clicks");
    }
    if s.mouse_velocity > cfg.off_task_velocity {
        return RuleOutcome::new(OffTask, "high_velocity");
    }

    // 5.
    if deep_focus_sustained {
        return RuleOutcome::new(DeepFocus, "sustained_focus");
    }

    // 6.
    if s.mouse_velocity < cfg.thinking_max_velocity
        && s.inactivity_ms >= cfg.thinking_min_inactivity_ms
        && s.inactivity_ms < cfg.thinking_max_inactivity_ms
        && s.rapid_click_count == 0
    {
        return RuleOutcome::new(Thinking, "short_pause");
    }

    // 7.
    RuleOutcome::new(OnTask, "default")
}
