use serde::{Deserialize, Serialize};

use crate::kernel::event::Visibility;

/// Point-in-time copy of every behavioral metric.
///
/// Consumers only ever hold one of these by value; the live metrics stay
/// private to the Signal Source. Every field derives from timestamped events
/// and the monotonic clock. Nothing here encodes content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSnapshot {
    pub window_focus: bool,
    pub browser_visibility: Visibility,
    pub tab_visible: bool,
    pub panel_focused: bool,
    /// focus AND visible
    pub task_tab_active: bool,

    // Counters since process start.
    pub keystroke_count: u64,
    pub mouse_events: u64,
    pub scroll_events: u64,
    pub content_clicks: u64,
    pub app_switches: u64,

    /// Cumulative pointer travel, px.
    pub mouse_distance: f64,
    /// Instantaneous pointer speed, px/s.
    pub mouse_velocity: f64,
    /// 0..=100 percent of scrollable extent.
    pub scroll_depth: f64,
    pub hover_loops: u64,

    pub idle_seconds: u64,
    pub inactivity_ms: u64,
    pub dwell_time_ms: u64,
    /// Clicks in the trailing 2000ms window, 0 unless at least 3.
    pub rapid_click_count: u32,
}

impl SignalSnapshot {
    pub fn initial(window_focus: bool, visibility: Visibility) -> Self {
        let tab_visible = visibility == Visibility::Visible;
        Self {
            window_focus,
            browser_visibility: visibility,
            tab_visible,
            panel_focused: window_focus,
            task_tab_active: window_focus && tab_visible,
            keystroke_count: 0,
            mouse_events: 0,
            scroll_events: 0,
            content_clicks: 0,
            app_switches: 0,
            mouse_distance: 0.0,
            mouse_velocity: 0.0,
            scroll_depth: 0.0,
            hover_loops: 0,
            idle_seconds: 0,
            inactivity_ms: 0,
            dwell_time_ms: 0,
            rapid_click_count: 0,
        }
    }

    /// Visible and focused: the only condition under which dwell accrues.
    pub fn is_engaged_surface(&self) -> bool {
        self.tab_visible && self.window_focus && self.browser_visibility == Visibility::Visible
    }
}

impl Default for SignalSnapshot {
    fn default() -> Self {
        Self::initial(true, Visibility::Visible)
    }
}
