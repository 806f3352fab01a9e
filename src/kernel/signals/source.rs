use std::collections::VecDeque;
use tracing::{debug, info};

use super::pointer::PointerTracker;
use super::snapshot::SignalSnapshot;
use crate::config::PranaConfig;
use crate::error::PranaError;
use crate::kernel::event::{HostEvent, Visibility};
use crate::kernel::host::HostCapabilities;

/// Trailing window for rapid-click detection.
pub const RAPID_CLICK_WINDOW_MS: u64 = 2_000;
/// Clicks needed inside the window before any are reported.
pub const RAPID_CLICK_MIN: usize = 3;
/// Pointer speed is reported as zero once the pointer rests this long.
pub const VELOCITY_STALE_MS: u64 = 1_000;

/// Single writer of the behavioral metrics.
///
/// Host events and the 1 Hz tick are the only inputs; `signals()` hands out
/// copies. A disabled source ignores everything and reports defaults.
#[derive(Debug)]
pub struct SignalSource {
    live: Option<LiveSignals>,
}

#[derive(Debug)]
struct LiveSignals {
    snapshot: SignalSnapshot,
    pointer: PointerTracker,
    clicks: VecDeque<u64>,
    /// Focus within the task panel, independent of window focus.
    panel_focus: bool,
    last_activity_ms: u64,
    last_pointer_ms: Option<u64>,
    last_tick_ms: u64,
}

impl SignalSource {
    pub fn new(config: &PranaConfig, host: &HostCapabilities, now_ms: u64) -> Result<Self, PranaError> {
        if config.disabled {
            info!("signal source disabled by kill switch");
            return Ok(Self::disabled());
        }

        let (focused, visibility) = host.initial()?;
        Ok(Self {
            live: Some(LiveSignals {
                snapshot: SignalSnapshot::initial(focused, visibility),
                pointer: PointerTracker::new(),
                clicks: VecDeque::new(),
                panel_focus: true,
                last_activity_ms: now_ms,
                last_pointer_ms: None,
                last_tick_ms: now_ms,
            }),
        })
    }

    pub fn disabled() -> Self {
        Self { live: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.live.is_some()
    }

    /// Copy of the current metrics.
    pub fn signals(&self) -> SignalSnapshot {
        self.live
            .as_ref()
            .map(|live| live.snapshot.clone())
            .unwrap_or_default()
    }

    pub fn handle_event(&mut self, event: &HostEvent, now_ms: u64) {
        let Some(live) = self.live.as_mut() else { return };
        live.apply(event, now_ms);
    }

    /// 1 Hz recompute of inactivity and dwell.
    pub fn tick(&mut self, now_ms: u64) {
        let Some(live) = self.live.as_mut() else { return };
        live.tick(now_ms);
    }
}

impl LiveSignals {
    fn apply(&mut self, event: &HostEvent, now_ms: u64) {
        match event {
            HostEvent::Focus => {
                self.snapshot.window_focus = true;
            }
            HostEvent::Blur => {
                if self.snapshot.window_focus {
                    self.snapshot.app_switches += 1;
                }
                self.snapshot.window_focus = false;
            }
            HostEvent::Visibility { state } => {
                if *state == Visibility::Hidden && self.snapshot.browser_visibility == Visibility::Visible {
                    self.snapshot.app_switches += 1;
                }
                self.snapshot.browser_visibility = *state;
            }
            HostEvent::PanelFocus { focused } => {
                self.panel_focus = *focused;
            }
            HostEvent::KeyDown => {
                self.snapshot.keystroke_count += 1;
                self.mark_activity(now_ms);
            }
            HostEvent::PointerMove { x, y } => {
                if !x.is_finite() || !y.is_finite() {
                    debug!("ignoring pointer move with non-finite coordinates");
                    return;
                }
                let update = self.pointer.record(*x, *y, now_ms);
                self.snapshot.mouse_events += 1;
                let distance = self.snapshot.mouse_distance + update.step;
                if distance.is_finite() {
                    self.snapshot.mouse_distance = distance;
                }
                self.snapshot.mouse_velocity = update.velocity;
                if update.hover_loop {
                    self.snapshot.hover_loops += 1;
                    debug!(hover_loops = self.snapshot.hover_loops, "hover loop detected");
                }
                self.last_pointer_ms = Some(now_ms);
                self.mark_activity(now_ms);
            }
            HostEvent::Scroll { offset, max_offset } => {
                self.snapshot.scroll_events += 1;
                if let Some(depth) = scroll_depth(*offset, *max_offset) {
                    self.snapshot.scroll_depth = depth;
                }
                self.mark_activity(now_ms);
            }
            HostEvent::Click { task_relevant } => {
                if *task_relevant {
                    self.snapshot.content_clicks += 1;
                }
                self.clicks.push_back(now_ms);
                self.refresh_rapid_clicks(now_ms);
                self.mark_activity(now_ms);
            }
            HostEvent::Online | HostEvent::Offline => {}
        }
        self.refresh_derived();
    }

    fn tick(&mut self, now_ms: u64) {
        let elapsed = now_ms.saturating_sub(self.last_tick_ms);
        self.last_tick_ms = now_ms;

        if self.snapshot.is_engaged_surface() {
            self.snapshot.dwell_time_ms += elapsed;
        }

        self.snapshot.inactivity_ms = now_ms.saturating_sub(self.last_activity_ms);
        self.snapshot.idle_seconds = self.snapshot.inactivity_ms / 1_000;

        if let Some(last) = self.last_pointer_ms {
            if now_ms.saturating_sub(last) >= VELOCITY_STALE_MS {
                self.snapshot.mouse_velocity = 0.0;
            }
        }

        self.refresh_rapid_clicks(now_ms);
    }

    fn mark_activity(&mut self, now_ms: u64) {
        self.last_activity_ms = now_ms;
        self.snapshot.inactivity_ms = 0;
        self.snapshot.idle_seconds = 0;
    }

    fn refresh_rapid_clicks(&mut self, now_ms: u64) {
        while let Some(&oldest) = self.clicks.front() {
            if now_ms.saturating_sub(oldest) >= RAPID_CLICK_WINDOW_MS {
                self.clicks.pop_front();
            } else {
                break;
            }
        }
        self.snapshot.rapid_click_count = if self.clicks.len() >= RAPID_CLICK_MIN {
            self.clicks.len() as u32
        } else {
            0
        };
    }

    fn refresh_derived(&mut self) {
        let s = &mut self.snapshot;
        s.tab_visible = s.browser_visibility == Visibility::Visible;
        s.panel_focused = s.window_focus && self.panel_focus;
        s.task_tab_active = s.window_focus && s.tab_visible;
    }
}

/// Percent of the scrollable extent. A page that cannot scroll is fully seen.
/// `None` for non-finite input, which leaves the previous depth in place.
fn scroll_depth(offset: f64, max_offset: f64) -> Option<f64> {
    if !offset.is_finite() || !max_offset.is_finite() {
        return None;
    }
    if max_offset <= 0.0 {
        return Some(100.0);
    }
    let depth = offset / max_offset * 100.0;
    depth.is_finite().then(|| depth.clamp(0.0, 100.0))
}
