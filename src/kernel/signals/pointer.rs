use std::collections::VecDeque;

/// Points kept for the velocity estimate.
pub const VELOCITY_WINDOW: usize = 10;
/// Points kept for hover-loop detection.
pub const HOVER_BUFFER: usize = 20;
/// Most recent points whose bounding box is tested for confinement.
pub const HOVER_SAMPLE: usize = 10;
/// Bounding box edge (px) under which motion counts as confined.
pub const HOVER_THRESHOLD_PX: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Sample {
    x: f64,
    y: f64,
    at_ms: u64,
}

/// Outcome of one pointer move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerUpdate {
    /// Distance from the previous position, px.
    pub step: f64,
    /// Speed over the trailing velocity window, px/s.
    pub velocity: f64,
    pub hover_loop: bool,
}

/// Rolling pointer history: velocity over the last few points and
/// confined-motion (hover loop) detection over a longer buffer.
#[derive(Debug, Clone, Default)]
pub struct PointerTracker {
    recent: VecDeque<Sample>,
    hover: VecDeque<Sample>,
    last_velocity: f64,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, x: f64, y: f64, at_ms: u64) -> PointerUpdate {
        let sample = Sample { x, y, at_ms };

        // Overflowing steps (extreme coordinates) count as no travel.
        let step = self
            .recent
            .back()
            .map(|prev| distance(prev, &sample))
            .filter(|d| d.is_finite())
            .unwrap_or(0.0);

        self.recent.push_back(sample);
        while self.recent.len() > VELOCITY_WINDOW {
            self.recent.pop_front();
        }

        // Zero time span (same-ms bursts) keeps the previous estimate.
        if let (Some(first), Some(last)) = (self.recent.front(), self.recent.back()) {
            let span_ms = last.at_ms.saturating_sub(first.at_ms);
            if span_ms > 0 {
                let travelled: f64 = self
                    .recent
                    .iter()
                    .zip(self.recent.iter().skip(1))
                    .map(|(a, b)| distance(a, b))
                    .sum();
                let velocity = travelled * 1000.0 / span_ms as f64;
                if velocity.is_finite() {
                    self.last_velocity = velocity;
                }
            }
        }

        self.hover.push_back(sample);
        while self.hover.len() > HOVER_BUFFER {
            self.hover.pop_front();
        }
        let hover_loop = self.is_confined();
        if hover_loop {
            // One episode per confined run of samples.
            self.hover.clear();
        }

        PointerUpdate {
            step,
            velocity: self.last_velocity,
            hover_loop,
        }
    }

    pub fn velocity(&self) -> f64 {
        self.last_velocity
    }

    fn is_confined(&self) -> bool {
        if self.hover.len() < HOVER_SAMPLE {
            return false;
        }
        let tail = self.hover.iter().skip(self.hover.len() - HOVER_SAMPLE);
        let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
        for s in tail {
            min_x = min_x.min(s.x);
            max_x = max_x.max(s.x);
            min_y = min_y.min(s.y);
            max_y = max_y.max(s.y);
        }
        (max_x - min_x) < HOVER_THRESHOLD_PX && (max_y - min_y) < HOVER_THRESHOLD_PX
    }
}

fn distance(a: &Sample, b: &Sample) -> f64 {
    ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn velocity_is_distance_over_window_span() {
        let mut tracker = PointerTracker::new();
        tracker.record(0.0, 0.0, 0);
        let update = tracker.record(300.0, 400.0, 100);
        assert_eq!(update.step, 500.0);
        assert_eq!(update.velocity, 5_000.0);
    }

    #[test]
    fn confined_motion_counts_one_loop_per_run() {
        let mut tracker = PointerTracker::new();
        let mut loops = 0;
        for i in 0..HOVER_SAMPLE as u64 {
            let offset = (i % 3) as f64 * 5.0;
            if tracker.record(100.0 + offset, 100.0 + offset, i * 50).hover_loop {
                loops += 1;
            }
        }
        assert_eq!(loops, 1);
    }

    #[test]
    fn extreme_coordinates_keep_values_finite() {
        let mut tracker = PointerTracker::new();
        tracker.record(0.0, 0.0, 0);
        tracker.record(10.0, 0.0, 100);
        let update = tracker.record(f64::MAX, f64::MAX, 200);
        assert_eq!(update.step, 0.0);
        assert_eq!(update.velocity, 100.0);
    }

    #[test]
    fn sweeping_motion_is_not_a_loop() {
        let mut tracker = PointerTracker::new();
        for i in 0..HOVER_BUFFER as u64 {
            assert!(!tracker.record(i as f64 * 40.0, 0.0, i * 16).hover_loop);
        }
    }
}
