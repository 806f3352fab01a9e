use super::packet::Tenths;

/// Active/idle/away split of one window. `total()` always equals the
/// window it was normalized against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPartition {
    pub active: Tenths,
    pub idle: Tenths,
    pub away: Tenths,
}

impl WindowPartition {
    pub fn total(&self) -> Tenths {
        self.active + self.idle + self.away
    }

    /// active / window, in [0, 1].
    pub fn active_ratio(&self) -> f64 {
        let total = self.total().tenths();
        if total == 0 {
            return 0.0;
        }
        f64::from(self.active.tenths()) / f64::from(total)
    }
}

/// Convert millisecond buckets into tenths of a second summing exactly to
/// `window_ms`.
///
/// 1. A raw sum that drifted from the nominal window is scaled proportionally.
/// 2. A zero sum is all active.
/// 3. Each bucket is rounded to a tenth.
/// 4. Any rounding residual goes to the largest bucket
///    (ties: active, then idle, then away).
pub fn normalize(active_ms: u64, idle_ms: u64, away_ms: u64, window_ms: u64) -> WindowPartition {
    let window = Tenths::from_ms(window_ms).tenths() as i64;
    let raw_sum = active_ms + idle_ms + away_ms;

    if raw_sum == 0 {
        return WindowPartition {
            active: Tenths(window as u32),
            idle: Tenths(0),
            away: Tenths(0),
        };
    }

    let to_tenths = |ms: u64| -> i64 {
        let scaled_ms = if raw_sum == window_ms {
            ms as f64
        } else {
            ms as f64 * window_ms as f64 / raw_sum as f64
        };
        (scaled_ms / 100.0).round() as i64
    };

    // [active, idle, away]; index order is the tie-break order.
    let mut buckets = [to_tenths(active_ms), to_tenths(idle_ms), to_tenths(away_ms)];

    let residual = window - buckets.iter().sum::<i64>();
    if residual != 0 {
        let mut largest = 0;
        for idx in 1..buckets.len() {
            if buckets[idx] > buckets[largest] {
                largest = idx;
            }
        }
        buckets[largest] = (buckets[largest] + residual).max(0);
    }

    WindowPartition {
        active: Tenths(buckets[0] as u32),
        idle: Tenths(buckets[1] as u32),
        away: Tenths(buckets[2] as u32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nominal_window_passes_through() {
        let p = normalize(3_000, 1_500, 500, 5_000);
        assert_eq!((p.active, p.idle, p.away), (Tenths(30), Tenths(15), Tenths(5)));
    }

    #[test]
    fn zero_accumulation_is_all_active() {
        let p = normalize(0, 0, 0, 5_000);
        assert_eq!((p.active, p.idle, p.away), (Tenths(50), Tenths(0), Tenths(0)));
    }

    #[test]
    fn thirds_put_the_residual_on_active() {
        // 1.666.. each rounds to 1.7, leaving -0.1 for the first largest.
        let p = normalize(1_000, 1_000, 1_000, 5_000);
        assert_eq!(p.total(), Tenths(50));
        assert_eq!((p.active, p.idle, p.away), (Tenths(16), Tenths(17), Tenths(17)));
    }

    #[test]
    fn drift_is_scaled_back_to_the_window() {
        let p = normalize(4_400, 0, 1_100, 5_000);
        assert_eq!(p.total(), Tenths(50));
        assert_eq!((p.active, p.away), (Tenths(40), Tenths(10)));
    }

    #[test]
    fn exact_sum_holds_across_a_grid_of_drifted_inputs() {
        for active in (0..7_000).step_by(337) {
            for idle in (0..3_000).step_by(419) {
                for away in (0..2_000).step_by(283) {
                    let p = normalize(active, idle, away, 5_000);
                    assert_eq!(p.total(), Tenths(50), "{active}/{idle}/{away}");
                }
            }
        }
    }
}
