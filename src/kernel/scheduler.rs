use serde::{Deserialize, Serialize};

/// The fixed-rate tickers that drive the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TickerKind {
    /// Signal Source inactivity/dwell recompute (1 Hz).
    Signals,
    /// State Classifier evaluation (1 Hz).
    Classifier,
    /// Packet Builder time accounting (100ms).
    Accounting,
    /// Packet Builder window emission (5s).
    Emission,
}

#[derive(Debug, Clone)]
struct Ticker {
    kind: TickerKind,
    period_ms: u64,
    next_due_ms: u64,
}

/// A tick that fell due, and the instant it fires at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueTick {
    pub kind: TickerKind,
    pub at_ms: u64,
}

/// Explicit, clock-agnostic scheduler. The driver asks what is due at `now`
/// and fires those ticks; nothing here sleeps or spawns.
///
/// Ticks come out in chronological order, registration order breaking ties.
/// A ticker that fell more than one period behind fires once at `now` and
/// is rescheduled from there (missed periods are skipped, not replayed).
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    tickers: Vec<Ticker>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: TickerKind, period_ms: u64, start_ms: u64) {
        let period_ms = period_ms.max(1);
        self.tickers.push(Ticker {
            kind,
            period_ms,
            next_due_ms: start_ms + period_ms,
        });
    }

    pub fn due(&mut self, now_ms: u64) -> Vec<DueTick> {
        let mut fired = Vec::new();

        loop {
            // Earliest due ticker; ties go to the first registered.
            let next = self
                .tickers
                .iter()
                .enumerate()
                .filter(|(_, t)| t.next_due_ms <= now_ms)
                .min_by_key(|(idx, t)| (t.next_due_ms, *idx))
                .map(|(idx, _)| idx);

            let Some(idx) = next else { break };
            let ticker = &mut self.tickers[idx];

            let behind = now_ms - ticker.next_due_ms;
            if behind >= ticker.period_ms {
                fired.push(DueTick { kind: ticker.kind, at_ms: now_ms });
                ticker.next_due_ms = now_ms + ticker.period_ms;
            } else {
                fired.push(DueTick { kind: ticker.kind, at_ms: ticker.next_due_ms });
                ticker.next_due_ms += ticker.period_ms;
            }
        }

        // Catch-up fires at `now` can land after later regular fires.
        fired.sort_by_key(|tick| tick.at_ms);
        fired
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.tickers.iter().map(|t| t.next_due_ms).min()
    }

    pub fn clear(&mut self) {
        self.tickers.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}
