use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::log::{TransitionLog, TransitionSummary};
use super::rules::{self, RuleOutcome};
use super::state::{CognitiveState, SignalExtract, TransitionRecord};
use crate::config::{ClassifierConfig, PranaConfig};
use crate::kernel::signals::SignalSnapshot;

/// Seven-state classifier with hysteresis.
///
/// Rules are re-run on every evaluation; a differing outcome is only applied
/// once the cooldown since the last transition has elapsed. DEEP_FOCUS also
/// needs its qualifying condition to hold without a break for the sustain
/// period, tracked by `deep_focus_since`.
#[derive(Debug)]
pub struct StateClassifier {
    config: ClassifierConfig,
    enabled: bool,
    state: CognitiveState,
    entered_at_ms: u64,
    last_transition_ms: u64,
    deep_focus_since: Option<u64>,
    log: TransitionLog,
}

impl StateClassifier {
    pub fn new(config: &PranaConfig, now_ms: u64) -> Self {
        if config.disabled {
            info!("state classifier disabled by kill switch");
        }
        Self {
            config: config.classifier.clone(),
            enabled: !config.disabled,
            state: CognitiveState::OnTask,
            entered_at_ms: now_ms,
            last_transition_ms: now_ms,
            deep_focus_since: None,
            log: TransitionLog::new(),
        }
    }

    pub fn current_state(&self) -> CognitiveState {
        self.state
    }

    pub fn state_duration_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.entered_at_ms)
    }

    pub fn transition_log(&self) -> Vec<TransitionRecord> {
        self.log.records()
    }

    pub fn summary(&self) -> TransitionSummary {
        self.log.summary()
    }

    /// Rule outcome for `snapshot` at `now_ms`, without applying it.
    /// Advances the deep-focus candidate timer.
    fn classify(&mut self, snapshot: &SignalSnapshot, now_ms: u64) -> RuleOutcome {
        if rules::deep_focus_qualifies(snapshot, &self.config) {
            self.deep_focus_since.get_or_insert(now_ms);
        } else {
            self.deep_focus_since = None;
        }

        let sustained = self
            .deep_focus_since
            .map(|since| now_ms.saturating_sub(since) >= self.config.deep_focus_sustain_ms)
            .unwrap_or(false);

        rules::evaluate(snapshot, &self.config, sustained)
    }

    /// One evaluation tick. Returns the applied transition, if any.
    pub fn evaluate(
        &mut self,
        snapshot: &SignalSnapshot,
        now_ms: u64,
        wall: DateTime<Utc>,
    ) -> Option<TransitionRecord> {
        if !self.enabled {
            return None;
        }

        let outcome = self.classify(snapshot, now_ms);
        if outcome.state == self.state {
            return None;
        }

        let since_last = now_ms.saturating_sub(self.last_transition_ms);
        if since_last < self.config.cooldown_ms {
            debug!(
                current = %self.state,
                proposed = %outcome.state,
                since_last_ms = since_last,
                "transition suppressed by cooldown"
            );
            return None;
        }

        let record = TransitionRecord {
            timestamp: wall,
            at_ms: now_ms,
            from: self.state,
            to: outcome.state,
            reason: outcome.reason.to_string(),
            previous_duration_ms: self.state_duration_ms(now_ms),
            signals: SignalExtract::from(snapshot),
        };

        info!(
            from = %record.from,
            to = %record.to,
            reason = outcome.reason,
            previous_duration_ms = record.previous_duration_ms,
            "cognitive state transition"
        );

        self.state = outcome.state;
        self.entered_at_ms = now_ms;
        self.last_transition_ms = now_ms;
        self.log.record(record.clone());
        Some(record)
    }
}
