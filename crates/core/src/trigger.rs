use std::num::NonZeroU32;

use tracing::debug;

use crate::{segmenter::bucket_key, store::ExplanationStore};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TriggerState {
    #[default]
    Idle,
    /// One generation is in flight for this bucket key.
    Generating(String),
}

/// Decides, tick by tick, whether the current bucket needs an explanation.
///
/// At most one generation is in flight. A tick that arrives while busy is
/// dropped, not queued; the next tick past completion picks the bucket up.
#[derive(Debug, Clone)]
pub struct IntervalTrigger {
    interval: NonZeroU32,
    state: TriggerState,
}

impl IntervalTrigger {
    pub fn new(interval: NonZeroU32) -> Self {
        Self {
            interval,
            state: TriggerState::Idle,
        }
    }

    pub fn interval(&self) -> NonZeroU32 {
        self.interval
    }

    pub fn state(&self) -> &TriggerState {
        &self.state
    }

    pub fn in_flight(&self) -> Option<&str> {
        match &self.state {
            TriggerState::Idle => None,
            TriggerState::Generating(key) => Some(key),
        }
    }

    /// Returns the bucket key to generate, moving to `Generating`, or `None`.
    pub fn on_tick(&mut self, current_time: f64, store: &ExplanationStore) -> Option<String> {
        if current_time.is_nan() || current_time <= 0.0 {
            return None;
        }

        let key = bucket_key(current_time, self.interval);
        if store.contains(&key) {
            return None;
        }

        match &self.state {
            TriggerState::Generating(busy) => {
                debug!(requested = %key, in_flight = %busy, "generation busy, dropping tick");
                None
            }
            TriggerState::Idle => {
                self.state = TriggerState::Generating(key.clone());
                Some(key)
            }
        }
    }

    /// Back to `Idle` once the in-flight generation has been stored.
    /// Returns false if `key` was not the one in flight.
    pub fn complete(&mut self, key: &str) -> bool {
        if self.in_flight() == Some(key) {
            self.state = TriggerState::Idle;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        generator::{FallbackCause, fallback_explanation},
        segmenter::DEFAULT_INTERVAL_SECONDS,
    };

    fn trigger() -> IntervalTrigger {
        IntervalTrigger::new(DEFAULT_INTERVAL_SECONDS)
    }

    #[test]
    fn time_zero_never_triggers() {
        let mut trigger = trigger();
        let store = ExplanationStore::new();
        assert_eq!(trigger.on_tick(0.0, &store), None);
        assert_eq!(trigger.state(), &TriggerState::Idle);
    }

    #[test]
    fn existing_key_does_not_trigger() {
        let mut trigger = trigger();
        let mut store = ExplanationStore::new();
        store.insert(fallback_explanation("0:15", "", FallbackCause::Disabled));

        assert_eq!(trigger.on_tick(20.0, &store), None);
        assert_eq!(trigger.state(), &TriggerState::Idle);
    }

    #[test]
    fn busy_trigger_drops_ticks() {
        let mut trigger = trigger();
        let mut store = ExplanationStore::new();

        assert_eq!(trigger.on_tick(16.0, &store).as_deref(), Some("0:15"));
        assert_eq!(trigger.state(), &TriggerState::Generating("0:15".to_string()));

        // Still generating 0:15 when playback reaches the next bucket.
        assert_eq!(trigger.on_tick(31.0, &store), None);
        assert_eq!(trigger.in_flight(), Some("0:15"));

        store.insert(fallback_explanation("0:15", "", FallbackCause::Disabled));
        assert!(trigger.complete("0:15"));
        assert_eq!(trigger.state(), &TriggerState::Idle);

        // The dropped bucket is picked up on the next tick.
        assert_eq!(trigger.on_tick(32.0, &store).as_deref(), Some("0:30"));
    }

    #[test]
    fn completing_wrong_key_keeps_state() {
        let mut trigger = trigger();
        let store = ExplanationStore::new();
        trigger.on_tick(45.0, &store);

        assert!(!trigger.complete("0:15"));
        assert_eq!(trigger.in_flight(), Some("0:45"));
    }

    #[test]
    fn custom_interval_keys() {
        let mut trigger = IntervalTrigger::new(NonZeroU32::new(30).unwrap());
        let store = ExplanationStore::new();
        assert_eq!(trigger.on_tick(59.9, &store).as_deref(), Some("0:30"));
    }

    #[test]
    fn nan_time_is_ignored() {
        let mut trigger = trigger();
        let store = ExplanationStore::new();
        assert_eq!(trigger.on_tick(f64::NAN, &store), None);
    }
}
