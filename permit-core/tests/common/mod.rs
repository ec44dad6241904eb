//! Common test utilities shared across test files.
//!
//! Items here may not be used by all test files, hence the module-level allow.
#![allow(dead_code)]

use parking_lot::Mutex;
use permit_core::test_utils::{FakeHost, FixedProbe, ScriptedPrompter};
use permit_core::{NegotiationEvent, NegotiationHook, Negotiator};
use std::sync::Arc;

/// A hook that collects every event it sees.
#[derive(Clone, Default)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<NegotiationEvent>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NegotiationEvent> {
        self.events.lock().clone()
    }

    /// Number of `OutcomeDelivered` events seen.
    pub fn deliveries(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, NegotiationEvent::OutcomeDelivered { .. }))
            .count()
    }
}

impl NegotiationHook for EventCollector {
    fn on_event(&self, event: &NegotiationEvent) {
        self.events.lock().push(event.clone());
    }
}

/// A negotiator over clones of the given fakes, on a runtime-grant host.
pub fn negotiator(host: &FakeHost, prompter: &ScriptedPrompter) -> Negotiator {
    Negotiator::new(host.clone(), FixedProbe::runtime(), prompter.clone())
}
