use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::capability::Capability;
use crate::negotiation::{IgnoreReason, OutcomePath, RequestCode};

/// Events emitted while negotiating permissions
///
/// These events allow observers to follow classification, host requests,
/// prompts and outcome delivery as they happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationEvent {
    /// Requested set classified against live host state
    Classified {
        /// Code assigned to this negotiation
        request_code: RequestCode,
        /// Number of capabilities already granted
        granted: usize,
        /// Capabilities that can be requested without explanation
        fresh: Vec<Capability>,
        /// Capabilities that need a rationale first
        rationale: Vec<Capability>,
    },

    /// Host asked to show its permission dialog
    PermissionsRequested {
        request_code: RequestCode,
        /// Exactly the subset sent to the host
        capabilities: Vec<Capability>,
        /// True when the request follows an accepted rationale prompt
        after_rationale: bool,
    },

    /// Rationale prompt shown to the user
    RationalePrompted {
        request_code: RequestCode,
        capabilities: Vec<Capability>,
    },

    /// User declined the rationale prompt
    RationaleDeclined { request_code: RequestCode },

    /// Callback invoked (fires exactly once per finished negotiation)
    OutcomeDelivered {
        request_code: RequestCode,
        /// Path that produced the outcome
        path: OutcomePath,
        /// Entries reported denied in the result vector
        denied: usize,
    },

    /// Host result dropped without a state change
    ResultIgnored {
        /// Code of the negotiation that received the result
        request_code: RequestCode,
        /// Code the result carried
        received: RequestCode,
        reason: IgnoreReason,
    },
}

impl NegotiationEvent {
    /// Code of the negotiation this event belongs to.
    pub fn request_code(&self) -> RequestCode {
        match self {
            NegotiationEvent::Classified { request_code, .. }
            | NegotiationEvent::PermissionsRequested { request_code, .. }
            | NegotiationEvent::RationalePrompted { request_code, .. }
            | NegotiationEvent::RationaleDeclined { request_code }
            | NegotiationEvent::OutcomeDelivered { request_code, .. }
            | NegotiationEvent::ResultIgnored { request_code, .. } => *request_code,
        }
    }
}

/// Hook for observing negotiation events
///
/// Implement this trait to receive notifications about negotiations.
///
/// # Example
/// ```
/// use permit_core::events::{NegotiationEvent, NegotiationHook};
///
/// struct Logger;
///
/// impl NegotiationHook for Logger {
///     fn on_event(&self, event: &NegotiationEvent) {
///         match event {
///             NegotiationEvent::PermissionsRequested { capabilities, .. } => {
///                 println!("Requesting: {:?}", capabilities);
///             }
///             NegotiationEvent::OutcomeDelivered { path, .. } => {
///                 println!("Finished via {:?}", path);
///             }
///             _ => {}
///         }
///     }
/// }
/// ```
pub trait NegotiationHook: Send + Sync {
    /// Called when an event occurs
    fn on_event(&self, event: &NegotiationEvent);
}

/// Blanket implementation for closures
impl<F> NegotiationHook for F
where
    F: Fn(&NegotiationEvent) + Send + Sync,
{
    fn on_event(&self, event: &NegotiationEvent) {
        self(event)
    }
}

/// Unique identifier for a registered hook.
///
/// Used to remove hooks via [`crate::Negotiator::remove_hook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(pub(crate) u64);

/// Hooks shared between a negotiator and the negotiations it starts.
#[derive(Clone, Default)]
pub(crate) struct HookRegistry {
    hooks: Arc<RwLock<Vec<(HookId, Arc<dyn NegotiationHook>)>>>,
    next_id: Arc<AtomicU64>,
}

impl HookRegistry {
    pub(crate) fn add(&self, hook: impl NegotiationHook + 'static) -> HookId {
        let id = HookId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.hooks.write().push((id, Arc::new(hook)));
        id
    }

    pub(crate) fn remove(&self, id: HookId) -> bool {
        let mut hooks = self.hooks.write();
        let before = hooks.len();
        hooks.retain(|(hook_id, _)| *hook_id != id);
        hooks.len() < before
    }

    pub(crate) fn emit(&self, event: NegotiationEvent) {
        // Snapshot so a hook can register or remove hooks without deadlocking
        let hooks: Vec<_> = self.hooks.read().iter().map(|(_, h)| Arc::clone(h)).collect();
        for hook in hooks {
            hook.on_event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_registry_emits_to_all_hooks() {
        let registry = HookRegistry::default();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for _ in 0..2 {
            let seen = Arc::clone(&seen);
            registry.add(move |event: &NegotiationEvent| {
                seen.lock().push(event.request_code());
            });
        }

        registry.emit(NegotiationEvent::RationaleDeclined {
            request_code: RequestCode(9),
        });
        assert_eq!(*seen.lock(), vec![RequestCode(9), RequestCode(9)]);
    }

    #[test]
    fn test_registry_remove() {
        let registry = HookRegistry::default();
        let count = Arc::new(AtomicU64::new(0));

        let counter = Arc::clone(&count);
        let id = registry.add(move |_: &NegotiationEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(registry.remove(id));
        assert!(!registry.remove(id));

        registry.emit(NegotiationEvent::RationaleDeclined {
            request_code: RequestCode::DEFAULT,
        });
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_clones_share_hooks() {
        let registry = HookRegistry::default();
        let clone = registry.clone();
        let count = Arc::new(AtomicU64::new(0));

        let counter = Arc::clone(&count);
        registry.add(move |_: &NegotiationEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        clone.emit(NegotiationEvent::RationaleDeclined {
            request_code: RequestCode::DEFAULT,
        });
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
