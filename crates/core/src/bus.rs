// SPDX-License-Identifier: MIT

//! In-process publish/subscribe bus keyed by dotted subject strings.
//!
//! Delivery is synchronous: every handler registered for the subject runs
//! before `emit` returns, in registration order. Handler failures are
//! logged and isolated; they never abort the emit or starve later
//! handlers. The bus itself matches subjects exactly; prefix wildcards are
//! a consumer concern (see the SSE fan-out), served by [`EventBus::tap`].

use crate::event::Event;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Error returned by a subscriber. Logged, never propagated.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

type Handler = Arc<dyn Fn(&Event) -> Result<(), HandlerError> + Send + Sync>;

struct Registration {
    id: u64,
    active: Arc<AtomicBool>,
    handler: Handler,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    by_subject: HashMap<String, Vec<Registration>>,
    taps: Vec<Registration>,
}

/// Synchronous in-process event bus. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<BusInner>>,
}

/// Cancellation handle returned by [`EventBus::subscribe`] and
/// [`EventBus::tap`]. Dropping it without calling [`Subscription::cancel`]
/// leaves the subscription registered for the life of the bus.
pub struct Subscription {
    bus: EventBus,
    subject: Option<String>,
    id: u64,
    active: Arc<AtomicBool>,
}

impl Subscription {
    /// Remove the handler. A handler mid-flight in a concurrent emit is
    /// marked inactive and skipped; it is never invoked after cancel
    /// returns on this thread.
    pub fn cancel(self) {
        self.active.store(false, Ordering::SeqCst);
        let mut inner = self.bus.inner.lock();
        match &self.subject {
            Some(subject) => {
                if let Some(regs) = inner.by_subject.get_mut(subject) {
                    regs.retain(|r| r.id != self.id);
                    if regs.is_empty() {
                        inner.by_subject.remove(subject);
                    }
                }
            }
            None => inner.taps.retain(|r| r.id != self.id),
        }
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an exact subject.
    #[must_use = "dropping the subscription handle makes it uncancellable"]
    pub fn subscribe<F>(&self, subject: impl Into<String>, handler: F) -> Subscription
    where
        F: Fn(&Event) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let subject = subject.into();
        let active = Arc::new(AtomicBool::new(true));
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.by_subject.entry(subject.clone()).or_default().push(Registration {
            id,
            active: Arc::clone(&active),
            handler: Arc::new(handler),
        });
        Subscription { bus: self.clone(), subject: Some(subject), id, active }
    }

    /// Register a handler that observes every emission regardless of
    /// subject. Consumers that need prefix or wildcard semantics build
    /// them on top of this.
    #[must_use = "dropping the subscription handle makes it uncancellable"]
    pub fn tap<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Event) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let active = Arc::new(AtomicBool::new(true));
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.taps.push(Registration {
            id,
            active: Arc::clone(&active),
            handler: Arc::new(handler),
        });
        Subscription { bus: self.clone(), subject: None, id, active }
    }

    /// Publish an event. Every exact-subject handler runs first, then
    /// every tap, all before this call returns.
    ///
    /// The registration lock is released before any handler runs, so
    /// handlers may subscribe, unsubscribe, or emit recursively. The
    /// handler snapshot is taken at emit start: a handler registered
    /// during delivery sees only later emissions, and one cancelled
    /// during delivery is skipped via its active flag.
    pub fn emit(&self, event: &Event) {
        let subject = event.subject().to_string();
        let snapshot: Vec<(Arc<AtomicBool>, Handler)> = {
            let inner = self.inner.lock();
            let subject_regs = inner
                .by_subject
                .get(&subject)
                .into_iter()
                .flatten()
                .map(|r| (Arc::clone(&r.active), Arc::clone(&r.handler)));
            let tap_regs =
                inner.taps.iter().map(|r| (Arc::clone(&r.active), Arc::clone(&r.handler)));
            subject_regs.chain(tap_regs).collect()
        };

        for (active, handler) in snapshot {
            if !active.load(Ordering::SeqCst) {
                continue;
            }
            if let Err(err) = handler(event) {
                warn!(subject = %subject, error = %err, "event handler failed");
            }
        }
    }

    /// Publish an unmodeled subject with an opaque payload.
    pub fn emit_custom(&self, subject: impl Into<String>, payload: serde_json::Value) {
        self.emit(&Event::Custom { subject: subject.into(), payload });
    }

    /// Number of live subscriptions (exact + tap). Test and introspection
    /// helper.
    pub fn subscription_count(&self) -> usize {
        let inner = self.inner.lock();
        inner.by_subject.values().map(Vec::len).sum::<usize>() + inner.taps.len()
    }
}

/// Consumer-side subject matching: an exact subject, or a `prefix.*`
/// pattern matching any subject under the prefix (at least one extra
/// segment). The bus itself never interprets patterns; tap-based
/// consumers (triggers, SSE fan-out) share this helper.
pub fn subject_matches(pattern: &str, subject: &str) -> bool {
    match pattern.strip_suffix(".*") {
        Some(prefix) => subject
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.len() > 1 && rest.starts_with('.')),
        None => pattern == subject,
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
