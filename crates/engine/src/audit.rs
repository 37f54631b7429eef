// SPDX-License-Identifier: MIT

//! Audit logger: a bus tap that persists decision-grade events.
//!
//! Captures policy decisions, process lifecycle transitions, login
//! outcomes, and scheduler fires. Everything else on the bus (agent
//! chatter, SSE traffic) is not audit material. Append-only; queries go
//! through the store's paginated filter.

use aether_core::{
    AuditEntry, AuditId, AuditOutcome, AuditQuery, Clock, Event, EventBus, HandlerError,
    Subscription,
};
use aether_storage::StateStore;

/// Holds the tap subscription; dropping the logger stops capture only
/// if [`AuditLogger::stop`] is called.
pub struct AuditLogger {
    subscription: Option<Subscription>,
}

impl AuditLogger {
    /// Subscribe to the bus and start persisting entries.
    pub fn start<C: Clock + 'static>(store: StateStore, bus: &EventBus, clock: C) -> Self {
        let subscription = bus.tap(move |event| {
            let Some(entry) = entry_for(event, clock.epoch_ms()) else {
                return Ok(());
            };
            store
                .append_audit(entry)
                .map_err(|err| HandlerError::new(format!("audit append failed: {err}")))
        });
        Self { subscription: Some(subscription) }
    }

    /// Detach from the bus.
    pub fn stop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
    }
}

/// Map a bus event to an audit row, or `None` for non-decision-grade
/// subjects.
fn entry_for(event: &Event, ts_ms: u64) -> Option<AuditEntry> {
    let subject = event.subject();
    let captured = matches!(
        subject,
        "policy.decision"
            | "process.spawned"
            | "process.stateChange"
            | "process.exit"
            | "process.queued"
            | "process.dequeued"
            | "process.reaped"
            | "process.priorityChanged"
            | "auth.success"
            | "auth.failure"
            | "auth.mfa.enabled"
            | "auth.mfa.disabled"
            | "user.created"
            | "user.deleted"
            | "org.created"
            | "org.deleted"
            | "org.member.invited"
            | "org.member.removed"
            | "org.member.updated"
            | "permission.granted"
            | "permission.revoked"
            | "cron.fired"
            | "cron.error"
            | "trigger.fired"
            | "trigger.error"
    );
    if !captured {
        return None;
    }

    let (action, policy_subject, resource, outcome) = match event {
        Event::PolicyDecision { action, resource, allowed, user_id, .. } => (
            action.clone(),
            Some(format!("user:{user_id}")),
            Some(resource.clone()),
            if *allowed { AuditOutcome::Allowed } else { AuditOutcome::Denied },
        ),
        Event::AuthFailure { .. } | Event::CronError { .. } | Event::TriggerError { .. } => {
            (subject.to_string(), None, None, AuditOutcome::Error)
        }
        _ => (subject.to_string(), None, None, AuditOutcome::Ok),
    };

    Some(AuditEntry {
        id: AuditId::new(),
        ts_ms,
        pid: event.pid(),
        uid: event.pid().map(aether_core::Process::uid_for),
        action,
        event_type: subject.to_string(),
        subject: policy_subject,
        resource,
        outcome,
        detail: event.to_frame(),
    })
}

/// Paginated audit query (pass-through to the store).
pub fn query(store: &StateStore, query: &AuditQuery) -> (Vec<AuditEntry>, usize) {
    store.query_audit(query)
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
