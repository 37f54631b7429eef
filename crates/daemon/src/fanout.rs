// SPDX-License-Identifier: MIT

//! SSE fan-out: multiplexes bus emissions to per-client streams.
//!
//! Each subscriber brings a comma-separated filter list; a filter
//! ending in `.*` matches any subject under the prefix. Delivery is
//! best-effort: a subscriber whose channel is full simply misses that
//! frame. The `connected` heartbeat is always the first frame.

use aether_core::{subject_matches, EventBus, Subscription};
use aether_wire::sse;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Frames buffered per subscriber before drops begin.
const CHANNEL_CAPACITY: usize = 64;

struct SubEntry {
    filters: Vec<String>,
    tx: mpsc::Sender<Vec<u8>>,
}

#[derive(Default)]
struct FanoutInner {
    next_id: u64,
    subscribers: HashMap<u64, SubEntry>,
}

/// The fan-out hub. Clone-cheap; clones share the subscriber table.
#[derive(Clone)]
pub struct SseFanout {
    inner: Arc<Mutex<FanoutInner>>,
    _tap: Arc<Subscription>,
}

impl SseFanout {
    /// Attach to the bus and start forwarding.
    pub fn start(bus: &EventBus) -> Self {
        let inner: Arc<Mutex<FanoutInner>> = Arc::default();
        let tap_inner = Arc::clone(&inner);
        let tap = bus.tap(move |event| {
            let frame = sse::frame(&event.to_frame());
            let subject = event.subject();
            let mut gone = Vec::new();
            {
                let registry = tap_inner.lock();
                for (id, entry) in &registry.subscribers {
                    if !matches_any(&entry.filters, subject) {
                        continue;
                    }
                    match entry.tx.try_send(frame.clone()) {
                        Ok(()) => {}
                        Err(mpsc::error::TrySendError::Full(_)) => {
                            // Slow consumer: drop the frame.
                            debug!(subscriber = id, subject, "dropping frame for slow consumer");
                        }
                        Err(mpsc::error::TrySendError::Closed(_)) => gone.push(*id),
                    }
                }
            }
            if !gone.is_empty() {
                let mut registry = tap_inner.lock();
                for id in gone {
                    registry.subscribers.remove(&id);
                }
            }
            Ok(())
        });
        Self { inner, _tap: Arc::new(tap) }
    }

    /// Register a stream. The receiver's first frame is the
    /// `connected` heartbeat.
    pub fn subscribe(&self, filters: &str) -> (u64, mpsc::Receiver<Vec<u8>>) {
        let filters: Vec<String> = filters
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(String::from)
            .collect();
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        // Capacity is ≥ 1, so the heartbeat always fits.
        let _ = tx.try_send(sse::connected_frame());

        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.subscribers.insert(id, SubEntry { filters, tx });
        (id, rx)
    }

    /// Release a subscriber's registration.
    pub fn unsubscribe(&self, id: u64) {
        let mut inner = self.inner.lock();
        inner.subscribers.remove(&id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }
}

/// An empty filter list matches everything.
fn matches_any(filters: &[String], subject: &str) -> bool {
    filters.is_empty() || filters.iter().any(|f| subject_matches(f, subject))
}

#[cfg(test)]
#[path = "fanout_tests.rs"]
mod tests;
