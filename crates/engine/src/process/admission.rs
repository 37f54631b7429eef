// SPDX-License-Identifier: MIT

//! Priority admission queue: the waiting room for spawns blocked by the
//! concurrency cap.
//!
//! Ordered by ascending numeric priority (1 is most urgent); ties keep
//! FIFO insertion order. Bounded; overflow fails the enqueue.

use aether_core::{KernelError, Pid, ProcessConfig};
use serde::Serialize;

/// One queued spawn request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdmissionRequest {
    pub config: ProcessConfig,
    pub ppid: Pid,
    pub owner_uid: String,
    pub priority: u8,
    pub queued_at_ms: u64,
    #[serde(skip)]
    seq: u64,
}

#[derive(Debug)]
pub(crate) struct AdmissionQueue {
    items: Vec<AdmissionRequest>,
    next_seq: u64,
    limit: usize,
}

impl AdmissionQueue {
    pub fn new(limit: usize) -> Self {
        Self { items: Vec::new(), next_seq: 0, limit }
    }

    /// Insert keeping `(priority, seq)` order. Returns the queue
    /// position (0 = next to dequeue).
    pub fn push(
        &mut self,
        config: ProcessConfig,
        ppid: Pid,
        owner_uid: String,
        priority: u8,
        queued_at_ms: u64,
    ) -> Result<usize, KernelError> {
        if self.items.len() >= self.limit {
            return Err(KernelError::invalid_state(format!(
                "admission queue full ({} entries)",
                self.limit
            )));
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        let request =
            AdmissionRequest { config, ppid, owner_uid, priority, queued_at_ms, seq };
        // First slot whose priority is strictly greater: equal
        // priorities stay FIFO.
        let position =
            self.items.iter().position(|r| r.priority > priority).unwrap_or(self.items.len());
        self.items.insert(position, request);
        Ok(position)
    }

    /// Remove the minimum-priority (FIFO among ties) request.
    pub fn pop_next(&mut self) -> Option<AdmissionRequest> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.items.remove(0))
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Current contents in dequeue order.
    pub fn snapshot(&self) -> Vec<AdmissionRequest> {
        self.items.clone()
    }
}

#[cfg(test)]
#[path = "admission_tests.rs"]
mod tests;
