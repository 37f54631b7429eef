// SPDX-License-Identifier: MIT

//! The process table: PID allocation, lifecycle, signals, mailboxes,
//! and the priority admission queue.
//!
//! All mutation happens under one lock; bus emission happens after the
//! lock is released so handlers may call back into the table.

mod admission;

pub use admission::AdmissionRequest;
use admission::AdmissionQueue;

use aether_core::{
    clamp_priority, Clock, Event, EventBus, KernelError, MailboxMessage, Pid, Process,
    ProcessConfig, ProcessState, Signal, SystemClock, DEFAULT_PRIORITY, PRIORITY_MAX,
    PRIORITY_MIN,
};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// Hard cap on non-dead processes. Exceeding it is fatal to the spawn.
pub const MAX_PROCESSES: usize = 64;

/// Table configuration.
#[derive(Debug, Clone)]
pub struct TableLimits {
    /// Spawns beyond this many active (created/running/sleeping)
    /// processes go to the admission queue.
    pub max_concurrent: usize,
    /// Bound on the admission queue itself.
    pub queue_limit: usize,
}

impl Default for TableLimits {
    fn default() -> Self {
        Self { max_concurrent: MAX_PROCESSES, queue_limit: 256 }
    }
}

/// Result of a spawn request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum SpawnOutcome {
    /// A process was allocated.
    Spawned { process: Process },
    /// The table is at `max_concurrent`; the request waits in the
    /// admission queue.
    Queued { position: usize, priority: u8 },
}

/// Per-state process counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StateCounts {
    pub created: usize,
    pub running: usize,
    pub sleeping: usize,
    pub stopped: usize,
    pub paused: usize,
    pub zombie: usize,
    pub dead: usize,
}

struct ProcEntry {
    process: Process,
    mailbox: Vec<MailboxMessage>,
    next_msg_id: u64,
    last_msg_ts: u64,
}

struct TableInner {
    next_pid: Pid,
    entries: IndexMap<Pid, ProcEntry>,
    queue: AdmissionQueue,
}

impl TableInner {
    fn live_count(&self) -> usize {
        self.entries.values().filter(|e| e.process.state.is_live()).count()
    }

    fn active_count(&self) -> usize {
        self.entries.values().filter(|e| e.process.state.is_active()).count()
    }

    /// Allocate the next PID and insert the process. PIDs are strictly
    /// increasing and never reused within a run.
    fn allocate<C: Clock>(
        &mut self,
        clock: &C,
        config: ProcessConfig,
        ppid: Pid,
        owner_uid: &str,
    ) -> Process {
        let pid = self.next_pid;
        self.next_pid += 1;

        let uid = Process::uid_for(pid);
        let cwd = config.cwd.clone().unwrap_or_else(|| Process::home_for(pid));
        let priority = clamp_priority(config.priority.unwrap_or(DEFAULT_PRIORITY));

        let mut env = config.env.clone();
        if !config.role.is_empty() {
            env.insert("AGENT_ROLE".to_string(), config.role.clone());
        }
        if !config.goal.is_empty() {
            env.insert("AGENT_GOAL".to_string(), config.goal.clone());
        }

        let process = Process {
            pid,
            ppid,
            uid: uid.clone(),
            owner_uid: owner_uid.to_string(),
            name: config.name.clone(),
            state: ProcessState::Created,
            phase: "booting".to_string(),
            priority,
            env,
            cwd,
            spawned_at_ms: clock.epoch_ms(),
            config,
        };
        self.entries.insert(
            pid,
            ProcEntry { process: process.clone(), mailbox: Vec::new(), next_msg_id: 1, last_msg_ts: 0 },
        );
        process
    }
}

/// The kernel process table. Clone-cheap; clones share state.
#[derive(Clone)]
pub struct ProcessTable<C: Clock = SystemClock> {
    inner: Arc<Mutex<TableInner>>,
    bus: EventBus,
    clock: C,
    limits: TableLimits,
}

impl<C: Clock> ProcessTable<C> {
    pub fn new(bus: EventBus, clock: C, limits: TableLimits) -> Self {
        let queue_limit = limits.queue_limit;
        Self {
            inner: Arc::new(Mutex::new(TableInner {
                next_pid: 1,
                entries: IndexMap::new(),
                queue: AdmissionQueue::new(queue_limit),
            })),
            bus,
            clock,
            limits,
        }
    }

    fn emit_all(&self, events: Vec<Event>) {
        for event in events {
            self.bus.emit(&event);
        }
    }

    /// Spawn a process, or queue the request when the table is at its
    /// concurrency cap. Exceeding [`MAX_PROCESSES`] non-dead entries is
    /// fatal to the call.
    pub fn spawn(
        &self,
        config: ProcessConfig,
        ppid: Pid,
        owner_uid: &str,
    ) -> Result<SpawnOutcome, KernelError> {
        let (outcome, events) = {
            let mut inner = self.inner.lock();
            if inner.live_count() >= MAX_PROCESSES {
                return Err(KernelError::fatal(format!(
                    "process table full ({MAX_PROCESSES} non-dead processes)"
                )));
            }
            if inner.active_count() >= self.limits.max_concurrent {
                let priority = clamp_priority(config.priority.unwrap_or(DEFAULT_PRIORITY));
                let name = config.name.clone();
                let position = inner.queue.push(
                    config,
                    ppid,
                    owner_uid.to_string(),
                    priority,
                    self.clock.epoch_ms(),
                )?;
                let event = Event::ProcessQueued {
                    name,
                    owner_uid: owner_uid.to_string(),
                    priority,
                };
                (SpawnOutcome::Queued { position, priority }, vec![event])
            } else {
                let process = inner.allocate(&self.clock, config, ppid, owner_uid);
                let event = spawned_event(&process);
                (SpawnOutcome::Spawned { process }, vec![event])
            }
        };
        self.emit_all(events);
        Ok(outcome)
    }

    /// Deliver a signal. Unknown or dead PIDs and transitions the state
    /// machine forbids fail without mutating anything.
    pub fn signal(&self, pid: Pid, sig: Signal) -> Result<(), KernelError> {
        let events = {
            let mut inner = self.inner.lock();
            let entry = inner
                .entries
                .get_mut(&pid)
                .ok_or_else(|| KernelError::not_found(format!("no such pid {pid}")))?;
            let from = entry.process.state;
            if from == ProcessState::Dead {
                return Err(KernelError::invalid_state(format!("pid {pid} is dead")));
            }

            let to = match sig {
                Signal::Term | Signal::Kill => ProcessState::Zombie,
                Signal::Stop => ProcessState::Stopped,
                Signal::Cont => ProcessState::Running,
            };
            if sig == Signal::Stop && from != ProcessState::Running {
                return Err(KernelError::invalid_state(format!(
                    "SIGSTOP on {from} process"
                )));
            }
            if sig == Signal::Cont && from != ProcessState::Stopped {
                return Err(KernelError::invalid_state(format!(
                    "SIGCONT on {from} process"
                )));
            }
            if !from.can_transition(to) {
                return Err(KernelError::invalid_state(format!(
                    "illegal transition {from} -> {to}"
                )));
            }

            entry.process.state = to;
            let mut events = Vec::new();
            if to == ProcessState::Zombie {
                entry.process.phase = "terminated".to_string();
                events.push(Event::ProcessStateChange {
                    pid,
                    from,
                    to,
                    phase: entry.process.phase.clone(),
                });
                if let Some(code) = sig.exit_code() {
                    events.push(Event::ProcessExit { pid, code, signal: Some(sig) });
                }
            } else {
                events.push(Event::ProcessStateChange {
                    pid,
                    from,
                    to,
                    phase: entry.process.phase.clone(),
                });
            }
            events
        };
        self.emit_all(events);
        Ok(())
    }

    /// Explicit lifecycle transition (cooperative yield, wake, pause,
    /// resume, normal exit to zombie). `Dead` is reached only through
    /// [`Self::reap`].
    pub fn set_state(
        &self,
        pid: Pid,
        to: ProcessState,
        phase: Option<&str>,
    ) -> Result<Process, KernelError> {
        let (process, events) = {
            let mut inner = self.inner.lock();
            let entry = inner
                .entries
                .get_mut(&pid)
                .ok_or_else(|| KernelError::not_found(format!("no such pid {pid}")))?;
            let from = entry.process.state;
            if to == ProcessState::Dead {
                return Err(KernelError::invalid_state("processes die via reap"));
            }
            if !from.can_transition(to) {
                return Err(KernelError::invalid_state(format!(
                    "illegal transition {from} -> {to}"
                )));
            }
            entry.process.state = to;
            if let Some(phase) = phase {
                entry.process.phase = phase.to_string();
            }
            let event = Event::ProcessStateChange {
                pid,
                from,
                to,
                phase: entry.process.phase.clone(),
            };
            let mut events = vec![event];
            // Normal exits report the conventional code 0 with no signal.
            if to == ProcessState::Zombie {
                events.push(Event::ProcessExit { pid, code: 0, signal: None });
            }
            (entry.process.clone(), events)
        };
        self.emit_all(events);
        Ok(process)
    }

    /// Update the free-form phase label of a live process.
    pub fn set_phase(&self, pid: Pid, phase: &str) -> Result<(), KernelError> {
        let event = {
            let mut inner = self.inner.lock();
            let entry = inner
                .entries
                .get_mut(&pid)
                .ok_or_else(|| KernelError::not_found(format!("no such pid {pid}")))?;
            if !entry.process.state.is_live() {
                return Err(KernelError::invalid_state(format!("pid {pid} is dead")));
            }
            let previous = std::mem::replace(&mut entry.process.phase, phase.to_string());
            Event::AgentPhaseChange { pid, previous, phase: phase.to_string() }
        };
        self.bus.emit(&event);
        Ok(())
    }

    /// Change a live process's priority. Out-of-band values are
    /// rejected, not clamped.
    pub fn set_priority(&self, pid: Pid, priority: u8) -> Result<(), KernelError> {
        if !(PRIORITY_MIN..=PRIORITY_MAX).contains(&priority) {
            return Err(KernelError::invalid_input(format!(
                "priority must be {PRIORITY_MIN}..={PRIORITY_MAX}"
            )));
        }
        let event = {
            let mut inner = self.inner.lock();
            let entry = inner
                .entries
                .get_mut(&pid)
                .ok_or_else(|| KernelError::not_found(format!("no such pid {pid}")))?;
            if entry.process.state == ProcessState::Dead {
                return Err(KernelError::invalid_state(format!("pid {pid} is dead")));
            }
            let previous = std::mem::replace(&mut entry.process.priority, priority);
            Event::ProcessPriorityChanged { pid, previous, priority }
        };
        self.bus.emit(&event);
        Ok(())
    }

    /// Terminal transition zombie → dead: clear the mailbox, free the
    /// slot, and admit the highest-priority queued request if one fits.
    pub fn reap(&self, pid: Pid) -> Result<(Process, Option<Process>), KernelError> {
        let (reaped, admitted, events) = {
            let mut inner = self.inner.lock();
            let entry = inner
                .entries
                .get_mut(&pid)
                .ok_or_else(|| KernelError::not_found(format!("no such pid {pid}")))?;
            if entry.process.state != ProcessState::Zombie {
                return Err(KernelError::invalid_state(format!(
                    "cannot reap a {} process",
                    entry.process.state
                )));
            }
            entry.process.state = ProcessState::Dead;
            entry.mailbox.clear();
            let reaped = entry.process.clone();
            let mut events =
                vec![Event::ProcessReaped { pid, uid: reaped.uid.clone() }];

            // Never dequeue into a full table.
            let mut admitted = None;
            if inner.active_count() < self.limits.max_concurrent
                && inner.live_count() < MAX_PROCESSES
            {
                if let Some(request) = inner.queue.pop_next() {
                    events.push(Event::ProcessDequeued {
                        name: request.config.name.clone(),
                        owner_uid: request.owner_uid.clone(),
                        priority: request.priority,
                    });
                    let process = inner.allocate(
                        &self.clock,
                        request.config,
                        request.ppid,
                        &request.owner_uid,
                    );
                    events.push(spawned_event(&process));
                    admitted = Some(process);
                }
            }
            (reaped, admitted, events)
        };
        self.emit_all(events);
        Ok((reaped, admitted))
    }

    /// Append a message to the receiver's mailbox. Both endpoints must
    /// exist and be non-dead.
    pub fn send_message(
        &self,
        from_pid: Pid,
        to_pid: Pid,
        channel: &str,
        payload: serde_json::Value,
    ) -> Result<MailboxMessage, KernelError> {
        let mut inner = self.inner.lock();

        let from_uid = match inner.entries.get(&from_pid) {
            Some(e) if e.process.state.is_live() => e.process.uid.clone(),
            _ => {
                return Err(KernelError::not_found(format!(
                    "sender pid {from_pid} is not live"
                )))
            }
        };
        let entry = match inner.entries.get_mut(&to_pid) {
            Some(e) if e.process.state.is_live() => e,
            _ => {
                return Err(KernelError::not_found(format!(
                    "receiver pid {to_pid} is not live"
                )))
            }
        };

        let id = format!("msg_{}", entry.next_msg_id);
        entry.next_msg_id += 1;
        // Monotonic within the mailbox even if the wall clock stalls.
        let timestamp_ms = self.clock.epoch_ms().max(entry.last_msg_ts + 1);
        entry.last_msg_ts = timestamp_ms;

        let message = MailboxMessage {
            id,
            from_pid,
            to_pid,
            from_uid,
            to_uid: entry.process.uid.clone(),
            channel: channel.to_string(),
            payload,
            timestamp_ms,
            delivered: false,
        };
        entry.mailbox.push(message.clone());
        Ok(message)
    }

    /// Atomically take every queued message, marking each delivered.
    pub fn drain_messages(&self, pid: Pid) -> Result<Vec<MailboxMessage>, KernelError> {
        let mut inner = self.inner.lock();
        let entry = inner
            .entries
            .get_mut(&pid)
            .ok_or_else(|| KernelError::not_found(format!("no such pid {pid}")))?;
        if !entry.process.state.is_live() {
            return Err(KernelError::invalid_state(format!("pid {pid} is dead")));
        }
        let mut drained = std::mem::take(&mut entry.mailbox);
        for message in &mut drained {
            message.delivered = true;
        }
        Ok(drained)
    }

    /// Ownership check: unowned processes are everyone's; otherwise the
    /// owner or an admin.
    pub fn is_owner(&self, pid: Pid, user_id: &str, admin: bool) -> bool {
        let inner = self.inner.lock();
        match inner.entries.get(&pid) {
            Some(entry) => {
                admin || entry.process.owner_uid.is_empty() || entry.process.owner_uid == user_id
            }
            None => false,
        }
    }

    pub fn get(&self, pid: Pid) -> Option<Process> {
        let inner = self.inner.lock();
        inner.entries.get(&pid).map(|e| e.process.clone())
    }

    /// All non-dead processes, in PID order.
    pub fn list_live(&self) -> Vec<Process> {
        let inner = self.inner.lock();
        inner
            .entries
            .values()
            .filter(|e| e.process.state.is_live())
            .map(|e| e.process.clone())
            .collect()
    }

    /// Every process ever spawned (dead ones included), in PID order.
    pub fn list_all(&self) -> Vec<Process> {
        let inner = self.inner.lock();
        inner.entries.values().map(|e| e.process.clone()).collect()
    }

    /// Live, unreaped processes owned by `user_id` (all of them for
    /// admins).
    pub fn get_active_by_owner(&self, user_id: &str, admin: bool) -> Vec<Process> {
        let inner = self.inner.lock();
        inner
            .entries
            .values()
            .filter(|e| {
                e.process.state.is_live()
                    && e.process.state != ProcessState::Zombie
                    && (admin || e.process.owner_uid == user_id)
            })
            .map(|e| e.process.clone())
            .collect()
    }

    /// Live processes at one priority level.
    pub fn get_by_priority(&self, priority: u8) -> Vec<Process> {
        let inner = self.inner.lock();
        inner
            .entries
            .values()
            .filter(|e| e.process.state.is_live() && e.process.priority == priority)
            .map(|e| e.process.clone())
            .collect()
    }

    pub fn counts(&self) -> StateCounts {
        let inner = self.inner.lock();
        let mut counts = StateCounts::default();
        for entry in inner.entries.values() {
            match entry.process.state {
                ProcessState::Created => counts.created += 1,
                ProcessState::Running => counts.running += 1,
                ProcessState::Sleeping => counts.sleeping += 1,
                ProcessState::Stopped => counts.stopped += 1,
                ProcessState::Paused => counts.paused += 1,
                ProcessState::Zombie => counts.zombie += 1,
                ProcessState::Dead => counts.dead += 1,
            }
        }
        counts
    }

    /// Whether a live (unreaped, non-zombie) process spawned by this
    /// cron job exists (the single-instance overlap check).
    pub fn has_live_cron(&self, cron_id: &str) -> bool {
        let inner = self.inner.lock();
        inner.entries.values().any(|e| {
            e.process.state.is_live()
                && e.process.state != ProcessState::Zombie
                && e.process.config.cron_id.as_deref() == Some(cron_id)
        })
    }

    /// Queue length (for status surfaces).
    pub fn queue_len(&self) -> usize {
        let inner = self.inner.lock();
        inner.queue.len()
    }

    /// Admission queue contents in dequeue order.
    pub fn queue_snapshot(&self) -> Vec<AdmissionRequest> {
        let inner = self.inner.lock();
        inner.queue.snapshot()
    }
}

fn spawned_event(process: &Process) -> Event {
    Event::ProcessSpawned {
        pid: process.pid,
        ppid: process.ppid,
        uid: process.uid.clone(),
        owner_uid: process.owner_uid.clone(),
        name: process.name.clone(),
        priority: process.priority,
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
