// SPDX-License-Identifier: MIT

//! Scheduler: cron jobs and event triggers that spawn agent processes.
//!
//! Cron evaluation happens at wall-clock minute boundaries. Minutes
//! that elapse while the host is suspended are skipped, never replayed;
//! `next_fire_at` is recomputed after every evaluation. Trigger
//! evaluation rides a bus tap. Fire failures emit `cron.error` /
//! `trigger.error` and never stop the loop.

pub mod cron;
pub mod trigger;

use crate::process::{ProcessTable, SpawnOutcome};
use aether_core::{
    subject_matches, Clock, CronId, CronJob, Event, EventBus, EventTrigger, KernelError,
    ProcessConfig, Subscription, SystemClock, TriggerId,
};
use aether_storage::StateStore;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Cron + trigger scheduler. Clone-cheap; clones share state.
#[derive(Clone)]
pub struct Scheduler<C: Clock = SystemClock> {
    store: StateStore,
    table: ProcessTable<C>,
    bus: EventBus,
    clock: C,
}

impl<C: Clock + 'static> Scheduler<C> {
    pub fn new(store: StateStore, table: ProcessTable<C>, bus: EventBus, clock: C) -> Self {
        Self { store, table, bus, clock }
    }

    // ---- cron jobs ----

    /// Create a persisted cron job. The expression is validated here;
    /// later evaluation failures are reported as `cron.error`.
    pub fn create_cron(
        &self,
        owner_uid: &str,
        name: &str,
        cron_expr: &str,
        agent_config: ProcessConfig,
    ) -> Result<CronJob, KernelError> {
        let compiled = cron::parse(cron_expr)?;
        if name.is_empty() {
            return Err(KernelError::invalid_input("cron name is required"));
        }
        let now = self.clock.epoch_ms();
        let job = CronJob {
            id: CronId::new(),
            name: name.to_string(),
            cron_expr: cron_expr.to_string(),
            agent_config,
            owner_uid: owner_uid.to_string(),
            enabled: true,
            created_at_ms: now,
            last_fired_at_ms: None,
            next_fire_at_ms: cron::next_fire_ms(&compiled, now),
        };
        self.store.put_cron(job.clone())?;
        Ok(job)
    }

    pub fn set_cron_enabled(&self, id: &str, enabled: bool) -> Result<CronJob, KernelError> {
        let mut job = self
            .store
            .get_cron(id)
            .ok_or_else(|| KernelError::not_found(format!("cron {id}")))?;
        job.enabled = enabled;
        if enabled {
            job.next_fire_at_ms = cron::parse(&job.cron_expr)
                .ok()
                .and_then(|c| cron::next_fire_ms(&c, self.clock.epoch_ms()));
        } else {
            job.next_fire_at_ms = None;
        }
        self.store.put_cron(job.clone())?;
        Ok(job)
    }

    pub fn delete_cron(&self, id: &str) -> Result<CronJob, KernelError> {
        self.store.delete_cron(id)
    }

    pub fn list_crons(&self) -> Vec<CronJob> {
        self.store.list_crons()
    }

    /// Evaluate every enabled cron job against one minute boundary.
    pub fn tick_minute(&self, boundary_ms: u64) {
        for job in self.store.list_crons() {
            if !job.enabled {
                continue;
            }
            let compiled = match cron::parse(&job.cron_expr) {
                Ok(compiled) => compiled,
                Err(err) => {
                    warn!(cron = %job.name, error = %err, "cron expression no longer parses");
                    self.bus.emit(&Event::CronError {
                        id: job.id,
                        name: job.name.clone(),
                        error: err.to_string(),
                    });
                    continue;
                }
            };
            if !cron::matches_at(&compiled, boundary_ms) {
                continue;
            }
            // Single-instance per job: skip while a previous spawn lives.
            if self.table.has_live_cron(job.id.as_str()) {
                debug!(cron = %job.name, "skip: previous instance still live");
                continue;
            }
            self.fire_cron(&job, &compiled, boundary_ms);
        }
    }

    fn fire_cron(&self, job: &CronJob, compiled: &croner::Cron, boundary_ms: u64) {
        let mut config = job.agent_config.clone();
        config.cron_id = Some(job.id.to_string());

        match self.table.spawn(config, 0, &job.owner_uid) {
            Ok(outcome) => {
                let pid = match &outcome {
                    SpawnOutcome::Spawned { process } => Some(process.pid),
                    SpawnOutcome::Queued { .. } => None,
                };
                self.bus.emit(&Event::CronFired {
                    id: job.id,
                    name: job.name.clone(),
                    pid,
                    owner_uid: job.owner_uid.clone(),
                });
                let mut updated = job.clone();
                updated.last_fired_at_ms = Some(boundary_ms);
                updated.next_fire_at_ms = cron::next_fire_ms(compiled, boundary_ms);
                if let Err(err) = self.store.put_cron(updated) {
                    warn!(cron = %job.name, error = %err, "failed to persist cron bookkeeping");
                }
            }
            Err(err) => {
                warn!(cron = %job.name, error = %err, "cron fire failed");
                self.bus.emit(&Event::CronError {
                    id: job.id,
                    name: job.name.clone(),
                    error: err.to_string(),
                });
            }
        }
    }

    /// Minute-boundary loop. Runs until cancelled; each pass recomputes
    /// the next boundary from the wall clock.
    pub async fn run(self, shutdown: CancellationToken) {
        loop {
            let now = self.clock.epoch_ms();
            let boundary = cron::minute_floor_ms(now) + cron::MINUTE_MS;
            let delay = Duration::from_millis(boundary - now);
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => self.tick_minute(boundary),
            }
        }
    }

    // ---- event triggers ----

    pub fn create_trigger(
        &self,
        owner_uid: &str,
        name: &str,
        event_pattern: &str,
        filter: Option<Value>,
        cooldown_ms: u64,
        agent_config: ProcessConfig,
    ) -> Result<EventTrigger, KernelError> {
        if name.is_empty() {
            return Err(KernelError::invalid_input("trigger name is required"));
        }
        if event_pattern.is_empty() {
            return Err(KernelError::invalid_input("event pattern is required"));
        }
        let trigger = EventTrigger {
            id: TriggerId::new(),
            name: name.to_string(),
            event_pattern: event_pattern.to_string(),
            filter,
            agent_config,
            owner_uid: owner_uid.to_string(),
            enabled: true,
            cooldown_ms,
            created_at_ms: self.clock.epoch_ms(),
            last_fired_at_ms: None,
        };
        self.store.put_trigger(trigger.clone())?;
        Ok(trigger)
    }

    pub fn set_trigger_enabled(&self, id: &str, enabled: bool) -> Result<EventTrigger, KernelError> {
        let mut trigger = self
            .store
            .get_trigger(id)
            .ok_or_else(|| KernelError::not_found(format!("trigger {id}")))?;
        trigger.enabled = enabled;
        self.store.put_trigger(trigger.clone())?;
        Ok(trigger)
    }

    pub fn delete_trigger(&self, id: &str) -> Result<EventTrigger, KernelError> {
        self.store.delete_trigger(id)
    }

    pub fn list_triggers(&self) -> Vec<EventTrigger> {
        self.store.list_triggers()
    }

    /// Evaluate one event against every enabled trigger.
    ///
    /// Cascades are bounded: trigger-emitted subjects are ignored, and
    /// any runaway spawn loop terminates at the process table's caps.
    pub fn on_event(&self, event: &Event) {
        let subject = event.subject();
        if subject.starts_with("trigger.") {
            return;
        }
        let frame = event.to_frame();

        for trig in self.store.list_triggers() {
            if !trig.enabled || !subject_matches(&trig.event_pattern, subject) {
                continue;
            }
            if let Some(filter) = &trig.filter {
                if !trigger::filter_matches(filter, &frame) {
                    continue;
                }
            }
            let now = self.clock.epoch_ms();
            if let Some(last) = trig.last_fired_at_ms {
                if now.saturating_sub(last) < trig.cooldown_ms {
                    debug!(trigger = %trig.name, "skip: cooldown");
                    continue;
                }
            }
            self.fire_trigger(&trig, subject, now);
        }
    }

    fn fire_trigger(&self, trig: &EventTrigger, subject: &str, now_ms: u64) {
        let mut config = trig.agent_config.clone();
        config.trigger_id = Some(trig.id.to_string());

        match self.table.spawn(config, 0, &trig.owner_uid) {
            Ok(outcome) => {
                let pid = match &outcome {
                    SpawnOutcome::Spawned { process } => Some(process.pid),
                    SpawnOutcome::Queued { .. } => None,
                };
                self.bus.emit(&Event::TriggerFired {
                    id: trig.id,
                    name: trig.name.clone(),
                    pid,
                    subject: subject.to_string(),
                });
                let mut updated = trig.clone();
                updated.last_fired_at_ms = Some(now_ms);
                if let Err(err) = self.store.put_trigger(updated) {
                    warn!(trigger = %trig.name, error = %err, "failed to persist trigger bookkeeping");
                }
            }
            Err(err) => {
                warn!(trigger = %trig.name, error = %err, "trigger fire failed");
                self.bus.emit(&Event::TriggerError {
                    id: trig.id,
                    name: trig.name.clone(),
                    error: err.to_string(),
                });
            }
        }
    }

    /// Attach trigger evaluation to the bus. Keep the subscription
    /// alive for as long as triggers should fire.
    #[must_use = "dropping the subscription handle makes it uncancellable"]
    pub fn start_triggers(&self) -> Subscription {
        let scheduler = self.clone();
        self.bus.tap(move |event| {
            scheduler.on_event(event);
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "sched_tests.rs"]
mod tests;
