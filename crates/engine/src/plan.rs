// SPDX-License-Identifier: MIT

//! Plan book: one active plan per process, updated in place.

use aether_core::{Clock, KernelError, Pid, Plan, PlanId, PlanNode, PlanStatus, Process};
use aether_storage::StateStore;

/// Plan storage facade.
#[derive(Clone)]
pub struct Plans<C: Clock> {
    store: StateStore,
    clock: C,
}

impl<C: Clock> Plans<C> {
    pub fn new(store: StateStore, clock: C) -> Self {
        Self { store, clock }
    }

    /// Replace (or create) the active plan for a process.
    pub fn set_plan(
        &self,
        pid: Pid,
        goal: &str,
        root_nodes: Vec<PlanNode>,
    ) -> Result<Plan, KernelError> {
        if goal.is_empty() {
            return Err(KernelError::invalid_input("plan goal is required"));
        }
        // Keep the original id and creation time on in-place update.
        let plan = match self.store.get_plan(pid) {
            Some(mut existing) => {
                existing.goal = goal.to_string();
                existing.root_nodes = root_nodes;
                existing.status = PlanStatus::Active;
                existing
            }
            None => Plan {
                id: PlanId::new(),
                pid,
                uid: Process::uid_for(pid),
                goal: goal.to_string(),
                root_nodes,
                created_at_ms: self.clock.epoch_ms(),
                status: PlanStatus::Active,
            },
        };
        self.store.put_plan(plan.clone())?;
        Ok(plan)
    }

    pub fn get_plan(&self, pid: Pid) -> Option<Plan> {
        self.store.get_plan(pid)
    }

    /// Mark the active plan completed or abandoned.
    pub fn set_status(&self, pid: Pid, status: PlanStatus) -> Result<Plan, KernelError> {
        let mut plan = self
            .store
            .get_plan(pid)
            .ok_or_else(|| KernelError::not_found(format!("no plan for pid {pid}")))?;
        plan.status = status;
        self.store.put_plan(plan.clone())?;
        Ok(plan)
    }

    pub fn clear(&self, pid: Pid) -> Result<(), KernelError> {
        self.store.delete_plan(pid)
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
