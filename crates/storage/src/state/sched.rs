// SPDX-License-Identifier: MIT

//! Cron / trigger table queries and plan lookups.

use super::StoreState;
use aether_core::{CronJob, EventTrigger, Plan};

impl StoreState {
    pub fn get_cron(&self, id: &str) -> Option<&CronJob> {
        self.crons.get(id)
    }

    pub fn list_crons(&self) -> Vec<&CronJob> {
        self.crons.values().collect()
    }

    pub fn get_trigger(&self, id: &str) -> Option<&EventTrigger> {
        self.triggers.get(id)
    }

    pub fn list_triggers(&self) -> Vec<&EventTrigger> {
        self.triggers.values().collect()
    }

    pub fn get_plan(&self, pid: u32) -> Option<&Plan> {
        self.plans.get(&pid)
    }
}
