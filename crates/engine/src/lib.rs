// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! aether-engine: the process table, scheduler, audit logger, and plan
//! book of the Aether kernel.

pub mod audit;
pub mod plan;
pub mod process;
pub mod sched;

pub use audit::AuditLogger;
pub use plan::Plans;
pub use process::{
    AdmissionRequest, ProcessTable, SpawnOutcome, StateCounts, TableLimits, MAX_PROCESSES,
};
pub use sched::Scheduler;
