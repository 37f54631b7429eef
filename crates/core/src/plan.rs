// SPDX-License-Identifier: MIT

//! Agent plan records. One active plan per PID, updated in place.

use crate::process::Pid;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a plan.
    pub struct PlanId("pln-");
}

/// Status of a plan or plan node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Active,
    Completed,
    Abandoned,
}

crate::simple_display! {
    PlanStatus {
        Active => "active",
        Completed => "completed",
        Abandoned => "abandoned",
    }
}

/// One node in a plan tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanNode {
    pub title: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PlanNode>,
}

/// The active plan of a process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub pid: Pid,
    pub uid: String,
    pub goal: String,
    #[serde(default)]
    pub root_nodes: Vec<PlanNode>,
    pub created_at_ms: u64,
    pub status: PlanStatus,
}
