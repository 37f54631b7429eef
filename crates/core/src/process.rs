// SPDX-License-Identifier: MIT

//! Process records, lifecycle states, and signal semantics.
//!
//! A process is one hosted agent instance. PIDs are sequential integers,
//! never reused within a run; the durable string identity `agent_<pid>`
//! (the uid) names the agent in filesystem paths and memories.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sequential process identifier, ≥ 1.
pub type Pid = u32;

/// Lowest (most urgent) admission priority.
pub const PRIORITY_MIN: u8 = 1;
/// Highest (least urgent) admission priority.
pub const PRIORITY_MAX: u8 = 5;
/// Priority assigned when a spawn config does not specify one.
pub const DEFAULT_PRIORITY: u8 = 3;

/// Clamp an arbitrary requested priority into the valid 1..=5 band.
pub fn clamp_priority(p: u8) -> u8 {
    p.clamp(PRIORITY_MIN, PRIORITY_MAX)
}

/// Lifecycle state of a process.
///
/// Transitions are fixed; see [`ProcessState::can_transition`]. `Dead` is
/// terminal: the PID record is retained for history but resources are
/// released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessState {
    Created,
    Running,
    Sleeping,
    Stopped,
    Paused,
    Zombie,
    Dead,
}

crate::simple_display! {
    ProcessState {
        Created => "created",
        Running => "running",
        Sleeping => "sleeping",
        Stopped => "stopped",
        Paused => "paused",
        Zombie => "zombie",
        Dead => "dead",
    }
}

impl ProcessState {
    /// Whether a transition from `self` to `to` is a legal edge of the
    /// lifecycle machine. Anything else must fail the caller without
    /// mutating state.
    pub fn can_transition(self, to: ProcessState) -> bool {
        use ProcessState::*;
        match (self, to) {
            (Created, Running) => true,
            (Running, Sleeping) | (Sleeping, Running) => true,
            (Running, Stopped) | (Stopped, Running) => true,
            (Running, Paused) | (Paused, Running) => true,
            // Any non-terminal state may become a zombie (signal or exit).
            (from, Zombie) => from != Dead && from != Zombie,
            (Zombie, Dead) => true,
            _ => false,
        }
    }

    /// Not yet reaped. Dead PIDs are history only.
    pub fn is_live(self) -> bool {
        self != ProcessState::Dead
    }

    /// Counts toward the concurrency cap (admission control).
    pub fn is_active(self) -> bool {
        matches!(self, ProcessState::Created | ProcessState::Running | ProcessState::Sleeping)
    }
}

/// POSIX-style signals understood by the process table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    #[serde(rename = "SIGTERM")]
    Term,
    #[serde(rename = "SIGKILL")]
    Kill,
    #[serde(rename = "SIGSTOP")]
    Stop,
    #[serde(rename = "SIGCONT")]
    Cont,
}

crate::simple_display! {
    Signal {
        Term => "SIGTERM",
        Kill => "SIGKILL",
        Stop => "SIGSTOP",
        Cont => "SIGCONT",
    }
}

impl Signal {
    /// Conventional exit code reported when this signal terminates a
    /// process (128 + signal number). Stop/continue do not exit.
    pub fn exit_code(self) -> Option<i32> {
        match self {
            Signal::Term => Some(143),
            Signal::Kill => Some(137),
            Signal::Stop | Signal::Cont => None,
        }
    }
}

/// Spawn configuration for an agent process.
///
/// This is the opaque `agentConfig` blob carried by cron jobs and event
/// triggers; the store round-trips it verbatim and only the process table
/// interprets it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProcessConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub goal: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    /// Set when this config was spawned by a cron job; used for the
    /// single-instance overlap check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_id: Option<String>,
    /// Set when this config was spawned by an event trigger.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_id: Option<String>,
}

impl ProcessConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }
}

/// A process table entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    pub pid: Pid,
    pub ppid: Pid,
    /// Durable agent identity, `agent_<pid>`.
    pub uid: String,
    /// User identity under whose authority the agent runs (`root` for
    /// kernel-spawned processes).
    pub owner_uid: String,
    pub name: String,
    pub state: ProcessState,
    /// Free-form fine-grained status label, orthogonal to `state`.
    pub phase: String,
    pub priority: u8,
    pub env: HashMap<String, String>,
    pub cwd: String,
    pub spawned_at_ms: u64,
    pub config: ProcessConfig,
}

impl Process {
    /// The uid string for a PID.
    pub fn uid_for(pid: Pid) -> String {
        format!("agent_{pid}")
    }

    /// Home directory assigned at spawn.
    pub fn home_for(pid: Pid) -> String {
        format!("/home/agent_{pid}")
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
