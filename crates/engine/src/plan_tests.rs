// SPDX-License-Identifier: MIT

use super::*;
use aether_core::test_support::fixed_clock;
use aether_core::{FakeClock, PlanNode, PlanStatus};
use aether_storage::StateStore;

fn plans() -> Plans<FakeClock> {
    Plans::new(StateStore::in_memory(), fixed_clock())
}

fn node(title: &str) -> PlanNode {
    PlanNode { title: title.to_string(), done: false, children: Vec::new() }
}

#[test]
fn one_active_plan_per_pid_updated_in_place() {
    let plans = plans();
    let first = plans.set_plan(1, "write report", vec![node("outline")]).unwrap();
    assert_eq!(first.uid, "agent_1");
    assert_eq!(first.status, PlanStatus::Active);

    let second = plans.set_plan(1, "revise report", vec![node("edit")]).unwrap();
    // Same plan row, updated in place.
    assert_eq!(second.id, first.id);
    assert_eq!(second.created_at_ms, first.created_at_ms);
    assert_eq!(second.goal, "revise report");

    assert_eq!(plans.get_plan(1).unwrap().goal, "revise report");
}

#[test]
fn plans_are_per_pid() {
    let plans = plans();
    plans.set_plan(1, "a", vec![]).unwrap();
    plans.set_plan(2, "b", vec![]).unwrap();
    assert_eq!(plans.get_plan(1).unwrap().goal, "a");
    assert_eq!(plans.get_plan(2).unwrap().goal, "b");
}

#[test]
fn status_transitions_and_clear() {
    let plans = plans();
    plans.set_plan(1, "a", vec![]).unwrap();
    let done = plans.set_status(1, PlanStatus::Completed).unwrap();
    assert_eq!(done.status, PlanStatus::Completed);

    plans.clear(1).unwrap();
    assert!(plans.get_plan(1).is_none());
    assert!(plans.set_status(1, PlanStatus::Abandoned).is_err());
}

#[test]
fn empty_goal_rejected() {
    let plans = plans();
    assert!(plans.set_plan(1, "", vec![]).is_err());
}
