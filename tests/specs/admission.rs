//! Admission control spec: priority-ordered queueing behind a
//! concurrency cap of one.

use crate::prelude::*;
use aether_core::Signal;
use aether_engine::SpawnOutcome;

#[test]
fn queued_spawns_admit_lowest_priority_value_first() {
    let kernel = kernel_with(|c| c.max_concurrent = 1);

    // P1 occupies the only slot.
    let SpawnOutcome::Spawned { process: p1 } = kernel
        .table
        .spawn(spawn_config_with_priority("p1", 3), 0, "root")
        .unwrap()
    else {
        panic!("p1 should spawn");
    };

    // Q (priority 5) then R (priority 1) both queue; R jumps ahead.
    let SpawnOutcome::Queued { priority: 5, .. } = kernel
        .table
        .spawn(spawn_config_with_priority("q", 5), 0, "root")
        .unwrap()
    else {
        panic!("q should queue");
    };
    let SpawnOutcome::Queued { priority: 1, position: 0 } = kernel
        .table
        .spawn(spawn_config_with_priority("r", 1), 0, "root")
        .unwrap()
    else {
        panic!("r should queue at the head");
    };

    let queued: Vec<String> =
        kernel.table.queue_snapshot().into_iter().map(|r| r.config.name).collect();
    assert_eq!(queued, vec!["r", "q"]);

    // Reaping P1 frees the slot and admits R, leaving Q queued.
    kernel.table.signal(p1.pid, Signal::Kill).unwrap();
    let (_, admitted) = kernel.table.reap(p1.pid).unwrap();
    assert_eq!(admitted.unwrap().name, "r");

    let queued: Vec<String> =
        kernel.table.queue_snapshot().into_iter().map(|r| r.config.name).collect();
    assert_eq!(queued, vec!["q"]);
}

#[test]
fn running_count_never_exceeds_the_cap() {
    let kernel = kernel_with(|c| c.max_concurrent = 2);

    for i in 0..5 {
        let _ = kernel.table.spawn(spawn_config(&format!("p{i}")), 0, "root").unwrap();
    }
    let counts = kernel.table.counts();
    assert_eq!(counts.created, 2);
    assert_eq!(kernel.table.queue_len(), 3);
}

fn spawn_config_with_priority(name: &str, priority: u8) -> aether_core::ProcessConfig {
    let mut config = spawn_config(name);
    config.priority = Some(priority);
    config
}
