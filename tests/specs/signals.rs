//! Signal semantics spec: SIGTERM produces a zombie and the
//! conventional exit event.

use crate::prelude::*;
use aether_core::{ProcessState, Signal};
use aether_engine::SpawnOutcome;
use parking_lot::Mutex;
use std::sync::Arc;

#[test]
fn sigterm_zombifies_and_reports_exit_143() {
    let kernel = test_kernel();
    let exits: Arc<Mutex<Vec<Value>>> = Arc::default();
    let sink = exits.clone();
    let _sub = kernel.bus.subscribe("process.exit", move |event| {
        sink.lock().push(event.to_frame());
        Ok(())
    });

    let SpawnOutcome::Spawned { process } =
        kernel.table.spawn(spawn_config("victim"), 0, "root").unwrap()
    else {
        panic!("expected spawn");
    };
    kernel.table.set_state(process.pid, ProcessState::Running, None).unwrap();
    kernel.table.signal(process.pid, Signal::Term).unwrap();

    assert_eq!(kernel.table.get(process.pid).unwrap().state, ProcessState::Zombie);

    let frames = exits.lock();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["pid"], process.pid);
    assert_eq!(frames[0]["code"], 143);
    assert_eq!(frames[0]["signal"], "SIGTERM");
}

#[test]
fn exit_events_reach_sse_subscribers() {
    let kernel = test_kernel();
    let (_, mut rx) = kernel.fanout.subscribe("process.exit");
    let _ = rx.try_recv(); // connected heartbeat

    let SpawnOutcome::Spawned { process } =
        kernel.table.spawn(spawn_config("victim"), 0, "root").unwrap()
    else {
        panic!("expected spawn");
    };
    kernel.table.signal(process.pid, Signal::Kill).unwrap();

    let frame = String::from_utf8(rx.try_recv().unwrap()).unwrap();
    assert!(frame.starts_with("data: "));
    assert!(frame.contains("\"code\":137"));
    assert!(frame.ends_with("\n\n"));
}

#[test]
fn mailbox_messages_are_delivered_exactly_once() {
    let kernel = test_kernel();
    let SpawnOutcome::Spawned { process: a } =
        kernel.table.spawn(spawn_config("a"), 0, "root").unwrap()
    else {
        panic!("expected spawn");
    };
    let SpawnOutcome::Spawned { process: b } =
        kernel.table.spawn(spawn_config("b"), 0, "root").unwrap()
    else {
        panic!("expected spawn");
    };

    for n in 0..3 {
        kernel
            .table
            .send_message(a.pid, b.pid, "work", serde_json::json!({ "n": n }))
            .unwrap();
    }

    let drained = kernel.table.drain_messages(b.pid).unwrap();
    assert_eq!(drained.len(), 3);
    let ids: Vec<&str> = drained.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["msg_1", "msg_2", "msg_3"]);
    assert!(drained.iter().all(|m| m.delivered));

    // Nothing reappears on a second drain.
    assert!(kernel.table.drain_messages(b.pid).unwrap().is_empty());
}
