// SPDX-License-Identifier: MIT

use super::*;
use aether_core::test_support::spawn_config;

fn push(queue: &mut AdmissionQueue, name: &str, priority: u8) -> usize {
    queue.push(spawn_config(name), 0, "root".to_string(), priority, 0).unwrap()
}

#[test]
fn dequeues_lowest_priority_value_first() {
    let mut queue = AdmissionQueue::new(16);
    push(&mut queue, "low", 5);
    push(&mut queue, "mid", 3);
    push(&mut queue, "high", 1);

    assert_eq!(queue.pop_next().unwrap().config.name, "high");
    assert_eq!(queue.pop_next().unwrap().config.name, "mid");
    assert_eq!(queue.pop_next().unwrap().config.name, "low");
    assert!(queue.pop_next().is_none());
}

#[test]
fn ties_break_fifo() {
    let mut queue = AdmissionQueue::new(16);
    push(&mut queue, "first", 3);
    push(&mut queue, "second", 3);
    push(&mut queue, "third", 3);

    assert_eq!(queue.pop_next().unwrap().config.name, "first");
    assert_eq!(queue.pop_next().unwrap().config.name, "second");
    assert_eq!(queue.pop_next().unwrap().config.name, "third");
}

#[test]
fn push_reports_position() {
    let mut queue = AdmissionQueue::new(16);
    assert_eq!(push(&mut queue, "a", 5), 0);
    assert_eq!(push(&mut queue, "b", 1), 0); // jumps ahead of a
    assert_eq!(push(&mut queue, "c", 5), 2); // behind a
    assert_eq!(push(&mut queue, "d", 3), 1); // between b and a

    let order: Vec<String> =
        queue.snapshot().into_iter().map(|r| r.config.name).collect();
    assert_eq!(order, vec!["b", "d", "a", "c"]);
}

#[test]
fn bounded_queue_rejects_overflow() {
    let mut queue = AdmissionQueue::new(2);
    push(&mut queue, "a", 3);
    push(&mut queue, "b", 3);
    let err = queue.push(spawn_config("c"), 0, "root".to_string(), 3, 0).unwrap_err();
    assert_eq!(err.code, aether_core::ErrorCode::InvalidState);
    assert_eq!(queue.len(), 2);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Dequeue order is always (priority asc, insertion order) no
        /// matter how requests arrive.
        #[test]
        fn dequeue_order_is_stable_priority_sort(priorities in proptest::collection::vec(1u8..=5, 0..32)) {
            let mut queue = AdmissionQueue::new(64);
            for (i, p) in priorities.iter().enumerate() {
                queue.push(spawn_config(&format!("p{i}")), 0, "root".to_string(), *p, 0).unwrap();
            }

            let mut expected: Vec<(u8, usize)> =
                priorities.iter().copied().zip(0..).collect();
            expected.sort_by_key(|&(p, i)| (p, i));

            for (p, i) in expected {
                let next = queue.pop_next().unwrap();
                prop_assert_eq!(next.priority, p);
                let expected_name = format!("p{i}");
                prop_assert_eq!(next.config.name.as_str(), expected_name.as_str());
            }
            prop_assert!(queue.pop_next().is_none());
        }
    }
}
