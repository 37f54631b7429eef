// SPDX-License-Identifier: MIT

use super::*;
use crate::state::StoreOp;
use aether_core::{Role, User, UserId};

fn sample_state() -> StoreState {
    let mut state = StoreState::default();
    state.apply(&StoreOp::PutUser {
        user: User {
            id: UserId::from_string("usr-alice"),
            username: "alice".to_string(),
            display_name: "Alice".to_string(),
            password_hash: "00:00".to_string(),
            role: Role::Admin,
            mfa_secret: None,
            mfa_enabled: false,
            created_at_ms: 1,
            last_login_at_ms: None,
        },
    });
    state
}

#[test]
fn missing_snapshot_is_none() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_snapshot(dir.path()).unwrap().is_none());
}

#[test]
fn snapshot_roundtrips_with_indexes() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot =
        Snapshot { version: CURRENT_SNAPSHOT_VERSION, wal_seq: 7, state: sample_state() };
    write_snapshot(dir.path(), &snapshot).unwrap();

    let loaded = load_snapshot(dir.path()).unwrap().unwrap();
    assert_eq!(loaded.wal_seq, 7);
    assert!(loaded.state.get_user_by_username("alice").is_some());
}

#[test]
fn future_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = Snapshot {
        version: CURRENT_SNAPSHOT_VERSION + 1,
        wal_seq: 0,
        state: StoreState::default(),
    };
    write_snapshot(dir.path(), &snapshot).unwrap();

    let err = load_snapshot(dir.path()).unwrap_err();
    assert!(matches!(err, StorageError::SnapshotVersion { .. }));
}
