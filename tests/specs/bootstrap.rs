//! Bootstrap specs: an empty store yields exactly one admin account
//! whose default credentials produce a working session token.

use crate::prelude::*;

#[test]
fn empty_store_bootstraps_one_admin() {
    let kernel = test_kernel();

    let users = kernel.store.list_users();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].username, "admin");
    assert_eq!(users[0].role, aether_core::Role::Admin);

    // Default credentials log in and the issued token round-trips.
    let token = admin_token(&kernel);
    let (user, claims) = kernel.auth.validate_token(&token).expect("token validates");
    assert_eq!(user.username, "admin");
    assert_eq!(claims.role, Some(aether_core::Role::Admin));
}

#[test]
fn bootstrap_does_not_run_twice() {
    let dir = tempfile::tempdir().unwrap();
    {
        let kernel = kernel_with(|c| c.state_dir = Some(dir.path().to_path_buf()));
        // Change nothing; just shut down cleanly.
        drop(kernel);
    }
    let kernel = kernel_with(|c| c.state_dir = Some(dir.path().to_path_buf()));
    assert_eq!(kernel.store.list_users().len(), 1);
}

#[test]
fn registered_users_coexist_with_bootstrap_admin() {
    let kernel = test_kernel();
    let (_, token) = register_and_login(&kernel, "alice", "passw0rd");
    assert!(kernel.auth.validate_token(&token).is_some());
    assert_eq!(kernel.store.list_users().len(), 2);
}
