//! Persistence specs: durable rows survive a kernel restart, with and
//! without a checkpoint in between.

use crate::prelude::*;
use aether_core::PolicyEffect;

#[test]
fn users_orgs_and_policies_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let (user_id, org_id, policy_id);
    {
        let kernel = kernel_with(|c| c.state_dir = Some(dir.path().to_path_buf()));
        let (uid, _) = register_and_login(&kernel, "alice", "passw0rd");
        let alice = kernel.store.get_user(&uid).unwrap();
        let org = kernel.auth.create_org(&alice, "acme", "Acme").unwrap();
        let policy = kernel
            .auth
            .grant_policy(None, &format!("user:{uid}"), "tool.*.execute", "*", PolicyEffect::Allow)
            .unwrap();
        user_id = uid;
        org_id = org.id.to_string();
        policy_id = policy.id.to_string();
    }

    let kernel = kernel_with(|c| c.state_dir = Some(dir.path().to_path_buf()));
    assert!(kernel.store.get_user(&user_id).is_some());
    assert!(kernel.store.get_user_by_username("alice").is_some());
    let org = kernel.store.get_org(&org_id).unwrap();
    assert_eq!(org.name, "acme");
    assert_eq!(
        kernel.store.get_org_member(&org_id, &user_id).unwrap().role,
        aether_core::OrgRole::Owner
    );
    assert!(kernel.store.get_policy(&policy_id).is_some());
}

#[test]
fn scheduler_entries_reload_on_startup() {
    let dir = tempfile::tempdir().unwrap();
    {
        let kernel = kernel_with(|c| c.state_dir = Some(dir.path().to_path_buf()));
        kernel.scheduler.create_cron("root", "nightly", "0 3 * * *", spawn_config("reporter")).unwrap();
        kernel
            .scheduler
            .create_trigger("root", "on-push", "github.*", None, 5_000, spawn_config("ci"))
            .unwrap();
    }

    let kernel = kernel_with(|c| c.state_dir = Some(dir.path().to_path_buf()));
    let crons = kernel.scheduler.list_crons();
    assert_eq!(crons.len(), 1);
    assert_eq!(crons[0].cron_expr, "0 3 * * *");
    assert!(crons[0].enabled);

    let triggers = kernel.scheduler.list_triggers();
    assert_eq!(triggers.len(), 1);
    assert_eq!(triggers[0].event_pattern, "github.*");
}

#[test]
fn checkpoint_compacts_without_losing_rows() {
    let dir = tempfile::tempdir().unwrap();
    {
        let kernel = kernel_with(|c| c.state_dir = Some(dir.path().to_path_buf()));
        register_and_login(&kernel, "alice", "passw0rd");
        kernel.store.checkpoint().unwrap();
        register_and_login(&kernel, "bob", "passw0rd");
    }

    let kernel = kernel_with(|c| c.state_dir = Some(dir.path().to_path_buf()));
    let names: Vec<String> =
        kernel.store.list_users().into_iter().map(|u| u.username).collect();
    assert_eq!(names, vec!["admin", "alice", "bob"]);
}

#[test]
fn opaque_kv_blobs_round_trip_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let blob = serde_json::json!({"layout": {"panes": [1, 2]}, "zoom": 0.8});
    {
        let kernel = kernel_with(|c| c.state_dir = Some(dir.path().to_path_buf()));
        kernel.store.set_kv("remote.snapshot", blob.clone()).unwrap();
    }
    let kernel = kernel_with(|c| c.state_dir = Some(dir.path().to_path_buf()));
    assert_eq!(kernel.store.get_kv("remote.snapshot"), Some(blob));
}
