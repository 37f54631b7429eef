// SPDX-License-Identifier: MIT

use super::*;
use aether_core::{ErrorCode, OrgId, OrgRole, PolicyEffect, PolicyId, Role, TeamId, UserId};
use serde_json::json;

fn user(name: &str) -> User {
    User {
        id: UserId::from_string(format!("usr-{name}")),
        username: name.to_string(),
        display_name: name.to_string(),
        password_hash: "00:00".to_string(),
        role: Role::User,
        mfa_secret: None,
        mfa_enabled: false,
        created_at_ms: 0,
        last_login_at_ms: None,
    }
}

fn org(name: &str, owner: &str) -> (Org, OrgMember) {
    let org = Org {
        id: OrgId::from_string(format!("org-{name}")),
        name: name.to_string(),
        display_name: name.to_string(),
        owner_user_id: UserId::from_string(format!("usr-{owner}")),
        settings: serde_json::Value::Null,
        created_at_ms: 0,
        updated_at_ms: 0,
    };
    let member = OrgMember {
        org_id: org.id,
        user_id: org.owner_user_id,
        role: OrgRole::Owner,
        joined_at_ms: 0,
    };
    (org, member)
}

#[test]
fn duplicate_username_conflicts() {
    let store = StateStore::in_memory();
    store.insert_user(user("alice")).unwrap();

    let mut dup = user("alice");
    dup.id = UserId::from_string("usr-other");
    let err = store.insert_user(dup).unwrap_err();
    assert_eq!(err.code, ErrorCode::Conflict);
}

#[test]
fn duplicate_org_name_conflicts() {
    let store = StateStore::in_memory();
    let (o, m) = org("acme", "alice");
    store.insert_org_with_owner(o, m).unwrap();

    let (mut o2, m2) = org("acme", "bob");
    o2.id = OrgId::from_string("org-acme2");
    let err = store.insert_org_with_owner(o2, m2).unwrap_err();
    assert_eq!(err.code, ErrorCode::Conflict);
}

#[test]
fn org_creation_is_atomic_with_owner_membership() {
    let store = StateStore::in_memory();
    let (o, m) = org("acme", "alice");
    store.insert_org_with_owner(o, m).unwrap();

    let member = store.get_org_member("org-acme", "usr-alice").unwrap();
    assert_eq!(member.role, OrgRole::Owner);
}

#[test]
fn team_member_requires_org_membership() {
    let store = StateStore::in_memory();
    let (o, m) = org("acme", "alice");
    store.insert_org_with_owner(o, m).unwrap();
    store
        .insert_team(Team {
            id: TeamId::from_string("tem-infra"),
            org_id: OrgId::from_string("org-acme"),
            name: "infra".to_string(),
            description: String::new(),
        })
        .unwrap();

    let outsider = TeamMember {
        team_id: TeamId::from_string("tem-infra"),
        user_id: UserId::from_string("usr-mallory"),
        role: aether_core::TeamRole::Member,
        joined_at_ms: 0,
    };
    let err = store.put_team_member(outsider).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidState);

    let insider = TeamMember {
        team_id: TeamId::from_string("tem-infra"),
        user_id: UserId::from_string("usr-alice"),
        role: aether_core::TeamRole::Lead,
        joined_at_ms: 0,
    };
    store.put_team_member(insider).unwrap();
}

#[test]
fn policies_filter_by_subject_set() {
    let store = StateStore::in_memory();
    for (subject, action) in
        [("user:usr-a", "tool.*.execute"), ("role:member", "llm.*.use"), ("user:usr-b", "*")]
    {
        store
            .insert_policy(PermissionPolicy {
                id: PolicyId::new(),
                subject: subject.to_string(),
                action: action.to_string(),
                resource: "*".to_string(),
                effect: PolicyEffect::Allow,
                created_at_ms: 0,
                created_by: None,
            })
            .unwrap();
    }

    let subjects = vec!["user:usr-a".to_string(), "role:member".to_string()];
    let matched = store.policies_for_subjects(&subjects);
    assert_eq!(matched.len(), 2);
    assert_eq!(matched[0].action, "tool.*.execute");
    assert_eq!(matched[1].action, "llm.*.use");
}

#[test]
fn kv_roundtrips_opaque_blobs() {
    let store = StateStore::in_memory();
    let blob = json!({"nested": {"deep": [1, 2, 3]}, "flag": true});
    store.set_kv("remote.snapshot", blob.clone()).unwrap();
    assert_eq!(store.get_kv("remote.snapshot"), Some(blob));
    assert_eq!(store.get_kv("missing"), None);
}

#[test]
fn durable_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = StateStore::open(dir.path()).unwrap();
        store.insert_user(user("alice")).unwrap();
        let (o, m) = org("acme", "alice");
        store.insert_org_with_owner(o, m).unwrap();
    }

    let store = StateStore::open(dir.path()).unwrap();
    assert!(store.get_user_by_username("alice").is_some());
    assert!(store.get_org_by_name("acme").is_some());
}

#[test]
fn checkpoint_then_reopen_replays_only_tail() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = StateStore::open(dir.path()).unwrap();
        store.insert_user(user("alice")).unwrap();
        store.checkpoint().unwrap();
        store.insert_user(user("bob")).unwrap();
    }

    let store = StateStore::open(dir.path()).unwrap();
    let names: Vec<_> = store.list_users().into_iter().map(|u| u.username).collect();
    assert_eq!(names, vec!["alice", "bob"]);
}

#[test]
fn delete_missing_rows_not_found() {
    let store = StateStore::in_memory();
    assert_eq!(store.delete_user("usr-ghost").unwrap_err().code, ErrorCode::NotFound);
    assert_eq!(store.delete_org("org-ghost").unwrap_err().code, ErrorCode::NotFound);
    assert_eq!(store.delete_policy("pol-ghost").unwrap_err().code, ErrorCode::NotFound);
    assert_eq!(store.delete_cron("crn-ghost").unwrap_err().code, ErrorCode::NotFound);
}
