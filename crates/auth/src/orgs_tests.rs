// SPDX-License-Identifier: MIT

use super::*;
use crate::core::{AuthConfig, AuthCore};
use aether_core::{ErrorCode, EventBus, FakeClock, OrgRole, TeamRole, User};
use aether_storage::StateStore;

fn auth() -> AuthCore<FakeClock> {
    let config = AuthConfig { secret: Some(b"test-secret".to_vec()), token_ttl_secs: 3600 };
    AuthCore::new(
        StateStore::in_memory(),
        EventBus::new(),
        aether_core::test_support::fixed_clock(),
        config,
    )
}

fn user_named(auth: &AuthCore<FakeClock>, name: &str) -> User {
    let view = auth.register(name, "passw0rd", "").unwrap();
    auth.get_user(view.id.as_str()).unwrap()
}

#[test]
fn create_org_makes_creator_owner() {
    let auth = auth();
    let alice = user_named(&auth, "alice");
    let org = auth.create_org(&alice, "acme", "Acme Corp").unwrap();

    let member = auth.store().get_org_member(org.id.as_str(), alice.id.as_str()).unwrap();
    assert_eq!(member.role, OrgRole::Owner);
    assert_eq!(org.owner_user_id, alice.id);
}

#[test]
fn org_name_is_validated() {
    let auth = auth();
    let alice = user_named(&auth, "alice");
    assert_eq!(auth.create_org(&alice, "a", "").unwrap_err().code, ErrorCode::InvalidInput);
    assert_eq!(
        auth.create_org(&alice, "has space", "").unwrap_err().code,
        ErrorCode::InvalidInput
    );
}

#[test]
fn invite_rejects_owner_role() {
    let auth = auth();
    let alice = user_named(&auth, "alice");
    let bob = user_named(&auth, "bob");
    let org = auth.create_org(&alice, "acme", "").unwrap();

    let err = auth
        .invite_member(&alice, org.id.as_str(), bob.id.as_str(), OrgRole::Owner)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
}

#[test]
fn owner_cannot_be_promoted_demoted_or_removed() {
    let auth = auth();
    let alice = user_named(&auth, "alice");
    let bob = user_named(&auth, "bob");
    let org = auth.create_org(&alice, "acme", "").unwrap();
    auth.invite_member(&alice, org.id.as_str(), bob.id.as_str(), OrgRole::Member).unwrap();

    // Demote the owner: rejected.
    let err = auth
        .update_member_role(&alice, org.id.as_str(), alice.id.as_str(), OrgRole::Member)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    // Promote bob to owner: rejected.
    let err = auth
        .update_member_role(&alice, org.id.as_str(), bob.id.as_str(), OrgRole::Owner)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    // Remove the owner: rejected.
    let err = auth.remove_member(&alice, org.id.as_str(), alice.id.as_str()).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
}

#[test]
fn member_roles_update_and_remove() {
    let auth = auth();
    let alice = user_named(&auth, "alice");
    let bob = user_named(&auth, "bob");
    let org = auth.create_org(&alice, "acme", "").unwrap();
    auth.invite_member(&alice, org.id.as_str(), bob.id.as_str(), OrgRole::Viewer).unwrap();

    let updated = auth
        .update_member_role(&alice, org.id.as_str(), bob.id.as_str(), OrgRole::Admin)
        .unwrap();
    assert_eq!(updated.role, OrgRole::Admin);

    auth.remove_member(&alice, org.id.as_str(), bob.id.as_str()).unwrap();
    assert!(auth.store().get_org_member(org.id.as_str(), bob.id.as_str()).is_none());
}

#[test]
fn viewer_cannot_invite() {
    let auth = auth();
    let alice = user_named(&auth, "alice");
    let bob = user_named(&auth, "bob");
    let carol = user_named(&auth, "carol");
    let org = auth.create_org(&alice, "acme", "").unwrap();
    auth.invite_member(&alice, org.id.as_str(), bob.id.as_str(), OrgRole::Viewer).unwrap();

    let err = auth
        .invite_member(&bob, org.id.as_str(), carol.id.as_str(), OrgRole::Member)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Forbidden);
}

#[test]
fn duplicate_invite_conflicts() {
    let auth = auth();
    let alice = user_named(&auth, "alice");
    let bob = user_named(&auth, "bob");
    let org = auth.create_org(&alice, "acme", "").unwrap();
    auth.invite_member(&alice, org.id.as_str(), bob.id.as_str(), OrgRole::Member).unwrap();
    let err = auth
        .invite_member(&alice, org.id.as_str(), bob.id.as_str(), OrgRole::Member)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Conflict);
}

#[test]
fn team_creation_requires_permission_and_membership() {
    let auth = auth();
    let alice = user_named(&auth, "alice");
    let bob = user_named(&auth, "bob");
    let org = auth.create_org(&alice, "acme", "").unwrap();

    // Owner can create a team.
    let team = auth.create_team(&alice, org.id.as_str(), "infra", "infra team").unwrap();

    // Bob is not an org member yet: adding him to the team fails.
    let err = auth
        .add_team_member(&alice, team.id.as_str(), bob.id.as_str(), TeamRole::Member)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidState);

    auth.invite_member(&alice, org.id.as_str(), bob.id.as_str(), OrgRole::Member).unwrap();
    let member = auth
        .add_team_member(&alice, team.id.as_str(), bob.id.as_str(), TeamRole::Member)
        .unwrap();
    assert_eq!(member.role, TeamRole::Member);

    // A plain member lacks teams.create.
    let err = auth.create_team(&bob, org.id.as_str(), "another", "").unwrap_err();
    assert_eq!(err.code, ErrorCode::Forbidden);
}

#[test]
fn delete_org_requires_owner_or_admin() {
    let auth = auth();
    let alice = user_named(&auth, "alice");
    let bob = user_named(&auth, "bob");
    let org = auth.create_org(&alice, "acme", "").unwrap();
    auth.invite_member(&alice, org.id.as_str(), bob.id.as_str(), OrgRole::Admin).unwrap();

    let err = auth.delete_org(&bob, org.id.as_str()).unwrap_err();
    assert_eq!(err.code, ErrorCode::Forbidden);

    auth.delete_org(&alice, org.id.as_str()).unwrap();
    assert!(auth.store().get_org(org.id.as_str()).is_none());
}
