// SPDX-License-Identifier: MIT

//! Organizations, teams, and membership records.

use crate::user::UserId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for an organization.
    pub struct OrgId("org-");
}

crate::define_id! {
    /// Unique identifier for a team within an organization.
    pub struct TeamId("tem-");
}

/// Role of a user within an organization.
///
/// `Owner` is structural: it exists for exactly the user recorded in
/// `Org::owner_user_id` and can never be assigned, promoted to, or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgRole {
    Owner,
    Admin,
    Member,
    Viewer,
}

crate::simple_display! {
    OrgRole {
        Owner => "owner",
        Admin => "admin",
        Member => "member",
        Viewer => "viewer",
    }
}

/// Role of a user within a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    Lead,
    Member,
}

crate::simple_display! {
    TeamRole {
        Lead => "lead",
        Member => "member",
    }
}

/// An organization. `settings` is an opaque blob owned by whoever wrote it;
/// the store round-trips it verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Org {
    pub id: OrgId,
    pub name: String,
    pub display_name: String,
    pub owner_user_id: UserId,
    #[serde(default)]
    pub settings: serde_json::Value,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

/// Membership of a user in an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgMember {
    pub org_id: OrgId,
    pub user_id: UserId,
    pub role: OrgRole,
    pub joined_at_ms: u64,
}

/// A team inside an organization. Deleted with its org.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub org_id: OrgId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Membership of a user in a team. The user must hold an OrgMember row
/// in the team's parent org at insert time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub team_id: TeamId,
    pub user_id: UserId,
    pub role: TeamRole,
    pub joined_at_ms: u64,
}
