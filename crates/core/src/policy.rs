// SPDX-License-Identifier: MIT

//! Permission policy records.
//!
//! A policy binds a subject expression (`user:<id>` or `role:<orgRole>`) to
//! an `(action, resource)` pattern pair with an allow/deny effect. The
//! evaluation algorithm lives in the auth crate; this is the persisted row.

use crate::user::UserId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a permission policy.
    pub struct PolicyId("pol-");
}

/// Effect of a matching policy. Deny overrides allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyEffect {
    Allow,
    Deny,
}

crate::simple_display! {
    PolicyEffect {
        Allow => "allow",
        Deny => "deny",
    }
}

/// A persisted permission policy. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionPolicy {
    pub id: PolicyId,
    /// `user:<userId>` or `role:<orgRole>`.
    pub subject: String,
    /// Action pattern, e.g. `tool.*.execute`. `*` never crosses a dot.
    pub action: String,
    /// Resource pattern, e.g. `/workspace/*` or `*`.
    pub resource: String,
    pub effect: PolicyEffect,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
}

impl PermissionPolicy {
    /// Subject expression for a user principal.
    pub fn user_subject(id: UserId) -> String {
        format!("user:{id}")
    }

    /// Subject expression for an org-role principal.
    pub fn role_subject(role: crate::org::OrgRole) -> String {
        format!("role:{role}")
    }
}
