// SPDX-License-Identifier: MIT

//! User identity and system roles.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a user account.
    pub struct UserId("usr-");
}

/// System-wide role. Org-scoped roles live in [`crate::org::OrgRole`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

crate::simple_display! {
    Role {
        Admin => "admin",
        User => "user",
    }
}

/// A registered user account.
///
/// `password_hash` uses the `"<hex-salt>:<hex-scrypt>"` format produced by
/// the auth crate. `mfa_secret` is present iff `mfa_enabled`; the pair is
/// set and cleared together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mfa_secret: Option<String>,
    #[serde(default)]
    pub mfa_enabled: bool,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_at_ms: Option<u64>,
}

impl User {
    /// Public projection: everything except credentials and MFA secret.
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            role: self.role,
            mfa_enabled: self.mfa_enabled,
            created_at_ms: self.created_at_ms,
            last_login_at_ms: self.last_login_at_ms,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Wire-safe view of a user. Never carries hashes or secrets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
    pub role: Role,
    pub mfa_enabled: bool,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_at_ms: Option<u64>,
}

crate::builder! {
    pub struct UserBuilder => User {
        into {
            username: String = "alice",
            display_name: String = "Alice",
            password_hash: String = "00:00",
        }
        set {
            role: Role = Role::User,
            mfa_enabled: bool = false,
            created_at_ms: u64 = 0,
        }
        option {
            mfa_secret: String = None,
            last_login_at_ms: u64 = None,
        }
        computed {
            id: UserId = UserId::new(),
        }
    }
}
