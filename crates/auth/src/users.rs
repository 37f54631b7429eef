// SPDX-License-Identifier: MIT

//! User lifecycle: registration, bootstrap, login, and MFA flows.

use crate::core::AuthCore;
use crate::{password, totp};
use aether_core::{Clock, Event, KernelError, Role, User, UserId, UserView};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Username of the account created on first boot of an empty store.
pub const BOOTSTRAP_ADMIN_USERNAME: &str = "admin";
/// Well-known bootstrap password; rotate immediately after first login.
pub const BOOTSTRAP_ADMIN_PASSWORD: &str = "admin";

/// Result of the first authentication step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuthOutcome {
    /// MFA is enabled: only a step-up token is issued.
    MfaRequired { mfa_required: bool, mfa_token: String },
    /// No MFA: a full session token.
    Authenticated { user: UserView, token: String },
}

/// TOTP provisioning material returned by `setup_mfa`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MfaSetup {
    pub secret: String,
    pub otpauth_uri: String,
}

impl<C: Clock> AuthCore<C> {
    /// Create the default admin account if the store has no users.
    /// Returns the created view, or `None` when users already exist.
    pub fn bootstrap_admin(&self) -> Result<Option<UserView>, KernelError> {
        if self.store.user_count() > 0 {
            return Ok(None);
        }
        let view = self.create_user(
            BOOTSTRAP_ADMIN_USERNAME,
            BOOTSTRAP_ADMIN_PASSWORD,
            "Administrator",
            Role::Admin,
        )?;
        warn!(
            username = BOOTSTRAP_ADMIN_USERNAME,
            password = BOOTSTRAP_ADMIN_PASSWORD,
            "bootstrapped default admin account; change this password"
        );
        Ok(Some(view))
    }

    /// Register a regular user.
    pub fn register(
        &self,
        username: &str,
        pass: &str,
        display_name: &str,
    ) -> Result<UserView, KernelError> {
        self.create_user(username, pass, display_name, Role::User)
    }

    /// Create a user with an explicit system role.
    pub fn create_user(
        &self,
        username: &str,
        pass: &str,
        display_name: &str,
        role: Role,
    ) -> Result<UserView, KernelError> {
        password::validate_username(username)?;
        password::validate_password(pass)?;

        let user = User {
            id: UserId::new(),
            username: username.to_string(),
            display_name: if display_name.is_empty() {
                username.to_string()
            } else {
                display_name.to_string()
            },
            password_hash: password::hash_password(pass)?,
            role,
            mfa_secret: None,
            mfa_enabled: false,
            created_at_ms: self.clock.epoch_ms(),
            last_login_at_ms: None,
        };
        let view = user.view();
        self.store.insert_user(user)?;
        self.bus.emit(&Event::UserCreated {
            id: view.id,
            username: view.username.clone(),
            role: view.role,
        });
        Ok(view)
    }

    /// Delete a user (admin operation; the boundary enforces who may
    /// call this).
    pub fn delete_user(&self, id: &str) -> Result<UserView, KernelError> {
        let user = self.store.delete_user(id)?;
        self.bus.emit(&Event::UserDeleted { id: user.id, username: user.username.clone() });
        Ok(user.view())
    }

    pub fn get_user(&self, id: &str) -> Option<User> {
        self.store.get_user(id)
    }

    pub fn list_users(&self) -> Vec<UserView> {
        self.store.list_users().iter().map(User::view).collect()
    }

    /// First authentication step: verify the password. Issues a full
    /// token, or an MFA step-up token when the account has MFA enabled.
    pub fn authenticate(&self, username: &str, pass: &str) -> Result<AuthOutcome, KernelError> {
        let Some(user) = self.store.get_user_by_username(username) else {
            self.emit_auth_failure(username, "unknown user");
            return Err(KernelError::unauthorized("invalid credentials"));
        };
        if !password::verify_password(pass, &user.password_hash) {
            self.emit_auth_failure(username, "bad password");
            return Err(KernelError::unauthorized("invalid credentials"));
        }

        if user.mfa_enabled {
            let mfa_token = self.mint_mfa_token(&user)?;
            return Ok(AuthOutcome::MfaRequired { mfa_required: true, mfa_token });
        }
        self.finish_login(user)
    }

    /// Second authentication step: verify the step-up token and a fresh
    /// TOTP code, then issue the full token.
    pub fn authenticate_mfa(&self, mfa_token: &str, code: &str) -> Result<AuthOutcome, KernelError> {
        let claims = self
            .decode_token(mfa_token)
            .ok_or_else(|| KernelError::unauthorized("invalid or expired MFA token"))?;
        if !claims.is_mfa() {
            return Err(KernelError::unauthorized("token is not an MFA step-up token"));
        }
        let user = self
            .store
            .get_user(&claims.sub)
            .ok_or_else(|| KernelError::unauthorized("user no longer exists"))?;

        let secret = user
            .mfa_secret
            .as_deref()
            .and_then(totp::decode_secret)
            .ok_or_else(|| KernelError::invalid_state("MFA is not enabled for this user"))?;
        if !totp::verify_code(&secret, code, self.clock.epoch_secs()) {
            self.emit_auth_failure(&user.username, "bad TOTP code");
            return Err(KernelError::unauthorized("invalid code"));
        }
        self.finish_login(user)
    }

    fn finish_login(&self, mut user: User) -> Result<AuthOutcome, KernelError> {
        user.last_login_at_ms = Some(self.clock.epoch_ms());
        self.store.update_user(user.clone())?;
        let token = self.mint_full_token(&user)?;
        self.bus.emit(&Event::AuthSuccess { user_id: user.id, username: user.username.clone() });
        Ok(AuthOutcome::Authenticated { user: user.view(), token })
    }

    fn emit_auth_failure(&self, username: &str, reason: &str) {
        self.bus.emit(&Event::AuthFailure {
            username: username.to_string(),
            reason: reason.to_string(),
        });
    }

    /// Generate and store a TOTP secret for a user. MFA stays disabled
    /// until a code is confirmed via [`Self::enable_mfa`].
    pub fn setup_mfa(&self, user_id: &str) -> Result<MfaSetup, KernelError> {
        let mut user = self
            .store
            .get_user(user_id)
            .ok_or_else(|| KernelError::not_found(format!("user {user_id}")))?;
        let secret = totp::generate_secret();
        let encoded = totp::encode_secret(&secret);
        user.mfa_secret = Some(encoded.clone());
        user.mfa_enabled = false;
        self.store.update_user(user.clone())?;
        Ok(MfaSetup { secret: encoded.clone(), otpauth_uri: totp::otpauth_uri(&user.username, &encoded) })
    }

    /// Confirm a code against the pending secret and turn MFA on.
    pub fn enable_mfa(&self, user_id: &str, code: &str) -> Result<bool, KernelError> {
        let mut user = self
            .store
            .get_user(user_id)
            .ok_or_else(|| KernelError::not_found(format!("user {user_id}")))?;
        let secret = user
            .mfa_secret
            .as_deref()
            .and_then(totp::decode_secret)
            .ok_or_else(|| KernelError::invalid_state("call setup_mfa first"))?;
        if !totp::verify_code(&secret, code, self.clock.epoch_secs()) {
            return Ok(false);
        }
        user.mfa_enabled = true;
        self.store.update_user(user)?;
        self.bus.emit(&Event::MfaEnabled { user_id: UserId::from_string(user_id) });
        Ok(true)
    }

    /// Turn MFA off. Clears both the flag and the secret (they are set
    /// and cleared together).
    pub fn disable_mfa(&self, user_id: &str) -> Result<(), KernelError> {
        let mut user = self
            .store
            .get_user(user_id)
            .ok_or_else(|| KernelError::not_found(format!("user {user_id}")))?;
        user.mfa_enabled = false;
        user.mfa_secret = None;
        self.store.update_user(user)?;
        self.bus.emit(&Event::MfaDisabled { user_id: UserId::from_string(user_id) });
        Ok(())
    }
}

#[cfg(test)]
#[path = "users_tests.rs"]
mod tests;
