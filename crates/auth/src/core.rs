// SPDX-License-Identifier: MIT

//! AuthCore construction and token plumbing.

use crate::token::{self, Claims};
use aether_core::{Clock, EventBus, SystemClock, User};
use aether_storage::StateStore;
use rand::RngCore;
use std::sync::Arc;
use tracing::warn;

/// Default full-token TTL (overridden by `AETHER_TOKEN_EXPIRY_SECS`).
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 86_400;

/// Construction-time configuration. No environment access happens in
/// this crate; the daemon resolves env vars into this struct.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Token signing secret. When absent a random one is generated and
    /// tokens do not survive restart.
    pub secret: Option<Vec<u8>>,
    /// Full-token TTL in seconds. Zero means the default.
    pub token_ttl_secs: u64,
}

/// Identity, MFA, org graph, and policy engine.
///
/// Clone-cheap: all state lives in the store; the struct itself carries
/// only the signing secret and handles.
#[derive(Clone)]
pub struct AuthCore<C: Clock = SystemClock> {
    pub(crate) store: StateStore,
    pub(crate) bus: EventBus,
    pub(crate) clock: C,
    pub(crate) secret: Arc<Vec<u8>>,
    pub(crate) token_ttl_secs: u64,
}

impl<C: Clock> AuthCore<C> {
    pub fn new(store: StateStore, bus: EventBus, clock: C, config: AuthConfig) -> Self {
        let secret = match config.secret {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                warn!("no signing secret configured; generated an ephemeral one, tokens will not survive restart");
                let mut secret = vec![0u8; 32];
                rand::rng().fill_bytes(&mut secret);
                secret
            }
        };
        let token_ttl_secs = if config.token_ttl_secs == 0 {
            DEFAULT_TOKEN_TTL_SECS
        } else {
            config.token_ttl_secs
        };
        Self { store, bus, clock, secret: Arc::new(secret), token_ttl_secs }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Mint a full session token for a user.
    pub(crate) fn mint_full_token(&self, user: &User) -> Result<String, aether_core::KernelError> {
        let claims = Claims::full(user, self.clock.epoch_secs(), self.token_ttl_secs);
        token::create_token(&claims, &self.secret)
    }

    /// Mint an MFA step-up token.
    pub(crate) fn mint_mfa_token(&self, user: &User) -> Result<String, aether_core::KernelError> {
        let claims = Claims::mfa(user.id, self.clock.epoch_secs());
        token::create_token(&claims, &self.secret)
    }

    /// Verify a bearer token and resolve the user it references.
    ///
    /// `None` when the token is malformed, mis-signed, expired, an MFA
    /// step-up token, or references a user that no longer exists.
    pub fn validate_token(&self, bearer: &str) -> Option<(User, Claims)> {
        let claims = token::verify_token(bearer, &self.secret, self.clock.epoch_secs())?;
        if claims.is_mfa() {
            return None;
        }
        let user = self.store.get_user(&claims.sub)?;
        Some((user, claims))
    }

    /// Verify any token (including MFA step-up) without resolving state.
    pub fn decode_token(&self, bearer: &str) -> Option<Claims> {
        token::verify_token(bearer, &self.secret, self.clock.epoch_secs())
    }
}
