// SPDX-License-Identifier: MIT

//! Permission checks: coarse role-based (layer A) and the fine-grained
//! policy engine (layer B).
//!
//! Layer B is deny-by-default with deny-overrides-allow, evaluated over
//! the subject set `{user:<id>} ∪ {role:<orgRole> per membership}`. A
//! user with no applicable policies at all is allowed (bootstrap mode
//! for deployments that have not written a policy corpus yet).

use crate::core::AuthCore;
use crate::policy::{matches_pattern, role_permissions};
use aether_core::{Clock, Event, PermissionPolicy, PolicyEffect, PolicyId, UserId};

/// Outcome of a layer-B evaluation, including the rule that decided it
/// (for the audit trail).
#[derive(Debug, Clone, PartialEq)]
pub struct PermissionDecision {
    pub allowed: bool,
    pub rule_id: Option<PolicyId>,
}

impl<C: Clock> AuthCore<C> {
    /// Layer A: role-based permission check.
    ///
    /// System admins bypass. With an org id, the user's role in that
    /// org decides. Without one, the check passes when any membership's
    /// role grants the permission and, for backward compatibility
    /// with empty deployments, when no org exists anywhere.
    pub fn has_permission(&self, user_id: &str, permission: &str, org_id: Option<&str>) -> bool {
        let Some(user) = self.store.get_user(user_id) else {
            return false;
        };
        if user.is_admin() {
            return true;
        }
        match org_id {
            Some(org_id) => match self.store.get_org_member(org_id, user_id) {
                Some(member) => role_permissions(member.role).contains(&permission),
                None => false,
            },
            None => {
                if self.store.org_count() == 0 {
                    return true;
                }
                self.store
                    .orgs_of_user(user_id)
                    .iter()
                    .any(|(_, m)| role_permissions(m.role).contains(&permission))
            }
        }
    }

    /// Layer B: the policy engine. Emits a `policy.decision` event for
    /// every evaluation so the audit log captures allow and deny alike.
    pub fn check_permission(&self, user_id: &str, action: &str, resource: &str) -> bool {
        let decision = self.evaluate_permission(user_id, action, resource);
        self.bus.emit(&Event::PolicyDecision {
            user_id: UserId::from_string(user_id),
            action: action.to_string(),
            resource: resource.to_string(),
            allowed: decision.allowed,
            rule_id: decision.rule_id,
        });
        decision.allowed
    }

    /// Evaluate without emitting. Exposed for callers that batch or
    /// pre-flight checks.
    pub fn evaluate_permission(
        &self,
        user_id: &str,
        action: &str,
        resource: &str,
    ) -> PermissionDecision {
        let Some(user) = self.store.get_user(user_id) else {
            return PermissionDecision { allowed: false, rule_id: None };
        };
        if user.is_admin() {
            return PermissionDecision { allowed: true, rule_id: None };
        }

        let mut subjects = vec![format!("user:{user_id}")];
        for (_, member) in self.store.orgs_of_user(user_id) {
            let subject = PermissionPolicy::role_subject(member.role);
            if !subjects.contains(&subject) {
                subjects.push(subject);
            }
        }

        let policies = self.store.policies_for_subjects(&subjects);
        if policies.is_empty() {
            // No policy corpus for this principal: bootstrap mode.
            return PermissionDecision { allowed: true, rule_id: None };
        }

        let matching: Vec<&PermissionPolicy> = policies
            .iter()
            .filter(|p| matches_pattern(&p.action, action) && matches_pattern(&p.resource, resource))
            .collect();

        if let Some(deny) = matching.iter().find(|p| p.effect == PolicyEffect::Deny) {
            return PermissionDecision { allowed: false, rule_id: Some(deny.id) };
        }
        if let Some(allow) = matching.iter().find(|p| p.effect == PolicyEffect::Allow) {
            return PermissionDecision { allowed: true, rule_id: Some(allow.id) };
        }
        PermissionDecision { allowed: false, rule_id: None }
    }

    /// `tool.<name>.execute` over the tool name.
    pub fn can_use_tool(&self, user_id: &str, tool: &str) -> bool {
        self.check_permission(user_id, &format!("tool.{tool}.execute"), tool)
    }

    /// `llm.<provider>.use` over the provider name.
    pub fn can_use_provider(&self, user_id: &str, provider: &str) -> bool {
        self.check_permission(user_id, &format!("llm.{provider}.use"), provider)
    }

    /// `fs.<path>.<mode>` over the path.
    pub fn can_access_path(&self, user_id: &str, path: &str, mode: &str) -> bool {
        self.check_permission(user_id, &format!("fs.{path}.{mode}"), path)
    }

    /// Grant a policy (immutable once created).
    pub fn grant_policy(
        &self,
        created_by: Option<UserId>,
        subject: &str,
        action: &str,
        resource: &str,
        effect: PolicyEffect,
    ) -> Result<PermissionPolicy, aether_core::KernelError> {
        if subject.is_empty() || action.is_empty() || resource.is_empty() {
            return Err(aether_core::KernelError::invalid_input(
                "subject, action and resource are required",
            ));
        }
        let policy = PermissionPolicy {
            id: PolicyId::new(),
            subject: subject.to_string(),
            action: action.to_string(),
            resource: resource.to_string(),
            effect,
            created_at_ms: self.clock.epoch_ms(),
            created_by,
        };
        self.store.insert_policy(policy.clone())?;
        self.bus.emit(&Event::PermissionGranted {
            id: policy.id,
            subject: policy.subject.clone(),
            action: policy.action.clone(),
            resource: policy.resource.clone(),
            effect,
        });
        Ok(policy)
    }

    /// Revoke a policy by id.
    pub fn revoke_policy(&self, id: &str) -> Result<PermissionPolicy, aether_core::KernelError> {
        let policy = self.store.delete_policy(id)?;
        self.bus.emit(&Event::PermissionRevoked { id: policy.id });
        Ok(policy)
    }

    pub fn list_policies(&self) -> Vec<PermissionPolicy> {
        self.store.list_policies()
    }
}

#[cfg(test)]
#[path = "checks_tests.rs"]
mod tests;
