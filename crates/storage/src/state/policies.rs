// SPDX-License-Identifier: MIT

//! Policy table queries.

use super::StoreState;
use aether_core::PermissionPolicy;

impl StoreState {
    pub fn get_policy(&self, id: &str) -> Option<&PermissionPolicy> {
        self.policies.get(id)
    }

    pub fn list_policies(&self) -> Vec<&PermissionPolicy> {
        self.policies.values().collect()
    }

    /// Policies whose subject is any of `subjects`, insert order.
    pub fn policies_for_subjects(&self, subjects: &[String]) -> Vec<&PermissionPolicy> {
        self.policies
            .values()
            .filter(|p| subjects.iter().any(|s| s == &p.subject))
            .collect()
    }
}
