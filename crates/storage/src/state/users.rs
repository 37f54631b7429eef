// SPDX-License-Identifier: MIT

//! User table queries.

use super::StoreState;
use aether_core::User;

impl StoreState {
    pub fn get_user(&self, id: &str) -> Option<&User> {
        self.users.get(id)
    }

    pub fn get_user_by_username(&self, username: &str) -> Option<&User> {
        let id = self.username_index.get(username)?;
        self.users.get(id)
    }

    /// All users in insert order.
    pub fn list_users(&self) -> Vec<&User> {
        self.users.values().collect()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}
