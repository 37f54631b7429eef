// SPDX-License-Identifier: MIT

//! Audit range queries with pagination.

use super::StoreState;
use aether_core::{AuditEntry, AuditQuery};

/// Default page size when a query does not set a limit.
pub const DEFAULT_AUDIT_LIMIT: usize = 100;

impl StoreState {
    /// Filtered audit page plus the total match count (pre-pagination).
    pub fn query_audit(&self, query: &AuditQuery) -> (Vec<&AuditEntry>, usize) {
        let matched: Vec<&AuditEntry> =
            self.audit.iter().filter(|e| query.matches(e)).collect();
        let total = matched.len();
        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(DEFAULT_AUDIT_LIMIT);
        let page = matched.into_iter().skip(offset).take(limit).collect();
        (page, total)
    }
}
