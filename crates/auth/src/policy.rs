// SPDX-License-Identifier: MIT

//! Pattern matching and the role→permission table.
//!
//! Patterns are compiled by hand; user input never reaches a host
//! regex engine. `*` alone matches anything; inside a pattern it
//! matches a run of non-dot characters, so dots are hard segment
//! boundaries: `tool.*.execute` matches `tool.a.execute` but not
//! `tool.a.b.execute`.

use aether_core::OrgRole;

/// Match `value` against a policy pattern.
pub fn matches_pattern(pattern: &str, value: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    glob_match(pattern.as_bytes(), value.as_bytes())
}

/// Backtracking matcher where `*` expands to `[^.]*` and every other
/// byte is literal.
fn glob_match(pattern: &[u8], value: &[u8]) -> bool {
    let (mut p, mut v) = (0usize, 0usize);
    // Position to resume from on mismatch: last `*` in pattern and the
    // value index its expansion currently ends at.
    let mut star: Option<(usize, usize)> = None;

    while v < value.len() {
        if p < pattern.len() && pattern[p] == b'*' {
            star = Some((p, v));
            p += 1;
        } else if p < pattern.len() && pattern[p] == value[v] {
            p += 1;
            v += 1;
        } else if let Some((star_p, star_v)) = star {
            // Grow the star's match by one byte, unless that byte is a
            // dot: `*` never crosses a segment boundary.
            if value[star_v] == b'.' {
                return false;
            }
            star = Some((star_p, star_v + 1));
            p = star_p + 1;
            v = star_v + 1;
        } else {
            return false;
        }
    }
    // Trailing stars match the empty string.
    while p < pattern.len() && pattern[p] == b'*' {
        p += 1;
    }
    p == pattern.len()
}

/// Coarse permissions granted by each org role (layer A checks).
pub fn role_permissions(role: OrgRole) -> &'static [&'static str] {
    match role {
        OrgRole::Owner => &[
            "org.view",
            "org.update",
            "org.delete",
            "members.invite",
            "members.remove",
            "members.update",
            "teams.create",
            "teams.manage",
            "agents.spawn",
            "agents.manage",
            "policies.manage",
        ],
        OrgRole::Admin => &[
            "org.view",
            "org.update",
            "members.invite",
            "members.remove",
            "members.update",
            "teams.create",
            "teams.manage",
            "agents.spawn",
            "agents.manage",
        ],
        OrgRole::Member => &["org.view", "agents.spawn"],
        OrgRole::Viewer => &["org.view"],
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
