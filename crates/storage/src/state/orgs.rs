// SPDX-License-Identifier: MIT

//! Org / team graph queries (foreign-key joins, insert order).

use super::{member_key, StoreState};
use aether_core::{Org, OrgMember, Team, TeamMember};

impl StoreState {
    pub fn get_org(&self, id: &str) -> Option<&Org> {
        self.orgs.get(id)
    }

    pub fn get_org_by_name(&self, name: &str) -> Option<&Org> {
        let id = self.org_name_index.get(name)?;
        self.orgs.get(id)
    }

    pub fn list_orgs(&self) -> Vec<&Org> {
        self.orgs.values().collect()
    }

    pub fn org_count(&self) -> usize {
        self.orgs.len()
    }

    pub fn get_org_member(&self, org_id: &str, user_id: &str) -> Option<&OrgMember> {
        self.org_members.get(&member_key(org_id, user_id))
    }

    /// Members of one org, insert order.
    pub fn members_of_org(&self, org_id: &str) -> Vec<&OrgMember> {
        self.org_members.values().filter(|m| m.org_id == org_id).collect()
    }

    /// `(org, membership)` pairs for one user, insert order.
    pub fn orgs_of_user(&self, user_id: &str) -> Vec<(&Org, &OrgMember)> {
        self.org_members
            .values()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| self.orgs.get(m.org_id.as_str()).map(|o| (o, m)))
            .collect()
    }

    pub fn get_team(&self, id: &str) -> Option<&Team> {
        self.teams.get(id)
    }

    pub fn teams_of_org(&self, org_id: &str) -> Vec<&Team> {
        self.teams.values().filter(|t| t.org_id == org_id).collect()
    }

    pub fn get_team_member(&self, team_id: &str, user_id: &str) -> Option<&TeamMember> {
        self.team_members.get(&member_key(team_id, user_id))
    }

    pub fn members_of_team(&self, team_id: &str) -> Vec<&TeamMember> {
        self.team_members.values().filter(|m| m.team_id == team_id).collect()
    }
}
