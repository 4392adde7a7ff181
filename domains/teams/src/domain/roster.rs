//! Roster aggregation
//!
//! Team listings are read as flat join rows, one per (team, member). This
//! module folds them back into one roster per team. Teams appear in the
//! order their id is first seen; members keep row order within a team.
//! Duplicate rows are not collapsed.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::{TeamRole, TeamVisibility};

/// One (team, member) join row
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct RosterRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub visibility: TeamVisibility,
    pub timezone: String,
    pub technologies: String,
    pub availability: String,
    pub description: String,
    pub created_on: DateTime<Utc>,
    pub user_id: Uuid,
    pub display_name: String,
    pub avatar_url: String,
    pub service_user_id: String,
    pub team_role: TeamRole,
}

/// Team attributes shown in rosters. The invite code is deliberately absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub visibility: TeamVisibility,
    pub timezone: String,
    pub technologies: String,
    pub availability: String,
    pub description: String,
    pub created_on: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterMember {
    pub user_id: Uuid,
    pub display_name: String,
    pub avatar_url: String,
    pub service_user_id: String,
    pub team_role: TeamRole,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRoster {
    #[serde(flatten)]
    pub team: TeamSummary,
    pub members: Vec<RosterMember>,
}

impl RosterRow {
    fn split(self) -> (TeamSummary, RosterMember) {
        let member = RosterMember {
            user_id: self.user_id,
            display_name: self.display_name,
            avatar_url: self.avatar_url,
            service_user_id: self.service_user_id,
            team_role: self.team_role,
        };
        let team = TeamSummary {
            id: self.id,
            event_id: self.event_id,
            name: self.name,
            visibility: self.visibility,
            timezone: self.timezone,
            technologies: self.technologies,
            availability: self.availability,
            description: self.description,
            created_on: self.created_on,
        };
        (team, member)
    }
}

/// Fold join rows into rosters in a single pass.
pub fn aggregate<I>(rows: I) -> Vec<TeamRoster>
where
    I: IntoIterator<Item = RosterRow>,
{
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    let mut rosters: Vec<TeamRoster> = Vec::new();

    for row in rows {
        let (team, member) = row.split();
        let slot = *index.entry(team.id).or_insert_with(|| {
            rosters.push(TeamRoster {
                team,
                members: Vec::new(),
            });
            rosters.len() - 1
        });
        rosters[slot].members.push(member);
    }

    rosters
}
