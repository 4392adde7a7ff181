//! Membership coordinator
//!
//! Owns the write paths for teams and memberships: creation with an owner,
//! joining by browse or invite code, and owner edits. Also assembles the
//! team detail and roster reads.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::{Event, Membership, Team, TeamAttributes, TeamRole, User};
use crate::domain::error::TeamError;
use crate::domain::invite_code::InviteCodeGenerator;
use crate::domain::roster::{aggregate, RosterMember, TeamRoster, TeamSummary};
use crate::domain::validation::is_well_formed_invite_code;
use crate::repository::{
    EventStore, MembershipStore, RosterFilter, TeamStore, TeamsRepositories, UserStore,
    INVITE_CODE_CONSTRAINT, MEMBERSHIP_CONSTRAINT,
};

/// Invite code draws per team creation before giving up
pub const MAX_INVITE_CODE_ATTEMPTS: usize = 5;

/// A team as shown on its detail page. The invite code is present only
/// for members.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamView {
    #[serde(flatten)]
    pub team: TeamSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamDetails {
    pub team: TeamView,
    pub event: Event,
    pub members: Vec<RosterMember>,
}

impl TeamView {
    fn of(team: Team, is_member: bool) -> Self {
        let invite_code = is_member.then_some(team.invite_code);
        TeamView {
            team: TeamSummary {
                id: team.id,
                event_id: team.event_id,
                name: team.name,
                visibility: team.visibility,
                timezone: team.timezone,
                technologies: team.technologies,
                availability: team.availability,
                description: team.description,
                created_on: team.created_on,
            },
            invite_code,
        }
    }
}

#[derive(Clone)]
pub struct MembershipCoordinator {
    users: Arc<dyn UserStore>,
    teams: Arc<dyn TeamStore>,
    memberships: Arc<dyn MembershipStore>,
    events: Arc<dyn EventStore>,
    invite_codes: Arc<dyn InviteCodeGenerator>,
}

impl MembershipCoordinator {
    pub fn new(repos: &TeamsRepositories, invite_codes: Arc<dyn InviteCodeGenerator>) -> Self {
        Self {
            users: repos.users.clone(),
            teams: repos.teams.clone(),
            memberships: repos.memberships.clone(),
            events: repos.events.clone(),
            invite_codes,
        }
    }

    /// Create a team and make `owner_id` its owner in one transaction.
    pub async fn create_team(
        &self,
        owner_id: Uuid,
        event_id: Uuid,
        attributes: TeamAttributes,
    ) -> Result<Team, TeamError> {
        self.ensure_active(owner_id).await?;
        self.ensure_signups_open(event_id).await?;

        for attempt in 1..=MAX_INVITE_CODE_ATTEMPTS {
            let code = self.invite_codes.generate(&attributes.name);
            let team = Team::new(event_id, attributes.clone(), code);
            let owner = Membership::new(team.id, owner_id, TeamRole::Owner);

            match self.teams.create_with_owner(&team, &owner).await {
                Ok(created) => {
                    tracing::info!(team_id = %created.id, user_id = %owner_id, "Team created");
                    return Ok(created);
                }
                Err(err) if err.violates(INVITE_CODE_CONSTRAINT) => {
                    tracing::warn!(attempt, "Invite code collision, drawing a new code");
                }
                Err(err) => {
                    tracing::error!(
                        operation = "create_team",
                        user_id = %owner_id,
                        event_id = %event_id,
                        error = %err,
                        "Failed to persist team"
                    );
                    return Err(TeamError::storage("create_team")(err));
                }
            }
        }

        Err(TeamError::InviteCodeExhausted)
    }

    /// Join a public team found by browsing.
    pub async fn join_by_browse(&self, user_id: Uuid, team_id: Uuid) -> Result<Membership, TeamError> {
        let team = self
            .teams
            .get_by_id(team_id)
            .await
            .map_err(TeamError::storage("join_by_browse"))?
            .ok_or(TeamError::TeamNotFound)?;

        if team.is_private() {
            return Err(TeamError::PrivateTeam);
        }

        self.add_member(user_id, &team).await
    }

    /// Join any team, public or private, by its invite code.
    pub async fn join_by_invite(&self, user_id: Uuid, invite_code: &str) -> Result<Membership, TeamError> {
        let team = self.verify_invite(invite_code).await?;
        self.add_member(user_id, &team).await
    }

    /// Resolve an invite code to its team.
    pub async fn verify_invite(&self, invite_code: &str) -> Result<Team, TeamError> {
        if !is_well_formed_invite_code(invite_code) {
            return Err(TeamError::InviteNotFound);
        }

        self.teams
            .get_by_invite_code(invite_code)
            .await
            .map_err(TeamError::storage("verify_invite"))?
            .ok_or(TeamError::InviteNotFound)
    }

    /// Owner-only edit of the team's attributes.
    pub async fn update_team(
        &self,
        actor_id: Uuid,
        team_id: Uuid,
        attributes: TeamAttributes,
    ) -> Result<Team, TeamError> {
        let mut team = self
            .teams
            .get_by_id(team_id)
            .await
            .map_err(TeamError::storage("update_team"))?
            .ok_or(TeamError::TeamNotFound)?;

        let membership = self
            .memberships
            .get(team_id, actor_id)
            .await
            .map_err(TeamError::storage("update_team"))?;
        if !membership.is_some_and(|m| m.is_owner()) {
            return Err(TeamError::NotOwner);
        }

        team.apply(attributes);
        self.teams
            .update(&team)
            .await
            .map_err(TeamError::storage("update_team"))
    }

    /// Team, event and ordered members for the detail page.
    pub async fn team_details(&self, viewer_id: Uuid, team: Team) -> Result<TeamDetails, TeamError> {
        let event = self
            .events
            .get_by_id(team.event_id)
            .await
            .map_err(TeamError::storage("team_details"))?
            .ok_or(TeamError::EventNotFound)?;

        let rows = self
            .teams
            .roster_rows(RosterFilter::Team(team.id))
            .await
            .map_err(TeamError::storage("team_details"))?;
        let members: Vec<RosterMember> = aggregate(rows)
            .into_iter()
            .next()
            .map(|roster| roster.members)
            .unwrap_or_default();

        let is_member = members.iter().any(|m| m.user_id == viewer_id);
        Ok(TeamDetails {
            team: TeamView::of(team, is_member),
            event,
            members,
        })
    }

    pub async fn team_details_by_id(
        &self,
        viewer_id: Uuid,
        team_id: Uuid,
    ) -> Result<TeamDetails, TeamError> {
        let team = self
            .teams
            .get_by_id(team_id)
            .await
            .map_err(TeamError::storage("team_details"))?
            .ok_or(TeamError::TeamNotFound)?;
        self.team_details(viewer_id, team).await
    }

    /// Rosters of every team the user belongs to.
    pub async fn rosters_for(&self, user_id: Uuid) -> Result<Vec<TeamRoster>, TeamError> {
        self.rosters(RosterFilter::MemberOf(user_id)).await
    }

    /// Rosters of all teams.
    pub async fn browse(&self) -> Result<Vec<TeamRoster>, TeamError> {
        self.rosters(RosterFilter::All).await
    }

    async fn rosters(&self, filter: RosterFilter) -> Result<Vec<TeamRoster>, TeamError> {
        let rows = self
            .teams
            .roster_rows(filter)
            .await
            .map_err(TeamError::storage("list_rosters"))?;
        Ok(aggregate(rows))
    }

    async fn add_member(&self, user_id: Uuid, team: &Team) -> Result<Membership, TeamError> {
        self.ensure_active(user_id).await?;
        self.ensure_signups_open(team.event_id).await?;

        let existing = self
            .memberships
            .get(team.id, user_id)
            .await
            .map_err(TeamError::storage("add_member"))?;
        if existing.is_some() {
            return Err(TeamError::AlreadyMember);
        }

        let membership = Membership::new(team.id, user_id, TeamRole::Member);
        match self.memberships.add(&membership).await {
            Ok(created) => {
                tracing::info!(team_id = %team.id, user_id = %user_id, "Member joined team");
                Ok(created)
            }
            // Lost a race with a concurrent join
            Err(err) if err.violates(MEMBERSHIP_CONSTRAINT) => Err(TeamError::AlreadyMember),
            Err(err) => {
                tracing::error!(
                    operation = "add_member",
                    team_id = %team.id,
                    user_id = %user_id,
                    error = %err,
                    "Failed to persist membership"
                );
                Err(TeamError::storage("add_member")(err))
            }
        }
    }

    async fn ensure_signups_open(&self, event_id: Uuid) -> Result<Event, TeamError> {
        let event = self
            .events
            .get_by_id(event_id)
            .await
            .map_err(TeamError::storage("load_event"))?
            .ok_or(TeamError::EventNotFound)?;

        if !event.status.allows_signups() {
            return Err(TeamError::SignupsClosed);
        }
        Ok(event)
    }

    async fn ensure_active(&self, user_id: Uuid) -> Result<User, TeamError> {
        let user = self
            .users
            .get_by_id(user_id)
            .await
            .map_err(TeamError::storage("load_user"))?;

        match user {
            Some(user) if user.is_active() => Ok(user),
            _ => Err(TeamError::AccountInactive),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{EventStatus, TeamVisibility, UserRole};
    use crate::domain::invite_code::RandomInviteCodes;
    use crate::repository::memory::MemoryStore;
    use std::sync::Mutex;

    /// Hands out a scripted sequence of codes, repeating the last.
    struct ScriptedCodes(Mutex<Vec<String>>);

    impl ScriptedCodes {
        fn new(codes: &[&str]) -> Arc<Self> {
            let mut codes: Vec<String> = codes.iter().map(|c| c.to_string()).collect();
            codes.reverse();
            Arc::new(Self(Mutex::new(codes)))
        }
    }

    impl InviteCodeGenerator for ScriptedCodes {
        fn generate(&self, _team_name: &str) -> String {
            let mut codes = self.0.lock().unwrap();
            if codes.len() > 1 {
                codes.pop().unwrap()
            } else {
                codes[0].clone()
            }
        }
    }

    fn attrs(name: &str, visibility: TeamVisibility) -> TeamAttributes {
        TeamAttributes {
            name: name.to_string(),
            visibility,
            timezone: "UTC".to_string(),
            technologies: "Rust".to_string(),
            availability: "Weekends".to_string(),
            description: "We ship".to_string(),
        }
    }

    fn coordinator(store: &Arc<MemoryStore>) -> MembershipCoordinator {
        MembershipCoordinator::new(&store.repositories(), Arc::new(RandomInviteCodes))
    }

    #[tokio::test]
    async fn test_create_team_adds_owner() {
        let store = MemoryStore::new();
        let event = store.add_event(EventStatus::Signup);
        let ada = store.add_user("ada", UserRole::User);

        let team = coordinator(&store)
            .create_team(ada.id, event.id, attrs("Crabs", TeamVisibility::Public))
            .await
            .unwrap();

        let members = store.members_of(team.id);
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].user_id, ada.id);
        assert_eq!(members[0].team_role, TeamRole::Owner);
        assert!(is_well_formed_invite_code(&team.invite_code));
    }

    #[tokio::test]
    async fn test_create_team_with_closed_signups_persists_nothing() {
        let store = MemoryStore::new();
        let ada = store.add_user("ada", UserRole::User);

        for status in [EventStatus::Planning, EventStatus::Judging, EventStatus::Complete] {
            let event = store.add_event(status);
            let err = coordinator(&store)
                .create_team(ada.id, event.id, attrs("Crabs", TeamVisibility::Public))
                .await
                .unwrap_err();
            assert!(matches!(err, TeamError::SignupsClosed));
        }
        assert_eq!(store.team_count(), 0);
    }

    #[tokio::test]
    async fn test_create_team_for_unknown_event() {
        let store = MemoryStore::new();
        let ada = store.add_user("ada", UserRole::User);

        let err = coordinator(&store)
            .create_team(ada.id, Uuid::new_v4(), attrs("Crabs", TeamVisibility::Public))
            .await
            .unwrap_err();
        assert!(matches!(err, TeamError::EventNotFound));
    }

    #[tokio::test]
    async fn test_invite_code_collision_is_retried() {
        let store = MemoryStore::new();
        let event = store.add_event(EventStatus::Started);
        let ada = store.add_user("ada", UserRole::User);
        let codes = ScriptedCodes::new(&["aaaaaaaaaaaaaa", "aaaaaaaaaaaaaa", "bbbbbbbbbbbbbb"]);
        let coordinator = MembershipCoordinator::new(&store.repositories(), codes);

        let first = coordinator
            .create_team(ada.id, event.id, attrs("Crabs", TeamVisibility::Public))
            .await
            .unwrap();
        let second = coordinator
            .create_team(ada.id, event.id, attrs("Crabs", TeamVisibility::Public))
            .await
            .unwrap();

        assert_eq!(first.invite_code, "aaaaaaaaaaaaaa");
        assert_eq!(second.invite_code, "bbbbbbbbbbbbbb");
        assert_eq!(store.team_count(), 2);
    }

    #[tokio::test]
    async fn test_invite_code_exhaustion() {
        let store = MemoryStore::new();
        let event = store.add_event(EventStatus::Signup);
        let ada = store.add_user("ada", UserRole::User);
        let coordinator =
            MembershipCoordinator::new(&store.repositories(), ScriptedCodes::new(&["cccccccccccccc"]));

        coordinator
            .create_team(ada.id, event.id, attrs("Crabs", TeamVisibility::Public))
            .await
            .unwrap();
        let err = coordinator
            .create_team(ada.id, event.id, attrs("Crabs", TeamVisibility::Public))
            .await
            .unwrap_err();

        assert!(matches!(err, TeamError::InviteCodeExhausted));
        assert_eq!(store.team_count(), 1);
    }

    #[tokio::test]
    async fn test_join_private_team_by_browse_is_forbidden() {
        let store = MemoryStore::new();
        let event = store.add_event(EventStatus::Signup);
        let ada = store.add_user("ada", UserRole::User);
        let grace = store.add_user("grace", UserRole::User);
        let coordinator = coordinator(&store);
        let team = coordinator
            .create_team(ada.id, event.id, attrs("Secret", TeamVisibility::Private))
            .await
            .unwrap();

        let err = coordinator.join_by_browse(grace.id, team.id).await.unwrap_err();

        assert!(matches!(err, TeamError::PrivateTeam));
        assert_eq!(store.members_of(team.id).len(), 1);
    }

    #[tokio::test]
    async fn test_join_public_team_by_browse() {
        let store = MemoryStore::new();
        let event = store.add_event(EventStatus::Signup);
        let ada = store.add_user("ada", UserRole::User);
        let grace = store.add_user("grace", UserRole::User);
        let coordinator = coordinator(&store);
        let team = coordinator
            .create_team(ada.id, event.id, attrs("Crabs", TeamVisibility::Public))
            .await
            .unwrap();

        let membership = coordinator.join_by_browse(grace.id, team.id).await.unwrap();

        assert_eq!(membership.team_role, TeamRole::Member);
        let added: Vec<_> = store
            .members_of(team.id)
            .into_iter()
            .filter(|m| m.user_id == grace.id)
            .collect();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].team_role, TeamRole::Member);
    }

    #[tokio::test]
    async fn test_join_twice_is_already_member() {
        let store = MemoryStore::new();
        let event = store.add_event(EventStatus::Signup);
        let ada = store.add_user("ada", UserRole::User);
        let coordinator = coordinator(&store);
        let team = coordinator
            .create_team(ada.id, event.id, attrs("Crabs", TeamVisibility::Public))
            .await
            .unwrap();

        let err = coordinator.join_by_browse(ada.id, team.id).await.unwrap_err();
        assert!(matches!(err, TeamError::AlreadyMember));
        assert_eq!(store.members_of(team.id).len(), 1);
    }

    #[tokio::test]
    async fn test_join_by_invite_bypasses_visibility() {
        let store = MemoryStore::new();
        let event = store.add_event(EventStatus::Signup);
        let ada = store.add_user("ada", UserRole::User);
        let grace = store.add_user("grace", UserRole::User);
        let coordinator = coordinator(&store);
        let team = coordinator
            .create_team(ada.id, event.id, attrs("Secret", TeamVisibility::Private))
            .await
            .unwrap();

        let membership = coordinator
            .join_by_invite(grace.id, &team.invite_code)
            .await
            .unwrap();
        assert_eq!(membership.team_id, team.id);

        let err = coordinator
            .join_by_invite(grace.id, &team.invite_code)
            .await
            .unwrap_err();
        assert!(matches!(err, TeamError::AlreadyMember));
    }

    #[tokio::test]
    async fn test_unknown_or_malformed_invite() {
        let store = MemoryStore::new();
        let grace = store.add_user("grace", UserRole::User);
        let coordinator = coordinator(&store);

        for code in ["00000000000000", "not-a-code", ""] {
            let err = coordinator.join_by_invite(grace.id, code).await.unwrap_err();
            assert!(matches!(err, TeamError::InviteNotFound));
        }
    }

    #[tokio::test]
    async fn test_banned_user_cannot_join() {
        let store = MemoryStore::new();
        let event = store.add_event(EventStatus::Signup);
        let ada = store.add_user("ada", UserRole::User);
        let grace = store.add_user("grace", UserRole::User);
        store
            .set_account_status(grace.id, crate::domain::entities::AccountStatus::Banned)
            .await
            .unwrap();
        let coordinator = coordinator(&store);
        let team = coordinator
            .create_team(ada.id, event.id, attrs("Crabs", TeamVisibility::Public))
            .await
            .unwrap();

        let err = coordinator.join_by_browse(grace.id, team.id).await.unwrap_err();
        assert!(matches!(err, TeamError::AccountInactive));
    }

    #[tokio::test]
    async fn test_update_team_is_owner_only() {
        let store = MemoryStore::new();
        let event = store.add_event(EventStatus::Signup);
        let ada = store.add_user("ada", UserRole::User);
        let grace = store.add_user("grace", UserRole::User);
        let coordinator = coordinator(&store);
        let team = coordinator
            .create_team(ada.id, event.id, attrs("Crabs", TeamVisibility::Public))
            .await
            .unwrap();
        coordinator.join_by_browse(grace.id, team.id).await.unwrap();

        let err = coordinator
            .update_team(grace.id, team.id, attrs("Hijacked", TeamVisibility::Public))
            .await
            .unwrap_err();
        assert!(matches!(err, TeamError::NotOwner));

        let updated = coordinator
            .update_team(ada.id, team.id, attrs("Crustaceans", TeamVisibility::Private))
            .await
            .unwrap();
        assert_eq!(updated.name, "Crustaceans");
        assert!(updated.is_private());
        assert_eq!(updated.invite_code, team.invite_code);
    }

    #[tokio::test]
    async fn test_details_hide_invite_code_from_non_members() {
        let store = MemoryStore::new();
        let event = store.add_event(EventStatus::Signup);
        let ada = store.add_user("ada", UserRole::User);
        let rob = store.add_user("rob", UserRole::User);
        let coordinator = coordinator(&store);
        let team = coordinator
            .create_team(ada.id, event.id, attrs("Crabs", TeamVisibility::Public))
            .await
            .unwrap();

        let own = coordinator.team_details_by_id(ada.id, team.id).await.unwrap();
        assert_eq!(own.team.invite_code.as_deref(), Some(team.invite_code.as_str()));
        assert_eq!(own.event.id, event.id);
        assert_eq!(own.members.len(), 1);

        let other = coordinator.team_details_by_id(rob.id, team.id).await.unwrap();
        assert!(other.team.invite_code.is_none());
        let json = serde_json::to_value(&other).unwrap();
        assert!(json["team"].get("inviteCode").is_none());
        assert_eq!(json["team"]["name"], "Crabs");
    }

    #[tokio::test]
    async fn test_rosters_for_member_and_browse() {
        let store = MemoryStore::new();
        let event = store.add_event(EventStatus::Signup);
        let ada = store.add_user("ada", UserRole::User);
        let rob = store.add_user("rob", UserRole::User);
        let coordinator = coordinator(&store);
        let crabs = coordinator
            .create_team(ada.id, event.id, attrs("Crabs", TeamVisibility::Public))
            .await
            .unwrap();
        coordinator
            .create_team(rob.id, event.id, attrs("Gophers", TeamVisibility::Public))
            .await
            .unwrap();
        coordinator.join_by_browse(rob.id, crabs.id).await.unwrap();

        assert_eq!(coordinator.rosters_for(ada.id).await.unwrap().len(), 1);
        assert_eq!(coordinator.rosters_for(rob.id).await.unwrap().len(), 2);

        let all = coordinator.browse().await.unwrap();
        assert_eq!(all.len(), 2);
        let crabs_roster = all.iter().find(|r| r.team.id == crabs.id).unwrap();
        assert_eq!(crabs_roster.members.len(), 2);
    }
}
