//! In-memory stores for service and router tests
//!
//! Emulates the unique constraints the Postgres schema enforces so the
//! services see the same errors.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use codejam_auth::ExternalIdentity;
use codejam_common::RepositoryError;
use uuid::Uuid;

use super::{
    EventStore, MembershipStore, RosterFilter, TeamStore, TeamsRepositories, UserStore,
    INVITE_CODE_CONSTRAINT, MEMBERSHIP_CONSTRAINT,
};
use crate::domain::entities::{
    AccountStatus, Event, EventStatus, Membership, Team, User, UserRole,
};
use crate::domain::roster::RosterRow;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    events: Vec<Event>,
    teams: Vec<Team>,
    members: Vec<Membership>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn repositories(self: &Arc<Self>) -> TeamsRepositories {
        TeamsRepositories {
            users: self.clone(),
            teams: self.clone(),
            memberships: self.clone(),
            events: self.clone(),
        }
    }

    pub fn add_event(&self, status: EventStatus) -> Event {
        let event = Event {
            id: Uuid::new_v4(),
            title: "Code Jam".to_string(),
            status,
            created_on: Utc::now(),
        };
        self.lock().events.push(event.clone());
        event
    }

    pub fn add_user(&self, name: &str, role: UserRole) -> User {
        let user = User {
            id: Uuid::new_v4(),
            service_name: "discord".to_string(),
            service_user_id: format!("{}-id", name),
            service_user_name: name.to_string(),
            role,
            display_name: name.to_string(),
            avatar_url: String::new(),
            account_status: AccountStatus::Active,
            lock_display_name: false,
            created_on: Utc::now(),
        };
        self.lock().users.push(user.clone());
        user
    }

    pub fn team_count(&self) -> usize {
        self.lock().teams.len()
    }

    pub fn members_of(&self, team_id: Uuid) -> Vec<Membership> {
        self.lock()
            .members
            .iter()
            .filter(|m| m.team_id == team_id)
            .cloned()
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn update_user<F>(&self, id: Uuid, apply: F) -> Result<User, RepositoryError>
    where
        F: FnOnce(&mut User),
    {
        let mut tables = self.lock();
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(RepositoryError::NotFound)?;
        apply(user);
        Ok(user.clone())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let mut users = self.lock().users.clone();
        users.sort_by(|a, b| {
            b.is_admin()
                .cmp(&a.is_admin())
                .then_with(|| a.service_user_name.cmp(&b.service_user_name))
        });
        Ok(users)
    }

    async fn upsert_identity(&self, identity: &ExternalIdentity) -> Result<User, RepositoryError> {
        let mut tables = self.lock();
        let provider = identity.provider.name();
        if let Some(user) = tables.users.iter_mut().find(|u| {
            u.service_name == provider && u.service_user_id == identity.provider_user_id
        }) {
            user.service_user_name = identity.display_name.clone();
            user.avatar_url = identity.avatar_url.clone();
            return Ok(user.clone());
        }

        let user = User {
            id: Uuid::new_v4(),
            service_name: provider.to_string(),
            service_user_id: identity.provider_user_id.clone(),
            service_user_name: identity.display_name.clone(),
            role: UserRole::User,
            display_name: identity.display_name.clone(),
            avatar_url: identity.avatar_url.clone(),
            account_status: AccountStatus::Active,
            lock_display_name: false,
            created_on: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn update_display_name(
        &self,
        id: Uuid,
        display_name: &str,
    ) -> Result<User, RepositoryError> {
        self.update_user(id, |u| u.display_name = display_name.to_string())
    }

    async fn set_account_status(
        &self,
        id: Uuid,
        status: AccountStatus,
    ) -> Result<User, RepositoryError> {
        self.update_user(id, |u| u.account_status = status)
    }

    async fn set_display_name_lock(&self, id: Uuid, locked: bool) -> Result<User, RepositoryError> {
        self.update_user(id, |u| u.lock_display_name = locked)
    }
}

#[async_trait]
impl TeamStore for MemoryStore {
    async fn create_with_owner(
        &self,
        team: &Team,
        owner: &Membership,
    ) -> Result<Team, RepositoryError> {
        let mut tables = self.lock();
        if tables.teams.iter().any(|t| t.invite_code == team.invite_code) {
            return Err(RepositoryError::UniqueViolation(
                INVITE_CODE_CONSTRAINT.to_string(),
            ));
        }
        tables.teams.push(team.clone());
        tables.members.push(owner.clone());
        Ok(team.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Team>, RepositoryError> {
        Ok(self.lock().teams.iter().find(|t| t.id == id).cloned())
    }

    async fn get_by_invite_code(&self, invite_code: &str) -> Result<Option<Team>, RepositoryError> {
        Ok(self
            .lock()
            .teams
            .iter()
            .find(|t| t.invite_code == invite_code)
            .cloned())
    }

    async fn update(&self, team: &Team) -> Result<Team, RepositoryError> {
        let mut tables = self.lock();
        let stored = tables
            .teams
            .iter_mut()
            .find(|t| t.id == team.id)
            .ok_or(RepositoryError::NotFound)?;
        let invite_code = stored.invite_code.clone();
        *stored = team.clone();
        stored.invite_code = invite_code;
        Ok(stored.clone())
    }

    async fn roster_rows(&self, filter: RosterFilter) -> Result<Vec<RosterRow>, RepositoryError> {
        let tables = self.lock();
        let mut teams: Vec<&Team> = tables
            .teams
            .iter()
            .filter(|t| match filter {
                RosterFilter::All => true,
                RosterFilter::Team(id) => t.id == id,
                RosterFilter::MemberOf(user_id) => tables
                    .members
                    .iter()
                    .any(|m| m.team_id == t.id && m.user_id == user_id),
            })
            .collect();
        teams.sort_by_key(|t| (t.created_on, t.id));

        let mut rows = Vec::new();
        for team in teams {
            let mut members: Vec<&Membership> =
                tables.members.iter().filter(|m| m.team_id == team.id).collect();
            members.sort_by_key(|m| m.created_on);
            for member in members {
                let Some(user) = tables.users.iter().find(|u| u.id == member.user_id) else {
                    continue;
                };
                rows.push(RosterRow {
                    id: team.id,
                    event_id: team.event_id,
                    name: team.name.clone(),
                    visibility: team.visibility,
                    timezone: team.timezone.clone(),
                    technologies: team.technologies.clone(),
                    availability: team.availability.clone(),
                    description: team.description.clone(),
                    created_on: team.created_on,
                    user_id: user.id,
                    display_name: user.display_name.clone(),
                    avatar_url: user.avatar_url.clone(),
                    service_user_id: user.service_user_id.clone(),
                    team_role: member.team_role,
                });
            }
        }
        Ok(rows)
    }
}

#[async_trait]
impl MembershipStore for MemoryStore {
    async fn get(&self, team_id: Uuid, user_id: Uuid) -> Result<Option<Membership>, RepositoryError> {
        Ok(self
            .lock()
            .members
            .iter()
            .find(|m| m.team_id == team_id && m.user_id == user_id)
            .cloned())
    }

    async fn add(&self, membership: &Membership) -> Result<Membership, RepositoryError> {
        let mut tables = self.lock();
        if tables
            .members
            .iter()
            .any(|m| m.team_id == membership.team_id && m.user_id == membership.user_id)
        {
            return Err(RepositoryError::UniqueViolation(
                MEMBERSHIP_CONSTRAINT.to_string(),
            ));
        }
        tables.members.push(membership.clone());
        Ok(membership.clone())
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Event>, RepositoryError> {
        Ok(self.lock().events.iter().find(|e| e.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{TeamAttributes, TeamRole};
    use codejam_auth::Provider;

    fn identity(id: &str, name: &str) -> ExternalIdentity {
        ExternalIdentity {
            provider: Provider::Discord,
            provider_user_id: id.to_string(),
            display_name: name.to_string(),
            avatar_url: String::new(),
        }
    }

    #[tokio::test]
    async fn test_upsert_keeps_edited_display_name() {
        let store = MemoryStore::new();
        let user = UserStore::upsert_identity(&*store, &identity("1", "ada")).await.unwrap();
        store.update_display_name(user.id, "Ada L.").await.unwrap();

        let again = UserStore::upsert_identity(&*store, &identity("1", "ada_renamed"))
            .await
            .unwrap();
        assert_eq!(again.id, user.id);
        assert_eq!(again.display_name, "Ada L.");
        assert_eq!(again.service_user_name, "ada_renamed");
    }

    #[tokio::test]
    async fn test_duplicate_invite_code_inserts_nothing() {
        let store = MemoryStore::new();
        let event = store.add_event(EventStatus::Signup);
        let owner = store.add_user("ada", UserRole::User);

        let first = Team::new(event.id, TeamAttributes::default(), "aaaaaaaaaaaaaa".into());
        let second = Team::new(event.id, TeamAttributes::default(), "aaaaaaaaaaaaaa".into());
        store
            .create_with_owner(&first, &Membership::new(first.id, owner.id, TeamRole::Owner))
            .await
            .unwrap();

        let err = store
            .create_with_owner(&second, &Membership::new(second.id, owner.id, TeamRole::Owner))
            .await
            .unwrap_err();
        assert!(err.violates(INVITE_CODE_CONSTRAINT));
        assert_eq!(store.team_count(), 1);
        assert!(store.members_of(second.id).is_empty());
    }
}
