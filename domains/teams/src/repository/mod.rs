//! Repository implementations for the Teams domain
//!
//! Each store is a trait so the services can run against Postgres in
//! production and against in-memory stores in tests.

pub mod events;
pub mod memberships;
#[cfg(test)]
pub mod memory;
pub mod teams;
pub mod transactions;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use codejam_auth::ExternalIdentity;
use codejam_common::RepositoryError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{AccountStatus, Event, Membership, Team, User};
use crate::domain::roster::RosterRow;

pub use events::EventRepository;
pub use memberships::MembershipRepository;
pub use teams::TeamRepository;
pub use transactions::{create_membership_tx, create_team_tx};
pub use users::{UserAccounts, UserRepository};

/// Unique constraint on `teams.invite_code`
pub const INVITE_CODE_CONSTRAINT: &str = "teams_invite_code_key";

/// Primary key of `team_members`, one role per (team, user)
pub const MEMBERSHIP_CONSTRAINT: &str = "team_members_pkey";

type RepoResult<T> = Result<T, RepositoryError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> RepoResult<Option<User>>;

    /// All users, admins first, then by provider user name
    async fn list_all(&self) -> RepoResult<Vec<User>>;

    /// Insert a user for a new identity, or refresh the provider name and
    /// avatar of an existing one. The editable display name is only set on
    /// insert.
    async fn upsert_identity(&self, identity: &ExternalIdentity) -> RepoResult<User>;

    async fn update_display_name(&self, id: Uuid, display_name: &str) -> RepoResult<User>;

    async fn set_account_status(&self, id: Uuid, status: AccountStatus) -> RepoResult<User>;

    async fn set_display_name_lock(&self, id: Uuid, locked: bool) -> RepoResult<User>;
}

/// Which teams a roster query covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterFilter {
    All,
    Team(Uuid),
    /// Teams the given user belongs to
    MemberOf(Uuid),
}

#[async_trait]
pub trait TeamStore: Send + Sync {
    /// Persist a team and its owner membership atomically.
    async fn create_with_owner(&self, team: &Team, owner: &Membership) -> RepoResult<Team>;

    async fn get_by_id(&self, id: Uuid) -> RepoResult<Option<Team>>;

    async fn get_by_invite_code(&self, invite_code: &str) -> RepoResult<Option<Team>>;

    /// Save edited attributes. The invite code is never rewritten.
    async fn update(&self, team: &Team) -> RepoResult<Team>;

    /// Flat (team, member) rows ordered by team creation, then member join time.
    async fn roster_rows(&self, filter: RosterFilter) -> RepoResult<Vec<RosterRow>>;
}

#[async_trait]
pub trait MembershipStore: Send + Sync {
    async fn get(&self, team_id: Uuid, user_id: Uuid) -> RepoResult<Option<Membership>>;

    async fn add(&self, membership: &Membership) -> RepoResult<Membership>;
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> RepoResult<Option<Event>>;
}

/// Combined repository access for the Teams domain
#[derive(Clone)]
pub struct TeamsRepositories {
    pub users: Arc<dyn UserStore>,
    pub teams: Arc<dyn TeamStore>,
    pub memberships: Arc<dyn MembershipStore>,
    pub events: Arc<dyn EventStore>,
}

impl TeamsRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            teams: Arc::new(TeamRepository::new(pool.clone())),
            memberships: Arc::new(MembershipRepository::new(pool.clone())),
            events: Arc::new(EventRepository::new(pool)),
        }
    }

    /// Bridge for the login flow to record accounts in the user store.
    pub fn accounts(&self) -> UserAccounts {
        UserAccounts::new(self.users.clone())
    }
}
