//! Domain entities for the CodeJam teams domain
//!
//! Users, events, teams and memberships as stored in Postgres. Enum columns
//! map onto Postgres enum types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Admin,
    #[default]
    User,
}

/// Account status set by moderators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "account_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountStatus {
    #[default]
    Active,
    Banned,
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountStatus::Active => write!(f, "ACTIVE"),
            AccountStatus::Banned => write!(f, "BANNED"),
        }
    }
}

/// User entity
///
/// Unique on (`service_name`, `service_user_id`). `service_user_name` tracks
/// the provider's name for the user; `display_name` is the editable one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub service_name: String,
    pub service_user_id: String,
    pub service_user_name: String,
    pub role: UserRole,
    pub display_name: String,
    pub avatar_url: String,
    pub account_status: AccountStatus,
    pub lock_display_name: bool,
    pub created_on: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn is_active(&self) -> bool {
        self.account_status == AccountStatus::Active
    }
}

/// Event lifecycle phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum EventStatus {
    Planning,
    Signup,
    Started,
    Judging,
    Complete,
}

impl EventStatus {
    /// Teams can be created and joined only in these phases
    pub fn allows_signups(&self) -> bool {
        matches!(self, EventStatus::Signup | EventStatus::Started)
    }
}

/// Event entity (read-only here)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub status: EventStatus,
    pub created_on: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "team_visibility", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TeamVisibility {
    #[default]
    Public,
    Private,
}

/// Editable team attributes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TeamAttributes {
    pub name: String,
    pub visibility: TeamVisibility,
    pub timezone: String,
    pub technologies: String,
    pub availability: String,
    pub description: String,
}

/// Team entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub visibility: TeamVisibility,
    pub timezone: String,
    pub technologies: String,
    pub availability: String,
    pub description: String,
    pub created_on: DateTime<Utc>,
    /// Fixed at creation
    pub invite_code: String,
}

impl Team {
    pub fn new(event_id: Uuid, attributes: TeamAttributes, invite_code: String) -> Self {
        Team {
            id: Uuid::new_v4(),
            event_id,
            name: attributes.name,
            visibility: attributes.visibility,
            timezone: attributes.timezone,
            technologies: attributes.technologies,
            availability: attributes.availability,
            description: attributes.description,
            created_on: Utc::now(),
            invite_code,
        }
    }

    /// Apply edited attributes; id, event and invite code are untouched.
    pub fn apply(&mut self, attributes: TeamAttributes) {
        self.name = attributes.name;
        self.visibility = attributes.visibility;
        self.timezone = attributes.timezone;
        self.technologies = attributes.technologies;
        self.availability = attributes.availability;
        self.description = attributes.description;
    }

    pub fn is_private(&self) -> bool {
        self.visibility == TeamVisibility::Private
    }
}

/// Roles within a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "team_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    Owner,
    Member,
}

impl std::fmt::Display for TeamRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeamRole::Owner => write!(f, "owner"),
            TeamRole::Member => write!(f, "member"),
        }
    }
}

/// Membership entity, unique on (`team_id`, `user_id`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub team_role: TeamRole,
    pub created_on: DateTime<Utc>,
}

impl Membership {
    pub fn new(team_id: Uuid, user_id: Uuid, team_role: TeamRole) -> Self {
        Membership {
            team_id,
            user_id,
            team_role,
            created_on: Utc::now(),
        }
    }

    pub fn is_owner(&self) -> bool {
        self.team_role == TeamRole::Owner
    }
}
