//! Teams domain: users, events, teams, memberships, invite codes, rosters,
//! moderation

pub mod api;
pub mod domain;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::coordinator::{MembershipCoordinator, TeamDetails, TeamView};
pub use domain::entities::*;
pub use domain::error::TeamError;
pub use domain::invite_code::{InviteCodeGenerator, RandomInviteCodes};
pub use domain::moderation::Moderation;
pub use domain::roster::{aggregate, RosterMember, RosterRow, TeamRoster, TeamSummary};

// Re-export repository types
pub use repository::{
    create_membership_tx, create_team_tx, EventRepository, EventStore, MembershipRepository,
    MembershipStore, RosterFilter, TeamRepository, TeamStore, TeamsRepositories, UserAccounts,
    UserRepository, UserStore,
};

// Re-export API types
pub use api::routes;
pub use api::TeamsState;
