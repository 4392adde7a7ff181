//! Teams domain layer: entities, invite codes, rosters, membership rules, moderation

pub mod coordinator;
pub mod entities;
pub mod error;
pub mod invite_code;
pub mod moderation;
pub mod roster;
pub mod validation;
