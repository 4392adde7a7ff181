//! Invite code generation
//!
//! A code is the first seven bytes of SHA-256 over the team name and a
//! fresh random value, hex-encoded. Uniqueness is enforced by the
//! `teams_invite_code_key` constraint; callers retry on collision.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Digest bytes kept in each code (two hex characters per byte)
pub const INVITE_CODE_BYTES: usize = 7;

pub trait InviteCodeGenerator: Send + Sync {
    fn generate(&self, team_name: &str) -> String;
}

/// Production generator drawing from the thread-local RNG
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomInviteCodes;

impl InviteCodeGenerator for RandomInviteCodes {
    fn generate(&self, team_name: &str) -> String {
        let salt: i64 = rand::thread_rng().gen_range(0..i64::MAX);
        invite_code_for(team_name, salt)
    }
}

/// Deterministic code for a name and salt
pub fn invite_code_for(team_name: &str, salt: i64) -> String {
    let digest = Sha256::digest(format!("{}.{}", team_name, salt).as_bytes());
    hex::encode(&digest[..INVITE_CODE_BYTES])
}
