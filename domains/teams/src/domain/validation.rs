//! Validation helpers and constants for API handlers

use regex::Regex;

/// Longest accepted team or display name
pub const MAX_NAME_LENGTH: u64 = 100;

/// Longest accepted free-text team field
pub const MAX_TEXT_LENGTH: u64 = 2000;

lazy_static::lazy_static! {
    /// Invite codes are 14 lowercase hex characters
    pub static ref INVITE_CODE_REGEX: Regex = Regex::new(r"^[0-9a-f]{14}$").unwrap();
}

/// Whether `code` has the shape of an invite code
pub fn is_well_formed_invite_code(code: &str) -> bool {
    INVITE_CODE_REGEX.is_match(code)
}

/// Trim a user-supplied name; `None` if nothing is left.
pub fn normalize_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
