//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Where server-side sessions are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStoreKind {
    Postgres,
    /// Process memory; for single-node local runs
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database connection URL (PostgreSQL)
    pub database_url: String,

    /// Identity provider, `github` or `discord`
    pub oauth_provider: String,
    pub oauth_client_id: String,
    pub oauth_client_secret: String,
    pub oauth_redirect_url: String,
    /// Empty means the provider's default scopes
    pub oauth_scopes: Vec<String>,
    /// Only redirects under this path survive a login round trip
    pub oauth_return_prefix: String,
    /// Accepted redirects are rewritten to `/#<path>` for the hash-routed frontend
    pub oauth_fragment_routing: bool,
    pub debug_login: bool,

    /// Session cookie and server-side session lifetime
    pub session_cookie_name: String,
    pub session_ttl_hours: i64,
    pub session_cookie_secure: bool,
    pub session_store: SessionStoreKind,

    /// Upper bound for each identity provider request
    pub http_timeout_secs: u64,

    /// Runtime configuration
    pub rust_log: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let debug_login = parse_bool(get("DEBUG_LOGIN"), false).context("DEBUG_LOGIN")?;

        // Debug login never talks to the provider, so credentials become optional.
        let oauth_required = |key: &str| -> Result<String> {
            match get(key) {
                Some(value) => Ok(value),
                None if debug_login => Ok(String::new()),
                None => Err(anyhow!("{} is required", key)),
            }
        };

        let config = Self {
            database_url: get("DATABASE_URL").ok_or_else(|| anyhow!("DATABASE_URL is required"))?,

            oauth_provider: get("OAUTH_PROVIDER")
                .unwrap_or_else(|| "discord".to_string())
                .to_lowercase(),
            oauth_client_id: oauth_required("OAUTH_CLIENT_ID")?,
            oauth_client_secret: oauth_required("OAUTH_CLIENT_SECRET")?,
            oauth_redirect_url: oauth_required("OAUTH_REDIRECT_URL")?,
            oauth_scopes: get("OAUTH_SCOPES")
                .map(|raw| parse_list(&raw))
                .unwrap_or_default(),
            oauth_return_prefix: get("OAUTH_RETURN_PREFIX").unwrap_or_else(|| "/oauth".to_string()),
            oauth_fragment_routing: parse_bool(get("OAUTH_FRAGMENT_ROUTING"), true)
                .context("OAUTH_FRAGMENT_ROUTING")?,
            debug_login,

            session_cookie_name: get("SESSION_COOKIE_NAME")
                .unwrap_or_else(|| "codejam_session".to_string()),
            session_ttl_hours: parse_or(get("SESSION_TTL_HOURS"), 168)
                .context("SESSION_TTL_HOURS")?,
            session_cookie_secure: parse_bool(get("SESSION_COOKIE_SECURE"), true)
                .context("SESSION_COOKIE_SECURE")?,
            session_store: parse_session_store(get("SESSION_STORE")).context("SESSION_STORE")?,

            http_timeout_secs: parse_or(get("HTTP_TIMEOUT_SECS"), 10)
                .context("HTTP_TIMEOUT_SECS")?,

            rust_log: get("RUST_LOG").unwrap_or_else(|| "codejam=debug,tower_http=info".to_string()),
            port: parse_or(get("PORT"), 3000).context("PORT")?,
        };

        Ok(config)
    }
}

fn parse_bool(value: Option<String>, default: bool) -> Result<bool> {
    match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(anyhow!("expected a boolean, got {:?}", other)),
    }
}

fn parse_session_store(value: Option<String>) -> Result<SessionStoreKind> {
    match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("postgres") => Ok(SessionStoreKind::Postgres),
        Some("memory") => Ok(SessionStoreKind::Memory),
        Some(other) => Err(anyhow!("expected postgres or memory, got {:?}", other)),
    }
}

fn parse_or<T>(value: Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => Ok(raw.trim().parse()?),
        None => Ok(default),
    }
}

/// Split a comma- or whitespace-separated list, dropping empty entries.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
