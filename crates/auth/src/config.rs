//! Authentication configuration

use std::time::Duration;

use codejam_common::{Config, Error, Result};

use crate::provider::Provider;

/// Session cookie settings
#[derive(Debug, Clone)]
pub struct SessionCookieConfig {
    pub name: String,
    pub ttl_hours: i64,
    pub secure: bool,
}

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub provider: Provider,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub scopes: Vec<String>,
    pub return_prefix: String,
    pub fragment_routing: bool,
    pub debug_login: bool,
    pub http_timeout: Duration,
    pub session: SessionCookieConfig,
}

impl AuthConfig {
    /// Derive the auth settings from the process configuration.
    ///
    /// An unknown provider name is a startup error.
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = Provider::from_name(&config.oauth_provider).ok_or_else(|| {
            Error::Validation(format!(
                "Unsupported OAUTH_PROVIDER {:?}; expected github or discord",
                config.oauth_provider
            ))
        })?;

        let scopes = if config.oauth_scopes.is_empty() {
            provider
                .default_scopes()
                .iter()
                .map(|s| s.to_string())
                .collect()
        } else {
            config.oauth_scopes.clone()
        };

        Ok(Self {
            provider,
            client_id: config.oauth_client_id.clone(),
            client_secret: config.oauth_client_secret.clone(),
            redirect_url: config.oauth_redirect_url.clone(),
            scopes,
            return_prefix: config.oauth_return_prefix.clone(),
            fragment_routing: config.oauth_fragment_routing,
            debug_login: config.debug_login,
            http_timeout: Duration::from_secs(config.http_timeout_secs),
            session: SessionCookieConfig {
                name: config.session_cookie_name.clone(),
                ttl_hours: config.session_ttl_hours,
                secure: config.session_cookie_secure,
            },
        })
    }
}

#[cfg(test)]
pub(crate) fn test_config(provider: Provider) -> AuthConfig {
    AuthConfig {
        provider,
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        redirect_url: "http://localhost:3000/oauth/callback".to_string(),
        scopes: vec!["identify".to_string()],
        return_prefix: "/oauth".to_string(),
        fragment_routing: true,
        debug_login: false,
        http_timeout: Duration::from_secs(2),
        session: SessionCookieConfig {
            name: "codejam_session".to_string(),
            ttl_hours: 1,
            secure: false,
        },
    }
}
