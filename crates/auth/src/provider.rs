//! Identity providers and profile normalization
//!
//! Every supported provider describes its own OAuth endpoints and knows how
//! to turn its profile payload into an [`ExternalIdentity`]. The provider is
//! chosen once at startup; the set is closed.

use serde::{Deserialize, Serialize};

const DISCORD_AVATAR_BASE: &str = "https://cdn.discordapp.com/avatars";

/// Supported OAuth identity providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    GitHub,
    Discord,
}

/// OAuth endpoints for one provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub authorize_url: String,
    pub token_url: String,
    pub profile_url: String,
}

/// A provider user, normalized across providers.
///
/// Produced per OAuth callback and consumed immediately to upsert a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIdentity {
    pub provider: Provider,
    pub provider_user_id: String,
    pub display_name: String,
    /// Empty when the provider has no avatar for the user
    pub avatar_url: String,
}

impl ExternalIdentity {
    /// Fixed identity used by the debug login.
    pub fn debug() -> Self {
        Self {
            provider: Provider::Discord,
            provider_user_id: "0".to_string(),
            display_name: "DebugCow".to_string(),
            avatar_url: String::new(),
        }
    }
}

impl Provider {
    /// Look up a provider by its configured name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "github" => Some(Provider::GitHub),
            "discord" => Some(Provider::Discord),
            _ => None,
        }
    }

    /// Name stored alongside provider user ids
    pub fn name(&self) -> &'static str {
        match self {
            Provider::GitHub => "github",
            Provider::Discord => "discord",
        }
    }

    pub fn endpoints(&self) -> ProviderEndpoints {
        match self {
            Provider::GitHub => ProviderEndpoints {
                authorize_url: "https://github.com/login/oauth/authorize".to_string(),
                token_url: "https://github.com/login/oauth/access_token".to_string(),
                profile_url: "https://api.github.com/user".to_string(),
            },
            Provider::Discord => ProviderEndpoints {
                authorize_url: "https://discord.com/oauth2/authorize".to_string(),
                token_url: "https://discord.com/api/oauth2/token".to_string(),
                profile_url: "https://discord.com/api/users/@me".to_string(),
            },
        }
    }

    pub fn default_scopes(&self) -> &'static [&'static str] {
        match self {
            Provider::GitHub => &["read:user"],
            Provider::Discord => &["identify"],
        }
    }

    /// Normalize a profile response body.
    ///
    /// Returns `None` when the payload carries no usable user id.
    pub fn parse_profile(&self, body: &serde_json::Value) -> Option<ExternalIdentity> {
        let identity = match self {
            Provider::GitHub => {
                let profile: GitHubProfile = serde_json::from_value(body.clone()).ok()?;
                ExternalIdentity {
                    provider: *self,
                    provider_user_id: profile.id.to_string(),
                    display_name: first_present([profile.name, profile.login]),
                    avatar_url: profile.avatar_url.unwrap_or_default(),
                }
            }
            Provider::Discord => {
                let profile: DiscordProfile = serde_json::from_value(body.clone()).ok()?;
                let avatar_url = match profile.avatar.filter(|hash| !hash.is_empty()) {
                    Some(hash) => format!("{}/{}/{}.png", DISCORD_AVATAR_BASE, profile.id, hash),
                    None => String::new(),
                };
                ExternalIdentity {
                    provider: *self,
                    display_name: first_present([profile.global_name, profile.username]),
                    provider_user_id: profile.id,
                    avatar_url,
                }
            }
        };

        if identity.provider_user_id.is_empty() {
            return None;
        }
        Some(identity)
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolve a raw profile payload for a provider given by name.
///
/// Unknown provider names yield no identity.
pub fn resolve_profile(provider_name: &str, body: &serde_json::Value) -> Option<ExternalIdentity> {
    Provider::from_name(provider_name)?.parse_profile(body)
}

fn first_present<const N: usize>(candidates: [Option<String>; N]) -> String {
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
        .unwrap_or_default()
}

#[derive(Deserialize)]
struct GitHubProfile {
    id: u64,
    login: Option<String>,
    name: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Deserialize)]
struct DiscordProfile {
    id: String,
    username: Option<String>,
    global_name: Option<String>,
    avatar: Option<String>,
}
