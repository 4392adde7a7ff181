//! OAuth 2.0 authorization-code client
//!
//! One client is built per process for the configured provider. The
//! authorize URL and the code exchange go through `oauth2`; the profile
//! fetch is a plain bearer GET. Every request is bounded by the configured
//! timeout and redirects are never followed.

use async_trait::async_trait;
use oauth2::basic::{BasicClient, BasicRequestTokenError};
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet,
    EndpointSet, HttpClientError, RedirectUrl, RequestTokenError, Scope, TokenResponse, TokenUrl,
};
use reqwest::{header::ACCEPT, redirect, Url};

use crate::config::AuthConfig;
use crate::provider::{ExternalIdentity, Provider, ProviderEndpoints};

/// Errors talking to the identity provider
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("Invalid provider endpoint {url}: {reason}")]
    Endpoint { url: String, reason: String },

    #[error("Identity provider request failed: {0}")]
    Request(String),

    #[error("Identity provider returned {status}: {body}")]
    Response { status: u16, body: String },

    #[error("Identity provider returned an unusable payload: {0}")]
    Payload(String),
}

/// The three provider interactions a login needs.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn provider(&self) -> Provider;

    /// Provider URL the browser is sent to, carrying `state` for CSRF protection.
    fn authorization_url(&self, state: &str) -> String;

    /// Exchange an authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> Result<String, OAuthError>;

    /// Fetch the profile behind an access token. `None` when the profile
    /// cannot be resolved to an identity.
    async fn fetch_identity(&self, access_token: &str)
        -> Result<Option<ExternalIdentity>, OAuthError>;
}

type ConfiguredClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// OAuth client for one provider
pub struct OAuthClient {
    http: reqwest::Client,
    oauth: ConfiguredClient,
    provider: Provider,
    profile_url: Url,
    scopes: Vec<String>,
}

impl OAuthClient {
    /// Create a client for the configured provider's public endpoints.
    pub fn new(config: &AuthConfig) -> Result<Self, OAuthError> {
        Self::with_endpoints(config, config.provider.endpoints())
    }

    /// Create a client against explicit endpoints.
    pub fn with_endpoints(
        config: &AuthConfig,
        endpoints: ProviderEndpoints,
    ) -> Result<Self, OAuthError> {
        let http = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(config.http_timeout)
            .connect_timeout(config.http_timeout)
            .user_agent(concat!("codejam/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| OAuthError::Request(e.to_string()))?;

        // GitHub only reads client credentials from the form body.
        let mut oauth = BasicClient::new(ClientId::new(config.client_id.clone()))
            .set_client_secret(ClientSecret::new(config.client_secret.clone()))
            .set_auth_type(AuthType::RequestBody)
            .set_auth_uri(endpoint(&endpoints.authorize_url, AuthUrl::new)?)
            .set_token_uri(endpoint(&endpoints.token_url, TokenUrl::new)?);
        // Debug-login deployments may run without a registered callback.
        if !config.redirect_url.is_empty() {
            oauth = oauth.set_redirect_uri(endpoint(&config.redirect_url, RedirectUrl::new)?);
        }

        Ok(Self {
            http,
            oauth,
            provider: config.provider,
            profile_url: endpoint(&endpoints.profile_url, |url| Url::parse(&url))?,
            scopes: config.scopes.clone(),
        })
    }
}

fn endpoint<T>(
    url: &str,
    parse: impl FnOnce(String) -> Result<T, oauth2::url::ParseError>,
) -> Result<T, OAuthError> {
    parse(url.to_string()).map_err(|e| OAuthError::Endpoint {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

fn token_error(err: BasicRequestTokenError<HttpClientError<reqwest::Error>>) -> OAuthError {
    match err {
        RequestTokenError::ServerResponse(response) => OAuthError::Payload(response.to_string()),
        RequestTokenError::Request(e) => OAuthError::Request(e.to_string()),
        // GitHub reports a bad code as 200 with an `error` body.
        RequestTokenError::Parse(_, body) => {
            OAuthError::Payload(String::from_utf8_lossy(&body).into_owned())
        }
        RequestTokenError::Other(reason) => OAuthError::Payload(reason),
    }
}

async fn error_response(response: reqwest::Response) -> OAuthError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read response body".to_string());
    OAuthError::Response { status, body }
}

#[async_trait]
impl IdentityProvider for OAuthClient {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn authorization_url(&self, state: &str) -> String {
        let (url, _) = self
            .oauth
            .authorize_url(|| CsrfToken::new(state.to_string()))
            .add_scopes(self.scopes.iter().cloned().map(Scope::new))
            .url();
        url.to_string()
    }

    async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let token = self
            .oauth
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await
            .map_err(token_error)?;

        let access_token = token.access_token().secret();
        if access_token.is_empty() {
            return Err(OAuthError::Payload("empty access_token".to_string()));
        }
        Ok(access_token.clone())
    }

    async fn fetch_identity(
        &self,
        access_token: &str,
    ) -> Result<Option<ExternalIdentity>, OAuthError> {
        let response = self
            .http
            .get(self.profile_url.clone())
            .header(ACCEPT, "application/json")
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| OAuthError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_response(response).await);
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OAuthError::Payload(e.to_string()))?;

        let identity = self.provider.parse_profile(&body);
        if identity.is_none() {
            tracing::warn!(provider = %self.provider, "Profile response had no usable user id");
        }
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, provider: Provider) -> OAuthClient {
        let endpoints = ProviderEndpoints {
            authorize_url: format!("{}/authorize", server.uri()),
            token_url: format!("{}/token", server.uri()),
            profile_url: format!("{}/me", server.uri()),
        };
        OAuthClient::with_endpoints(&test_config(provider), endpoints).unwrap()
    }

    #[test]
    fn test_authorization_url_carries_state_and_client() {
        let client = OAuthClient::new(&test_config(Provider::Discord)).unwrap();
        let url = Url::parse(&client.authorization_url("tok-123")).unwrap();

        assert_eq!(url.host_str(), Some("discord.com"));
        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["state"], "tok-123");
        assert_eq!(pairs["client_id"], "client-id");
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["scope"], "identify");
        assert_eq!(pairs["redirect_uri"], "http://localhost:3000/oauth/callback");
    }

    #[test]
    fn test_invalid_endpoint_is_rejected() {
        let endpoints = ProviderEndpoints {
            authorize_url: "not a url".to_string(),
            token_url: "http://localhost/token".to_string(),
            profile_url: "http://localhost/me".to_string(),
        };
        let result = OAuthClient::with_endpoints(&test_config(Provider::GitHub), endpoints);
        assert!(matches!(result, Err(OAuthError::Endpoint { .. })));
    }

    #[test]
    fn test_missing_redirect_url_is_allowed() {
        let mut config = test_config(Provider::GitHub);
        config.redirect_url = String::new();
        let client = OAuthClient::new(&config).unwrap();
        let url = Url::parse(&client.authorization_url("tok")).unwrap();
        assert!(url.query_pairs().all(|(key, _)| key != "redirect_uri"));
    }

    #[tokio::test]
    async fn test_exchange_code_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("code=abc"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("client_secret=client-secret"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "access_token": "at-1", "token_type": "Bearer" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Provider::Discord);
        assert_eq!(client.exchange_code("abc").await.unwrap(), "at-1");
    }

    #[tokio::test]
    async fn test_exchange_code_error_field_with_200() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": "bad_verification_code",
                "error_description": "The code passed is incorrect or expired."
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, Provider::GitHub);
        let err = client.exchange_code("stale").await.unwrap_err();
        assert!(matches!(err, OAuthError::Payload(ref msg) if msg.contains("bad_verification_code")));
    }

    #[tokio::test]
    async fn test_exchange_code_http_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "error": "invalid_client" })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, Provider::Discord);
        let err = client.exchange_code("abc").await.unwrap_err();
        assert!(matches!(err, OAuthError::Payload(ref msg) if msg.contains("invalid_client")));
    }

    #[tokio::test]
    async fn test_exchange_code_does_not_follow_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(307)
                    .insert_header("location", format!("{}/elsewhere", server.uri()).as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/elsewhere"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "leaked",
                "token_type": "Bearer"
            })))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server, Provider::Discord);
        assert!(client.exchange_code("abc").await.is_err());
    }

    #[tokio::test]
    async fn test_exchange_code_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "access_token": "late" }))
                    .set_delay(std::time::Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, Provider::Discord);
        let err = client.exchange_code("abc").await.unwrap_err();
        assert!(matches!(err, OAuthError::Request(_)));
    }

    #[tokio::test]
    async fn test_fetch_identity_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .and(header("authorization", "Bearer at-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "42",
                "username": "nelly",
                "global_name": "Nelly",
                "avatar": null
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, Provider::Discord);
        let identity = client.fetch_identity("at-1").await.unwrap().unwrap();
        assert_eq!(identity.provider_user_id, "42");
        assert_eq!(identity.display_name, "Nelly");
        assert_eq!(identity.avatar_url, "");
    }

    #[tokio::test]
    async fn test_fetch_identity_unresolvable_profile() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
            .mount(&server)
            .await;

        let client = client_for(&server, Provider::GitHub);
        assert!(client.fetch_identity("at-1").await.unwrap().is_none());
    }
}
