//! Google sign-in.
//!
//! Runs the OAuth 2.0 authorization-code flow with PKCE against Google's
//! fixed endpoints, then reads the email from the OpenID userinfo
//! endpoint with the issued access token.

use async_trait::async_trait;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl, basic::BasicClient,
};
use serde::Deserialize;
use studentrun_platform_access::google::{GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL, GOOGLE_USERINFO_URL};
use studentrun_platform_access::{AuthenticatedUser, AuthenticationError, GoogleConfig, PendingAuth};
use tracing::instrument;

use super::provider::IdentityProvider;

/// Provider name used in routes.
pub const GOOGLE_PROVIDER: &str = "google";

/// Scopes needed to read the account email.
const GOOGLE_SCOPES: &[&str] = &["openid", "email"];

/// Google OAuth client.
#[derive(Debug, Clone)]
pub struct GoogleProvider {
    client_id: ClientId,
    client_secret: ClientSecret,
    auth_url: AuthUrl,
    token_url: TokenUrl,
    redirect_url: RedirectUrl,
    userinfo_url: String,
    hosted_domain: Option<String>,
    http_client: reqwest::Client,
}

impl GoogleProvider {
    /// Creates a Google provider redirecting back to `redirect_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if a URL is invalid or the HTTP client cannot be built.
    pub fn new(config: &GoogleConfig, redirect_url: String) -> Result<Self, AuthenticationError> {
        let configuration = |reason: String| AuthenticationError::Configuration {
            provider: GOOGLE_PROVIDER.to_string(),
            reason,
        };

        let auth_url = AuthUrl::new(GOOGLE_AUTH_URL.to_string())
            .map_err(|e| configuration(format!("invalid auth URL: {}", e)))?;
        let token_url = TokenUrl::new(GOOGLE_TOKEN_URL.to_string())
            .map_err(|e| configuration(format!("invalid token URL: {}", e)))?;
        let redirect_url = RedirectUrl::new(redirect_url)
            .map_err(|e| configuration(format!("invalid redirect URL: {}", e)))?;

        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| configuration(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client_id: ClientId::new(config.client_id().to_string()),
            client_secret: ClientSecret::new(config.client_secret().to_string()),
            auth_url,
            token_url,
            redirect_url,
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
            hosted_domain: config.hosted_domain().map(str::to_string),
            http_client,
        })
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<UserInfo, AuthenticationError> {
        let profile_error = |reason: String| AuthenticationError::ProfileFetch {
            provider: GOOGLE_PROVIDER.to_string(),
            reason,
        };

        self.http_client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| profile_error(format!("request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| profile_error(format!("userinfo endpoint error: {}", e)))?
            .json::<UserInfo>()
            .await
            .map_err(|e| profile_error(format!("invalid userinfo response: {}", e)))
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn name(&self) -> &str {
        GOOGLE_PROVIDER
    }

    fn begin_auth(&self) -> (String, PendingAuth) {
        let client = BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_auth_uri(self.auth_url.clone())
            .set_redirect_uri(self.redirect_url.clone());

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(pkce_challenge);

        for scope in GOOGLE_SCOPES {
            auth_request = auth_request.add_scope(Scope::new((*scope).to_string()));
        }
        if let Some(domain) = &self.hosted_domain {
            auth_request = auth_request.add_extra_param("hd", domain.as_str());
        }

        let (auth_url, csrf_token) = auth_request.url();

        let pending = PendingAuth {
            csrf_token: csrf_token.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
            nonce: None,
        };

        (auth_url.to_string(), pending)
    }

    #[instrument(skip_all, fields(provider = GOOGLE_PROVIDER))]
    async fn complete_auth(
        &self,
        code: &str,
        pending: &PendingAuth,
    ) -> Result<AuthenticatedUser, AuthenticationError> {
        let client = BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(self.redirect_url.clone());

        let token_response = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pending.pkce_verifier.clone()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| AuthenticationError::TokenExchange {
                provider: GOOGLE_PROVIDER.to_string(),
                reason: e.to_string(),
            })?;

        let profile = self
            .fetch_profile(token_response.access_token().secret())
            .await?;
        profile.into_user()
    }
}

/// Subset of the OpenID userinfo response.
#[derive(Debug, Deserialize)]
struct UserInfo {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<bool>,
}

impl UserInfo {
    fn into_user(self) -> Result<AuthenticatedUser, AuthenticationError> {
        if self.email_verified == Some(false) {
            return Err(AuthenticationError::UnverifiedEmail);
        }
        let email = self
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| AuthenticationError::MissingClaim {
                claim: "email".to_string(),
            })?;
        Ok(AuthenticatedUser::new(GOOGLE_PROVIDER, email))
    }
}
