//! Generic OpenID Connect sign-in using the openidconnect crate.

use async_trait::async_trait;
use openidconnect::core::{CoreAuthenticationFlow, CoreClient, CoreProviderMetadata};
use openidconnect::{
    AuthorizationCode, ClientId, ClientSecret, CsrfToken, IssuerUrl, Nonce, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenResponse,
};
use studentrun_platform_access::{AuthenticatedUser, AuthenticationError, OidcConfig, PendingAuth};
use tracing::instrument;

use super::provider::IdentityProvider;

/// Provider name used in routes.
pub const OIDC_PROVIDER: &str = "oidc";

/// Signs users in through a discovered OpenID Connect issuer.
pub struct OidcProvider {
    provider_metadata: CoreProviderMetadata,
    client_id: ClientId,
    client_secret: ClientSecret,
    redirect_url: RedirectUrl,
    scopes: Vec<String>,
    http_client: reqwest::Client,
}

impl OidcProvider {
    /// Creates a new OIDC provider by discovering the issuer's metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if a URL is invalid or discovery fails.
    pub async fn discover(
        config: &OidcConfig,
        redirect_url: String,
    ) -> Result<Self, AuthenticationError> {
        let issuer_url = IssuerUrl::new(config.issuer_url().to_string())
            .map_err(|e| configuration(format!("invalid issuer URL: {}", e)))?;

        let http_client = http_client()?;
        let provider_metadata = CoreProviderMetadata::discover_async(issuer_url, &http_client)
            .await
            .map_err(|e| AuthenticationError::Discovery {
                provider: OIDC_PROVIDER.to_string(),
                reason: e.to_string(),
            })?;

        Self::from_metadata(provider_metadata, config, redirect_url)
    }

    /// Creates a provider from already-fetched issuer metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the redirect URL is invalid.
    pub fn from_metadata(
        provider_metadata: CoreProviderMetadata,
        config: &OidcConfig,
        redirect_url: String,
    ) -> Result<Self, AuthenticationError> {
        let redirect_url = RedirectUrl::new(redirect_url)
            .map_err(|e| configuration(format!("invalid redirect URI: {}", e)))?;

        Ok(Self {
            provider_metadata,
            client_id: ClientId::new(config.client_id().to_string()),
            client_secret: ClientSecret::new(config.client_secret().to_string()),
            redirect_url,
            scopes: config.extra_scopes().into_iter().map(str::to_string).collect(),
            http_client: http_client()?,
        })
    }
}

fn http_client() -> Result<reqwest::Client, AuthenticationError> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| configuration(format!("failed to create HTTP client: {}", e)))
}

fn configuration(reason: String) -> AuthenticationError {
    AuthenticationError::Configuration {
        provider: OIDC_PROVIDER.to_string(),
        reason,
    }
}

fn token_exchange(reason: String) -> AuthenticationError {
    AuthenticationError::TokenExchange {
        provider: OIDC_PROVIDER.to_string(),
        reason,
    }
}

#[async_trait]
impl IdentityProvider for OidcProvider {
    fn name(&self) -> &str {
        OIDC_PROVIDER
    }

    fn begin_auth(&self) -> (String, PendingAuth) {
        let client = CoreClient::from_provider_metadata(
            self.provider_metadata.clone(),
            self.client_id.clone(),
            Some(self.client_secret.clone()),
        )
        .set_redirect_uri(self.redirect_url.clone());

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        // The flow adds the openid scope itself.
        let mut auth_request = client
            .authorize_url(
                CoreAuthenticationFlow::AuthorizationCode,
                CsrfToken::new_random,
                Nonce::new_random,
            )
            .set_pkce_challenge(pkce_challenge);

        for scope in &self.scopes {
            auth_request = auth_request.add_scope(Scope::new(scope.clone()));
        }

        let (auth_url, csrf_token, nonce) = auth_request.url();

        let pending = PendingAuth {
            csrf_token: csrf_token.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
            nonce: Some(nonce.secret().clone()),
        };

        (auth_url.to_string(), pending)
    }

    #[instrument(skip_all, fields(provider = OIDC_PROVIDER))]
    async fn complete_auth(
        &self,
        code: &str,
        pending: &PendingAuth,
    ) -> Result<AuthenticatedUser, AuthenticationError> {
        let client = CoreClient::from_provider_metadata(
            self.provider_metadata.clone(),
            self.client_id.clone(),
            Some(self.client_secret.clone()),
        )
        .set_redirect_uri(self.redirect_url.clone());

        let nonce = pending
            .nonce
            .clone()
            .map(Nonce::new)
            .ok_or_else(|| AuthenticationError::InvalidToken {
                reason: "no nonce recorded for this login".to_string(),
            })?;

        let token_response = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .map_err(|e| token_exchange(format!("token endpoint error: {}", e)))?
            .set_pkce_verifier(PkceCodeVerifier::new(pending.pkce_verifier.clone()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| token_exchange(e.to_string()))?;

        let id_token = token_response
            .id_token()
            .ok_or_else(|| token_exchange("no ID token in response".to_string()))?;

        let claims = id_token
            .claims(&client.id_token_verifier(), &nonce)
            .map_err(|e| AuthenticationError::InvalidToken {
                reason: e.to_string(),
            })?;

        if claims.email_verified() == Some(false) {
            return Err(AuthenticationError::UnverifiedEmail);
        }

        let email = claims
            .email()
            .map(|e| e.as_str().to_string())
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| AuthenticationError::MissingClaim {
                claim: "email".to_string(),
            })?;

        Ok(AuthenticatedUser::new(OIDC_PROVIDER, email))
    }
}
