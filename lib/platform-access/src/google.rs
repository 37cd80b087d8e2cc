//! Google identity provider configuration.

use serde::{Deserialize, Serialize};

/// Google OAuth authorization URL.
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google OAuth token URL.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Google OpenID userinfo endpoint.
pub const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// OAuth client credentials registered in the Google Cloud console.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    client_id: String,
    client_secret: String,
    /// Restricts the account chooser to one Google Workspace domain
    /// (the `hd` parameter). Advisory only; access is still decided on
    /// the returned email.
    #[serde(default)]
    hosted_domain: Option<String>,
}

impl GoogleConfig {
    /// Creates a configuration from client credentials.
    #[must_use]
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client_id,
            client_secret,
            hosted_domain: None,
        }
    }

    /// Sets the hosted domain hint.
    #[must_use]
    pub fn with_hosted_domain(mut self, domain: Option<String>) -> Self {
        self.hosted_domain = domain;
        self
    }

    /// Returns the OAuth2 client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the OAuth2 client secret.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Returns the hosted domain hint, if configured.
    #[must_use]
    pub fn hosted_domain(&self) -> Option<&str> {
        self.hosted_domain.as_deref().filter(|d| !d.is_empty())
    }

    /// Returns true if both client credentials are present.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.client_secret.trim().is_empty()
    }
}
