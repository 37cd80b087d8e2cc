//! Identity types produced and consumed by the login handshake.

use serde::{Deserialize, Serialize};

use crate::session::Session;

/// Identity verified by an identity provider during a login.
///
/// This value is transient: it lives only for the callback request and is
/// immediately turned into a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Name of the provider that verified the identity (e.g. "google").
    provider: String,
    /// Email address reported by the provider.
    email: String,
}

impl AuthenticatedUser {
    /// Creates a new authenticated user.
    #[must_use]
    pub fn new(provider: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            email: email.into(),
        }
    }

    /// Returns the provider name.
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Returns the verified email.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Converts the identity into the session payload stored in the cookie.
    #[must_use]
    pub fn into_session(self) -> Session {
        Session::for_email(self.email)
    }
}

/// State generated when a login begins and checked when it completes.
///
/// Stored in a short-lived signed cookie across the provider redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAuth {
    /// CSRF token sent as the OAuth `state` parameter.
    pub csrf_token: String,
    /// PKCE code verifier matching the challenge sent to the provider.
    pub pkce_verifier: String,
    /// OpenID Connect nonce; absent for plain OAuth2 providers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

impl PendingAuth {
    /// Returns true if the `state` echoed by the provider matches.
    #[must_use]
    pub fn matches_state(&self, state: &str) -> bool {
        !self.csrf_token.is_empty() && self.csrf_token == state
    }
}
