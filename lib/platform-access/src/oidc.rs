//! OpenID Connect provider configuration.
//!
//! Any standards-compliant issuer (Keycloak, Authentik, Azure AD, ...) can
//! be used for login. The redirect URI is not part of this configuration:
//! it is derived from the server's public URL and the provider name.

use serde::{Deserialize, Serialize};

/// Configuration for a generic OIDC identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OidcConfig {
    /// Issuer whose `.well-known/openid-configuration` is fetched at startup.
    issuer_url: String,
    client_id: String,
    client_secret: String,
    /// Comma-separated scopes, `openid,email` unless overridden.
    #[serde(default = "default_scopes")]
    scopes: String,
}

fn default_scopes() -> String {
    "openid,email".to_string()
}

impl OidcConfig {
    /// Creates a new OIDC configuration with the default scopes.
    #[must_use]
    pub fn new(issuer_url: String, client_id: String, client_secret: String) -> Self {
        Self {
            issuer_url,
            client_id,
            client_secret,
            scopes: default_scopes(),
        }
    }

    /// Returns the discovery issuer.
    #[must_use]
    pub fn issuer_url(&self) -> &str {
        &self.issuer_url
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Returns the scopes to request other than `openid`, which the
    /// authorization flow always sends.
    #[must_use]
    pub fn extra_scopes(&self) -> Vec<&str> {
        self.scopes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != "openid")
            .collect()
    }

    /// Returns true if both client credentials are present.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.client_secret.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_deserializes_with_default_scopes() {
        let config: OidcConfig = serde_json::from_str(
            r#"{"issuer_url":"https://login.umn.example","client_id":"gateway","client_secret":"s3cret"}"#,
        )
        .expect("deserialize");

        assert_eq!(config.issuer_url(), "https://login.umn.example");
        assert_eq!(config.client_id(), "gateway");
        assert_eq!(config.extra_scopes(), vec!["email"]);
        assert!(config.has_credentials());
    }

    #[test]
    fn extra_scopes_skip_openid_and_blanks() {
        let config: OidcConfig = serde_json::from_str(
            r#"{"issuer_url":"https://login.umn.example","client_id":"gateway","client_secret":"s3cret","scopes":"openid, email, , profile"}"#,
        )
        .expect("deserialize");
        assert_eq!(config.extra_scopes(), vec!["email", "profile"]);
    }

    #[test]
    fn blank_credentials_are_reported() {
        let config = OidcConfig::new(
            "https://login.umn.example".to_string(),
            " ".to_string(),
            "secret".to_string(),
        );
        assert!(!config.has_credentials());
    }
}
