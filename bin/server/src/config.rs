//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables. Nested keys
//! use `__` as a separator (`SESSION__SECRET`, `GOOGLE__CLIENT_ID`).
//!
//! Configuration is validated once, before any socket is bound: a server
//! that cannot sign sessions or reach an identity provider never starts.

use axum_extra::extract::cookie::Key;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use studentrun_platform_access::{DEFAULT_AUTHORIZED_DOMAIN, DomainPolicy, GoogleConfig, OidcConfig};
use time::Duration as TimeDuration;

use crate::auth::session::AUTH_STATE_COOKIE;

/// Minimum session secret length accepted for key derivation.
pub const MIN_SESSION_SECRET_BYTES: usize = 32;

/// Longest cookie lifetime browsers honor.
pub const MAX_SESSION_MAX_AGE_DAYS: i64 = 400;

/// Server configuration composed from library configs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Session cookie configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// Port the application listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Deployment mode.
    #[serde(default)]
    pub mode: DeploymentMode,

    /// Public base URL used to build OAuth callback URLs.
    /// Defaults to `http://localhost:{port}`.
    #[serde(default)]
    pub public_url: Option<String>,

    /// Google identity provider.
    #[serde(default)]
    pub google: Option<GoogleConfig>,

    /// Generic OpenID Connect identity provider.
    #[serde(default)]
    pub oidc: Option<OidcConfig>,

    /// Email suffix granting access to the guild list.
    #[serde(default = "default_authorized_domain")]
    pub authorized_domain: String,

    /// SQLite URL of the guild table. When unset the built-in list is served.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Directory of static assets served at the root path.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// TLS settings, required in production mode.
    #[serde(default)]
    pub tls: Option<TlsConfig>,
}

/// Session-related configuration.
#[derive(Clone, Deserialize)]
pub struct SessionConfig {
    /// Secret the cookie signing key is derived from.
    #[serde(default)]
    pub secret: String,

    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Cookie lifetime in days.
    #[serde(default = "default_max_age_days")]
    pub max_age_days: i64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true in production mode and false otherwise.
    #[serde(default)]
    pub secure_cookies: Option<bool>,
}

// Keeps the secret out of startup logs.
impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"<redacted>")
            .field("cookie_name", &self.cookie_name)
            .field("max_age_days", &self.max_age_days)
            .field("secure_cookies", &self.secure_cookies)
            .finish()
    }
}

/// Selects plain HTTP or HTTPS with a plaintext redirect responder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    /// Plain HTTP on the configured port.
    #[default]
    #[serde(alias = "dev")]
    Development,
    /// HTTPS on the configured port, redirecting plaintext requests.
    #[serde(alias = "prod", alias = "PROD")]
    Production,
}

/// Certificate and key locations for production mode.
#[derive(Debug, Clone, Deserialize)]
pub struct TlsConfig {
    /// PEM certificate chain.
    pub cert_path: PathBuf,
    /// PEM private key.
    pub key_path: PathBuf,
    /// Port of the plaintext redirect responder.
    #[serde(default = "default_redirect_port")]
    pub redirect_port: u16,
}

fn default_port() -> u16 {
    3000
}

fn default_authorized_domain() -> String {
    DEFAULT_AUTHORIZED_DOMAIN.to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_cookie_name() -> String {
    "session".to_string()
}

fn default_max_age_days() -> i64 {
    7
}

fn default_redirect_port() -> u16 {
    80
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            cookie_name: default_cookie_name(),
            max_age_days: default_max_age_days(),
            secure_cookies: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            port: default_port(),
            mode: DeploymentMode::default(),
            public_url: None,
            google: None,
            oidc: None,
            authorized_domain: default_authorized_domain(),
            database_url: None,
            static_dir: default_static_dir(),
            tls: None,
        }
    }
}

impl ServerConfig {
    /// Loads and validates configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_environment(config::Environment::default())
    }

    /// Loads and validates configuration from an environment source.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_environment(environment: config::Environment) -> Result<Self, ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(environment.separator("__"))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints the type system cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.session_key()?;
        self.domain_policy()?;

        if self.session.cookie_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "session.cookie_name",
                reason: "must not be empty".to_string(),
            });
        }
        if self.session.cookie_name == AUTH_STATE_COOKIE {
            return Err(ConfigError::Invalid {
                field: "session.cookie_name",
                reason: format!("'{AUTH_STATE_COOKIE}' is reserved for the login flow"),
            });
        }
        self.session_max_age()?;

        let google = self.google.as_ref().filter(|g| g.has_credentials());
        let oidc = self.oidc.as_ref().filter(|o| o.has_credentials());
        if google.is_none() && oidc.is_none() {
            return Err(ConfigError::NoIdentityProvider);
        }
        if oidc.is_some_and(|o| o.issuer_url().trim().is_empty()) {
            return Err(ConfigError::Invalid {
                field: "oidc.issuer_url",
                reason: "must not be empty".to_string(),
            });
        }

        let public_url = self.public_url();
        if !public_url.starts_with("http://") && !public_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                field: "public_url",
                reason: format!("'{public_url}' is not an http(s) URL"),
            });
        }

        if self.mode == DeploymentMode::Production && self.tls.is_none() {
            return Err(ConfigError::MissingTls);
        }

        Ok(())
    }

    /// Derives the cookie signing key from the session secret.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is missing, blank or too short.
    pub fn session_key(&self) -> Result<Key, ConfigError> {
        let secret = self.session.secret.as_bytes();
        if self.session.secret.trim().is_empty() {
            return Err(ConfigError::MissingSessionSecret);
        }
        if secret.len() < MIN_SESSION_SECRET_BYTES {
            return Err(ConfigError::WeakSessionSecret {
                length: secret.len(),
            });
        }
        Ok(Key::derive_from(secret))
    }

    /// Returns the session cookie lifetime.
    ///
    /// # Errors
    ///
    /// Returns an error unless the lifetime is between one and
    /// [`MAX_SESSION_MAX_AGE_DAYS`] days.
    pub fn session_max_age(&self) -> Result<TimeDuration, ConfigError> {
        let days = self.session.max_age_days;
        if !(1..=MAX_SESSION_MAX_AGE_DAYS).contains(&days) {
            return Err(ConfigError::Invalid {
                field: "session.max_age_days",
                reason: format!("must be between 1 and {MAX_SESSION_MAX_AGE_DAYS}, got {days}"),
            });
        }
        Ok(TimeDuration::days(days))
    }

    /// Builds the access policy from the configured domain.
    ///
    /// # Errors
    ///
    /// Returns an error if the domain suffix is empty.
    pub fn domain_policy(&self) -> Result<DomainPolicy, ConfigError> {
        DomainPolicy::new(self.authorized_domain.clone()).map_err(|e| ConfigError::Invalid {
            field: "authorized_domain",
            reason: e.to_string(),
        })
    }

    /// Returns the public base URL without a trailing slash.
    #[must_use]
    pub fn public_url(&self) -> String {
        match &self.public_url {
            Some(url) if !url.trim().is_empty() => url.trim().trim_end_matches('/').to_string(),
            _ => format!("http://localhost:{}", self.port),
        }
    }

    /// Returns the OAuth redirect URI for a provider.
    #[must_use]
    pub fn callback_url(&self, provider: &str) -> String {
        format!("{}/api/callback/{}", self.public_url(), provider)
    }

    /// Returns whether cookies carry the Secure attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.session
            .secure_cookies
            .unwrap_or(self.mode == DeploymentMode::Production)
    }
}

/// Configuration errors. Every variant stops the process at startup.
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration source could not be read or deserialized.
    Load(config::ConfigError),
    /// No session secret was supplied.
    MissingSessionSecret,
    /// The session secret is too short to derive a signing key.
    WeakSessionSecret { length: usize },
    /// Neither Google nor OIDC credentials were supplied.
    NoIdentityProvider,
    /// Production mode requires TLS settings.
    MissingTls,
    /// A field has an unusable value.
    Invalid { field: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(e) => write!(f, "failed to load configuration: {}", e),
            Self::MissingSessionSecret => write!(f, "SESSION__SECRET is required"),
            Self::WeakSessionSecret { length } => write!(
                f,
                "SESSION__SECRET is {} bytes, at least {} are required",
                length, MIN_SESSION_SECRET_BYTES
            ),
            Self::NoIdentityProvider => write!(
                f,
                "no identity provider configured, set GOOGLE__CLIENT_ID/GOOGLE__CLIENT_SECRET or OIDC__*"
            ),
            Self::MissingTls => write!(
                f,
                "production mode requires TLS__CERT_PATH and TLS__KEY_PATH"
            ),
            Self::Invalid { field, reason } => write!(f, "invalid {}: {}", field, reason),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Load(e) => Some(e),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(e: config::ConfigError) -> Self {
        Self::Load(e)
    }
}
