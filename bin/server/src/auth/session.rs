//! Signed-cookie session store.
//!
//! Sessions live entirely in the browser. Each cookie value is signed with
//! a key derived from the configured secret, so a client can read but not
//! forge or alter its payload. Any cookie that fails verification or does
//! not decode reads as "no session".

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use std::fmt;
use studentrun_platform_access::{PendingAuth, Session};
use time::Duration as TimeDuration;
use tracing::debug;

use crate::config::{ConfigError, ServerConfig};

/// Auth state cookie name (for CSRF protection during the OAuth flow).
pub const AUTH_STATE_COOKIE: &str = "auth_state";

/// Lifetime of the auth state cookie.
const AUTH_STATE_MAX_AGE: TimeDuration = TimeDuration::minutes(10);

/// Issues and verifies session cookies.
#[derive(Clone)]
pub struct SessionStore {
    key: Key,
    cookie_name: String,
    max_age: TimeDuration,
    secure: bool,
}

impl SessionStore {
    /// Creates a store signing with `key`.
    #[must_use]
    pub fn new(key: Key, cookie_name: impl Into<String>, max_age: TimeDuration, secure: bool) -> Self {
        Self {
            key,
            cookie_name: cookie_name.into(),
            max_age,
            secure,
        }
    }

    /// Creates a store from validated server configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the session secret or lifetime is unusable.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.session_key()?,
            config.session.cookie_name.clone(),
            config.session_max_age()?,
            config.secure_cookies(),
        ))
    }

    /// Returns the signing key.
    #[must_use]
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Returns the session cookie name.
    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Builds a verifying jar over the request's cookies.
    #[must_use]
    pub fn jar(&self, headers: &HeaderMap) -> SignedCookieJar {
        SignedCookieJar::from_headers(headers, self.key.clone())
    }

    /// Reads the session, treating any unverifiable cookie as anonymous.
    #[must_use]
    pub fn read(&self, jar: &SignedCookieJar) -> Session {
        let Some(cookie) = jar.get(&self.cookie_name) else {
            return Session::anonymous();
        };

        match Session::decode(cookie.value()) {
            Ok(session) => session,
            Err(e) => {
                debug!(error = %e, "Discarding undecodable session payload");
                Session::anonymous()
            }
        }
    }

    /// Adds a signed session cookie to the jar.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be serialized.
    pub fn write(&self, jar: SignedCookieJar, session: &Session) -> Result<SignedCookieJar, StoreError> {
        let value = session
            .encode()
            .map_err(|e| StoreError::Serialize(e.to_string()))?;
        Ok(jar.add(self.cookie(self.cookie_name.clone(), value, self.max_age)))
    }

    /// Replaces the session cookie with an expired one.
    #[must_use]
    pub fn clear(&self, jar: SignedCookieJar) -> SignedCookieJar {
        jar.add(self.cookie(self.cookie_name.clone(), String::new(), TimeDuration::ZERO))
    }

    /// Stores the pending login state across the provider redirect.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be serialized.
    pub fn write_pending(
        &self,
        jar: SignedCookieJar,
        pending: &PendingAuth,
    ) -> Result<SignedCookieJar, StoreError> {
        let value =
            serde_json::to_string(pending).map_err(|e| StoreError::Serialize(e.to_string()))?;
        Ok(jar.add(self.cookie(AUTH_STATE_COOKIE.to_string(), value, AUTH_STATE_MAX_AGE)))
    }

    /// Reads the pending login state, if a valid one is present.
    #[must_use]
    pub fn read_pending(&self, jar: &SignedCookieJar) -> Option<PendingAuth> {
        let cookie = jar.get(AUTH_STATE_COOKIE)?;
        match serde_json::from_str(cookie.value()) {
            Ok(pending) => Some(pending),
            Err(e) => {
                debug!(error = %e, "Discarding undecodable auth state");
                None
            }
        }
    }

    /// Expires the pending login state.
    #[must_use]
    pub fn clear_pending(&self, jar: SignedCookieJar) -> SignedCookieJar {
        jar.add(self.cookie(AUTH_STATE_COOKIE.to_string(), String::new(), TimeDuration::ZERO))
    }

    fn cookie(&self, name: String, value: String, max_age: TimeDuration) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(max_age)
            .build()
    }
}

// Keeps the key out of debug output.
impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("cookie_name", &self.cookie_name)
            .field("max_age", &self.max_age)
            .field("secure", &self.secure)
            .finish_non_exhaustive()
    }
}

/// Session store errors.
#[derive(Debug)]
pub enum StoreError {
    /// The payload could not be serialized.
    Serialize(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serialize(msg) => write!(f, "failed to serialize cookie payload: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}
