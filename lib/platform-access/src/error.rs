//! Failures raised while signing users in or building access policy.
//!
//! - `AuthenticationError`: failures while verifying an identity with a provider
//! - `AuthorizationError`: failures in access policy construction

use std::fmt;

/// Why a sign-in attempt failed.
///
/// These errors represent failures in verifying user identity. Their
/// `Display` output carries provider detail and is meant for server logs,
/// never for response bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// Provider configuration is unusable (invalid URL, etc.).
    Configuration { provider: String, reason: String },
    /// Failed to discover provider metadata.
    Discovery { provider: String, reason: String },
    /// Exchanging the authorization code for tokens failed.
    TokenExchange { provider: String, reason: String },
    /// The ID token failed validation.
    InvalidToken { reason: String },
    /// Fetching the user profile failed.
    ProfileFetch { provider: String, reason: String },
    /// Missing required claim in the profile or token.
    MissingClaim { claim: String },
    /// The provider reports the email as unverified.
    UnverifiedEmail,
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { provider, reason } => {
                write!(f, "provider '{provider}' configuration error: {reason}")
            }
            Self::Discovery { provider, reason } => {
                write!(f, "provider '{provider}' discovery failed: {reason}")
            }
            Self::TokenExchange { provider, reason } => {
                write!(f, "provider '{provider}' token exchange failed: {reason}")
            }
            Self::InvalidToken { reason } => {
                write!(f, "invalid token: {reason}")
            }
            Self::ProfileFetch { provider, reason } => {
                write!(f, "provider '{provider}' profile fetch failed: {reason}")
            }
            Self::MissingClaim { claim } => {
                write!(f, "missing required claim: {claim}")
            }
            Self::UnverifiedEmail => {
                write!(f, "email address is not verified by the provider")
            }
        }
    }
}

impl std::error::Error for AuthenticationError {}

/// Errors from authorization policy setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    /// The configured domain suffix is empty.
    EmptyDomainSuffix,
}

impl fmt::Display for AuthorizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDomainSuffix => {
                write!(f, "authorized domain suffix must not be empty")
            }
        }
    }
}

impl std::error::Error for AuthorizationError {}
