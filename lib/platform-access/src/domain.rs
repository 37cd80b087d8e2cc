//! Domain-gated access control.
//!
//! Access to the invite list is decided by a suffix match on the session
//! email. The comparison is ASCII case-insensitive since the domain part
//! of an address is case-insensitive; the suffix is otherwise matched
//! literally, so any address ending in the suffix qualifies.

use crate::error::AuthorizationError;
use crate::session::Session;

/// Suffix used when none is configured.
pub const DEFAULT_AUTHORIZED_DOMAIN: &str = "umn.edu";

/// Access policy granting entry to emails ending in a domain suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainPolicy {
    suffix: String,
}

impl DomainPolicy {
    /// Creates a policy for the given suffix.
    ///
    /// # Errors
    ///
    /// Returns an error if the suffix is empty after trimming, since an
    /// empty suffix would authorize every address.
    pub fn new(suffix: impl Into<String>) -> Result<Self, AuthorizationError> {
        let suffix = suffix.into().trim().to_ascii_lowercase();
        if suffix.is_empty() {
            return Err(AuthorizationError::EmptyDomainSuffix);
        }
        Ok(Self { suffix })
    }

    /// Returns the normalized suffix.
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Returns true if the email belongs to the organization.
    ///
    /// Absent and empty emails are never authorized.
    #[must_use]
    pub fn is_authorized(&self, email: Option<&str>) -> bool {
        let Some(email) = email else {
            return false;
        };
        let email = email.as_bytes();
        let suffix = self.suffix.as_bytes();

        if email.is_empty() || email.len() < suffix.len() {
            return false;
        }
        email[email.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
    }

    /// Returns true if the session's email belongs to the organization.
    #[must_use]
    pub fn is_authorized_session(&self, session: &Session) -> bool {
        self.is_authorized(session.email())
    }
}

impl Default for DomainPolicy {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_AUTHORIZED_DOMAIN.to_string(),
        }
    }
}
