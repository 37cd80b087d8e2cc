//! Session payload carried in the signed session cookie.
//!
//! The server keeps no session table: the cookie is the durable store and
//! its integrity comes from the server-held signing key. The payload holds
//! a single attribute, the authenticated email.

use serde::{Deserialize, Serialize};

/// Contents of a session cookie.
///
/// A session without an email is indistinguishable from no session at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
}

impl Session {
    /// Creates an empty (unauthenticated) session.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Creates a session for the given email.
    #[must_use]
    pub fn for_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
        }
    }

    /// Returns the authenticated email, if any.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().filter(|e| !e.is_empty())
    }

    /// Returns true if the session carries a non-empty email.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.email().is_some()
    }

    /// Encodes the payload for storage in a cookie value.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decodes a payload read back from a verified cookie value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a session document.
    pub fn decode(value: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_session_is_not_authenticated() {
        let session = Session::anonymous();
        assert!(!session.is_authenticated());
        assert!(session.email().is_none());
    }

    #[test]
    fn empty_email_counts_as_absent() {
        let session = Session::for_email("");
        assert!(!session.is_authenticated());
        assert!(session.email().is_none());
    }

    #[test]
    fn encoded_payload_only_holds_email() {
        let encoded = Session::for_email("goldy@umn.edu")
            .encode()
            .expect("encode");
        assert_eq!(encoded, r#"{"email":"goldy@umn.edu"}"#);

        assert_eq!(Session::anonymous().encode().expect("encode"), "{}");
    }

    #[test]
    fn decode_accepts_missing_email() {
        let session = Session::decode("{}").expect("decode");
        assert_eq!(session, Session::anonymous());

        let session = Session::decode(r#"{"email":"goldy@umn.edu"}"#).expect("decode");
        assert_eq!(session.email(), Some("goldy@umn.edu"));
    }

    #[test]
    fn decode_rejects_foreign_documents() {
        assert!(Session::decode("not json").is_err());
        assert!(Session::decode(r#"{"email":42}"#).is_err());
    }
}
