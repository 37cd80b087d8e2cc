//! Community group ("guild") records.
//!
//! A guild is a Discord server that students of the organization can join.
//! Records are read-only from the HTTP surface: they are either compiled
//! into the binary or loaded from the guild table.

use serde::{Deserialize, Serialize};

/// A single community group invite.
///
/// Serialized as a JSON object with the camelCase keys `link`, `name`,
/// `serverId`, `iconHash`, and `range`, all strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildRecord {
    /// Invite URL.
    pub link: String,
    /// Display name of the server.
    pub name: String,
    /// Discord snowflake of the server.
    pub server_id: String,
    /// Icon hash on the Discord CDN.
    pub icon_hash: String,
    /// Human description of which classes the server covers.
    pub range: String,
}

impl GuildRecord {
    /// Creates a record from its five attributes.
    #[must_use]
    pub fn new(
        link: impl Into<String>,
        name: impl Into<String>,
        server_id: impl Into<String>,
        icon_hash: impl Into<String>,
        range: impl Into<String>,
    ) -> Self {
        Self {
            link: link.into(),
            name: name.into(),
            server_id: server_id.into(),
            icon_hash: icon_hash.into(),
            range: range.into(),
        }
    }
}
