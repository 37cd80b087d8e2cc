//! Guild invite sources for studentrun.
//!
//! The invite list comes from exactly one [`GuildSource`], chosen at
//! startup:
//! - [`StaticGuildSource`]: the list compiled into the binary
//! - [`SqliteGuildSource`]: a full read of the `guilds` table
//!
//! Both produce the same [`GuildRecord`](studentrun_core::GuildRecord)
//! values, so the JSON served to browsers does not depend on the source.

pub mod error;
pub mod fixed;
pub mod source;
pub mod sqlite;

pub use error::GuildStoreError;
pub use fixed::StaticGuildSource;
pub use source::GuildSource;
pub use sqlite::SqliteGuildSource;
