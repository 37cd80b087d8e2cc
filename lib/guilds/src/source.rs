//! The guild source seam.

use async_trait::async_trait;
use studentrun_core::{GuildRecord, Result};

use crate::error::GuildStoreError;

/// Provides the current guild list.
///
/// Implementations are read-only and shared across requests.
#[async_trait]
pub trait GuildSource: Send + Sync {
    /// Short name used in logs (e.g. "static", "sqlite").
    fn kind(&self) -> &'static str;

    /// Returns every guild, in display order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read. An empty list
    /// is a valid answer and must not be used to signal a failure.
    async fn fetch_all(&self) -> Result<Vec<GuildRecord>, GuildStoreError>;
}
