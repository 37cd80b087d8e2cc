//! Guild list compiled into the binary.

use async_trait::async_trait;
use studentrun_core::{GuildRecord, Result};

use crate::error::GuildStoreError;
use crate::source::GuildSource;

/// A guild source backed by an in-memory list.
#[derive(Debug, Clone)]
pub struct StaticGuildSource {
    guilds: Vec<GuildRecord>,
}

impl StaticGuildSource {
    /// Creates a source serving exactly the given list.
    #[must_use]
    pub fn new(guilds: Vec<GuildRecord>) -> Self {
        Self { guilds }
    }

    /// Returns the list this source serves.
    #[must_use]
    pub fn guilds(&self) -> &[GuildRecord] {
        &self.guilds
    }

    /// The built-in list of University of Minnesota communities.
    #[must_use]
    pub fn umn() -> Self {
        Self::new(vec![
            GuildRecord::new(
                "https://discord.gg/umn-math",
                "UMN Mathematics",
                "801115391836946473",
                "08b8598c33d03d8f9a86a481e1bf9fdb",
                "All MATH and STAT Classes",
            ),
            GuildRecord::new(
                "https://discord.gg/umn-csci",
                "UMN CSCI",
                "689902170014875677",
                "39436bc294d0772c347f16d2167e38e2",
                "All CSCI Classes",
            ),
            GuildRecord::new(
                "https://discord.gg/umn-physics",
                "UMN Physics",
                "752993940571160768",
                "bb4a15e7d8bf84a03124ae946a8cccb2",
                "All PHYS Classes",
            ),
            GuildRecord::new(
                "https://discord.gg/umn-art",
                "UMN Art Peeps",
                "802222628952997909",
                "4f6d56f37e97b541134f2dfe98ddfad2",
                "All ARTS Classes",
            ),
        ])
    }
}

impl Default for StaticGuildSource {
    fn default() -> Self {
        Self::umn()
    }
}

#[async_trait]
impl GuildSource for StaticGuildSource {
    fn kind(&self) -> &'static str {
        "static"
    }

    async fn fetch_all(&self) -> Result<Vec<GuildRecord>, GuildStoreError> {
        Ok(self.guilds.clone())
    }
}
