//! The identity provider seam.
//!
//! Each provider wraps one OAuth2 authorization-code flow. Handlers only
//! see this trait, so tests can substitute a provider that never leaves
//! the process.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use studentrun_platform_access::{AuthenticatedUser, AuthenticationError, PendingAuth};

/// An OAuth2 identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Name used in the login and callback paths.
    fn name(&self) -> &str;

    /// Builds the consent URL and the state to keep until the callback.
    fn begin_auth(&self) -> (String, PendingAuth);

    /// Exchanges the authorization code and extracts the user's email.
    ///
    /// The caller has already checked the CSRF state against `pending`.
    async fn complete_auth(
        &self,
        code: &str,
        pending: &PendingAuth,
    ) -> Result<AuthenticatedUser, AuthenticationError>;
}

/// Providers available for login, keyed by name.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn IdentityProvider>>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider under its own name, replacing any previous one.
    pub fn insert(&mut self, provider: Arc<dyn IdentityProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    /// Adds a provider, builder style.
    #[must_use]
    pub fn with(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.insert(provider);
        self
    }

    /// Looks up a provider by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn IdentityProvider>> {
        self.providers.get(name).cloned()
    }

    /// Returns the registered provider names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns true if no provider is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}
