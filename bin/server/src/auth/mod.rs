//! Authentication for the studentrun server.
//!
//! This module provides:
//! - Google and generic OIDC sign-in behind the [`IdentityProvider`] trait
//! - Signed-cookie sessions holding only the user's email
//! - An extractor that reads the current session for API routes
//!
//! There is no server-side session state. A cookie that fails signature
//! verification is indistinguishable from no cookie at all, and a user
//! whose email falls outside the authorized domain is still signed in
//! but sees an empty guild list.

pub mod google;
pub mod middleware;
pub mod oidc;
pub mod provider;
pub mod routes;
pub mod session;

pub use google::GoogleProvider;
pub use middleware::CurrentSession;
pub use oidc::OidcProvider;
pub use provider::{IdentityProvider, ProviderRegistry};
pub use routes::{AuthError, callback, login, logout};
pub use session::{SessionStore, StoreError};
