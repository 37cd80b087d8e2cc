//! Platform access, authentication and authorization for studentrun.
//!
//! This crate provides:
//! - The signed-cookie session payload (`Session`)
//! - The transient identity produced by a login (`AuthenticatedUser`)
//! - The pending-login state carried across the provider redirect (`PendingAuth`)
//! - Domain-gated access control (`DomainPolicy`)
//! - Identity provider configuration (`GoogleConfig`, `OidcConfig`)
//! - Authentication error types
//!
//! # Access Control Model
//!
//! Access to the invite list is granted solely on whether the session's
//! email ends with the organizational domain suffix. Nothing else about
//! the identity is consulted.
//!
//! # Example
//!
//! ```
//! use studentrun_platform_access::{AuthenticatedUser, DomainPolicy};
//!
//! let policy = DomainPolicy::new("umn.edu").expect("non-empty suffix");
//! let user = AuthenticatedUser::new("google", "goldy@umn.edu");
//! let session = user.into_session();
//!
//! assert!(policy.is_authorized_session(&session));
//! assert!(!policy.is_authorized(Some("someone@gmail.com")));
//! ```

pub mod auth;
pub mod domain;
pub mod error;
pub mod google;
pub mod oidc;
pub mod session;

// Re-export main types at crate root
pub use auth::{AuthenticatedUser, PendingAuth};
pub use domain::{DEFAULT_AUTHORIZED_DOMAIN, DomainPolicy};
pub use error::{AuthenticationError, AuthorizationError};
pub use google::GoogleConfig;
pub use oidc::OidcConfig;
pub use session::Session;
