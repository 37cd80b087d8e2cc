//! studentrun web server.
//!
//! This crate provides the axum application that signs students in with
//! an identity provider, keeps their email in a signed cookie, and serves
//! the guild invite list to members of the organization's domain.

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod redirect;
pub mod server;

pub use app::{AppState, router};
pub use config::ServerConfig;
