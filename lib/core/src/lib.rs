//! Core domain types and utilities for studentrun.
//!
//! This crate provides the foundational types and error handling shared by
//! the guild store, the platform-access crate and the web server.

pub mod error;
pub mod guild;

pub use error::Result;
pub use guild::GuildRecord;
