//! Result alias for fallible infrastructure operations.
//!
//! Errors that cross a storage or network boundary are carried as a
//! rootcause [`Report`] wrapping the crate-specific error enum, so the
//! HTTP layer can log the whole chain while choosing a response from the
//! typed context.

use rootcause::Report;

/// Result carrying a [`Report`] over the context type `C`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
