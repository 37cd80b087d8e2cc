//! Session extractor for Axum.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::convert::Infallible;
use studentrun_platform_access::Session;

use crate::app::AppState;

/// The verified session for the current request.
///
/// Never rejects: a missing, tampered or undecodable cookie yields an
/// anonymous session.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

impl<S> FromRequestParts<S> for CurrentSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);
        let jar = app.sessions.jar(&parts.headers);
        Ok(CurrentSession(app.sessions.read(&jar)))
    }
}
