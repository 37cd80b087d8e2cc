//! Authentication routes for login, callback, and logout.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::SignedCookieJar;
use serde::Deserialize;
use std::fmt;
use studentrun_platform_access::{AuthenticatedUser, AuthenticationError};
use tracing::{debug, error, info, warn};

use super::provider::IdentityProvider;
use super::session::StoreError;
use crate::app::AppState;

/// Query parameters a provider sends back after consent.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

impl CallbackQuery {
    fn has_callback_params(&self) -> bool {
        self.code.is_some() && self.state.is_some()
    }
}

/// Starts a login, or finishes one if the provider's callback parameters
/// are already present.
pub async fn login(
    State(state): State<AppState>,
    Path(provider_name): Path<String>,
    Query(query): Query<CallbackQuery>,
    jar: SignedCookieJar,
) -> Result<Response, AuthError> {
    let provider = state
        .providers
        .get(&provider_name)
        .ok_or(AuthError::UnknownProvider(provider_name))?;

    if query.has_callback_params() {
        match complete(&state, provider.as_ref(), &query, &jar).await {
            Ok(user) => return establish(&state, jar, user),
            Err(e) => debug!(error = %e, "Login completion failed, restarting flow"),
        }
    }

    let (auth_url, pending) = provider.begin_auth();
    let jar = state
        .sessions
        .write_pending(jar, &pending)
        .map_err(AuthError::Store)?;

    Ok((jar, Redirect::temporary(&auth_url)).into_response())
}

/// Handles the provider's redirect back after the user consents.
pub async fn callback(
    State(state): State<AppState>,
    Path(provider_name): Path<String>,
    Query(query): Query<CallbackQuery>,
    jar: SignedCookieJar,
) -> Result<Response, AuthError> {
    let provider = state
        .providers
        .get(&provider_name)
        .ok_or(AuthError::UnknownProvider(provider_name))?;

    let user = complete(&state, provider.as_ref(), &query, &jar).await?;
    establish(&state, jar, user)
}

/// Logs out the user by expiring their session cookie.
pub async fn logout(State(state): State<AppState>, jar: SignedCookieJar) -> impl IntoResponse {
    (state.sessions.clear(jar), Redirect::to("/"))
}

async fn complete(
    state: &AppState,
    provider: &dyn IdentityProvider,
    query: &CallbackQuery,
    jar: &SignedCookieJar,
) -> Result<AuthenticatedUser, AuthError> {
    if let Some(reason) = &query.error {
        return Err(AuthError::ProviderDenied(reason.clone()));
    }

    let code = query
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or(AuthError::MissingCode)?;

    let pending = state
        .sessions
        .read_pending(jar)
        .ok_or(AuthError::MissingAuthState)?;

    if !pending.matches_state(query.state.as_deref().unwrap_or_default()) {
        return Err(AuthError::CsrfMismatch);
    }

    provider
        .complete_auth(code, &pending)
        .await
        .map_err(AuthError::Provider)
}

fn establish(
    state: &AppState,
    jar: SignedCookieJar,
    user: AuthenticatedUser,
) -> Result<Response, AuthError> {
    info!(provider = user.provider(), "User signed in");
    debug!(email = user.email(), "Signed-in identity");

    let jar = state.sessions.clear_pending(jar);
    let jar = state
        .sessions
        .write(jar, &user.into_session())
        .map_err(AuthError::Store)?;

    Ok((jar, Redirect::temporary("/")).into_response())
}

/// Authentication errors.
#[derive(Debug)]
pub enum AuthError {
    UnknownProvider(String),
    ProviderDenied(String),
    MissingCode,
    MissingAuthState,
    CsrfMismatch,
    Provider(AuthenticationError),
    Store(StoreError),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownProvider(name) => write!(f, "unknown provider '{}'", name),
            Self::ProviderDenied(reason) => write!(f, "provider returned error: {}", reason),
            Self::MissingCode => write!(f, "callback is missing the authorization code"),
            Self::MissingAuthState => write!(f, "no valid auth state cookie"),
            Self::CsrfMismatch => write!(f, "CSRF state mismatch"),
            Self::Provider(e) => write!(f, "{}", e),
            Self::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::UnknownProvider(_) => (StatusCode::NOT_FOUND, "Unknown provider"),
            Self::ProviderDenied(_) => {
                warn!(error = %self, "Provider rejected login");
                (StatusCode::BAD_REQUEST, "Login was not completed")
            }
            Self::MissingCode | Self::MissingAuthState | Self::CsrfMismatch => {
                warn!(error = %self, "Invalid login callback");
                (StatusCode::BAD_REQUEST, "Invalid login state")
            }
            Self::Provider(
                AuthenticationError::MissingClaim { .. } | AuthenticationError::UnverifiedEmail,
            ) => {
                warn!(error = %self, "Provider identity rejected");
                (StatusCode::FORBIDDEN, "A verified email address is required")
            }
            Self::Provider(_) => {
                error!(error = %self, "Authentication failed");
                (StatusCode::BAD_GATEWAY, "Authentication failed")
            }
            Self::Store(_) => {
                error!(error = %self, "Session write failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, message).into_response()
    }
}
