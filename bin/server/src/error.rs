//! HTTP error responses for the API routes.
//!
//! Internal detail is logged where the error is raised; the client only
//! sees a stable, generic body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Errors returned by the API handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The guild source could not be read.
    GuildsUnavailable,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GuildsUnavailable => write!(f, "guild list unavailable"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::GuildsUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn guilds_unavailable_is_a_json_500() {
        let response = ApiError::GuildsUnavailable.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body, json!({ "error": "guild list unavailable" }));
    }
}
