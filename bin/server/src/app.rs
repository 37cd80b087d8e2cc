//! Application state and HTTP routing.

use axum::{Router, extract::FromRef, routing::get};
use axum_extra::extract::cookie::Key;
use std::path::Path;
use std::sync::Arc;
use studentrun_guilds::GuildSource;
use studentrun_platform_access::DomainPolicy;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::api;
use crate::auth::{self, ProviderRegistry, SessionStore};

/// Shared application state, built once at startup.
#[derive(Clone)]
pub struct AppState {
    /// Signs and verifies session cookies.
    pub sessions: SessionStore,
    /// Identity providers available for login.
    pub providers: Arc<ProviderRegistry>,
    /// Decides which emails see the guild list.
    pub policy: DomainPolicy,
    /// Where the guild list comes from.
    pub guilds: Arc<dyn GuildSource>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        sessions: SessionStore,
        providers: ProviderRegistry,
        policy: DomainPolicy,
        guilds: Arc<dyn GuildSource>,
    ) -> Self {
        Self {
            sessions,
            providers: Arc::new(providers),
            policy,
            guilds,
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.key().clone()
    }
}

/// Builds the full router: API routes, health check and static files.
pub fn router(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    let api = Router::new()
        .route("/auth/{provider}", get(auth::login))
        .route("/callback/{provider}", get(auth::callback))
        .route("/logout", get(auth::logout))
        .route("/profile", get(api::profile))
        .route("/guilds", get(api::guilds));

    Router::new()
        .nest("/api", api)
        .route("/healthz", get(healthz))
        .fallback_service(ServeDir::new(static_dir.as_ref()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{HeaderMap, Request, Response, StatusCode, header};
    use axum::response::IntoResponse;
    use studentrun_core::GuildRecord;
    use studentrun_guilds::{GuildStoreError, StaticGuildSource};
    use studentrun_platform_access::{
        AuthenticatedUser, AuthenticationError, PendingAuth, Session,
    };
    use time::Duration as TimeDuration;
    use tower::ServiceExt;

    use crate::auth::IdentityProvider;

    const FAKE_STATE: &str = "fixed-csrf-state";
    const GOOD_CODE: &str = "good-code";

    /// Provider that signs in a fixed email without leaving the process.
    struct FakeProvider {
        email: &'static str,
    }

    #[async_trait]
    impl IdentityProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        fn begin_auth(&self) -> (String, PendingAuth) {
            (
                format!("https://idp.example/authorize?state={}", FAKE_STATE),
                PendingAuth {
                    csrf_token: FAKE_STATE.to_string(),
                    pkce_verifier: "verifier".to_string(),
                    nonce: None,
                },
            )
        }

        async fn complete_auth(
            &self,
            code: &str,
            pending: &PendingAuth,
        ) -> Result<AuthenticatedUser, AuthenticationError> {
            assert_eq!(pending.pkce_verifier, "verifier");
            if code == GOOD_CODE {
                Ok(AuthenticatedUser::new("fake", self.email))
            } else {
                Err(AuthenticationError::TokenExchange {
                    provider: "fake".to_string(),
                    reason: "invalid_grant".to_string(),
                })
            }
        }
    }

    struct FailingSource;

    #[async_trait]
    impl GuildSource for FailingSource {
        fn kind(&self) -> &'static str {
            "failing"
        }

        async fn fetch_all(&self) -> studentrun_core::Result<Vec<GuildRecord>, GuildStoreError> {
            Err(GuildStoreError::QueryFailed {
                details: "no such table: guilds".to_string(),
            }
            .into())
        }
    }

    fn state_with(email: &'static str, guilds: Arc<dyn GuildSource>) -> AppState {
        AppState::new(
            SessionStore::new(
                Key::derive_from(b"0123456789abcdef0123456789abcdef"),
                "session",
                TimeDuration::days(7),
                false,
            ),
            ProviderRegistry::new().with(Arc::new(FakeProvider { email })),
            DomainPolicy::default(),
            guilds,
        )
    }

    fn state(email: &'static str) -> AppState {
        state_with(email, Arc::new(StaticGuildSource::umn()))
    }

    fn app(state: AppState) -> Router {
        router(state, "does-not-exist")
    }

    async fn get(app: Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        app.oneshot(request.body(Body::empty()).expect("request"))
            .await
            .expect("response")
    }

    async fn body_string(response: Response<Body>) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf8")
    }

    /// Returns the `name=value` pairs of every `Set-Cookie` header.
    fn set_cookie_pairs(response: &Response<Body>) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|c| c.split(';').next())
            .map(str::to_string)
            .collect()
    }

    fn set_cookie_named(response: &Response<Body>, name: &str) -> Option<String> {
        let prefix = format!("{}=", name);
        set_cookie_pairs(response)
            .into_iter()
            .find(|pair| pair.starts_with(&prefix))
    }

    fn location(response: &Response<Body>) -> Option<&str> {
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// Issues a valid session cookie for `email` as `name=value`.
    fn session_cookie(state: &AppState, email: &str) -> String {
        let jar = state
            .sessions
            .write(state.sessions.jar(&HeaderMap::new()), &Session::for_email(email))
            .expect("write session");
        let response = jar.into_response();
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|c| c.split(';').next())
            .find(|pair| pair.starts_with("session="))
            .expect("session cookie")
            .to_string()
    }

    /// Runs login then callback, returning the callback response.
    async fn sign_in(state: AppState, code: &str) -> Response<Body> {
        let login = get(app(state.clone()), "/api/auth/fake", None).await;
        assert_eq!(login.status(), StatusCode::TEMPORARY_REDIRECT);
        let auth_state = set_cookie_named(&login, "auth_state").expect("auth_state cookie");

        get(
            app(state),
            &format!("/api/callback/fake?code={}&state={}", code, FAKE_STATE),
            Some(&auth_state),
        )
        .await
    }

    #[tokio::test]
    async fn profile_without_session_is_false() {
        let response = get(app(state("goldy@umn.edu")), "/api/profile", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "false");
    }

    #[tokio::test]
    async fn profile_reflects_domain() {
        let state = state("goldy@umn.edu");

        let cookie = session_cookie(&state, "goldy@umn.edu");
        let response = get(app(state.clone()), "/api/profile", Some(&cookie)).await;
        assert_eq!(body_string(response).await, "true");

        let cookie = session_cookie(&state, "someone@gmail.com");
        let response = get(app(state), "/api/profile", Some(&cookie)).await;
        assert_eq!(body_string(response).await, "false");
    }

    #[tokio::test]
    async fn guilds_without_session_is_empty_list() {
        let response = get(app(state("goldy@umn.edu")), "/api/guilds", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("application/json")
        );
        assert_eq!(body_string(response).await, "[]");
    }

    #[tokio::test]
    async fn guilds_for_outside_domain_is_empty_list() {
        let state = state("someone@gmail.com");
        let cookie = session_cookie(&state, "someone@gmail.com");
        let response = get(app(state), "/api/guilds", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "[]");
    }

    #[tokio::test]
    async fn guilds_for_authorized_session_is_full_list() {
        let state = state("goldy@umn.edu");
        let cookie = session_cookie(&state, "goldy@umn.edu");
        let response = get(app(state), "/api/guilds", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value =
            serde_json::from_str(&body_string(response).await).expect("json");
        let expected =
            serde_json::to_value(StaticGuildSource::umn().guilds()).expect("serialize guilds");
        assert_eq!(body, expected);

        let first = body
            .as_array()
            .and_then(|a| a.first())
            .and_then(|g| g.as_object())
            .expect("guild object");
        for key in ["link", "name", "serverId", "iconHash", "range"] {
            assert!(first.contains_key(key), "missing key {}", key);
        }
    }

    #[tokio::test]
    async fn guild_store_fault_is_500_not_empty() {
        let state = state_with("goldy@umn.edu", Arc::new(FailingSource));
        let cookie = session_cookie(&state, "goldy@umn.edu");
        let response = get(app(state), "/api/guilds", Some(&cookie)).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_string(response).await;
        assert_eq!(body, r#"{"error":"guild list unavailable"}"#);
        assert!(!body.contains("no such table"));
    }

    #[tokio::test]
    async fn tampered_session_is_unauthenticated() {
        let state = state("goldy@umn.edu");
        let cookie = session_cookie(&state, "goldy@umn.edu");
        let (name, value) = cookie.split_once('=').expect("pair");

        // Flip one character of the signature prefix.
        let mut bytes = value.as_bytes().to_vec();
        bytes[5] = if bytes[5] == b'u' { b'v' } else { b'u' };
        let tampered = format!("{}={}", name, String::from_utf8(bytes).expect("ascii"));

        let response = get(app(state.clone()), "/api/profile", Some(&tampered)).await;
        assert_eq!(body_string(response).await, "false");

        let response = get(app(state), "/api/guilds", Some(&tampered)).await;
        assert_eq!(body_string(response).await, "[]");
    }

    #[tokio::test]
    async fn login_redirects_to_provider_with_state_cookie() {
        let response = get(app(state("goldy@umn.edu")), "/api/auth/fake", None).await;

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            location(&response),
            Some("https://idp.example/authorize?state=fixed-csrf-state")
        );
        assert!(set_cookie_named(&response, "auth_state").is_some());
        assert!(set_cookie_named(&response, "session").is_none());
    }

    #[tokio::test]
    async fn authorized_sign_in_end_to_end() {
        let state = state("student@umn.edu");
        let callback = sign_in(state.clone(), GOOD_CODE).await;

        assert_eq!(callback.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&callback), Some("/"));
        let session = set_cookie_named(&callback, "session").expect("session cookie");

        let response = get(app(state.clone()), "/api/profile", Some(&session)).await;
        assert_eq!(body_string(response).await, "true");

        let response = get(app(state), "/api/guilds", Some(&session)).await;
        let body: serde_json::Value =
            serde_json::from_str(&body_string(response).await).expect("json");
        assert!(!body.as_array().expect("array").is_empty());
    }

    #[tokio::test]
    async fn outside_domain_sign_in_sees_nothing() {
        let state = state("someone@gmail.com");
        let callback = sign_in(state.clone(), GOOD_CODE).await;
        assert_eq!(callback.status(), StatusCode::TEMPORARY_REDIRECT);
        let session = set_cookie_named(&callback, "session").expect("session cookie");

        let response = get(app(state.clone()), "/api/profile", Some(&session)).await;
        assert_eq!(body_string(response).await, "false");

        let response = get(app(state), "/api/guilds", Some(&session)).await;
        assert_eq!(body_string(response).await, "[]");
    }

    #[tokio::test]
    async fn failed_code_exchange_is_generic_502() {
        let callback = sign_in(state("student@umn.edu"), "bad-code").await;
        assert_eq!(callback.status(), StatusCode::BAD_GATEWAY);
        assert!(set_cookie_named(&callback, "session").is_none());

        let body = body_string(callback).await;
        assert_eq!(body, "Authentication failed");
        assert!(!body.contains("invalid_grant"));
    }

    #[tokio::test]
    async fn callback_with_wrong_state_is_rejected() {
        let state = state("student@umn.edu");
        let login = get(app(state.clone()), "/api/auth/fake", None).await;
        let auth_state = set_cookie_named(&login, "auth_state").expect("auth_state cookie");

        let response = get(
            app(state),
            "/api/callback/fake?code=good-code&state=forged",
            Some(&auth_state),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(set_cookie_named(&response, "session").is_none());
        assert_eq!(body_string(response).await, "Invalid login state");
    }

    #[tokio::test]
    async fn callback_without_auth_state_is_rejected() {
        let response = get(
            app(state("student@umn.edu")),
            "/api/callback/fake?code=good-code&state=fixed-csrf-state",
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn provider_error_parameter_is_rejected() {
        let response = get(
            app(state("student@umn.edu")),
            "/api/callback/fake?error=access_denied",
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!body_string(response).await.contains("access_denied"));
    }

    #[tokio::test]
    async fn login_with_callback_params_refreshes_session() {
        let state = state("student@umn.edu");
        let login = get(app(state.clone()), "/api/auth/fake", None).await;
        let auth_state = set_cookie_named(&login, "auth_state").expect("auth_state cookie");

        let response = get(
            app(state),
            "/api/auth/fake?code=good-code&state=fixed-csrf-state",
            Some(&auth_state),
        )
        .await;

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), Some("/"));
        assert!(set_cookie_named(&response, "session").is_some());
    }

    #[tokio::test]
    async fn login_with_failing_callback_params_starts_over() {
        let state = state("student@umn.edu");
        let login = get(app(state.clone()), "/api/auth/fake", None).await;
        let auth_state = set_cookie_named(&login, "auth_state").expect("auth_state cookie");

        let response = get(
            app(state),
            "/api/auth/fake?code=bad-code&state=fixed-csrf-state",
            Some(&auth_state),
        )
        .await;

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            location(&response),
            Some("https://idp.example/authorize?state=fixed-csrf-state")
        );
        assert!(set_cookie_named(&response, "session").is_none());
    }

    #[tokio::test]
    async fn unknown_provider_is_not_found() {
        let response = get(app(state("goldy@umn.edu")), "/api/auth/github", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = get(
            app(state("goldy@umn.edu")),
            "/api/callback/github?code=x&state=y",
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn logout_expires_session_cookie() {
        let state = state("goldy@umn.edu");
        let cookie = session_cookie(&state, "goldy@umn.edu");
        let response = get(app(state), "/api/logout", Some(&cookie)).await;

        assert!(response.status().is_redirection());
        assert_eq!(location(&response), Some("/"));
        assert!(response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|c| c.starts_with("session=") && c.contains("Max-Age=0")));
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let response = get(app(state("goldy@umn.edu")), "/healthz", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "ok");
    }

    #[tokio::test]
    async fn static_files_are_served_from_fallback() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("index.html"), "<h1>Gophers</h1>").expect("write");

        let app = router(state("goldy@umn.edu"), dir.path());
        let response = get(app.clone(), "/", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "<h1>Gophers</h1>");

        let response = get(app, "/missing.js", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
