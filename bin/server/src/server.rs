//! Startup: builds the application state and serves it.

use axum_server::tls_rustls::RustlsConfig;
use rootcause::Report;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use studentrun_guilds::{GuildSource, GuildStoreError, SqliteGuildSource, StaticGuildSource};
use studentrun_platform_access::AuthenticationError;
use tracing::{info, warn};

use crate::app::{AppState, router};
use crate::auth::{GoogleProvider, OidcProvider, ProviderRegistry, SessionStore};
use crate::auth::{google::GOOGLE_PROVIDER, oidc::OIDC_PROVIDER};
use crate::config::{ConfigError, DeploymentMode, ServerConfig, TlsConfig};
use crate::redirect::https_redirect_router;

/// How long in-flight TLS connections get to finish on shutdown.
const TLS_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Builds the shared state from validated configuration.
///
/// # Errors
///
/// Returns an error if a provider cannot be set up or the guild store
/// cannot be opened.
pub async fn build_state(config: &ServerConfig) -> Result<AppState, StartupError> {
    let sessions = SessionStore::from_config(config)?;
    let policy = config.domain_policy()?;

    let mut providers = ProviderRegistry::new();
    if let Some(google) = config.google.as_ref().filter(|g| g.has_credentials()) {
        let provider = GoogleProvider::new(google, config.callback_url(GOOGLE_PROVIDER))?;
        providers.insert(Arc::new(provider));
    }
    if let Some(oidc) = config.oidc.as_ref().filter(|o| o.has_credentials()) {
        info!(issuer = oidc.issuer_url(), "Discovering OIDC provider");
        let provider = OidcProvider::discover(oidc, config.callback_url(OIDC_PROVIDER)).await?;
        providers.insert(Arc::new(provider));
    }
    info!(providers = ?providers.names(), "Identity providers ready");

    let guilds: Arc<dyn GuildSource> = match &config.database_url {
        Some(url) if !url.trim().is_empty() => {
            let source = SqliteGuildSource::connect(url)
                .await
                .map_err(StartupError::Guilds)?;
            source.ensure_schema().await.map_err(StartupError::Guilds)?;
            info!("Serving guilds from SQLite");
            Arc::new(source)
        }
        _ => {
            info!("Serving built-in guild list");
            Arc::new(StaticGuildSource::umn())
        }
    };

    Ok(AppState::new(sessions, providers, policy, guilds))
}

/// Serves the application until a shutdown signal arrives.
///
/// # Errors
///
/// Returns an error if startup fails or a listener cannot be bound.
pub async fn run(config: ServerConfig) -> Result<(), StartupError> {
    let state = build_state(&config).await?;
    let app = router(state, &config.static_dir);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    match (&config.mode, &config.tls) {
        (DeploymentMode::Production, Some(tls)) => serve_tls(app, addr, tls).await,
        (DeploymentMode::Production, None) => Err(StartupError::Config(ConfigError::MissingTls)),
        (DeploymentMode::Development, _) => {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .map_err(StartupError::Bind)?;
            info!("listening on http://{}", addr);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .map_err(StartupError::Serve)
        }
    }
}

async fn serve_tls(app: axum::Router, addr: SocketAddr, tls: &TlsConfig) -> Result<(), StartupError> {
    let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
        .await
        .map_err(StartupError::Tls)?;

    let redirect_addr = SocketAddr::from(([0, 0, 0, 0], tls.redirect_port));
    let redirect_listener = tokio::net::TcpListener::bind(redirect_addr)
        .await
        .map_err(StartupError::Bind)?;
    let https_port = addr.port();
    tokio::spawn(async move {
        info!("redirecting http://{} to HTTPS", redirect_addr);
        if let Err(e) = axum::serve(redirect_listener, https_redirect_router(https_port)).await {
            warn!(error = %e, "HTTPS redirect listener stopped");
        }
    });

    let handle = axum_server::Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.graceful_shutdown(Some(TLS_SHUTDOWN_GRACE));
    });

    info!("listening on https://{}", addr);
    axum_server::bind_rustls(addr, rustls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .map_err(StartupError::Serve)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C, shutdown signal disabled");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Errors that stop the server from starting or serving.
#[derive(Debug)]
pub enum StartupError {
    Config(ConfigError),
    Provider(AuthenticationError),
    Guilds(Report<GuildStoreError>),
    Bind(std::io::Error),
    Tls(std::io::Error),
    Serve(std::io::Error),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "{}", e),
            Self::Provider(e) => write!(f, "identity provider setup failed: {}", e),
            Self::Guilds(e) => write!(f, "guild store unavailable: {}", e),
            Self::Bind(e) => write!(f, "failed to bind listener: {}", e),
            Self::Tls(e) => write!(f, "failed to load TLS certificate: {}", e),
            Self::Serve(e) => write!(f, "server error: {}", e),
        }
    }
}

impl From<ConfigError> for StartupError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<AuthenticationError> for StartupError {
    fn from(e: AuthenticationError) -> Self {
        Self::Provider(e)
    }
}
