//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use anyhow::Context;
use auth::application::config::SameSite;
use auth::infra::mailer::SmtpSettings;
use auth::{
    AuthAppState, AuthConfig, MemoryUserRepository, PgUserRepository, SmtpMailer, UserBackend,
    auth_router,
};
use axum::{
    Json, Router,
    http::{self, Method, header},
    routing::get,
};
use kernel::error::app_error::AppError;
use platform::rate_limit::StoreBackend;
use serde_json::{Value, json};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Sweep interval for the in-memory rate-limit store
const PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,platform=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // User storage
    let users = match non_empty_var("DATABASE_URL") {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&database_url)
                .await?;

            tracing::info!("Connected to database");

            sqlx::migrate!("../../../database/migrations")
                .run(&pool)
                .await?;

            tracing::info!("Migrations completed");
            UserBackend::from(PgUserRepository::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; users are kept in memory");
            UserBackend::from(MemoryUserRepository::new())
        }
    };

    // Rate-limit store
    let store = StoreBackend::from_url(non_empty_var("REDIS_URL").as_deref()).await?;
    tracing::info!(backend = store.name(), "Rate-limit store ready");

    if let Some(memory) = store.as_memory().cloned() {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(PURGE_INTERVAL);
            loop {
                interval.tick().await;
                match memory.purge_expired() {
                    Ok(0) => {}
                    Ok(purged) => tracing::debug!(purged, "Expired store entries purged"),
                    Err(e) => tracing::warn!(error = %e, "Store purge failed"),
                }
            }
        });
    }

    // Mail
    let mailer = SmtpMailer::new(&smtp_settings()?)?;
    tracing::info!(enabled = mailer.is_enabled(), "Mailer ready");

    let config = auth_config()?;
    let state = AuthAppState::new(users, store, mailer, config);

    // CORS configuration
    let frontend_origins =
        env::var("FRONTEND_ORIGINS").unwrap_or_else(|_| "http://localhost:3000".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .route("/", get(root))
        .nest("/api", auth_router(state))
        .fallback(|| async { AppError::not_found("Route not found!") })
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        );

    // Start server
    let host: IpAddr = env::var("HOST")
        .unwrap_or_else(|_| "0.0.0.0".to_string())
        .parse()
        .context("HOST must be an IP address")?;
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "6001".to_string())
        .parse()
        .context("PORT must be a number")?;
    let addr = SocketAddr::from((host, port));
    tracing::info!("Auth service listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// GET /
async fn root() -> Json<Value> {
    Json(json!({ "message": "Auth service is up" }))
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn auth_config() -> anyhow::Result<AuthConfig> {
    let mut config = if cfg!(debug_assertions) {
        // Random secrets unless provided, so local runs need no setup
        let mut config = AuthConfig::development();
        if let Some(secret) = non_empty_var("JWT_SECRET") {
            config.access_token_secret = secret.into_bytes();
        }
        if let Some(secret) = non_empty_var("REFRESH_TOKEN_SECRET") {
            config.refresh_token_secret = secret.into_bytes();
        }
        config
    } else {
        let access = non_empty_var("JWT_SECRET").context("JWT_SECRET must be set in production")?;
        let refresh = non_empty_var("REFRESH_TOKEN_SECRET")
            .context("REFRESH_TOKEN_SECRET must be set in production")?;
        AuthConfig::with_secrets(access, refresh)
    };

    if let Some(secure) = non_empty_var("COOKIE_SECURE") {
        config.cookie_secure = matches!(
            secure.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes"
        );
    }
    if let Some(same_site) = non_empty_var("COOKIE_SAME_SITE") {
        config.cookie_same_site = SameSite::parse(&same_site)
            .with_context(|| format!("Invalid COOKIE_SAME_SITE: {same_site}"))?;
    }
    config.password_pepper = non_empty_var("PASSWORD_PEPPER").map(String::into_bytes);

    if config.cookie_same_site == SameSite::None && !config.cookie_secure {
        tracing::warn!("SameSite=None cookies without Secure are rejected by browsers");
    }

    Ok(config)
}

fn smtp_settings() -> anyhow::Result<SmtpSettings> {
    let defaults = SmtpSettings::default();
    let port = match non_empty_var("SMTP_PORT") {
        Some(port) => port.parse().context("SMTP_PORT must be a number")?,
        None => defaults.port,
    };

    Ok(SmtpSettings {
        host: env::var("SMTP_HOST").unwrap_or_default(),
        port,
        username: non_empty_var("SMTP_USER"),
        password: non_empty_var("SMTP_PASS"),
        from: non_empty_var("SMTP_FROM").unwrap_or(defaults.from),
    })
}
