//! Turnstile server entry point.

mod api;
mod auth;
mod config;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auth::AppState;
use config::ServerConfig;
use std::sync::Arc;
use turnstile_identity::OidcClient;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment; missing identity settings stop
    // the process here.
    let ServerConfig {
        listen_addr,
        gate,
        identity,
    } = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    tracing::info!("Discovering identity provider...");
    let oidc_client = OidcClient::discover(identity)
        .await
        .expect("failed to discover identity provider");

    let app_state = Arc::new(AppState::new(oidc_client, gate));

    let app = Router::new()
        // Auth routes
        .route("/auth/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/logout", get(auth::logout))
        // Gated API routes
        .route("/api/me", get(api::me))
        .route("/api/staff/overview", get(api::staff_overview))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", listen_addr);

    axum::serve(listener, app)
        .await
        .expect("server error");
}
