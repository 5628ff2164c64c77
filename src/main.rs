//! Lead Intake Backend
//!
//! Multi-step application wizards with incremental SQLite persistence, plus the donation
//! redirect resolver.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod redirect;
mod store;
mod validation;
mod wizard;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use redirect::RedirectResolver;
use store::RecordStore;
use wizard::WizardSessions;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub sessions: Arc<WizardSessions>,
    pub redirect: Arc<RedirectResolver>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Lead Intake Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Donation decision service: {}", config.donate_go_url);

    // Warn if PSK is not configured
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (INTAKE_API_PSK). Admin authentication is disabled!");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let store: Arc<dyn RecordStore> = Arc::new(Repository::new(pool));

    // Create application state
    let state = AppState {
        store,
        sessions: Arc::new(WizardSessions::new(config.session_ttl)),
        redirect: Arc::new(RedirectResolver::from_config(&config)),
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    // Applicant-facing wizard routes
    let wizard_routes = Router::new()
        .route("/wizards/{kind}/sessions", post(api::open_session))
        .route("/wizards/sessions/{id}", get(api::get_session))
        .route("/wizards/sessions/{id}", delete(api::close_session))
        .route("/wizards/sessions/{id}/fields", patch(api::set_field))
        .route("/wizards/sessions/{id}/lists/{field}", post(api::append_entry))
        .route(
            "/wizards/sessions/{id}/lists/{field}/{index}",
            delete(api::remove_entry),
        )
        .route("/wizards/sessions/{id}/advance", post(api::advance))
        .route("/wizards/sessions/{id}/retreat", post(api::retreat));

    // Staff read routes
    let admin_routes = Router::new()
        .route("/applications/{collection}", get(api::list_applications))
        .route("/applications/{collection}/{id}", get(api::get_application))
        .layer(middleware::from_fn(move |req, next| {
            auth::require_psk(psk.clone(), req, next)
        }));

    // Donation redirect and health check (no auth required)
    let public_routes = Router::new()
        .route("/donate", get(api::donate))
        .route("/health", get(health_check));

    Router::new()
        .nest("/api", wizard_routes.merge(admin_routes))
        .merge(public_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
