mod error;
mod routes;
mod storage;

use axum::{
    Router,
    extract::FromRef,
    routing::{any, get, post, put},
};
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use storage::Db;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: AppConfig,
    pub http: reqwest::Client,
}

/// Server configuration loaded from environment variables.
#[derive(Clone)]
pub struct AppConfig {
    pub base_url: String,
    pub backend_url: Option<String>,
}

impl FromRef<AppState> for Db {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zimmr_server=info,tower_http=info".into()),
        )
        .init();

    // Data directory
    let data_dir = std::env::var("ZIMMR_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"));

    tracing::info!("data directory: {}", data_dir.display());

    // Initialize database
    let db = storage::init_db(&data_dir)?;
    tracing::info!("database initialized");

    let base_url = std::env::var("BASE_URL")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "http://localhost:3000".into());

    let backend_url = std::env::var("BACKEND_URL").ok().filter(|s| !s.is_empty());
    match backend_url {
        Some(ref url) => tracing::info!("proxy backend: {url}"),
        None => tracing::info!("proxy backend not configured"),
    }

    let config = AppConfig {
        base_url: base_url.clone(),
        backend_url,
    };

    let http = reqwest::Client::builder().build()?;

    let state = AppState { db, config, http };

    // Build API routes
    let api = Router::new()
        // Health
        .route("/health", get(routes::health::health))
        // Auth
        .route("/register", post(routes::auth::register))
        .route("/auth/verify", post(routes::auth::verify))
        .route(
            "/auth/me",
            get(routes::auth::me).put(routes::auth::update_me),
        )
        .route("/auth/regenerate-key", post(routes::auth::regenerate_key))
        // Customers
        .route(
            "/customers",
            post(routes::customers::create).get(routes::customers::list),
        )
        .route(
            "/customers/{id}",
            get(routes::customers::get)
                .put(routes::customers::update)
                .delete(routes::customers::delete),
        )
        // Appointments
        .route(
            "/appointments",
            post(routes::appointments::create).get(routes::appointments::list),
        )
        .route(
            "/appointments/{id}",
            get(routes::appointments::get)
                .put(routes::appointments::update)
                .delete(routes::appointments::delete),
        )
        .route(
            "/appointments/{id}/complete",
            post(routes::appointments::complete),
        )
        .route(
            "/appointments/{id}/cancel",
            post(routes::appointments::cancel),
        )
        // Materials catalog
        .route(
            "/materials",
            post(routes::materials::create).get(routes::materials::list),
        )
        .route(
            "/materials/{id}",
            get(routes::materials::get)
                .put(routes::materials::update)
                .delete(routes::materials::delete),
        )
        // Invoices
        .route(
            "/invoices",
            post(routes::invoices::create).get(routes::invoices::list),
        )
        .route(
            "/invoices/{id}",
            get(routes::invoices::get)
                .put(routes::invoices::update)
                .delete(routes::invoices::delete),
        )
        .route("/invoices/{id}/status", post(routes::invoices::set_status))
        // Quotes
        .route(
            "/quotes",
            post(routes::quotes::create).get(routes::quotes::list),
        )
        .route(
            "/quotes/{id}",
            get(routes::quotes::get)
                .put(routes::quotes::update)
                .delete(routes::quotes::delete),
        )
        .route("/quotes/{id}/status", post(routes::quotes::set_status))
        .route("/quotes/{id}/convert", post(routes::quotes::convert))
        // Notes
        .route("/notes", post(routes::notes::create).get(routes::notes::list))
        .route(
            "/notes/{id}",
            get(routes::notes::get)
                .put(routes::notes::update)
                .delete(routes::notes::delete),
        )
        // Time tracking
        .route("/time-tracking", get(routes::time_tracking::list))
        .route("/time-tracking/start", post(routes::time_tracking::start))
        .route(
            "/time-tracking/{id}",
            put(routes::time_tracking::update).delete(routes::time_tracking::delete),
        )
        .route(
            "/time-tracking/{id}/stop",
            post(routes::time_tracking::stop),
        )
        // Finances
        .route(
            "/finances/expenses",
            post(routes::finances::create_expense).get(routes::finances::list_expenses),
        )
        .route(
            "/finances/expenses/{id}",
            put(routes::finances::update_expense).delete(routes::finances::delete_expense),
        )
        .route("/finances/goal", put(routes::finances::set_goal))
        .route("/finances/summary", get(routes::finances::summary))
        // Generic backend proxy
        .route("/proxy/{*path}", any(routes::proxy::forward));

    let app = Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    tracing::info!("starting server at {base_url}");

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".into());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
