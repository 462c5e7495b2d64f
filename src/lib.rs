pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod models;
pub mod services;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use config::Config;
use database::Database;
use models::Customer;
use services::sale::SaleService;

// Shared state for every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub sales: SaleService,
}

impl AppState {
    /// Connects, migrates and makes sure the generic customer exists.
    pub async fn new(config: Config) -> anyhow::Result<Arc<Self>> {
        let db = Database::connect(&config.database).await?;
        db.run_migrations().await?;

        let mut conn = db.pool.acquire().await?;
        Customer::ensure_generic(&mut conn, &config.sales).await?;
        drop(conn);

        Ok(Self::from_database(db, config))
    }

    /// State over an already prepared database.
    pub fn from_database(db: Database, config: Config) -> Arc<Self> {
        let sales = SaleService::new(db.clone(), config.sales.clone());
        Arc::new(Self { db, config, sales })
    }
}

/// The full HTTP surface.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Cinema POS API" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", state.config.app.host, state.config.app.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app(state).into_make_service()).await?;
    Ok(())
}
