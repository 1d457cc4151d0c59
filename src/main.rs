mod routes;
mod controllers;
mod services;
mod models;
mod storage;
mod errors;
mod api_docs;
mod shared_state;
mod config;

use std::net::SocketAddr;
use axum::{Router, routing::get, response::Html};
use crate::routes::calculation_routes::api_routes;
use utoipa::OpenApi;
use utoipa_scalar::Scalar;
use crate::api_docs::ApiDoc;
use crate::shared_state::AppState;
use crate::config::Config;

use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 1. Load configuration
    let config_path = std::env::var("SOLAR_CALC_CONFIG").unwrap_or_else(|_| "config.json".to_string());
    let config = Config::load_or_default(&config_path).map_err(|e| {
        tracing::error!("Failed to load {}: {}", config_path, e);
        e
    })?;

    // 2. Open calculation storage
    let store = storage::open(&config.storage).await?;
    tracing::info!("Calculation storage: {}", store.backend_name());

    // 3. Initialize shared state
    let state = AppState::new(store, &config);

    // 4. Start Axum HTTP server
    let app = Router::new()
        .nest("/api", api_routes(state))
        .route("/scalar", get(|| async {
            Html(Scalar::new(ApiDoc::openapi()).to_html())
        }))
        .fallback_service(ServeDir::new(&config.server.static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port).parse()?;
    tracing::info!("API Server listening on http://{}", addr);
    tracing::info!("Scalar UI: http://{}/scalar", addr);

    axum_server::bind(addr)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
