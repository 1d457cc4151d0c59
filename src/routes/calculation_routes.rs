use axum::{routing::{get, post}, Router};
use crate::controllers::calculation_controller::{
    // Calculations
    calculate, history, get_calculation, export_pdf,
    // Reference data
    equipment, regions,
};
use crate::shared_state::AppState;

/// Build the `/api/*` sub-router.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/calculate",              post(calculate))
        .route("/calculations-history",   get(history))
        .route("/calculations/{id}",      get(get_calculation))
        .route("/export-pdf/{id}",        get(export_pdf))
        .route("/equipment",              get(equipment))
        .route("/regions",                get(regions))
        .with_state(state)
}
