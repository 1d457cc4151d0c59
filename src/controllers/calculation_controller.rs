use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use crate::errors::{AppError, CalcError, ReportError};
use crate::models::calculation::{
    BatteryInfo, CalculateRequest, CalculateResponse, CalculationResponse, EquipmentCatalog,
    ErrorResponse, HistoryResponse, InverterInfo, NewCalculation, PanelInfo, RegionInfo,
};
use crate::services::catalog::{BatteryType, InverterType, PanelType, REGIONS};
use crate::services::{report_service, solar_calculator};
use crate::shared_state::AppState;

/// POST /api/calculate
/// Run a calculation and record it
///
/// Missing fields take their defaults. The result is returned even when it
/// could not be stored; `calculation_id` is then `null`.
#[utoipa::path(
    post,
    path = "/api/calculate",
    request_body = CalculateRequest,
    responses(
        (status = 200, description = "Calculation result", body = CalculateResponse),
        (status = 400, description = "Unknown equipment or malformed input", body = ErrorResponse)
    )
)]
pub async fn calculate(
    State(state): State<AppState>,
    payload: Result<Json<CalculateRequest>, JsonRejection>,
) -> Result<Json<CalculateResponse>, AppError> {
    let Json(request) = payload.map_err(|rejection| CalcError::malformed("body", rejection.body_text()))?;

    let result = solar_calculator::compute(&request.input)?;

    let record = NewCalculation {
        input: request.input,
        result: result.clone(),
        language: request.language,
    };
    let calculation_id = match state.store.save(record).await {
        Ok(id) => {
            tracing::info!("calculation {} saved ({})", id, state.store.backend_name());
            Some(id)
        }
        Err(e) => {
            tracing::warn!("calculation not saved: {}", e);
            None
        }
    };

    Ok(Json(CalculateResponse {
        success: true,
        data: result,
        calculation_id,
    }))
}

/// GET /api/calculations-history
/// Most recent calculations, newest first
#[utoipa::path(
    get,
    path = "/api/calculations-history",
    responses(
        (status = 200, description = "Recent calculations", body = HistoryResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    )
)]
pub async fn history(State(state): State<AppState>) -> Result<Json<HistoryResponse>, AppError> {
    let data = state.store.list_recent(state.history_limit).await?;
    Ok(Json(HistoryResponse { success: true, data }))
}

/// GET /api/calculations/{id}
/// Stored input and result of one calculation
#[utoipa::path(
    get,
    path = "/api/calculations/{id}",
    params(
        ("id" = i64, Path, description = "Calculation id returned by /api/calculate")
    ),
    responses(
        (status = 200, description = "Stored calculation", body = CalculationResponse),
        (status = 404, description = "Calculation not found", body = ErrorResponse)
    )
)]
pub async fn get_calculation(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<CalculationResponse>, AppError> {
    let data = state.store.get(id).await?.ok_or(AppError::NotFound(id))?;
    Ok(Json(CalculationResponse { success: true, data }))
}

/// GET /api/export-pdf/{id}
/// Download the PDF report of a stored calculation
#[utoipa::path(
    get,
    path = "/api/export-pdf/{id}",
    params(
        ("id" = i64, Path, description = "Calculation id")
    ),
    responses(
        (status = 200, description = "PDF report", content_type = "application/pdf", body = Vec<u8>),
        (status = 404, description = "Calculation not found", body = ErrorResponse),
        (status = 500, description = "Report rendering failed", body = ErrorResponse)
    )
)]
pub async fn export_pdf(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let calc = state.store.get(id).await?.ok_or(AppError::NotFound(id))?;

    let pdf = tokio::task::spawn_blocking(move || report_service::render_pdf(&calc))
        .await
        .map_err(|e| ReportError::Render(e.to_string()))??;
    tracing::info!("report for calculation {} rendered ({} bytes)", id, pdf.len());

    let disposition = format!("attachment; filename=\"solar_calculation_{}.pdf\"", id);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response())
}

/// GET /api/equipment
/// Panel, inverter and battery options with their parameters
#[utoipa::path(
    get,
    path = "/api/equipment",
    responses(
        (status = 200, description = "Equipment catalog", body = EquipmentCatalog)
    )
)]
pub async fn equipment() -> Json<EquipmentCatalog> {
    let panels = PanelType::ALL
        .iter()
        .map(|&p| {
            let spec = p.spec();
            PanelInfo {
                key: p.key().to_string(),
                name: p.display_name().to_string(),
                efficiency: spec.efficiency,
                annual_degradation: spec.annual_degradation,
                price_per_watt: spec.price_per_watt,
            }
        })
        .collect();

    let inverters = InverterType::ALL
        .iter()
        .map(|&i| {
            let spec = i.spec();
            InverterInfo {
                key: i.key().to_string(),
                name: i.display_name().to_string(),
                efficiency: spec.efficiency,
                lifetime_years: spec.lifetime_years,
                price_per_kw: spec.price_per_kw,
            }
        })
        .collect();

    let batteries = BatteryType::ALL
        .iter()
        .map(|&b| {
            let spec = b.spec();
            BatteryInfo {
                key: b.key().to_string(),
                name: b.display_name().to_string(),
                efficiency: spec.efficiency,
                cycle_life: spec.cycle_life,
                price_per_kwh: spec.price_per_kwh,
            }
        })
        .collect();

    Json(EquipmentCatalog { panels, inverters, batteries })
}

/// GET /api/regions
/// Known regions with their insolation profiles
///
/// Any other region name is calculated with the Moscow profile.
#[utoipa::path(
    get,
    path = "/api/regions",
    responses(
        (status = 200, description = "Region profiles", body = Vec<RegionInfo>)
    )
)]
pub async fn regions() -> Json<Vec<RegionInfo>> {
    let list = REGIONS
        .iter()
        .map(|r| RegionInfo {
            name: r.name.to_string(),
            local_name: r.local_name.to_string(),
            annual_irradiance_factor: r.annual_irradiance_factor,
            monthly_weights: r.monthly_weights.to_vec(),
        })
        .collect();
    Json(list)
}
