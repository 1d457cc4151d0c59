use utoipa::OpenApi;
use crate::controllers::calculation_controller;
use crate::models::calculation;

#[derive(OpenApi)]
#[openapi(
    paths(
        calculation_controller::calculate,
        calculation_controller::history,
        calculation_controller::get_calculation,
        calculation_controller::export_pdf,
        calculation_controller::equipment,
        calculation_controller::regions
    ),
    components(
        schemas(
            calculation::CalculationInput,
            calculation::CalculateRequest,
            calculation::CalculationResult,
            calculation::TechnicalMetrics,
            calculation::EconomicMetrics,
            calculation::EnvironmentalMetrics,
            calculation::StoredCalculation,
            calculation::CalculateResponse,
            calculation::HistoryResponse,
            calculation::CalculationResponse,
            calculation::ErrorResponse,
            calculation::EquipmentCatalog,
            calculation::PanelInfo,
            calculation::InverterInfo,
            calculation::BatteryInfo,
            calculation::RegionInfo
        )
    ),
    tags(
        (name = "solar-calc", description = "Solar installation calculator API")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/calculate",
            "/api/calculations-history",
            "/api/calculations/{id}",
            "/api/export-pdf/{id}",
            "/api/equipment",
            "/api/regions",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
