use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::lenient;

// ─── Calculation input ───────────────────────────────────────────────────────

/// Equipment and site parameters for one calculation.
///
/// Every field is optional on the wire; absent fields take the defaults of
/// `CalculationInput::default()`. Numeric fields also accept numeric strings,
/// and the legacy form names (`panel_power`, `battery_capacity`, `roof_angle`,
/// `azimuth`, `electricity_price`) are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct CalculationInput {
    /// Panel technology key: `mono`, `poly` or `thin_film`
    #[schema(example = "mono")]
    pub panel_type: String,
    #[serde(deserialize_with = "lenient::count")]
    pub panel_count: u32,
    /// Rated power of a single panel (W)
    #[serde(alias = "panel_power", deserialize_with = "lenient::number")]
    pub panel_power_watts: f64,
    /// Inverter key: `string`, `micro` or `hybrid`
    #[schema(example = "string")]
    pub inverter_type: String,
    /// Battery key: `lead_acid`, `lifepo4` or `li_ion`
    #[schema(example = "lifepo4")]
    pub battery_type: String,
    /// Storage capacity (kWh); 0 means no battery
    #[serde(alias = "battery_capacity", deserialize_with = "lenient::number")]
    pub battery_capacity_kwh: f64,
    #[schema(example = "Moscow")]
    pub region: String,
    #[serde(alias = "roof_angle", deserialize_with = "lenient::number")]
    pub roof_tilt_degrees: f64,
    /// Signed deviation from true south, −180..180
    #[serde(alias = "azimuth", deserialize_with = "lenient::number")]
    pub azimuth_degrees: f64,
    #[serde(alias = "electricity_price", deserialize_with = "lenient::number")]
    pub electricity_price_per_kwh: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub installation_cost: f64,
}

impl Default for CalculationInput {
    fn default() -> Self {
        Self {
            panel_type: "mono".to_string(),
            panel_count: 10,
            panel_power_watts: 450.0,
            inverter_type: "string".to_string(),
            battery_type: "lifepo4".to_string(),
            battery_capacity_kwh: 0.0,
            region: "Moscow".to_string(),
            roof_tilt_degrees: 35.0,
            azimuth_degrees: 0.0,
            electricity_price_per_kwh: 5.0,
            installation_cost: 50000.0,
        }
    }
}

fn default_language() -> String {
    "ru".to_string()
}

/// Body of `POST /api/calculate`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CalculateRequest {
    #[serde(flatten)]
    pub input: CalculationInput,
    /// UI language the calculation was made in, stored for history views
    #[serde(default = "default_language")]
    pub language: String,
}

// ─── Calculation result ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TechnicalMetrics {
    /// Nameplate DC power (W)
    pub total_power: f64,
    /// Panel area (m²), 2 dp
    pub total_area: f64,
    /// kWh/year, 0 dp
    pub annual_generation: f64,
    /// kWh/day, 2 dp
    pub daily_generation: f64,
    /// Percent, 1 dp
    pub system_efficiency: f64,
    /// Hours at 70 % load draw, 1 dp
    pub battery_backup_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EconomicMetrics {
    pub equipment_cost: f64,
    pub total_cost: f64,
    pub annual_savings: f64,
    /// Years, 1 dp; 0 when there are no savings
    pub payback_years: f64,
    /// Percent, 1 dp
    pub roi_25years: f64,
    /// kWh over 25 years with degradation
    pub total_25year_generation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EnvironmentalMetrics {
    /// kg CO₂ per year
    pub co2_saved_annual: f64,
    pub trees_equivalent: f64,
    /// kg CO₂ over 25 years
    pub co2_saved_25years: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CalculationResult {
    pub technical: TechnicalMetrics,
    pub economic: EconomicMetrics,
    pub environmental: EnvironmentalMetrics,
    /// kWh per month, January first, 2 dp each
    pub monthly_generation: Vec<f64>,
    /// The input the result was computed from
    pub input_data: CalculationInput,
}

// ─── Persisted records ───────────────────────────────────────────────────────

/// A calculation about to be persisted.
#[derive(Debug, Clone)]
pub struct NewCalculation {
    pub input: CalculationInput,
    pub result: CalculationResult,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoredCalculation {
    pub id: i64,
    pub input_data: CalculationInput,
    pub result_data: CalculationResult,
    pub language: String,
    pub created_at: DateTime<Utc>,
}

// ─── REST API response types ──────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct CalculateResponse {
    pub success: bool,
    pub data: CalculationResult,
    /// `null` when the calculation could not be persisted
    pub calculation_id: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryResponse {
    pub success: bool,
    pub data: Vec<StoredCalculation>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CalculationResponse {
    pub success: bool,
    pub data: StoredCalculation,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PanelInfo {
    pub key: String,
    pub name: String,
    pub efficiency: f64,
    pub annual_degradation: f64,
    pub price_per_watt: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InverterInfo {
    pub key: String,
    pub name: String,
    pub efficiency: f64,
    pub lifetime_years: u32,
    pub price_per_kw: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatteryInfo {
    pub key: String,
    pub name: String,
    pub efficiency: f64,
    pub cycle_life: u32,
    pub price_per_kwh: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EquipmentCatalog {
    pub panels: Vec<PanelInfo>,
    pub inverters: Vec<InverterInfo>,
    pub batteries: Vec<BatteryInfo>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegionInfo {
    pub name: String,
    pub local_name: String,
    pub annual_irradiance_factor: f64,
    pub monthly_weights: Vec<f64>,
}
