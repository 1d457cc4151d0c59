//! ============================================================
//!  Solar installation performance estimator
//!
//!  Pipeline (single pass, no I/O, no hidden state):
//!   1. Resolve panel / inverter / battery from the catalog
//!   2. Nameplate power & panel area
//!   3. Annual yield   – region insolation × tilt × azimuth
//!   4. System efficiency (panel × inverter [× battery])
//!   5. Costs, savings, payback
//!   6. 25-year yield with geometric panel degradation
//!   7. ROI, CO₂ and tree equivalent
//!   8. Battery autonomy at 70 % load
//!   9. Monthly split by regional seasonal weights
//! ============================================================

use crate::errors::CalcError;
use crate::models::calculation::{
    CalculationInput, CalculationResult, EconomicMetrics, EnvironmentalMetrics, TechnicalMetrics,
};
use crate::services::catalog::{region_profile, BatteryType, InverterType, PanelType};

// ─── Model constants ─────────────────────────────────────────
/// Tilt at which the angle factor peaks (deg)
pub const REFERENCE_TILT_DEG: f64 = 35.0;
/// Output penalty when facing due north (±180°)
pub const MAX_AZIMUTH_PENALTY: f64 = 0.2;
pub const ANALYSIS_YEARS: i32 = 25;
/// Flat allowance for inflation and maintenance over the analysis period
pub const SAVINGS_RETENTION: f64 = 0.8;
/// Grid emission factor (kg CO₂ per kWh)
pub const CO2_KG_PER_KWH: f64 = 0.5;
/// CO₂ absorbed by one tree per year (kg)
pub const CO2_KG_PER_TREE: f64 = 21.77;
/// Share of nameplate power drawn while running on battery
pub const BACKUP_LOAD_FRACTION: f64 = 0.7;

/// Main entry point. Pure function of `input` and the static catalog.
pub fn compute(input: &CalculationInput) -> Result<CalculationResult, CalcError> {
    // ── 1. Equipment ──────────────────────────────────────────
    let panel = input.panel_type.parse::<PanelType>()?.spec();
    let inverter = input.inverter_type.parse::<InverterType>()?.spec();
    let battery = input.battery_type.parse::<BatteryType>()?.spec();
    validate(input)?;

    let has_battery = input.battery_capacity_kwh > 0.0;

    // ── 2. Size ───────────────────────────────────────────────
    let total_power_w = input.panel_count as f64 * input.panel_power_watts;
    let total_area_m2 = total_power_w / (1000.0 * panel.efficiency);

    // ── 3. Yield ──────────────────────────────────────────────
    let annual_kwh = annual_generation(
        total_power_w,
        panel.efficiency,
        input.roof_tilt_degrees,
        input.azimuth_degrees,
        &input.region,
    );

    // ── 4. Efficiency chain ───────────────────────────────────
    let mut system_efficiency = panel.efficiency * inverter.efficiency;
    if has_battery {
        system_efficiency *= battery.efficiency;
    }

    // ── 5. Economics ──────────────────────────────────────────
    let equipment_cost = total_power_w * panel.price_per_watt
        + (total_power_w / 1000.0) * inverter.price_per_kw
        + input.battery_capacity_kwh * battery.price_per_kwh;
    let total_cost = equipment_cost + input.installation_cost;
    let annual_savings = annual_kwh * input.electricity_price_per_kwh;
    let payback_years = if annual_savings > 0.0 { total_cost / annual_savings } else { 0.0 };

    // ── 6. Degradation ────────────────────────────────────────
    let total_25year_kwh = lifetime_generation(annual_kwh, panel.annual_degradation, ANALYSIS_YEARS);

    // ── 7. ROI & environment ──────────────────────────────────
    let total_savings = annual_savings * ANALYSIS_YEARS as f64 * SAVINGS_RETENTION;
    let roi_pct = if total_cost > 0.0 {
        (total_savings - total_cost) / total_cost * 100.0
    } else {
        0.0
    };
    let co2_annual_kg = annual_kwh * CO2_KG_PER_KWH;
    let trees = co2_annual_kg / CO2_KG_PER_TREE;

    // ── 8. Autonomy ───────────────────────────────────────────
    let backup_hours = if has_battery && total_power_w > 0.0 {
        input.battery_capacity_kwh * 1000.0 / (total_power_w * BACKUP_LOAD_FRACTION)
    } else {
        0.0
    };

    // ── 9. Seasonal split ─────────────────────────────────────
    let monthly = monthly_generation(annual_kwh, &input.region);

    Ok(CalculationResult {
        technical: TechnicalMetrics {
            total_power: total_power_w,
            total_area: round_to(total_area_m2, 2),
            annual_generation: round_to(annual_kwh, 0),
            daily_generation: round_to(annual_kwh / 365.0, 2),
            system_efficiency: round_to(system_efficiency * 100.0, 1),
            battery_backup_hours: round_to(backup_hours, 1),
        },
        economic: EconomicMetrics {
            equipment_cost: round_to(equipment_cost, 0),
            total_cost: round_to(total_cost, 0),
            annual_savings: round_to(annual_savings, 0),
            payback_years: round_to(payback_years, 1),
            roi_25years: round_to(roi_pct, 1),
            total_25year_generation: round_to(total_25year_kwh, 0),
        },
        environmental: EnvironmentalMetrics {
            co2_saved_annual: round_to(co2_annual_kg, 0),
            trees_equivalent: round_to(trees, 0),
            co2_saved_25years: round_to(co2_annual_kg * ANALYSIS_YEARS as f64, 0),
        },
        monthly_generation: monthly,
        input_data: input.clone(),
    })
}

/// Domain checks that parsing alone cannot express.
fn validate(input: &CalculationInput) -> Result<(), CalcError> {
    if !(input.panel_power_watts.is_finite() && input.panel_power_watts > 0.0) {
        return Err(CalcError::malformed("panel_power_watts", "must be a positive number"));
    }
    if !(input.battery_capacity_kwh.is_finite() && input.battery_capacity_kwh >= 0.0) {
        return Err(CalcError::malformed("battery_capacity_kwh", "must be zero or positive"));
    }
    let finite = [
        ("roof_tilt_degrees", input.roof_tilt_degrees),
        ("azimuth_degrees", input.azimuth_degrees),
        ("electricity_price_per_kwh", input.electricity_price_per_kwh),
        ("installation_cost", input.installation_cost),
    ];
    for (field, value) in finite {
        if !value.is_finite() {
            return Err(CalcError::malformed(field, "must be a finite number"));
        }
    }
    Ok(())
}

/// Annual yield in kWh, never negative.
///
/// `angle_factor` follows a cosine around the 35° reference tilt and turns
/// negative past ±90° of deviation; the floor at zero absorbs that.
pub fn annual_generation(
    total_power_w: f64,
    panel_efficiency: f64,
    roof_tilt_deg: f64,
    azimuth_deg: f64,
    region: &str,
) -> f64 {
    let base_factor = region_profile(region).annual_irradiance_factor;
    let angle_factor = (roof_tilt_deg - REFERENCE_TILT_DEG).to_radians().cos();
    let azimuth_factor = 1.0 - azimuth_deg.abs() / 180.0 * MAX_AZIMUTH_PENALTY;

    (total_power_w * base_factor * panel_efficiency * angle_factor * azimuth_factor).max(0.0)
}

/// Splits the annual yield over 12 months by the region's seasonal weights.
/// Entries are rounded to 2 dp.
pub fn monthly_generation(annual_kwh: f64, region: &str) -> Vec<f64> {
    let weights = &region_profile(region).monthly_weights;
    let total: f64 = weights.iter().sum();

    weights
        .iter()
        .map(|w| {
            if total > 0.0 {
                round_to(annual_kwh * w / total, 2)
            } else {
                0.0
            }
        })
        .collect()
}

/// Cumulative yield over `years` with output falling by `annual_degradation`
/// every year (sum of a geometric series). A zero-degradation panel takes the
/// limiting case `annual × years`.
pub fn lifetime_generation(annual_kwh: f64, annual_degradation: f64, years: i32) -> f64 {
    if annual_degradation.abs() < f64::EPSILON {
        return annual_kwh * years as f64;
    }
    let degradation_factor = (1.0 - annual_degradation).powi(years);
    annual_kwh * (1.0 - degradation_factor) / annual_degradation
}

/// Round to `decimals` places, ties to even (`346.5` → `346`).
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::REGIONS;

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn test_reference_scenario() {
        let r = compute(&CalculationInput::default()).unwrap();

        assert_eq!(r.technical.total_power, 4500.0);
        assert_eq!(r.technical.total_area, 20.45);
        assert_eq!(r.technical.annual_generation, 3465.0);
        assert_eq!(r.technical.daily_generation, 9.49);
        assert_eq!(r.technical.system_efficiency, 21.3);
        assert_eq!(r.technical.battery_backup_hours, 0.0);

        assert_eq!(r.economic.equipment_cost, 225000.0);
        assert_eq!(r.economic.total_cost, 275000.0);
        assert_eq!(r.economic.annual_savings, 17325.0);
        assert_eq!(r.economic.payback_years, 15.9);
        assert_eq!(r.economic.roi_25years, 26.0);
        // 3465 × (1 − 0.995^25) / 0.005 ≈ 3465 × 23.555
        assert_eq!(r.economic.total_25year_generation, 81621.0,
            "got {}", r.economic.total_25year_generation);

        assert_eq!(r.environmental.co2_saved_annual, 1732.0);
        assert_eq!(r.environmental.trees_equivalent, 80.0);
        assert_eq!(r.environmental.co2_saved_25years, 43312.0);

        assert_eq!(r.monthly_generation.len(), 12);
        assert_eq!(r.input_data, CalculationInput::default());
    }

    #[test]
    fn test_compute_is_deterministic() {
        let input = CalculationInput {
            panel_type: "thin_film".into(),
            panel_count: 17,
            panel_power_watts: 380.5,
            inverter_type: "hybrid".into(),
            battery_type: "li_ion".into(),
            battery_capacity_kwh: 7.5,
            region: "Vladivostok".into(),
            roof_tilt_degrees: 22.0,
            azimuth_degrees: -40.0,
            electricity_price_per_kwh: 6.1,
            installation_cost: 42000.0,
        };
        assert_eq!(compute(&input).unwrap(), compute(&input).unwrap());
    }

    #[test]
    fn test_battery_backup_hours() {
        let input = CalculationInput { battery_capacity_kwh: 10.0, ..Default::default() };
        let r = compute(&input).unwrap();
        // 10 × 1000 / (4500 × 0.7) = 3.17
        assert_eq!(r.technical.battery_backup_hours, 3.2);
        // battery round-trip losses enter the efficiency chain: 0.22 × 0.97 × 0.95
        assert_eq!(r.technical.system_efficiency, 20.3);
        assert_eq!(r.economic.equipment_cost, 225000.0 + 150000.0);
    }

    #[test]
    fn test_battery_without_panels_has_no_backup_hours() {
        let input = CalculationInput { panel_count: 0, battery_capacity_kwh: 5.0, ..Default::default() };
        let r = compute(&input).unwrap();
        assert_eq!(r.technical.total_power, 0.0);
        assert_eq!(r.technical.battery_backup_hours, 0.0);
        assert_eq!(r.economic.payback_years, 0.0);
    }

    #[test]
    fn test_zero_price_gives_zero_payback() {
        let input = CalculationInput { electricity_price_per_kwh: 0.0, ..Default::default() };
        let r = compute(&input).unwrap();
        assert_eq!(r.economic.annual_savings, 0.0);
        assert_eq!(r.economic.payback_years, 0.0);
        assert_eq!(r.economic.roi_25years, -100.0);
    }

    #[test]
    fn test_zero_total_cost_gives_zero_roi() {
        let input = CalculationInput { panel_count: 0, installation_cost: 0.0, ..Default::default() };
        let r = compute(&input).unwrap();
        assert_eq!(r.economic.total_cost, 0.0);
        assert_eq!(r.economic.roi_25years, 0.0);
    }

    #[test]
    fn test_unknown_equipment_is_rejected() {
        for input in [
            CalculationInput { panel_type: "bifacial".into(), ..Default::default() },
            CalculationInput { inverter_type: "central".into(), ..Default::default() },
            CalculationInput { battery_type: "flow".into(), ..Default::default() },
        ] {
            let err = compute(&input).unwrap_err();
            assert!(matches!(err, CalcError::InvalidEquipmentSelection { .. }), "{:?}", err);
        }
    }

    #[test]
    fn test_out_of_domain_numbers_are_rejected() {
        let cases = [
            CalculationInput { panel_power_watts: 0.0, ..Default::default() },
            CalculationInput { panel_power_watts: -450.0, ..Default::default() },
            CalculationInput { battery_capacity_kwh: -1.0, ..Default::default() },
            CalculationInput { installation_cost: f64::NAN, ..Default::default() },
            CalculationInput { roof_tilt_degrees: f64::INFINITY, ..Default::default() },
        ];
        for input in cases {
            let err = compute(&input).unwrap_err();
            assert!(matches!(err, CalcError::MalformedInput { .. }), "{:?}", err);
        }
    }

    #[test]
    fn test_unknown_region_falls_back_to_moscow() {
        let moscow = compute(&CalculationInput::default()).unwrap();
        let unknown = compute(&CalculationInput { region: "Atlantis".into(), ..Default::default() }).unwrap();
        assert_eq!(moscow.technical, unknown.technical);
        assert_eq!(moscow.monthly_generation, unknown.monthly_generation);
    }

    #[test]
    fn test_orientation_factors() {
        let base = annual_generation(4500.0, 0.22, 35.0, 0.0, "Moscow");
        assert!(approx(base, 3465.0, 1e-6));

        // 60° off the reference tilt halves the yield
        assert!(approx(annual_generation(4500.0, 0.22, 95.0, 0.0, "Moscow"), base * 0.5, 1e-6));
        // due north loses 20 %
        assert!(approx(annual_generation(4500.0, 0.22, 35.0, 180.0, "Moscow"), base * 0.8, 1e-6));
        assert!(approx(annual_generation(4500.0, 0.22, 35.0, -90.0, "Moscow"), base * 0.9, 1e-6));
        // regional insolation
        assert!(approx(annual_generation(4500.0, 0.22, 35.0, 0.0, "Sochi"), 4500.0 * 4.2 * 0.22, 1e-6));
    }

    #[test]
    fn test_annual_generation_never_negative() {
        for tilt in [-180.0, -90.0, 0.0, 35.0, 125.0, 200.0, 215.0, 360.0] {
            for azimuth in [-400.0, -180.0, 0.0, 180.0, 400.0] {
                let g = annual_generation(4500.0, 0.22, tilt, azimuth, "Moscow");
                assert!(g >= 0.0, "tilt={} azimuth={} gave {}", tilt, azimuth, g);
            }
        }
        // extreme tilt clamps rather than errors
        let r = compute(&CalculationInput { roof_tilt_degrees: 200.0, ..Default::default() }).unwrap();
        assert_eq!(r.technical.annual_generation, 0.0);
        assert!(r.monthly_generation.iter().all(|m| *m == 0.0));
    }

    #[test]
    fn test_monthly_sums_to_annual() {
        let annual = 3465.0 * 1.37;
        let regions = REGIONS.iter().map(|r| r.name).chain(["Москва", "Atlantis", ""]);
        for region in regions {
            let months = monthly_generation(annual, region);
            assert_eq!(months.len(), 12);
            let sum: f64 = months.iter().sum();
            assert!(approx(sum, annual, 0.1), "{}: {} vs {}", region, sum, annual);
        }
    }

    #[test]
    fn test_monthly_follows_season() {
        let months = monthly_generation(1000.0, "Moscow");
        let june = months[5];
        let december = months[11];
        assert!(june > december * 10.0);
    }

    #[test]
    fn test_lifetime_generation() {
        let factor = 0.995f64.powi(25);
        assert!(approx(factor, 0.8822, 1e-4));
        assert!(approx(lifetime_generation(1000.0, 0.005, 25), 23555.95, 0.01));
        // limiting case
        assert_eq!(lifetime_generation(1000.0, 0.0, 25), 25000.0);
        // degrading panels always yield less than the flat case
        assert!(lifetime_generation(1000.0, 0.01, 25) < 25000.0);
    }

    #[test]
    fn test_exact_halves_round_to_even() {
        // 450 W × 3.5 × 0.22 = 346.5 kWh exactly
        let input = CalculationInput { panel_count: 1, ..Default::default() };
        let r = compute(&input).unwrap();
        assert_eq!(r.technical.annual_generation, 346.0);
        assert_eq!(r.environmental.co2_saved_annual, 173.0);

        // 1732.5 kg/year, 43312.5 kg over 25 years
        let r = compute(&CalculationInput::default()).unwrap();
        assert_eq!(r.environmental.co2_saved_annual, 1732.0);
        assert_eq!(r.environmental.co2_saved_25years, 43312.0);

        let input = CalculationInput { panel_count: 3, ..Default::default() };
        let r = compute(&input).unwrap();
        // 1039.5 kWh rounds up to the even neighbour
        assert_eq!(r.technical.annual_generation, 1040.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(20.454545, 2), 20.45);
        assert_eq!(round_to(21.34, 1), 21.3);
        assert_eq!(round_to(3464.6, 0), 3465.0);
        assert_eq!(round_to(-0.04, 1), -0.0);
        assert_eq!(round_to(2.5, 0), 2.0);
        assert_eq!(round_to(3.5, 0), 4.0);
        assert_eq!(round_to(-2.5, 0), -2.0);
    }
}
