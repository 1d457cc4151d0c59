//! ============================================================
//!  Static equipment catalog & regional insolation profiles
//!
//!  All tables are compile-time constants.
//!  Equipment keys are strict (unknown key = error), region names
//!  are lenient (unknown region = Moscow profile).
//! ============================================================

use std::fmt;
use std::str::FromStr;

use crate::errors::CalcError;

// ─── Equipment parameters ────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelSpec {
    pub efficiency: f64,
    /// Fractional output loss per year
    pub annual_degradation: f64,
    pub price_per_watt: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverterSpec {
    pub efficiency: f64,
    pub lifetime_years: u32,
    pub price_per_kw: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatterySpec {
    /// Round-trip efficiency
    pub efficiency: f64,
    pub cycle_life: u32,
    pub price_per_kwh: f64,
}

// ─── Equipment variants ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelType {
    Mono,
    Poly,
    ThinFilm,
}

impl PanelType {
    pub const ALL: [PanelType; 3] = [PanelType::Mono, PanelType::Poly, PanelType::ThinFilm];

    pub fn key(self) -> &'static str {
        match self {
            PanelType::Mono => "mono",
            PanelType::Poly => "poly",
            PanelType::ThinFilm => "thin_film",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            PanelType::Mono => "Monocrystalline",
            PanelType::Poly => "Polycrystalline",
            PanelType::ThinFilm => "Thin-film",
        }
    }

    pub fn spec(self) -> PanelSpec {
        match self {
            PanelType::Mono => PanelSpec { efficiency: 0.22, annual_degradation: 0.005, price_per_watt: 35.0 },
            PanelType::Poly => PanelSpec { efficiency: 0.18, annual_degradation: 0.007, price_per_watt: 28.0 },
            PanelType::ThinFilm => PanelSpec { efficiency: 0.15, annual_degradation: 0.01, price_per_watt: 25.0 },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InverterType {
    String,
    Micro,
    Hybrid,
}

impl InverterType {
    pub const ALL: [InverterType; 3] = [InverterType::String, InverterType::Micro, InverterType::Hybrid];

    pub fn key(self) -> &'static str {
        match self {
            InverterType::String => "string",
            InverterType::Micro => "micro",
            InverterType::Hybrid => "hybrid",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            InverterType::String => "String inverter",
            InverterType::Micro => "Microinverters",
            InverterType::Hybrid => "Hybrid inverter",
        }
    }

    pub fn spec(self) -> InverterSpec {
        match self {
            InverterType::String => InverterSpec { efficiency: 0.97, lifetime_years: 10, price_per_kw: 15000.0 },
            InverterType::Micro => InverterSpec { efficiency: 0.985, lifetime_years: 25, price_per_kw: 20000.0 },
            InverterType::Hybrid => InverterSpec { efficiency: 0.96, lifetime_years: 15, price_per_kw: 25000.0 },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatteryType {
    LeadAcid,
    LiFePo4,
    LiIon,
}

impl BatteryType {
    pub const ALL: [BatteryType; 3] = [BatteryType::LeadAcid, BatteryType::LiFePo4, BatteryType::LiIon];

    pub fn key(self) -> &'static str {
        match self {
            BatteryType::LeadAcid => "lead_acid",
            BatteryType::LiFePo4 => "lifepo4",
            BatteryType::LiIon => "li_ion",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            BatteryType::LeadAcid => "Lead-acid",
            BatteryType::LiFePo4 => "LiFePO4",
            BatteryType::LiIon => "Li-Ion",
        }
    }

    pub fn spec(self) -> BatterySpec {
        match self {
            BatteryType::LeadAcid => BatterySpec { efficiency: 0.85, cycle_life: 500, price_per_kwh: 8000.0 },
            BatteryType::LiFePo4 => BatterySpec { efficiency: 0.95, cycle_life: 3000, price_per_kwh: 15000.0 },
            BatteryType::LiIon => BatterySpec { efficiency: 0.92, cycle_life: 2000, price_per_kwh: 12000.0 },
        }
    }
}

// Keys are matched exactly: the catalog is a dictionary, not a fuzzy search.
macro_rules! catalog_key {
    ($ty:ident, $category:literal) => {
        impl FromStr for $ty {
            type Err = CalcError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $ty::ALL
                    .into_iter()
                    .find(|v| v.key() == s)
                    .ok_or_else(|| CalcError::InvalidEquipmentSelection {
                        category: $category,
                        key: s.to_string(),
                    })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.key())
            }
        }
    };
}

catalog_key!(PanelType, "panel");
catalog_key!(InverterType, "inverter");
catalog_key!(BatteryType, "battery");

// ─── Regional profiles ───────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct RegionProfile {
    pub name: &'static str,
    /// Name as submitted by the Russian-language web form
    pub local_name: &'static str,
    /// kWh/m²/day-equivalent insolation scalar
    pub annual_irradiance_factor: f64,
    /// Relative monthly shares, January first
    pub monthly_weights: [f64; 12],
}

pub static REGIONS: [RegionProfile; 8] = [
    RegionProfile {
        name: "Moscow",
        local_name: "Москва",
        annual_irradiance_factor: 3.5,
        monthly_weights: [0.2, 0.3, 0.8, 1.2, 1.5, 1.6, 1.5, 1.3, 0.9, 0.5, 0.2, 0.1],
    },
    RegionProfile {
        name: "Sochi",
        local_name: "Сочи",
        annual_irradiance_factor: 4.2,
        monthly_weights: [0.4, 0.5, 0.9, 1.1, 1.3, 1.4, 1.4, 1.3, 1.1, 0.8, 0.5, 0.3],
    },
    RegionProfile {
        name: "Krasnodar",
        local_name: "Краснодар",
        annual_irradiance_factor: 4.0,
        monthly_weights: [0.3, 0.4, 0.9, 1.2, 1.4, 1.5, 1.4, 1.3, 1.0, 0.7, 0.4, 0.2],
    },
    RegionProfile {
        name: "Rostov-on-Don",
        local_name: "Ростов-на-Дону",
        annual_irradiance_factor: 3.8,
        monthly_weights: [0.3, 0.4, 0.8, 1.1, 1.4, 1.5, 1.4, 1.2, 0.9, 0.6, 0.3, 0.2],
    },
    RegionProfile {
        name: "Volgograd",
        local_name: "Волгоград",
        annual_irradiance_factor: 3.9,
        monthly_weights: [0.3, 0.4, 0.9, 1.2, 1.4, 1.5, 1.4, 1.2, 0.9, 0.6, 0.3, 0.2],
    },
    RegionProfile {
        name: "Yekaterinburg",
        local_name: "Екатеринбург",
        annual_irradiance_factor: 3.2,
        monthly_weights: [0.2, 0.3, 0.7, 1.0, 1.3, 1.4, 1.3, 1.1, 0.8, 0.5, 0.2, 0.1],
    },
    RegionProfile {
        name: "Novosibirsk",
        local_name: "Новосибирск",
        annual_irradiance_factor: 3.0,
        monthly_weights: [0.2, 0.3, 0.7, 1.0, 1.2, 1.3, 1.2, 1.0, 0.7, 0.4, 0.2, 0.1],
    },
    RegionProfile {
        name: "Vladivostok",
        local_name: "Владивосток",
        annual_irradiance_factor: 3.7,
        monthly_weights: [0.3, 0.4, 0.8, 1.1, 1.3, 1.2, 1.1, 1.2, 1.0, 0.7, 0.4, 0.3],
    },
];

/// Profile used for unknown region names.
pub fn default_region() -> &'static RegionProfile {
    &REGIONS[0]
}

pub fn find_region(name: &str) -> Option<&'static RegionProfile> {
    let wanted = name.trim().to_lowercase();
    REGIONS
        .iter()
        .find(|r| r.name.to_lowercase() == wanted || r.local_name.to_lowercase() == wanted)
}

/// Region lookup that never fails.
pub fn region_profile(name: &str) -> &'static RegionProfile {
    find_region(name).unwrap_or_else(default_region)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equipment_keys_roundtrip() {
        for p in PanelType::ALL {
            assert_eq!(p.key().parse::<PanelType>().unwrap(), p);
        }
        for i in InverterType::ALL {
            assert_eq!(i.key().parse::<InverterType>().unwrap(), i);
        }
        for b in BatteryType::ALL {
            assert_eq!(b.key().parse::<BatteryType>().unwrap(), b);
        }
    }

    #[test]
    fn test_unknown_equipment_is_an_error() {
        let err = "perc".parse::<PanelType>().unwrap_err();
        assert_eq!(
            err,
            CalcError::InvalidEquipmentSelection { category: "panel", key: "perc".to_string() }
        );
        assert!("Mono".parse::<PanelType>().is_err(), "keys are case-sensitive");
        assert!("central".parse::<InverterType>().is_err());
        assert!("nimh".parse::<BatteryType>().is_err());
    }

    #[test]
    fn test_catalog_values_in_range() {
        for p in PanelType::ALL {
            let s = p.spec();
            assert!(s.efficiency > 0.0 && s.efficiency <= 1.0);
            assert!(s.annual_degradation > 0.0);
        }
        for i in InverterType::ALL {
            assert!(i.spec().efficiency > 0.0 && i.spec().efficiency <= 1.0);
        }
        for b in BatteryType::ALL {
            assert!(b.spec().efficiency > 0.0 && b.spec().efficiency <= 1.0);
        }
    }

    #[test]
    fn test_region_lookup() {
        assert_eq!(region_profile("Sochi").annual_irradiance_factor, 4.2);
        assert_eq!(region_profile("Сочи").annual_irradiance_factor, 4.2);
        assert_eq!(region_profile("  novosibirsk ").annual_irradiance_factor, 3.0);

        let fallback = region_profile("Atlantis");
        assert_eq!(fallback.annual_irradiance_factor, 3.5);
        assert_eq!(fallback.monthly_weights, REGIONS[0].monthly_weights);
        assert!(find_region("Atlantis").is_none());
    }

    #[test]
    fn test_region_weights_non_negative() {
        for r in &REGIONS {
            assert!(r.monthly_weights.iter().all(|w| *w >= 0.0), "{}", r.name);
            assert!(r.monthly_weights.iter().sum::<f64>() > 0.0, "{}", r.name);
        }
    }
}
