//! # PDF Reports
//!
//! Renders a stored calculation as an A4 PDF using Typst.
//!
//! - The Typst template is an embedded string constant
//! - Stored values are injected by placeholder replacement; nothing is recomputed
//! - Output is raw PDF bytes (`Vec<u8>`)

use chrono::{Datelike, Utc};
use once_cell::sync::Lazy;
use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::syntax::{FileId, Source};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, LibraryExt, World};
use typst_pdf::PdfOptions;

use crate::errors::ReportError;
use crate::models::calculation::StoredCalculation;
use crate::services::catalog::{BatteryType, InverterType, PanelType};

// ============================================================================
// Typst World Implementation
// ============================================================================

/// Fonts bundled with typst-assets, parsed once per process.
static FONTS: Lazy<Vec<Font>> = Lazy::new(|| {
    typst_assets::fonts()
        .flat_map(|data| Font::iter(Bytes::new(data.to_vec())))
        .collect()
});

/// A minimal Typst world with a single in-memory source file.
struct ReportWorld {
    main: Source,
    book: LazyHash<FontBook>,
    fonts: Vec<Font>,
    library: LazyHash<Library>,
}

impl ReportWorld {
    fn new(source: String) -> Self {
        let fonts = FONTS.clone();
        let book = FontBook::from_fonts(&fonts);

        ReportWorld {
            main: Source::detached(source),
            book: LazyHash::new(book),
            fonts,
            library: LazyHash::new(Library::default()),
        }
    }
}

impl World for ReportWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.book
    }

    fn main(&self) -> FileId {
        self.main.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main.id() {
            Ok(self.main.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.fonts.get(index).cloned()
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        let now = Utc::now();
        Datetime::from_ymd(now.year(), now.month() as u8, now.day() as u8)
    }
}

// ============================================================================
// Template
// ============================================================================

const REPORT_TEMPLATE: &str = r##"
#set page(
  paper: "a4",
  margin: (top: 2.5cm, bottom: 2cm, left: 2.5cm, right: 2.5cm),
  footer: context [
    #line(length: 100%, stroke: 0.5pt + gray)
    #v(4pt)
    #grid(
      columns: (1fr, 1fr),
      align(left)[#text(size: 9pt)[Calculation no. {{ID}}]],
      align(right)[#text(size: 9pt)[Page #counter(page).display()]],
    )
  ]
)

#set text(size: 10pt)
#set heading(numbering: "1.")

#let data-table(accent, background, rows) = table(
  columns: (1fr, 1fr),
  inset: 7pt,
  stroke: 0.5pt + rgb("#e5e7eb"),
  fill: (_col, row) => if row == 0 { rgb(accent) } else { rgb(background) },
  table.header(text(fill: white)[*Parameter*], text(fill: white)[*Value*]),
  ..rows,
)

#text(size: 16pt, weight: "bold", fill: rgb("#2563eb"))[SolarCalc Pro: Solar Power Plant Report]
#v(4pt)
Calculation date: {{DATE}}

#v(12pt)

== Input parameters

#data-table("#2563eb", "#f8fafc", (
  [Panel type], [{{PANEL_TYPE}}],
  [Panel power], [{{PANEL_POWER}} W],
  [Number of panels], [{{PANEL_COUNT}}],
  [Total power], [{{TOTAL_POWER}} W],
  [Region], [{{REGION}}],
  [Roof tilt], [{{TILT}}°],
  [Azimuth], [{{AZIMUTH}}°],
  [Inverter type], [{{INVERTER_TYPE}}],
  [Battery type], [{{BATTERY_TYPE}}],
  [Battery capacity], [{{BATTERY_CAPACITY}} kWh],
  [Electricity price], [{{ELECTRICITY_PRICE}} per kWh],
  [Installation cost], [{{INSTALLATION_COST}}],
))

#v(12pt)

== Technical performance

#data-table("#10b981", "#f0fdf4", (
  [Total power], [{{TOTAL_POWER}} W],
  [Annual generation], [{{ANNUAL_GENERATION}} kWh],
  [Daily generation], [{{DAILY_GENERATION}} kWh],
  [System efficiency], [{{SYSTEM_EFFICIENCY}} %],
  [Panel area], [{{TOTAL_AREA}} m²],
  [Battery autonomy], [{{BACKUP_HOURS}} h],
))

#v(12pt)

== Economics

#data-table("#f59e0b", "#fffbeb", (
  [Equipment cost], [{{EQUIPMENT_COST}}],
  [Total cost], [{{TOTAL_COST}}],
  [Annual savings], [{{ANNUAL_SAVINGS}}],
  [Payback period], [{{PAYBACK_YEARS}} years],
  [ROI over 25 years], [{{ROI}} %],
  [Generation over 25 years], [{{GENERATION_25}} kWh],
))

#v(12pt)

== Environmental impact

#data-table("#059669", "#ecfdf5", (
  [CO₂ avoided per year], [{{CO2_ANNUAL}} kg],
  [Equivalent trees], [{{TREES}}],
  [CO₂ avoided over 25 years], [{{CO2_25_TONNES}} t],
))

#v(12pt)

== Monthly generation

#table(
  columns: (1fr, 1fr, 1fr, 1fr),
  inset: 6pt,
  stroke: 0.5pt + rgb("#e5e7eb"),
  table.header([*Month*], [*kWh*], [*Month*], [*kWh*]),
{{MONTHLY_ROWS}}
)

#v(12pt)

== Conclusion

A {{TOTAL_POWER}} W solar power plant will generate about {{ANNUAL_GENERATION}} kWh per year
and pay for itself in {{PAYBACK_YEARS}} years. Over 25 years of operation it avoids
{{CO2_25_TONNES}} tonnes of CO₂.

#v(16pt)
#text(size: 8pt, fill: gray)[
  Estimates use regional average insolation and fixed equipment parameters.
  Actual generation depends on local weather and shading.
]
"##;

const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

// ============================================================================
// Rendering
// ============================================================================

/// Render a stored calculation to PDF bytes.
///
/// CPU-bound; async callers should run it on a blocking thread.
pub fn render_pdf(calc: &StoredCalculation) -> Result<Vec<u8>, ReportError> {
    let world = ReportWorld::new(build_source(calc));

    let warned = typst::compile(&world);
    let document = warned.output.map_err(|errors| {
        let msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        ReportError::Compile(msgs.join("; "))
    })?;

    typst_pdf::pdf(&document, &PdfOptions::default()).map_err(|errors| {
        let msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        ReportError::Render(msgs.join("; "))
    })
}

/// Fill the template from the stored record.
fn build_source(calc: &StoredCalculation) -> String {
    let input = &calc.input_data;
    let tech = &calc.result_data.technical;
    let econ = &calc.result_data.economic;
    let env = &calc.result_data.environmental;

    REPORT_TEMPLATE
        .replace("{{ID}}", &calc.id.to_string())
        .replace("{{DATE}}", &calc.created_at.format("%Y-%m-%d %H:%M UTC").to_string())
        .replace("{{PANEL_TYPE}}", &equipment_label::<PanelType>(&input.panel_type, PanelType::display_name))
        .replace("{{PANEL_POWER}}", &format_number(input.panel_power_watts, 0))
        .replace("{{PANEL_COUNT}}", &input.panel_count.to_string())
        .replace("{{REGION}}", &typst_text(&input.region))
        .replace("{{TILT}}", &format_number(input.roof_tilt_degrees, 1))
        .replace("{{AZIMUTH}}", &format_number(input.azimuth_degrees, 1))
        .replace("{{INVERTER_TYPE}}", &equipment_label::<InverterType>(&input.inverter_type, InverterType::display_name))
        .replace("{{BATTERY_TYPE}}", &equipment_label::<BatteryType>(&input.battery_type, BatteryType::display_name))
        .replace("{{BATTERY_CAPACITY}}", &format_number(input.battery_capacity_kwh, 1))
        .replace("{{ELECTRICITY_PRICE}}", &format_number(input.electricity_price_per_kwh, 2))
        .replace("{{INSTALLATION_COST}}", &format_number(input.installation_cost, 0))
        .replace("{{TOTAL_POWER}}", &format_number(tech.total_power, 0))
        .replace("{{ANNUAL_GENERATION}}", &format_number(tech.annual_generation, 0))
        .replace("{{DAILY_GENERATION}}", &format_number(tech.daily_generation, 2))
        .replace("{{SYSTEM_EFFICIENCY}}", &format_number(tech.system_efficiency, 1))
        .replace("{{TOTAL_AREA}}", &format_number(tech.total_area, 2))
        .replace("{{BACKUP_HOURS}}", &format_number(tech.battery_backup_hours, 1))
        .replace("{{EQUIPMENT_COST}}", &format_number(econ.equipment_cost, 0))
        .replace("{{TOTAL_COST}}", &format_number(econ.total_cost, 0))
        .replace("{{ANNUAL_SAVINGS}}", &format_number(econ.annual_savings, 0))
        .replace("{{PAYBACK_YEARS}}", &format_number(econ.payback_years, 1))
        .replace("{{ROI}}", &format_number(econ.roi_25years, 1))
        .replace("{{GENERATION_25}}", &format_number(econ.total_25year_generation, 0))
        .replace("{{CO2_ANNUAL}}", &format_number(env.co2_saved_annual, 0))
        .replace("{{TREES}}", &format_number(env.trees_equivalent, 0))
        .replace("{{CO2_25_TONNES}}", &format_number(env.co2_saved_25years / 1000.0, 1))
        .replace("{{MONTHLY_ROWS}}", &monthly_rows(&calc.result_data.monthly_generation))
}

/// Display name for a catalog key; unknown keys are printed as given.
fn equipment_label<T: std::str::FromStr + Copy>(key: &str, name: fn(T) -> &'static str) -> String {
    key.parse::<T>()
        .map(|v| name(v).to_string())
        .unwrap_or_else(|_| typst_text(key))
}

/// Two month/value pairs per row: January beside July.
fn monthly_rows(monthly: &[f64]) -> String {
    (0..6)
        .map(|i| {
            let cell = |m: usize| monthly.get(m).map(|v| format_number(*v, 2)).unwrap_or_default();
            format!(
                "  [{}], [{}], [{}], [{}],",
                MONTHS[i],
                cell(i),
                MONTHS[i + 6],
                cell(i + 6)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fixed decimals with spaces between thousands groups: `81621.4` → `81 621`.
fn format_number(value: f64, decimals: usize) -> String {
    let text = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(text.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }

    let is_zero = text.chars().all(|c| c == '0' || c == '.');
    if value < 0.0 && !is_zero {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// User-provided text as a Typst string literal (`#"..."`), so markup
/// characters in it are printed verbatim.
fn typst_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 3);
    out.push_str("#\"");
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            c if c.is_control() => out.push(' '),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
