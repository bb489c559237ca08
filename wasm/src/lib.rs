//! WebAssembly module for the Poultry Farm Management Platform
//!
//! Provides client-side computation for:
//! - Invoice line values and totals
//! - Mortality rates and report summaries
//! - Flock age and medication schedules
//!
//! Decimal amounts cross the boundary as strings so no precision is lost.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use wasm_bindgen::prelude::*;

use shared::models::{DailyFigures, InvoiceLine, InvoiceType, MedicationEvent, MedicineWindow};

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::log_1(&JsValue::from_str("poultry-farm-wasm ready"));
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal, JsValue> {
    Decimal::from_str(value.trim())
        .map_err(|e| JsValue::from_str(&format!("Invalid {}: {}", field, e)))
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, JsValue> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| JsValue::from_str(&format!("Invalid {}: {}", field, e)))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Value of an invoice line; lines with a weight are priced by weight
#[wasm_bindgen]
pub fn line_value(quantity: &str, weight: &str, price: &str) -> Result<String, JsValue> {
    let weight = if weight.trim().is_empty() {
        Decimal::ZERO
    } else {
        parse_decimal("weight", weight)?
    };
    let value = shared::pricing::line_value(
        parse_decimal("quantity", quantity)?,
        weight,
        parse_decimal("price", price)?,
    );
    Ok(value.to_string())
}

/// Totals of a buy or sell invoice.
///
/// `lines_json` is an array of `{quantity, weight, price}` and `expenses_json`
/// an array of amounts. Returns `{total_items, total_expenses, net_total}`.
#[wasm_bindgen]
pub fn invoice_totals(
    invoice_type: &str,
    lines_json: &str,
    expenses_json: &str,
) -> Result<String, JsValue> {
    let invoice_type =
        InvoiceType::from_str(invoice_type).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let lines: Vec<InvoiceLine> = serde_json::from_str(lines_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid lines JSON: {}", e)))?;
    let expenses: Vec<Decimal> = serde_json::from_str(expenses_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid expenses JSON: {}", e)))?;

    to_json(&shared::pricing::compute_totals(invoice_type, &lines, &expenses))
}

/// Mortality percentage of a flock, or `undefined` without birds
#[wasm_bindgen]
pub fn mortality_rate(dead_birds: i64, initial_birds: i64) -> Option<String> {
    shared::reports::mortality_rate(dead_birds, initial_birds).map(|r| r.to_string())
}

/// Summary of a period of daily reports given as JSON
#[wasm_bindgen]
pub fn summarize_reports(reports_json: &str, initial_birds: i64) -> Result<String, JsValue> {
    let reports: Vec<DailyFigures> = serde_json::from_str(reports_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid reports JSON: {}", e)))?;
    to_json(&shared::reports::summarize(&reports, initial_birds))
}

/// Age in days of a flock placed on `flock_start` (YYYY-MM-DD), or `undefined` before placement
#[wasm_bindgen]
pub fn flock_age_days(flock_start: &str, on: &str) -> Result<Option<i64>, JsValue> {
    Ok(shared::schedule::flock_age_days(
        parse_date("flock_start", flock_start)?,
        parse_date("on", on)?,
    ))
}

/// Age of a flock today, using the browser clock
#[wasm_bindgen]
pub fn flock_age_today(flock_start: &str) -> Result<Option<i64>, JsValue> {
    let now = js_sys::Date::new_0();
    let today = NaiveDate::from_ymd_opt(now.get_full_year() as i32, now.get_month() + 1, now.get_date())
        .ok_or_else(|| JsValue::from_str("Invalid browser date"))?;
    Ok(shared::schedule::flock_age_days(
        parse_date("flock_start", flock_start)?,
        today,
    ))
}

/// Medication schedule for offline display
#[wasm_bindgen]
pub fn medication_schedule(
    flock_start: &str,
    today: &str,
    medicines_json: &str,
    events_json: &str,
    due_window_days: i64,
) -> Result<String, JsValue> {
    let medicines: Vec<MedicineWindow> = serde_json::from_str(medicines_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid medicines JSON: {}", e)))?;
    let events: Vec<MedicationEvent> = serde_json::from_str(events_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid events JSON: {}", e)))?;

    let entries = shared::schedule::build_schedule(
        parse_date("flock_start", flock_start)?,
        parse_date("today", today)?,
        &medicines,
        &events,
        due_window_days,
    );
    to_json(&entries)
}

/// Validate mix percentages of a manufacturing run before submitting
#[wasm_bindgen]
pub fn validate_mix(percentages_json: &str) -> Result<bool, JsValue> {
    let percentages: Vec<Option<Decimal>> = serde_json::from_str(percentages_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid percentages JSON: {}", e)))?;
    let lines: Vec<MixLine> = percentages
        .into_iter()
        .map(|percentage| MixLine {
            quantity: Decimal::ONE,
            percentage,
            unit_cost: None,
        })
        .collect();
    Ok(shared::pricing::validate_mix_percentages(&lines).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_value() {
        assert_eq!(line_value("10", "", "2.5").unwrap(), "25.0");
        assert_eq!(line_value("4", "200", "1.2").unwrap(), "240.0");
    }

    #[test]
    fn test_invoice_totals() {
        let json = invoice_totals(
            "sell",
            r#"[{"quantity":"100","weight":"0","price":"3"}]"#,
            r#"["25"]"#,
        )
        .unwrap();
        let totals: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(totals["net_total"], "275");
    }

    #[test]
    fn test_mortality_rate() {
        assert_eq!(mortality_rate(25, 5000).as_deref(), Some("0.5"));
        assert_eq!(mortality_rate(1, 0), None);
    }

    #[test]
    fn test_flock_age_days() {
        assert_eq!(flock_age_days("2024-03-01", "2024-03-15").unwrap(), Some(14));
        assert_eq!(flock_age_days("2024-03-01", "2024-02-01").unwrap(), None);
    }

    #[test]
    fn test_validate_mix() {
        assert!(validate_mix(r#"["60","40"]"#).unwrap());
        assert!(!validate_mix(r#"["60",null]"#).unwrap());
    }
}
