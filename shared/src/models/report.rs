//! Daily production report models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Figures recorded for one farm on one day
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DailyFigures {
    pub report_date: NaiveDate,
    #[validate(range(min = 0))]
    pub eggs_healthy: i32,
    #[validate(range(min = 0))]
    pub eggs_deformed: i32,
    #[validate(range(min = 0))]
    pub eggs_broken: i32,
    #[validate(range(min = 0))]
    pub dead_birds: i32,
    pub feed_consumed_kg: Decimal,
    pub water_consumed_liters: Decimal,
}

impl DailyFigures {
    pub fn total_eggs(&self) -> i64 {
        i64::from(self.eggs_healthy) + i64::from(self.eggs_deformed) + i64::from(self.eggs_broken)
    }
}

/// Aggregated figures for a farm over a period
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportSummary {
    pub report_count: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub total_eggs_healthy: i64,
    pub total_eggs_deformed: i64,
    pub total_eggs_broken: i64,
    pub total_eggs: i64,
    pub total_dead_birds: i64,
    pub total_feed_kg: Decimal,
    pub total_water_liters: Decimal,
    pub average_daily_eggs: Decimal,
    /// Cumulative mortality as a percentage of the initial flock
    pub mortality_rate: Option<Decimal>,
    pub feed_per_egg_kg: Option<Decimal>,
}
