//! Medicine and medication models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A medicine or vaccine and the flock-age window in which it is given
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicineWindow {
    pub medicine_id: Uuid,
    pub name: String,
    /// First flock age (in days) at which the medicine is given
    pub day_from: i32,
    /// Last flock age (in days) at which the medicine is given
    pub day_to: i32,
    pub dosage: Option<String>,
}

/// Administration of a medicine on a farm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationEvent {
    pub medicine_id: Uuid,
    pub administered_on: NaiveDate,
}

/// Where a scheduled medicine stands relative to today
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Upcoming,
    Due,
    Overdue,
    Administered,
}

/// One row of a farm's medication schedule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleEntry {
    pub medicine_id: Uuid,
    pub medicine_name: String,
    pub dosage: Option<String>,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub status: ScheduleStatus,
    pub administered_on: Option<NaiveDate>,
}
