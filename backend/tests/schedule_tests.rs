//! Medication schedule tests
//!
//! Tests for schedules derived from flock age including:
//! - Window bounds follow the flock start date
//! - Status moves forward in time: upcoming, due, overdue
//! - Only administrations inside the window count

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use shared::models::{MedicationEvent, MedicineWindow, ScheduleStatus};
use shared::schedule::{build_schedule, count_overdue, flock_age_days, window_status};
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn window(name: &str, day_from: i32, day_to: i32) -> MedicineWindow {
    MedicineWindow {
        medicine_id: Uuid::new_v4(),
        name: name.to_string(),
        day_from,
        day_to,
        dosage: None,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_flock_age() {
        let start = date(2024, 3, 1);
        assert_eq!(flock_age_days(start, date(2024, 3, 1)), Some(0));
        assert_eq!(flock_age_days(start, date(2024, 3, 15)), Some(14));
        assert_eq!(flock_age_days(start, date(2024, 2, 28)), None);
    }

    #[test]
    fn test_newcastle_vaccine_schedule() {
        let start = date(2024, 3, 1);
        let vaccine = window("Newcastle", 7, 10);
        let entries = build_schedule(start, date(2024, 3, 5), &[vaccine], &[], 3);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].window_start, date(2024, 3, 8));
        assert_eq!(entries[0].window_end, date(2024, 3, 11));
        assert_eq!(entries[0].status, ScheduleStatus::Due);
    }

    #[test]
    fn test_late_administration_does_not_count() {
        let start = date(2024, 3, 1);
        let vaccine = window("Gumboro", 14, 16);
        let late = MedicationEvent {
            medicine_id: vaccine.medicine_id,
            administered_on: date(2024, 3, 20),
        };

        let entries = build_schedule(start, date(2024, 3, 21), &[vaccine], &[late], 3);
        assert_eq!(entries[0].status, ScheduleStatus::Overdue);
        assert_eq!(entries[0].administered_on, None);
        assert_eq!(count_overdue(&entries), 1);
    }

    #[test]
    fn test_administered_inside_window() {
        let start = date(2024, 3, 1);
        let vaccine = window("Gumboro", 14, 16);
        let given = MedicationEvent {
            medicine_id: vaccine.medicine_id,
            administered_on: date(2024, 3, 16),
        };

        let entries = build_schedule(start, date(2024, 4, 1), &[vaccine], &[given], 3);
        assert_eq!(entries[0].status, ScheduleStatus::Administered);
        assert_eq!(entries[0].administered_on, Some(date(2024, 3, 16)));
        assert_eq!(count_overdue(&entries), 0);
    }

    #[test]
    fn test_invalid_windows_are_skipped_and_entries_sorted() {
        let start = date(2024, 3, 1);
        let medicines = [
            window("Vitamins", 20, 25),
            window("Broken", 9, 3),
            window("Bronchitis", 1, 2),
        ];
        let entries = build_schedule(start, start, &medicines, &[], 3);

        let names: Vec<&str> = entries.iter().map(|e| e.medicine_name.as_str()).collect();
        assert_eq!(names, vec!["Bronchitis", "Vitamins"]);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn rank(status: ScheduleStatus) -> u8 {
        match status {
            ScheduleStatus::Upcoming => 0,
            ScheduleStatus::Due => 1,
            ScheduleStatus::Overdue => 2,
            ScheduleStatus::Administered => 3,
        }
    }

    proptest! {
        /// Without administrations a window's status never moves backwards
        #[test]
        fn prop_status_is_monotone(
            day_from in 0i64..60,
            length in 0i64..10,
            offset in 0i64..100,
            step in 0i64..30,
            due_window in 0i64..7,
        ) {
            let start = date(2024, 1, 1) + Duration::days(day_from);
            let end = start + Duration::days(length);
            let today = date(2024, 1, 1) + Duration::days(offset);

            let earlier = window_status(start, end, today, due_window);
            let later = window_status(start, end, today + Duration::days(step), due_window);
            prop_assert!(rank(earlier) <= rank(later));
        }

        /// Windows span exactly day_from..=day_to after placement
        #[test]
        fn prop_window_bounds(day_from in 0i32..100, length in 0i32..20, age in 0i64..150) {
            let start = date(2024, 6, 1);
            let medicine = window("Any", day_from, day_from + length);
            let entries = build_schedule(start, start + Duration::days(age), &[medicine], &[], 3);

            prop_assert_eq!(entries.len(), 1);
            prop_assert_eq!(entries[0].window_start, start + Duration::days(i64::from(day_from)));
            prop_assert_eq!(
                (entries[0].window_end - entries[0].window_start).num_days(),
                i64::from(length)
            );
        }

        /// An administration counts exactly when it falls inside the window
        #[test]
        fn prop_administered_only_inside_window(
            day_from in 0i32..30,
            length in 0i32..10,
            given_on in 0i64..60,
        ) {
            let start = date(2024, 6, 1);
            let medicine = window("Any", day_from, day_from + length);
            let event = MedicationEvent {
                medicine_id: medicine.medicine_id,
                administered_on: start + Duration::days(given_on),
            };
            let inside = given_on >= i64::from(day_from) && given_on <= i64::from(day_from + length);

            let entries = build_schedule(start, start + Duration::days(90), &[medicine], &[event], 3);
            prop_assert_eq!(entries[0].status == ScheduleStatus::Administered, inside);
        }
    }
}
