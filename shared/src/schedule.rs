//! Medication schedules derived from flock age

use chrono::{Duration, NaiveDate};

use crate::models::{MedicationEvent, MedicineWindow, ScheduleEntry, ScheduleStatus};

/// Age of a flock in days on `on`, or `None` before placement
pub fn flock_age_days(flock_start: NaiveDate, on: NaiveDate) -> Option<i64> {
    let age = (on - flock_start).num_days();
    (age >= 0).then_some(age)
}

/// Status of a window on `today`, ignoring administrations
pub fn window_status(
    window_start: NaiveDate,
    window_end: NaiveDate,
    today: NaiveDate,
    due_window_days: i64,
) -> ScheduleStatus {
    if today > window_end {
        ScheduleStatus::Overdue
    } else if today >= window_start - Duration::days(due_window_days) {
        ScheduleStatus::Due
    } else {
        ScheduleStatus::Upcoming
    }
}

/// Build a farm's medication schedule.
///
/// Each medicine with a valid day range yields one entry spanning
/// `[flock_start + day_from, flock_start + day_to]`. An administration recorded
/// inside that span marks the entry as administered.
pub fn build_schedule(
    flock_start: NaiveDate,
    today: NaiveDate,
    medicines: &[MedicineWindow],
    events: &[MedicationEvent],
    due_window_days: i64,
) -> Vec<ScheduleEntry> {
    let mut entries: Vec<ScheduleEntry> = medicines
        .iter()
        .filter(|m| m.day_from >= 0 && m.day_from <= m.day_to)
        .map(|m| {
            let window_start = flock_start + Duration::days(i64::from(m.day_from));
            let window_end = flock_start + Duration::days(i64::from(m.day_to));

            let administered_on = events
                .iter()
                .filter(|e| e.medicine_id == m.medicine_id)
                .map(|e| e.administered_on)
                .filter(|d| *d >= window_start && *d <= window_end)
                .min();

            let status = match administered_on {
                Some(_) => ScheduleStatus::Administered,
                None => window_status(window_start, window_end, today, due_window_days),
            };

            ScheduleEntry {
                medicine_id: m.medicine_id,
                medicine_name: m.name.clone(),
                dosage: m.dosage.clone(),
                window_start,
                window_end,
                status,
                administered_on,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        a.window_start
            .cmp(&b.window_start)
            .then_with(|| a.medicine_name.cmp(&b.medicine_name))
    });
    entries
}

/// Number of entries still needing attention today
pub fn count_overdue(entries: &[ScheduleEntry]) -> usize {
    entries
        .iter()
        .filter(|e| e.status == ScheduleStatus::Overdue)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window(name: &str, from: i32, to: i32) -> MedicineWindow {
        MedicineWindow {
            medicine_id: Uuid::new_v4(),
            name: name.to_string(),
            day_from: from,
            day_to: to,
            dosage: None,
        }
    }

    #[test]
    fn test_flock_age() {
        let start = date(2024, 3, 1);
        assert_eq!(flock_age_days(start, date(2024, 3, 1)), Some(0));
        assert_eq!(flock_age_days(start, date(2024, 3, 11)), Some(10));
        assert_eq!(flock_age_days(start, date(2024, 2, 28)), None);
    }

    #[test]
    fn test_statuses() {
        let start = date(2024, 1, 1);
        let today = date(2024, 1, 15); // day 14
        let meds = vec![
            window("Newcastle", 7, 10),     // ended day 10 -> overdue
            window("Gumboro", 12, 16),      // covers day 14 -> due
            window("Bronchitis", 16, 18),   // starts in 2 days, within due window
            window("Coccidiosis", 30, 35),  // far away -> upcoming
        ];
        let schedule = build_schedule(start, today, &meds, &[], 3);

        let status = |name: &str| {
            schedule
                .iter()
                .find(|e| e.medicine_name == name)
                .map(|e| e.status)
                .unwrap()
        };
        assert_eq!(status("Newcastle"), ScheduleStatus::Overdue);
        assert_eq!(status("Gumboro"), ScheduleStatus::Due);
        assert_eq!(status("Bronchitis"), ScheduleStatus::Due);
        assert_eq!(status("Coccidiosis"), ScheduleStatus::Upcoming);
        assert_eq!(count_overdue(&schedule), 1);
    }

    #[test]
    fn test_administration_inside_window_only() {
        let start = date(2024, 1, 1);
        let med = window("Newcastle", 7, 10);
        let outside = MedicationEvent {
            medicine_id: med.medicine_id,
            administered_on: date(2024, 1, 2),
        };
        let inside = MedicationEvent {
            medicine_id: med.medicine_id,
            administered_on: date(2024, 1, 9),
        };

        let schedule = build_schedule(start, date(2024, 2, 1), &[med.clone()], &[outside.clone()], 3);
        assert_eq!(schedule[0].status, ScheduleStatus::Overdue);

        let schedule = build_schedule(start, date(2024, 2, 1), &[med], &[outside, inside], 3);
        assert_eq!(schedule[0].status, ScheduleStatus::Administered);
        assert_eq!(schedule[0].administered_on, Some(date(2024, 1, 9)));
    }

    #[test]
    fn test_invalid_windows_skipped_and_sorted() {
        let start = date(2024, 1, 1);
        let meds = vec![window("B", 5, 6), window("Broken", 9, 3), window("A", 5, 8), window("C", 1, 2)];
        let schedule = build_schedule(start, start, &meds, &[], 0);
        let names: Vec<&str> = schedule.iter().map(|e| e.medicine_name.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }
}
