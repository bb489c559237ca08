//! Daily production report tests
//!
//! Tests for report validation and aggregation including:
//! - Mortality rate stays between 0 and 100 while deaths do not exceed the flock
//! - Summary totals match the individual reports
//! - Future dates and negative figures are rejected

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::models::DailyFigures;
use shared::reports::{mortality_rate, summarize, validate_report};
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn figures(report_date: NaiveDate, eggs: i32, dead: i32) -> DailyFigures {
    DailyFigures {
        report_date,
        eggs_healthy: eggs,
        eggs_deformed: 0,
        eggs_broken: 0,
        dead_birds: dead,
        feed_consumed_kg: dec("120.5"),
        water_consumed_liters: dec("240"),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_mortality_rate() {
        assert_eq!(mortality_rate(25, 5000), Some(dec("0.5")));
        assert_eq!(mortality_rate(0, 5000), Some(Decimal::ZERO));
        assert_eq!(mortality_rate(1, 3), Some(dec("33.33")));
    }

    #[test]
    fn test_mortality_rate_without_flock() {
        assert_eq!(mortality_rate(3, 0), None);
    }

    #[test]
    fn test_future_report_rejected() {
        let today = date(2024, 5, 10);
        assert!(validate_report(&figures(date(2024, 5, 11), 100, 0), today).is_err());
        assert!(validate_report(&figures(today, 100, 0), today).is_ok());
    }

    #[test]
    fn test_negative_figures_rejected() {
        let today = date(2024, 5, 10);
        assert!(validate_report(&figures(today, -1, 0), today).is_err());

        let mut thirsty = figures(today, 10, 0);
        thirsty.water_consumed_liters = dec("-1");
        assert!(validate_report(&thirsty, today).is_err());
    }

    #[test]
    fn test_summary_of_week() {
        let start = date(2024, 5, 1);
        let reports: Vec<DailyFigures> = (0..7)
            .map(|d| figures(start + Duration::days(d), 900, 2))
            .collect();

        let summary = summarize(&reports, 1000);
        assert_eq!(summary.report_count, 7);
        assert_eq!(summary.total_eggs, 6300);
        assert_eq!(summary.total_dead_birds, 14);
        assert_eq!(summary.average_daily_eggs, dec("900"));
        assert_eq!(summary.mortality_rate, Some(dec("1.4")));
        assert_eq!(summary.first_date, Some(start));
        assert_eq!(summary.last_date, Some(date(2024, 5, 7)));
    }

    #[test]
    fn test_summary_of_nothing() {
        let summary = summarize(&[], 1000);
        assert_eq!(summary.report_count, 0);
        assert_eq!(summary.average_daily_eggs, Decimal::ZERO);
        assert_eq!(summary.feed_per_egg_kg, None);
        assert_eq!(summary.first_date, None);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        /// Mortality is a percentage whenever deaths do not exceed the flock
        #[test]
        fn prop_mortality_rate_bounded(initial in 1i64..1_000_000, share in 0.0f64..=1.0) {
            let dead = ((initial as f64) * share).floor() as i64;
            let rate = mortality_rate(dead, initial).unwrap();
            prop_assert!(rate >= Decimal::ZERO);
            prop_assert!(rate <= Decimal::ONE_HUNDRED);
        }

        /// Summary totals are the sums of the individual reports
        #[test]
        fn prop_summary_totals(
            days in prop::collection::vec((0i32..10_000, 0i32..50), 1..30),
        ) {
            let start = date(2024, 1, 1);
            let reports: Vec<DailyFigures> = days
                .iter()
                .enumerate()
                .map(|(i, (eggs, dead))| figures(start + Duration::days(i as i64), *eggs, *dead))
                .collect();

            let summary = summarize(&reports, 10_000);
            let eggs: i64 = reports.iter().map(DailyFigures::total_eggs).sum();
            let dead: i64 = reports.iter().map(|r| i64::from(r.dead_birds)).sum();

            prop_assert_eq!(summary.total_eggs, eggs);
            prop_assert_eq!(summary.total_dead_birds, dead);
            prop_assert_eq!(summary.report_count, reports.len());
            prop_assert_eq!(summary.feed_per_egg_kg.is_some(), eggs > 0);
        }

        /// Any non-negative report dated today or earlier is accepted
        #[test]
        fn prop_past_reports_accepted(
            back in 0i64..365,
            eggs in 0i32..50_000,
            dead in 0i32..500,
        ) {
            let today = date(2024, 12, 31);
            let report = figures(today - Duration::days(back), eggs, dead);
            prop_assert!(validate_report(&report, today).is_ok());
        }
    }
}
