//! Daily production report aggregation

use chrono::NaiveDate;
use rust_decimal::Decimal;
use validator::Validate;

use crate::models::{DailyFigures, ReportSummary};

/// Mortality as a percentage of the initial flock, rounded to two places
pub fn mortality_rate(dead_birds: i64, initial_birds: i64) -> Option<Decimal> {
    if initial_birds <= 0 {
        return None;
    }
    let rate = Decimal::from(dead_birds) * Decimal::ONE_HUNDRED / Decimal::from(initial_birds);
    Some(rate.round_dp(2))
}

/// Aggregate reports for a period
pub fn summarize(reports: &[DailyFigures], initial_birds: i64) -> ReportSummary {
    let mut summary = ReportSummary {
        report_count: reports.len(),
        first_date: reports.iter().map(|r| r.report_date).min(),
        last_date: reports.iter().map(|r| r.report_date).max(),
        total_eggs_healthy: 0,
        total_eggs_deformed: 0,
        total_eggs_broken: 0,
        total_eggs: 0,
        total_dead_birds: 0,
        total_feed_kg: Decimal::ZERO,
        total_water_liters: Decimal::ZERO,
        average_daily_eggs: Decimal::ZERO,
        mortality_rate: None,
        feed_per_egg_kg: None,
    };

    for r in reports {
        summary.total_eggs_healthy += i64::from(r.eggs_healthy);
        summary.total_eggs_deformed += i64::from(r.eggs_deformed);
        summary.total_eggs_broken += i64::from(r.eggs_broken);
        summary.total_dead_birds += i64::from(r.dead_birds);
        summary.total_feed_kg += r.feed_consumed_kg;
        summary.total_water_liters += r.water_consumed_liters;
    }
    summary.total_eggs =
        summary.total_eggs_healthy + summary.total_eggs_deformed + summary.total_eggs_broken;

    if !reports.is_empty() {
        summary.average_daily_eggs =
            (Decimal::from(summary.total_eggs) / Decimal::from(reports.len() as i64)).round_dp(2);
    }
    summary.mortality_rate = mortality_rate(summary.total_dead_birds, initial_birds);
    if summary.total_eggs > 0 {
        summary.feed_per_egg_kg =
            Some((summary.total_feed_kg / Decimal::from(summary.total_eggs)).round_dp(4));
    }

    summary
}

/// Check a report before it is stored
pub fn validate_report(figures: &DailyFigures, today: NaiveDate) -> Result<(), &'static str> {
    if figures.validate().is_err() {
        return Err("Counts cannot be negative");
    }
    if figures.feed_consumed_kg < Decimal::ZERO {
        return Err("Feed consumption cannot be negative");
    }
    if figures.water_consumed_liters < Decimal::ZERO {
        return Err("Water consumption cannot be negative");
    }
    if figures.report_date > today {
        return Err("Report date cannot be in the future");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn figures(day: u32, healthy: i32, dead: i32, feed: &str) -> DailyFigures {
        DailyFigures {
            report_date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            eggs_healthy: healthy,
            eggs_deformed: 10,
            eggs_broken: 5,
            dead_birds: dead,
            feed_consumed_kg: dec(feed),
            water_consumed_liters: dec("200"),
        }
    }

    #[test]
    fn test_mortality_rate() {
        assert_eq!(mortality_rate(25, 1000), Some(dec("2.5")));
        assert_eq!(mortality_rate(1, 3), Some(dec("33.33")));
        assert_eq!(mortality_rate(5, 0), None);
    }

    #[test]
    fn test_summarize() {
        let reports = vec![figures(2, 885, 3, "110"), figures(1, 985, 2, "115")];
        let summary = summarize(&reports, 1000);

        assert_eq!(summary.report_count, 2);
        assert_eq!(summary.first_date, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(summary.last_date, NaiveDate::from_ymd_opt(2024, 5, 2));
        assert_eq!(summary.total_eggs_healthy, 1870);
        assert_eq!(summary.total_eggs, 1900);
        assert_eq!(summary.total_dead_birds, 5);
        assert_eq!(summary.total_feed_kg, dec("225"));
        assert_eq!(summary.average_daily_eggs, dec("950"));
        assert_eq!(summary.mortality_rate, Some(dec("0.5")));
        assert_eq!(summary.feed_per_egg_kg, Some(dec("0.1184")));
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[], 1000);
        assert_eq!(summary.report_count, 0);
        assert_eq!(summary.first_date, None);
        assert_eq!(summary.average_daily_eggs, Decimal::ZERO);
        assert_eq!(summary.feed_per_egg_kg, None);
        assert_eq!(summary.mortality_rate, Some(Decimal::ZERO));
    }

    #[test]
    fn test_validate_report() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        assert!(validate_report(&figures(1, 900, 1, "100"), today).is_ok());

        let mut negative = figures(1, 900, 1, "100");
        negative.dead_birds = -1;
        assert!(validate_report(&negative, today).is_err());

        assert!(validate_report(&figures(1, 900, 1, "-1"), today).is_err());
        assert!(validate_report(&figures(11, 900, 1, "100"), today).is_err());
    }
}
