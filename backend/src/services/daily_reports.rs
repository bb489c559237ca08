//! Daily production reports

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::reports::{summarize, validate_report};
use shared::{DailyFigures, DateRange, PaginatedResponse, Pagination, ReportSummary};
use sqlx::PgPool;
use uuid::Uuid;

use super::farms::FarmService;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;

/// Daily report service
#[derive(Clone)]
pub struct DailyReportService {
    db: PgPool,
    farms: FarmService,
}

/// Daily report information
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DailyReport {
    pub id: Uuid,
    pub farm_id: Uuid,
    pub farm_name: String,
    pub report_date: NaiveDate,
    pub eggs_healthy: i32,
    pub eggs_deformed: i32,
    pub eggs_broken: i32,
    pub dead_birds: i32,
    pub feed_consumed_kg: Decimal,
    pub water_consumed_liters: Decimal,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DailyReport {
    fn figures(&self) -> DailyFigures {
        DailyFigures {
            report_date: self.report_date,
            eggs_healthy: self.eggs_healthy,
            eggs_deformed: self.eggs_deformed,
            eggs_broken: self.eggs_broken,
            dead_birds: self.dead_birds,
            feed_consumed_kg: self.feed_consumed_kg,
            water_consumed_liters: self.water_consumed_liters,
        }
    }
}

/// One line of the CSV export
#[derive(Debug, Serialize)]
struct ReportCsvRow<'a> {
    farm: &'a str,
    date: NaiveDate,
    eggs_healthy: i32,
    eggs_deformed: i32,
    eggs_broken: i32,
    total_eggs: i64,
    dead_birds: i32,
    feed_kg: Decimal,
    water_liters: Decimal,
    notes: &'a str,
}

/// Input for creating a daily report
#[derive(Debug, Deserialize)]
pub struct CreateDailyReportInput {
    pub farm_id: Uuid,
    #[serde(flatten)]
    pub figures: DailyFigures,
    pub notes: Option<String>,
}

/// Input for updating a daily report
#[derive(Debug, Deserialize)]
pub struct UpdateDailyReportInput {
    pub eggs_healthy: Option<i32>,
    pub eggs_deformed: Option<i32>,
    pub eggs_broken: Option<i32>,
    pub dead_birds: Option<i32>,
    pub feed_consumed_kg: Option<Decimal>,
    pub water_consumed_liters: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub farm_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub farm_id: Uuid,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Aggregated figures for one farm over a period
#[derive(Debug, Serialize)]
pub struct FarmReportSummary {
    pub farm_id: Uuid,
    pub initial_bird_count: i32,
    #[serde(flatten)]
    pub summary: ReportSummary,
}

const REPORT_SELECT: &str = r#"
    SELECT r.id, r.farm_id, f.name AS farm_name, r.report_date,
           r.eggs_healthy, r.eggs_deformed, r.eggs_broken, r.dead_birds,
           r.feed_consumed_kg, r.water_consumed_liters, r.notes,
           r.created_by, r.created_at, r.updated_at
    FROM daily_reports r
    JOIN farms f ON f.id = r.farm_id
"#;

const REPORT_FILTER: &str = r#"
    WHERE ($1::uuid IS NULL OR r.farm_id = $1)
      AND ($2::uuid IS NULL OR f.farmer_id = $2)
      AND r.report_date BETWEEN $3 AND $4
"#;

fn checked_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> AppResult<DateRange> {
    let range = DateRange::from_bounds(from, to);
    if range.is_valid() {
        Ok(range)
    } else {
        Err(AppError::validation("from", "Start date is after end date"))
    }
}

impl DailyReportService {
    pub fn new(db: PgPool) -> Self {
        Self {
            farms: FarmService::new(db.clone()),
            db,
        }
    }

    /// List reports visible to the user, newest first
    pub async fn list_reports(
        &self,
        user: &AuthUser,
        query: ReportQuery,
    ) -> AppResult<PaginatedResponse<DailyReport>> {
        if let Some(farm_id) = query.farm_id {
            self.farms.ensure_access(user, farm_id).await?;
        }
        let range = checked_range(query.from, query.to)?;
        let pagination = Pagination::from_query(query.page, query.per_page);
        let farmer_scope = (!user.is_admin()).then_some(user.user_id);

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM daily_reports r JOIN farms f ON f.id = r.farm_id {}",
            REPORT_FILTER
        ))
        .bind(query.farm_id)
        .bind(farmer_scope)
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.db)
        .await?;

        let reports = sqlx::query_as::<_, DailyReport>(&format!(
            "{} {} ORDER BY r.report_date DESC, f.name LIMIT $5 OFFSET $6",
            REPORT_SELECT, REPORT_FILTER
        ))
        .bind(query.farm_id)
        .bind(farmer_scope)
        .bind(range.start)
        .bind(range.end)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: reports,
            pagination: pagination.meta(total.max(0) as u64),
        })
    }

    /// Get a report by ID
    pub async fn get_report(&self, user: &AuthUser, report_id: Uuid) -> AppResult<DailyReport> {
        let report = self.fetch_report(report_id).await?;
        self.farms.ensure_access(user, report.farm_id).await?;
        Ok(report)
    }

    async fn fetch_report(&self, report_id: Uuid) -> AppResult<DailyReport> {
        sqlx::query_as::<_, DailyReport>(&format!("{} WHERE r.id = $1", REPORT_SELECT))
            .bind(report_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Daily report".to_string()))
    }

    /// Create the report of a farm for one day
    pub async fn create_report(
        &self,
        user: &AuthUser,
        input: CreateDailyReportInput,
        today: NaiveDate,
    ) -> AppResult<DailyReport> {
        self.farms.ensure_access(user, input.farm_id).await?;
        validate_report(&input.figures, today)
            .map_err(|msg| AppError::validation("report", msg))?;

        let f = &input.figures;
        let report_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO daily_reports
                (farm_id, report_date, eggs_healthy, eggs_deformed, eggs_broken, dead_birds,
                 feed_consumed_kg, water_consumed_liters, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(input.farm_id)
        .bind(f.report_date)
        .bind(f.eggs_healthy)
        .bind(f.eggs_deformed)
        .bind(f.eggs_broken)
        .bind(f.dead_birds)
        .bind(f.feed_consumed_kg)
        .bind(f.water_consumed_liters)
        .bind(&input.notes)
        .bind(user.user_id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::DuplicateEntry(_) => {
                tracing::warn!(farm_id = %input.farm_id, date = %f.report_date, "Duplicate daily report");
                AppError::DuplicateEntry("report_date".to_string())
            }
            other => other,
        })?;

        self.fetch_report(report_id).await
    }

    /// Update the figures of a report
    pub async fn update_report(
        &self,
        user: &AuthUser,
        report_id: Uuid,
        input: UpdateDailyReportInput,
        today: NaiveDate,
    ) -> AppResult<DailyReport> {
        let existing = self.get_report(user, report_id).await?;

        let mut figures = existing.figures();
        if let Some(v) = input.eggs_healthy {
            figures.eggs_healthy = v;
        }
        if let Some(v) = input.eggs_deformed {
            figures.eggs_deformed = v;
        }
        if let Some(v) = input.eggs_broken {
            figures.eggs_broken = v;
        }
        if let Some(v) = input.dead_birds {
            figures.dead_birds = v;
        }
        if let Some(v) = input.feed_consumed_kg {
            figures.feed_consumed_kg = v;
        }
        if let Some(v) = input.water_consumed_liters {
            figures.water_consumed_liters = v;
        }
        validate_report(&figures, today).map_err(|msg| AppError::validation("report", msg))?;

        sqlx::query(
            r#"
            UPDATE daily_reports
            SET eggs_healthy = $1, eggs_deformed = $2, eggs_broken = $3, dead_birds = $4,
                feed_consumed_kg = $5, water_consumed_liters = $6, notes = $7, updated_at = NOW()
            WHERE id = $8
            "#,
        )
        .bind(figures.eggs_healthy)
        .bind(figures.eggs_deformed)
        .bind(figures.eggs_broken)
        .bind(figures.dead_birds)
        .bind(figures.feed_consumed_kg)
        .bind(figures.water_consumed_liters)
        .bind(input.notes.or(existing.notes))
        .bind(report_id)
        .execute(&self.db)
        .await?;

        self.fetch_report(report_id).await
    }

    /// Delete a report
    pub async fn delete_report(&self, user: &AuthUser, report_id: Uuid) -> AppResult<()> {
        self.get_report(user, report_id).await?;

        sqlx::query("DELETE FROM daily_reports WHERE id = $1")
            .bind(report_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// Totals and rates for one farm over a period
    pub async fn summary(&self, user: &AuthUser, query: SummaryQuery) -> AppResult<FarmReportSummary> {
        self.farms.ensure_access(user, query.farm_id).await?;
        let farm = self.farms.fetch_farm(query.farm_id).await?;
        let range = checked_range(query.from, query.to)?;

        let reports = sqlx::query_as::<_, DailyReport>(&format!(
            "{} WHERE r.farm_id = $1 AND r.report_date BETWEEN $2 AND $3 ORDER BY r.report_date",
            REPORT_SELECT
        ))
        .bind(query.farm_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        let figures: Vec<DailyFigures> = reports.iter().map(DailyReport::figures).collect();

        Ok(FarmReportSummary {
            farm_id: farm.id,
            initial_bird_count: farm.initial_bird_count,
            summary: summarize(&figures, i64::from(farm.initial_bird_count)),
        })
    }

    /// Reports matching `query` as CSV, oldest first
    pub async fn export_csv(&self, user: &AuthUser, query: ReportQuery) -> AppResult<String> {
        if let Some(farm_id) = query.farm_id {
            self.farms.ensure_access(user, farm_id).await?;
        }
        let range = checked_range(query.from, query.to)?;
        let farmer_scope = (!user.is_admin()).then_some(user.user_id);

        let reports = sqlx::query_as::<_, DailyReport>(&format!(
            "{} {} ORDER BY r.report_date, f.name",
            REPORT_SELECT, REPORT_FILTER
        ))
        .bind(query.farm_id)
        .bind(farmer_scope)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        reports_to_csv(&reports)
    }
}

/// Serialize reports with one header row
fn reports_to_csv(reports: &[DailyReport]) -> AppResult<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for report in reports {
        let row = ReportCsvRow {
            farm: &report.farm_name,
            date: report.report_date,
            eggs_healthy: report.eggs_healthy,
            eggs_deformed: report.eggs_deformed,
            eggs_broken: report.eggs_broken,
            total_eggs: report.figures().total_eggs(),
            dead_birds: report.dead_birds,
            feed_kg: report.feed_consumed_kg,
            water_liters: report.water_consumed_liters,
            notes: report.notes.as_deref().unwrap_or(""),
        };
        wtr.serialize(row)
            .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(day: u32, healthy: i32) -> DailyReport {
        DailyReport {
            id: Uuid::new_v4(),
            farm_id: Uuid::nil(),
            farm_name: "North, Barn 1".to_string(),
            report_date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            eggs_healthy: healthy,
            eggs_deformed: 3,
            eggs_broken: 2,
            dead_birds: 1,
            feed_consumed_kg: Decimal::new(1205, 1),
            water_consumed_liters: Decimal::from(240),
            notes: None,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_csv_export_has_header_and_rows() {
        let csv = reports_to_csv(&[report(1, 900), report(2, 910)]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("farm,date,eggs_healthy"));
        assert_eq!(
            lines[1],
            "\"North, Barn 1\",2024-05-01,900,3,2,905,1,120.5,240,"
        );
    }

    #[test]
    fn test_csv_export_empty() {
        assert_eq!(reports_to_csv(&[]).unwrap(), "");
    }

    #[test]
    fn test_checked_range_rejects_reversed_bounds() {
        let from = NaiveDate::from_ymd_opt(2024, 5, 2);
        let to = NaiveDate::from_ymd_opt(2024, 5, 1);
        assert!(checked_range(from, to).is_err());
        assert!(checked_range(to, from).is_ok());
    }
}
