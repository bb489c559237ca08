//! Dashboard figures

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::schedule::count_overdue;
use shared::BalancePolicy;
use sqlx::PgPool;
use uuid::Uuid;

use super::medicines::MedicineService;
use crate::error::AppResult;
use crate::middleware::AuthUser;

/// Dashboard service
#[derive(Clone)]
pub struct DashboardService {
    db: PgPool,
    medicines: MedicineService,
}

/// Headline figures. Farmers only see figures for their own farms and no
/// trade totals.
#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub farm_count: i64,
    pub warehouse_count: i64,
    pub material_count: i64,
    pub low_stock_count: i64,
    pub eggs_today: i64,
    pub dead_birds_today: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month_buy_total: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month_sell_total: Option<Decimal>,
    pub overdue_medications: usize,
}

fn month_start(today: NaiveDate) -> NaiveDate {
    today.with_day(1).unwrap_or(today)
}

impl DashboardService {
    pub fn new(db: PgPool, policy: BalancePolicy) -> Self {
        Self {
            medicines: MedicineService::new(db.clone(), policy),
            db,
        }
    }

    pub async fn stats(
        &self,
        user: &AuthUser,
        today: NaiveDate,
        due_window_days: i64,
    ) -> AppResult<DashboardStats> {
        let farmer_scope = (!user.is_admin()).then_some(user.user_id);

        let farm_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM farms WHERE is_active AND ($1::uuid IS NULL OR farmer_id = $1)",
        )
        .bind(farmer_scope)
        .fetch_one(&self.db)
        .await?;

        let warehouse_count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM warehouses w
            LEFT JOIN farms f ON f.id = w.farm_id
            WHERE $1::uuid IS NULL OR f.farmer_id = $1
            "#,
        )
        .bind(farmer_scope)
        .fetch_one(&self.db)
        .await?;

        let (material_count, low_stock_count) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE m.minimum_balance > 0 AND m.current_balance <= m.minimum_balance)
            FROM materials m
            JOIN warehouses w ON w.id = m.warehouse_id
            LEFT JOIN farms f ON f.id = w.farm_id
            WHERE $1::uuid IS NULL OR f.farmer_id = $1
            "#,
        )
        .bind(farmer_scope)
        .fetch_one(&self.db)
        .await?;

        let (eggs_today, dead_birds_today) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COALESCE(SUM(r.eggs_healthy + r.eggs_deformed + r.eggs_broken), 0)::bigint,
                   COALESCE(SUM(r.dead_birds), 0)::bigint
            FROM daily_reports r
            JOIN farms f ON f.id = r.farm_id
            WHERE r.report_date = $1 AND ($2::uuid IS NULL OR f.farmer_id = $2)
            "#,
        )
        .bind(today)
        .bind(farmer_scope)
        .fetch_one(&self.db)
        .await?;

        let (month_buy_total, month_sell_total) = if user.is_admin() {
            let (buy, sell) = sqlx::query_as::<_, (Decimal, Decimal)>(
                r#"
                SELECT COALESCE(SUM(net_total) FILTER (WHERE invoice_type = 'buy'), 0),
                       COALESCE(SUM(net_total) FILTER (WHERE invoice_type = 'sell'), 0)
                FROM invoices
                WHERE invoice_date BETWEEN $1 AND $2
                "#,
            )
            .bind(month_start(today))
            .bind(today)
            .fetch_one(&self.db)
            .await?;
            (Some(buy), Some(sell))
        } else {
            (None, None)
        };

        let flocks = sqlx::query_as::<_, (Uuid, NaiveDate)>(
            r#"
            SELECT id, flock_start_date FROM farms
            WHERE is_active AND flock_start_date IS NOT NULL
              AND ($1::uuid IS NULL OR farmer_id = $1)
            "#,
        )
        .bind(farmer_scope)
        .fetch_all(&self.db)
        .await?;

        let mut overdue_medications = 0;
        for (farm_id, flock_start) in flocks {
            let entries = self
                .medicines
                .farm_schedule(farm_id, flock_start, today, due_window_days)
                .await?;
            overdue_medications += count_overdue(&entries);
        }

        Ok(DashboardStats {
            farm_count,
            warehouse_count,
            material_count,
            low_stock_count,
            eggs_today,
            dead_birds_today,
            month_buy_total,
            month_sell_total,
            overdue_medications,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_start() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(month_start(day), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }
}
