//! Warehouse management service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::validate_name;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;

/// Warehouse service
#[derive(Clone)]
pub struct WarehouseService {
    db: PgPool,
}

/// Warehouse information
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Warehouse {
    pub id: Uuid,
    pub farm_id: Option<Uuid>,
    pub farm_name: Option<String>,
    pub name: String,
    pub location: Option<String>,
    pub material_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a warehouse
#[derive(Debug, Deserialize)]
pub struct CreateWarehouseInput {
    pub farm_id: Option<Uuid>,
    pub name: String,
    pub location: Option<String>,
}

/// Input for updating a warehouse
#[derive(Debug, Deserialize)]
pub struct UpdateWarehouseInput {
    pub farm_id: Option<Uuid>,
    pub name: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WarehouseQuery {
    pub farm_id: Option<Uuid>,
}

const WAREHOUSE_SELECT: &str = r#"
    SELECT w.id, w.farm_id, f.name AS farm_name, w.name, w.location,
           (SELECT COUNT(*) FROM materials m WHERE m.warehouse_id = w.id) AS material_count,
           w.created_at, w.updated_at
    FROM warehouses w
    LEFT JOIN farms f ON f.id = w.farm_id
"#;

impl WarehouseService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Farmers may only see warehouses that belong to their own farms
    pub async fn ensure_access(&self, user: &AuthUser, warehouse_id: Uuid) -> AppResult<()> {
        let farmer_id = sqlx::query_scalar::<_, Option<Uuid>>(
            r#"
            SELECT f.farmer_id
            FROM warehouses w
            LEFT JOIN farms f ON f.id = w.farm_id
            WHERE w.id = $1
            "#,
        )
        .bind(warehouse_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Warehouse".to_string()))?;

        if user.is_admin() || farmer_id == Some(user.user_id) {
            Ok(())
        } else {
            Err(AppError::InsufficientPermissions)
        }
    }

    /// List warehouses, optionally for one farm
    pub async fn list_warehouses(
        &self,
        user: &AuthUser,
        query: WarehouseQuery,
    ) -> AppResult<Vec<Warehouse>> {
        let farmer_scope = (!user.is_admin()).then_some(user.user_id);

        let warehouses = sqlx::query_as::<_, Warehouse>(&format!(
            r#"
            {}
            WHERE ($1::uuid IS NULL OR w.farm_id = $1)
              AND ($2::uuid IS NULL OR f.farmer_id = $2)
            ORDER BY w.name
            "#,
            WAREHOUSE_SELECT
        ))
        .bind(query.farm_id)
        .bind(farmer_scope)
        .fetch_all(&self.db)
        .await?;

        Ok(warehouses)
    }

    /// Get a warehouse by ID
    pub async fn get_warehouse(&self, user: &AuthUser, warehouse_id: Uuid) -> AppResult<Warehouse> {
        self.ensure_access(user, warehouse_id).await?;
        self.fetch_warehouse(warehouse_id).await
    }

    async fn fetch_warehouse(&self, warehouse_id: Uuid) -> AppResult<Warehouse> {
        sqlx::query_as::<_, Warehouse>(&format!("{} WHERE w.id = $1", WAREHOUSE_SELECT))
            .bind(warehouse_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Warehouse".to_string()))
    }

    /// Create a warehouse
    pub async fn create_warehouse(&self, input: CreateWarehouseInput) -> AppResult<Warehouse> {
        validate_name(&input.name).map_err(|msg| AppError::validation("name", msg))?;

        let warehouse_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO warehouses (farm_id, name, location)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(input.farm_id)
        .bind(input.name.trim())
        .bind(&input.location)
        .fetch_one(&self.db)
        .await?;

        self.fetch_warehouse(warehouse_id).await
    }

    /// Update a warehouse
    pub async fn update_warehouse(
        &self,
        warehouse_id: Uuid,
        input: UpdateWarehouseInput,
    ) -> AppResult<Warehouse> {
        let existing = self.fetch_warehouse(warehouse_id).await?;

        let name = input.name.unwrap_or(existing.name);
        validate_name(&name).map_err(|msg| AppError::validation("name", msg))?;

        sqlx::query(
            r#"
            UPDATE warehouses
            SET farm_id = $1, name = $2, location = $3, updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(input.farm_id.or(existing.farm_id))
        .bind(name.trim())
        .bind(input.location.or(existing.location))
        .bind(warehouse_id)
        .execute(&self.db)
        .await?;

        self.fetch_warehouse(warehouse_id).await
    }

    /// Delete a warehouse. Refused while it still holds stock.
    pub async fn delete_warehouse(&self, warehouse_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let stocked = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM materials WHERE warehouse_id = $1 AND current_balance <> 0",
        )
        .bind(warehouse_id)
        .fetch_one(&mut *tx)
        .await?;

        if stocked > 0 {
            tracing::warn!(%warehouse_id, stocked, "Refusing to delete a stocked warehouse");
            return Err(AppError::Conflict {
                resource: "warehouse".to_string(),
                message: format!("Warehouse still holds stock of {} materials", stocked),
                message_ar: format!("المخزن ما زال يحتوي على رصيد {} مواد", stocked),
            });
        }

        // Empty material rows without history go with the warehouse
        sqlx::query(
            r#"
            DELETE FROM materials m
            WHERE m.warehouse_id = $1
              AND NOT EXISTS (SELECT 1 FROM material_movements mm WHERE mm.material_id = m.id)
            "#,
        )
        .bind(warehouse_id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM warehouses WHERE id = $1")
            .bind(warehouse_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict { .. } => AppError::in_use("Warehouse"),
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Warehouse".to_string()));
        }

        tx.commit().await?;
        Ok(())
    }
}
