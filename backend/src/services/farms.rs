//! Farm management service

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::{validate_name, UserRole};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;

/// Farm service
#[derive(Clone)]
pub struct FarmService {
    db: PgPool,
}

/// Farm information
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Farm {
    pub id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub farmer_id: Option<Uuid>,
    pub farmer_name: Option<String>,
    pub flock_start_date: Option<NaiveDate>,
    pub initial_bird_count: i32,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a farm
#[derive(Debug, Deserialize)]
pub struct CreateFarmInput {
    pub name: String,
    pub location: Option<String>,
    pub farmer_id: Option<Uuid>,
    pub flock_start_date: Option<NaiveDate>,
    pub initial_bird_count: Option<i32>,
    pub notes: Option<String>,
}

/// Input for updating a farm
#[derive(Debug, Deserialize)]
pub struct UpdateFarmInput {
    pub name: Option<String>,
    pub location: Option<String>,
    pub farmer_id: Option<Uuid>,
    pub is_active: Option<bool>,
    pub notes: Option<String>,
}

/// Input for placing a new flock on a farm
#[derive(Debug, Deserialize)]
pub struct StartFlockInput {
    pub flock_start_date: NaiveDate,
    pub initial_bird_count: i32,
}

const FARM_SELECT: &str = r#"
    SELECT f.id, f.name, f.location, f.farmer_id, u.full_name AS farmer_name,
           f.flock_start_date, f.initial_bird_count, f.is_active, f.notes,
           f.created_at, f.updated_at
    FROM farms f
    LEFT JOIN users u ON u.id = f.farmer_id
"#;

impl FarmService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Fail unless the user may see and record data for the farm
    pub async fn ensure_access(&self, user: &AuthUser, farm_id: Uuid) -> AppResult<()> {
        let farmer_id = sqlx::query_scalar::<_, Option<Uuid>>(
            "SELECT farmer_id FROM farms WHERE id = $1",
        )
        .bind(farm_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Farm".to_string()))?;

        if user.is_admin() || farmer_id == Some(user.user_id) {
            Ok(())
        } else {
            Err(AppError::InsufficientPermissions)
        }
    }

    /// List farms visible to the user
    pub async fn list_farms(&self, user: &AuthUser) -> AppResult<Vec<Farm>> {
        let farms = if user.is_admin() {
            sqlx::query_as::<_, Farm>(&format!("{} ORDER BY f.name", FARM_SELECT))
                .fetch_all(&self.db)
                .await?
        } else {
            sqlx::query_as::<_, Farm>(&format!(
                "{} WHERE f.farmer_id = $1 ORDER BY f.name",
                FARM_SELECT
            ))
            .bind(user.user_id)
            .fetch_all(&self.db)
            .await?
        };

        Ok(farms)
    }

    /// Get a farm by ID
    pub async fn get_farm(&self, user: &AuthUser, farm_id: Uuid) -> AppResult<Farm> {
        self.ensure_access(user, farm_id).await?;
        self.fetch_farm(farm_id).await
    }

    pub(crate) async fn fetch_farm(&self, farm_id: Uuid) -> AppResult<Farm> {
        sqlx::query_as::<_, Farm>(&format!("{} WHERE f.id = $1", FARM_SELECT))
            .bind(farm_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Farm".to_string()))
    }

    /// Create a farm
    pub async fn create_farm(&self, input: CreateFarmInput) -> AppResult<Farm> {
        validate_name(&input.name).map_err(|msg| AppError::validation("name", msg))?;
        let initial_bird_count = input.initial_bird_count.unwrap_or(0);
        if initial_bird_count < 0 {
            return Err(AppError::validation(
                "initial_bird_count",
                "Bird count cannot be negative",
            ));
        }
        if let Some(farmer_id) = input.farmer_id {
            self.ensure_farmer(farmer_id).await?;
        }

        let farm_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO farms (name, location, farmer_id, flock_start_date, initial_bird_count, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(input.name.trim())
        .bind(&input.location)
        .bind(input.farmer_id)
        .bind(input.flock_start_date)
        .bind(initial_bird_count)
        .bind(&input.notes)
        .fetch_one(&self.db)
        .await?;

        self.fetch_farm(farm_id).await
    }

    /// Update a farm
    pub async fn update_farm(&self, farm_id: Uuid, input: UpdateFarmInput) -> AppResult<Farm> {
        let existing = self.fetch_farm(farm_id).await?;

        let name = input.name.unwrap_or(existing.name);
        validate_name(&name).map_err(|msg| AppError::validation("name", msg))?;
        let farmer_id = input.farmer_id.or(existing.farmer_id);
        if let Some(farmer_id) = input.farmer_id {
            self.ensure_farmer(farmer_id).await?;
        }

        sqlx::query(
            r#"
            UPDATE farms
            SET name = $1, location = $2, farmer_id = $3, is_active = $4, notes = $5,
                updated_at = NOW()
            WHERE id = $6
            "#,
        )
        .bind(name.trim())
        .bind(input.location.or(existing.location))
        .bind(farmer_id)
        .bind(input.is_active.unwrap_or(existing.is_active))
        .bind(input.notes.or(existing.notes))
        .bind(farm_id)
        .execute(&self.db)
        .await?;

        self.fetch_farm(farm_id).await
    }

    /// Record placement of a new flock
    pub async fn start_flock(&self, farm_id: Uuid, input: StartFlockInput) -> AppResult<Farm> {
        if input.initial_bird_count <= 0 {
            return Err(AppError::validation(
                "initial_bird_count",
                "A flock must have at least one bird",
            ));
        }

        let result = sqlx::query(
            r#"
            UPDATE farms
            SET flock_start_date = $1, initial_bird_count = $2, updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(input.flock_start_date)
        .bind(input.initial_bird_count)
        .bind(farm_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Farm".to_string()));
        }

        tracing::info!(%farm_id, start = %input.flock_start_date, "New flock placed");

        self.fetch_farm(farm_id).await
    }

    /// Delete a farm. Refused while reports, warehouses or invoices reference it.
    pub async fn delete_farm(&self, farm_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM farms WHERE id = $1")
            .bind(farm_id)
            .execute(&self.db)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict { .. } => AppError::in_use("Farm"),
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Farm".to_string()));
        }

        Ok(())
    }

    /// A farm can only be assigned to an active farmer account
    async fn ensure_farmer(&self, user_id: Uuid) -> AppResult<()> {
        let role = sqlx::query_scalar::<_, String>(
            "SELECT role FROM users WHERE id = $1 AND is_active = true",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Farmer".to_string()))?;

        if role.parse::<UserRole>()? != UserRole::Farmer {
            return Err(AppError::validation(
                "farmer_id",
                "Farms can only be assigned to farmer accounts",
            ));
        }
        Ok(())
    }
}
