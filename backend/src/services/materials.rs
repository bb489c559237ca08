//! Material stock rows, manual adjustments and transfers

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::ledger::{adjustment_effect, transfer_effects};
use shared::{
    validate_amount, validate_quantity, BalancePolicy, MovementSource, PaginatedResponse,
    Pagination,
};
use sqlx::PgPool;
use uuid::Uuid;

use super::ledger::{LedgerService, MaterialMovement, MovementContext, MOVEMENT_COLUMNS};
use crate::error::{AppError, AppResult};

/// Material service
#[derive(Clone)]
pub struct MaterialService {
    db: PgPool,
    ledger: LedgerService,
}

/// A material held in a warehouse
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MaterialView {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub material_name_id: Uuid,
    pub material_name: String,
    pub category: String,
    pub unit_id: Option<Uuid>,
    pub unit_name: Option<String>,
    pub opening_balance: Decimal,
    pub current_balance: Decimal,
    pub minimum_balance: Decimal,
    pub is_low_stock: bool,
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a material in a warehouse
#[derive(Debug, Deserialize)]
pub struct CreateMaterialInput {
    pub warehouse_id: Uuid,
    pub material_name_id: Uuid,
    pub unit_id: Option<Uuid>,
    #[serde(default)]
    pub opening_balance: Decimal,
    #[serde(default)]
    pub minimum_balance: Decimal,
}

/// Input for updating a material
#[derive(Debug, Deserialize)]
pub struct UpdateMaterialInput {
    pub unit_id: Option<Uuid>,
    pub minimum_balance: Option<Decimal>,
}

/// A physical stock count
#[derive(Debug, Deserialize)]
pub struct AdjustBalanceInput {
    pub counted_balance: Decimal,
}

/// Input for moving stock between warehouses
#[derive(Debug, Deserialize)]
pub struct TransferInput {
    pub from_warehouse_id: Uuid,
    pub to_warehouse_id: Uuid,
    pub material_name_id: Uuid,
    pub quantity: Decimal,
}

/// Outcome of a transfer
#[derive(Debug, Serialize)]
pub struct TransferResult {
    pub transfer_id: Uuid,
    pub material_name_id: Uuid,
    pub quantity: Decimal,
    pub from_balance: Decimal,
    pub to_balance: Decimal,
    pub movements: Vec<MaterialMovement>,
}

#[derive(Debug, Deserialize)]
pub struct MaterialQuery {
    pub warehouse_id: Option<Uuid>,
    pub material_name_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct MovementQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

const MATERIAL_SELECT: &str = r#"
    SELECT m.id, m.warehouse_id, w.name AS warehouse_name,
           m.material_name_id, mn.name AS material_name, mn.category,
           m.unit_id, u.name AS unit_name,
           m.opening_balance, m.current_balance, m.minimum_balance,
           (m.minimum_balance > 0 AND m.current_balance <= m.minimum_balance) AS is_low_stock,
           m.updated_at
    FROM materials m
    JOIN warehouses w ON w.id = m.warehouse_id
    JOIN material_names mn ON mn.id = m.material_name_id
    LEFT JOIN units u ON u.id = m.unit_id
"#;

impl MaterialService {
    pub fn new(db: PgPool, policy: BalancePolicy) -> Self {
        Self {
            ledger: LedgerService::new(db.clone(), policy),
            db,
        }
    }

    /// List materials, optionally filtered by warehouse or material name
    pub async fn list_materials(&self, query: MaterialQuery) -> AppResult<Vec<MaterialView>> {
        let materials = sqlx::query_as::<_, MaterialView>(&format!(
            r#"
            {}
            WHERE ($1::uuid IS NULL OR m.warehouse_id = $1)
              AND ($2::uuid IS NULL OR m.material_name_id = $2)
            ORDER BY w.name, mn.name
            "#,
            MATERIAL_SELECT
        ))
        .bind(query.warehouse_id)
        .bind(query.material_name_id)
        .fetch_all(&self.db)
        .await?;

        Ok(materials)
    }

    /// Get a material by ID
    pub async fn get_material(&self, material_id: Uuid) -> AppResult<MaterialView> {
        sqlx::query_as::<_, MaterialView>(&format!("{} WHERE m.id = $1", MATERIAL_SELECT))
            .bind(material_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Material".to_string()))
    }

    /// Register a material in a warehouse with its opening balance
    pub async fn create_material(
        &self,
        user_id: Uuid,
        input: CreateMaterialInput,
    ) -> AppResult<MaterialView> {
        validate_amount(input.opening_balance)
            .map_err(|msg| AppError::validation("opening_balance", msg))?;
        validate_amount(input.minimum_balance)
            .map_err(|msg| AppError::validation("minimum_balance", msg))?;

        let mut tx = self.db.begin().await?;

        let material_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO materials (warehouse_id, material_name_id, unit_id, opening_balance, minimum_balance)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(input.warehouse_id)
        .bind(input.material_name_id)
        .bind(input.unit_id)
        .bind(input.opening_balance)
        .bind(input.minimum_balance)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(effect) = adjustment_effect(
            input.warehouse_id,
            input.material_name_id,
            Decimal::ZERO,
            input.opening_balance,
        ) {
            let ctx = MovementContext::new(MovementSource::Adjustment, material_id, user_id);
            self.ledger.apply_effects(&mut tx, &[effect], ctx).await?;
        }

        tx.commit().await?;

        self.get_material(material_id).await
    }

    /// Update unit or minimum balance
    pub async fn update_material(
        &self,
        material_id: Uuid,
        input: UpdateMaterialInput,
    ) -> AppResult<MaterialView> {
        if let Some(minimum) = input.minimum_balance {
            validate_amount(minimum).map_err(|msg| AppError::validation("minimum_balance", msg))?;
        }

        let result = sqlx::query(
            r#"
            UPDATE materials
            SET unit_id = COALESCE($1, unit_id),
                minimum_balance = COALESCE($2, minimum_balance),
                updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(input.unit_id)
        .bind(input.minimum_balance)
        .bind(material_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Material".to_string()));
        }

        self.get_material(material_id).await
    }

    /// Correct a balance to a counted quantity
    pub async fn adjust_balance(
        &self,
        user_id: Uuid,
        material_id: Uuid,
        input: AdjustBalanceInput,
    ) -> AppResult<MaterialView> {
        if input.counted_balance < Decimal::ZERO && self.ledger.policy() == BalancePolicy::ForbidNegative
        {
            return Err(AppError::validation(
                "counted_balance",
                "Counted balance cannot be negative",
            ));
        }

        let mut tx = self.db.begin().await?;

        let (warehouse_id, material_name_id, current) =
            sqlx::query_as::<_, (Uuid, Uuid, Decimal)>(
                r#"
                SELECT warehouse_id, material_name_id, current_balance
                FROM materials WHERE id = $1
                FOR UPDATE
                "#,
            )
            .bind(material_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Material".to_string()))?;

        if let Some(effect) =
            adjustment_effect(warehouse_id, material_name_id, current, input.counted_balance)
        {
            let ctx = MovementContext::new(MovementSource::Adjustment, material_id, user_id);
            self.ledger.apply_effects(&mut tx, &[effect], ctx).await?;
        }

        tx.commit().await?;

        self.get_material(material_id).await
    }

    /// Move stock from one warehouse to another
    pub async fn transfer(&self, user_id: Uuid, input: TransferInput) -> AppResult<TransferResult> {
        validate_quantity(input.quantity).map_err(|msg| AppError::validation("quantity", msg))?;
        let effects = transfer_effects(
            input.from_warehouse_id,
            input.to_warehouse_id,
            input.material_name_id,
            input.quantity,
        )?;

        let stocked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM materials WHERE warehouse_id = $1 AND material_name_id = $2)",
        )
        .bind(input.from_warehouse_id)
        .bind(input.material_name_id)
        .fetch_one(&self.db)
        .await?;

        if !stocked {
            return Err(AppError::NotFound("Material in source warehouse".to_string()));
        }

        let transfer_id = Uuid::new_v4();
        let mut tx = self.db.begin().await?;
        let ctx = MovementContext::new(MovementSource::Transfer, transfer_id, user_id);
        let movements = self.ledger.apply_effects(&mut tx, &effects, ctx).await?;
        tx.commit().await?;

        let from_balance = self
            .ledger
            .balance_of(input.from_warehouse_id, input.material_name_id)
            .await?;
        let to_balance = self
            .ledger
            .balance_of(input.to_warehouse_id, input.material_name_id)
            .await?;

        Ok(TransferResult {
            transfer_id,
            material_name_id: input.material_name_id,
            quantity: input.quantity,
            from_balance,
            to_balance,
            movements,
        })
    }

    /// Materials at or below their minimum balance
    pub async fn low_stock(&self, warehouse_id: Option<Uuid>) -> AppResult<Vec<MaterialView>> {
        let materials = sqlx::query_as::<_, MaterialView>(&format!(
            r#"
            {}
            WHERE m.minimum_balance > 0
              AND m.current_balance <= m.minimum_balance
              AND ($1::uuid IS NULL OR m.warehouse_id = $1)
            ORDER BY (m.current_balance - m.minimum_balance), mn.name
            "#,
            MATERIAL_SELECT
        ))
        .bind(warehouse_id)
        .fetch_all(&self.db)
        .await?;

        Ok(materials)
    }

    /// Movement history of a material, newest first
    pub async fn list_movements(
        &self,
        material_id: Uuid,
        query: MovementQuery,
    ) -> AppResult<PaginatedResponse<MaterialMovement>> {
        let pagination = Pagination::from_query(query.page, query.per_page);

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM material_movements WHERE material_id = $1",
        )
        .bind(material_id)
        .fetch_one(&self.db)
        .await?;

        let movements = sqlx::query_as::<_, MaterialMovement>(&format!(
            r#"
            SELECT {} FROM material_movements
            WHERE material_id = $1
            ORDER BY created_at DESC, id
            LIMIT $2 OFFSET $3
            "#,
            MOVEMENT_COLUMNS
        ))
        .bind(material_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: movements,
            pagination: pagination.meta(total.max(0) as u64),
        })
    }

    /// Delete a material with no stock and no history
    pub async fn delete_material(&self, material_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let balance = sqlx::query_scalar::<_, Decimal>(
            "SELECT current_balance FROM materials WHERE id = $1 FOR UPDATE",
        )
        .bind(material_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Material".to_string()))?;

        if !balance.is_zero() {
            return Err(AppError::Conflict {
                resource: "material".to_string(),
                message: format!("Material still has a balance of {}", balance),
                message_ar: format!("المادة ما زال لها رصيد {}", balance),
            });
        }

        sqlx::query("DELETE FROM materials WHERE id = $1")
            .bind(material_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict { .. } => AppError::in_use("Material"),
                other => other,
            })?;

        tx.commit().await?;
        Ok(())
    }
}
