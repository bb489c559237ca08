//! Inventory ledger engine
//!
//! All stock-affecting actions funnel through [`LedgerService::apply_effects`],
//! which runs inside the caller's transaction. Material rows are locked in key
//! order, every step is checked against the balance policy before anything is
//! written, and each step leaves a row in `material_movements`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::ledger::{self, BalanceKey};
use shared::{BalanceEffect, BalancePolicy, MovementSource};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Ledger service
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
    policy: BalancePolicy,
}

/// Audit record of one balance change
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MaterialMovement {
    pub id: Uuid,
    pub material_id: Uuid,
    pub warehouse_id: Uuid,
    pub material_name_id: Uuid,
    pub direction: String,
    pub quantity: Decimal,
    pub balance_after: Decimal,
    pub source: String,
    pub source_id: Option<Uuid>,
    pub reversal: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// What caused a batch of effects
#[derive(Debug, Clone, Copy)]
pub struct MovementContext {
    pub source: MovementSource,
    pub source_id: Uuid,
    pub reversal: bool,
    pub user_id: Uuid,
}

impl MovementContext {
    pub fn new(source: MovementSource, source_id: Uuid, user_id: Uuid) -> Self {
        Self {
            source,
            source_id,
            reversal: false,
            user_id,
        }
    }

    /// Same context, marked as undoing an earlier movement
    pub fn reversal(self) -> Self {
        Self {
            reversal: true,
            ..self
        }
    }
}

struct LockedRow {
    material_id: Uuid,
    balance: Decimal,
}

pub(crate) const MOVEMENT_COLUMNS: &str = "id, material_id, warehouse_id, material_name_id, direction, \
     quantity, balance_after, source, source_id, reversal, created_by, created_at";

impl LedgerService {
    pub fn new(db: PgPool, policy: BalancePolicy) -> Self {
        Self { db, policy }
    }

    pub fn policy(&self) -> BalancePolicy {
        self.policy
    }

    /// Apply effects to material balances inside `tx`, all under `ctx.source`.
    ///
    /// Nothing is written unless every effect is accepted. Zero-quantity effects
    /// are ignored.
    pub async fn apply_effects(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        effects: &[BalanceEffect],
        ctx: MovementContext,
    ) -> AppResult<Vec<MaterialMovement>> {
        let steps: Vec<(BalanceEffect, MovementSource)> =
            effects.iter().map(|effect| (*effect, ctx.source)).collect();
        self.apply_steps(tx, &steps, ctx).await
    }

    /// Apply effects that each carry their own movement source.
    ///
    /// Every row of the batch is locked in one sorted pass before any balance
    /// changes, so documents touching the same rows always lock them in the
    /// same order. `ctx.source` is only used for logging.
    pub async fn apply_steps(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        steps: &[(BalanceEffect, MovementSource)],
        ctx: MovementContext,
    ) -> AppResult<Vec<MaterialMovement>> {
        let plan = ledger::plan(steps);
        if plan.steps.is_empty() {
            return Ok(Vec::new());
        }

        let mut rows: BTreeMap<BalanceKey, LockedRow> = BTreeMap::new();
        for key in plan.locks {
            let row = Self::lock_row(tx, key).await?;
            rows.insert(key, row);
        }

        let mut applied = Vec::with_capacity(plan.steps.len());
        for (effect, source) in plan.steps {
            let row = rows
                .get_mut(&effect.key())
                .ok_or_else(|| AppError::Internal("Material row was not locked".to_string()))?;

            let next = ledger::apply(row.balance, &effect, self.policy).map_err(|err| {
                tracing::warn!(
                    warehouse_id = %effect.warehouse_id,
                    material_name_id = %effect.material_name_id,
                    source = source.as_str(),
                    source_id = %ctx.source_id,
                    error = %err,
                    "Ledger change refused"
                );
                err
            })?;

            row.balance = next;
            applied.push((row.material_id, effect, source, next));
        }

        let effects: Vec<BalanceEffect> = applied.iter().map(|(_, effect, _, _)| *effect).collect();
        for net in ledger::net_effects(&effects) {
            if let Some(row) = rows.get(&net.key()) {
                sqlx::query(
                    "UPDATE materials SET current_balance = $1, updated_at = NOW() WHERE id = $2",
                )
                .bind(row.balance)
                .bind(row.material_id)
                .execute(&mut **tx)
                .await?;
            }
        }

        let mut movements = Vec::with_capacity(applied.len());
        for (material_id, effect, source, balance_after) in applied {
            let movement = sqlx::query_as::<_, MaterialMovement>(&format!(
                r#"
                INSERT INTO material_movements
                    (material_id, warehouse_id, material_name_id, direction, quantity,
                     balance_after, source, source_id, reversal, created_by)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                RETURNING {}
                "#,
                MOVEMENT_COLUMNS
            ))
            .bind(material_id)
            .bind(effect.warehouse_id)
            .bind(effect.material_name_id)
            .bind(effect.direction.as_str())
            .bind(effect.quantity)
            .bind(balance_after)
            .bind(source.as_str())
            .bind(ctx.source_id)
            .bind(ctx.reversal)
            .bind(ctx.user_id)
            .fetch_one(&mut **tx)
            .await?;
            movements.push(movement);
        }

        tracing::info!(
            source = ctx.source.as_str(),
            source_id = %ctx.source_id,
            reversal = ctx.reversal,
            movements = movements.len(),
            "Ledger movements recorded"
        );

        Ok(movements)
    }

    /// Current balance of a material in a warehouse, zero when never stocked
    pub async fn balance_of(&self, warehouse_id: Uuid, material_name_id: Uuid) -> AppResult<Decimal> {
        let balance = sqlx::query_scalar::<_, Decimal>(
            "SELECT current_balance FROM materials WHERE warehouse_id = $1 AND material_name_id = $2",
        )
        .bind(warehouse_id)
        .bind(material_name_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(balance.unwrap_or(Decimal::ZERO))
    }

    /// Lock the material row for `key`, creating an empty one on first use
    async fn lock_row(tx: &mut Transaction<'_, Postgres>, key: BalanceKey) -> AppResult<LockedRow> {
        const SELECT_FOR_UPDATE: &str = r#"
            SELECT id, current_balance FROM materials
            WHERE warehouse_id = $1 AND material_name_id = $2
            FOR UPDATE
        "#;

        let existing = sqlx::query_as::<_, (Uuid, Decimal)>(SELECT_FOR_UPDATE)
            .bind(key.warehouse_id)
            .bind(key.material_name_id)
            .fetch_optional(&mut **tx)
            .await?;

        let (material_id, balance) = match existing {
            Some(row) => row,
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO materials (warehouse_id, material_name_id)
                    VALUES ($1, $2)
                    ON CONFLICT (warehouse_id, material_name_id) DO NOTHING
                    "#,
                )
                .bind(key.warehouse_id)
                .bind(key.material_name_id)
                .execute(&mut **tx)
                .await?;

                sqlx::query_as::<_, (Uuid, Decimal)>(SELECT_FOR_UPDATE)
                    .bind(key.warehouse_id)
                    .bind(key.material_name_id)
                    .fetch_one(&mut **tx)
                    .await?
            }
        };

        Ok(LockedRow {
            material_id,
            balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reversal_context_keeps_source() {
        let ctx = MovementContext::new(MovementSource::SellInvoice, Uuid::nil(), Uuid::nil());
        assert!(!ctx.reversal);

        let undo = ctx.reversal();
        assert!(undo.reversal);
        assert_eq!(undo.source, MovementSource::SellInvoice);
        assert_eq!(undo.source_id, ctx.source_id);
    }
}
