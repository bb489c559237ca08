//! Manufacturing (feed mixing) invoices
//!
//! A run consumes input materials from a warehouse and produces an output
//! material into the same warehouse.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::ledger::{manufacturing_effects, manufacturing_sources, quantity_change_effect};
use shared::pricing::{manufacturing_unit_cost, mix_input_value, validate_mix_percentages};
use shared::{
    validate_amount, validate_quantity, BalanceEffect, BalancePolicy, DateRange, Direction,
    MixLine, MovementSource, PaginatedResponse, Pagination,
};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::ledger::{LedgerService, MovementContext};
use super::numbering::{self, NumberedTable};
use crate::error::{AppError, AppResult};

const NUMBER_PREFIX: &str = "MFG";

/// Manufacturing service
#[derive(Clone)]
pub struct ManufacturingService {
    db: PgPool,
    ledger: LedgerService,
}

/// Manufacturing invoice header
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ManufacturingInvoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub output_material_name_id: Uuid,
    pub output_material_name: String,
    pub output_unit_id: Option<Uuid>,
    pub output_quantity: Decimal,
    pub total_expenses: Decimal,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input material consumed by a run
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ManufacturingItem {
    pub id: Uuid,
    pub manufacturing_invoice_id: Uuid,
    pub material_name_id: Uuid,
    pub material_name: String,
    pub unit_id: Option<Uuid>,
    pub quantity: Decimal,
    pub weight: Decimal,
    pub percentage: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ManufacturingExpense {
    pub id: Uuid,
    pub manufacturing_invoice_id: Uuid,
    pub expense_type_id: Uuid,
    pub expense_type_name: String,
    pub amount: Decimal,
}

/// Cost of a run from the average buy prices of its inputs
#[derive(Debug, Clone, Serialize)]
pub struct CostSummary {
    pub total_input_value: Decimal,
    pub total_expenses: Decimal,
    pub total_cost: Decimal,
    pub unit_cost: Option<Decimal>,
    /// Inputs never bought, and therefore left out of the input value
    pub unpriced_inputs: usize,
}

/// Manufacturing invoice with inputs, expenses and cost
#[derive(Debug, Serialize)]
pub struct ManufacturingDetail {
    #[serde(flatten)]
    pub invoice: ManufacturingInvoice,
    pub items: Vec<ManufacturingItem>,
    pub expenses: Vec<ManufacturingExpense>,
    pub cost: CostSummary,
}

#[derive(Debug, Deserialize)]
pub struct ManufacturingItemInput {
    pub material_name_id: Uuid,
    pub unit_id: Option<Uuid>,
    pub quantity: Decimal,
    pub weight: Option<Decimal>,
    pub percentage: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateManufacturingItemInput {
    pub unit_id: Option<Uuid>,
    pub quantity: Option<Decimal>,
    pub weight: Option<Decimal>,
    pub percentage: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct ManufacturingExpenseInput {
    pub expense_type_id: Uuid,
    pub amount: Decimal,
}

/// Input for creating a manufacturing run
#[derive(Debug, Deserialize)]
pub struct CreateManufacturingInput {
    pub invoice_date: NaiveDate,
    pub warehouse_id: Uuid,
    pub output_material_name_id: Uuid,
    pub output_unit_id: Option<Uuid>,
    pub output_quantity: Decimal,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<ManufacturingItemInput>,
    #[serde(default)]
    pub expenses: Vec<ManufacturingExpenseInput>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateManufacturingInput {
    pub invoice_date: Option<NaiveDate>,
    pub output_unit_id: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OutputQuantityInput {
    pub output_quantity: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ManufacturingQuery {
    pub warehouse_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, sqlx::FromRow)]
struct RunLock {
    warehouse_id: Uuid,
    output_material_name_id: Uuid,
    output_quantity: Decimal,
}

const RUN_SELECT: &str = r#"
    SELECT mi.id, mi.invoice_number, mi.invoice_date,
           mi.warehouse_id, w.name AS warehouse_name,
           mi.output_material_name_id, mn.name AS output_material_name,
           mi.output_unit_id, mi.output_quantity, mi.total_expenses, mi.notes,
           mi.created_by, mi.created_at, mi.updated_at
    FROM manufacturing_invoices mi
    JOIN warehouses w ON w.id = mi.warehouse_id
    JOIN material_names mn ON mn.id = mi.output_material_name_id
"#;

fn validate_item(item: &ManufacturingItemInput) -> AppResult<()> {
    validate_quantity(item.quantity).map_err(|msg| AppError::validation("quantity", msg))?;
    if let Some(weight) = item.weight {
        validate_amount(weight).map_err(|msg| AppError::validation("weight", msg))?;
    }
    if let Some(pct) = item.percentage {
        if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
            return Err(AppError::validation(
                "percentage",
                "Percentage must be between 0 and 100",
            ));
        }
    }
    Ok(())
}

/// Cost summary from inputs priced at their average buy price
fn summarize_cost(lines: &[MixLine], total_expenses: Decimal, output_quantity: Decimal) -> CostSummary {
    let total_input_value = mix_input_value(lines);
    CostSummary {
        total_input_value,
        total_expenses,
        total_cost: total_input_value + total_expenses,
        unit_cost: manufacturing_unit_cost(total_input_value, total_expenses, output_quantity),
        unpriced_inputs: lines.iter().filter(|l| l.unit_cost.is_none()).count(),
    }
}

impl ManufacturingService {
    pub fn new(db: PgPool, policy: BalancePolicy) -> Self {
        Self {
            ledger: LedgerService::new(db.clone(), policy),
            db,
        }
    }

    /// List runs, newest first
    pub async fn list_runs(
        &self,
        query: ManufacturingQuery,
    ) -> AppResult<PaginatedResponse<ManufacturingInvoice>> {
        let pagination = Pagination::from_query(query.page, query.per_page);
        let range = DateRange::from_bounds(query.from, query.to);
        if !range.is_valid() {
            return Err(AppError::validation("from", "Start date is after end date"));
        }

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM manufacturing_invoices mi
            WHERE ($1::uuid IS NULL OR mi.warehouse_id = $1)
              AND mi.invoice_date BETWEEN $2 AND $3
            "#,
        )
        .bind(query.warehouse_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.db)
        .await?;

        let runs = sqlx::query_as::<_, ManufacturingInvoice>(&format!(
            r#"
            {}
            WHERE ($1::uuid IS NULL OR mi.warehouse_id = $1)
              AND mi.invoice_date BETWEEN $2 AND $3
            ORDER BY mi.invoice_date DESC, mi.invoice_number DESC
            LIMIT $4 OFFSET $5
            "#,
            RUN_SELECT
        ))
        .bind(query.warehouse_id)
        .bind(range.start)
        .bind(range.end)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: runs,
            pagination: pagination.meta(total.max(0) as u64),
        })
    }

    /// Get a run with inputs, expenses and cost summary
    pub async fn get_run(&self, run_id: Uuid) -> AppResult<ManufacturingDetail> {
        let invoice = sqlx::query_as::<_, ManufacturingInvoice>(&format!(
            "{} WHERE mi.id = $1",
            RUN_SELECT
        ))
        .bind(run_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Manufacturing invoice".to_string()))?;

        let items = sqlx::query_as::<_, ManufacturingItem>(
            r#"
            SELECT it.id, it.manufacturing_invoice_id, it.material_name_id,
                   mn.name AS material_name, it.unit_id, it.quantity, it.weight, it.percentage
            FROM manufacturing_items it
            JOIN material_names mn ON mn.id = it.material_name_id
            WHERE it.manufacturing_invoice_id = $1
            ORDER BY it.created_at, it.id
            "#,
        )
        .bind(run_id)
        .fetch_all(&self.db)
        .await?;

        let expenses = sqlx::query_as::<_, ManufacturingExpense>(
            r#"
            SELECT me.id, me.manufacturing_invoice_id, me.expense_type_id,
                   et.name AS expense_type_name, me.amount
            FROM manufacturing_expenses me
            JOIN expense_types et ON et.id = me.expense_type_id
            WHERE me.manufacturing_invoice_id = $1
            ORDER BY me.created_at, me.id
            "#,
        )
        .bind(run_id)
        .fetch_all(&self.db)
        .await?;

        let mut lines = Vec::with_capacity(items.len());
        for item in &items {
            lines.push(MixLine {
                quantity: item.quantity,
                percentage: item.percentage,
                unit_cost: self.average_buy_price(item.material_name_id).await?,
            });
        }
        let cost = summarize_cost(&lines, invoice.total_expenses, invoice.output_quantity);

        Ok(ManufacturingDetail {
            invoice,
            items,
            expenses,
            cost,
        })
    }

    /// Create a run: the output comes in, every input goes out
    pub async fn create_run(
        &self,
        user_id: Uuid,
        input: CreateManufacturingInput,
    ) -> AppResult<ManufacturingDetail> {
        validate_quantity(input.output_quantity)
            .map_err(|msg| AppError::validation("output_quantity", msg))?;
        for item in &input.items {
            validate_item(item)?;
        }
        for expense in &input.expenses {
            validate_amount(expense.amount).map_err(|msg| AppError::validation("amount", msg))?;
        }
        let mix: Vec<MixLine> = input
            .items
            .iter()
            .map(|i| MixLine {
                quantity: i.quantity,
                percentage: i.percentage,
                unit_cost: None,
            })
            .collect();
        validate_mix_percentages(&mix).map_err(|msg| AppError::validation("percentage", msg))?;

        let mut tx = self.db.begin().await?;
        let invoice_number =
            numbering::allocate(&mut tx, NumberedTable::ManufacturingInvoices, NUMBER_PREFIX).await?;

        let run_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO manufacturing_invoices
                (invoice_number, invoice_date, warehouse_id, output_material_name_id,
                 output_unit_id, output_quantity, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&invoice_number)
        .bind(input.invoice_date)
        .bind(input.warehouse_id)
        .bind(input.output_material_name_id)
        .bind(input.output_unit_id)
        .bind(input.output_quantity)
        .bind(&input.notes)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        for item in &input.items {
            Self::insert_item(&mut tx, run_id, item).await?;
        }
        for expense in &input.expenses {
            Self::insert_expense(&mut tx, run_id, expense).await?;
        }
        Self::recompute_expenses(&mut tx, run_id).await?;

        let inputs: Vec<(Uuid, Decimal)> = input
            .items
            .iter()
            .map(|i| (i.material_name_id, i.quantity))
            .collect();
        let effects = manufacturing_effects(
            input.warehouse_id,
            (input.output_material_name_id, input.output_quantity),
            &inputs,
        );
        self.apply_run_effects(&mut tx, &effects, run_id, user_id, false)
            .await?;

        tx.commit().await?;

        tracing::info!(%run_id, invoice_number = %invoice_number, inputs = inputs.len(), "Manufacturing run created");

        self.get_run(run_id).await
    }

    /// Update date, output unit or notes
    pub async fn update_run(
        &self,
        run_id: Uuid,
        input: UpdateManufacturingInput,
    ) -> AppResult<ManufacturingDetail> {
        let result = sqlx::query(
            r#"
            UPDATE manufacturing_invoices
            SET invoice_date = COALESCE($1, invoice_date),
                output_unit_id = COALESCE($2, output_unit_id),
                notes = COALESCE($3, notes),
                updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(input.invoice_date)
        .bind(input.output_unit_id)
        .bind(&input.notes)
        .bind(run_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Manufacturing invoice".to_string()));
        }

        self.get_run(run_id).await
    }

    /// Change the produced quantity, moving only the difference
    pub async fn update_output_quantity(
        &self,
        user_id: Uuid,
        run_id: Uuid,
        input: OutputQuantityInput,
    ) -> AppResult<ManufacturingDetail> {
        validate_quantity(input.output_quantity)
            .map_err(|msg| AppError::validation("output_quantity", msg))?;

        let mut tx = self.db.begin().await?;
        let run = Self::lock_run(&mut tx, run_id).await?;

        let original = BalanceEffect::new(
            run.warehouse_id,
            run.output_material_name_id,
            Direction::In,
            run.output_quantity,
        );
        if let Some(delta) = quantity_change_effect(&original, input.output_quantity) {
            let ctx = MovementContext::new(MovementSource::ManufacturingOutput, run_id, user_id);
            self.ledger.apply_effects(&mut tx, &[delta], ctx).await?;
        }

        sqlx::query(
            "UPDATE manufacturing_invoices SET output_quantity = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(input.output_quantity)
        .bind(run_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.get_run(run_id).await
    }

    /// Delete a run: the output leaves stock and the inputs return
    pub async fn delete_run(&self, user_id: Uuid, run_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        let run = Self::lock_run(&mut tx, run_id).await?;

        let inputs = sqlx::query_as::<_, (Uuid, Decimal)>(
            "SELECT material_name_id, quantity FROM manufacturing_items WHERE manufacturing_invoice_id = $1",
        )
        .bind(run_id)
        .fetch_all(&mut *tx)
        .await?;

        let reversals: Vec<BalanceEffect> = manufacturing_effects(
            run.warehouse_id,
            (run.output_material_name_id, run.output_quantity),
            &inputs,
        )
        .iter()
        .map(BalanceEffect::reversed)
        .collect();
        self.apply_run_effects(&mut tx, &reversals, run_id, user_id, true)
            .await?;

        sqlx::query("DELETE FROM manufacturing_invoices WHERE id = $1")
            .bind(run_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(%run_id, "Manufacturing run deleted");
        Ok(())
    }

    /// Add an input material
    pub async fn add_item(
        &self,
        user_id: Uuid,
        run_id: Uuid,
        input: ManufacturingItemInput,
    ) -> AppResult<ManufacturingDetail> {
        validate_item(&input)?;

        let mut tx = self.db.begin().await?;
        let run = Self::lock_run(&mut tx, run_id).await?;

        Self::insert_item(&mut tx, run_id, &input).await?;

        let effect = BalanceEffect::new(
            run.warehouse_id,
            input.material_name_id,
            Direction::Out,
            input.quantity,
        );
        let ctx = MovementContext::new(MovementSource::ManufacturingInput, run_id, user_id);
        self.ledger.apply_effects(&mut tx, &[effect], ctx).await?;

        tx.commit().await?;
        self.get_run(run_id).await
    }

    /// Edit an input material
    pub async fn update_item(
        &self,
        user_id: Uuid,
        run_id: Uuid,
        item_id: Uuid,
        input: UpdateManufacturingItemInput,
    ) -> AppResult<ManufacturingDetail> {
        let mut tx = self.db.begin().await?;
        let run = Self::lock_run(&mut tx, run_id).await?;

        let (material_name_id, unit_id, quantity, weight, percentage) =
            sqlx::query_as::<_, (Uuid, Option<Uuid>, Decimal, Decimal, Option<Decimal>)>(
                r#"
                SELECT material_name_id, unit_id, quantity, weight, percentage
                FROM manufacturing_items
                WHERE id = $1 AND manufacturing_invoice_id = $2
                FOR UPDATE
                "#,
            )
            .bind(item_id)
            .bind(run_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Manufacturing item".to_string()))?;

        let updated = ManufacturingItemInput {
            material_name_id,
            unit_id: input.unit_id.or(unit_id),
            quantity: input.quantity.unwrap_or(quantity),
            weight: Some(input.weight.unwrap_or(weight)),
            percentage: input.percentage.or(percentage),
        };
        validate_item(&updated)?;

        let original = BalanceEffect::new(run.warehouse_id, material_name_id, Direction::Out, quantity);
        if let Some(delta) = quantity_change_effect(&original, updated.quantity) {
            let ctx = MovementContext::new(MovementSource::ManufacturingInput, run_id, user_id);
            self.ledger.apply_effects(&mut tx, &[delta], ctx).await?;
        }

        sqlx::query(
            r#"
            UPDATE manufacturing_items
            SET unit_id = $1, quantity = $2, weight = $3, percentage = $4
            WHERE id = $5
            "#,
        )
        .bind(updated.unit_id)
        .bind(updated.quantity)
        .bind(updated.weight.unwrap_or(Decimal::ZERO))
        .bind(updated.percentage)
        .bind(item_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.get_run(run_id).await
    }

    /// Remove an input material and return it to stock
    pub async fn delete_item(
        &self,
        user_id: Uuid,
        run_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<ManufacturingDetail> {
        let mut tx = self.db.begin().await?;
        let run = Self::lock_run(&mut tx, run_id).await?;

        let (material_name_id, quantity) = sqlx::query_as::<_, (Uuid, Decimal)>(
            r#"
            DELETE FROM manufacturing_items
            WHERE id = $1 AND manufacturing_invoice_id = $2
            RETURNING material_name_id, quantity
            "#,
        )
        .bind(item_id)
        .bind(run_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Manufacturing item".to_string()))?;

        let reversal = BalanceEffect::new(run.warehouse_id, material_name_id, Direction::In, quantity);
        let ctx =
            MovementContext::new(MovementSource::ManufacturingInput, run_id, user_id).reversal();
        self.ledger.apply_effects(&mut tx, &[reversal], ctx).await?;

        tx.commit().await?;
        self.get_run(run_id).await
    }

    /// Add an expense
    pub async fn add_expense(
        &self,
        run_id: Uuid,
        input: ManufacturingExpenseInput,
    ) -> AppResult<ManufacturingDetail> {
        validate_amount(input.amount).map_err(|msg| AppError::validation("amount", msg))?;

        let mut tx = self.db.begin().await?;
        Self::lock_run(&mut tx, run_id).await?;
        Self::insert_expense(&mut tx, run_id, &input).await?;
        Self::recompute_expenses(&mut tx, run_id).await?;
        tx.commit().await?;

        self.get_run(run_id).await
    }

    /// Remove an expense
    pub async fn delete_expense(&self, run_id: Uuid, expense_id: Uuid) -> AppResult<ManufacturingDetail> {
        let mut tx = self.db.begin().await?;
        Self::lock_run(&mut tx, run_id).await?;

        let result = sqlx::query(
            "DELETE FROM manufacturing_expenses WHERE id = $1 AND manufacturing_invoice_id = $2",
        )
        .bind(expense_id)
        .bind(run_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Manufacturing expense".to_string()));
        }

        Self::recompute_expenses(&mut tx, run_id).await?;
        tx.commit().await?;

        self.get_run(run_id).await
    }

    /// Apply output and input effects in one ledger batch, each tagged with its source
    async fn apply_run_effects(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        effects: &[BalanceEffect],
        run_id: Uuid,
        user_id: Uuid,
        reversal: bool,
    ) -> AppResult<()> {
        let mut ctx = MovementContext::new(MovementSource::ManufacturingOutput, run_id, user_id);
        if reversal {
            ctx = ctx.reversal();
        }

        let steps = manufacturing_sources(effects);
        self.ledger.apply_steps(tx, &steps, ctx).await?;
        Ok(())
    }

    /// Weighted average price paid for a material across buy invoices
    async fn average_buy_price(&self, material_name_id: Uuid) -> AppResult<Option<Decimal>> {
        let price = sqlx::query_scalar::<_, Option<Decimal>>(
            r#"
            SELECT SUM(ii.value) / NULLIF(SUM(ii.quantity), 0)
            FROM invoice_items ii
            JOIN invoices i ON i.id = ii.invoice_id
            WHERE i.invoice_type = 'buy' AND ii.material_name_id = $1
            "#,
        )
        .bind(material_name_id)
        .fetch_one(&self.db)
        .await?;

        Ok(price.map(|p| p.round_dp(4)))
    }

    async fn lock_run(tx: &mut Transaction<'_, Postgres>, run_id: Uuid) -> AppResult<RunLock> {
        sqlx::query_as::<_, RunLock>(
            r#"
            SELECT warehouse_id, output_material_name_id, output_quantity
            FROM manufacturing_invoices
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(run_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Manufacturing invoice".to_string()))
    }

    async fn insert_item(
        tx: &mut Transaction<'_, Postgres>,
        run_id: Uuid,
        item: &ManufacturingItemInput,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO manufacturing_items
                (manufacturing_invoice_id, material_name_id, unit_id, quantity, weight, percentage)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(run_id)
        .bind(item.material_name_id)
        .bind(item.unit_id)
        .bind(item.quantity)
        .bind(item.weight.unwrap_or(Decimal::ZERO))
        .bind(item.percentage)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn insert_expense(
        tx: &mut Transaction<'_, Postgres>,
        run_id: Uuid,
        expense: &ManufacturingExpenseInput,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO manufacturing_expenses (manufacturing_invoice_id, expense_type_id, amount)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(run_id)
        .bind(expense.expense_type_id)
        .bind(expense.amount)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn recompute_expenses(tx: &mut Transaction<'_, Postgres>, run_id: Uuid) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE manufacturing_invoices
            SET total_expenses = COALESCE(
                    (SELECT SUM(amount) FROM manufacturing_expenses WHERE manufacturing_invoice_id = $1),
                    0),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(run_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: i64, unit_cost: Option<i64>) -> MixLine {
        MixLine {
            quantity: Decimal::from(quantity),
            percentage: None,
            unit_cost: unit_cost.map(Decimal::from),
        }
    }

    #[test]
    fn test_cost_summary() {
        let lines = vec![line(60, Some(2)), line(40, Some(3))];
        let cost = summarize_cost(&lines, Decimal::from(40), Decimal::from(100));

        assert_eq!(cost.total_input_value, Decimal::from(240));
        assert_eq!(cost.total_cost, Decimal::from(280));
        assert_eq!(cost.unit_cost, Some(Decimal::new(28, 1)));
        assert_eq!(cost.unpriced_inputs, 0);
    }

    #[test]
    fn test_cost_summary_counts_unpriced_inputs() {
        let lines = vec![line(60, Some(2)), line(40, None)];
        let cost = summarize_cost(&lines, Decimal::ZERO, Decimal::from(100));
        assert_eq!(cost.total_input_value, Decimal::from(120));
        assert_eq!(cost.unpriced_inputs, 1);
    }

    #[test]
    fn test_item_percentage_bounds() {
        let item = |pct: i64| ManufacturingItemInput {
            material_name_id: Uuid::nil(),
            unit_id: None,
            quantity: Decimal::ONE,
            weight: None,
            percentage: Some(Decimal::from(pct)),
        };
        assert!(validate_item(&item(50)).is_ok());
        assert!(validate_item(&item(101)).is_err());
        assert!(validate_item(&item(-1)).is_err());
    }
}
