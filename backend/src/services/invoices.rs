//! Buy and sell invoices
//!
//! Each item line moves stock in (buy) or out (sell) of the invoice's warehouse.
//! Stored totals are recomputed inside the same transaction after every item or
//! expense change.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::ledger::{invoice_item_effect, quantity_change_effect};
use shared::pricing::{compute_totals, line_value, InvoiceTotals};
use shared::{
    validate_amount, validate_quantity, BalanceEffect, BalancePolicy, DateRange, InvoiceLine,
    InvoiceType, PaginatedResponse, Pagination,
};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::ledger::{LedgerService, MovementContext};
use super::numbering::{self, NumberedTable};
use crate::error::{AppError, AppResult};

/// Invoice service
#[derive(Clone)]
pub struct InvoiceService {
    db: PgPool,
    ledger: LedgerService,
}

/// Invoice header
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub invoice_type: String,
    pub invoice_date: NaiveDate,
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub client_id: Option<Uuid>,
    pub client_name: Option<String>,
    pub total_items: Decimal,
    pub total_expenses: Decimal,
    pub net_total: Decimal,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Invoice line
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InvoiceItem {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub material_name_id: Uuid,
    pub material_name: String,
    pub unit_id: Option<Uuid>,
    pub unit_name: Option<String>,
    pub quantity: Decimal,
    pub weight: Decimal,
    pub price: Decimal,
    pub value: Decimal,
}

/// Invoice expense (transport, loading, commission...)
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InvoiceExpense {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub expense_type_id: Uuid,
    pub expense_type_name: String,
    pub amount: Decimal,
    pub notes: Option<String>,
}

/// Invoice with its lines and expenses
#[derive(Debug, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
    pub expenses: Vec<InvoiceExpense>,
}

/// Input for one invoice line
#[derive(Debug, Deserialize)]
pub struct InvoiceItemInput {
    pub material_name_id: Uuid,
    pub unit_id: Option<Uuid>,
    pub quantity: Decimal,
    pub weight: Option<Decimal>,
    pub price: Decimal,
}

/// Input for editing an invoice line
#[derive(Debug, Deserialize)]
pub struct UpdateInvoiceItemInput {
    pub unit_id: Option<Uuid>,
    pub quantity: Option<Decimal>,
    pub weight: Option<Decimal>,
    pub price: Option<Decimal>,
}

/// Input for one expense
#[derive(Debug, Deserialize)]
pub struct InvoiceExpenseInput {
    pub expense_type_id: Uuid,
    pub amount: Decimal,
    pub notes: Option<String>,
}

/// Input for creating an invoice
#[derive(Debug, Deserialize)]
pub struct CreateInvoiceInput {
    pub invoice_type: InvoiceType,
    pub invoice_date: NaiveDate,
    pub warehouse_id: Uuid,
    pub client_id: Option<Uuid>,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<InvoiceItemInput>,
    #[serde(default)]
    pub expenses: Vec<InvoiceExpenseInput>,
}

/// Input for updating an invoice header
#[derive(Debug, Deserialize)]
pub struct UpdateInvoiceInput {
    pub invoice_date: Option<NaiveDate>,
    pub client_id: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InvoiceQuery {
    pub invoice_type: Option<InvoiceType>,
    pub warehouse_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Locked header fields needed for item changes
#[derive(Debug, sqlx::FromRow)]
struct InvoiceLock {
    invoice_type: String,
    warehouse_id: Uuid,
}

impl InvoiceLock {
    fn invoice_type(&self) -> AppResult<InvoiceType> {
        Ok(self.invoice_type.parse()?)
    }
}

const INVOICE_SELECT: &str = r#"
    SELECT i.id, i.invoice_number, i.invoice_type, i.invoice_date,
           i.warehouse_id, w.name AS warehouse_name,
           i.client_id, c.name AS client_name,
           i.total_items, i.total_expenses, i.net_total, i.notes,
           i.created_by, i.created_at, i.updated_at
    FROM invoices i
    JOIN warehouses w ON w.id = i.warehouse_id
    LEFT JOIN clients c ON c.id = i.client_id
"#;

const ITEM_SELECT: &str = r#"
    SELECT ii.id, ii.invoice_id, ii.material_name_id, mn.name AS material_name,
           ii.unit_id, u.name AS unit_name, ii.quantity, ii.weight, ii.price, ii.value
    FROM invoice_items ii
    JOIN material_names mn ON mn.id = ii.material_name_id
    LEFT JOIN units u ON u.id = ii.unit_id
"#;

fn validate_item(item: &InvoiceItemInput) -> AppResult<()> {
    validate_quantity(item.quantity).map_err(|msg| AppError::validation("quantity", msg))?;
    validate_amount(item.price).map_err(|msg| AppError::validation("price", msg))?;
    if let Some(weight) = item.weight {
        validate_amount(weight).map_err(|msg| AppError::validation("weight", msg))?;
    }
    Ok(())
}

fn validate_expense(expense: &InvoiceExpenseInput) -> AppResult<()> {
    validate_amount(expense.amount).map_err(|msg| AppError::validation("amount", msg))
}

impl InvoiceService {
    pub fn new(db: PgPool, policy: BalancePolicy) -> Self {
        Self {
            ledger: LedgerService::new(db.clone(), policy),
            db,
        }
    }

    /// List invoices with optional filters
    pub async fn list_invoices(&self, query: InvoiceQuery) -> AppResult<PaginatedResponse<Invoice>> {
        let pagination = Pagination::from_query(query.page, query.per_page);
        let range = DateRange::from_bounds(query.from, query.to);
        if !range.is_valid() {
            return Err(AppError::validation("from", "Start date is after end date"));
        }
        let invoice_type = query.invoice_type.map(|t| t.as_str());

        const FILTER: &str = r#"
            WHERE ($1::text IS NULL OR i.invoice_type = $1)
              AND ($2::uuid IS NULL OR i.warehouse_id = $2)
              AND ($3::uuid IS NULL OR i.client_id = $3)
              AND i.invoice_date BETWEEN $4 AND $5
        "#;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM invoices i {}",
            FILTER
        ))
        .bind(invoice_type)
        .bind(query.warehouse_id)
        .bind(query.client_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.db)
        .await?;

        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            "{} {} ORDER BY i.invoice_date DESC, i.invoice_number DESC LIMIT $6 OFFSET $7",
            INVOICE_SELECT, FILTER
        ))
        .bind(invoice_type)
        .bind(query.warehouse_id)
        .bind(query.client_id)
        .bind(range.start)
        .bind(range.end)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: invoices,
            pagination: pagination.meta(total.max(0) as u64),
        })
    }

    /// Get an invoice with its items and expenses
    pub async fn get_invoice(&self, invoice_id: Uuid) -> AppResult<InvoiceDetail> {
        let invoice = sqlx::query_as::<_, Invoice>(&format!("{} WHERE i.id = $1", INVOICE_SELECT))
            .bind(invoice_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Invoice".to_string()))?;

        let items = sqlx::query_as::<_, InvoiceItem>(&format!(
            "{} WHERE ii.invoice_id = $1 ORDER BY ii.created_at, ii.id",
            ITEM_SELECT
        ))
        .bind(invoice_id)
        .fetch_all(&self.db)
        .await?;

        let expenses = sqlx::query_as::<_, InvoiceExpense>(
            r#"
            SELECT ie.id, ie.invoice_id, ie.expense_type_id, et.name AS expense_type_name,
                   ie.amount, ie.notes
            FROM invoice_expenses ie
            JOIN expense_types et ON et.id = ie.expense_type_id
            WHERE ie.invoice_id = $1
            ORDER BY ie.created_at, ie.id
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.db)
        .await?;

        Ok(InvoiceDetail {
            invoice,
            items,
            expenses,
        })
    }

    /// Create an invoice with its lines and expenses in one transaction
    pub async fn create_invoice(
        &self,
        user_id: Uuid,
        input: CreateInvoiceInput,
    ) -> AppResult<InvoiceDetail> {
        for item in &input.items {
            validate_item(item)?;
        }
        for expense in &input.expenses {
            validate_expense(expense)?;
        }

        let mut tx = self.db.begin().await?;

        let invoice_number = numbering::allocate(
            &mut tx,
            NumberedTable::Invoices,
            input.invoice_type.number_prefix(),
        )
        .await?;

        let invoice_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO invoices (invoice_number, invoice_type, invoice_date, warehouse_id,
                                  client_id, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&invoice_number)
        .bind(input.invoice_type.as_str())
        .bind(input.invoice_date)
        .bind(input.warehouse_id)
        .bind(input.client_id)
        .bind(&input.notes)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut effects = Vec::with_capacity(input.items.len());
        for item in &input.items {
            Self::insert_item(&mut tx, invoice_id, item).await?;
            effects.push(invoice_item_effect(
                input.invoice_type,
                input.warehouse_id,
                item.material_name_id,
                item.quantity,
            ));
        }
        for expense in &input.expenses {
            Self::insert_expense(&mut tx, invoice_id, expense).await?;
        }

        let ctx = MovementContext::new(input.invoice_type.movement_source(), invoice_id, user_id);
        self.ledger.apply_effects(&mut tx, &effects, ctx).await?;
        let totals = Self::recompute_totals(&mut tx, invoice_id, input.invoice_type).await?;

        tx.commit().await?;

        tracing::info!(
            %invoice_id,
            invoice_number = %invoice_number,
            invoice_type = input.invoice_type.as_str(),
            net_total = %totals.net_total,
            "Invoice created"
        );

        self.get_invoice(invoice_id).await
    }

    /// Update date, client or notes
    pub async fn update_invoice(
        &self,
        invoice_id: Uuid,
        input: UpdateInvoiceInput,
    ) -> AppResult<InvoiceDetail> {
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET invoice_date = COALESCE($1, invoice_date),
                client_id = COALESCE($2, client_id),
                notes = COALESCE($3, notes),
                updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(input.invoice_date)
        .bind(input.client_id)
        .bind(&input.notes)
        .bind(invoice_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Invoice".to_string()));
        }

        self.get_invoice(invoice_id).await
    }

    /// Delete an invoice and reverse the stock effect of every line
    pub async fn delete_invoice(&self, user_id: Uuid, invoice_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        let lock = Self::lock_invoice(&mut tx, invoice_id).await?;
        let invoice_type = lock.invoice_type()?;

        let lines = sqlx::query_as::<_, (Uuid, Decimal)>(
            "SELECT material_name_id, quantity FROM invoice_items WHERE invoice_id = $1",
        )
        .bind(invoice_id)
        .fetch_all(&mut *tx)
        .await?;

        let reversals: Vec<BalanceEffect> = lines
            .into_iter()
            .map(|(material_name_id, quantity)| {
                invoice_item_effect(invoice_type, lock.warehouse_id, material_name_id, quantity)
                    .reversed()
            })
            .collect();

        let ctx = MovementContext::new(invoice_type.movement_source(), invoice_id, user_id).reversal();
        self.ledger.apply_effects(&mut tx, &reversals, ctx).await?;

        sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(invoice_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(%invoice_id, lines = reversals.len(), "Invoice deleted");
        Ok(())
    }

    /// Add a line to an invoice
    pub async fn add_item(
        &self,
        user_id: Uuid,
        invoice_id: Uuid,
        input: InvoiceItemInput,
    ) -> AppResult<InvoiceDetail> {
        validate_item(&input)?;

        let mut tx = self.db.begin().await?;
        let lock = Self::lock_invoice(&mut tx, invoice_id).await?;
        let invoice_type = lock.invoice_type()?;

        Self::insert_item(&mut tx, invoice_id, &input).await?;

        let effect = invoice_item_effect(
            invoice_type,
            lock.warehouse_id,
            input.material_name_id,
            input.quantity,
        );
        let ctx = MovementContext::new(invoice_type.movement_source(), invoice_id, user_id);
        self.ledger.apply_effects(&mut tx, &[effect], ctx).await?;
        Self::recompute_totals(&mut tx, invoice_id, invoice_type).await?;

        tx.commit().await?;

        self.get_invoice(invoice_id).await
    }

    /// Edit a line. A quantity change moves only the difference.
    pub async fn update_item(
        &self,
        user_id: Uuid,
        invoice_id: Uuid,
        item_id: Uuid,
        input: UpdateInvoiceItemInput,
    ) -> AppResult<InvoiceDetail> {
        let mut tx = self.db.begin().await?;
        let lock = Self::lock_invoice(&mut tx, invoice_id).await?;
        let invoice_type = lock.invoice_type()?;

        let (material_name_id, unit_id, quantity, weight, price) =
            sqlx::query_as::<_, (Uuid, Option<Uuid>, Decimal, Decimal, Decimal)>(
                r#"
                SELECT material_name_id, unit_id, quantity, weight, price
                FROM invoice_items
                WHERE id = $1 AND invoice_id = $2
                FOR UPDATE
                "#,
            )
            .bind(item_id)
            .bind(invoice_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Invoice item".to_string()))?;

        let updated = InvoiceItemInput {
            material_name_id,
            unit_id: input.unit_id.or(unit_id),
            quantity: input.quantity.unwrap_or(quantity),
            weight: Some(input.weight.unwrap_or(weight)),
            price: input.price.unwrap_or(price),
        };
        validate_item(&updated)?;
        let new_weight = updated.weight.unwrap_or(Decimal::ZERO);

        let original = invoice_item_effect(invoice_type, lock.warehouse_id, material_name_id, quantity);
        if let Some(delta) = quantity_change_effect(&original, updated.quantity) {
            let ctx = MovementContext::new(invoice_type.movement_source(), invoice_id, user_id);
            self.ledger.apply_effects(&mut tx, &[delta], ctx).await?;
        }

        sqlx::query(
            r#"
            UPDATE invoice_items
            SET unit_id = $1, quantity = $2, weight = $3, price = $4, value = $5
            WHERE id = $6
            "#,
        )
        .bind(updated.unit_id)
        .bind(updated.quantity)
        .bind(new_weight)
        .bind(updated.price)
        .bind(line_value(updated.quantity, new_weight, updated.price))
        .bind(item_id)
        .execute(&mut *tx)
        .await?;

        Self::recompute_totals(&mut tx, invoice_id, invoice_type).await?;
        tx.commit().await?;

        self.get_invoice(invoice_id).await
    }

    /// Remove a line and reverse its stock effect
    pub async fn delete_item(
        &self,
        user_id: Uuid,
        invoice_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<InvoiceDetail> {
        let mut tx = self.db.begin().await?;
        let lock = Self::lock_invoice(&mut tx, invoice_id).await?;
        let invoice_type = lock.invoice_type()?;

        let (material_name_id, quantity) = sqlx::query_as::<_, (Uuid, Decimal)>(
            "DELETE FROM invoice_items WHERE id = $1 AND invoice_id = $2 RETURNING material_name_id, quantity",
        )
        .bind(item_id)
        .bind(invoice_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Invoice item".to_string()))?;

        let reversal =
            invoice_item_effect(invoice_type, lock.warehouse_id, material_name_id, quantity).reversed();
        let ctx = MovementContext::new(invoice_type.movement_source(), invoice_id, user_id).reversal();
        self.ledger.apply_effects(&mut tx, &[reversal], ctx).await?;

        Self::recompute_totals(&mut tx, invoice_id, invoice_type).await?;
        tx.commit().await?;

        self.get_invoice(invoice_id).await
    }

    /// Add an expense
    pub async fn add_expense(
        &self,
        invoice_id: Uuid,
        input: InvoiceExpenseInput,
    ) -> AppResult<InvoiceDetail> {
        validate_expense(&input)?;

        let mut tx = self.db.begin().await?;
        let lock = Self::lock_invoice(&mut tx, invoice_id).await?;

        Self::insert_expense(&mut tx, invoice_id, &input).await?;
        Self::recompute_totals(&mut tx, invoice_id, lock.invoice_type()?).await?;
        tx.commit().await?;

        self.get_invoice(invoice_id).await
    }

    /// Remove an expense
    pub async fn delete_expense(&self, invoice_id: Uuid, expense_id: Uuid) -> AppResult<InvoiceDetail> {
        let mut tx = self.db.begin().await?;
        let lock = Self::lock_invoice(&mut tx, invoice_id).await?;

        let result = sqlx::query("DELETE FROM invoice_expenses WHERE id = $1 AND invoice_id = $2")
            .bind(expense_id)
            .bind(invoice_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Invoice expense".to_string()));
        }

        Self::recompute_totals(&mut tx, invoice_id, lock.invoice_type()?).await?;
        tx.commit().await?;

        self.get_invoice(invoice_id).await
    }

    async fn lock_invoice(
        tx: &mut Transaction<'_, Postgres>,
        invoice_id: Uuid,
    ) -> AppResult<InvoiceLock> {
        sqlx::query_as::<_, InvoiceLock>(
            "SELECT invoice_type, warehouse_id FROM invoices WHERE id = $1 FOR UPDATE",
        )
        .bind(invoice_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Invoice".to_string()))
    }

    async fn insert_item(
        tx: &mut Transaction<'_, Postgres>,
        invoice_id: Uuid,
        item: &InvoiceItemInput,
    ) -> AppResult<Uuid> {
        let weight = item.weight.unwrap_or(Decimal::ZERO);
        let item_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO invoice_items (invoice_id, material_name_id, unit_id, quantity, weight, price, value)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(invoice_id)
        .bind(item.material_name_id)
        .bind(item.unit_id)
        .bind(item.quantity)
        .bind(weight)
        .bind(item.price)
        .bind(line_value(item.quantity, weight, item.price))
        .fetch_one(&mut **tx)
        .await?;

        Ok(item_id)
    }

    async fn insert_expense(
        tx: &mut Transaction<'_, Postgres>,
        invoice_id: Uuid,
        expense: &InvoiceExpenseInput,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO invoice_expenses (invoice_id, expense_type_id, amount, notes)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(invoice_id)
        .bind(expense.expense_type_id)
        .bind(expense.amount)
        .bind(&expense.notes)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Recompute and store totals from the current lines and expenses
    async fn recompute_totals(
        tx: &mut Transaction<'_, Postgres>,
        invoice_id: Uuid,
        invoice_type: InvoiceType,
    ) -> AppResult<InvoiceTotals> {
        let lines: Vec<InvoiceLine> = sqlx::query_as::<_, (Decimal, Decimal, Decimal)>(
            "SELECT quantity, weight, price FROM invoice_items WHERE invoice_id = $1",
        )
        .bind(invoice_id)
        .fetch_all(&mut **tx)
        .await?
        .into_iter()
        .map(|(quantity, weight, price)| InvoiceLine {
            quantity,
            weight,
            price,
        })
        .collect();

        let expenses = sqlx::query_scalar::<_, Decimal>(
            "SELECT amount FROM invoice_expenses WHERE invoice_id = $1",
        )
        .bind(invoice_id)
        .fetch_all(&mut **tx)
        .await?;

        let totals = compute_totals(invoice_type, &lines, &expenses);

        sqlx::query(
            r#"
            UPDATE invoices
            SET total_items = $1, total_expenses = $2, net_total = $3, updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(totals.total_items)
        .bind(totals.total_expenses)
        .bind(totals.net_total)
        .bind(invoice_id)
        .execute(&mut **tx)
        .await?;

        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn item(quantity: &str, price: &str) -> InvoiceItemInput {
        InvoiceItemInput {
            material_name_id: Uuid::nil(),
            unit_id: None,
            quantity: Decimal::from_str(quantity).unwrap(),
            weight: None,
            price: Decimal::from_str(price).unwrap(),
        }
    }

    #[test]
    fn test_validate_item() {
        assert!(validate_item(&item("10", "2.5")).is_ok());
        assert!(validate_item(&item("0", "2.5")).is_err());
        assert!(validate_item(&item("1", "-1")).is_err());

        let mut weighed = item("1", "3");
        weighed.weight = Some(Decimal::from_str("-0.5").unwrap());
        assert!(validate_item(&weighed).is_err());
    }

    #[test]
    fn test_create_input_defaults_to_empty_lines() {
        let input: CreateInvoiceInput = serde_json::from_value(serde_json::json!({
            "invoice_type": "sell",
            "invoice_date": "2024-03-01",
            "warehouse_id": Uuid::nil(),
        }))
        .unwrap();
        assert_eq!(input.invoice_type, InvoiceType::Sell);
        assert!(input.items.is_empty());
        assert!(input.expenses.is_empty());
    }
}
