//! Sequential document numbers

use shared::pricing::next_invoice_number;
use sqlx::{Postgres, Transaction};

use crate::error::AppResult;

/// Tables that carry an `invoice_number` column
#[derive(Debug, Clone, Copy)]
pub enum NumberedTable {
    Invoices,
    ManufacturingInvoices,
    MedicineInvoices,
}

impl NumberedTable {
    fn table(&self) -> &'static str {
        match self {
            NumberedTable::Invoices => "invoices",
            NumberedTable::ManufacturingInvoices => "manufacturing_invoices",
            NumberedTable::MedicineInvoices => "medicine_invoices",
        }
    }
}

/// Reserve the next number for `prefix`. Holds a transaction-scoped advisory
/// lock so concurrent creators never see the same last number.
pub async fn allocate(
    tx: &mut Transaction<'_, Postgres>,
    table: NumberedTable,
    prefix: &str,
) -> AppResult<String> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(prefix)
        .execute(&mut **tx)
        .await?;

    // Ordered by sequence: numbers past 999999 are wider than the padding
    let last = sqlx::query_scalar::<_, String>(&format!(
        r#"
        SELECT invoice_number FROM {}
        WHERE invoice_number ~ $1
        ORDER BY substring(invoice_number FROM $2)::bigint DESC
        LIMIT 1
        "#,
        table.table()
    ))
    .bind(format!("^{}-[0-9]+$", prefix))
    .bind(prefix.len() as i32 + 2)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(next_invoice_number(prefix, last.as_deref()))
}
