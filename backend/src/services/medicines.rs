//! Medicine catalog, medicine issue invoices, medication records and schedules

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::ledger::medicine_issue_effect;
use shared::schedule::{build_schedule, flock_age_days};
use shared::{
    validate_day_range, validate_name, validate_quantity, BalanceEffect, BalancePolicy,
    MedicationEvent, MedicineWindow, MovementSource, ScheduleEntry,
};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::farms::FarmService;
use super::ledger::{LedgerService, MovementContext};
use super::numbering::{self, NumberedTable};
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;

const NUMBER_PREFIX: &str = "MED";

/// Medicine service
#[derive(Clone)]
pub struct MedicineService {
    db: PgPool,
    ledger: LedgerService,
    farms: FarmService,
}

/// A medicine or vaccine with its flock-age window
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Medicine {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub material_name_id: Option<Uuid>,
    pub material_name: Option<String>,
    pub day_from: i32,
    pub day_to: i32,
    pub dosage: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMedicineInput {
    pub name: String,
    pub description: Option<String>,
    pub material_name_id: Option<Uuid>,
    pub day_from: i32,
    pub day_to: i32,
    pub dosage: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMedicineInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub material_name_id: Option<Uuid>,
    /// Unlink the medicine from its stock material
    #[serde(default)]
    pub clear_material: bool,
    pub day_from: Option<i32>,
    pub day_to: Option<i32>,
    pub dosage: Option<String>,
}

/// Issue of medicines from a warehouse to a farm
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MedicineInvoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub farm_id: Uuid,
    pub farm_name: String,
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MedicineInvoiceItem {
    pub id: Uuid,
    pub medicine_invoice_id: Uuid,
    pub medicine_id: Uuid,
    pub medicine_name: String,
    /// Material the item took out of stock, if any
    pub material_name_id: Option<Uuid>,
    pub unit_id: Option<Uuid>,
    pub quantity: Decimal,
}

#[derive(Debug, Serialize)]
pub struct MedicineInvoiceDetail {
    #[serde(flatten)]
    pub invoice: MedicineInvoice,
    pub items: Vec<MedicineInvoiceItem>,
}

#[derive(Debug, Deserialize)]
pub struct MedicineItemInput {
    pub medicine_id: Uuid,
    pub unit_id: Option<Uuid>,
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CreateMedicineInvoiceInput {
    pub invoice_date: NaiveDate,
    pub farm_id: Uuid,
    pub warehouse_id: Uuid,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<MedicineItemInput>,
}

#[derive(Debug, Deserialize)]
pub struct FarmFilter {
    pub farm_id: Option<Uuid>,
}

/// Administration of a medicine on a farm
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MedicationRecord {
    pub id: Uuid,
    pub farm_id: Uuid,
    pub medicine_id: Uuid,
    pub medicine_name: String,
    pub administered_on: NaiveDate,
    pub dose: Option<String>,
    pub notes: Option<String>,
    pub recorded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RecordMedicationInput {
    pub farm_id: Uuid,
    pub medicine_id: Uuid,
    pub administered_on: NaiveDate,
    pub dose: Option<String>,
    pub notes: Option<String>,
}

/// A farm's medication schedule for its current flock
#[derive(Debug, Serialize)]
pub struct FarmSchedule {
    pub farm_id: Uuid,
    pub flock_start_date: NaiveDate,
    pub flock_age_days: Option<i64>,
    pub entries: Vec<ScheduleEntry>,
}

const MEDICINE_SELECT: &str = r#"
    SELECT md.id, md.name, md.description, md.material_name_id, mn.name AS material_name,
           md.day_from, md.day_to, md.dosage, md.created_at
    FROM medicines md
    LEFT JOIN material_names mn ON mn.id = md.material_name_id
"#;

const ISSUE_SELECT: &str = r#"
    SELECT mi.id, mi.invoice_number, mi.invoice_date, mi.farm_id, f.name AS farm_name,
           mi.warehouse_id, w.name AS warehouse_name, mi.notes, mi.created_by, mi.created_at
    FROM medicine_invoices mi
    JOIN farms f ON f.id = mi.farm_id
    JOIN warehouses w ON w.id = mi.warehouse_id
"#;

const RECORD_SELECT: &str = r#"
    SELECT r.id, r.farm_id, r.medicine_id, md.name AS medicine_name, r.administered_on,
           r.dose, r.notes, r.recorded_by, r.created_at
    FROM medication_records r
    JOIN medicines md ON md.id = r.medicine_id
"#;

impl MedicineService {
    pub fn new(db: PgPool, policy: BalancePolicy) -> Self {
        Self {
            ledger: LedgerService::new(db.clone(), policy),
            farms: FarmService::new(db.clone()),
            db,
        }
    }

    // ========================================================================
    // Medicine catalog
    // ========================================================================

    pub async fn list_medicines(&self) -> AppResult<Vec<Medicine>> {
        let medicines = sqlx::query_as::<_, Medicine>(&format!(
            "{} ORDER BY md.day_from, md.name",
            MEDICINE_SELECT
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(medicines)
    }

    pub async fn get_medicine(&self, medicine_id: Uuid) -> AppResult<Medicine> {
        sqlx::query_as::<_, Medicine>(&format!("{} WHERE md.id = $1", MEDICINE_SELECT))
            .bind(medicine_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Medicine".to_string()))
    }

    pub async fn create_medicine(&self, input: CreateMedicineInput) -> AppResult<Medicine> {
        validate_name(&input.name).map_err(|msg| AppError::validation("name", msg))?;
        validate_day_range(input.day_from, input.day_to)
            .map_err(|msg| AppError::validation("day_from", msg))?;

        let medicine_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO medicines (name, description, material_name_id, day_from, day_to, dosage)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.material_name_id)
        .bind(input.day_from)
        .bind(input.day_to)
        .bind(&input.dosage)
        .fetch_one(&self.db)
        .await?;

        self.get_medicine(medicine_id).await
    }

    pub async fn update_medicine(
        &self,
        medicine_id: Uuid,
        input: UpdateMedicineInput,
    ) -> AppResult<Medicine> {
        let existing = self.get_medicine(medicine_id).await?;

        let name = input.name.unwrap_or(existing.name);
        validate_name(&name).map_err(|msg| AppError::validation("name", msg))?;
        let day_from = input.day_from.unwrap_or(existing.day_from);
        let day_to = input.day_to.unwrap_or(existing.day_to);
        validate_day_range(day_from, day_to).map_err(|msg| AppError::validation("day_from", msg))?;
        let material_name_id =
            material_link(existing.material_name_id, input.material_name_id, input.clear_material)?;

        sqlx::query(
            r#"
            UPDATE medicines
            SET name = $1, description = $2, material_name_id = $3,
                day_from = $4, day_to = $5, dosage = $6, updated_at = NOW()
            WHERE id = $7
            "#,
        )
        .bind(name.trim())
        .bind(input.description.or(existing.description))
        .bind(material_name_id)
        .bind(day_from)
        .bind(day_to)
        .bind(input.dosage.or(existing.dosage))
        .bind(medicine_id)
        .execute(&self.db)
        .await?;

        self.get_medicine(medicine_id).await
    }

    pub async fn delete_medicine(&self, medicine_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM medicines WHERE id = $1")
            .bind(medicine_id)
            .execute(&self.db)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict { .. } => AppError::in_use("Medicine"),
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Medicine".to_string()));
        }
        Ok(())
    }

    // ========================================================================
    // Medicine issue invoices
    // ========================================================================

    pub async fn list_invoices(
        &self,
        user: &AuthUser,
        filter: FarmFilter,
    ) -> AppResult<Vec<MedicineInvoice>> {
        if let Some(farm_id) = filter.farm_id {
            self.farms.ensure_access(user, farm_id).await?;
        }
        let farmer_scope = (!user.is_admin()).then_some(user.user_id);

        let invoices = sqlx::query_as::<_, MedicineInvoice>(&format!(
            r#"
            {}
            WHERE ($1::uuid IS NULL OR mi.farm_id = $1)
              AND ($2::uuid IS NULL OR f.farmer_id = $2)
            ORDER BY mi.invoice_date DESC, mi.invoice_number DESC
            "#,
            ISSUE_SELECT
        ))
        .bind(filter.farm_id)
        .bind(farmer_scope)
        .fetch_all(&self.db)
        .await?;

        Ok(invoices)
    }

    pub async fn get_invoice(&self, user: &AuthUser, invoice_id: Uuid) -> AppResult<MedicineInvoiceDetail> {
        let invoice = sqlx::query_as::<_, MedicineInvoice>(&format!("{} WHERE mi.id = $1", ISSUE_SELECT))
            .bind(invoice_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Medicine invoice".to_string()))?;
        self.farms.ensure_access(user, invoice.farm_id).await?;

        let items = sqlx::query_as::<_, MedicineInvoiceItem>(
            r#"
            SELECT it.id, it.medicine_invoice_id, it.medicine_id, md.name AS medicine_name,
                   it.material_name_id, it.unit_id, it.quantity
            FROM medicine_invoice_items it
            JOIN medicines md ON md.id = it.medicine_id
            WHERE it.medicine_invoice_id = $1
            ORDER BY it.created_at, it.id
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.db)
        .await?;

        Ok(MedicineInvoiceDetail { invoice, items })
    }

    /// Issue medicines to a farm. Linked medicines leave the warehouse stock.
    pub async fn create_invoice(
        &self,
        user: &AuthUser,
        input: CreateMedicineInvoiceInput,
    ) -> AppResult<MedicineInvoiceDetail> {
        for item in &input.items {
            validate_quantity(item.quantity).map_err(|msg| AppError::validation("quantity", msg))?;
        }

        let mut tx = self.db.begin().await?;
        let invoice_number =
            numbering::allocate(&mut tx, NumberedTable::MedicineInvoices, NUMBER_PREFIX).await?;

        let invoice_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO medicine_invoices (invoice_number, invoice_date, farm_id, warehouse_id, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&invoice_number)
        .bind(input.invoice_date)
        .bind(input.farm_id)
        .bind(input.warehouse_id)
        .bind(&input.notes)
        .bind(user.user_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut effects = Vec::new();
        for item in &input.items {
            if let Some(effect) =
                Self::insert_item(&mut tx, invoice_id, input.warehouse_id, item).await?
            {
                effects.push(effect);
            }
        }

        let ctx = MovementContext::new(MovementSource::MedicineIssue, invoice_id, user.user_id);
        self.ledger.apply_effects(&mut tx, &effects, ctx).await?;

        tx.commit().await?;

        tracing::info!(%invoice_id, invoice_number = %invoice_number, farm_id = %input.farm_id, "Medicines issued");

        self.get_invoice(user, invoice_id).await
    }

    /// Delete an issue and return linked medicines to stock
    pub async fn delete_invoice(&self, user: &AuthUser, invoice_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        let warehouse_id = Self::lock_invoice(&mut tx, invoice_id).await?;

        let issued = Self::issued_materials(&mut tx, invoice_id, None).await?;
        let reversals: Vec<BalanceEffect> = issued
            .into_iter()
            .map(|(material_name_id, quantity)| {
                medicine_issue_effect(warehouse_id, material_name_id, quantity).reversed()
            })
            .collect();

        let ctx = MovementContext::new(MovementSource::MedicineIssue, invoice_id, user.user_id).reversal();
        self.ledger.apply_effects(&mut tx, &reversals, ctx).await?;

        sqlx::query("DELETE FROM medicine_invoices WHERE id = $1")
            .bind(invoice_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn add_item(
        &self,
        user: &AuthUser,
        invoice_id: Uuid,
        input: MedicineItemInput,
    ) -> AppResult<MedicineInvoiceDetail> {
        validate_quantity(input.quantity).map_err(|msg| AppError::validation("quantity", msg))?;

        let mut tx = self.db.begin().await?;
        let warehouse_id = Self::lock_invoice(&mut tx, invoice_id).await?;

        if let Some(effect) = Self::insert_item(&mut tx, invoice_id, warehouse_id, &input).await? {
            let ctx = MovementContext::new(MovementSource::MedicineIssue, invoice_id, user.user_id);
            self.ledger.apply_effects(&mut tx, &[effect], ctx).await?;
        }

        tx.commit().await?;
        self.get_invoice(user, invoice_id).await
    }

    pub async fn delete_item(
        &self,
        user: &AuthUser,
        invoice_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<MedicineInvoiceDetail> {
        let mut tx = self.db.begin().await?;
        let warehouse_id = Self::lock_invoice(&mut tx, invoice_id).await?;

        let issued = Self::issued_materials(&mut tx, invoice_id, Some(item_id)).await?;

        let result = sqlx::query(
            "DELETE FROM medicine_invoice_items WHERE id = $1 AND medicine_invoice_id = $2",
        )
        .bind(item_id)
        .bind(invoice_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Medicine invoice item".to_string()));
        }

        let reversals: Vec<BalanceEffect> = issued
            .into_iter()
            .map(|(material_name_id, quantity)| {
                medicine_issue_effect(warehouse_id, material_name_id, quantity).reversed()
            })
            .collect();
        let ctx = MovementContext::new(MovementSource::MedicineIssue, invoice_id, user.user_id).reversal();
        self.ledger.apply_effects(&mut tx, &reversals, ctx).await?;

        tx.commit().await?;
        self.get_invoice(user, invoice_id).await
    }

    async fn lock_invoice(tx: &mut Transaction<'_, Postgres>, invoice_id: Uuid) -> AppResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT warehouse_id FROM medicine_invoices WHERE id = $1 FOR UPDATE",
        )
        .bind(invoice_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Medicine invoice".to_string()))
    }

    /// Insert an item and return its stock effect when the medicine is stocked.
    /// The material issued is stored on the item so it can be returned later.
    async fn insert_item(
        tx: &mut Transaction<'_, Postgres>,
        invoice_id: Uuid,
        warehouse_id: Uuid,
        item: &MedicineItemInput,
    ) -> AppResult<Option<BalanceEffect>> {
        let material_name_id = sqlx::query_scalar::<_, Option<Uuid>>(
            "SELECT material_name_id FROM medicines WHERE id = $1",
        )
        .bind(item.medicine_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Medicine".to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO medicine_invoice_items
                (medicine_invoice_id, medicine_id, material_name_id, unit_id, quantity)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(invoice_id)
        .bind(item.medicine_id)
        .bind(material_name_id)
        .bind(item.unit_id)
        .bind(item.quantity)
        .execute(&mut **tx)
        .await?;

        Ok(issue_effect(warehouse_id, material_name_id, item.quantity))
    }

    /// Materials taken out of stock by an invoice, or by one of its items
    async fn issued_materials(
        tx: &mut Transaction<'_, Postgres>,
        invoice_id: Uuid,
        item_id: Option<Uuid>,
    ) -> AppResult<Vec<(Uuid, Decimal)>> {
        let issued = sqlx::query_as::<_, (Uuid, Decimal)>(
            r#"
            SELECT it.material_name_id, it.quantity
            FROM medicine_invoice_items it
            WHERE it.medicine_invoice_id = $1
              AND ($2::uuid IS NULL OR it.id = $2)
              AND it.material_name_id IS NOT NULL
            "#,
        )
        .bind(invoice_id)
        .bind(item_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(issued)
    }

    // ========================================================================
    // Medication records and schedules
    // ========================================================================

    pub async fn record_medication(
        &self,
        user: &AuthUser,
        input: RecordMedicationInput,
    ) -> AppResult<MedicationRecord> {
        self.farms.ensure_access(user, input.farm_id).await?;

        let record_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO medication_records (farm_id, medicine_id, administered_on, dose, notes, recorded_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(input.farm_id)
        .bind(input.medicine_id)
        .bind(input.administered_on)
        .bind(&input.dose)
        .bind(&input.notes)
        .bind(user.user_id)
        .fetch_one(&self.db)
        .await?;

        sqlx::query_as::<_, MedicationRecord>(&format!("{} WHERE r.id = $1", RECORD_SELECT))
            .bind(record_id)
            .fetch_one(&self.db)
            .await
            .map_err(Into::into)
    }

    pub async fn list_records(
        &self,
        user: &AuthUser,
        filter: FarmFilter,
    ) -> AppResult<Vec<MedicationRecord>> {
        if let Some(farm_id) = filter.farm_id {
            self.farms.ensure_access(user, farm_id).await?;
        }
        let farmer_scope = (!user.is_admin()).then_some(user.user_id);

        let records = sqlx::query_as::<_, MedicationRecord>(&format!(
            r#"
            {}
            JOIN farms f ON f.id = r.farm_id
            WHERE ($1::uuid IS NULL OR r.farm_id = $1)
              AND ($2::uuid IS NULL OR f.farmer_id = $2)
            ORDER BY r.administered_on DESC
            "#,
            RECORD_SELECT
        ))
        .bind(filter.farm_id)
        .bind(farmer_scope)
        .fetch_all(&self.db)
        .await?;

        Ok(records)
    }

    pub async fn delete_record(&self, user: &AuthUser, record_id: Uuid) -> AppResult<()> {
        let farm_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT farm_id FROM medication_records WHERE id = $1",
        )
        .bind(record_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Medication record".to_string()))?;
        self.farms.ensure_access(user, farm_id).await?;

        sqlx::query("DELETE FROM medication_records WHERE id = $1")
            .bind(record_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// Medication schedule of a farm's current flock
    pub async fn schedule(
        &self,
        user: &AuthUser,
        farm_id: Uuid,
        today: NaiveDate,
        due_window_days: i64,
    ) -> AppResult<FarmSchedule> {
        self.farms.ensure_access(user, farm_id).await?;
        let farm = self.farms.fetch_farm(farm_id).await?;

        let flock_start = farm.flock_start_date.ok_or_else(|| {
            AppError::validation("flock_start_date", "Farm has no active flock")
        })?;

        let entries = self
            .farm_schedule(farm_id, flock_start, today, due_window_days)
            .await?;

        Ok(FarmSchedule {
            farm_id,
            flock_start_date: flock_start,
            flock_age_days: flock_age_days(flock_start, today),
            entries,
        })
    }

    /// Schedule entries for a flock placed on `flock_start`
    pub(crate) async fn farm_schedule(
        &self,
        farm_id: Uuid,
        flock_start: NaiveDate,
        today: NaiveDate,
        due_window_days: i64,
    ) -> AppResult<Vec<ScheduleEntry>> {
        let medicines: Vec<MedicineWindow> = self
            .list_medicines()
            .await?
            .into_iter()
            .map(|m| MedicineWindow {
                medicine_id: m.id,
                name: m.name,
                day_from: m.day_from,
                day_to: m.day_to,
                dosage: m.dosage,
            })
            .collect();

        let events: Vec<MedicationEvent> = sqlx::query_as::<_, (Uuid, NaiveDate)>(
            r#"
            SELECT medicine_id, administered_on FROM medication_records
            WHERE farm_id = $1 AND administered_on >= $2
            "#,
        )
        .bind(farm_id)
        .bind(flock_start)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(|(medicine_id, administered_on)| MedicationEvent {
            medicine_id,
            administered_on,
        })
        .collect();

        Ok(build_schedule(
            flock_start,
            today,
            &medicines,
            &events,
            due_window_days,
        ))
    }
}

/// Stock effect of issuing `quantity` of a medicine stocked as `material_name_id`
fn issue_effect(
    warehouse_id: Uuid,
    material_name_id: Option<Uuid>,
    quantity: Decimal,
) -> Option<BalanceEffect> {
    material_name_id.map(|material| medicine_issue_effect(warehouse_id, material, quantity))
}

/// Resolve the stock link of an updated medicine
fn material_link(
    existing: Option<Uuid>,
    requested: Option<Uuid>,
    clear: bool,
) -> AppResult<Option<Uuid>> {
    match (requested, clear) {
        (Some(_), true) => Err(AppError::validation(
            "clear_material",
            "Cannot set and clear the material link at once",
        )),
        (_, true) => Ok(None),
        (requested, false) => Ok(requested.or(existing)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Direction;

    #[test]
    fn test_unstocked_issue_moves_nothing() {
        assert!(issue_effect(Uuid::new_v4(), None, Decimal::TEN).is_none());
    }

    #[test]
    fn test_issue_reversal_uses_the_stored_material() {
        let warehouse = Uuid::new_v4();
        let issued_from = Uuid::new_v4();

        let issued = issue_effect(warehouse, Some(issued_from), Decimal::TEN).unwrap();
        assert_eq!(issued.direction, Direction::Out);

        let returned = issued.reversed();
        assert_eq!(returned.direction, Direction::In);
        assert_eq!(returned.material_name_id, issued_from);
        assert_eq!(returned.quantity, Decimal::TEN);
    }

    #[test]
    fn test_material_link_keeps_sets_and_clears() {
        let current = Some(Uuid::new_v4());
        let other = Uuid::new_v4();

        assert_eq!(material_link(current, None, false).unwrap(), current);
        assert_eq!(material_link(current, Some(other), false).unwrap(), Some(other));
        assert_eq!(material_link(current, None, true).unwrap(), None);
        assert!(matches!(
            material_link(current, Some(other), true),
            Err(AppError::Validation { .. })
        ));
    }
}
