//! Medicine catalog, medicine issue and medication record handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::medicines::{
    CreateMedicineInput, CreateMedicineInvoiceInput, FarmFilter, MedicationRecord, Medicine,
    MedicineInvoice, MedicineInvoiceDetail, MedicineItemInput, RecordMedicationInput,
    UpdateMedicineInput,
};
use crate::services::MedicineService;
use crate::AppState;

fn medicine_service(state: &AppState) -> MedicineService {
    MedicineService::new(state.db.clone(), state.config.ledger.policy())
}

pub async fn list_medicines(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> AppResult<Json<Vec<Medicine>>> {
    let medicines = medicine_service(&state).list_medicines().await?;
    Ok(Json(medicines))
}

pub async fn get_medicine(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(medicine_id): Path<Uuid>,
) -> AppResult<Json<Medicine>> {
    let medicine = medicine_service(&state).get_medicine(medicine_id).await?;
    Ok(Json(medicine))
}

pub async fn create_medicine(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateMedicineInput>,
) -> AppResult<(StatusCode, Json<Medicine>)> {
    user.require_admin()?;
    let medicine = medicine_service(&state).create_medicine(input).await?;
    Ok((StatusCode::CREATED, Json(medicine)))
}

pub async fn update_medicine(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(medicine_id): Path<Uuid>,
    Json(input): Json<UpdateMedicineInput>,
) -> AppResult<Json<Medicine>> {
    user.require_admin()?;
    let medicine = medicine_service(&state)
        .update_medicine(medicine_id, input)
        .await?;
    Ok(Json(medicine))
}

pub async fn delete_medicine(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(medicine_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    user.require_admin()?;
    medicine_service(&state).delete_medicine(medicine_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Medicine issues visible to the current user
pub async fn list_medicine_invoices(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<FarmFilter>,
) -> AppResult<Json<Vec<MedicineInvoice>>> {
    let invoices = medicine_service(&state).list_invoices(&user, filter).await?;
    Ok(Json(invoices))
}

pub async fn get_medicine_invoice(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<Json<MedicineInvoiceDetail>> {
    let invoice = medicine_service(&state).get_invoice(&user, invoice_id).await?;
    Ok(Json(invoice))
}

pub async fn create_medicine_invoice(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateMedicineInvoiceInput>,
) -> AppResult<(StatusCode, Json<MedicineInvoiceDetail>)> {
    user.require_admin()?;
    let invoice = medicine_service(&state).create_invoice(&user, input).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

pub async fn delete_medicine_invoice(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    user.require_admin()?;
    medicine_service(&state)
        .delete_invoice(&user, invoice_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_medicine_invoice_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(invoice_id): Path<Uuid>,
    Json(input): Json<MedicineItemInput>,
) -> AppResult<(StatusCode, Json<MedicineInvoiceDetail>)> {
    user.require_admin()?;
    let invoice = medicine_service(&state)
        .add_item(&user, invoice_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

pub async fn delete_medicine_invoice_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((invoice_id, item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<MedicineInvoiceDetail>> {
    user.require_admin()?;
    let invoice = medicine_service(&state)
        .delete_item(&user, invoice_id, item_id)
        .await?;
    Ok(Json(invoice))
}

/// Record that a medicine was given on a farm
pub async fn record_medication(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<RecordMedicationInput>,
) -> AppResult<(StatusCode, Json<MedicationRecord>)> {
    let record = medicine_service(&state)
        .record_medication(&user, input)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_medication_records(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<FarmFilter>,
) -> AppResult<Json<Vec<MedicationRecord>>> {
    let records = medicine_service(&state).list_records(&user, filter).await?;
    Ok(Json(records))
}

pub async fn delete_medication_record(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(record_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    medicine_service(&state)
        .delete_record(&user, record_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
