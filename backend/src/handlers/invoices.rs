//! HTTP handlers for buy/sell and manufacturing invoices (administrators only)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::PaginatedResponse;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::invoices::{
    CreateInvoiceInput, Invoice, InvoiceDetail, InvoiceExpenseInput, InvoiceItemInput,
    InvoiceQuery, UpdateInvoiceInput, UpdateInvoiceItemInput,
};
use crate::services::manufacturing::{
    CreateManufacturingInput, ManufacturingDetail, ManufacturingExpenseInput,
    ManufacturingInvoice, ManufacturingItemInput, ManufacturingQuery, OutputQuantityInput,
    UpdateManufacturingInput, UpdateManufacturingItemInput,
};
use crate::services::{InvoiceService, ManufacturingService};
use crate::AppState;

fn invoice_service(state: &AppState) -> InvoiceService {
    InvoiceService::new(state.db.clone(), state.config.ledger.policy())
}

fn manufacturing_service(state: &AppState) -> ManufacturingService {
    ManufacturingService::new(state.db.clone(), state.config.ledger.policy())
}

pub async fn list_invoices(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<InvoiceQuery>,
) -> AppResult<Json<PaginatedResponse<Invoice>>> {
    user.require_admin()?;
    let invoices = invoice_service(&state).list_invoices(query).await?;
    Ok(Json(invoices))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<Json<InvoiceDetail>> {
    user.require_admin()?;
    let invoice = invoice_service(&state).get_invoice(invoice_id).await?;
    Ok(Json(invoice))
}

pub async fn create_invoice(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateInvoiceInput>,
) -> AppResult<(StatusCode, Json<InvoiceDetail>)> {
    user.require_admin()?;
    let invoice = invoice_service(&state)
        .create_invoice(user.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

pub async fn update_invoice(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(invoice_id): Path<Uuid>,
    Json(input): Json<UpdateInvoiceInput>,
) -> AppResult<Json<InvoiceDetail>> {
    user.require_admin()?;
    let invoice = invoice_service(&state)
        .update_invoice(invoice_id, input)
        .await?;
    Ok(Json(invoice))
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    user.require_admin()?;
    invoice_service(&state)
        .delete_invoice(user.user_id, invoice_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_invoice_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(invoice_id): Path<Uuid>,
    Json(input): Json<InvoiceItemInput>,
) -> AppResult<(StatusCode, Json<InvoiceDetail>)> {
    user.require_admin()?;
    let invoice = invoice_service(&state)
        .add_item(user.user_id, invoice_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

pub async fn update_invoice_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((invoice_id, item_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<UpdateInvoiceItemInput>,
) -> AppResult<Json<InvoiceDetail>> {
    user.require_admin()?;
    let invoice = invoice_service(&state)
        .update_item(user.user_id, invoice_id, item_id, input)
        .await?;
    Ok(Json(invoice))
}

pub async fn delete_invoice_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((invoice_id, item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<InvoiceDetail>> {
    user.require_admin()?;
    let invoice = invoice_service(&state)
        .delete_item(user.user_id, invoice_id, item_id)
        .await?;
    Ok(Json(invoice))
}

pub async fn add_invoice_expense(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(invoice_id): Path<Uuid>,
    Json(input): Json<InvoiceExpenseInput>,
) -> AppResult<(StatusCode, Json<InvoiceDetail>)> {
    user.require_admin()?;
    let invoice = invoice_service(&state)
        .add_expense(invoice_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

pub async fn delete_invoice_expense(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((invoice_id, expense_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<InvoiceDetail>> {
    user.require_admin()?;
    let invoice = invoice_service(&state)
        .delete_expense(invoice_id, expense_id)
        .await?;
    Ok(Json(invoice))
}

pub async fn list_runs(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ManufacturingQuery>,
) -> AppResult<Json<PaginatedResponse<ManufacturingInvoice>>> {
    user.require_admin()?;
    let runs = manufacturing_service(&state).list_runs(query).await?;
    Ok(Json(runs))
}

pub async fn get_run(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(run_id): Path<Uuid>,
) -> AppResult<Json<ManufacturingDetail>> {
    user.require_admin()?;
    let run = manufacturing_service(&state).get_run(run_id).await?;
    Ok(Json(run))
}

pub async fn create_run(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateManufacturingInput>,
) -> AppResult<(StatusCode, Json<ManufacturingDetail>)> {
    user.require_admin()?;
    let run = manufacturing_service(&state)
        .create_run(user.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(run)))
}

pub async fn update_run(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(run_id): Path<Uuid>,
    Json(input): Json<UpdateManufacturingInput>,
) -> AppResult<Json<ManufacturingDetail>> {
    user.require_admin()?;
    let run = manufacturing_service(&state).update_run(run_id, input).await?;
    Ok(Json(run))
}

pub async fn update_output_quantity(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(run_id): Path<Uuid>,
    Json(input): Json<OutputQuantityInput>,
) -> AppResult<Json<ManufacturingDetail>> {
    user.require_admin()?;
    let run = manufacturing_service(&state)
        .update_output_quantity(user.user_id, run_id, input)
        .await?;
    Ok(Json(run))
}

pub async fn delete_run(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(run_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    user.require_admin()?;
    manufacturing_service(&state)
        .delete_run(user.user_id, run_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_run_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(run_id): Path<Uuid>,
    Json(input): Json<ManufacturingItemInput>,
) -> AppResult<(StatusCode, Json<ManufacturingDetail>)> {
    user.require_admin()?;
    let run = manufacturing_service(&state)
        .add_item(user.user_id, run_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(run)))
}

pub async fn update_run_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((run_id, item_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<UpdateManufacturingItemInput>,
) -> AppResult<Json<ManufacturingDetail>> {
    user.require_admin()?;
    let run = manufacturing_service(&state)
        .update_item(user.user_id, run_id, item_id, input)
        .await?;
    Ok(Json(run))
}

pub async fn delete_run_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((run_id, item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ManufacturingDetail>> {
    user.require_admin()?;
    let run = manufacturing_service(&state)
        .delete_item(user.user_id, run_id, item_id)
        .await?;
    Ok(Json(run))
}

pub async fn add_run_expense(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(run_id): Path<Uuid>,
    Json(input): Json<ManufacturingExpenseInput>,
) -> AppResult<(StatusCode, Json<ManufacturingDetail>)> {
    user.require_admin()?;
    let run = manufacturing_service(&state)
        .add_expense(run_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(run)))
}

pub async fn delete_run_expense(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((run_id, expense_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ManufacturingDetail>> {
    user.require_admin()?;
    let run = manufacturing_service(&state)
        .delete_expense(run_id, expense_id)
        .await?;
    Ok(Json(run))
}
