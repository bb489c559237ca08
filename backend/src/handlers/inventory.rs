//! HTTP handlers for materials and catalogs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::PaginatedResponse;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::catalog::{CatalogEntry, CatalogEntryInput, CatalogKind};
use crate::services::ledger::MaterialMovement;
use crate::services::materials::{
    AdjustBalanceInput, CreateMaterialInput, MaterialQuery, MaterialView, MovementQuery,
    TransferInput, TransferResult, UpdateMaterialInput,
};
use crate::services::{CatalogService, MaterialService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    pub warehouse_id: Option<Uuid>,
}

fn material_service(state: &AppState) -> MaterialService {
    MaterialService::new(state.db.clone(), state.config.ledger.policy())
}

/// List materials across warehouses
pub async fn list_materials(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<MaterialQuery>,
) -> AppResult<Json<Vec<MaterialView>>> {
    user.require_admin()?;
    let materials = material_service(&state).list_materials(query).await?;
    Ok(Json(materials))
}

pub async fn get_material(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(material_id): Path<Uuid>,
) -> AppResult<Json<MaterialView>> {
    user.require_admin()?;
    let material = material_service(&state).get_material(material_id).await?;
    Ok(Json(material))
}

pub async fn create_material(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateMaterialInput>,
) -> AppResult<(StatusCode, Json<MaterialView>)> {
    user.require_admin()?;
    let material = material_service(&state)
        .create_material(user.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(material)))
}

pub async fn update_material(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(material_id): Path<Uuid>,
    Json(input): Json<UpdateMaterialInput>,
) -> AppResult<Json<MaterialView>> {
    user.require_admin()?;
    let material = material_service(&state)
        .update_material(material_id, input)
        .await?;
    Ok(Json(material))
}

pub async fn delete_material(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(material_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    user.require_admin()?;
    material_service(&state).delete_material(material_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Record a stock count
pub async fn adjust_balance(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(material_id): Path<Uuid>,
    Json(input): Json<AdjustBalanceInput>,
) -> AppResult<Json<MaterialView>> {
    user.require_admin()?;
    let material = material_service(&state)
        .adjust_balance(user.user_id, material_id, input)
        .await?;
    Ok(Json(material))
}

pub async fn transfer(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<TransferInput>,
) -> AppResult<(StatusCode, Json<TransferResult>)> {
    user.require_admin()?;
    let result = material_service(&state).transfer(user.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

pub async fn low_stock(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<Vec<MaterialView>>> {
    user.require_admin()?;
    let materials = material_service(&state).low_stock(query.warehouse_id).await?;
    Ok(Json(materials))
}

pub async fn list_movements(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(material_id): Path<Uuid>,
    Query(query): Query<MovementQuery>,
) -> AppResult<Json<PaginatedResponse<MaterialMovement>>> {
    user.require_admin()?;
    let movements = material_service(&state)
        .list_movements(material_id, query)
        .await?;
    Ok(Json(movements))
}

/// List a catalog. Every signed-in user may read catalogs.
pub async fn list_catalog(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(kind): Path<String>,
) -> AppResult<Json<Vec<CatalogEntry>>> {
    let kind: CatalogKind = kind.parse()?;
    let entries = CatalogService::new(state.db).list(kind).await?;
    Ok(Json(entries))
}

pub async fn get_catalog_entry(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path((kind, id)): Path<(String, Uuid)>,
) -> AppResult<Json<CatalogEntry>> {
    let kind: CatalogKind = kind.parse()?;
    let entry = CatalogService::new(state.db).get(kind, id).await?;
    Ok(Json(entry))
}

pub async fn create_catalog_entry(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(kind): Path<String>,
    Json(input): Json<CatalogEntryInput>,
) -> AppResult<(StatusCode, Json<CatalogEntry>)> {
    user.require_admin()?;
    let kind: CatalogKind = kind.parse()?;
    let entry = CatalogService::new(state.db).create(kind, input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn update_catalog_entry(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((kind, id)): Path<(String, Uuid)>,
    Json(input): Json<CatalogEntryInput>,
) -> AppResult<Json<CatalogEntry>> {
    user.require_admin()?;
    let kind: CatalogKind = kind.parse()?;
    let entry = CatalogService::new(state.db).update(kind, id, input).await?;
    Ok(Json(entry))
}

pub async fn delete_catalog_entry(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((kind, id)): Path<(String, Uuid)>,
) -> AppResult<StatusCode> {
    user.require_admin()?;
    let kind: CatalogKind = kind.parse()?;
    CatalogService::new(state.db).delete(kind, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
