//! Farm and warehouse handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::farms::{CreateFarmInput, Farm, StartFlockInput, UpdateFarmInput};
use crate::services::materials::{MaterialQuery, MaterialView};
use crate::services::medicines::FarmSchedule;
use crate::services::warehouses::{
    CreateWarehouseInput, UpdateWarehouseInput, Warehouse, WarehouseQuery,
};
use crate::services::{FarmService, MaterialService, MedicineService, WarehouseService};
use crate::AppState;

/// List farms visible to the current user
pub async fn list_farms(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<Farm>>> {
    let farms = FarmService::new(state.db).list_farms(&user).await?;
    Ok(Json(farms))
}

pub async fn get_farm(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(farm_id): Path<Uuid>,
) -> AppResult<Json<Farm>> {
    let farm = FarmService::new(state.db).get_farm(&user, farm_id).await?;
    Ok(Json(farm))
}

pub async fn create_farm(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateFarmInput>,
) -> AppResult<(StatusCode, Json<Farm>)> {
    user.require_admin()?;
    let farm = FarmService::new(state.db).create_farm(input).await?;
    Ok((StatusCode::CREATED, Json(farm)))
}

pub async fn update_farm(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(farm_id): Path<Uuid>,
    Json(input): Json<UpdateFarmInput>,
) -> AppResult<Json<Farm>> {
    user.require_admin()?;
    let farm = FarmService::new(state.db).update_farm(farm_id, input).await?;
    Ok(Json(farm))
}

pub async fn delete_farm(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(farm_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    user.require_admin()?;
    FarmService::new(state.db).delete_farm(farm_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Place a new flock on a farm
pub async fn start_flock(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(farm_id): Path<Uuid>,
    Json(input): Json<StartFlockInput>,
) -> AppResult<Json<Farm>> {
    user.require_admin()?;
    let farm = FarmService::new(state.db).start_flock(farm_id, input).await?;
    Ok(Json(farm))
}

/// Medication schedule of the farm's current flock
pub async fn get_schedule(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(farm_id): Path<Uuid>,
) -> AppResult<Json<FarmSchedule>> {
    let service = MedicineService::new(state.db.clone(), state.config.ledger.policy());
    let schedule = service
        .schedule(
            &user,
            farm_id,
            Utc::now().date_naive(),
            state.config.schedule.due_window_days,
        )
        .await?;
    Ok(Json(schedule))
}

pub async fn list_warehouses(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<WarehouseQuery>,
) -> AppResult<Json<Vec<Warehouse>>> {
    let warehouses = WarehouseService::new(state.db)
        .list_warehouses(&user, query)
        .await?;
    Ok(Json(warehouses))
}

pub async fn get_warehouse(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(warehouse_id): Path<Uuid>,
) -> AppResult<Json<Warehouse>> {
    let warehouse = WarehouseService::new(state.db)
        .get_warehouse(&user, warehouse_id)
        .await?;
    Ok(Json(warehouse))
}

pub async fn create_warehouse(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateWarehouseInput>,
) -> AppResult<(StatusCode, Json<Warehouse>)> {
    user.require_admin()?;
    let warehouse = WarehouseService::new(state.db).create_warehouse(input).await?;
    Ok((StatusCode::CREATED, Json(warehouse)))
}

pub async fn update_warehouse(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(warehouse_id): Path<Uuid>,
    Json(input): Json<UpdateWarehouseInput>,
) -> AppResult<Json<Warehouse>> {
    user.require_admin()?;
    let warehouse = WarehouseService::new(state.db)
        .update_warehouse(warehouse_id, input)
        .await?;
    Ok(Json(warehouse))
}

pub async fn delete_warehouse(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(warehouse_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    user.require_admin()?;
    WarehouseService::new(state.db)
        .delete_warehouse(warehouse_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Stock held in one warehouse
pub async fn list_warehouse_materials(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(warehouse_id): Path<Uuid>,
) -> AppResult<Json<Vec<MaterialView>>> {
    WarehouseService::new(state.db.clone())
        .ensure_access(&user, warehouse_id)
        .await?;

    let materials = MaterialService::new(state.db, state.config.ledger.policy())
        .list_materials(MaterialQuery {
            warehouse_id: Some(warehouse_id),
            material_name_id: None,
        })
        .await?;
    Ok(Json(materials))
}
