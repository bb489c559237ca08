//! User management handlers (administrators only)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::users::{CreateUserInput, ResetPasswordInput, UpdateUserInput, UserProfile};
use crate::services::UserService;
use crate::AppState;

pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<UserProfile>>> {
    user.require_admin()?;
    let users = UserService::new(state.db).list_users().await?;
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<UserProfile>> {
    // Everyone may read their own profile
    if user.user_id != user_id {
        user.require_admin()?;
    }
    let profile = UserService::new(state.db).get_user(user_id).await?;
    Ok(Json(profile))
}

pub async fn create_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateUserInput>,
) -> AppResult<(StatusCode, Json<UserProfile>)> {
    user.require_admin()?;
    let profile = UserService::new(state.db).create_user(input).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(input): Json<UpdateUserInput>,
) -> AppResult<Json<UserProfile>> {
    user.require_admin()?;
    let profile = UserService::new(state.db)
        .update_user(user.user_id, user_id, input)
        .await?;
    Ok(Json(profile))
}

pub async fn reset_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(input): Json<ResetPasswordInput>,
) -> AppResult<StatusCode> {
    user.require_admin()?;
    UserService::new(state.db).reset_password(user_id, input).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    user.require_admin()?;
    UserService::new(state.db)
        .delete_user(user.user_id, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
