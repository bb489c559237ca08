//! User account management (administrators only)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{validate_email, validate_phone, UserRole};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::auth::hash_password;
use crate::error::{AppError, AppResult};

/// User service
#[derive(Clone)]
pub struct UserService {
    db: PgPool,
}

/// User profile as returned by the API
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a user
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(length(min = 1, max = 150))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub role: UserRole,
}

/// Input for updating a user
#[derive(Debug, Deserialize)]
pub struct UpdateUserInput {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

/// Input for resetting a password
#[derive(Debug, Deserialize)]
pub struct ResetPasswordInput {
    pub password: String,
}

const USER_COLUMNS: &str =
    "id, email, full_name, phone, role, is_active, last_login_at, created_at";

impl UserService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List all users
    pub async fn list_users(&self) -> AppResult<Vec<UserProfile>> {
        let users = sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {} FROM users ORDER BY role, full_name",
            USER_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(users)
    }

    /// Get a user by ID
    pub async fn get_user(&self, user_id: Uuid) -> AppResult<UserProfile> {
        sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    /// Create a new user account
    pub async fn create_user(&self, input: CreateUserInput) -> AppResult<UserProfile> {
        input.validate()?;
        validate_email(&input.email).map_err(|msg| AppError::validation("email", msg))?;
        if let Some(phone) = &input.phone {
            validate_phone(phone).map_err(|msg| AppError::validation("phone", msg))?;
        }
        let password_hash = hash_password(&input.password)?;

        let user = sqlx::query_as::<_, UserProfile>(&format!(
            r#"
            INSERT INTO users (email, password_hash, full_name, phone, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(input.email.trim().to_lowercase())
        .bind(&password_hash)
        .bind(input.full_name.trim())
        .bind(&input.phone)
        .bind(input.role.as_str())
        .fetch_one(&self.db)
        .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "User created");

        Ok(user)
    }

    /// Update a user's profile, role or status
    pub async fn update_user(
        &self,
        acting_user: Uuid,
        user_id: Uuid,
        input: UpdateUserInput,
    ) -> AppResult<UserProfile> {
        let existing = self.get_user(user_id).await?;

        // An administrator cannot lock themselves out
        if acting_user == user_id
            && (input.is_active == Some(false) || input.role == Some(UserRole::Farmer))
        {
            return Err(AppError::validation(
                "role",
                "You cannot demote or deactivate your own account",
            ));
        }

        let full_name = input.full_name.unwrap_or(existing.full_name);
        shared::validate_name(&full_name).map_err(|msg| AppError::validation("full_name", msg))?;
        let phone = input.phone.or(existing.phone);
        if let Some(phone) = &phone {
            validate_phone(phone).map_err(|msg| AppError::validation("phone", msg))?;
        }
        let role = input.role.map(|r| r.as_str().to_string()).unwrap_or(existing.role);
        let is_active = input.is_active.unwrap_or(existing.is_active);

        let user = sqlx::query_as::<_, UserProfile>(&format!(
            r#"
            UPDATE users
            SET full_name = $1, phone = $2, role = $3, is_active = $4, updated_at = NOW()
            WHERE id = $5
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(full_name.trim())
        .bind(&phone)
        .bind(&role)
        .bind(is_active)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        if !user.is_active {
            sqlx::query(
                "UPDATE refresh_tokens SET revoked_at = NOW() WHERE user_id = $1 AND revoked_at IS NULL",
            )
            .bind(user_id)
            .execute(&self.db)
            .await?;
        }

        Ok(user)
    }

    /// Replace a user's password and revoke their sessions
    pub async fn reset_password(&self, user_id: Uuid, input: ResetPasswordInput) -> AppResult<()> {
        let password_hash = hash_password(&input.password)?;

        let mut tx = self.db.begin().await?;

        let result = sqlx::query(
            "UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(&password_hash)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }

        sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = NOW() WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Delete a user. Farms they manage are left without a farmer.
    pub async fn delete_user(&self, acting_user: Uuid, user_id: Uuid) -> AppResult<()> {
        if acting_user == user_id {
            return Err(AppError::validation("id", "You cannot delete your own account"));
        }

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }

        Ok(())
    }
}
