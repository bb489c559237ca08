//! Name catalogs: material names, units, expense types and clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{validate_name, validate_phone, ClientType, MaterialCategory};
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Catalog service
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

/// The catalogs addressable under `/catalog/:kind`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    MaterialNames,
    Units,
    ExpenseTypes,
    Clients,
}

impl CatalogKind {
    fn table(&self) -> &'static str {
        match self {
            CatalogKind::MaterialNames => "material_names",
            CatalogKind::Units => "units",
            CatalogKind::ExpenseTypes => "expense_types",
            CatalogKind::Clients => "clients",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            CatalogKind::MaterialNames => "Material name",
            CatalogKind::Units => "Unit",
            CatalogKind::ExpenseTypes => "Expense type",
            CatalogKind::Clients => "Client",
        }
    }

    /// Columns beyond id/name, with NULL placeholders where a catalog lacks them
    fn extra_columns(&self) -> &'static str {
        match self {
            CatalogKind::MaterialNames => {
                "category, NULL::text AS client_type, NULL::text AS phone"
            }
            CatalogKind::Clients => "NULL::text AS category, client_type, phone",
            CatalogKind::Units | CatalogKind::ExpenseTypes => {
                "NULL::text AS category, NULL::text AS client_type, NULL::text AS phone"
            }
        }
    }
}

impl FromStr for CatalogKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "material-names" => Ok(CatalogKind::MaterialNames),
            "units" => Ok(CatalogKind::Units),
            "expense-types" => Ok(CatalogKind::ExpenseTypes),
            "clients" => Ok(CatalogKind::Clients),
            _ => Err(AppError::NotFound(format!("Catalog '{}'", s))),
        }
    }
}

/// One catalog row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CatalogEntry {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating or replacing a catalog entry
#[derive(Debug, Deserialize)]
pub struct CatalogEntryInput {
    pub name: String,
    pub category: Option<MaterialCategory>,
    pub client_type: Option<ClientType>,
    pub phone: Option<String>,
}

impl CatalogService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List a catalog alphabetically
    pub async fn list(&self, kind: CatalogKind) -> AppResult<Vec<CatalogEntry>> {
        let entries = sqlx::query_as::<_, CatalogEntry>(&format!(
            "SELECT id, name, {}, created_at FROM {} ORDER BY name",
            kind.extra_columns(),
            kind.table()
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }

    /// Get a single entry
    pub async fn get(&self, kind: CatalogKind, id: Uuid) -> AppResult<CatalogEntry> {
        sqlx::query_as::<_, CatalogEntry>(&format!(
            "SELECT id, name, {}, created_at FROM {} WHERE id = $1",
            kind.extra_columns(),
            kind.table()
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(kind.label().to_string()))
    }

    /// Create an entry. Names are unique within a catalog.
    pub async fn create(&self, kind: CatalogKind, input: CatalogEntryInput) -> AppResult<CatalogEntry> {
        Self::validate(&input)?;

        let id = match kind {
            CatalogKind::MaterialNames => {
                sqlx::query_scalar::<_, Uuid>(
                    "INSERT INTO material_names (name, category) VALUES ($1, $2) RETURNING id",
                )
                .bind(input.name.trim())
                .bind(input.category.unwrap_or(MaterialCategory::Other).as_str())
                .fetch_one(&self.db)
                .await?
            }
            CatalogKind::Clients => {
                sqlx::query_scalar::<_, Uuid>(
                    "INSERT INTO clients (name, client_type, phone) VALUES ($1, $2, $3) RETURNING id",
                )
                .bind(input.name.trim())
                .bind(input.client_type.unwrap_or(ClientType::Both).as_str())
                .bind(&input.phone)
                .fetch_one(&self.db)
                .await?
            }
            CatalogKind::Units | CatalogKind::ExpenseTypes => {
                sqlx::query_scalar::<_, Uuid>(&format!(
                    "INSERT INTO {} (name) VALUES ($1) RETURNING id",
                    kind.table()
                ))
                .bind(input.name.trim())
                .fetch_one(&self.db)
                .await?
            }
        };

        self.get(kind, id).await
    }

    /// Update an entry. Omitted optional attributes keep their stored value.
    pub async fn update(
        &self,
        kind: CatalogKind,
        id: Uuid,
        input: CatalogEntryInput,
    ) -> AppResult<CatalogEntry> {
        Self::validate(&input)?;

        let result = match kind {
            CatalogKind::MaterialNames => {
                sqlx::query(
                    r#"
                    UPDATE material_names
                    SET name = $1, category = COALESCE($2, category), updated_at = NOW()
                    WHERE id = $3
                    "#,
                )
                .bind(input.name.trim())
                .bind(input.category.map(|c| c.as_str()))
                .bind(id)
                .execute(&self.db)
                .await?
            }
            CatalogKind::Clients => {
                sqlx::query(
                    r#"
                    UPDATE clients
                    SET name = $1, client_type = COALESCE($2, client_type),
                        phone = COALESCE($3, phone), updated_at = NOW()
                    WHERE id = $4
                    "#,
                )
                .bind(input.name.trim())
                .bind(input.client_type.map(|c| c.as_str()))
                .bind(&input.phone)
                .bind(id)
                .execute(&self.db)
                .await?
            }
            CatalogKind::Units | CatalogKind::ExpenseTypes => {
                sqlx::query(&format!(
                    "UPDATE {} SET name = $1, updated_at = NOW() WHERE id = $2",
                    kind.table()
                ))
                .bind(input.name.trim())
                .bind(id)
                .execute(&self.db)
                .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(kind.label().to_string()));
        }

        self.get(kind, id).await
    }

    /// Delete an entry that nothing references
    pub async fn delete(&self, kind: CatalogKind, id: Uuid) -> AppResult<()> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", kind.table()))
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict { .. } => AppError::in_use(kind.label()),
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(kind.label().to_string()));
        }

        Ok(())
    }

    fn validate(input: &CatalogEntryInput) -> AppResult<()> {
        validate_name(&input.name).map_err(|msg| AppError::validation("name", msg))?;
        if let Some(phone) = &input.phone {
            validate_phone(phone).map_err(|msg| AppError::validation("phone", msg))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_path_segment() {
        assert_eq!("units".parse::<CatalogKind>().unwrap(), CatalogKind::Units);
        assert_eq!(
            "material-names".parse::<CatalogKind>().unwrap(),
            CatalogKind::MaterialNames
        );
        assert_eq!("expense-types".parse::<CatalogKind>().unwrap().table(), "expense_types");
        assert!(matches!(
            "lots".parse::<CatalogKind>(),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_placeholder_columns_line_up() {
        for kind in [
            CatalogKind::MaterialNames,
            CatalogKind::Units,
            CatalogKind::ExpenseTypes,
            CatalogKind::Clients,
        ] {
            assert_eq!(kind.extra_columns().split(',').count(), 3);
        }
    }
}
