//! User and role models

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::UnknownVariant;

/// Roles known to the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Full access to every farm, warehouse and invoice
    Admin,
    /// Records daily reports and medication for assigned farms
    Farmer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Farmer => "farmer",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl FromStr for UserRole {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "farmer" => Ok(UserRole::Farmer),
            other => Err(UnknownVariant::new("user role", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [UserRole::Admin, UserRole::Farmer] {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
        assert!("owner".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_serde() {
        let json = serde_json::to_string(&UserRole::Farmer).unwrap();
        assert_eq!(json, "\"farmer\"");
    }
}
