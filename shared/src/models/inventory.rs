//! Inventory models: material categories, client types and movements

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::UnknownVariant;

/// Broad grouping of catalog materials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialCategory {
    Feed,
    Medicine,
    Egg,
    Packaging,
    Other,
}

impl MaterialCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialCategory::Feed => "feed",
            MaterialCategory::Medicine => "medicine",
            MaterialCategory::Egg => "egg",
            MaterialCategory::Packaging => "packaging",
            MaterialCategory::Other => "other",
        }
    }
}

impl FromStr for MaterialCategory {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "feed" => Ok(MaterialCategory::Feed),
            "medicine" => Ok(MaterialCategory::Medicine),
            "egg" => Ok(MaterialCategory::Egg),
            "packaging" => Ok(MaterialCategory::Packaging),
            "other" => Ok(MaterialCategory::Other),
            other => Err(UnknownVariant::new("material category", other)),
        }
    }
}

/// Counterparty kinds for invoices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    Customer,
    Supplier,
    Both,
}

impl ClientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientType::Customer => "customer",
            ClientType::Supplier => "supplier",
            ClientType::Both => "both",
        }
    }
}

impl FromStr for ClientType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(ClientType::Customer),
            "supplier" => Ok(ClientType::Supplier),
            "both" => Ok(ClientType::Both),
            other => Err(UnknownVariant::new("client type", other)),
        }
    }
}

/// Whether a movement adds to or removes from a balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Direction::In => Direction::Out,
            Direction::Out => Direction::In,
        }
    }
}

impl FromStr for Direction {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(Direction::In),
            "out" => Ok(Direction::Out),
            other => Err(UnknownVariant::new("direction", other)),
        }
    }
}

/// The document kind that caused a balance movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementSource {
    BuyInvoice,
    SellInvoice,
    ManufacturingOutput,
    ManufacturingInput,
    MedicineIssue,
    Transfer,
    Adjustment,
}

impl MovementSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementSource::BuyInvoice => "buy_invoice",
            MovementSource::SellInvoice => "sell_invoice",
            MovementSource::ManufacturingOutput => "manufacturing_output",
            MovementSource::ManufacturingInput => "manufacturing_input",
            MovementSource::MedicineIssue => "medicine_issue",
            MovementSource::Transfer => "transfer",
            MovementSource::Adjustment => "adjustment",
        }
    }
}

impl FromStr for MovementSource {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy_invoice" => Ok(MovementSource::BuyInvoice),
            "sell_invoice" => Ok(MovementSource::SellInvoice),
            "manufacturing_output" => Ok(MovementSource::ManufacturingOutput),
            "manufacturing_input" => Ok(MovementSource::ManufacturingInput),
            "medicine_issue" => Ok(MovementSource::MedicineIssue),
            "transfer" => Ok(MovementSource::Transfer),
            "adjustment" => Ok(MovementSource::Adjustment),
            other => Err(UnknownVariant::new("movement source", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_source_round_trip() {
        let all = [
            MovementSource::BuyInvoice,
            MovementSource::SellInvoice,
            MovementSource::ManufacturingOutput,
            MovementSource::ManufacturingInput,
            MovementSource::MedicineIssue,
            MovementSource::Transfer,
            MovementSource::Adjustment,
        ];
        for source in all {
            assert_eq!(source.as_str().parse::<MovementSource>().unwrap(), source);
        }
    }

    #[test]
    fn test_direction_opposite() {
        assert_eq!(Direction::In.opposite(), Direction::Out);
        assert_eq!(Direction::Out.opposite(), Direction::In);
    }
}
