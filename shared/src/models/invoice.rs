//! Invoice models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{Direction, MovementSource, UnknownVariant};

/// Trade invoice kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceType {
    Buy,
    Sell,
}

impl InvoiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceType::Buy => "buy",
            InvoiceType::Sell => "sell",
        }
    }

    /// Stock direction of an item line on this kind of invoice
    pub fn direction(&self) -> Direction {
        match self {
            InvoiceType::Buy => Direction::In,
            InvoiceType::Sell => Direction::Out,
        }
    }

    pub fn movement_source(&self) -> MovementSource {
        match self {
            InvoiceType::Buy => MovementSource::BuyInvoice,
            InvoiceType::Sell => MovementSource::SellInvoice,
        }
    }

    /// Prefix used when numbering invoices of this type
    pub fn number_prefix(&self) -> &'static str {
        match self {
            InvoiceType::Buy => "BUY",
            InvoiceType::Sell => "SEL",
        }
    }
}

impl FromStr for InvoiceType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(InvoiceType::Buy),
            "sell" => Ok(InvoiceType::Sell),
            other => Err(UnknownVariant::new("invoice type", other)),
        }
    }
}

/// Priced line of an invoice, as far as totals are concerned
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceLine {
    pub quantity: Decimal,
    /// Lines sold by weight carry a positive weight and are priced per weight unit
    pub weight: Decimal,
    pub price: Decimal,
}

/// Raw input consumed by a manufacturing run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MixLine {
    pub quantity: Decimal,
    pub percentage: Option<Decimal>,
    /// Average buy price of the input, used for cost summaries
    pub unit_cost: Option<Decimal>,
}
