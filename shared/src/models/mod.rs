//! Domain models for the Poultry Farm Management Platform

mod inventory;
mod invoice;
mod medicine;
mod report;
mod user;

pub use inventory::*;
pub use invoice::*;
pub use medicine::*;
pub use report::*;
pub use user::*;

/// Raised when a stored or submitted enum value is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
