//! HTTP request handlers

pub mod auth;
pub mod farms;
pub mod health;
pub mod inventory;
pub mod invoices;
pub mod medicines;
pub mod reports;
pub mod users;

pub use auth::*;
pub use farms::*;
pub use health::*;
pub use inventory::*;
pub use invoices::*;
pub use medicines::*;
pub use reports::*;
pub use users::*;
