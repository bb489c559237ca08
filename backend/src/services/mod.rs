//! Business logic services for the Poultry Farm Management Platform

pub mod auth;
pub mod catalog;
pub mod daily_reports;
pub mod dashboard;
pub mod farms;
pub mod invoices;
pub mod ledger;
pub mod manufacturing;
pub mod materials;
pub mod medicines;
mod numbering;
pub mod users;
pub mod warehouses;

pub use auth::AuthService;
pub use catalog::CatalogService;
pub use daily_reports::DailyReportService;
pub use dashboard::DashboardService;
pub use farms::FarmService;
pub use invoices::InvoiceService;
pub use ledger::LedgerService;
pub use manufacturing::ManufacturingService;
pub use materials::MaterialService;
pub use medicines::MedicineService;
pub use users::UserService;
pub use warehouses::WarehouseService;
