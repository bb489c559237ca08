//! Route definitions for the Poultry Farm Management Platform

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (setup, login and refresh are public)
        .nest("/auth", auth_routes(&state))
        .nest("/users", user_routes(&state))
        .nest("/farms", farm_routes(&state))
        .nest("/warehouses", warehouse_routes(&state))
        .nest("/materials", material_routes(&state))
        .nest("/catalog", catalog_routes(&state))
        .nest("/invoices", invoice_routes(&state))
        .nest("/manufacturing", manufacturing_routes(&state))
        .nest("/medicines", medicine_routes(&state))
        .nest("/medicine-invoices", medicine_invoice_routes(&state))
        .nest("/medication-records", medication_record_routes(&state))
        .nest("/daily-reports", daily_report_routes(&state))
        .nest("/dashboard", dashboard_routes(&state))
}

fn auth_routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/logout", post(handlers::logout))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/setup", post(handlers::setup))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        .merge(protected)
}

/// User management routes (protected)
fn user_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_users).post(handlers::create_user))
        .route(
            "/:user_id",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route("/:user_id/password", put(handlers::reset_password))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Farm routes (protected)
fn farm_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_farms).post(handlers::create_farm))
        .route(
            "/:farm_id",
            get(handlers::get_farm)
                .put(handlers::update_farm)
                .delete(handlers::delete_farm),
        )
        .route("/:farm_id/flock", post(handlers::start_flock))
        .route("/:farm_id/schedule", get(handlers::get_schedule))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Warehouse routes (protected)
fn warehouse_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_warehouses).post(handlers::create_warehouse),
        )
        .route(
            "/:warehouse_id",
            get(handlers::get_warehouse)
                .put(handlers::update_warehouse)
                .delete(handlers::delete_warehouse),
        )
        .route(
            "/:warehouse_id/materials",
            get(handlers::list_warehouse_materials),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Material and stock routes (protected)
fn material_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_materials).post(handlers::create_material),
        )
        .route("/low-stock", get(handlers::low_stock))
        .route("/transfer", post(handlers::transfer))
        .route(
            "/:material_id",
            get(handlers::get_material)
                .put(handlers::update_material)
                .delete(handlers::delete_material),
        )
        .route("/:material_id/adjust", post(handlers::adjust_balance))
        .route("/:material_id/movements", get(handlers::list_movements))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Lookup catalog routes (protected)
fn catalog_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/:kind",
            get(handlers::list_catalog).post(handlers::create_catalog_entry),
        )
        .route(
            "/:kind/:id",
            get(handlers::get_catalog_entry)
                .put(handlers::update_catalog_entry)
                .delete(handlers::delete_catalog_entry),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Buy and sell invoice routes (protected)
fn invoice_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_invoices).post(handlers::create_invoice))
        .route(
            "/:invoice_id",
            get(handlers::get_invoice)
                .put(handlers::update_invoice)
                .delete(handlers::delete_invoice),
        )
        .route("/:invoice_id/items", post(handlers::add_invoice_item))
        .route(
            "/:invoice_id/items/:item_id",
            put(handlers::update_invoice_item).delete(handlers::delete_invoice_item),
        )
        .route("/:invoice_id/expenses", post(handlers::add_invoice_expense))
        .route(
            "/:invoice_id/expenses/:expense_id",
            delete(handlers::delete_invoice_expense),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Feed manufacturing routes (protected)
fn manufacturing_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_runs).post(handlers::create_run))
        .route(
            "/:run_id",
            get(handlers::get_run)
                .put(handlers::update_run)
                .delete(handlers::delete_run),
        )
        .route("/:run_id/output", put(handlers::update_output_quantity))
        .route("/:run_id/items", post(handlers::add_run_item))
        .route(
            "/:run_id/items/:item_id",
            put(handlers::update_run_item).delete(handlers::delete_run_item),
        )
        .route("/:run_id/expenses", post(handlers::add_run_expense))
        .route(
            "/:run_id/expenses/:expense_id",
            delete(handlers::delete_run_expense),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Medicine catalog routes (protected)
fn medicine_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_medicines).post(handlers::create_medicine),
        )
        .route(
            "/:medicine_id",
            get(handlers::get_medicine)
                .put(handlers::update_medicine)
                .delete(handlers::delete_medicine),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Medicine issue routes (protected)
fn medicine_invoice_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_medicine_invoices).post(handlers::create_medicine_invoice),
        )
        .route(
            "/:invoice_id",
            get(handlers::get_medicine_invoice).delete(handlers::delete_medicine_invoice),
        )
        .route(
            "/:invoice_id/items",
            post(handlers::add_medicine_invoice_item),
        )
        .route(
            "/:invoice_id/items/:item_id",
            delete(handlers::delete_medicine_invoice_item),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Medication record routes (protected)
fn medication_record_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_medication_records).post(handlers::record_medication),
        )
        .route("/:record_id", delete(handlers::delete_medication_record))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Daily production report routes (protected)
fn daily_report_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_reports).post(handlers::create_report))
        .route("/summary", get(handlers::report_summary))
        .route("/export", get(handlers::export_reports))
        .route(
            "/:report_id",
            get(handlers::get_report)
                .put(handlers::update_report)
                .delete(handlers::delete_report),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

fn dashboard_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::dashboard))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}
