//! Daily production report and dashboard handlers

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use shared::PaginatedResponse;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::daily_reports::{
    CreateDailyReportInput, DailyReport, FarmReportSummary, ReportQuery, SummaryQuery,
    UpdateDailyReportInput,
};
use crate::services::dashboard::DashboardStats;
use crate::services::{DailyReportService, DashboardService};
use crate::AppState;

/// List daily reports, newest first
pub async fn list_reports(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<PaginatedResponse<DailyReport>>> {
    let reports = DailyReportService::new(state.db)
        .list_reports(&user, query)
        .await?;
    Ok(Json(reports))
}

pub async fn get_report(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(report_id): Path<Uuid>,
) -> AppResult<Json<DailyReport>> {
    let report = DailyReportService::new(state.db)
        .get_report(&user, report_id)
        .await?;
    Ok(Json(report))
}

pub async fn create_report(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateDailyReportInput>,
) -> AppResult<(StatusCode, Json<DailyReport>)> {
    let report = DailyReportService::new(state.db)
        .create_report(&user, input, Utc::now().date_naive())
        .await?;
    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn update_report(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(report_id): Path<Uuid>,
    Json(input): Json<UpdateDailyReportInput>,
) -> AppResult<Json<DailyReport>> {
    let report = DailyReportService::new(state.db)
        .update_report(&user, report_id, input, Utc::now().date_naive())
        .await?;
    Ok(Json(report))
}

pub async fn delete_report(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(report_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    DailyReportService::new(state.db)
        .delete_report(&user, report_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Totals and rates for one farm over a period
pub async fn report_summary(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<SummaryQuery>,
) -> AppResult<Json<FarmReportSummary>> {
    let summary = DailyReportService::new(state.db)
        .summary(&user, query)
        .await?;
    Ok(Json(summary))
}

/// Download reports as CSV
pub async fn export_reports(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<impl IntoResponse> {
    let csv = DailyReportService::new(state.db)
        .export_csv(&user, query)
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"daily_reports.csv\""),
        ],
        csv,
    ))
}

pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<DashboardStats>> {
    let stats = DashboardService::new(state.db.clone(), state.config.ledger.policy())
        .stats(
            &user,
            Utc::now().date_naive(),
            state.config.schedule.due_window_days,
        )
        .await?;
    Ok(Json(stats))
}
