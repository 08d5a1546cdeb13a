use crate::batch::{self, BatchTuning};
use crate::config::Config;
use crate::credit_client::CreditProClient;
use crate::errors::AppError;
use crate::models::{GenerateReportRequest, ReportResponse};
use crate::report;
use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Client for the Credit Pro scoring API.
    pub credit_client: CreditProClient,
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rust-creditpro-api",
            "version": "0.1.0"
        })),
    )
}

/// POST /api/v1/reports/generate
///
/// Receives a CPF list, runs the bulk Credit Pro acquisition (single auth,
/// grouped concurrent fetches with retries), renders the HTML report and
/// persists it alongside the raw JSON archive.
///
/// Partial failure is not an error: CPFs whose retries were exhausted are
/// simply absent from the report, and `cpfsWithData < cpfsProcessed` is the
/// caller's signal. Authentication failure aborts with 502 before any
/// per-CPF work.
pub async fn generate_report(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GenerateReportRequest>,
) -> Result<Json<ReportResponse>, AppError> {
    if payload.cpfs.is_empty() {
        return Err(AppError::BadRequest("Lista de CPFs é obrigatória".to_string()));
    }

    tracing::info!("POST /reports/generate - {} CPF(s)", payload.cpfs.len());

    let tuning = BatchTuning::from_config(&state.config);
    let result = batch::run_batch(&state.credit_client, &payload.cpfs, tuning).await?;

    if result.records.is_empty() {
        return Err(AppError::NotFound(
            "Nenhum dado foi encontrado para os CPFs fornecidos".to_string(),
        ));
    }

    let html = report::generate_html(&result.records);
    let response = report::save_report(
        html,
        &result.records,
        result.cpfs_processed,
        &state.config.reports_dir,
    )
    .await?;

    tracing::info!(
        "Report generated: {} ({}/{} CPFs with data)",
        response.filename,
        response.cpfs_with_data,
        response.cpfs_processed
    );

    Ok(Json(response))
}
