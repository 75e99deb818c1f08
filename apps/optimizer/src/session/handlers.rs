use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::errors::AppError;
use crate::models::optimization::StartOptimizationRequest;
use crate::session::controller::AppliedOptimization;
use crate::session::machine::OptimizationSession;
use crate::state::AppState;

/// POST /api/v1/optimizations
pub async fn handle_start(
    State(state): State<AppState>,
    Json(req): Json<StartOptimizationRequest>,
) -> Result<(StatusCode, Json<OptimizationSession>), AppError> {
    if req.resume.id.trim().is_empty() {
        return Err(AppError::Validation("resume.id must not be empty".to_string()));
    }
    if req.job_id.trim().is_empty() {
        return Err(AppError::Validation("job_id must not be empty".to_string()));
    }
    let session = state.controller.start(req).await?;
    Ok((StatusCode::ACCEPTED, Json(session)))
}

/// GET /api/v1/optimizations/current
pub async fn handle_current(
    State(state): State<AppState>,
) -> Result<Json<OptimizationSession>, AppError> {
    state
        .controller
        .snapshot()
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No optimization session has been started".to_string()))
}

/// POST /api/v1/optimizations/current/stop
pub async fn handle_stop(
    State(state): State<AppState>,
) -> Result<Json<OptimizationSession>, AppError> {
    Ok(Json(state.controller.stop().await?))
}

/// POST /api/v1/optimizations/current/suggestions/:index/toggle
pub async fn handle_toggle(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<OptimizationSession>, AppError> {
    Ok(Json(state.controller.toggle(index).await?))
}

/// POST /api/v1/optimizations/current/apply
pub async fn handle_apply(
    State(state): State<AppState>,
) -> Result<Json<AppliedOptimization>, AppError> {
    Ok(Json(state.controller.apply().await?))
}
