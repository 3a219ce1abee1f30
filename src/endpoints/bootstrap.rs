//! Administrative bootstrap re-trigger endpoints.
//!
//! Unlike the automatic run at startup, which logs and continues, manual
//! triggers report step failures back to the operator as a structured
//! `{success, message, error}` body rather than a raw 500.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, Result};
use crate::services::orchestrator::{BootstrapOutcome, StepStatus};
use crate::state::AppState;

/// Create bootstrap routes
pub fn bootstrap_routes(state: AppState) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/run", post(run_bootstrap))
        .route("/steps/{name}/run", post(run_step))
        .with_state(state)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BootstrapRunResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of the most recent full bootstrap run
async fn get_status(State(state): State<AppState>) -> Json<Option<BootstrapOutcome>> {
    Json(state.orchestrator.last_outcome().await)
}

/// Re-run the full bootstrap sequence, readiness probe included
async fn run_bootstrap(State(state): State<AppState>) -> Json<BootstrapRunResponse> {
    let outcome = state.orchestrator.run().await;

    if outcome.has_failures() {
        let error = outcome.first_failure().and_then(|s| s.error.clone());
        return Json(BootstrapRunResponse {
            success: false,
            message: "Bootstrap run completed with warnings".to_string(),
            error,
        });
    }

    Json(BootstrapRunResponse {
        success: true,
        message: "Bootstrap run completed".to_string(),
        error: None,
    })
}

/// Re-run a single named bootstrap step (no readiness probe)
async fn run_step(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<BootstrapRunResponse>> {
    match state.orchestrator.run_step(&name).await {
        Ok(outcome) => {
            let message = match outcome.status {
                StepStatus::Skipped => format!("Step '{}' skipped", name),
                _ => format!("Step '{}' completed", name),
            };
            Ok(Json(BootstrapRunResponse {
                success: true,
                message,
                error: None,
            }))
        }
        Err(AppError::StepFailed { step, detail }) => Ok(Json(BootstrapRunResponse {
            success: false,
            message: format!("Step '{}' failed", step),
            error: Some(detail),
        })),
        // Unknown step names surface as a regular 404
        Err(e) => Err(e),
    }
}
