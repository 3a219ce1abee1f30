//! Payment credential administration endpoints.

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::Result;
use crate::models::payment_credential;
use crate::services::credentials::{CredentialPatch, NewCredential};
use crate::state::AppState;

/// Create credential routes
pub fn credentials_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_credentials).post(create_credential))
        .route("/active", get(get_active_credential))
        .route(
            "/{id}",
            get(get_credential)
                .patch(update_credential)
                .delete(delete_credential),
        )
        .route("/{id}/activate", put(activate_credential))
        .with_state(state)
}

// ============================================================================
// Response types
// ============================================================================

/// Secret fields are returned decrypted; ciphertext never leaves the store.
#[derive(Debug, Serialize, ToSchema)]
pub struct CredentialResponse {
    pub id: i32,
    pub name: String,
    pub api_key: String,
    pub secret_key: String,
    pub base_url: String,
    pub installment: bool,
    pub installment_options: serde_json::Value,
    pub is_test_mode: bool,
    pub currency: String,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<payment_credential::Model> for CredentialResponse {
    fn from(model: payment_credential::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            api_key: model.api_key,
            secret_key: model.secret_key,
            base_url: model.base_url,
            installment: model.installment,
            installment_options: model.installment_options,
            is_test_mode: model.is_test_mode,
            currency: model.currency,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn list_credentials(State(state): State<AppState>) -> Result<Json<Vec<CredentialResponse>>> {
    let credentials = state.credentials.list().await?;
    Ok(Json(credentials.into_iter().map(Into::into).collect()))
}

async fn create_credential(
    State(state): State<AppState>,
    Json(data): Json<NewCredential>,
) -> Result<Json<CredentialResponse>> {
    let credential = state.credentials.create(data).await?;
    Ok(Json(credential.into()))
}

async fn get_active_credential(
    State(state): State<AppState>,
) -> Result<Json<CredentialResponse>> {
    let credential = state.credentials.get_active().await?;
    Ok(Json(credential.into()))
}

async fn get_credential(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CredentialResponse>> {
    let credential = state.credentials.get_by_id(id).await?;
    Ok(Json(credential.into()))
}

async fn update_credential(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(patch): Json<CredentialPatch>,
) -> Result<Json<CredentialResponse>> {
    let credential = state.credentials.update(id, patch).await?;
    Ok(Json(credential.into()))
}

async fn activate_credential(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CredentialResponse>> {
    let credential = state.credentials.set_active(id).await?;
    Ok(Json(credential.into()))
}

async fn delete_credential(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>> {
    state.credentials.delete(id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}
