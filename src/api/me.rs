//! Self-service endpoints for the signed-in account.

use axum::{Extension, Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::CurrentAccount;
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::services::{AccountInfo, PreferencesUpdate, ProfileUpdate};

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: Option<String>,
}

/// PUT /me/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<ApiResponse<AccountInfo>>, ApiError> {
    let updated = state
        .account_service()
        .update_profile(account.id, payload)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// PUT /me/preferences
pub async fn update_preferences(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Json(payload): Json<PreferencesUpdate>,
) -> Result<Json<ApiResponse<AccountInfo>>, ApiError> {
    let updated = state
        .account_service()
        .update_preferences(account.id, payload)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// PUT /me/password
///
/// Ends the session on success; the client must sign in again.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    session: Session,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if let Some(confirm) = &payload.confirm_password
        && *confirm != payload.new_password
    {
        return Err(ApiError::validation("Password confirmation does not match"));
    }

    state
        .auth_service()
        .change_password(account.id, &payload.current_password, &payload.new_password)
        .await?;

    if let Err(e) = session.flush().await {
        tracing::warn!(
            account_id = account.id,
            error = %e,
            "Password changed but the session could not be ended"
        );
    }

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password updated, please sign in again",
    ))))
}
