//! Account administration endpoints. Mounted behind `require_admin`.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::validation::validate_account_id;
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::services::{AccountFilter, AccountInfo, AccountStats, AccountUpdate, NewAccount};

#[derive(Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

#[derive(Serialize)]
pub struct AccountDetail {
    #[serde(flatten)]
    pub account: AccountInfo,
    pub is_protected: bool,
}

/// GET /admin/stats
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<AccountStats>>, ApiError> {
    let stats = state.account_service().account_stats().await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// GET /admin/users?search=&only_active=
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<AccountFilter>,
) -> Result<Json<ApiResponse<Vec<AccountInfo>>>, ApiError> {
    let accounts = state.account_service().list_accounts(filter).await?;
    Ok(Json(ApiResponse::success(accounts)))
}

/// POST /admin/users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewAccount>,
) -> Result<(StatusCode, Json<ApiResponse<AccountInfo>>), ApiError> {
    let account = state.account_service().create_account(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(account))))
}

/// GET /admin/users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<AccountDetail>>, ApiError> {
    let id = validate_account_id(id)?;
    let service = state.account_service();

    let account = service.get_account(id).await?;
    let is_protected = service.is_protected(id).await?;

    Ok(Json(ApiResponse::success(AccountDetail {
        account,
        is_protected,
    })))
}

/// PUT /admin/users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<AccountUpdate>,
) -> Result<Json<ApiResponse<AccountInfo>>, ApiError> {
    let id = validate_account_id(id)?;
    let account = state.account_service().update_account(id, payload).await?;
    Ok(Json(ApiResponse::success(account)))
}

/// PUT /admin/users/{id}/active
pub async fn set_user_active(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<SetActiveRequest>,
) -> Result<Json<ApiResponse<AccountInfo>>, ApiError> {
    let id = validate_account_id(id)?;
    let account = state
        .account_service()
        .set_active(id, payload.active)
        .await?;
    Ok(Json(ApiResponse::success(account)))
}

/// DELETE /admin/users/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_account_id(id)?;
    state.account_service().delete_account(id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "Account {id} deleted"
    )))))
}
