use axum::{
    Extension, Json,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::{Expiry, Session};

use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::services::AccountInfo;

/// Session key holding the signed-in account id.
pub const ACCOUNT_ID_KEY: &str = "account_id";

/// Account resolved by [`auth_middleware`] for the current request.
#[derive(Debug, Clone)]
pub struct CurrentAccount(pub AccountInfo);

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the session's account on every request.
///
/// Sessions pointing at a deleted or disabled account are flushed.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let account_id = session
        .get::<i32>(ACCOUNT_ID_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to read session: {e}")))?
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    let account = state
        .auth_service()
        .current_account(account_id)
        .await?
        .filter(|account| account.is_active);

    let Some(account) = account else {
        tracing::warn!(account_id, "Session references a missing or disabled account");
        let _ = session.flush().await;
        return Err(ApiError::unauthorized("Session is no longer valid"));
    };

    tracing::Span::current().record("user_id", account.id);
    request.extensions_mut().insert(CurrentAccount(account));

    Ok(next.run(request).await)
}

/// Rejects accounts without the administrator flag. Runs after [`auth_middleware`].
pub async fn require_admin(
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !account.is_admin {
        tracing::warn!(account_id = account.id, "Non-admin access to admin route");
        return Err(ApiError::forbidden("Administrator privileges required"));
    }
    Ok(next.run(request).await)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AccountInfo>>, ApiError> {
    if payload.username.trim().is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let result = state
        .auth_service()
        .attempt_login(&payload.username, &payload.password, payload.remember)
        .await?;

    // Fresh id on privilege change.
    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;
    session
        .insert(ACCOUNT_ID_KEY, result.account.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    let expiry = if result.remember {
        Expiry::OnInactivity(state.config().server.session_lifetime())
    } else {
        Expiry::OnSessionEnd
    };
    session.set_expiry(Some(expiry));

    Ok(Json(ApiResponse::success(result.account)))
}

/// POST /auth/logout
pub async fn logout(session: Session) -> Json<ApiResponse<MessageResponse>> {
    if let Ok(Some(account_id)) = session.get::<i32>(ACCOUNT_ID_KEY).await {
        tracing::info!(account_id, "Logged out");
    }
    let _ = session.flush().await;
    Json(ApiResponse::success(MessageResponse::new("Logged out")))
}

/// GET /auth/me
pub async fn get_current_account(
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> Json<ApiResponse<AccountInfo>> {
    Json(ApiResponse::success(account))
}
