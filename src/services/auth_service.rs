//! Domain service for authentication.
//!
//! Handles password logins with consecutive-failure lockout, session
//! account resolution and self-service password changes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::services::account_service::AccountInfo;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Unknown account")]
    UnknownAccount,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account locked until {0}")]
    AccountLocked(DateTime<Utc>),

    #[error("Account disabled")]
    AccountDisabled,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Successful login outcome handed to the session layer.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub account: AccountInfo,
    pub remember: bool,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies a username/password pair.
    ///
    /// Wrong passwords count towards the lockout threshold; reaching it
    /// locks the account for the configured duration. While locked no
    /// attempt is evaluated or counted. A correct password clears the
    /// counter and any lock.
    ///
    /// # Errors
    ///
    /// - [`AuthError::UnknownAccount`] if no account has that username
    /// - [`AuthError::AccountLocked`] if the account is (or just became) locked
    /// - [`AuthError::InvalidCredentials`] on a wrong password below the threshold
    /// - [`AuthError::AccountDisabled`] on a correct password for an inactive account
    async fn attempt_login(
        &self,
        username: &str,
        password: &str,
        remember: bool,
    ) -> Result<LoginResult, AuthError>;

    /// Resolves the account bound to a session, if it still exists.
    async fn current_account(&self, account_id: i32) -> Result<Option<AccountInfo>, AuthError>;

    /// Changes an account's own password.
    ///
    /// Also clears the failed-attempt counter and lock.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if the current password is wrong or
    /// the new one is too short or unchanged.
    async fn change_password(
        &self,
        account_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;
}
