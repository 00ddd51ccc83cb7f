//! Domain service for account administration and self-service profile edits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Language, Theme};
use crate::entities::accounts;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Duplicate {0}")]
    DuplicateKey(String),

    #[error("This account is protected and cannot be modified")]
    ProtectedAccount,

    #[error("Account not found: {0}")]
    NotFound(i32),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AccountError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AccountError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Account as exposed to callers. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountInfo {
    pub id: i32,
    pub username: String,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub is_admin: bool,
    pub is_active: bool,
    pub failed_login_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub theme: Theme,
    pub notifications_enabled: bool,
    pub preferred_language: Language,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl AccountInfo {
    /// Nickname when set, username otherwise.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.username)
    }
}

impl From<accounts::Model> for AccountInfo {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            nickname: model.nickname,
            email: model.email,
            is_admin: model.is_admin,
            is_active: model.is_active,
            failed_login_attempts: model.failed_login_attempts,
            locked_until: model.locked_until,
            theme: model.theme.parse().unwrap_or_default(),
            notifications_enabled: model.notifications_enabled,
            preferred_language: model.preferred_language.parse().unwrap_or_default(),
            created_at: model.created_at,
            updated_at: model.updated_at,
            last_login_at: model.last_login_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub username: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
    #[serde(default)]
    pub preferred_language: Language,
}

const fn default_true() -> bool {
    true
}

/// Administrative edit. `None` leaves a field untouched; an empty email clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountUpdate {
    pub username: Option<String>,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_admin: Option<bool>,
    pub is_active: Option<bool>,
}

/// Self-service profile edit. Blank values clear the field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub nickname: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesUpdate {
    pub theme: Option<String>,
    pub notifications_enabled: Option<bool>,
    pub preferred_language: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default = "default_true")]
    pub only_active: bool,
}

impl Default for AccountFilter {
    fn default() -> Self {
        Self {
            search: None,
            only_active: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountStats {
    pub total: u64,
    pub active: u64,
    pub admins: u64,
    /// Share of active accounts, in percent, rounded to one decimal.
    pub active_percentage: f64,
}

#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    /// # Errors
    ///
    /// - [`AccountError::Validation`] for malformed fields
    /// - [`AccountError::DuplicateKey`] if the username or email is taken
    async fn create_account(&self, new_account: NewAccount) -> Result<AccountInfo, AccountError>;

    async fn get_account(&self, id: i32) -> Result<AccountInfo, AccountError>;

    /// Lists accounts newest first, never including the protected account.
    async fn list_accounts(&self, filter: AccountFilter) -> Result<Vec<AccountInfo>, AccountError>;

    /// # Errors
    ///
    /// Returns [`AccountError::ProtectedAccount`] for the protected account.
    async fn update_account(
        &self,
        id: i32,
        update: AccountUpdate,
    ) -> Result<AccountInfo, AccountError>;

    async fn set_active(&self, id: i32, active: bool) -> Result<AccountInfo, AccountError>;

    async fn delete_account(&self, id: i32) -> Result<(), AccountError>;

    async fn account_stats(&self) -> Result<AccountStats, AccountError>;

    /// Whether `id` is the protected first account.
    async fn is_protected(&self, id: i32) -> Result<bool, AccountError>;

    async fn update_profile(
        &self,
        id: i32,
        update: ProfileUpdate,
    ) -> Result<AccountInfo, AccountError>;

    async fn update_preferences(
        &self,
        id: i32,
        update: PreferencesUpdate,
    ) -> Result<AccountInfo, AccountError>;
}
