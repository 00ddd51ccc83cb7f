//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::TransactionTrait;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::db::{AccountRepository, Store};
use crate::domain::LockoutPolicy;
use crate::services::account_service::AccountInfo;
use crate::services::auth_service::{AuthError, AuthService, LoginResult};
use crate::services::password::{hash_password_blocking, needs_rehash, verify_password_blocking};
use crate::services::validation::validate_password;

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
    policy: LockoutPolicy,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(store: Store, security: SecurityConfig) -> Self {
        let policy = security.login_lockout.policy();
        Self {
            store,
            security,
            policy,
        }
    }

    /// Counts one wrong password, locking the account once the threshold is hit.
    async fn register_failure(&self, account_id: i32, username: &str) -> AuthError {
        match self.persist_failure(account_id).await {
            Ok((attempts, Some(until))) => {
                metrics::counter!("auth_login_attempts_total", "outcome" => "locked").increment(1);
                metrics::counter!("auth_lockouts_total").increment(1);
                warn!(
                    username,
                    account_id,
                    attempts,
                    locked_until = %until,
                    "Account locked after repeated login failures"
                );
                AuthError::AccountLocked(until)
            }
            Ok((attempts, None)) => {
                metrics::counter!("auth_login_attempts_total", "outcome" => "invalid_password")
                    .increment(1);
                warn!(username, account_id, attempts, "Login failed: wrong password");
                AuthError::InvalidCredentials
            }
            Err(err) => err,
        }
    }

    async fn persist_failure(
        &self,
        account_id: i32,
    ) -> Result<(i32, Option<chrono::DateTime<Utc>>), AuthError> {
        let txn = self.store.conn.begin().await?;
        let repo = AccountRepository::new(&txn);

        let account = repo
            .get(account_id)
            .await?
            .ok_or(AuthError::UnknownAccount)?;

        let (attempts, locked_until) = self
            .policy
            .register_failure(account.failed_login_attempts, Utc::now());
        repo.record_failure(account, attempts, locked_until).await?;

        txn.commit().await?;
        Ok((attempts, locked_until))
    }

    async fn upgraded_hash(&self, password: &str, current_hash: &str) -> Option<String> {
        if !self.security.auto_migrate_password_hashes || !needs_rehash(current_hash, &self.security)
        {
            return None;
        }

        match hash_password_blocking(password, &self.security).await {
            Ok(hash) => Some(hash),
            Err(e) => {
                warn!(error = %e, "Failed to upgrade password hash");
                None
            }
        }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn attempt_login(
        &self,
        username: &str,
        password: &str,
        remember: bool,
    ) -> Result<LoginResult, AuthError> {
        let username = username.trim();

        let Some(account) = self.store.accounts().get_by_username(username).await? else {
            metrics::counter!("auth_login_attempts_total", "outcome" => "unknown_account")
                .increment(1);
            warn!(username, "Login attempt for unknown account");
            return Err(AuthError::UnknownAccount);
        };

        if let Some(until) = self.policy.active_lock(account.locked_until, Utc::now()) {
            metrics::counter!("auth_login_attempts_total", "outcome" => "locked").increment(1);
            warn!(username, locked_until = %until, "Login attempt on locked account");
            return Err(AuthError::AccountLocked(until));
        }

        let is_valid = verify_password_blocking(password, &account.password_hash).await?;
        if !is_valid {
            return Err(self.register_failure(account.id, username).await);
        }

        if !account.is_active {
            metrics::counter!("auth_login_attempts_total", "outcome" => "disabled").increment(1);
            warn!(username, account_id = account.id, "Login attempt on disabled account");
            return Err(AuthError::AccountDisabled);
        }

        let rehashed = self.upgraded_hash(password, &account.password_hash).await;
        let migrated = rehashed.is_some();

        let txn = self.store.conn.begin().await?;
        let repo = AccountRepository::new(&txn);
        let fresh = repo
            .get(account.id)
            .await?
            .ok_or(AuthError::UnknownAccount)?;
        let updated = repo.record_success(fresh, Utc::now(), rehashed).await?;
        txn.commit().await?;

        if migrated {
            info!(username, "Password hash migrated to current Argon2 params");
        }

        metrics::counter!("auth_login_attempts_total", "outcome" => "success").increment(1);
        info!(username, account_id = updated.id, "Login successful");

        Ok(LoginResult {
            account: AccountInfo::from(updated),
            remember,
        })
    }

    async fn current_account(&self, account_id: i32) -> Result<Option<AccountInfo>, AuthError> {
        let account = self.store.accounts().get(account_id).await?;
        Ok(account.map(AccountInfo::from))
    }

    async fn change_password(
        &self,
        account_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_password(new_password, self.security.min_password_length)
            .map_err(AuthError::Validation)?;

        if current_password == new_password {
            return Err(AuthError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let account = self
            .store
            .accounts()
            .get(account_id)
            .await?
            .ok_or(AuthError::UnknownAccount)?;

        let is_valid = verify_password_blocking(current_password, &account.password_hash).await?;
        if !is_valid {
            return Err(AuthError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        let new_hash = hash_password_blocking(new_password, &self.security).await?;
        let username = account.username.clone();
        self.store
            .accounts()
            .set_password_hash(account, new_hash)
            .await?;

        info!(username = %username, account_id, "Password changed");
        Ok(())
    }
}
