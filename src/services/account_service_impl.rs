//! `SeaORM` implementation of the `AccountService` trait.

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, Set, TransactionTrait};
use tracing::info;

use crate::config::SecurityConfig;
use crate::db::{AccountRepository, NewAccountRow, Store};
use crate::domain::{Language, Theme};
use crate::entities::accounts;
use crate::services::account_service::{
    AccountError, AccountFilter, AccountInfo, AccountService, AccountStats, AccountUpdate,
    NewAccount, PreferencesUpdate, ProfileUpdate,
};
use crate::services::password::hash_password_blocking;
use crate::services::validation::{
    validate_email, validate_nickname, validate_password, validate_username,
};

pub struct SeaOrmAccountService {
    store: Store,
    security: SecurityConfig,
}

/// Maps a unique-index violation that slipped past the pre-checks.
fn insert_error(err: anyhow::Error) -> AccountError {
    let unique = err
        .chain()
        .any(|cause| cause.to_string().contains("UNIQUE constraint failed"));
    if unique {
        AccountError::DuplicateKey("username or email".to_string())
    } else {
        AccountError::from(err)
    }
}

async fn ensure_email_free<C: ConnectionTrait>(
    repo: &AccountRepository<'_, C>,
    email: Option<&str>,
    exclude: Option<i32>,
) -> Result<(), AccountError> {
    if let Some(email) = email
        && repo.email_taken(email, exclude).await?
    {
        return Err(AccountError::DuplicateKey(format!("email: {email}")));
    }
    Ok(())
}

impl SeaOrmAccountService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    async fn ensure_not_protected<C: ConnectionTrait>(
        repo: &AccountRepository<'_, C>,
        id: i32,
    ) -> Result<(), AccountError> {
        if repo.first_account_id().await? == Some(id) {
            return Err(AccountError::ProtectedAccount);
        }
        Ok(())
    }

    async fn hash_if_present(&self, password: Option<&str>) -> Result<Option<String>, AccountError> {
        let Some(password) = password.filter(|p| !p.is_empty()) else {
            return Ok(None);
        };

        validate_password(password, self.security.min_password_length)
            .map_err(AccountError::Validation)?;

        Ok(Some(hash_password_blocking(password, &self.security).await?))
    }
}

#[async_trait]
impl AccountService for SeaOrmAccountService {
    async fn create_account(&self, new_account: NewAccount) -> Result<AccountInfo, AccountError> {
        let username = validate_username(&new_account.username)
            .map_err(AccountError::Validation)?
            .to_string();

        let nickname = match new_account.nickname.as_deref() {
            Some(nickname) => validate_nickname(nickname).map_err(AccountError::Validation)?,
            None => None,
        }
        .map_or_else(|| username.clone(), str::to_string);

        let email = match new_account.email.as_deref() {
            Some(email) => validate_email(email).map_err(AccountError::Validation)?,
            None => None,
        }
        .map(str::to_string);

        validate_password(&new_account.password, self.security.min_password_length)
            .map_err(AccountError::Validation)?;

        let repo = self.store.accounts();

        if repo.username_taken(&username, None).await? {
            return Err(AccountError::DuplicateKey(format!("username: {username}")));
        }
        ensure_email_free(&repo, email.as_deref(), None).await?;

        let password_hash = hash_password_blocking(&new_account.password, &self.security).await?;

        let created = repo
            .insert(NewAccountRow {
                username,
                nickname: Some(nickname),
                email,
                password_hash,
                is_admin: new_account.is_admin,
                is_active: new_account.is_active,
                theme: new_account.theme.to_string(),
                notifications_enabled: new_account.notifications_enabled,
                preferred_language: new_account.preferred_language.to_string(),
            })
            .await
            .map_err(insert_error)?;

        info!(
            username = %created.username,
            account_id = created.id,
            is_admin = created.is_admin,
            "Account created"
        );

        Ok(AccountInfo::from(created))
    }

    async fn get_account(&self, id: i32) -> Result<AccountInfo, AccountError> {
        self.store
            .accounts()
            .get(id)
            .await?
            .map(AccountInfo::from)
            .ok_or(AccountError::NotFound(id))
    }

    async fn list_accounts(&self, filter: AccountFilter) -> Result<Vec<AccountInfo>, AccountError> {
        let repo = self.store.accounts();
        let protected = repo.first_account_id().await?;

        let accounts = repo
            .list(filter.search.as_deref(), filter.only_active, protected)
            .await?;

        Ok(accounts.into_iter().map(AccountInfo::from).collect())
    }

    async fn update_account(
        &self,
        id: i32,
        update: AccountUpdate,
    ) -> Result<AccountInfo, AccountError> {
        // Refuse before validating or hashing anything.
        Self::ensure_not_protected(&self.store.accounts(), id).await?;

        let username = update
            .username
            .as_deref()
            .map(validate_username)
            .transpose()
            .map_err(AccountError::Validation)?
            .map(str::to_string);

        let nickname = update
            .nickname
            .as_deref()
            .map(validate_nickname)
            .transpose()
            .map_err(AccountError::Validation)?;

        let email = update
            .email
            .as_deref()
            .map(validate_email)
            .transpose()
            .map_err(AccountError::Validation)?;

        let password_hash = self.hash_if_present(update.password.as_deref()).await?;

        let txn = self.store.conn.begin().await?;
        let repo = AccountRepository::new(&txn);

        Self::ensure_not_protected(&repo, id).await?;

        let account = repo.get(id).await?.ok_or(AccountError::NotFound(id))?;
        let mut active: accounts::ActiveModel = account.clone().into();

        if let Some(username) = username
            && username != account.username
        {
            if repo.username_taken(&username, Some(id)).await? {
                return Err(AccountError::DuplicateKey(format!("username: {username}")));
            }
            active.username = Set(username);
        }

        // A blank nickname leaves the current one in place.
        if let Some(Some(nickname)) = nickname {
            active.nickname = Set(Some(nickname.to_string()));
        }

        if let Some(email) = email {
            ensure_email_free(&repo, email, Some(id)).await?;
            active.email = Set(email.map(str::to_string));
        }

        if let Some(hash) = password_hash {
            active.password_hash = Set(hash);
        }

        if let Some(is_admin) = update.is_admin {
            active.is_admin = Set(is_admin);
        }

        if let Some(is_active) = update.is_active {
            active.is_active = Set(is_active);
        }

        let updated = repo.update(active).await.map_err(insert_error)?;
        txn.commit().await?;

        info!(username = %updated.username, account_id = id, "Account updated");
        Ok(AccountInfo::from(updated))
    }

    async fn set_active(&self, id: i32, active: bool) -> Result<AccountInfo, AccountError> {
        let txn = self.store.conn.begin().await?;
        let repo = AccountRepository::new(&txn);

        Self::ensure_not_protected(&repo, id).await?;

        let account = repo.get(id).await?.ok_or(AccountError::NotFound(id))?;
        if account.is_active == active {
            return Ok(AccountInfo::from(account));
        }

        let mut model: accounts::ActiveModel = account.into();
        model.is_active = Set(active);
        let updated = repo.update(model).await?;
        txn.commit().await?;

        info!(
            username = %updated.username,
            account_id = id,
            active,
            "Account active flag changed"
        );
        Ok(AccountInfo::from(updated))
    }

    async fn delete_account(&self, id: i32) -> Result<(), AccountError> {
        let txn = self.store.conn.begin().await?;
        let repo = AccountRepository::new(&txn);

        Self::ensure_not_protected(&repo, id).await?;

        if !repo.delete(id).await? {
            return Err(AccountError::NotFound(id));
        }
        txn.commit().await?;

        info!(account_id = id, "Account deleted");
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    async fn account_stats(&self) -> Result<AccountStats, AccountError> {
        let repo = self.store.accounts();
        let total = repo.count_total().await?;
        let active = repo.count_active().await?;
        let admins = repo.count_admins().await?;

        let active_percentage = if total == 0 {
            0.0
        } else {
            (active as f64 / total as f64 * 1000.0).round() / 10.0
        };

        Ok(AccountStats {
            total,
            active,
            admins,
            active_percentage,
        })
    }

    async fn is_protected(&self, id: i32) -> Result<bool, AccountError> {
        Ok(self.store.accounts().first_account_id().await? == Some(id))
    }

    async fn update_profile(
        &self,
        id: i32,
        update: ProfileUpdate,
    ) -> Result<AccountInfo, AccountError> {
        let nickname = update
            .nickname
            .as_deref()
            .map(validate_nickname)
            .transpose()
            .map_err(AccountError::Validation)?;

        let email = update
            .email
            .as_deref()
            .map(validate_email)
            .transpose()
            .map_err(AccountError::Validation)?;

        let txn = self.store.conn.begin().await?;
        let repo = AccountRepository::new(&txn);

        let account = repo.get(id).await?.ok_or(AccountError::NotFound(id))?;
        let mut active: accounts::ActiveModel = account.into();

        if let Some(nickname) = nickname {
            active.nickname = Set(nickname.map(str::to_string));
        }

        if let Some(email) = email {
            ensure_email_free(&repo, email, Some(id)).await?;
            active.email = Set(email.map(str::to_string));
        }

        let updated = repo.update(active).await.map_err(insert_error)?;
        txn.commit().await?;

        info!(username = %updated.username, account_id = id, "Profile updated");
        Ok(AccountInfo::from(updated))
    }

    async fn update_preferences(
        &self,
        id: i32,
        update: PreferencesUpdate,
    ) -> Result<AccountInfo, AccountError> {
        let theme = update
            .theme
            .as_deref()
            .map(str::trim)
            .map(str::parse::<Theme>)
            .transpose()
            .map_err(AccountError::Validation)?;

        let language = update
            .preferred_language
            .as_deref()
            .map(str::trim)
            .map(str::parse::<Language>)
            .transpose()
            .map_err(AccountError::Validation)?;

        let txn = self.store.conn.begin().await?;
        let repo = AccountRepository::new(&txn);

        let account = repo.get(id).await?.ok_or(AccountError::NotFound(id))?;
        let mut active: accounts::ActiveModel = account.into();

        if let Some(theme) = theme {
            active.theme = Set(theme.to_string());
        }
        if let Some(language) = language {
            active.preferred_language = Set(language.to_string());
        }
        if let Some(enabled) = update.notifications_enabled {
            active.notifications_enabled = Set(enabled);
        }

        let updated = repo.update(active).await?;
        txn.commit().await?;

        info!(account_id = id, "Preferences updated");
        Ok(AccountInfo::from(updated))
    }
}
