use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::entities::{accounts, prelude::*};

/// Fields required to insert a new account row.
#[derive(Debug, Clone)]
pub struct NewAccountRow {
    pub username: String,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub password_hash: String,
    pub is_admin: bool,
    pub is_active: bool,
    pub theme: String,
    pub notifications_enabled: bool,
    pub preferred_language: String,
}

/// Account queries, usable on a pooled connection or inside a transaction.
pub struct AccountRepository<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> AccountRepository<'a, C> {
    #[must_use]
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<accounts::Model>> {
        Accounts::find_by_id(id)
            .one(self.conn)
            .await
            .context("Failed to query account by ID")
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<accounts::Model>> {
        Accounts::find()
            .filter(accounts::Column::Username.eq(username))
            .one(self.conn)
            .await
            .context("Failed to query account by username")
    }

    /// Returns true when another account (other than `exclude`) already uses `username`.
    pub async fn username_taken(&self, username: &str, exclude: Option<i32>) -> Result<bool> {
        let mut query = Accounts::find().filter(accounts::Column::Username.eq(username));
        if let Some(id) = exclude {
            query = query.filter(accounts::Column::Id.ne(id));
        }
        let count = query
            .count(self.conn)
            .await
            .context("Failed to check username uniqueness")?;
        Ok(count > 0)
    }

    /// Returns true when another account (other than `exclude`) already uses `email`.
    pub async fn email_taken(&self, email: &str, exclude: Option<i32>) -> Result<bool> {
        let mut query = Accounts::find().filter(accounts::Column::Email.eq(email));
        if let Some(id) = exclude {
            query = query.filter(accounts::Column::Id.ne(id));
        }
        let count = query
            .count(self.conn)
            .await
            .context("Failed to check email uniqueness")?;
        Ok(count > 0)
    }

    /// The lowest account id ever assigned that still exists.
    pub async fn first_account_id(&self) -> Result<Option<i32>> {
        let first = Accounts::find()
            .select_only()
            .column(accounts::Column::Id)
            .order_by_asc(accounts::Column::Id)
            .into_tuple::<i32>()
            .one(self.conn)
            .await
            .context("Failed to query first account")?;
        Ok(first)
    }

    pub async fn insert(&self, row: NewAccountRow) -> Result<accounts::Model> {
        let now = Utc::now();
        let active = accounts::ActiveModel {
            username: Set(row.username),
            nickname: Set(row.nickname),
            password_hash: Set(row.password_hash),
            email: Set(row.email),
            is_admin: Set(row.is_admin),
            is_active: Set(row.is_active),
            failed_login_attempts: Set(0),
            locked_until: Set(None),
            theme: Set(row.theme),
            notifications_enabled: Set(row.notifications_enabled),
            preferred_language: Set(row.preferred_language),
            created_at: Set(now),
            updated_at: Set(now),
            last_login_at: Set(None),
            ..Default::default()
        };

        active
            .insert(self.conn)
            .await
            .context("Failed to insert account")
    }

    /// Persists the changed columns of `active`, stamping `updated_at`.
    pub async fn update(&self, mut active: accounts::ActiveModel) -> Result<accounts::Model> {
        active.updated_at = Set(Utc::now());
        active
            .update(self.conn)
            .await
            .context("Failed to update account")
    }

    /// Lists accounts newest first.
    ///
    /// `search` matches username or nickname as a substring.
    pub async fn list(
        &self,
        search: Option<&str>,
        only_active: bool,
        exclude: Option<i32>,
    ) -> Result<Vec<accounts::Model>> {
        let mut query = Accounts::find()
            .order_by_desc(accounts::Column::CreatedAt)
            .order_by_desc(accounts::Column::Id);

        if let Some(id) = exclude {
            query = query.filter(accounts::Column::Id.ne(id));
        }

        if only_active {
            query = query.filter(accounts::Column::IsActive.eq(true));
        }

        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(accounts::Column::Username.contains(term))
                    .add(accounts::Column::Nickname.contains(term)),
            );
        }

        query
            .all(self.conn)
            .await
            .context("Failed to list accounts")
    }

    pub async fn count_total(&self) -> Result<u64> {
        Accounts::find()
            .count(self.conn)
            .await
            .context("Failed to count accounts")
    }

    pub async fn count_active(&self) -> Result<u64> {
        Accounts::find()
            .filter(accounts::Column::IsActive.eq(true))
            .count(self.conn)
            .await
            .context("Failed to count active accounts")
    }

    pub async fn count_admins(&self) -> Result<u64> {
        Accounts::find()
            .filter(accounts::Column::IsAdmin.eq(true))
            .count(self.conn)
            .await
            .context("Failed to count admin accounts")
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Accounts::delete_by_id(id)
            .exec(self.conn)
            .await
            .context("Failed to delete account")?;
        Ok(result.rows_affected > 0)
    }

    /// Stores the failure counter and optional lock deadline.
    pub async fn record_failure(
        &self,
        account: accounts::Model,
        attempts: i32,
        locked_until: Option<DateTime<Utc>>,
    ) -> Result<accounts::Model> {
        let mut active: accounts::ActiveModel = account.into();
        active.failed_login_attempts = Set(attempts);
        if locked_until.is_some() {
            active.locked_until = Set(locked_until);
        }
        self.update(active).await
    }

    /// Clears the failure state after a successful login.
    pub async fn record_success(
        &self,
        account: accounts::Model,
        at: DateTime<Utc>,
        rehashed: Option<String>,
    ) -> Result<accounts::Model> {
        let mut active: accounts::ActiveModel = account.into();
        active.failed_login_attempts = Set(0);
        active.locked_until = Set(None);
        active.last_login_at = Set(Some(at));
        if let Some(hash) = rehashed {
            active.password_hash = Set(hash);
        }
        self.update(active).await
    }

    /// Replaces the password hash and clears any lock.
    pub async fn set_password_hash(
        &self,
        account: accounts::Model,
        password_hash: String,
    ) -> Result<accounts::Model> {
        let mut active: accounts::ActiveModel = account.into();
        active.password_hash = Set(password_hash);
        active.failed_login_attempts = Set(0);
        active.locked_until = Set(None);
        self.update(active).await
    }
}
