use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::entities::{prelude::*, settings};

pub struct SettingRepository<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> SettingRepository<'a, C> {
    #[must_use]
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn all(&self) -> Result<Vec<settings::Model>> {
        Settings::find()
            .order_by_asc(settings::Column::Key)
            .all(self.conn)
            .await
            .context("Failed to list settings")
    }

    pub async fn get(&self, key: &str) -> Result<Option<settings::Model>> {
        Settings::find()
            .filter(settings::Column::Key.eq(key))
            .one(self.conn)
            .await
            .context("Failed to query setting")
    }

    /// Writes `value` under `key`.
    ///
    /// An existing row keeps its description unless a new one is given.
    /// A new row takes `description`, falling back to `fallback_description`.
    pub async fn upsert(
        &self,
        key: &str,
        value: &str,
        description: Option<&str>,
        fallback_description: &str,
    ) -> Result<settings::Model> {
        let now = Utc::now();

        if let Some(existing) = self.get(key).await? {
            let mut active: settings::ActiveModel = existing.into();
            active.value = Set(value.to_string());
            if let Some(desc) = description {
                active.description = Set(Some(desc.to_string()));
            }
            active.updated_at = Set(now);
            return active
                .update(self.conn)
                .await
                .with_context(|| format!("Failed to update setting {key}"));
        }

        let active = settings::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            description: Set(Some(
                description.unwrap_or(fallback_description).to_string(),
            )),
            updated_at: Set(now),
            ..Default::default()
        };

        active
            .insert(self.conn)
            .await
            .with_context(|| format!("Failed to insert setting {key}"))
    }
}
