//! `SeaORM` implementation of the `SettingsService` trait.

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, TransactionTrait};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::db::{SettingRepository, Store};
use crate::entities::settings;
use crate::services::settings_service::{
    MAX_KEY_LEN, SETTING_DEFAULTS, SettingEntry, SettingValue, SettingsError, SettingsService,
    generated_description, schema_default,
};

pub struct SeaOrmSettingsService {
    store: Store,
}

fn validate_key(key: &str) -> Result<&str, SettingsError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(SettingsError::Validation(
            "Setting key cannot be empty".to_string(),
        ));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(SettingsError::Validation(format!(
            "Setting key must be {MAX_KEY_LEN} characters or less"
        )));
    }
    Ok(key)
}

fn entry_from_row(row: settings::Model) -> SettingEntry {
    SettingEntry {
        value: SettingValue::coerce(&row.value),
        default: schema_default(&row.key).map(|d| d.value.to_string()),
        key: row.key,
        raw: row.value,
        description: row.description,
        stored: true,
        updated_at: Some(row.updated_at),
    }
}

/// Upserts one key on `conn`, which may be a transaction.
async fn write_setting<C: ConnectionTrait>(
    conn: &C,
    key: &str,
    value: &str,
    description: Option<&str>,
) -> Result<settings::Model, SettingsError> {
    let value = value.trim();
    let description = description.map(str::trim).filter(|d| !d.is_empty());
    let fallback = schema_default(key)
        .map_or_else(|| generated_description(key), |d| d.description.to_string());

    let row = SettingRepository::new(conn)
        .upsert(key, value, description, &fallback)
        .await?;
    Ok(row)
}

impl SeaOrmSettingsService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SettingsService for SeaOrmSettingsService {
    async fn get_all(&self) -> Result<BTreeMap<String, SettingValue>, SettingsError> {
        let mut result: BTreeMap<String, SettingValue> = SETTING_DEFAULTS
            .iter()
            .map(|d| (d.key.to_string(), SettingValue::coerce(d.value)))
            .collect();

        for row in self.store.settings().all().await? {
            result.insert(row.key, SettingValue::coerce(&row.value));
        }

        Ok(result)
    }

    async fn get(
        &self,
        key: &str,
        fallback: Option<SettingValue>,
    ) -> Result<Option<SettingValue>, SettingsError> {
        let key = key.trim();
        if let Some(row) = self.store.settings().get(key).await? {
            return Ok(Some(SettingValue::coerce(&row.value)));
        }

        Ok(schema_default(key)
            .map(|d| SettingValue::coerce(d.value))
            .or(fallback))
    }

    async fn save(
        &self,
        key: &str,
        value: &str,
        description: Option<&str>,
    ) -> Result<SettingEntry, SettingsError> {
        let key = validate_key(key)?;
        let row = write_setting(&self.store.conn, key, value, description).await?;

        info!(key, value = %row.value, "Setting saved");
        Ok(entry_from_row(row))
    }

    async fn save_bulk(&self, values: BTreeMap<String, String>) -> Result<usize, SettingsError> {
        let txn = self.store.conn.begin().await?;
        let repo = SettingRepository::new(&txn);

        let mut written = 0;
        for (key, value) in &values {
            let known = schema_default(key).is_some() || repo.get(key).await?.is_some();
            if !known {
                warn!(key, "Ignoring unknown setting key");
                continue;
            }
            write_setting(&txn, key, value, None).await?;
            written += 1;
        }

        txn.commit().await?;

        info!(written, submitted = values.len(), "Bulk settings update");
        Ok(written)
    }

    async fn reset_to_default(&self, key: Option<&str>) -> Result<usize, SettingsError> {
        let targets: Vec<_> = match key {
            Some(key) => schema_default(key.trim()).into_iter().collect(),
            None => SETTING_DEFAULTS.iter().collect(),
        };

        if targets.is_empty() {
            warn!(key = key.unwrap_or_default(), "Reset requested for unknown setting key");
            return Ok(0);
        }

        let txn = self.store.conn.begin().await?;
        for default in &targets {
            write_setting(&txn, default.key, default.value, None).await?;
        }
        txn.commit().await?;

        warn!(count = targets.len(), "Settings reset to defaults");
        Ok(targets.len())
    }

    async fn list_entries(&self) -> Result<Vec<SettingEntry>, SettingsError> {
        let mut stored: BTreeMap<String, settings::Model> = self
            .store
            .settings()
            .all()
            .await?
            .into_iter()
            .map(|row| (row.key.clone(), row))
            .collect();

        let mut entries = Vec::with_capacity(SETTING_DEFAULTS.len() + stored.len());

        for default in SETTING_DEFAULTS {
            let entry = match stored.remove(default.key) {
                Some(row) => entry_from_row(row),
                None => SettingEntry {
                    key: default.key.to_string(),
                    value: SettingValue::coerce(default.value),
                    raw: default.value.to_string(),
                    description: Some(default.description.to_string()),
                    default: Some(default.value.to_string()),
                    stored: false,
                    updated_at: None,
                },
            };
            entries.push(entry);
        }

        entries.extend(stored.into_values().map(entry_from_row));
        Ok(entries)
    }
}
