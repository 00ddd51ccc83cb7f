//! Domain service for the global settings key-value store.
//!
//! Values are persisted as text and coerced to a [`SettingValue`] on every
//! read. Keys that were never written resolve to their schema default.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub const MAX_KEY_LEN: usize = 128;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for SettingsError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for SettingsError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// One schema key with its default text and description.
#[derive(Debug, Clone, Copy)]
pub struct SettingDefault {
    pub key: &'static str,
    pub value: &'static str,
    pub description: &'static str,
}

pub static SETTING_DEFAULTS: &[SettingDefault] = &[
    SettingDefault {
        key: "upload_max_size_mb",
        value: "50",
        description: "Maximum upload size per file (MB)",
    },
    SettingDefault {
        key: "upload_max_files",
        value: "20",
        description: "Maximum number of files per upload",
    },
    SettingDefault {
        key: "upload_allowed_extensions",
        value: "pdf,doc,docx,xls,xlsx,jpg,png,jpeg,zip,rar",
        description: "Comma-separated list of accepted file extensions",
    },
    SettingDefault {
        key: "session_timeout_minutes",
        value: "30",
        description: "Idle session timeout (minutes)",
    },
    SettingDefault {
        key: "login_max_failures",
        value: "5",
        description: "Failed logins before an account is locked",
    },
    SettingDefault {
        key: "login_lock_minutes",
        value: "30",
        description: "Account lock duration (minutes)",
    },
    SettingDefault {
        key: "enable_audit_log",
        value: "true",
        description: "Record audit log entries",
    },
    SettingDefault {
        key: "log_retention_days",
        value: "90",
        description: "Days to keep log entries",
    },
    SettingDefault {
        key: "report_watermark_text",
        value: "FFE Project Tracking System - Internal Use",
        description: "Watermark printed on generated reports",
    },
    SettingDefault {
        key: "report_watermark_opacity",
        value: "0.3",
        description: "Watermark opacity (0-1)",
    },
    SettingDefault {
        key: "maintenance_mode",
        value: "false",
        description: "Maintenance mode",
    },
    SettingDefault {
        key: "allow_registration",
        value: "false",
        description: "Allow self-registration",
    },
];

#[must_use]
pub fn schema_default(key: &str) -> Option<&'static SettingDefault> {
    SETTING_DEFAULTS.iter().find(|d| d.key == key)
}

#[must_use]
pub fn generated_description(key: &str) -> String {
    format!("System setting - {key}")
}

/// Typed view of a stored setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl SettingValue {
    /// Reconstructs a typed value from its stored text.
    ///
    /// Tried in order: `true`/`false` in any case, plain ASCII digits,
    /// digits separated by dots that parse as a float, then text.
    #[must_use]
    pub fn coerce(raw: &str) -> Self {
        let value = raw.trim();

        if value.eq_ignore_ascii_case("true") {
            return Self::Bool(true);
        }
        if value.eq_ignore_ascii_case("false") {
            return Self::Bool(false);
        }

        if !value.is_empty()
            && value.bytes().all(|b| b.is_ascii_digit())
            && let Ok(n) = value.parse::<i64>()
        {
            return Self::Integer(n);
        }

        if value.contains('.')
            && value.bytes().any(|b| b.is_ascii_digit())
            && value.bytes().all(|b| b.is_ascii_digit() || b == b'.')
            && let Ok(f) = value.parse::<f64>()
        {
            return Self::Float(f);
        }

        Self::Text(value.to_string())
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A setting as shown on the admin page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingEntry {
    pub key: String,
    pub value: SettingValue,
    pub raw: String,
    pub description: Option<String>,
    pub default: Option<String>,
    /// False while the key still resolves to its schema default.
    pub stored: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

#[async_trait::async_trait]
pub trait SettingsService: Send + Sync {
    /// Every schema key at its effective value, plus stored keys outside the schema.
    async fn get_all(&self) -> Result<BTreeMap<String, SettingValue>, SettingsError>;

    /// Stored value, else schema default, else `fallback`.
    async fn get(
        &self,
        key: &str,
        fallback: Option<SettingValue>,
    ) -> Result<Option<SettingValue>, SettingsError>;

    /// Writes one key. The value is trimmed before it is stored.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Validation`] for an empty or over-long key.
    async fn save(
        &self,
        key: &str,
        value: &str,
        description: Option<&str>,
    ) -> Result<SettingEntry, SettingsError>;

    /// Writes every key that is in the schema or already stored; others are skipped.
    ///
    /// Returns the number of keys written.
    async fn save_bulk(&self, values: BTreeMap<String, String>) -> Result<usize, SettingsError>;

    /// Resets one schema key, or all of them when `key` is `None`.
    ///
    /// Returns the number of keys reset; an unknown key resets nothing.
    async fn reset_to_default(&self, key: Option<&str>) -> Result<usize, SettingsError>;

    /// Schema keys first (in schema order), then other stored keys by name.
    async fn list_entries(&self) -> Result<Vec<SettingEntry>, SettingsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerces_booleans_case_insensitively() {
        assert_eq!(SettingValue::coerce("true"), SettingValue::Bool(true));
        assert_eq!(SettingValue::coerce(" FALSE "), SettingValue::Bool(false));
        assert_eq!(SettingValue::coerce("True"), SettingValue::Bool(true));
    }

    #[test]
    fn coerces_numbers() {
        assert_eq!(SettingValue::coerce("75"), SettingValue::Integer(75));
        assert_eq!(SettingValue::coerce("0.3"), SettingValue::Float(0.3));
        assert_eq!(SettingValue::coerce("-5"), SettingValue::Text("-5".to_string()));
    }

    #[test]
    fn malformed_numbers_stay_text() {
        assert_eq!(
            SettingValue::coerce("1.2.3"),
            SettingValue::Text("1.2.3".to_string())
        );
        assert_eq!(SettingValue::coerce("."), SettingValue::Text(".".to_string()));
        assert_eq!(SettingValue::coerce(""), SettingValue::Text(String::new()));
        assert_eq!(
            SettingValue::coerce("pdf,doc"),
            SettingValue::Text("pdf,doc".to_string())
        );
    }

    #[test]
    fn display_matches_stored_form() {
        assert_eq!(SettingValue::Bool(true).to_string(), "true");
        assert_eq!(SettingValue::Float(0.3).to_string(), "0.3");
        assert_eq!(SettingValue::Float(75.0).to_string(), "75");
        assert_eq!(SettingValue::from("abc").to_string(), "abc");
    }

    #[test]
    fn schema_has_every_default() {
        assert_eq!(SETTING_DEFAULTS.len(), 12);
        assert_eq!(schema_default("enable_audit_log").unwrap().value, "true");
        assert!(schema_default("unknown_key").is_none());
        for default in SETTING_DEFAULTS {
            assert_eq!(
                SETTING_DEFAULTS.iter().filter(|d| d.key == default.key).count(),
                1
            );
        }
    }

    #[test]
    fn typed_accessors() {
        assert_eq!(SettingValue::coerce("true").as_bool(), Some(true));
        assert_eq!(SettingValue::coerce("20").as_i64(), Some(20));
        assert_eq!(SettingValue::coerce("20").as_f64(), Some(20.0));
        assert_eq!(SettingValue::coerce("0.5").as_f64(), Some(0.5));
        assert_eq!(SettingValue::coerce("zip,rar").as_str(), Some("zip,rar"));
        assert_eq!(SettingValue::coerce("zip,rar").as_bool(), None);
    }

    #[test]
    fn untagged_serialization() {
        assert_eq!(serde_json::to_string(&SettingValue::Integer(5)).unwrap(), "5");
        assert_eq!(serde_json::to_string(&SettingValue::Bool(false)).unwrap(), "false");
        assert_eq!(
            serde_json::to_string(&SettingValue::from("x")).unwrap(),
            "\"x\""
        );
    }
}
