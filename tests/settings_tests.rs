//! Settings store behaviour against an in-memory database.

use ffe_tracker::config::Config;
use ffe_tracker::services::{SettingValue, SettingsError, SettingsService};
use ffe_tracker::state::SharedState;
use std::collections::BTreeMap;

async fn spawn_state() -> SharedState {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    SharedState::new(config)
        .await
        .expect("failed to create state")
}

#[tokio::test]
async fn test_unstored_keys_resolve_to_defaults() {
    let state = spawn_state().await;
    let settings = &state.settings_service;

    assert_eq!(
        settings.get("enable_audit_log", None).await.unwrap(),
        Some(SettingValue::Bool(true))
    );
    assert_eq!(
        settings.get("upload_max_size_mb", None).await.unwrap(),
        Some(SettingValue::Integer(50))
    );
    assert_eq!(
        settings.get("report_watermark_opacity", None).await.unwrap(),
        Some(SettingValue::Float(0.3))
    );
    assert_eq!(settings.get("no_such_key", None).await.unwrap(), None);
    assert_eq!(
        settings
            .get("no_such_key", Some(SettingValue::from("fallback")))
            .await
            .unwrap(),
        Some(SettingValue::Text("fallback".to_string()))
    );

    let all = settings.get_all().await.unwrap();
    assert_eq!(all.len(), 12);
    assert_eq!(all["maintenance_mode"], SettingValue::Bool(false));
}

#[tokio::test]
async fn test_save_trims_and_coerces() {
    let state = spawn_state().await;
    let settings = &state.settings_service;

    let entry = settings
        .save("session_timeout_minutes", "  45 ", None)
        .await
        .unwrap();
    assert_eq!(entry.raw, "45");
    assert_eq!(entry.value, SettingValue::Integer(45));
    assert!(entry.stored);
    assert_eq!(
        entry.description.as_deref(),
        Some("Idle session timeout (minutes)")
    );

    let entry = settings.save("custom_banner", "Hello", None).await.unwrap();
    assert_eq!(
        entry.description.as_deref(),
        Some("System setting - custom_banner")
    );
    assert_eq!(
        settings.get("custom_banner", None).await.unwrap(),
        Some(SettingValue::Text("Hello".to_string()))
    );
}

#[tokio::test]
async fn test_keys_are_trimmed_on_read_and_write() {
    let state = spawn_state().await;
    let settings = &state.settings_service;

    settings.save(" custom_banner ", "Hello", None).await.unwrap();
    assert_eq!(
        settings.get(" custom_banner ", None).await.unwrap(),
        Some(SettingValue::Text("Hello".to_string()))
    );

    settings.save("upload_max_files", "40", None).await.unwrap();
    assert_eq!(
        settings.get("  upload_max_files", None).await.unwrap(),
        Some(SettingValue::Integer(40))
    );
}

#[tokio::test]
async fn test_save_rejects_blank_key() {
    let state = spawn_state().await;
    let err = state
        .settings_service
        .save("   ", "value", None)
        .await
        .unwrap_err();
    assert!(matches!(err, SettingsError::Validation(_)));
}

#[tokio::test]
async fn test_save_bulk_skips_unknown_keys() {
    let state = spawn_state().await;
    let settings = &state.settings_service;

    let mut values = BTreeMap::new();
    values.insert("upload_max_size_mb".to_string(), "75".to_string());
    values.insert("totally_unknown".to_string(), "x".to_string());

    assert_eq!(settings.save_bulk(values).await.unwrap(), 1);
    assert_eq!(
        settings.get("upload_max_size_mb", None).await.unwrap(),
        Some(SettingValue::Integer(75))
    );
    assert_eq!(settings.get("totally_unknown", None).await.unwrap(), None);

    // Keys stored earlier are accepted even outside the schema.
    settings.save("custom_banner", "Hello", None).await.unwrap();
    let mut values = BTreeMap::new();
    values.insert("custom_banner".to_string(), "Bye".to_string());
    assert_eq!(settings.save_bulk(values).await.unwrap(), 1);
    assert_eq!(
        settings.get("custom_banner", None).await.unwrap(),
        Some(SettingValue::Text("Bye".to_string()))
    );
}

#[tokio::test]
async fn test_reset_to_default() {
    let state = spawn_state().await;
    let settings = &state.settings_service;

    settings.save("maintenance_mode", "true", None).await.unwrap();
    settings.save("upload_max_files", "99", None).await.unwrap();

    assert_eq!(
        settings.reset_to_default(Some("maintenance_mode")).await.unwrap(),
        1
    );
    assert_eq!(
        settings.get("maintenance_mode", None).await.unwrap(),
        Some(SettingValue::Bool(false))
    );
    assert_eq!(
        settings.get("upload_max_files", None).await.unwrap(),
        Some(SettingValue::Integer(99))
    );

    assert_eq!(settings.reset_to_default(Some("unknown")).await.unwrap(), 0);

    assert_eq!(settings.reset_to_default(None).await.unwrap(), 12);
    assert_eq!(
        settings.get("upload_max_files", None).await.unwrap(),
        Some(SettingValue::Integer(20))
    );
}

#[tokio::test]
async fn test_list_entries_orders_schema_first() {
    let state = spawn_state().await;
    let settings = &state.settings_service;

    settings.save("aaa_custom", "1", None).await.unwrap();
    settings.save("log_retention_days", "30", None).await.unwrap();

    let entries = settings.list_entries().await.unwrap();
    assert_eq!(entries.len(), 13);
    assert_eq!(entries[0].key, "upload_max_size_mb");
    assert!(!entries[0].stored);
    assert_eq!(entries.last().unwrap().key, "aaa_custom");

    let retention = entries
        .iter()
        .find(|e| e.key == "log_retention_days")
        .unwrap();
    assert!(retention.stored);
    assert_eq!(retention.value, SettingValue::Integer(30));
    assert_eq!(retention.default.as_deref(), Some("90"));
}
