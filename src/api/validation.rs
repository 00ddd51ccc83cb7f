use serde_json::Value;
use std::collections::BTreeMap;

use super::ApiError;

pub fn validate_account_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid account ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

/// Inclusive integer ranges accepted by the settings form.
const INTEGER_RANGES: &[(&str, i64, i64)] = &[
    ("upload_max_size_mb", 5, 1024),
    ("upload_max_files", 5, 500),
    ("session_timeout_minutes", 5, 1440),
];

const WATERMARK_TEXT_MAX_LEN: usize = 60;

/// Turns a submitted JSON scalar into the text that gets stored.
fn setting_text(key: &str, value: &Value) -> Result<String, ApiError> {
    match value {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(ApiError::validation(format!(
            "Setting {key} must be a string, number or boolean"
        ))),
    }
}

/// Checks a bulk settings submission and flattens it to stored text.
pub fn validate_settings_form(
    form: &BTreeMap<String, Value>,
) -> Result<BTreeMap<String, String>, ApiError> {
    let mut values = BTreeMap::new();

    for (key, value) in form {
        let text = setting_text(key, value)?;

        if let Some((_, min, max)) = INTEGER_RANGES.iter().find(|(k, _, _)| *k == key.as_str()) {
            let n: i64 = text
                .parse()
                .map_err(|_| ApiError::validation(format!("{key} must be an integer")))?;
            if !(*min..=*max).contains(&n) {
                return Err(ApiError::validation(format!(
                    "{key} must be between {min} and {max}"
                )));
            }
        }

        if key == "report_watermark_text" && text.chars().count() > WATERMARK_TEXT_MAX_LEN {
            return Err(ApiError::validation(format!(
                "report_watermark_text must be {WATERMARK_TEXT_MAX_LEN} characters or less"
            )));
        }

        values.insert(key.clone(), text);
    }

    Ok(values)
}
