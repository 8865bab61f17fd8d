//! Field-level validation shared by the write payloads.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use url::Url;

/// Longest URL accepted for resume and meeting links.
pub const MAX_URL_LENGTH: usize = 500;
/// Upper bound for short text columns (titles, names, locations).
pub const MAX_SHORT_TEXT: usize = 255;

/// Validation messages keyed by the offending field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// `Ok(())` when nothing was recorded, otherwise the collected errors.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.fields).unwrap_or(Value::Null)
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> = self
            .fields
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join("; ")))
            .collect();
        write!(f, "{}", rendered.join(", "))
    }
}

/// Required, non-blank text no longer than `max` characters. Returns the trimmed value.
pub fn required_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    max: Option<usize>,
) -> Option<String> {
    match value.map(str::trim) {
        None => {
            errors.push(field, "This field is required.");
            None
        }
        Some("") => {
            errors.push(field, "This field may not be blank.");
            None
        }
        Some(text) => {
            if let Some(max) = max {
                if text.chars().count() > max {
                    errors.push(
                        field,
                        format!("Ensure this field has no more than {max} characters."),
                    );
                    return None;
                }
            }
            Some(text.to_string())
        }
    }
}

/// Optional text; when present it may hold at most [`MAX_SHORT_TEXT`] characters.
pub fn short_text(errors: &mut FieldErrors, field: &str, value: Option<String>) -> Option<String> {
    let value = value?;
    if value.chars().count() > MAX_SHORT_TEXT {
        errors.push(
            field,
            format!("Ensure this field has no more than {MAX_SHORT_TEXT} characters."),
        );
        return None;
    }
    Some(value)
}

/// Text shorter than `min` characters is rejected.
pub fn min_chars(errors: &mut FieldErrors, field: &str, value: &str, min: usize) -> bool {
    if value.chars().count() < min {
        errors.push(
            field,
            format!("Ensure this field has at least {min} characters."),
        );
        return false;
    }
    true
}

/// Absolute `http`/`https` URL with a host, at most [`MAX_URL_LENGTH`] characters.
pub fn http_url(errors: &mut FieldErrors, field: &str, value: &str) -> bool {
    if value.chars().count() > MAX_URL_LENGTH {
        errors.push(
            field,
            format!("Ensure this field has no more than {MAX_URL_LENGTH} characters."),
        );
        return false;
    }

    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => true,
        Ok(_) => {
            errors.push(field, "URL must start with http:// or https://");
            false
        }
        Err(_) => {
            errors.push(field, "Enter a valid URL.");
            false
        }
    }
}

/// Query-string flag semantics: present and not one of `""`, `0`, `false`, `no`.
pub fn query_flag(raw: Option<&str>) -> bool {
    match raw.map(|value| value.trim().to_ascii_lowercase()) {
        None => false,
        Some(value) => !matches!(value.as_str(), "" | "0" | "false" | "no"),
    }
}

/// Integer query parameter; anything unparsable is treated as absent.
pub fn query_id(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
}

/// Distinguishes an explicit `null` from an absent field in partial updates:
/// absent → `None`, `null` → `Some(None)`, value → `Some(Some(v))`.
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
