//! Annotation, timestamp, and data-field helpers for Secrets
//!
//! Rotation state lives in Secret annotations (RFC3339 timestamps and
//! boolean-as-string flags) and credential material in Secret data. These
//! helpers keep the encoding in one place.

use chrono::{DateTime, SecondsFormat, Utc};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;

use crate::config::ObjectKey;
use crate::error::Error;
use crate::Result;

const TRUE: &str = "true";

/// Format a timestamp for an annotation
///
/// Microsecond precision keeps two writes within the same second ordered.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an RFC3339 annotation value
pub fn parse_timestamp(key: &ObjectKey, annotation: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|source| Error::MalformedTimestamp {
            key: key.clone(),
            annotation: annotation.to_string(),
            value: value.to_string(),
            source,
        })
}

/// Get an annotation value
pub fn annotation<'a>(secret: &'a Secret, name: &str) -> Option<&'a str> {
    secret
        .metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(name))
        .map(String::as_str)
}

/// Read a timestamp annotation, `Ok(None)` when absent
pub fn read_timestamp(
    secret: &Secret,
    key: &ObjectKey,
    name: &str,
) -> Result<Option<DateTime<Utc>>> {
    annotation(secret, name)
        .map(|value| parse_timestamp(key, name, value))
        .transpose()
}

/// Write a timestamp annotation
pub fn set_timestamp(secret: &mut Secret, name: &str, ts: DateTime<Utc>) {
    set_annotation(secret, name, format_timestamp(ts));
}

/// Read a boolean-as-string flag; only the exact value `"true"` is set
pub fn read_flag(secret: &Secret, name: &str) -> bool {
    annotation(secret, name) == Some(TRUE)
}

/// Set a flag to `"true"`, or remove it entirely when clearing
pub fn set_flag(secret: &mut Secret, name: &str, value: bool) {
    if value {
        set_annotation(secret, name, TRUE.to_string());
    } else {
        clear_annotation(secret, name);
    }
}

/// Set an annotation, creating the map if needed
pub fn set_annotation(secret: &mut Secret, name: &str, value: String) {
    secret
        .metadata
        .annotations
        .get_or_insert_with(Default::default)
        .insert(name.to_string(), value);
}

/// Remove an annotation if present
pub fn clear_annotation(secret: &mut Secret, name: &str) {
    if let Some(annotations) = secret.metadata.annotations.as_mut() {
        annotations.remove(name);
    }
}

/// Get a data field's bytes
pub fn data_field<'a>(secret: &'a Secret, field: &str) -> Option<&'a [u8]> {
    secret
        .data
        .as_ref()
        .and_then(|d| d.get(field))
        .map(|b| b.0.as_slice())
}

/// Get a data field's bytes, failing if it is absent
pub fn required_field(secret: &Secret, key: &ObjectKey, field: &str) -> Result<Vec<u8>> {
    data_field(secret, field)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| Error::incomplete(key, field))
}

/// Set a data field
pub fn set_data_field(secret: &mut Secret, field: &str, value: Vec<u8>) {
    secret
        .data
        .get_or_insert_with(Default::default)
        .insert(field.to_string(), ByteString(value));
}

/// Remove a data field if present
pub fn remove_data_field(secret: &mut Secret, field: &str) {
    if let Some(data) = secret.data.as_mut() {
        data.remove(field);
    }
}
