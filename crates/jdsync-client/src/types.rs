//! Request and response types for the panel open API.
//!
//! Every panel response is wrapped in the same envelope:
//! `{ "code": 200, "data": ..., "message": "...", "errors": [...] }`.
//! Success is decided by `code`, not by the HTTP status.

use serde::{Deserialize, Serialize};

/// Name of the panel record holding JD cookies.
pub const RECORD_NAME: &str = "JD_COOKIE";

/// `code` value the panel uses for success.
pub const CODE_OK: i64 = 200;

// ─────────────────────────────────────────────────────────────────────────────
// Envelope
// ─────────────────────────────────────────────────────────────────────────────

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PanelResponse<T> {
    /// Application-level status code (200 on success).
    #[serde(default)]
    pub code: i64,
    /// Payload.
    pub data: Option<T>,
    /// Error or info message.
    pub message: Option<String>,
    /// Structured validation errors.
    pub errors: Option<Vec<FieldError>>,
}

impl<T> PanelResponse<T> {
    /// Whether `code` signals success.
    pub fn is_ok(&self) -> bool {
        self.code == CODE_OK
    }

    /// The panel's message, or `fallback` when it sent none.
    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(fallback)
            .to_string()
    }

    /// Whether the panel rejected a write because the `value` field already
    /// exists on another record.
    pub fn is_duplicate_value(&self) -> bool {
        self.errors
            .as_deref()
            .unwrap_or_default()
            .iter()
            .any(FieldError::is_unique_value_violation)
    }
}

/// A structured validation error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Error type, e.g. `unique violation`.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Field the error applies to.
    #[serde(default)]
    pub path: Option<String>,
    /// Human-readable message.
    #[serde(default)]
    pub message: Option<String>,
}

impl FieldError {
    /// A uniqueness violation on the `value` column.
    pub fn is_unique_value_violation(&self) -> bool {
        self.kind.as_deref() == Some("unique violation") && self.path.as_deref() == Some("value")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────────────────────────────────────

/// Payload of a successful token exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenData {
    /// Bearer token.
    pub token: Option<String>,
    /// Token type, normally `Bearer`.
    #[serde(default)]
    pub token_type: Option<String>,
    /// Expiry as epoch seconds.
    #[serde(default)]
    pub expiration: Option<i64>,
}

/// Query parameters for the token endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct TokenQuery<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
}

// ─────────────────────────────────────────────────────────────────────────────
// Envs
// ─────────────────────────────────────────────────────────────────────────────

/// Numeric id of a panel record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl RecordId {
    /// Interpret a JSON id that may be a number or a numeric string.
    fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_i64().map(RecordId),
            serde_json::Value::String(s) => s.trim().parse().ok().map(RecordId),
            _ => None,
        }
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        RecordId::from_json(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid record id: {}", value)))
    }
}

/// A record as listed by the panel.
///
/// `id` is `None` when the panel sent no numeric id (e.g. a hash-style
/// `_id`); such records can be matched but never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawRecord")]
pub struct RemoteRecord {
    pub id: Option<RecordId>,
    pub name: String,
    pub value: String,
    pub remarks: String,
}

/// Wire shape of a listed record.
///
/// Recent panels send a numeric `id`; older ones sent `_id`.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(rename = "_id", default)]
    legacy_id: Option<serde_json::Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    remarks: Option<String>,
}

impl From<RawRecord> for RemoteRecord {
    fn from(raw: RawRecord) -> Self {
        let id = raw
            .id
            .as_ref()
            .and_then(RecordId::from_json)
            .or_else(|| raw.legacy_id.as_ref().and_then(RecordId::from_json));

        RemoteRecord {
            id,
            name: raw.name.unwrap_or_default(),
            value: raw.value.unwrap_or_default(),
            remarks: raw.remarks.unwrap_or_default(),
        }
    }
}

/// Query parameters for listing records.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRecordsQuery<'a> {
    pub search_value: &'a str,
}

/// A record to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub name: String,
    pub value: String,
    pub remarks: String,
}

/// Result of a create call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CreateOutcome {
    /// The panel rejected the write because the value already exists.
    ///
    /// The desired value is present, so the end state is still correct.
    pub duplicate_detected: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_with_numeric_id() {
        let record: RemoteRecord = serde_json::from_value(json!({
            "id": 12,
            "name": "JD_COOKIE",
            "value": "pt_key=x;pt_pin=y;",
            "remarks": "Account: y",
            "status": 0
        }))
        .unwrap();
        assert_eq!(record.id, Some(RecordId(12)));
        assert_eq!(record.remarks, "Account: y");
    }

    #[test]
    fn test_record_with_legacy_id_and_nulls() {
        let record: RemoteRecord = serde_json::from_value(json!({
            "_id": "7",
            "name": "JD_COOKIE",
            "value": "v",
            "remarks": null
        }))
        .unwrap();
        assert_eq!(record.id, Some(RecordId(7)));
        assert_eq!(record.remarks, "");
    }

    #[test]
    fn test_record_prefers_numeric_id() {
        let record: RemoteRecord = serde_json::from_value(json!({
            "id": 3,
            "_id": "legacy-hash",
            "name": "JD_COOKIE",
            "value": "v"
        }))
        .unwrap();
        assert_eq!(record.id, Some(RecordId(3)));
    }

    #[test]
    fn test_record_without_numeric_id_still_decodes() {
        let records: Vec<RemoteRecord> = serde_json::from_value(json!([
            { "name": "JD_COOKIE", "value": "v" },
            { "_id": "5f1a2b3c4d", "name": "JD_COOKIE_OTHER", "value": "x" },
            { "id": 4, "name": "JD_COOKIE", "value": "w" }
        ]))
        .unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id, None);
        assert_eq!(records[1].id, None);
        assert_eq!(records[1].name, "JD_COOKIE_OTHER");
        assert_eq!(records[2].id, Some(RecordId(4)));
    }

    #[test]
    fn test_duplicate_detection() {
        let response: PanelResponse<serde_json::Value> = serde_json::from_value(json!({
            "code": 400,
            "message": "validation error",
            "errors": [
                { "type": "unique violation", "path": "value", "message": "value must be unique" }
            ]
        }))
        .unwrap();
        assert!(!response.is_ok());
        assert!(response.is_duplicate_value());

        let other: PanelResponse<serde_json::Value> = serde_json::from_value(json!({
            "code": 400,
            "errors": [{ "type": "unique violation", "path": "name" }]
        }))
        .unwrap();
        assert!(!other.is_duplicate_value());
        assert_eq!(other.message_or("Failed to add env"), "Failed to add env");
    }

    #[test]
    fn test_list_query_uses_camel_case() {
        let query = ListRecordsQuery {
            search_value: RECORD_NAME,
        };
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({ "searchValue": "JD_COOKIE" })
        );
    }
}
