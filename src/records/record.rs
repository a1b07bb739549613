//! Record model and its stored plaintext layout.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::{RecordError, RecordResult};

/// Approval state. Only `Pending -> Approved` is ever applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Pending,
    Approved,
}

/// Kind of submission, which decides the namespace it lives under
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Survey,
    #[default]
    Waitlist,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Survey => "survey",
            RecordKind::Waitlist => "waitlist",
        }
    }
}

/// Namespace (directory) per record kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespaces {
    #[serde(default = "default_survey_namespace")]
    pub survey: String,

    #[serde(default = "default_waitlist_namespace")]
    pub waitlist: String,
}

fn default_survey_namespace() -> String {
    "responses".to_string()
}

fn default_waitlist_namespace() -> String {
    "early-access".to_string()
}

impl Default for Namespaces {
    fn default() -> Self {
        Self {
            survey: default_survey_namespace(),
            waitlist: default_waitlist_namespace(),
        }
    }
}

impl Namespaces {
    pub fn for_kind(&self, kind: RecordKind) -> &str {
        match kind {
            RecordKind::Survey => &self.survey,
            RecordKind::Waitlist => &self.waitlist,
        }
    }
}

/// Free-form answers: field name to string value, in key order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(BTreeMap<String, String>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// Flatten a submitted JSON object into string fields.
    ///
    /// Nested objects become `parent.child` keys, arrays of scalars are
    /// joined with `", "`, nulls are dropped.
    pub fn from_json(object: &Map<String, Value>) -> Self {
        let mut payload = Payload::new();
        for (key, value) in object {
            payload.flatten_into(key, value);
        }
        payload
    }

    fn flatten_into(&mut self, key: &str, value: &Value) {
        match value {
            Value::Null => {}
            Value::Object(inner) => {
                for (child, v) in inner {
                    self.flatten_into(&format!("{}.{}", key, child), v);
                }
            }
            Value::Array(items) => {
                let joined = items
                    .iter()
                    .filter_map(scalar_to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                self.insert(key, joined);
            }
            scalar => {
                if let Some(s) = scalar_to_string(scalar) {
                    self.insert(key, s);
                }
            }
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A decrypted submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Submitter email (or survey user id); not unique across records
    pub identity: String,

    pub submitted_at: DateTime<Utc>,

    #[serde(default)]
    pub status: RecordStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,

    pub payload: Payload,
}

/// Top-level keys of the flat layout that are record metadata, not answers
const FLAT_METADATA_KEYS: [&str; 3] = ["status", "approvedBy", "approvedAt"];

impl Record {
    /// New pending record
    pub fn new(identity: impl Into<String>, submitted_at: DateTime<Utc>, payload: Payload) -> Self {
        Self {
            identity: identity.into(),
            submitted_at,
            status: RecordStatus::Pending,
            approved_by: None,
            approved_at: None,
            payload,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.status == RecordStatus::Approved
    }

    /// Move to `approved`. Returns `false` if it already was.
    pub fn approve(&mut self, approver: &str, at: DateTime<Utc>) -> bool {
        if self.is_approved() {
            return false;
        }
        self.status = RecordStatus::Approved;
        self.approved_by = Some(approver.to_string());
        self.approved_at = Some(at);
        true
    }

    /// Canonical plaintext written into the envelope
    pub fn to_plaintext(&self) -> RecordResult<String> {
        serde_json::to_string(self).map_err(|e| RecordError::CorruptRecord(e.to_string()))
    }

    /// Parse decrypted plaintext.
    ///
    /// Accepts the current layout and the flat layout where answers,
    /// `email`/`userId`, `timestamp` and status fields share one object.
    pub fn from_plaintext(plaintext: &str) -> RecordResult<Self> {
        let value: Value = serde_json::from_str(plaintext)
            .map_err(|e| RecordError::CorruptRecord(format!("not JSON: {}", e)))?;

        let object = match value {
            Value::Object(object) => object,
            _ => return Err(RecordError::CorruptRecord("not a JSON object".to_string())),
        };

        if object.get("payload").map(Value::is_object).unwrap_or(false) {
            return serde_json::from_value(Value::Object(object))
                .map_err(|e| RecordError::CorruptRecord(e.to_string()));
        }

        Self::from_flat(object)
    }

    fn from_flat(object: Map<String, Value>) -> RecordResult<Self> {
        let identity = ["email", "userId"]
            .iter()
            .find_map(|k| object.get(*k).and_then(Value::as_str))
            .filter(|s| !s.is_empty())
            .ok_or_else(|| RecordError::CorruptRecord("no identity field".to_string()))?
            .to_string();

        let submitted_at = object
            .get("timestamp")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
            .ok_or_else(|| RecordError::CorruptRecord("no valid timestamp".to_string()))?;

        let status = match object.get("status").and_then(Value::as_str) {
            Some("approved") => RecordStatus::Approved,
            _ => RecordStatus::Pending,
        };
        let approved_by = object
            .get("approvedBy")
            .and_then(Value::as_str)
            .map(str::to_string);
        let approved_at = object
            .get("approvedAt")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc));

        let answers: Map<String, Value> = object
            .into_iter()
            .filter(|(k, _)| !FLAT_METADATA_KEYS.contains(&k.as_str()))
            .collect();

        Ok(Self {
            identity,
            submitted_at,
            status,
            approved_by,
            approved_at,
            payload: Payload::from_json(&answers),
        })
    }
}
