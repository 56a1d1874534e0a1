//! Field value types and coercion.
//!
//! Proxies cache the raw JSON the service returned and coerce on read, so a
//! field is only interpreted when someone actually asks for it.

use crate::error::{Result, SparkError};
use crate::ident::ResourceId;
use crate::schema::{PropertySpec, ValueKind};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::fmt;

/// Runtime representation of a field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// An optional field the service did not send
    Null,

    Bool(bool),

    Integer(i64),

    Text(String),

    Timestamp(DateTime<Utc>),

    TextList(Vec<String>),

    Files(Vec<FileHandle>),
}

impl FieldValue {
    /// Interpret a raw JSON value according to the field's declared kind.
    ///
    /// `owner` is the identifier of the resource the value was read from;
    /// file handles keep it as their parent.
    pub fn coerce(spec: &PropertySpec, raw: &Value, owner: &ResourceId) -> Result<Self> {
        let mismatch = |expected: &str| SparkError::InvalidValue {
            field: spec.name.to_string(),
            reason: format!("expected {}, got {}", expected, raw),
        };

        if raw.is_null() {
            return Ok(FieldValue::Null);
        }

        match spec.kind {
            ValueKind::Text => raw
                .as_str()
                .map(|s| FieldValue::Text(s.to_string()))
                .ok_or_else(|| mismatch("a string")),
            ValueKind::Bool => raw
                .as_bool()
                .map(FieldValue::Bool)
                .ok_or_else(|| mismatch("a boolean")),
            ValueKind::Integer => raw
                .as_i64()
                .map(FieldValue::Integer)
                .ok_or_else(|| mismatch("an integer")),
            ValueKind::Timestamp => {
                let text = raw.as_str().ok_or_else(|| mismatch("a timestamp"))?;
                parse_timestamp(text)
                    .map(FieldValue::Timestamp)
                    .ok_or_else(|| mismatch("an RFC 3339 timestamp"))
            }
            ValueKind::TextList => string_list(raw)
                .map(FieldValue::TextList)
                .ok_or_else(|| mismatch("a list of strings")),
            ValueKind::Files => string_list(raw)
                .map(|urls| {
                    FieldValue::Files(
                        urls.into_iter()
                            .map(|url| FileHandle::new(url, owner.clone()))
                            .collect(),
                    )
                })
                .ok_or_else(|| mismatch("a list of file urls")),
        }
    }

    /// Wire representation, as sent in an update body.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(v) => Value::Bool(*v),
            FieldValue::Integer(v) => Value::from(*v),
            FieldValue::Text(v) => Value::String(v.clone()),
            FieldValue::Timestamp(ts) => Value::String(format_timestamp(ts)),
            FieldValue::TextList(v) => Value::from(v.clone()),
            FieldValue::Files(files) => {
                Value::from(files.iter().map(|f| f.url.clone()).collect::<Vec<_>>())
            }
        }
    }

    /// Check that a value handed to `set` matches the field's kind.
    pub fn check_kind(&self, spec: &PropertySpec) -> Result<()> {
        let ok = match (self, spec.kind) {
            (FieldValue::Null, _) => spec.optional,
            (FieldValue::Bool(_), ValueKind::Bool)
            | (FieldValue::Integer(_), ValueKind::Integer)
            | (FieldValue::Text(_), ValueKind::Text)
            | (FieldValue::Timestamp(_), ValueKind::Timestamp)
            | (FieldValue::TextList(_), ValueKind::TextList)
            | (FieldValue::Files(_), ValueKind::Files) => true,
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(SparkError::InvalidValue {
                field: spec.name.to_string(),
                reason: format!("{:?} does not fit a {:?} field", self, spec.kind),
            })
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::TextList(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_files(&self) -> Option<&[FileHandle]> {
        match self {
            FieldValue::Files(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("-"),
            FieldValue::Bool(v) => write!(f, "{}", v),
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::Text(v) => f.write_str(v),
            FieldValue::Timestamp(ts) => f.write_str(&format_timestamp(ts)),
            FieldValue::TextList(v) => f.write_str(&v.join(", ")),
            FieldValue::Files(files) => {
                let names: Vec<_> = files.iter().map(|h| h.url.as_str()).collect();
                f.write_str(&names.join(", "))
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(v)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(v: Vec<String>) -> Self {
        FieldValue::TextList(v)
    }
}

/// A file attached to a message.
///
/// Handles are bound to the message they were read from; fetching the bytes
/// is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    pub url: String,
    pub parent: ResourceId,
}

impl FileHandle {
    pub fn new(url: impl Into<String>, parent: ResourceId) -> Self {
        Self {
            url: url.into(),
            parent,
        }
    }

    /// Last path segment of the content URL.
    pub fn file_name(&self) -> Option<&str> {
        self.url
            .split(&['?', '#'][..])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .filter(|name| !name.is_empty())
    }
}

pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Millisecond precision with a `Z` suffix, the service's own format.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn string_list(raw: &Value) -> Option<Vec<String>> {
    raw.as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}
