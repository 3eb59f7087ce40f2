//! Event record - the unit of data flowing through a pipeline
//!
//! A record is an open map of named JSON fields plus two timestamps:
//! `occurred_at` (when the event happened, client supplied or now) and
//! `sent_at` (when it reached the collector). Records are built by the
//! ingestion layer, moved into a pipeline and read (never mutated) by sinks.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::ProtocolError;
use crate::kind::EventKind;

/// Library name recorded for events that don't declare one
pub const DEFAULT_LIB: &str = "beacon";

/// Field holding the event name
const EVENT_FIELD: &str = "event";

/// Client-supplied event time
const TIMESTAMP_FIELD: &str = "timestamp";

/// Client-supplied send time
const SENT_AT_FIELD: &str = "sent_at";

/// Field holding the tracker library name
const LIB_FIELD: &str = "lib";

/// A single analytics event
///
/// # Example
///
/// ```
/// use beacon_protocol::EventRecord;
///
/// let record = EventRecord::new("order_completed")
///     .with_field("distinct_id", "user-1")
///     .with_field("revenue", 42.5)
///     .with_property("coupon", "SPRING");
///
/// assert_eq!(record.event(), "order_completed");
/// assert_eq!(record.distinct_id(), "user-1");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// Named fields (event, distinct_id, properties, url, ...)
    fields: Map<String, Value>,

    /// Event-origin time
    occurred_at: Option<DateTime<Utc>>,

    /// Ingestion time
    sent_at: Option<DateTime<Utc>>,
}

impl EventRecord {
    /// Create a record with only an event name
    pub fn new(event: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert(EVENT_FIELD.into(), Value::String(event.into()));
        Self {
            fields,
            occurred_at: None,
            sent_at: None,
        }
    }

    /// Build a record from a client-supplied JSON object
    ///
    /// `timestamp` and `sent_at` are lifted out of the field map into the
    /// record's timestamps. Both accept RFC 3339 strings or epoch
    /// milliseconds.
    ///
    /// # Errors
    ///
    /// Returns error if the value is not an object, has no non-empty `event`
    /// name, or carries an unparseable timestamp.
    pub fn from_json(value: Value) -> Result<Self, ProtocolError> {
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => return Err(ProtocolError::NotAnObject(json_type_name(&other))),
        };

        match fields.get(EVENT_FIELD) {
            Some(Value::String(name)) if !name.trim().is_empty() => {}
            _ => return Err(ProtocolError::missing_field(EVENT_FIELD)),
        }

        let occurred_at = take_timestamp(&mut fields, TIMESTAMP_FIELD)?;
        let sent_at = take_timestamp(&mut fields, SENT_AT_FIELD)?;

        Ok(Self {
            fields,
            occurred_at,
            sent_at,
        })
    }

    /// Set a top-level field
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Set a key inside the nested `properties` object, creating it if needed
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let entry = self
            .fields
            .entry("properties")
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(props) = entry {
            props.insert(name.into(), value.into());
        }
        self
    }

    /// Set the event-origin time
    #[must_use]
    pub fn with_occurred_at(mut self, at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(at);
        self
    }

    /// Set the ingestion time
    #[must_use]
    pub fn with_sent_at(mut self, at: DateTime<Utc>) -> Self {
        self.sent_at = Some(at);
        self
    }

    /// Fill missing timestamps and library name
    ///
    /// Called once when the record is admitted to a pipeline. Values the
    /// client supplied are kept.
    pub fn stamp(&mut self, now: DateTime<Utc>) {
        self.occurred_at.get_or_insert(now);
        self.sent_at.get_or_insert(now);

        let has_lib = matches!(self.fields.get(LIB_FIELD), Some(Value::String(s)) if !s.is_empty());
        if !has_lib {
            self.fields
                .insert(LIB_FIELD.into(), Value::String(DEFAULT_LIB.into()));
        }
    }

    /// Whether both timestamps are present
    #[inline]
    pub fn is_stamped(&self) -> bool {
        self.occurred_at.is_some() && self.sent_at.is_some()
    }

    /// Event name, empty if absent
    #[inline]
    pub fn event(&self) -> &str {
        self.str_field(EVENT_FIELD).unwrap_or_default()
    }

    /// Distinct (visitor) id, empty if absent
    #[inline]
    pub fn distinct_id(&self) -> &str {
        self.str_field("distinct_id").unwrap_or_default()
    }

    /// Raw field value
    #[inline]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Non-empty string field
    pub fn str_field(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(Value::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    /// The nested `properties` object, if present
    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.fields.get("properties").and_then(Value::as_object)
    }

    /// All fields
    #[inline]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Event-origin time
    #[inline]
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        self.occurred_at
    }

    /// Ingestion time
    #[inline]
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        self.sent_at
    }

    /// Delivery shape of this record
    #[inline]
    pub fn kind(&self) -> EventKind {
        EventKind::classify(self)
    }
}

/// Remove and parse a timestamp field
fn take_timestamp(
    fields: &mut Map<String, Value>,
    name: &'static str,
) -> Result<Option<DateTime<Utc>>, ProtocolError> {
    match fields.remove(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|_| ProtocolError::invalid_timestamp(name, s)),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(Some)
            .ok_or_else(|| ProtocolError::invalid_timestamp(name, n.to_string())),
        Some(other) => Err(ProtocolError::invalid_timestamp(name, other.to_string())),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
