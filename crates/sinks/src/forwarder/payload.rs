//! Wire payloads for the forwarders

use beacon_protocol::{EventKind, EventRecord, Map, Value};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

// =============================================================================
// Capture (batch endpoint)
// =============================================================================

/// One element of the capture batch array
#[derive(Debug, Serialize)]
pub struct CaptureEvent<'a> {
    pub api_key: &'a str,
    pub event: &'a str,
    pub distinct_id: &'a str,
    pub properties: Map<String, Value>,
    /// RFC 3339
    pub timestamp: String,
    /// RFC 3339
    pub sent_at: String,
}

impl<'a> CaptureEvent<'a> {
    /// Missing timestamps fall back to `now`
    pub fn from_record(record: &'a EventRecord, api_key: &'a str, now: DateTime<Utc>) -> Self {
        Self {
            api_key,
            event: record.event(),
            distinct_id: record.distinct_id(),
            properties: record.properties().cloned().unwrap_or_default(),
            timestamp: rfc3339(record.occurred_at().unwrap_or(now)),
            sent_at: rfc3339(record.sent_at().unwrap_or(now)),
        }
    }
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// =============================================================================
// Webhook (one call per record)
// =============================================================================

/// Body of a webhook call
///
/// `/api/send` expects the `{"type": "event", "payload": ...}` wrapper and
/// rejects a bare payload.
#[derive(Debug, Serialize)]
pub struct WebhookEnvelope<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub payload: WebhookPayload<'a>,
}

impl<'a> WebhookEnvelope<'a> {
    pub fn from_record(record: &'a EventRecord, website: &'a str) -> Self {
        Self {
            kind: "event",
            payload: WebhookPayload::from_record(record, website),
        }
    }
}

/// Provider payload, shaped by event kind
#[derive(Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WebhookPayload<'a> {
    PageView {
        website: &'a str,
        url: &'a str,
        title: &'a str,
        referrer: &'a str,
        hostname: &'a str,
        language: &'a str,
        screen: &'a str,
    },
    Event {
        website: &'a str,
        name: &'a str,
        data: Map<String, Value>,
    },
}

impl<'a> WebhookPayload<'a> {
    pub fn from_record(record: &'a EventRecord, website: &'a str) -> Self {
        let text = |name: &str| record.str_field(name).unwrap_or_default();

        match record.kind() {
            EventKind::PageView => Self::PageView {
                website,
                url: text("url"),
                title: record
                    .str_field("page_title")
                    .or_else(|| record.str_field("title"))
                    .unwrap_or_default(),
                referrer: text("referrer"),
                hostname: text("hostname"),
                language: text("language"),
                screen: text("screen"),
            },
            EventKind::Commerce => {
                let mut data = Map::new();
                data.insert("order_id".into(), Value::String(text("order_id").into()));
                data.insert("total".into(), order_total(record));
                if let Some(props) = record.properties() {
                    data.extend(props.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
                Self::Event {
                    website,
                    name: record.event(),
                    data,
                }
            }
            EventKind::Custom => Self::Event {
                website,
                name: record.event(),
                data: record.properties().cloned().unwrap_or_default(),
            },
        }
    }
}

/// Revenue as a JSON number, 0 when absent or unparseable
fn order_total(record: &EventRecord) -> Value {
    let total = match record.field("revenue") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    total
        .filter(|t| t.is_finite())
        .and_then(serde_json::Number::from_f64)
        .map_or_else(|| Value::from(0), Value::Number)
}
