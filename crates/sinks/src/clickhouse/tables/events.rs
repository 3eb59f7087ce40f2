//! Event table row (events)
//!
//! One wide row per record. Columns not present in the record are written as
//! their empty value; `event_id` and `_partition_date` are filled by the
//! table defaults.

use beacon_pipeline::SinkError;
use beacon_protocol::{EventRecord, Map, Value};
use chrono::{DateTime, Utc};
use clickhouse::Row;
use serde::Serialize;

/// Decimal64(4) scale
const REVENUE_SCALE: f64 = 10_000.0;

/// Decimal64(6) scale
const TOKEN_PRICE_SCALE: f64 = 1_000_000.0;

/// Row for the wide events table
///
/// ```sql
/// CREATE TABLE events (
///     event_id UUID DEFAULT generateUUIDv4(),
///     distinct_id String,
///     event String,
///     timestamp DateTime64(3),
///     ...
///     revenue Decimal64(4),
///     quantity UInt32,
///     ...
///     token_price Decimal64(6),
///     ...
///     _partition_date Date DEFAULT toDate(timestamp)
/// ) ENGINE = MergeTree()
/// ORDER BY (organization_id, toStartOfHour(timestamp), distinct_id, session_id, event_id);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Row, Serialize)]
pub struct EventRow {
    // Core identifiers
    pub distinct_id: String,
    pub event: String,

    /// Event time, milliseconds since epoch
    pub timestamp: i64,
    /// Ingestion time, milliseconds since epoch
    pub sent_at: i64,
    /// Row build time, milliseconds since epoch
    pub created_at: i64,

    // Organization
    pub organization_id: String,
    pub project_id: String,

    // Session
    pub session_id: String,
    pub visit_id: String,

    /// Properties as JSON text
    pub properties: String,
    pub person_properties: String,

    // Group
    pub group_type: String,
    pub group_key: String,
    pub group_properties: String,

    // Web analytics
    pub url: String,
    pub url_path: String,
    pub referrer: String,
    pub referrer_domain: String,
    pub hostname: String,

    // Device
    pub browser: String,
    pub browser_version: String,
    pub os: String,
    pub os_version: String,
    pub device: String,
    pub device_type: String,
    pub screen: String,
    pub language: String,

    // Geo
    pub country: String,
    pub region: String,
    pub city: String,

    // UTM
    pub utm_source: String,
    pub utm_medium: String,
    pub utm_campaign: String,
    pub utm_content: String,
    pub utm_term: String,

    // Click ids
    pub gclid: String,
    pub fbclid: String,
    pub msclkid: String,

    // Request
    pub ip: String,
    pub user_agent: String,

    // Commerce
    pub order_id: String,
    pub product_id: String,
    pub cart_id: String,
    /// Decimal64(4) as scaled integer
    pub revenue: i64,
    pub quantity: u32,

    // Structured data
    pub ast_context: String,
    pub ast_type: String,
    pub page_title: String,
    pub page_description: String,
    pub page_type: String,

    // Element interaction
    pub element_id: String,
    pub element_type: String,
    pub element_selector: String,
    pub element_text: String,
    pub element_href: String,

    // Section
    pub section_name: String,
    pub section_type: String,
    pub section_id: String,

    // Component hierarchy
    pub component_path: String,
    pub component_data: String,

    // AI usage
    pub model_provider: String,
    pub model_name: String,
    pub token_count: u32,
    /// Decimal64(6) as scaled integer
    pub token_price: i64,
    pub prompt_tokens: u32,
    pub output_tokens: u32,

    // Library
    pub lib: String,
    pub lib_version: String,
}

impl EventRow {
    /// Build a row from a record
    ///
    /// Missing timestamps fall back to `now`.
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Encoding` naming the first field that can't be
    /// represented in its column.
    pub fn from_record(record: &EventRecord, now: DateTime<Utc>) -> Result<Self, SinkError> {
        let f = FieldReader(record.fields());

        Ok(Self {
            distinct_id: f.text("distinct_id")?,
            event: f.text("event")?,
            timestamp: record.occurred_at().unwrap_or(now).timestamp_millis(),
            sent_at: record.sent_at().unwrap_or(now).timestamp_millis(),
            created_at: now.timestamp_millis(),

            organization_id: f.text("organization_id")?,
            project_id: f.text("project_id")?,
            session_id: f.text("session_id")?,
            visit_id: f.text("visit_id")?,

            properties: f.object_json("properties")?,
            person_properties: f.object_json("person_properties")?,
            group_type: f.text("group_type")?,
            group_key: f.text("group_key")?,
            group_properties: f.object_json("group_properties")?,

            url: f.text("url")?,
            url_path: f.text("url_path")?,
            referrer: f.text("referrer")?,
            referrer_domain: f.text("referrer_domain")?,
            hostname: f.text("hostname")?,

            browser: f.text("browser")?,
            browser_version: f.text("browser_version")?,
            os: f.text("os")?,
            os_version: f.text("os_version")?,
            device: f.text("device")?,
            device_type: f.text("device_type")?,
            screen: f.text("screen")?,
            language: f.text("language")?,

            country: f.text("country")?,
            region: f.text("region")?,
            city: f.text("city")?,

            utm_source: f.text("utm_source")?,
            utm_medium: f.text("utm_medium")?,
            utm_campaign: f.text("utm_campaign")?,
            utm_content: f.text("utm_content")?,
            utm_term: f.text("utm_term")?,

            gclid: f.text("gclid")?,
            fbclid: f.text("fbclid")?,
            msclkid: f.text_or("msclkid", "msclid")?,

            ip: f.text("ip")?,
            user_agent: f.text("user_agent")?,

            order_id: f.text("order_id")?,
            product_id: f.text("product_id")?,
            cart_id: f.text("cart_id")?,
            revenue: f.decimal("revenue", REVENUE_SCALE)?,
            quantity: f.count("quantity")?,

            ast_context: f.text("@context")?,
            ast_type: f.text("@type")?,
            page_title: f.text("page_title")?,
            page_description: f.text("page_description")?,
            page_type: f.text("page_type")?,

            element_id: f.text("element_id")?,
            element_type: f.text("element_type")?,
            element_selector: f.text("element_selector")?,
            element_text: f.text("element_text")?,
            element_href: f.text("element_href")?,

            section_name: f.text("section_name")?,
            section_type: f.text("section_type")?,
            section_id: f.text("section_id")?,

            component_path: f.text("component_path")?,
            component_data: f.text("component_data")?,

            model_provider: f.text("model_provider")?,
            model_name: f.text("model_name")?,
            token_count: f.count("token_count")?,
            token_price: f.decimal("token_price", TOKEN_PRICE_SCALE)?,
            prompt_tokens: f.count("prompt_tokens")?,
            output_tokens: f.count("output_tokens")?,

            lib: f.text("lib")?,
            lib_version: f.text("lib_version")?,
        })
    }
}

// =============================================================================
// Field conversion
// =============================================================================

/// Typed reads over a record's field map
struct FieldReader<'a>(&'a Map<String, Value>);

impl FieldReader<'_> {
    /// String column; scalars are rendered, structured values rejected
    fn text(&self, name: &str) -> Result<String, SinkError> {
        match self.0.get(name) {
            None | Some(Value::Null) => Ok(String::new()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Bool(b)) => Ok(b.to_string()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(_) => Err(SinkError::encoding(name, "expected a string")),
        }
    }

    /// First non-empty of two spellings of the same column
    fn text_or(&self, name: &str, alias: &str) -> Result<String, SinkError> {
        let value = self.text(name)?;
        if value.is_empty() {
            self.text(alias)
        } else {
            Ok(value)
        }
    }

    /// JSON object column stored as text; absent is `{}`
    fn object_json(&self, name: &str) -> Result<String, SinkError> {
        match self.0.get(name) {
            None | Some(Value::Null) => Ok("{}".into()),
            Some(value @ Value::Object(_)) => serde_json::to_string(value)
                .map_err(|e| SinkError::encoding(name, e.to_string())),
            Some(_) => Err(SinkError::encoding(name, "expected an object")),
        }
    }

    /// Decimal column as an integer scaled by `scale`
    fn decimal(&self, name: &str, scale: f64) -> Result<i64, SinkError> {
        let Some(value) = self.number(name)? else {
            return Ok(0);
        };
        let scaled = (value * scale).round();
        if scaled.abs() >= i64::MAX as f64 {
            return Err(SinkError::encoding(name, "out of range"));
        }
        Ok(scaled as i64)
    }

    /// Non-negative integer counter column
    fn count(&self, name: &str) -> Result<u32, SinkError> {
        let Some(value) = self.number(name)? else {
            return Ok(0);
        };
        if value < 0.0 {
            return Err(SinkError::encoding(name, "must not be negative"));
        }
        if value.fract() != 0.0 {
            return Err(SinkError::encoding(name, "must be a whole number"));
        }
        if value > f64::from(u32::MAX) {
            return Err(SinkError::encoding(name, "out of range"));
        }
        Ok(value as u32)
    }

    /// Finite number from a JSON number or numeric string
    fn number(&self, name: &str) -> Result<Option<f64>, SinkError> {
        let value = match self.0.get(name) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .ok_or_else(|| SinkError::encoding(name, "not representable"))?,
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| SinkError::encoding(name, format!("'{s}' is not a number")))?,
            Some(_) => return Err(SinkError::encoding(name, "expected a number")),
        };
        if !value.is_finite() {
            return Err(SinkError::encoding(name, "must be finite"));
        }
        Ok(Some(value))
    }
}
