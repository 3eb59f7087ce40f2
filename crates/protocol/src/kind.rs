//! Event kind classification
//!
//! Forwarding endpoints expect different payload shapes for page views,
//! commerce events and everything else. The kind is derived from the event
//! name and, for commerce, from the presence of an order id.

use crate::events::{COMMERCE_EVENTS, PAGE_VIEW_EVENTS};
use crate::record::EventRecord;

/// Delivery shape of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Navigation to a page or screen
    PageView,
    /// Order, cart and product events
    Commerce,
    /// Any other named event
    Custom,
}

impl EventKind {
    /// Classify a record by its event name and fields
    pub fn classify(record: &EventRecord) -> Self {
        let name = record.event();

        if PAGE_VIEW_EVENTS.contains(&name) {
            return Self::PageView;
        }

        if COMMERCE_EVENTS.contains(&name) || record.str_field("order_id").is_some() {
            return Self::Commerce;
        }

        Self::Custom
    }

    /// Get the string name of this kind
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PageView => "page_view",
            Self::Commerce => "commerce",
            Self::Custom => "custom",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
