//! Tests for event kind classification

use crate::events;
use crate::kind::EventKind;
use crate::record::EventRecord;

#[test]
fn test_page_view_events() {
    for name in [events::PAGE_VIEW, events::SCREEN_VIEW, "pageview"] {
        assert_eq!(EventRecord::new(name).kind(), EventKind::PageView, "{name}");
    }
}

#[test]
fn test_commerce_events_by_name() {
    for name in events::COMMERCE_EVENTS {
        assert_eq!(EventRecord::new(*name).kind(), EventKind::Commerce, "{name}");
    }
}

#[test]
fn test_commerce_by_order_id() {
    let record = EventRecord::new("subscription_renewed").with_field("order_id", "ord_1");
    assert_eq!(record.kind(), EventKind::Commerce);
}

#[test]
fn test_empty_order_id_is_not_commerce() {
    let record = EventRecord::new("subscription_renewed").with_field("order_id", "");
    assert_eq!(record.kind(), EventKind::Custom);
}

#[test]
fn test_custom_events() {
    assert_eq!(EventRecord::new(events::BUTTON_CLICK).kind(), EventKind::Custom);
    assert_eq!(EventRecord::new(events::AI_COMPLETION).kind(), EventKind::Custom);
}

#[test]
fn test_kind_display() {
    assert_eq!(EventKind::PageView.to_string(), "page_view");
    assert_eq!(EventKind::Commerce.to_string(), "commerce");
    assert_eq!(EventKind::Custom.to_string(), "custom");
}
