//! Standard event names
//!
//! Names used across tracker libraries and the forwarding endpoints. Clients
//! may send any name; these are the ones the collector gives meaning to.

// Navigation
pub const PAGE_VIEW: &str = "$pageview";
pub const SCREEN_VIEW: &str = "$screen";

// Identity
pub const IDENTIFY: &str = "$identify";
pub const GROUP_IDENTIFY: &str = "$groupidentify";
pub const ALIAS: &str = "$create_alias";

// Commerce
pub const PRODUCT_VIEWED: &str = "product_viewed";
pub const PRODUCT_ADDED: &str = "product_added";
pub const PRODUCT_REMOVED: &str = "product_removed";
pub const CART_VIEWED: &str = "cart_viewed";
pub const CHECKOUT_STARTED: &str = "checkout_started";
pub const CHECKOUT_STEP: &str = "checkout_step";
pub const ORDER_COMPLETED: &str = "order_completed";
pub const ORDER_REFUNDED: &str = "order_refunded";

// Account lifecycle
pub const SIGNED_UP: &str = "signed_up";
pub const SIGNED_IN: &str = "signed_in";
pub const SIGNED_OUT: &str = "signed_out";

// Interaction
pub const FEATURE_USED: &str = "feature_used";
pub const BUTTON_CLICK: &str = "button_clicked";
pub const FORM_SUBMIT: &str = "form_submitted";
pub const SEARCH_QUERY: &str = "search_query";
pub const SECTION_VIEWED: &str = "section_viewed";
pub const ELEMENT_INTERACTION: &str = "element_interaction";
pub const LINK_CLICKED: &str = "link_clicked";
pub const INPUT_CHANGED: &str = "input_changed";
pub const SCROLL_DEPTH: &str = "scroll_depth";
pub const VISIBILITY_CHANGE: &str = "visibility_change";

// AI usage
pub const AI_MESSAGE_CREATED: &str = "ai.message.created";
pub const AI_CHAT_STARTED: &str = "ai.chat.started";
pub const AI_COMPLETION: &str = "ai.completion";
pub const AI_TOKENS_CONSUMED: &str = "ai.tokens.consumed";
pub const AI_MODEL_INVOKED: &str = "ai.model.invoked";
pub const AI_ERROR: &str = "ai.error";

// Server-side
pub const PIXEL_VIEW: &str = "pixel_view";
pub const API_REQUEST: &str = "$api_request";
pub const EXCEPTION: &str = "$exception";

/// Event names delivered as page views by the generic forwarder
pub const PAGE_VIEW_EVENTS: &[&str] = &[PAGE_VIEW, SCREEN_VIEW, "pageview"];

/// Event names delivered as commerce events by the generic forwarder
pub const COMMERCE_EVENTS: &[&str] = &[
    PRODUCT_VIEWED,
    PRODUCT_ADDED,
    PRODUCT_REMOVED,
    CART_VIEWED,
    CHECKOUT_STARTED,
    CHECKOUT_STEP,
    ORDER_COMPLETED,
    ORDER_REFUNDED,
];
