//! ClickHouse table row types

mod events;

pub use events::EventRow;
