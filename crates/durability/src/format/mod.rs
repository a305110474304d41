//! On-disk byte format for provenance journals.
//!
//! # Segment Layout
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │ Header: identifier (u16 len + UTF-8),      │
//! │         serialization version (i32 BE)     │
//! ├────────────────────────────────────────────┤
//! │ Record 1                                   │
//! ├────────────────────────────────────────────┤
//! │ Record 2                                   │
//! ├────────────────────────────────────────────┤
//! │ ...                                        │
//! └────────────────────────────────────────────┘
//! ```
//!
//! Records are not length-prefixed; their extent is only known by decoding
//! them (or from the byte counts the writer reports). All integers are
//! big-endian.
//!
//! # Module Structure
//!
//! - `header`: segment header and version constants
//! - `primitives`: string, identifier and attribute-map encodings
//! - `event_record`: per-version record layouts

pub mod event_record;
pub mod header;
pub mod primitives;

pub use event_record::{encode_event, RecordLayout};
pub use header::{
    SegmentHeader, CURRENT_SERIALIZATION_VERSION, FORMAT_IDENTIFIER, MIN_SERIALIZATION_VERSION,
};
pub use primitives::MAX_SHORT_STRING_LEN;
