//! Core types for provlog
//!
//! This crate defines the in-memory model of a provenance event:
//! - EventType: The closed set of lineage event kinds
//! - ProvenanceEvent: Immutable event record
//! - EventBuilder: Accumulates fields and produces a ProvenanceEvent
//! - ContentClaim: Reference to where a flow file's content bytes live
//! - StorageLocation: Where a decoded record was found (filename + offset)
//! - ModelError: Error type for record construction

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod error;
pub mod event;
pub mod event_type;

pub use builder::{EventBuilder, IntoOptionalString};
pub use error::{ModelError, ModelResult};
pub use event::{Attributes, AttributeUpdates, ContentClaim, ProvenanceEvent, StorageLocation};
pub use event_type::{EventType, UnknownEventType};

// Re-exported so downstream crates agree on the identifier type.
pub use uuid::Uuid;
