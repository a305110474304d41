//! provlog - Versioned binary codec for provenance event journals
//!
//! A provenance event records one lineage-relevant occurrence to a unit of
//! data: its creation, transfer, transformation, routing or deletion. provlog
//! appends such events to an append-only journal segment and reads them back,
//! including segments written by every older revision of the record layout.
//!
//! # Quick Start
//!
//! ```no_run
//! use provlog::{EventBuilder, EventType, ReaderConfig, RecordReader, RecordWriter, WriterConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let writer = RecordWriter::create("1.prov", &WriterConfig::default())?;
//! writer.write_header()?;
//!
//! let event = EventBuilder::new()
//!     .event_type(EventType::Create)
//!     .updated_attribute("filename", "orders.csv")
//!     .build()?;
//! let len = writer.write_record(&event, 1)?;
//! writer.close()?;
//!
//! let mut reader = RecordReader::open_segment("1.prov", &ReaderConfig::default())?;
//! while let Some(event) = reader.next_record()? {
//!     println!("{} at {:?}", event.event_type(), event.storage_location());
//! }
//! # let _ = len;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - `provlog-core`: the event model ([`ProvenanceEvent`], [`EventBuilder`])
//! - `provlog-durability`: byte sinks/sources, the on-disk format, and the
//!   [`RecordWriter`]/[`RecordReader`] pair

pub use provlog_core::{
    AttributeUpdates, Attributes, ContentClaim, EventBuilder, EventType, IntoOptionalString,
    ModelError, ModelResult, ProvenanceEvent, StorageLocation, UnknownEventType, Uuid,
};
pub use provlog_durability::{
    ByteSink, ByteSource, CodecError, ConfigError, FileSink, FileSource, MemorySink, ReaderConfig,
    RecordLayout, RecordReader, RecordWriter, Records, SegmentHeader, SegmentLock, StreamSource,
    WriterConfig, CURRENT_SERIALIZATION_VERSION, FORMAT_IDENTIFIER, MIN_SERIALIZATION_VERSION,
};

/// Codec result type
pub use provlog_durability::Result;
