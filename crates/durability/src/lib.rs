//! Durability layer for provlog
//!
//! This crate handles everything that touches bytes:
//!
//! - Byte sinks and sources: position-tracked writes with flush/sync, and
//!   position-tracked reads with mark/reset and skip
//! - Binary on-disk format: segment header, primitive encodings and the
//!   per-version record layouts (1 through 7)
//! - RecordWriter: appends events in the current layout and reports the
//!   exact byte size of each record
//! - RecordReader: decodes any supported version back into
//!   [`ProvenanceEvent`](provlog_core::ProvenanceEvent)s, with forward-only skip

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config; // Writer/reader buffer and sync settings
pub mod error; // CodecError and the crate Result alias
pub mod format; // Segment header, primitives, record layouts
pub mod reader; // RecordReader and its record iterator
pub mod stream; // ByteSink/ByteSource contracts and implementations
pub mod writer; // RecordWriter and the segment lock

// === Re-exports ===
pub use config::{ConfigError, ReaderConfig, WriterConfig, DEFAULT_BUFFER_SIZE, MIN_BUFFER_SIZE};
pub use error::{CodecError, Result};
pub use format::{
    RecordLayout, SegmentHeader, CURRENT_SERIALIZATION_VERSION, FORMAT_IDENTIFIER,
    MAX_SHORT_STRING_LEN, MIN_SERIALIZATION_VERSION,
};
pub use reader::{RecordReader, Records};
pub use stream::{ByteSink, ByteSource, FileSink, FileSource, MemorySink, StreamSource};
pub use writer::{RecordWriter, SegmentLock};
