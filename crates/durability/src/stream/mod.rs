//! Byte sink and byte source contracts.
//!
//! The codec never touches files directly; it writes through a [`ByteSink`]
//! and reads through a [`ByteSource`]:
//!
//! - `sink`: position-tracked writes with flush/sync (`FileSink`, `MemorySink`)
//! - `source`: position-tracked reads with mark/reset and skip (`StreamSource`, `FileSource`)

pub mod sink;
pub mod source;

pub use sink::{ByteSink, FileSink, MemorySink};
pub use source::{ByteSource, FileSource, StreamSource};
