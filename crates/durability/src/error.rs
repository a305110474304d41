//! Codec error types

use crate::config::ConfigError;
use crate::format::{CURRENT_SERIALIZATION_VERSION, MIN_SERIALIZATION_VERSION};
use std::io;
use thiserror::Error;

/// Result type alias for journal codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors surfaced by the record writer and reader
///
/// The codec never retries and never recovers silently. After a
/// `MalformedRecord` or `Io` error from a reader, the stream position is
/// undefined; reopen at a known-good offset instead of reading on.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Reader asked to decode a serialization version it does not know
    #[error(
        "Unsupported serialization version {version}: supported versions are {}-{}",
        MIN_SERIALIZATION_VERSION,
        CURRENT_SERIALIZATION_VERSION
    )]
    UnsupportedVersion {
        /// The rejected version
        version: u32,
    },

    /// Structural decode failure in the middle of a record
    #[error("Malformed record at offset {offset}: {reason}")]
    MalformedRecord {
        /// Byte offset where the record began
        offset: u64,
        /// What went wrong
        reason: String,
    },

    /// Seek target is behind the reader's cursor
    #[error("Cannot skip to byte offset {requested}: already at byte offset {current}")]
    IllegalSeek {
        /// Requested absolute offset
        requested: u64,
        /// Current absolute offset
        current: u64,
    },

    /// A length-limited string exceeds the 65535-byte encoding limit
    #[error("Field {field} is {len} bytes; limit is {limit} bytes")]
    StringTooLong {
        /// Field being encoded
        field: &'static str,
        /// Encoded length in bytes
        len: usize,
        /// Maximum encodable length
        limit: usize,
    },

    /// Segment header is missing, truncated or names another format
    #[error("Invalid segment header: {0}")]
    InvalidHeader(String),

    /// Writer was used after `close()`
    #[error("Record writer is closed")]
    Closed,

    /// Invalid writer/reader configuration
    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),

    /// Underlying sink/source failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CodecError {
    /// Classify an I/O error raised while decoding the record at `offset`
    ///
    /// Running out of bytes mid-record and invalid content are structural
    /// failures of the record; anything else came from the byte source.
    pub fn from_decode(err: io::Error, offset: u64) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => CodecError::MalformedRecord {
                offset,
                reason: format!("record truncated: {}", err),
            },
            io::ErrorKind::InvalidData => CodecError::MalformedRecord {
                offset,
                reason: err.to_string(),
            },
            _ => CodecError::Io(err),
        }
    }

    /// Whether this error is a structural decode failure
    pub fn is_malformed(&self) -> bool {
        matches!(self, CodecError::MalformedRecord { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_version_display() {
        let err = CodecError::UnsupportedVersion { version: 9 };
        let msg = err.to_string();
        assert!(msg.contains('9'));
        assert!(msg.contains("1-7"));
    }

    #[test]
    fn test_illegal_seek_display() {
        let err = CodecError::IllegalSeek {
            requested: 10,
            current: 42,
        };
        let msg = err.to_string();
        assert!(msg.contains("10"));
        assert!(msg.contains("42"));
    }

    #[test]
    fn test_from_decode_classification() {
        let eof = io::Error::new(io::ErrorKind::UnexpectedEof, "failed to fill whole buffer");
        let err = CodecError::from_decode(eof, 128);
        assert!(err.is_malformed());
        assert!(err.to_string().contains("128"));

        let invalid = io::Error::new(io::ErrorKind::InvalidData, "unknown event type 'X'");
        let err = CodecError::from_decode(invalid, 7);
        assert!(matches!(err, CodecError::MalformedRecord { offset: 7, .. }));

        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = CodecError::from_decode(denied, 0);
        assert!(matches!(err, CodecError::Io(_)));
        assert!(!err.is_malformed());
    }
}
