//! Record reader: decodes provenance events from one journal segment.
//!
//! A reader is bound to a single serialization version, chosen when it is
//! constructed. The version selects a [`RecordLayout`] once; every record
//! in the segment is decoded with it.
//!
//! The cursor only moves forward. `skip`/`skip_to` let an index jump over
//! records it does not need; `skip_to` refuses to move backwards.
//!
//! A reader is not shareable between threads; it owns its cursor.

use crate::config::ReaderConfig;
use crate::error::{CodecError, Result};
use crate::format::{RecordLayout, SegmentHeader};
use crate::stream::{ByteSource, FileSource};
use provlog_core::ProvenanceEvent;
use std::io;
use std::path::Path;
use tracing::{debug, trace, warn};

/// Decodes records from a byte source.
#[derive(Debug)]
pub struct RecordReader<S: ByteSource> {
    source: S,
    /// Stamped into every decoded record's storage location
    filename: String,
    layout: RecordLayout,
}

impl RecordReader<FileSource> {
    /// Open a segment file whose version is already known (e.g. from an index).
    ///
    /// The cursor starts at byte 0. If the file begins with a header, call
    /// [`RecordReader::read_header`] or [`RecordReader::skip`] past it first.
    pub fn open(path: impl AsRef<Path>, version: u32, config: &ReaderConfig) -> Result<Self> {
        config.validate()?;
        let layout = RecordLayout::for_version(version)?;
        let path = path.as_ref();
        let source = FileSource::open(path, config.buffer_size)?;

        debug!(target: "provlog::journal", path = %path.display(), version, "Opened segment");

        Ok(RecordReader {
            source,
            filename: path.display().to_string(),
            layout,
        })
    }

    /// Open a segment file, read its header and validate it.
    ///
    /// The returned reader decodes at the header's version and is positioned
    /// at the first record.
    ///
    /// # Errors
    ///
    /// - `InvalidHeader` if the header is truncated or names another format
    /// - `UnsupportedVersion` if the header's version cannot be decoded
    pub fn open_segment(path: impl AsRef<Path>, config: &ReaderConfig) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref();
        let mut source = FileSource::open(path, config.buffer_size)?;

        let header = SegmentHeader::read_from(&mut source).map_err(header_error)?;
        if !header.is_valid() {
            return Err(CodecError::InvalidHeader(format!(
                "unexpected format identifier '{}'",
                header.identifier
            )));
        }
        if !header.is_supported() {
            return Err(CodecError::UnsupportedVersion {
                version: header.version,
            });
        }
        let layout = RecordLayout::for_version(header.version)?;

        debug!(
            target: "provlog::journal",
            path = %path.display(),
            version = header.version,
            "Opened segment from header"
        );

        Ok(RecordReader {
            source,
            filename: path.display().to_string(),
            layout,
        })
    }
}

impl<S: ByteSource> RecordReader<S> {
    /// Wrap a byte source holding records of the given serialization version.
    ///
    /// # Errors
    ///
    /// - `UnsupportedVersion` if `version` is outside 1..=7
    pub fn new(source: S, version: u32, filename: impl Into<String>) -> Result<Self> {
        Ok(RecordReader {
            source,
            filename: filename.into(),
            layout: RecordLayout::for_version(version)?,
        })
    }

    /// Read a segment header at the current position.
    ///
    /// Does not change the version this reader decodes with.
    pub fn read_header(&mut self) -> Result<SegmentHeader> {
        let header = SegmentHeader::read_from(&mut self.source).map_err(header_error)?;
        debug!(
            target: "provlog::journal",
            segment = %self.filename,
            identifier = %header.identifier,
            version = header.version,
            "Read segment header"
        );
        Ok(header)
    }

    /// Decode the record at the cursor.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly before a record;
    /// repeated calls at end of stream keep returning `Ok(None)`. A stream
    /// that ends inside a record is a `MalformedRecord` error, after which
    /// the cursor position is undefined.
    pub fn next_record(&mut self) -> Result<Option<ProvenanceEvent>> {
        let offset = self.source.bytes_consumed();

        self.source.mark(1);
        if self.source.read_byte()?.is_none() {
            return Ok(None);
        }
        self.source.reset()?;

        let builder = match self.layout.decode(&mut self.source) {
            Ok(builder) => builder,
            Err(e) => {
                let err = CodecError::from_decode(e, offset);
                warn!(
                    target: "provlog::journal",
                    segment = %self.filename,
                    offset,
                    error = %err,
                    "Failed to decode record"
                );
                return Err(err);
            }
        };

        let event = builder
            .storage_location(self.filename.clone(), offset)
            .build()
            .map_err(|e| CodecError::MalformedRecord {
                offset,
                reason: e.to_string(),
            })?;

        trace!(
            target: "provlog::journal",
            segment = %self.filename,
            offset,
            event_id = event.event_id(),
            "Read record"
        );
        Ok(Some(event))
    }

    /// Advance exactly `n` bytes without decoding.
    pub fn skip(&mut self, n: u64) -> Result<()> {
        self.source.skip(n)?;
        Ok(())
    }

    /// Advance to the absolute byte offset `position`.
    ///
    /// # Errors
    ///
    /// - `IllegalSeek` if `position` is behind the cursor; the cursor does not move
    pub fn skip_to(&mut self, position: u64) -> Result<()> {
        let current = self.position();
        if position < current {
            return Err(CodecError::IllegalSeek {
                requested: position,
                current,
            });
        }
        if position > current {
            self.skip(position - current)?;
        }
        Ok(())
    }

    /// Absolute byte offset of the cursor
    pub fn position(&self) -> u64 {
        self.source.bytes_consumed()
    }

    /// Serialization version this reader decodes
    pub fn serialization_version(&self) -> u32 {
        self.layout.version()
    }

    /// Record layout selected for this reader
    pub fn layout(&self) -> RecordLayout {
        self.layout
    }

    /// Iterate over the remaining records.
    ///
    /// Yields each record until end of stream. Stops after the first error.
    pub fn records(&mut self) -> Records<'_, S> {
        Records {
            reader: self,
            done: false,
        }
    }

    /// Release the byte source.
    pub fn close(mut self) -> Result<()> {
        self.source.close()?;
        debug!(target: "provlog::journal", segment = %self.filename, "Closed reader");
        Ok(())
    }
}

/// Iterator over the remaining records of a reader.
pub struct Records<'a, S: ByteSource> {
    reader: &'a mut RecordReader<S>,
    done: bool,
}

impl<S: ByteSource> Iterator for Records<'_, S> {
    type Item = Result<ProvenanceEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_record() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn header_error(err: io::Error) -> CodecError {
    match err.kind() {
        io::ErrorKind::UnexpectedEof => {
            CodecError::InvalidHeader("segment header is truncated".to_string())
        }
        io::ErrorKind::InvalidData => CodecError::InvalidHeader(err.to_string()),
        _ => CodecError::Io(err),
    }
}
