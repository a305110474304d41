//! Record writer: appends provenance events to one journal segment.
//!
//! The writer always emits the current record layout. Every operation is
//! internally serialized, so a single `RecordWriter` can be shared between
//! producer threads (e.g. behind an `Arc`) without interleaving partial
//! records.
//!
//! # Segment Lock
//!
//! Internal serialization covers one call at a time. Callers that need
//! "write a record, then record its offset elsewhere" to be atomic hold the
//! segment lock across both calls:
//!
//! ```ignore
//! let guard = writer.lock();
//! let offset = writer.bytes_written();
//! let len = writer.write_record(&event, id)?;
//! index.insert(id, offset, len);
//! guard.unlock();
//! ```
//!
//! The segment lock guards nothing inside the writer; it is purely a
//! coordination point for callers.

use crate::config::WriterConfig;
use crate::error::{CodecError, Result};
use crate::format::{encode_event, SegmentHeader};
use crate::stream::{ByteSink, FileSink};
use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};
use provlog_core::ProvenanceEvent;
use std::fmt;
use std::io::Write;
use std::path::Path;
use tracing::{debug, trace};

/// Mutable writer state, guarded by the state mutex.
struct WriterState<S> {
    sink: S,
    records_written: u64,
    closed: bool,
    /// Reused encoding buffer
    scratch: Vec<u8>,
}

/// Appends encoded provenance events to a byte sink.
pub struct RecordWriter<S: ByteSink> {
    /// Segment this writer is bound to (file path for file-backed writers)
    name: String,

    /// Whether `close()` fsyncs before releasing the sink
    sync_on_close: bool,

    state: Mutex<WriterState<S>>,

    /// External coordination lock
    segment_lock: ReentrantMutex<()>,
}

/// Held segment lock. Released on drop or via [`SegmentLock::unlock`].
#[must_use = "the segment lock is released as soon as the guard is dropped"]
pub struct SegmentLock<'a> {
    _guard: ReentrantMutexGuard<'a, ()>,
}

impl SegmentLock<'_> {
    /// Release the lock.
    pub fn unlock(self) {
        drop(self);
    }
}

impl RecordWriter<FileSink> {
    /// Create a segment file at `path` (truncating any existing file).
    ///
    /// The header is not written; call [`RecordWriter::write_header`] first.
    pub fn create(path: impl AsRef<Path>, config: &WriterConfig) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref();
        let sink = FileSink::create(path, config.buffer_size)?;

        debug!(target: "provlog::journal", path = %path.display(), "Created segment");

        let mut writer = RecordWriter::new(sink, path.display().to_string());
        writer.sync_on_close = config.sync_on_close;
        Ok(writer)
    }
}

impl<S: ByteSink> RecordWriter<S> {
    /// Wrap a sink. `name` identifies the segment in logs and `Debug` output.
    pub fn new(sink: S, name: impl Into<String>) -> Self {
        RecordWriter {
            name: name.into(),
            sync_on_close: false,
            state: Mutex::new(WriterState {
                sink,
                records_written: 0,
                closed: false,
                scratch: Vec::with_capacity(512),
            }),
            segment_lock: ReentrantMutex::new(()),
        }
    }

    /// Segment name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Write the segment header: format identifier + current version.
    ///
    /// Call once, before any record.
    pub fn write_header(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(CodecError::Closed);
        }

        let header = SegmentHeader::current();
        header.write_to(&mut state.sink)?;
        state.sink.flush()?;

        debug!(
            target: "provlog::journal",
            segment = %self.name,
            version = header.version,
            "Wrote segment header"
        );
        Ok(())
    }

    /// Encode `event` under `record_id` and append it.
    ///
    /// Returns the number of bytes appended, measured from the sink's byte
    /// counter. The record is fully encoded before any byte reaches the
    /// sink, so encoding errors (such as an over-long string) append
    /// nothing; an I/O error may still leave a partial record behind.
    ///
    /// The sink is flushed before returning: once this succeeds the record
    /// is visible to readers of the segment, though not necessarily durable
    /// until [`RecordWriter::sync`].
    pub fn write_record(&self, event: &ProvenanceEvent, record_id: u64) -> Result<u64> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.closed {
            return Err(CodecError::Closed);
        }

        state.scratch.clear();
        encode_event(event, record_id, &mut state.scratch)?;

        let before = state.sink.bytes_written();
        state.sink.write_all(&state.scratch)?;
        state.sink.flush()?;
        let written = state.sink.bytes_written() - before;
        state.records_written += 1;

        trace!(
            target: "provlog::journal",
            segment = %self.name,
            record_id,
            event_type = %event.event_type(),
            bytes = written,
            "Wrote record"
        );
        Ok(written)
    }

    /// Number of records written since creation
    pub fn records_written(&self) -> u64 {
        self.state.lock().records_written
    }

    /// Total bytes accepted by the sink, header included
    pub fn bytes_written(&self) -> u64 {
        self.state.lock().sink.bytes_written()
    }

    /// Flush and force written data to stable storage.
    pub fn sync(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(CodecError::Closed);
        }
        state.sink.sync()?;
        Ok(())
    }

    /// Flush and close the sink.
    ///
    /// Takes the segment lock, so a close never lands inside another
    /// caller's locked write-and-index section. Closing twice is a no-op.
    pub fn close(&self) -> Result<()> {
        let _segment = self.segment_lock.lock();
        let mut state = self.state.lock();
        if state.closed {
            return Ok(());
        }

        if self.sync_on_close {
            state.sink.sync()?;
        }
        state.sink.close()?;
        state.closed = true;

        debug!(
            target: "provlog::journal",
            segment = %self.name,
            records = state.records_written,
            bytes = state.sink.bytes_written(),
            "Closed segment"
        );
        Ok(())
    }

    /// Whether `close()` has completed
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Acquire the segment lock, blocking until it is available.
    ///
    /// Re-entrant: the holding thread may acquire it again (and may call
    /// `close()` while holding it).
    pub fn lock(&self) -> SegmentLock<'_> {
        SegmentLock {
            _guard: self.segment_lock.lock(),
        }
    }

    /// Acquire the segment lock if no other thread holds it.
    pub fn try_lock(&self) -> Option<SegmentLock<'_>> {
        self.segment_lock
            .try_lock()
            .map(|guard| SegmentLock { _guard: guard })
    }

    /// Consume the writer and return its sink.
    pub fn into_sink(self) -> S {
        self.state.into_inner().sink
    }
}

impl<S: ByteSink> fmt::Debug for RecordWriter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("RecordWriter");
        s.field("name", &self.name);
        if let Some(state) = self.state.try_lock() {
            s.field("records_written", &state.records_written)
                .field("closed", &state.closed);
        }
        s.finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FORMAT_IDENTIFIER;
    use crate::stream::MemorySink;
    use provlog_core::{EventBuilder, EventType};
    use std::sync::Arc;
    use std::thread;

    fn create_event() -> ProvenanceEvent {
        EventBuilder::new()
            .event_type(EventType::Create)
            .event_time(1_000)
            .component_id("generate-1")
            .updated_attribute("filename", "data.csv")
            .build()
            .unwrap()
    }

    fn memory_writer() -> RecordWriter<MemorySink> {
        RecordWriter::new(MemorySink::new(), "memory")
    }

    #[test]
    fn test_header_bytes() {
        let writer = memory_writer();
        writer.write_header().unwrap();

        let bytes = writer.into_sink().into_inner();
        let id_len = FORMAT_IDENTIFIER.len();
        assert_eq!(&bytes[0..2], &(id_len as u16).to_be_bytes());
        assert_eq!(&bytes[2..2 + id_len], FORMAT_IDENTIFIER.as_bytes());
        assert_eq!(&bytes[2 + id_len..], &7u32.to_be_bytes());
    }

    #[test]
    fn test_write_record_reports_bytes() {
        let writer = memory_writer();
        writer.write_header().unwrap();
        let header_len = writer.bytes_written();

        let mut total = 0;
        for id in 0..5 {
            total += writer.write_record(&create_event(), id).unwrap();
        }

        assert_eq!(writer.records_written(), 5);
        assert_eq!(writer.bytes_written() - header_len, total);
        assert_eq!(writer.into_sink().bytes().len() as u64, header_len + total);
    }

    #[test]
    fn test_record_starts_with_id() {
        let writer = memory_writer();
        writer.write_record(&create_event(), 0xABCD).unwrap();

        let bytes = writer.into_sink().into_inner();
        assert_eq!(&bytes[0..8], &0xABCDu64.to_be_bytes());
    }

    #[test]
    fn test_encoding_error_writes_nothing() {
        let writer = memory_writer();
        let event = EventBuilder::new()
            .event_type(EventType::Create)
            .details("x".repeat(70_000))
            .build()
            .unwrap();

        let err = writer.write_record(&event, 1).unwrap_err();
        assert!(matches!(err, CodecError::StringTooLong { field: "details", .. }));
        assert_eq!(writer.bytes_written(), 0);
        assert_eq!(writer.records_written(), 0);
    }

    #[test]
    fn test_write_after_close() {
        let writer = memory_writer();
        writer.write_header().unwrap();
        writer.close().unwrap();
        assert!(writer.is_closed());

        assert!(matches!(
            writer.write_record(&create_event(), 1),
            Err(CodecError::Closed)
        ));
        assert!(matches!(writer.write_header(), Err(CodecError::Closed)));
        assert!(matches!(writer.sync(), Err(CodecError::Closed)));

        // second close is a no-op
        writer.close().unwrap();
    }

    #[test]
    fn test_close_while_holding_segment_lock() {
        let writer = memory_writer();
        let guard = writer.lock();
        writer.write_record(&create_event(), 1).unwrap();
        writer.close().unwrap();
        guard.unlock();
        assert!(writer.is_closed());
    }

    #[test]
    fn test_segment_lock_is_reentrant() {
        let writer = memory_writer();
        let outer = writer.lock();
        let inner = writer.try_lock();
        assert!(inner.is_some());
        drop(inner);
        outer.unlock();
    }

    #[test]
    fn test_try_lock_contended() {
        let writer = Arc::new(memory_writer());
        let guard = writer.lock();

        let w = Arc::clone(&writer);
        let acquired = thread::spawn(move || w.try_lock().is_some()).join().unwrap();
        assert!(!acquired);

        guard.unlock();
        let w = Arc::clone(&writer);
        let acquired = thread::spawn(move || w.try_lock().is_some()).join().unwrap();
        assert!(acquired);
    }

    #[test]
    fn test_concurrent_writes_do_not_interleave() {
        let writer = Arc::new(memory_writer());
        let single = {
            let sizing = memory_writer();
            sizing.write_record(&create_event(), 0).unwrap()
        };

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let writer = Arc::clone(&writer);
                thread::spawn(move || {
                    for i in 0..25 {
                        let n = writer.write_record(&create_event(), t * 100 + i).unwrap();
                        assert_eq!(n, single);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(writer.records_written(), 100);
        assert_eq!(writer.bytes_written(), 100 * single);
    }

    #[test]
    fn test_create_file_writer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.prov");

        let writer = RecordWriter::create(&path, &WriterConfig::for_testing()).unwrap();
        assert_eq!(writer.name(), path.display().to_string());
        writer.write_header().unwrap();
        writer.write_record(&create_event(), 1).unwrap();
        let total = writer.bytes_written();
        writer.close().unwrap();

        assert_eq!(std::fs::metadata(&path).unwrap().len(), total);
        assert!(writer.into_sink().is_closed());
    }

    #[test]
    fn test_record_visible_before_sync() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("visible.prov");

        let writer = RecordWriter::create(&path, &WriterConfig::default()).unwrap();
        writer.write_header().unwrap();
        let header_len = writer.bytes_written();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), header_len);

        writer.write_record(&create_event(), 1).unwrap();
        let total = writer.bytes_written();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), total);

        let mut reader =
            crate::RecordReader::open_segment(&path, &crate::ReaderConfig::default()).unwrap();
        let event = reader.next_record().unwrap().unwrap();
        assert_eq!(event.event_id(), 1);
        assert_eq!(event.storage_location().unwrap().offset, header_len);
        assert!(reader.next_record().unwrap().is_none());

        writer.close().unwrap();
    }

    #[test]
    fn test_create_rejects_bad_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = WriterConfig::new().with_buffer_size(16);
        let err = RecordWriter::create(dir.path().join("x.prov"), &config).unwrap_err();
        assert!(matches!(err, CodecError::Config(_)));
    }

    #[test]
    fn test_debug_names_segment() {
        let writer = memory_writer();
        let dbg = format!("{:?}", writer);
        assert!(dbg.contains("memory"));
        assert!(dbg.contains("records_written"));
    }
}
