//! Byte sinks consumed by the record writer.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Output side of a journal segment.
///
/// `bytes_written` is monotonic and counts every byte accepted by `write`,
/// buffered or not. The writer reports record sizes as the difference of
/// this counter before and after a record.
pub trait ByteSink: Write {
    /// Total bytes accepted so far
    fn bytes_written(&self) -> u64;

    /// Flush and force the data to stable storage
    fn sync(&mut self) -> io::Result<()>;

    /// Flush and release the sink
    fn close(&mut self) -> io::Result<()>;
}

/// Buffered segment file.
///
/// `close` flushes and releases the file handle; any later write, flush or
/// sync fails.
pub struct FileSink {
    /// `None` once closed
    inner: Option<BufWriter<File>>,
    path: PathBuf,
    bytes_written: u64,
}

impl FileSink {
    /// Create (or truncate) the file at `path`.
    pub fn create(path: impl AsRef<Path>, buffer_size: usize) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;

        Ok(FileSink {
            inner: Some(BufWriter::with_capacity(buffer_size, file)),
            path,
            bytes_written: 0,
        })
    }

    /// Get the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file handle has been released
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    fn open_writer(&mut self) -> io::Result<&mut BufWriter<File>> {
        self.inner
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "sink is closed"))
    }
}

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.open_writer()?.write(buf)?;
        self.bytes_written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.open_writer()?.flush()
    }
}

impl ByteSink for FileSink {
    fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    fn sync(&mut self) -> io::Result<()> {
        let writer = self.open_writer()?;
        writer.flush()?;
        writer.get_ref().sync_all()
    }

    fn close(&mut self) -> io::Result<()> {
        match self.inner.take() {
            Some(writer) => {
                let file = writer.into_inner().map_err(io::IntoInnerError::into_error)?;
                drop(file);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// In-memory sink.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    buf: Vec<u8>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written so far.
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Take the written bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ByteSink for MemorySink {
    fn bytes_written(&self) -> u64 {
        self.buf.len() as u64
    }

    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}
