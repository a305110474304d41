//! Byte sources consumed by the record reader.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Input side of a journal segment.
///
/// `bytes_consumed` is the absolute offset of the next byte to be read.
/// `mark`/`reset` give a bounded, non-destructive lookahead.
pub trait ByteSource: Read {
    /// Offset of the next byte
    fn bytes_consumed(&self) -> u64;

    /// Remember the current position; valid until more than `limit` bytes are read
    fn mark(&mut self, limit: usize);

    /// Return to the marked position
    ///
    /// Fails if there is no mark or the mark's read limit was exceeded.
    fn reset(&mut self) -> io::Result<()>;

    /// Advance exactly `n` bytes; fails with `UnexpectedEof` if the stream ends first
    fn skip(&mut self, n: u64) -> io::Result<()>;

    /// Release the source
    fn close(&mut self) -> io::Result<()>;

    /// Read one byte; `None` at end of stream
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

#[derive(Debug)]
struct Mark {
    position: u64,
    limit: usize,
    recorded: Vec<u8>,
}

/// Position-counting source over any reader.
///
/// Bytes read while a mark is active are retained so `reset` can replay them.
#[derive(Debug)]
pub struct StreamSource<R> {
    inner: R,
    consumed: u64,
    replay: VecDeque<u8>,
    mark: Option<Mark>,
    closed: bool,
}

/// Buffered segment file source.
pub type FileSource = StreamSource<BufReader<File>>;

impl FileSource {
    /// Open the file at `path` for reading.
    pub fn open(path: impl AsRef<Path>, buffer_size: usize) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(StreamSource::new(BufReader::with_capacity(buffer_size, file)))
    }
}

impl<R: Read> StreamSource<R> {
    /// Wrap a reader; its current position counts as offset 0.
    pub fn new(inner: R) -> Self {
        StreamSource {
            inner,
            consumed: 0,
            replay: VecDeque::new(),
            mark: None,
            closed: false,
        }
    }

    fn record(&mut self, bytes: &[u8]) {
        if let Some(mark) = self.mark.as_mut() {
            if mark.recorded.len() + bytes.len() > mark.limit {
                self.mark = None;
            } else {
                mark.recorded.extend_from_slice(bytes);
            }
        }
    }
}

impl<R: Read> Read for StreamSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::Other, "source is closed"));
        }

        let n = if self.replay.is_empty() {
            self.inner.read(buf)?
        } else {
            let n = buf.len().min(self.replay.len());
            for (slot, byte) in buf.iter_mut().zip(self.replay.drain(..n)) {
                *slot = byte;
            }
            n
        };

        self.record(&buf[..n]);
        self.consumed += n as u64;
        Ok(n)
    }
}

impl<R: Read> ByteSource for StreamSource<R> {
    fn bytes_consumed(&self) -> u64 {
        self.consumed
    }

    fn mark(&mut self, limit: usize) {
        self.mark = Some(Mark {
            position: self.consumed,
            limit,
            recorded: Vec::new(),
        });
    }

    fn reset(&mut self) -> io::Result<()> {
        let mark = self.mark.take().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "reset without a valid mark")
        })?;

        for byte in mark.recorded.iter().rev() {
            self.replay.push_front(*byte);
        }
        self.consumed = mark.position;

        // The mark stays usable after a reset.
        self.mark = Some(Mark {
            position: mark.position,
            limit: mark.limit,
            recorded: Vec::new(),
        });
        Ok(())
    }

    fn skip(&mut self, n: u64) -> io::Result<()> {
        let skipped = io::copy(&mut Read::by_ref(self).take(n), &mut io::sink())?;
        if skipped < n {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("stream ended after skipping {} of {} bytes", skipped, n),
            ));
        }
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        self.replay.clear();
        self.mark = None;
        Ok(())
    }
}
