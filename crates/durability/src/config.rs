//! Writer and reader configuration.

/// Default I/O buffer size (64 KiB)
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Smallest accepted I/O buffer size (1 KiB)
pub const MIN_BUFFER_SIZE: usize = 1024;

/// Record writer configuration.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Capacity of the buffer in front of the segment file (default: 64KB).
    pub buffer_size: usize,

    /// Whether `close()` forces an fsync before releasing the sink (default: false).
    ///
    /// `sync()` is always available for an explicit durability barrier.
    pub sync_on_close: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        WriterConfig {
            buffer_size: DEFAULT_BUFFER_SIZE,
            sync_on_close: false,
        }
    }
}

impl WriterConfig {
    /// Create a new writer configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set buffer size (builder pattern).
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Set sync-on-close (builder pattern).
    pub fn with_sync_on_close(mut self, sync: bool) -> Self {
        self.sync_on_close = sync;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_buffer(self.buffer_size)
    }

    /// Create a configuration for testing (small buffer, durable close).
    pub fn for_testing() -> Self {
        WriterConfig {
            buffer_size: 4 * 1024,
            sync_on_close: true,
        }
    }
}

/// Record reader configuration.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Capacity of the read buffer over the segment file (default: 64KB).
    pub buffer_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl ReaderConfig {
    /// Create a new reader configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set buffer size (builder pattern).
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_buffer(self.buffer_size)
    }
}

fn validate_buffer(size: usize) -> Result<(), ConfigError> {
    if size < MIN_BUFFER_SIZE {
        return Err(ConfigError::BufferTooSmall(size));
    }
    Ok(())
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Buffer size is below the 1KB minimum.
    #[error("Buffer size must be at least 1KB (got {0} bytes)")]
    BufferTooSmall(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_defaults() {
        let config = WriterConfig::default();
        assert_eq!(config.buffer_size, 64 * 1024);
        assert!(!config.sync_on_close);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_writer_builder() {
        let config = WriterConfig::new()
            .with_buffer_size(8 * 1024)
            .with_sync_on_close(true);
        assert_eq!(config.buffer_size, 8 * 1024);
        assert!(config.sync_on_close);
    }

    #[test]
    fn test_buffer_too_small() {
        let config = WriterConfig::new().with_buffer_size(512);
        assert_eq!(config.validate(), Err(ConfigError::BufferTooSmall(512)));

        let config = ReaderConfig::new().with_buffer_size(16);
        assert_eq!(config.validate(), Err(ConfigError::BufferTooSmall(16)));
    }

    #[test]
    fn test_for_testing_is_valid() {
        assert!(WriterConfig::for_testing().validate().is_ok());
        assert!(ReaderConfig::default().validate().is_ok());
    }
}
