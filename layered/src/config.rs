//! Configuration for layered matrix construction

use layered_core::{check_chunk_size, LayeredError, OffsetWidth, Result};

/// Default number of columns per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 65536;

/// Configuration for building a layered matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LayeredConfig {
    /// Requested number of columns per chunk, capped by the offset width
    pub chunk_size: usize,
    /// Integer type holding intra-chunk column offsets
    pub offset_width: OffsetWidth,
    /// Number of worker threads for the statistics and fill passes
    pub num_threads: usize,
}

impl LayeredConfig {
    /// Set the requested chunk size
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the column offset width
    pub fn with_offset_width(mut self, offset_width: OffsetWidth) -> Self {
        self.offset_width = offset_width;
        self
    }

    /// Set the number of worker threads
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// Check the configuration before any pass runs
    pub fn validate(&self) -> Result<()> {
        if self.num_threads == 0 {
            return Err(LayeredError::NonPositiveThreadCount);
        }
        check_chunk_size(self.chunk_size, self.offset_width)?;
        Ok(())
    }

    /// Chunk size that will actually be used
    pub fn effective_chunk_size(&self) -> Result<usize> {
        check_chunk_size(self.chunk_size, self.offset_width)
    }

    /// Parse a configuration from JSON, filling missing fields with defaults
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|_| LayeredError::MalformedConfig)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            offset_width: OffsetWidth::U16,
            num_threads: 1,
        }
    }
}
