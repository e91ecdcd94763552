use vbus_source::SourceError;

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A required input was missing or empty.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The decode limit is larger than what the source currently holds.
    #[error("decode limit of {requested} bytes exceeds the {available} bytes available")]
    Unsupported { requested: usize, available: usize },

    /// An allocation for frames or an output buffer failed.
    #[error("out of memory")]
    OutOfMemory,

    /// A payload does not fit the 16-bit length field.
    #[error("payload of {size} bytes overflows the length field (max {max})")]
    FieldOverflow { size: usize, max: usize },

    /// The underlying source rejected a consume.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// The read buffer is full and still holds no complete frame.
    #[error("read buffer full ({capacity} bytes) without a complete frame")]
    BufferFull { capacity: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended; any bytes of an incomplete frame stay buffered.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
