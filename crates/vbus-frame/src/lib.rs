//! Length-prefixed, channel-tagged framing for a multiplexed virtual bus.
//!
//! Every frame on the wire is:
//! - A 1-byte channel index selecting the logical sub-stream
//! - A 2-byte big-endian payload length
//! - The payload itself (0 to 65535 bytes)
//!
//! The decoder scans a [`ByteSource`](vbus_source::ByteSource) and leaves
//! truncated trailing frames in place, so a frame split across two transport
//! deliveries decodes once the rest arrives.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod tokio_codec;

pub use codec::{
    decode, decode_frame, decode_with_config, encode, encode_frame, encode_parts, Frame, FrameConfig,
    HEADER_SIZE, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;

#[cfg(feature = "async")]
pub use tokio_codec::VbusCodec;
