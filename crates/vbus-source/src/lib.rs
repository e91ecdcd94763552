//! Streaming byte sources for virtual bus framing.
//!
//! A source holds bytes delivered by a transport until a decoder is ready
//! for them. Decoders inspect upcoming bytes with a two-phase protocol:
//! - [`ByteSource::peek`] claims a read-only view without consuming
//! - [`ByteSource::advance`] consumes part of the claim, or releases it with `0`
//!
//! This is the lowest layer of vbusprims. [`RingBuffer`] is the bounded store
//! used by the blocking frame reader; `BytesMut` also implements the trait so
//! the same decoder runs inside a tokio codec.

pub mod error;
pub mod ring;
pub mod traits;

pub use error::{Result, SourceError};
pub use ring::RingBuffer;
pub use traits::ByteSource;
