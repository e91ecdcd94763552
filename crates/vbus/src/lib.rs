//! Multiplexed virtual bus framing.
//!
//! vbus carries several logical channels over one byte stream (a serial
//! line, a USB CDC-ACM port, a pipe) using a 3-byte header per frame.
//!
//! # Crate Structure
//!
//! - [`source`] — Streaming byte sources with peek/advance semantics
//! - [`frame`] — Frame codec, blocking reader/writer, optional tokio codec

/// Re-export source types.
pub mod source {
    pub use vbus_source::*;
}

/// Re-export frame types.
pub mod frame {
    pub use vbus_frame::*;
}
