use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, error, trace};
use vbus_source::ByteSource;

use crate::error::{FrameError, Result};

/// Frame header: channel (1) + length (2) = 3 bytes.
pub const HEADER_SIZE: usize = 3;

/// Largest payload the 16-bit length field can describe.
pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize;

/// Largest frame on the wire (header + maximum payload).
pub const MAX_FRAME_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE;

/// Default number of frame slots reserved on the first append of a decode pass.
pub const DEFAULT_INITIAL_FRAME_CAPACITY: usize = 8;

/// Default read buffer size: room for two maximum-size frames.
pub const DEFAULT_BUFFER_CAPACITY: usize = 2 * MAX_FRAME_SIZE;

/// Default size of a single transport read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 8 * 1024;

/// A framed message tagged with its virtual bus channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The logical sub-stream this message belongs to.
    pub channel: u8,
    /// The message payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(channel: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            channel,
            payload: payload.into(),
        }
    }

    /// Payload length in bytes.
    pub fn size(&self) -> usize {
        self.payload.len()
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Configuration for decoding and buffered reading.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Frame slots reserved on the first append. Capacity doubles after that.
    pub initial_frame_capacity: usize,
    /// Bytes held by a [`FrameReader`](crate::FrameReader) between reads.
    pub buffer_capacity: usize,
    /// Upper bound on a single read from the underlying stream.
    pub read_chunk_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            initial_frame_capacity: DEFAULT_INITIAL_FRAME_CAPACITY,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

/// Decode every complete frame within the first `limit` bytes of `source`.
///
/// See [`decode_with_config`].
pub fn decode<S: ByteSource + ?Sized>(source: &mut S, limit: usize) -> Result<Vec<Frame>> {
    decode_with_config(source, limit, &FrameConfig::default())
}

/// Decode every complete frame within the first `limit` bytes of `source`.
///
/// Frames are returned in wire order and their bytes are consumed. Scanning
/// stops at the first frame that is not fully present, either because the
/// source does not hold it yet or because it would run past `limit`; those
/// bytes stay in the source for a later call. An empty result is not an
/// error.
///
/// Fails with [`FrameError::Unsupported`] if `limit` exceeds the bytes
/// available. On [`FrameError::OutOfMemory`] every frame decoded by this call
/// is dropped, but bytes consumed for them are not restored.
pub fn decode_with_config<S: ByteSource + ?Sized>(
    source: &mut S,
    limit: usize,
    config: &FrameConfig,
) -> Result<Vec<Frame>> {
    let available = source.available_bytes();
    if limit > available {
        error!(
            requested = limit,
            available, "decode limit exceeds buffered bytes"
        );
        return Err(FrameError::Unsupported {
            requested: limit,
            available,
        });
    }

    let mut frames = Vec::new();
    let mut remaining = limit;

    while remaining >= HEADER_SIZE {
        let found = decode_frame_with(source, remaining, || {
            reserve_slot(&mut frames, config.initial_frame_capacity)
        })?;
        let Some(frame) = found else {
            break;
        };
        remaining -= frame.wire_size();
        frames.push(frame);
    }

    trace!(
        frames = frames.len(),
        consumed = limit - remaining,
        "decode pass complete"
    );
    Ok(frames)
}

/// Decode a single frame from the first `max_len` bytes of `source`.
///
/// Returns `Ok(None)` and consumes nothing if no complete frame fits within
/// `max_len` bytes of a single peek. On success, consumes the frame bytes.
pub fn decode_frame<S: ByteSource + ?Sized>(
    source: &mut S,
    max_len: usize,
) -> Result<Option<Frame>> {
    decode_frame_with(source, max_len, || Ok(()))
}

/// Parse one frame, run `admit` once it is known to be complete, then commit.
///
/// An error from `admit` or from the payload copy releases the claim, so the
/// frame stays in the source.
fn decode_frame_with<S, F>(source: &mut S, max_len: usize, admit: F) -> Result<Option<Frame>>
where
    S: ByteSource + ?Sized,
    F: FnOnce() -> Result<()>,
{
    let parsed = {
        let claim = source.peek(max_len);
        if claim.len() < HEADER_SIZE {
            None
        } else {
            let payload_len = u16::from_be_bytes([claim[1], claim[2]]) as usize;
            let frame_size = HEADER_SIZE + payload_len;
            if frame_size > claim.len() || frame_size > max_len {
                debug!(
                    frame_size,
                    claimed = claim.len(),
                    "insufficient data, leaving frame in source"
                );
                None
            } else {
                let payload =
                    admit().and_then(|()| copy_payload(&claim[HEADER_SIZE..frame_size]));
                Some((claim[0], payload))
            }
        }
    };

    let Some((channel, payload)) = parsed else {
        source.advance(0)?;
        return Ok(None);
    };

    let payload = match payload {
        Ok(payload) => payload,
        Err(err) => {
            source.advance(0)?;
            return Err(err);
        }
    };

    let frame = Frame::new(channel, payload);
    source.advance(frame.wire_size())?;
    Ok(Some(frame))
}

/// Encode `frames` into one contiguous buffer, in order.
///
/// Fails with [`FrameError::InvalidArgument`] for an empty slice and with
/// [`FrameError::FieldOverflow`] if any payload exceeds
/// [`MAX_PAYLOAD_SIZE`].
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────┬────────────────────┐
/// │ Channel (1B) │ Length       │ Payload            │
/// │              │ (2B BE)      │ (Length bytes)     │
/// └──────────────┴──────────────┴────────────────────┘
/// ```
pub fn encode(frames: &[Frame]) -> Result<Vec<u8>> {
    encode_parts(
        frames
            .iter()
            .map(|frame| (frame.channel, frame.payload.as_ref())),
    )
}

/// Encode borrowed `(channel, payload)` pairs into one contiguous buffer.
///
/// Same contract as [`encode`], for callers whose payloads live outside a
/// [`Frame`]. The iterator is walked twice: once to size the output, once to
/// fill it.
pub fn encode_parts<'a, I>(frames: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = (u8, &'a [u8])>,
    I::IntoIter: Clone,
{
    let frames = frames.into_iter();
    if frames.clone().next().is_none() {
        error!("encode called without frames");
        return Err(FrameError::InvalidArgument("at least one frame is required"));
    }

    let mut total = 0usize;
    for (channel, payload) in frames.clone() {
        check_payload_size(channel, payload.len())?;
        total = total
            .checked_add(HEADER_SIZE + payload.len())
            .ok_or_else(|| {
                error!("encoded size overflows usize");
                FrameError::OutOfMemory
            })?;
    }

    let mut buf = Vec::new();
    buf.try_reserve_exact(total).map_err(|_| {
        error!(total, "failed to allocate encode buffer");
        FrameError::OutOfMemory
    })?;

    for (channel, payload) in frames {
        put_frame(channel, payload, &mut buf)?;
    }

    debug_assert_eq!(buf.len(), total);
    Ok(buf)
}

/// Append a single encoded frame to `dst`.
pub fn encode_frame(frame: &Frame, dst: &mut BytesMut) -> Result<()> {
    check_payload_size(frame.channel, frame.size())?;
    dst.reserve(frame.wire_size());
    put_frame(frame.channel, &frame.payload, dst)
}

fn put_frame<B: BufMut>(channel: u8, payload: &[u8], dst: &mut B) -> Result<()> {
    let size = check_payload_size(channel, payload.len())?;
    dst.put_u8(channel);
    dst.put_u16(size);
    dst.put_slice(payload);
    Ok(())
}

fn check_payload_size(channel: u8, size: usize) -> Result<u16> {
    u16::try_from(size).map_err(|_| {
        error!(channel, size, "frame payload too large");
        FrameError::FieldOverflow {
            size,
            max: MAX_PAYLOAD_SIZE,
        }
    })
}

fn copy_payload(src: &[u8]) -> Result<Vec<u8>> {
    let mut payload = Vec::new();
    payload.try_reserve_exact(src.len()).map_err(|_| {
        error!(size = src.len(), "failed to allocate frame payload");
        FrameError::OutOfMemory
    })?;
    payload.extend_from_slice(src);
    Ok(payload)
}

/// Make room for one more frame, doubling capacity when full.
fn reserve_slot(frames: &mut Vec<Frame>, initial: usize) -> Result<()> {
    if frames.len() < frames.capacity() {
        return Ok(());
    }
    let additional = frames.capacity().max(initial).max(1);
    frames.try_reserve_exact(additional).map_err(|_| {
        error!(
            frames = frames.len(),
            additional, "failed to grow frame collection"
        );
        FrameError::OutOfMemory
    })
}
