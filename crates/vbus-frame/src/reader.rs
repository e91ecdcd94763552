use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use tracing::trace;
use vbus_source::RingBuffer;

use crate::codec::{decode_with_config, Frame, FrameConfig};
use crate::error::{FrameError, Result};

/// Reads complete frames from any `Read` stream.
///
/// Incoming bytes are staged in a [`RingBuffer`] and decoded in batches.
/// A frame split across several reads is held back until the rest arrives,
/// so callers always get complete frames.
pub struct FrameReader<T> {
    inner: T,
    ring: RingBuffer,
    pending: VecDeque<Frame>,
    scratch: Vec<u8>,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            ring: RingBuffer::new(config.buffer_capacity),
            pending: VecDeque::new(),
            scratch: vec![0u8; config.read_chunk_size.max(1)],
            config,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Ok(frame);
            }
            let batch = self.read_frames()?;
            self.pending.extend(batch);
        }
    }

    /// Read the next non-empty batch of frames (blocking).
    ///
    /// A batch is every complete frame a single decode pass found in the
    /// buffered bytes, in wire order.
    pub fn read_frames(&mut self) -> Result<Vec<Frame>> {
        if !self.pending.is_empty() {
            return Ok(self.pending.drain(..).collect());
        }

        loop {
            let frames = self.decode_buffered()?;
            if !frames.is_empty() {
                return Ok(frames);
            }
            if self.ring.space() == 0 {
                return Err(FrameError::BufferFull {
                    capacity: self.ring.capacity(),
                });
            }
            self.fill()?;
        }
    }

    /// Number of bytes read from the stream but not yet decoded.
    pub fn buffered(&self) -> usize {
        self.ring.len()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    fn decode_buffered(&mut self) -> Result<Vec<Frame>> {
        let available = self.ring.len();
        let frames = decode_with_config(&mut self.ring, available, &self.config)?;
        if !frames.is_empty() || self.ring.is_contiguous() {
            return Ok(frames);
        }

        // A frame straddles the physical end of the ring; rotate and rescan.
        trace!(buffered = self.ring.len(), "rescanning wrapped read buffer");
        self.ring.make_contiguous();
        let available = self.ring.len();
        decode_with_config(&mut self.ring, available, &self.config)
    }

    fn fill(&mut self) -> Result<()> {
        let want = self.ring.space().min(self.scratch.len());
        loop {
            match self.inner.read(&mut self.scratch[..want]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => {
                    self.ring.put(&self.scratch[..n]);
                    return Ok(());
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::{encode, HEADER_SIZE, MAX_PAYLOAD_SIZE};

    fn wire_for(frames: &[Frame]) -> Vec<u8> {
        encode(frames).unwrap()
    }

    #[test]
    fn read_single_frame() {
        let wire = wire_for(&[Frame::new(1, "hello")]);

        let mut reader = FrameReader::new(Cursor::new(wire));
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.channel, 1);
        assert_eq!(frame.payload.as_ref(), b"hello");
    }

    #[test]
    fn read_multiple_frames() {
        let wire = wire_for(&[
            Frame::new(1, "one"),
            Frame::new(2, "two"),
            Frame::new(3, "three"),
        ]);

        let mut reader = FrameReader::new(Cursor::new(wire));

        let f1 = reader.read_frame().unwrap();
        let f2 = reader.read_frame().unwrap();
        let f3 = reader.read_frame().unwrap();

        assert_eq!((f1.channel, f1.payload.as_ref()), (1, b"one".as_ref()));
        assert_eq!((f2.channel, f2.payload.as_ref()), (2, b"two".as_ref()));
        assert_eq!((f3.channel, f3.payload.as_ref()), (3, b"three".as_ref()));
    }

    #[test]
    fn read_frames_returns_whole_batch() {
        let input = vec![Frame::new(1, "a"), Frame::new(2, "b")];
        let mut reader = FrameReader::new(Cursor::new(wire_for(&input)));

        let batch = reader.read_frames().unwrap();
        assert_eq!(batch, input);
    }

    #[test]
    fn read_frame_with_max_payload() {
        let payload = vec![0xAB; MAX_PAYLOAD_SIZE];
        let wire = wire_for(&[Frame::new(9, payload.clone())]);

        let mut reader = FrameReader::new(Cursor::new(wire));
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.channel, 9);
        assert_eq!(frame.payload.as_ref(), payload.as_slice());
    }

    #[test]
    fn partial_read_handling() {
        let wire = wire_for(&[Frame::new(4, "slow")]);

        let mut reader = FrameReader::new(ByteByByteReader {
            bytes: wire,
            pos: 0,
        });

        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.channel, 4);
        assert_eq!(frame.payload.as_ref(), b"slow");
    }

    #[test]
    fn frames_wrapping_the_buffer_are_reassembled() {
        let input: Vec<Frame> = (0..12u8).map(|i| Frame::new(i, vec![i; 5])).collect();
        let cfg = FrameConfig {
            buffer_capacity: 16,
            read_chunk_size: 7,
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config(Cursor::new(wire_for(&input)), cfg);

        for expected in &input {
            let frame = reader.read_frame().unwrap();
            assert_eq!(&frame, expected);
        }
        assert!(matches!(
            reader.read_frame().unwrap_err(),
            FrameError::ConnectionClosed
        ));
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
        assert_eq!(reader.buffered(), 0);
    }

    #[test]
    fn connection_closed_mid_frame() {
        let partial = vec![0x02, 0x00, 0x10, b'o', b'n', b'l', b'y'];

        let mut reader = FrameReader::new(Cursor::new(partial));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
        assert_eq!(reader.buffered(), 7);
    }

    #[test]
    fn oversized_frame_fills_buffer() {
        let wire = wire_for(&[Frame::new(1, vec![0u8; 64])]);
        let cfg = FrameConfig {
            buffer_capacity: 32,
            ..FrameConfig::default()
        };

        let mut reader = FrameReader::with_config(Cursor::new(wire), cfg);
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::BufferFull { capacity: 32 }));
    }

    #[test]
    fn accessors_and_into_inner() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut reader = FrameReader::new(cursor);

        let _ = reader.get_ref();
        let _ = reader.get_mut();
        assert_eq!(reader.config().read_chunk_size, 8 * 1024);
        let _inner = reader.into_inner();
    }

    #[test]
    fn read_would_block_propagates_io_error() {
        let reader = WouldBlockThenData {
            state: 0,
            bytes: wire_for(&[Frame::new(7, "ok")]),
            pos: 0,
        };
        let mut framed = FrameReader::new(reader);
        let err = framed.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::WouldBlock));
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            state: 0,
            bytes: wire_for(&[Frame::new(8, "ok")]),
            pos: 0,
        };
        let mut framed = FrameReader::new(reader);
        let frame = framed.read_frame().unwrap();

        assert_eq!(frame.channel, 8);
        assert_eq!(frame.payload.as_ref(), b"ok");
    }

    #[test]
    fn header_only_frame_is_delivered() {
        let mut reader = FrameReader::new(Cursor::new(vec![0x0A, 0x00, 0x00]));
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.channel, 10);
        assert!(frame.payload.is_empty());
        assert_eq!(frame.wire_size(), HEADER_SIZE);
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }

            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct WouldBlockThenData {
        state: u8,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for WouldBlockThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.state == 0 {
                self.state = 1;
                return Err(std::io::Error::from(ErrorKind::WouldBlock));
            }
            read_remaining(&self.bytes, &mut self.pos, buf)
        }
    }

    struct InterruptedThenData {
        state: u8,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.state == 0 {
                self.state = 1;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            read_remaining(&self.bytes, &mut self.pos, buf)
        }
    }

    fn read_remaining(bytes: &[u8], pos: &mut usize, buf: &mut [u8]) -> std::io::Result<usize> {
        if *pos >= bytes.len() {
            return Ok(0);
        }
        let n = (bytes.len() - *pos).min(buf.len());
        buf[..n].copy_from_slice(&bytes[*pos..*pos + n]);
        *pos += n;
        Ok(n)
    }
}
