use tracing::{debug, trace};

use crate::error::{Result, SourceError};
use crate::traits::ByteSource;

/// A bounded byte store with claim/finish semantics.
///
/// Storage is allocated once. Writes wrap around the physical end of the
/// buffer, and [`peek`](ByteSource::peek) only ever returns the contiguous
/// run starting at the read cursor, so a claim near the wrap point can be
/// shorter than [`len`](RingBuffer::len). Call
/// [`make_contiguous`](RingBuffer::make_contiguous) to rotate the contents
/// when a consumer needs to see everything at once.
pub struct RingBuffer {
    storage: Box<[u8]>,
    head: usize,
    len: usize,
    claimed: usize,
}

impl RingBuffer {
    /// Create an empty ring buffer holding at most `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            storage: vec![0u8; capacity].into_boxed_slice(),
            head: 0,
            len: 0,
            claimed: 0,
        }
    }

    /// Total number of bytes the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Number of unconsumed bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Free space left for [`put`](RingBuffer::put).
    pub fn space(&self) -> usize {
        self.capacity() - self.len
    }

    /// Returns true if the unconsumed bytes do not cross the physical end.
    pub fn is_contiguous(&self) -> bool {
        self.head + self.len <= self.capacity()
    }

    /// Append as much of `data` as fits and return the number of bytes written.
    pub fn put(&mut self, data: &[u8]) -> usize {
        let written = data.len().min(self.space());
        if written < data.len() {
            debug!(
                requested = data.len(),
                written, "ring buffer full, dropping excess bytes"
            );
        }
        if written == 0 {
            return 0;
        }

        let capacity = self.capacity();
        let tail = (self.head + self.len) % capacity;
        let first = written.min(capacity - tail);
        self.storage[tail..tail + first].copy_from_slice(&data[..first]);
        self.storage[..written - first].copy_from_slice(&data[first..written]);
        self.len += written;
        written
    }

    /// Rotate storage so every unconsumed byte is reachable by a single peek.
    ///
    /// Any outstanding claim is released.
    pub fn make_contiguous(&mut self) {
        self.claimed = 0;
        if self.is_contiguous() {
            return;
        }
        trace!(
            head = self.head,
            len = self.len,
            "rotating ring buffer contents"
        );
        self.storage.rotate_left(self.head);
        self.head = 0;
    }

    /// Drop every unconsumed byte.
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
        self.claimed = 0;
    }
}

impl ByteSource for RingBuffer {
    fn available_bytes(&self) -> usize {
        self.len
    }

    fn peek(&mut self, max_len: usize) -> &[u8] {
        let contiguous = self.len.min(self.capacity() - self.head);
        let claimed = max_len.min(contiguous);
        self.claimed = claimed;
        &self.storage[self.head..self.head + claimed]
    }

    fn advance(&mut self, n: usize) -> Result<()> {
        if n > self.claimed {
            return Err(SourceError::AdvanceBeyondClaim {
                requested: n,
                claimed: self.claimed,
            });
        }
        self.claimed = 0;
        if n == 0 {
            return Ok(());
        }

        self.len -= n;
        self.head = if self.len == 0 {
            0
        } else {
            (self.head + n) % self.capacity()
        };
        Ok(())
    }
}

impl std::fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity())
            .field("head", &self.head)
            .field("len", &self.len)
            .field("claimed", &self.claimed)
            .finish()
    }
}
