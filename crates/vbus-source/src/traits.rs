use bytes::{Buf, BytesMut};

use crate::error::{Result, SourceError};

/// A sequential byte store with a read cursor.
///
/// Consumers work in two phases: [`peek`](ByteSource::peek) claims a view of
/// upcoming bytes without moving the cursor, then
/// [`advance`](ByteSource::advance) consumes some prefix of that claim.
/// Advancing by `0` releases the claim and leaves every byte in place.
///
/// Implementations are not synchronized. A producer filling the source and a
/// consumer decoding from it must be serialized by the caller.
pub trait ByteSource {
    /// Number of unconsumed bytes currently held.
    fn available_bytes(&self) -> usize;

    /// Claim up to `max_len` unconsumed bytes without consuming them.
    ///
    /// May return fewer than `max_len` bytes even when more are available,
    /// e.g. when the store wraps around its physical end.
    fn peek(&mut self, max_len: usize) -> &[u8];

    /// Consume exactly `n` bytes from the front of the most recent claim.
    fn advance(&mut self, n: usize) -> Result<()>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn available_bytes(&self) -> usize {
        (**self).available_bytes()
    }

    fn peek(&mut self, max_len: usize) -> &[u8] {
        (**self).peek(max_len)
    }

    fn advance(&mut self, n: usize) -> Result<()> {
        (**self).advance(n)
    }
}

/// `BytesMut` is always contiguous, so a claim may cover the whole buffer.
impl ByteSource for BytesMut {
    fn available_bytes(&self) -> usize {
        self.len()
    }

    fn peek(&mut self, max_len: usize) -> &[u8] {
        let len = max_len.min(self.len());
        &self[..len]
    }

    fn advance(&mut self, n: usize) -> Result<()> {
        if n > self.len() {
            return Err(SourceError::AdvanceBeyondClaim {
                requested: n,
                claimed: self.len(),
            });
        }
        Buf::advance(self, n);
        Ok(())
    }
}
