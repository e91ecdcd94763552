use vbus_source::{ByteSource, RingBuffer};

use crate::args::{bytes_arg, ring_arg};
use crate::error;
use crate::types::{RingHandle, VbusRingHandle};

/// Allocate a ring buffer holding at most `capacity` bytes.
///
/// Returns null if `capacity` is zero.
#[no_mangle]
pub extern "C" fn vbus_ring_new(capacity: u32) -> VbusRingHandle {
    crate::ffi_boundary(std::ptr::null_mut(), || {
        error::clear_error_state();
        if capacity == 0 {
            let _ = error::set_invalid_argument("capacity must be greater than zero");
            return std::ptr::null_mut();
        }

        let handle = RingHandle {
            ring: RingBuffer::new(capacity as usize),
        };
        Box::into_raw(Box::new(handle)) as VbusRingHandle
    })
}

/// Append up to `len` bytes and return how many fit.
///
/// # Safety
/// `ring` must be a handle returned by `vbus_ring_new`. If `len > 0`, `data`
/// must be readable for `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn vbus_ring_put(ring: VbusRingHandle, data: *const u8, len: u32) -> u32 {
    crate::ffi_boundary(0, || {
        error::clear_error_state();

        // SAFETY: Handle validity is guaranteed by the caller.
        let Some(handle) = (unsafe { ring_arg(ring) }) else {
            return 0;
        };
        // SAFETY: Pointer and length validity is guaranteed by the caller.
        let Some(data) = (unsafe { bytes_arg(data, len as usize, "data") }) else {
            return 0;
        };

        handle.ring.put(data) as u32
    })
}

/// Number of unconsumed bytes held by `ring`; zero for a null handle.
///
/// # Safety
/// `ring` must be null or a handle returned by `vbus_ring_new`.
#[no_mangle]
pub unsafe extern "C" fn vbus_ring_size_get(ring: VbusRingHandle) -> u32 {
    crate::ffi_boundary(0, || {
        // SAFETY: Handle validity is guaranteed by the caller.
        match unsafe { ring_arg(ring) } {
            Some(handle) => handle.ring.available_bytes() as u32,
            None => 0,
        }
    })
}

/// Free a ring buffer handle.
///
/// # Safety
/// `ring` must be null or a handle previously returned by `vbus_ring_new`.
#[no_mangle]
pub unsafe extern "C" fn vbus_ring_free(ring: VbusRingHandle) {
    crate::ffi_boundary((), || {
        if ring.is_null() {
            return;
        }

        // SAFETY: Handle ownership is transferred back from C and freed exactly once.
        unsafe {
            drop(Box::from_raw(ring as *mut RingHandle));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_lifecycle() {
        let ring = vbus_ring_new(8);
        assert!(!ring.is_null());

        let data = b"abcdefghij";
        // SAFETY: `ring` is live and `data` is readable for its length.
        unsafe {
            assert_eq!(vbus_ring_put(ring, data.as_ptr(), data.len() as u32), 8);
            assert_eq!(vbus_ring_size_get(ring), 8);
            vbus_ring_free(ring);
        }
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(vbus_ring_new(0).is_null());
    }

    #[test]
    fn null_handles_are_tolerated() {
        // SAFETY: Null handles are explicitly allowed.
        unsafe {
            assert_eq!(vbus_ring_size_get(std::ptr::null_mut()), 0);
            assert_eq!(vbus_ring_put(std::ptr::null_mut(), std::ptr::null(), 0), 0);
            vbus_ring_free(std::ptr::null_mut());
        }
    }
}
