use crate::error;
use crate::types::{RingHandle, VbusRingHandle};

/// Convert an optional byte pointer + length into a slice.
///
/// # Safety
/// If `len > 0`, `data` must be non-null and readable for `len` bytes.
pub(crate) unsafe fn bytes_arg<'a>(data: *const u8, len: usize, name: &str) -> Option<&'a [u8]> {
    if len == 0 {
        return Some(&[]);
    }
    if data.is_null() {
        let _ = error::set_invalid_argument(format!("{name} cannot be null when size > 0"));
        return None;
    }

    // SAFETY: Pointer and length are validated above and owned by caller for the call duration.
    Some(unsafe { std::slice::from_raw_parts(data, len) })
}

/// Borrow the ring buffer behind a handle.
///
/// # Safety
/// `handle` must be null or a live handle returned by `vbus_ring_new`.
pub(crate) unsafe fn ring_arg<'a>(handle: VbusRingHandle) -> Option<&'a mut RingHandle> {
    if handle.is_null() {
        let _ = error::set_invalid_argument("ring handle cannot be null");
        return None;
    }

    // SAFETY: The caller guarantees the handle came from `vbus_ring_new` and is not aliased.
    Some(unsafe { &mut *(handle as *mut RingHandle) })
}
