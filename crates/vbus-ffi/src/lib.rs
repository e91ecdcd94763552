//! vbus-ffi: C-ABI exports for the virtual bus frame codec.

mod args;
mod error;
mod frame;
mod ring;
mod types;

use std::panic::AssertUnwindSafe;

pub use frame::{vbus_buffer_free, vbus_frame_decode, vbus_frame_encode, vbus_frames_free};
pub use ring::{vbus_ring_free, vbus_ring_new, vbus_ring_put, vbus_ring_size_get};
pub use types::{
    VbusFrame, VbusResult, VbusRingHandle, VBUS_ERR_FIELD_OVERFLOW, VBUS_ERR_INTERNAL,
    VBUS_ERR_INVALID_ARGUMENT, VBUS_ERR_OUT_OF_MEMORY, VBUS_ERR_SOURCE, VBUS_ERR_UNSUPPORTED,
    VBUS_HEADER_SIZE, VBUS_MAX_PAYLOAD_SIZE, VBUS_OK,
};

fn ffi_boundary<T>(on_panic: T, f: impl FnOnce() -> T) -> T {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            error::set_panic_error();
            on_panic
        }
    }
}

#[no_mangle]
pub extern "C" fn vbus_last_error() -> *const std::os::raw::c_char {
    ffi_boundary(std::ptr::null(), error::last_error_ptr)
}

#[no_mangle]
pub extern "C" fn vbus_clear_error() {
    ffi_boundary((), error::clear_error_state);
}

#[cfg(test)]
mod tests {
    use std::ffi::CStr;

    use super::*;

    #[test]
    fn last_error_returns_non_null_pointer() {
        vbus_clear_error();
        let ptr = vbus_last_error();
        assert!(!ptr.is_null());

        // SAFETY: vbus_last_error returns a pointer to a thread-local CString.
        let text = unsafe { CStr::from_ptr(ptr).to_str().unwrap() };
        assert!(text.is_empty());
    }

    #[test]
    fn boundary_catches_panics() {
        let result = ffi_boundary(VbusResult::Internal, || panic!("boom"));
        assert_eq!(result, VbusResult::Internal);

        // SAFETY: vbus_last_error returns a pointer to a thread-local CString.
        let text = unsafe { CStr::from_ptr(vbus_last_error()).to_str().unwrap() };
        assert_eq!(text, "panic across FFI boundary");
    }
}
