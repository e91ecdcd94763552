use std::ptr;

use vbus_frame::{Frame, FrameError};

use crate::args::{bytes_arg, ring_arg};
use crate::error;
use crate::types::{VbusFrame, VbusResult, VbusRingHandle};

fn into_raw_bytes(bytes: Vec<u8>) -> *mut u8 {
    if bytes.is_empty() {
        return ptr::null_mut();
    }
    Box::into_raw(bytes.into_boxed_slice()) as *mut u8
}

/// # Safety
/// `data` must be null or a pointer produced by [`into_raw_bytes`] for `len` bytes.
unsafe fn free_raw_bytes(data: *mut u8, len: usize) {
    if data.is_null() {
        return;
    }
    let slice_ptr = ptr::slice_from_raw_parts_mut(data, len);
    // SAFETY: `data` was allocated as a `Box<[u8]>` of `len` bytes by this library.
    unsafe {
        drop(Box::from_raw(slice_ptr));
    }
}

fn to_c_frame(frame: Frame) -> VbusFrame {
    let size = frame.size() as u32;
    VbusFrame {
        channel_idx: frame.channel,
        // Decoded payloads are uniquely owned, so this takes the buffer without copying.
        data: into_raw_bytes(Vec::from(frame.payload)),
        size,
    }
}

fn to_c_frames(decoded: Vec<Frame>) -> Result<Box<[VbusFrame]>, FrameError> {
    let mut c_frames = Vec::new();
    c_frames
        .try_reserve_exact(decoded.len())
        .map_err(|_| FrameError::OutOfMemory)?;
    c_frames.extend(decoded.into_iter().map(to_c_frame));
    Ok(c_frames.into_boxed_slice())
}

/// # Safety
/// When `frame.size > 0` and `frame.data` is non-null, `data` must be readable
/// for `size` bytes.
unsafe fn payload_of(frame: &VbusFrame) -> &[u8] {
    if frame.size == 0 || frame.data.is_null() {
        return &[];
    }
    // SAFETY: Guaranteed by the caller.
    unsafe { std::slice::from_raw_parts(frame.data, frame.size as usize) }
}

/// Decode every complete frame within the first `buf_size` bytes of `ring`.
///
/// On success `*frames` points to `*frame_count` frames owned by the caller,
/// or is null when no complete frame was buffered. Incomplete trailing bytes
/// stay in the ring.
///
/// # Safety
/// `ring` must be a handle returned by `vbus_ring_new`. `frames` and
/// `frame_count` must be null or valid for writes.
#[no_mangle]
pub unsafe extern "C" fn vbus_frame_decode(
    ring: VbusRingHandle,
    buf_size: u32,
    frames: *mut *mut VbusFrame,
    frame_count: *mut u32,
) -> VbusResult {
    crate::ffi_boundary(VbusResult::Internal, || {
        error::clear_error_state();

        if frames.is_null() || frame_count.is_null() {
            return error::set_invalid_argument("frames and frame_count cannot be null");
        }
        // SAFETY: Handle validity is guaranteed by the caller.
        let Some(handle) = (unsafe { ring_arg(ring) }) else {
            return VbusResult::InvalidArgument;
        };

        // SAFETY: Output pointers were validated as non-null above.
        unsafe {
            *frames = ptr::null_mut();
            *frame_count = 0;
        }

        let limit = buf_size as usize;
        let mut decoded = match vbus_frame::decode(&mut handle.ring, limit) {
            Ok(decoded) => decoded,
            Err(err) => return error::map_frame_error(&err),
        };
        if decoded.is_empty() && !handle.ring.is_contiguous() {
            // The next frame straddles the wrap point.
            handle.ring.make_contiguous();
            decoded = match vbus_frame::decode(&mut handle.ring, limit) {
                Ok(decoded) => decoded,
                Err(err) => return error::map_frame_error(&err),
            };
        }
        if decoded.is_empty() {
            return VbusResult::Ok;
        }

        let c_frames = match to_c_frames(decoded) {
            Ok(c_frames) => c_frames,
            Err(err) => return error::map_frame_error(&err),
        };
        let count = c_frames.len() as u32;

        // SAFETY: Output pointers were validated as non-null above.
        unsafe {
            *frames = Box::into_raw(c_frames) as *mut VbusFrame;
            *frame_count = count;
        }
        VbusResult::Ok
    })
}

/// Free frames returned by `vbus_frame_decode`.
///
/// # Safety
/// `frames` must be null or an array returned by `vbus_frame_decode` together
/// with its `frame_count`, not yet freed.
#[no_mangle]
pub unsafe extern "C" fn vbus_frames_free(frames: *mut VbusFrame, frame_count: u32) {
    crate::ffi_boundary((), || {
        if frames.is_null() {
            return;
        }

        let slice_ptr = ptr::slice_from_raw_parts_mut(frames, frame_count as usize);
        // SAFETY: The array was allocated as a `Box<[VbusFrame]>` by `vbus_frame_decode`.
        let owned = unsafe { Box::from_raw(slice_ptr) };
        for frame in owned.iter() {
            // SAFETY: Payloads inside decoded frames were allocated by `into_raw_bytes`.
            unsafe { free_raw_bytes(frame.data, frame.size as usize) };
        }
    });
}

/// Encode `frame_count` frames into one newly allocated buffer.
///
/// On success `*buffer` owns `*buf_size` bytes; release it with
/// `vbus_buffer_free`.
///
/// # Safety
/// `frames` must be null or readable for `frame_count` elements whose `data`
/// is readable for `size` bytes. `buffer` and `buf_size` must be null or
/// valid for writes.
#[no_mangle]
pub unsafe extern "C" fn vbus_frame_encode(
    frames: *const VbusFrame,
    frame_count: u32,
    buffer: *mut *mut u8,
    buf_size: *mut u32,
) -> VbusResult {
    crate::ffi_boundary(VbusResult::Internal, || {
        error::clear_error_state();

        if frames.is_null() || buffer.is_null() || buf_size.is_null() {
            return error::set_invalid_argument("frames, buffer and buf_size cannot be null");
        }
        if frame_count == 0 {
            return error::set_invalid_argument("frame_count must be greater than zero");
        }

        // SAFETY: Pointer and length validity is guaranteed by the caller.
        let c_frames = unsafe { std::slice::from_raw_parts(frames, frame_count as usize) };
        for c_frame in c_frames {
            // SAFETY: Payload pointer validity is guaranteed by the caller.
            if unsafe { bytes_arg(c_frame.data, c_frame.size as usize, "data") }.is_none() {
                return VbusResult::InvalidArgument;
            }
        }

        // SAFETY: Every payload pointer was validated above.
        let parts = c_frames
            .iter()
            .map(|c_frame| (c_frame.channel_idx, unsafe { payload_of(c_frame) }));
        let encoded = match vbus_frame::encode_parts(parts) {
            Ok(encoded) => encoded,
            Err(err) => return error::map_frame_error(&err),
        };
        let Ok(size) = u32::try_from(encoded.len()) else {
            return error::map_frame_error(&FrameError::FieldOverflow {
                size: encoded.len(),
                max: u32::MAX as usize,
            });
        };

        // SAFETY: Output pointers were validated as non-null above.
        unsafe {
            *buffer = into_raw_bytes(encoded);
            *buf_size = size;
        }
        VbusResult::Ok
    })
}

/// Free a buffer returned by `vbus_frame_encode`.
///
/// # Safety
/// `buffer` must be null or a buffer returned by `vbus_frame_encode` together
/// with its `buf_size`, not yet freed.
#[no_mangle]
pub unsafe extern "C" fn vbus_buffer_free(buffer: *mut u8, buf_size: u32) {
    crate::ffi_boundary((), || {
        // SAFETY: Ownership is transferred back from C and freed exactly once.
        unsafe { free_raw_bytes(buffer, buf_size as usize) };
    });
}
