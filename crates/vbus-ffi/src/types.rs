use std::ffi::c_void;

use vbus_source::RingBuffer;

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VbusResult {
    Ok = 0,
    InvalidArgument = 1,
    Unsupported = 2,
    OutOfMemory = 3,
    FieldOverflow = 4,
    SourceError = 5,
    Internal = 99,
}

#[allow(dead_code)]
pub const VBUS_OK: VbusResult = VbusResult::Ok;
#[allow(dead_code)]
pub const VBUS_ERR_INVALID_ARGUMENT: VbusResult = VbusResult::InvalidArgument;
#[allow(dead_code)]
pub const VBUS_ERR_UNSUPPORTED: VbusResult = VbusResult::Unsupported;
#[allow(dead_code)]
pub const VBUS_ERR_OUT_OF_MEMORY: VbusResult = VbusResult::OutOfMemory;
#[allow(dead_code)]
pub const VBUS_ERR_FIELD_OVERFLOW: VbusResult = VbusResult::FieldOverflow;
#[allow(dead_code)]
pub const VBUS_ERR_SOURCE: VbusResult = VbusResult::SourceError;
#[allow(dead_code)]
pub const VBUS_ERR_INTERNAL: VbusResult = VbusResult::Internal;

#[allow(dead_code)]
pub const VBUS_HEADER_SIZE: u32 = vbus_frame::HEADER_SIZE as u32;
#[allow(dead_code)]
pub const VBUS_MAX_PAYLOAD_SIZE: u32 = vbus_frame::MAX_PAYLOAD_SIZE as u32;

/// One frame as seen from C.
///
/// Frames returned by `vbus_frame_decode` own `data`; release them with
/// `vbus_frames_free`. `data` is null when `size` is zero.
#[repr(C)]
#[derive(Debug)]
pub struct VbusFrame {
    pub channel_idx: u8,
    pub data: *mut u8,
    pub size: u32,
}

impl Default for VbusFrame {
    fn default() -> Self {
        Self {
            channel_idx: 0,
            data: std::ptr::null_mut(),
            size: 0,
        }
    }
}

pub type VbusRingHandle = *mut c_void;

pub(crate) struct RingHandle {
    pub(crate) ring: RingBuffer,
}
