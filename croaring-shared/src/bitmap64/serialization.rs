use crate::sealed::Sealed;
use crate::serialization::{Format, Frozen, Portable};
use ffi::roaring64_bitmap_t;
use std::ffi::c_char;

/// Trait for different formats of bitmap64 serialization
pub trait Serializer: Sealed {
    const FORMAT: Format;

    /// The required alignment for the serialized data
    const REQUIRED_ALIGNMENT: usize = 1;

    /// Number of bytes required, zero if the bitmap cannot currently be written in this format
    #[doc(hidden)]
    unsafe fn size_in_bytes(raw: *const roaring64_bitmap_t) -> usize;

    #[doc(hidden)]
    unsafe fn serialize_raw(raw: *const roaring64_bitmap_t, dst: *mut c_char);
}

/// Trait for different formats of bitmap64 deserialization
pub trait Deserializer: Sealed {
    const FORMAT: Format;

    #[doc(hidden)]
    unsafe fn deserialize_raw(data: &[u8]) -> *mut roaring64_bitmap_t;
}

impl Serializer for Portable {
    const FORMAT: Format = Format::Portable;

    #[doc(alias = "roaring64_bitmap_portable_size_in_bytes")]
    unsafe fn size_in_bytes(raw: *const roaring64_bitmap_t) -> usize {
        ffi::roaring64_bitmap_portable_size_in_bytes(raw)
    }

    #[doc(alias = "roaring64_bitmap_portable_serialize")]
    unsafe fn serialize_raw(raw: *const roaring64_bitmap_t, dst: *mut c_char) {
        ffi::roaring64_bitmap_portable_serialize(raw, dst);
    }
}

impl Deserializer for Portable {
    const FORMAT: Format = Format::Portable;

    #[doc(alias = "roaring64_bitmap_portable_deserialize_safe")]
    unsafe fn deserialize_raw(data: &[u8]) -> *mut roaring64_bitmap_t {
        ffi::roaring64_bitmap_portable_deserialize_safe(data.as_ptr().cast::<c_char>(), data.len())
    }
}

impl Serializer for Frozen {
    const FORMAT: Format = Format::Frozen;
    // Unlike 32 bit bitmaps, 64 bit bitmaps require 64 byte alignment
    const REQUIRED_ALIGNMENT: usize = 64;

    /// Zero unless the bitmap has been shrunk with
    /// [`WriteBitmap64::shrink_to_fit`](super::WriteBitmap64::shrink_to_fit)
    #[doc(alias = "roaring64_bitmap_frozen_size_in_bytes")]
    unsafe fn size_in_bytes(raw: *const roaring64_bitmap_t) -> usize {
        ffi::roaring64_bitmap_frozen_size_in_bytes(raw)
    }

    #[doc(alias = "roaring64_bitmap_frozen_serialize")]
    unsafe fn serialize_raw(raw: *const roaring64_bitmap_t, dst: *mut c_char) {
        ffi::roaring64_bitmap_frozen_serialize(raw, dst);
    }
}
