use crate::serialization::{Format, Frozen, Native, Portable};
use crate::sealed::Sealed;
use ffi::roaring_bitmap_t;
use std::ffi::{c_char, c_void};

/// A format a 32-bit bitmap can be written in
pub trait Serializer: Sealed {
    const FORMAT: Format;

    /// Alignment the destination buffer must have
    const REQUIRED_ALIGNMENT: usize = 1;

    #[doc(hidden)]
    unsafe fn size_in_bytes(raw: *const roaring_bitmap_t) -> usize;

    /// Write into `dst`, which holds at least `size_in_bytes` bytes at the required alignment
    #[doc(hidden)]
    unsafe fn serialize_raw(raw: *const roaring_bitmap_t, dst: *mut c_char);
}

/// A [`Serializer`] with no alignment requirement, which can write into a fresh `Vec`
pub trait NoAlign: Serializer {}

/// A format an owned 32-bit bitmap can be rebuilt from
pub trait Deserializer: Sealed {
    const FORMAT: Format;

    /// Returns null when `data` is not a valid bitmap
    #[doc(hidden)]
    unsafe fn deserialize_raw(data: &[u8]) -> *mut roaring_bitmap_t;
}

/// A format a [`FrozenBitmap`](crate::FrozenBitmap) can be mapped over without copying
pub trait ViewFormat: Sealed {
    const FORMAT: Format;

    /// Alignment the mapped bytes must start at
    const REQUIRED_ALIGNMENT: usize;

    /// Map a read-only header over `data`, returning null when `data` is not acceptable.
    ///
    /// The returned header borrows `data`, which must stay alive and unmodified until the
    /// header has been freed.
    #[doc(hidden)]
    unsafe fn view_raw(data: &[u8]) -> *const roaring_bitmap_t;
}

impl Serializer for Portable {
    const FORMAT: Format = Format::Portable;

    #[doc(alias = "roaring_bitmap_portable_size_in_bytes")]
    unsafe fn size_in_bytes(raw: *const roaring_bitmap_t) -> usize {
        ffi::roaring_bitmap_portable_size_in_bytes(raw)
    }

    #[doc(alias = "roaring_bitmap_portable_serialize")]
    unsafe fn serialize_raw(raw: *const roaring_bitmap_t, dst: *mut c_char) {
        ffi::roaring_bitmap_portable_serialize(raw, dst);
    }
}

impl NoAlign for Portable {}

impl Deserializer for Portable {
    const FORMAT: Format = Format::Portable;

    #[doc(alias = "roaring_bitmap_portable_deserialize_safe")]
    unsafe fn deserialize_raw(data: &[u8]) -> *mut roaring_bitmap_t {
        ffi::roaring_bitmap_portable_deserialize_safe(data.as_ptr().cast::<c_char>(), data.len())
    }
}

impl ViewFormat for Portable {
    const FORMAT: Format = Format::Portable;
    const REQUIRED_ALIGNMENT: usize = 1;

    #[doc(alias = "roaring_bitmap_portable_deserialize_frozen")]
    unsafe fn view_raw(data: &[u8]) -> *const roaring_bitmap_t {
        // portable_deserialize_size returns zero if data cannot be valid
        let size =
            ffi::roaring_bitmap_portable_deserialize_size(data.as_ptr().cast(), data.len());
        if size == 0 {
            return std::ptr::null();
        }
        ffi::roaring_bitmap_portable_deserialize_frozen(data.as_ptr().cast())
    }
}

impl Serializer for Native {
    const FORMAT: Format = Format::Native;

    #[doc(alias = "roaring_bitmap_size_in_bytes")]
    unsafe fn size_in_bytes(raw: *const roaring_bitmap_t) -> usize {
        ffi::roaring_bitmap_size_in_bytes(raw)
    }

    #[doc(alias = "roaring_bitmap_serialize")]
    unsafe fn serialize_raw(raw: *const roaring_bitmap_t, dst: *mut c_char) {
        ffi::roaring_bitmap_serialize(raw, dst);
    }
}

impl NoAlign for Native {}

impl Deserializer for Native {
    const FORMAT: Format = Format::Native;

    #[doc(alias = "roaring_bitmap_deserialize_safe")]
    unsafe fn deserialize_raw(data: &[u8]) -> *mut roaring_bitmap_t {
        ffi::roaring_bitmap_deserialize_safe(data.as_ptr().cast::<c_void>(), data.len())
    }
}

impl Serializer for Frozen {
    const FORMAT: Format = Format::Frozen;
    const REQUIRED_ALIGNMENT: usize = Frozen::REQUIRED_ALIGNMENT;

    #[doc(alias = "roaring_bitmap_frozen_size_in_bytes")]
    unsafe fn size_in_bytes(raw: *const roaring_bitmap_t) -> usize {
        ffi::roaring_bitmap_frozen_size_in_bytes(raw)
    }

    #[doc(alias = "roaring_bitmap_frozen_serialize")]
    unsafe fn serialize_raw(raw: *const roaring_bitmap_t, dst: *mut c_char) {
        ffi::roaring_bitmap_frozen_serialize(raw, dst);
    }
}

impl ViewFormat for Frozen {
    const FORMAT: Format = Format::Frozen;
    const REQUIRED_ALIGNMENT: usize = Frozen::REQUIRED_ALIGNMENT;

    /// `data.len()` must be exactly the frozen size: the header is read from the end.
    #[doc(alias = "roaring_bitmap_frozen_view")]
    unsafe fn view_raw(data: &[u8]) -> *const roaring_bitmap_t {
        ffi::roaring_bitmap_frozen_view(data.as_ptr().cast::<c_char>(), data.len())
    }
}
