//! Owned 32-bit bitmaps and the capability traits shared with frozen views.
//!
//! [`ReadBitmap`] carries every query and every combining operation that produces a new
//! bitmap. [`WriteBitmap`] carries in-place mutation and is only implemented by [`Bitmap`]:
//! a [`FrozenBitmap`](crate::FrozenBitmap) has no way to reach a mutating call.

use crate::handle::{Handle, Identity};

mod imp;
mod lazy;
mod ops;
mod read;
mod serialization;
mod write;

pub(crate) use self::ops::fmt_bitmap;
pub use self::lazy::{LazyBitmap, UnrepairedBitmap};
pub use self::read::ReadBitmap;
pub use self::serialization::{Deserializer, NoAlign, Serializer, ViewFormat};
pub use self::write::WriteBitmap;

/// A compressed bitmap of 32-bit values, owning its CRoaring allocation
///
/// Every mutation that does not go through a [`BulkContext`](crate::BulkContext) advances
/// the bitmap's generation, which lets bulk contexts notice their cached position is stale.
pub struct Bitmap {
    handle: Handle<ffi::roaring_bitmap_t>,
    identity: Identity,
}

unsafe impl Sync for Bitmap {}
unsafe impl Send for Bitmap {}

pub(crate) mod raw {
    use crate::handle::Identity;

    /// Access to the native bitmap behind a wrapper
    pub trait RawBitmap {
        #[doc(hidden)]
        fn raw(&self) -> *const ffi::roaring_bitmap_t;

        #[doc(hidden)]
        fn identity(&self) -> Identity;
    }

    pub trait RawBitmapMut: RawBitmap {
        /// Pointer for a mutating call, recording the mutation
        #[doc(hidden)]
        fn raw_mut(&mut self) -> *mut ffi::roaring_bitmap_t;
    }
}

impl raw::RawBitmap for Bitmap {
    #[inline]
    fn raw(&self) -> *const ffi::roaring_bitmap_t {
        self.handle.as_ptr()
    }

    #[inline]
    fn identity(&self) -> Identity {
        self.identity
    }
}

impl raw::RawBitmapMut for Bitmap {
    #[inline]
    fn raw_mut(&mut self) -> *mut ffi::roaring_bitmap_t {
        self.identity.bump();
        self.handle.as_ptr()
    }
}

impl crate::sealed::Sealed for Bitmap {}

/// Detailed statistics on the composition of a bitmap
///
/// See [`ReadBitmap::statistics`] for more information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Statistics {
    pub containers: u64,
    pub array_containers: u64,
    pub run_containers: u64,
    pub bitset_containers: u64,
    pub values_array_containers: u64,
    pub values_run_containers: u64,
    pub values_bitset_containers: u64,
    pub bytes_array_containers: u64,
    pub bytes_run_containers: u64,
    pub bytes_bitset_containers: u64,
    pub max_value: u64,
    pub min_value: u64,
    pub cardinality: u64,
}

impl From<ffi::roaring_statistics_t> for Statistics {
    fn from(s: ffi::roaring_statistics_t) -> Self {
        Self {
            containers: u64::from(s.n_array_containers)
                + u64::from(s.n_run_containers)
                + u64::from(s.n_bitset_containers),
            array_containers: u64::from(s.n_array_containers),
            run_containers: u64::from(s.n_run_containers),
            bitset_containers: u64::from(s.n_bitset_containers),
            values_array_containers: u64::from(s.n_values_array_containers),
            values_run_containers: u64::from(s.n_values_run_containers),
            values_bitset_containers: u64::from(s.n_values_bitset_containers),
            bytes_array_containers: u64::from(s.n_bytes_array_containers),
            bytes_run_containers: u64::from(s.n_bytes_run_containers),
            bytes_bitset_containers: u64::from(s.n_bytes_bitset_containers),
            max_value: u64::from(s.max_value),
            min_value: u64::from(s.min_value),
            cardinality: s.cardinality,
        }
    }
}

impl From<ffi::roaring64_statistics_t> for Statistics {
    fn from(s: ffi::roaring64_statistics_t) -> Self {
        Self {
            containers: s.n_array_containers + s.n_run_containers + s.n_bitset_containers,
            array_containers: s.n_array_containers,
            run_containers: s.n_run_containers,
            bitset_containers: s.n_bitset_containers,
            values_array_containers: s.n_values_array_containers,
            values_run_containers: s.n_values_run_containers,
            values_bitset_containers: s.n_values_bitset_containers,
            bytes_array_containers: s.n_bytes_array_containers,
            bytes_run_containers: s.n_bytes_run_containers,
            bytes_bitset_containers: s.n_bytes_bitset_containers,
            max_value: s.max_value,
            min_value: s.min_value,
            cardinality: s.cardinality,
        }
    }
}
