//! A compressed bitmap which can hold 64-bit integers

use crate::handle::{Handle, Identity};

mod imp;
mod ops;
mod read;
mod serialization;
mod write;

pub(crate) use self::ops::fmt_bitmap64;
pub use self::read::ReadBitmap64;
pub use self::serialization::{Deserializer, Serializer};
pub use self::write::WriteBitmap64;

/// A Bitmap which can hold 64-bit integers, owning its CRoaring allocation
pub struct Bitmap64 {
    handle: Handle<ffi::roaring64_bitmap_t>,
    identity: Identity,
}
unsafe impl Sync for Bitmap64 {}
unsafe impl Send for Bitmap64 {}

pub(crate) mod raw {
    use crate::handle::Identity;

    pub trait RawBitmap64 {
        #[doc(hidden)]
        fn raw(&self) -> *const ffi::roaring64_bitmap_t;

        #[doc(hidden)]
        fn identity(&self) -> Identity;
    }

    pub trait RawBitmap64Mut: RawBitmap64 {
        #[doc(hidden)]
        fn raw_mut(&mut self) -> *mut ffi::roaring64_bitmap_t;
    }
}

impl raw::RawBitmap64 for Bitmap64 {
    #[inline]
    fn raw(&self) -> *const ffi::roaring64_bitmap_t {
        self.handle.as_ptr()
    }

    #[inline]
    fn identity(&self) -> Identity {
        self.identity
    }
}

impl raw::RawBitmap64Mut for Bitmap64 {
    #[inline]
    fn raw_mut(&mut self) -> *mut ffi::roaring64_bitmap_t {
        self.identity.bump();
        self.handle.as_ptr()
    }
}

impl crate::sealed::Sealed for Bitmap64 {}
