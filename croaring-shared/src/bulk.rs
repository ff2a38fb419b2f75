//! Reusable scratch state for runs of adds and membership tests that hit nearby values.
//!
//! A bulk context caches the container it last touched, so consecutive calls for values that
//! share their high bits skip the container lookup. A context is bound to the bitmap it was
//! created for: using it with any other bitmap fails with [`Error::ForeignBulkContext`] before
//! any native call. If the bound bitmap was mutated by anything but this context since the
//! context was last used, the cached position is discarded first.

use crate::bitmap::raw::{RawBitmap, RawBitmapMut};
use crate::bitmap64::raw::{RawBitmap64, RawBitmap64Mut};
use crate::handle::{Identity, InstanceId};
use crate::{Bitmap, Bitmap64, Error, ReadBitmap, ReadBitmap64};
use std::fmt;
use std::mem::MaybeUninit;

/// The cached position sits behind a `Box` so the context can move without CRoaring's
/// scratch struct moving with it.
struct Scratch<T> {
    raw: Box<MaybeUninit<T>>,
    target: InstanceId,
    generation: u64,
}

impl<T> Scratch<T> {
    fn new(identity: Identity) -> Self {
        Self {
            // An all-zero context is CRoaring's documented initial state
            raw: Box::new(MaybeUninit::zeroed()),
            target: identity.id,
            generation: identity.generation,
        }
    }

    fn reset(&mut self) {
        *self.raw = MaybeUninit::zeroed();
    }

    /// Check the bitmap is ours and discard the cached position if it has changed since
    fn sync(&mut self, identity: Identity) -> Result<*mut T, Error> {
        if identity.id != self.target {
            return Err(Error::ForeignBulkContext {
                expected: self.target.get(),
                actual: identity.id.get(),
            });
        }
        if identity.generation != self.generation {
            tracing::trace!(
                bitmap = %self.target,
                cached = self.generation,
                current = identity.generation,
                "bulk context is stale, discarding cached container"
            );
            self.reset();
            self.generation = identity.generation;
        }
        Ok(self.raw.as_mut_ptr())
    }
}

/// Bulk context for a 32-bit [`Bitmap`]
///
/// # Examples
///
/// ```
/// use croaring_shared::{Bitmap, BulkContext, ReadBitmap};
///
/// let mut bitmap = Bitmap::new().unwrap();
/// let mut ctx = BulkContext::new(&bitmap);
/// for value in 1000..2000 {
///     ctx.add(&mut bitmap, value).unwrap();
/// }
/// assert!(ctx.contains(&bitmap, 1500).unwrap());
/// assert_eq!(bitmap.cardinality(), 1000);
///
/// let other = Bitmap::of(&[1500]).unwrap();
/// assert!(ctx.contains(&other, 1500).is_err());
/// ```
pub struct BulkContext {
    scratch: Scratch<ffi::roaring_bulk_context_t>,
}

unsafe impl Send for BulkContext {}

impl BulkContext {
    /// A fresh context bound to `bitmap`
    pub fn new<B: ReadBitmap + ?Sized>(bitmap: &B) -> Self {
        Self {
            scratch: Scratch::new(bitmap.identity()),
        }
    }

    /// Identity of the bitmap this context belongs to
    pub fn target(&self) -> InstanceId {
        self.scratch.target
    }

    /// Forget the cached container
    pub fn reset(&mut self) {
        self.scratch.reset();
    }

    #[doc(alias = "roaring_bitmap_add_bulk")]
    pub fn add(&mut self, bitmap: &mut Bitmap, value: u32) -> Result<(), Error> {
        let ctx = self.scratch.sync(bitmap.identity())?;
        unsafe { ffi::roaring_bitmap_add_bulk(bitmap.raw_mut(), ctx, value) };
        self.scratch.generation = bitmap.identity().generation;
        Ok(())
    }

    pub fn add_many(&mut self, bitmap: &mut Bitmap, values: &[u32]) -> Result<(), Error> {
        let ctx = self.scratch.sync(bitmap.identity())?;
        let raw = bitmap.raw_mut();
        for &value in values {
            unsafe { ffi::roaring_bitmap_add_bulk(raw, ctx, value) };
        }
        self.scratch.generation = bitmap.identity().generation;
        Ok(())
    }

    /// Membership test which reuses the cached container
    ///
    /// Works on frozen views as well as owned bitmaps.
    #[doc(alias = "roaring_bitmap_contains_bulk")]
    pub fn contains<B: ReadBitmap + ?Sized>(
        &mut self,
        bitmap: &B,
        value: u32,
    ) -> Result<bool, Error> {
        let ctx = self.scratch.sync(bitmap.identity())?;
        Ok(unsafe { ffi::roaring_bitmap_contains_bulk(bitmap.raw(), ctx, value) })
    }

    /// Remove `value` from the bound bitmap
    ///
    /// CRoaring has no 32-bit bulk removal: this is a plain removal, after which the cached
    /// container is discarded since the removal may have freed it.
    #[doc(alias = "roaring_bitmap_remove")]
    pub fn remove(&mut self, bitmap: &mut Bitmap, value: u32) -> Result<(), Error> {
        self.scratch.sync(bitmap.identity())?;
        unsafe { ffi::roaring_bitmap_remove(bitmap.raw_mut(), value) };
        self.scratch.reset();
        self.scratch.generation = bitmap.identity().generation;
        Ok(())
    }
}

impl fmt::Debug for BulkContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkContext")
            .field("target", &self.scratch.target)
            .field("generation", &self.scratch.generation)
            .finish_non_exhaustive()
    }
}

/// Bulk context for a [`Bitmap64`]
pub struct BulkContext64 {
    scratch: Scratch<ffi::roaring64_bulk_context_t>,
}

unsafe impl Send for BulkContext64 {}

impl BulkContext64 {
    pub fn new<B: ReadBitmap64 + ?Sized>(bitmap: &B) -> Self {
        Self {
            scratch: Scratch::new(bitmap.identity()),
        }
    }

    pub fn target(&self) -> InstanceId {
        self.scratch.target
    }

    pub fn reset(&mut self) {
        self.scratch.reset();
    }

    #[doc(alias = "roaring64_bitmap_add_bulk")]
    pub fn add(&mut self, bitmap: &mut Bitmap64, value: u64) -> Result<(), Error> {
        let ctx = self.scratch.sync(bitmap.identity())?;
        unsafe { ffi::roaring64_bitmap_add_bulk(bitmap.raw_mut(), ctx, value) };
        self.scratch.generation = bitmap.identity().generation;
        Ok(())
    }

    pub fn add_many(&mut self, bitmap: &mut Bitmap64, values: &[u64]) -> Result<(), Error> {
        let ctx = self.scratch.sync(bitmap.identity())?;
        let raw = bitmap.raw_mut();
        for &value in values {
            unsafe { ffi::roaring64_bitmap_add_bulk(raw, ctx, value) };
        }
        self.scratch.generation = bitmap.identity().generation;
        Ok(())
    }

    #[doc(alias = "roaring64_bitmap_contains_bulk")]
    pub fn contains<B: ReadBitmap64 + ?Sized>(
        &mut self,
        bitmap: &B,
        value: u64,
    ) -> Result<bool, Error> {
        let ctx = self.scratch.sync(bitmap.identity())?;
        Ok(unsafe { ffi::roaring64_bitmap_contains_bulk(bitmap.raw(), ctx, value) })
    }

    #[doc(alias = "roaring64_bitmap_remove_bulk")]
    pub fn remove(&mut self, bitmap: &mut Bitmap64, value: u64) -> Result<(), Error> {
        let ctx = self.scratch.sync(bitmap.identity())?;
        unsafe { ffi::roaring64_bitmap_remove_bulk(bitmap.raw_mut(), ctx, value) };
        self.scratch.generation = bitmap.identity().generation;
        Ok(())
    }
}

impl fmt::Debug for BulkContext64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkContext64")
            .field("target", &self.scratch.target)
            .field("generation", &self.scratch.generation)
            .finish_non_exhaustive()
    }
}
