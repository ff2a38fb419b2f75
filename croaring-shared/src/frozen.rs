//! Immutable bitmaps mapped over a [`SharedMemoryBlock`] without copying.
//!
//! A frozen view owns only the small header CRoaring allocates when mapping it. The values
//! themselves live in the block, which the view keeps alive through its registration.

use crate::bitmap::raw::RawBitmap;
use crate::bitmap::{fmt_bitmap, ViewFormat};
use crate::bitmap64::raw::RawBitmap64;
use crate::bitmap64::fmt_bitmap64;
use crate::handle::{Handle, Identity, InstanceId};
use crate::memory::Dependent;
use crate::serialization::{Format, Frozen};
use crate::{Bitmap64, Error, ReadBitmap, ReadBitmap64, SharedMemoryBlock, WriteBitmap64};
use std::fmt;

/// A read-only 32-bit bitmap aliasing a [`SharedMemoryBlock`]
///
/// Only the [`ReadBitmap`] surface is available. Use [`ReadBitmap::to_bitmap`] to get an
/// independent, mutable copy.
///
/// # Examples
///
/// ```
/// use croaring_shared::{Bitmap, FrozenBitmap, ReadBitmap};
///
/// let bitmap = Bitmap::of(&[1, 2, 3, 4]).unwrap();
/// let view = FrozenBitmap::freeze(&bitmap).unwrap();
/// assert!(view.contains_range(1..=4).unwrap());
/// assert_eq!(view, bitmap);
///
/// let mut owned = view.to_bitmap().unwrap();
/// drop(view);
/// owned.extend([10]);
/// assert_eq!(owned.to_vec(), [1, 2, 3, 4, 10]);
/// ```
pub struct FrozenBitmap {
    // Dropped before `registration`, so the header is gone before the block can be freed
    handle: Handle<ffi::roaring_bitmap_t>,
    identity: Identity,
    registration: Dependent,
}

unsafe impl Send for FrozenBitmap {}
unsafe impl Sync for FrozenBitmap {}

impl FrozenBitmap {
    /// Map a view over the registered block's bytes, dropping the registration on failure
    pub(crate) fn map<V: ViewFormat>(registration: Dependent) -> Result<Self, Error> {
        let raw = unsafe { V::view_raw(registration.bytes()) };
        let handle = unsafe { Handle::from_raw(raw.cast_mut()) }
            .map_err(|_| Error::Deserialization { format: V::FORMAT })?;
        let view = Self {
            handle,
            identity: Identity::fresh(),
            registration,
        };
        view.internal_validate()?;
        Ok(view)
    }

    /// Serialize `bitmap` into a block of its own and map a view over it
    ///
    /// The block is released straight away, so its buffer is freed with the view.
    pub fn freeze<B: ReadBitmap + ?Sized>(bitmap: &B) -> Result<Self, Error> {
        let block = SharedMemoryBlock::from_bitmap::<Frozen, B>(bitmap)?;
        block.freeze::<Frozen>()
    }

    /// Identity of the block this view reads from
    pub fn block_id(&self) -> InstanceId {
        self.registration.block_id()
    }

    /// Whether both views read from the same block
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap, FrozenBitmap, Portable, SharedMemoryBlock};
    ///
    /// let bitmap = Bitmap::of(&[7]).unwrap();
    /// let block = SharedMemoryBlock::from_bitmap::<Portable, _>(&bitmap).unwrap();
    /// let a = block.freeze::<Portable>().unwrap();
    /// let b = block.freeze::<Portable>().unwrap();
    /// assert!(a.shares_block_with(&b));
    /// assert!(!a.shares_block_with(&FrozenBitmap::freeze(&bitmap).unwrap()));
    /// ```
    pub fn shares_block_with(&self, other: &FrozenBitmap) -> bool {
        self.block_id() == other.block_id()
    }
}

impl RawBitmap for FrozenBitmap {
    #[inline]
    fn raw(&self) -> *const ffi::roaring_bitmap_t {
        self.handle.as_ptr()
    }

    #[inline]
    fn identity(&self) -> Identity {
        self.identity
    }
}

impl ReadBitmap for FrozenBitmap {}

impl crate::sealed::Sealed for FrozenBitmap {}

impl fmt::Debug for FrozenBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_bitmap("FrozenBitmap", self, f)
    }
}

impl<B: ReadBitmap> PartialEq<B> for FrozenBitmap {
    #[inline]
    fn eq(&self, other: &B) -> bool {
        unsafe { ffi::roaring_bitmap_equals(self.raw(), other.raw()) }
    }
}

impl Eq for FrozenBitmap {}

/// A read-only 64-bit bitmap aliasing a [`SharedMemoryBlock`]
///
/// # Examples
///
/// ```
/// use croaring_shared::{Bitmap64, FrozenBitmap64, ReadBitmap64};
///
/// let mut bitmap = Bitmap64::of(&[1, u64::MAX]).unwrap();
/// let view = FrozenBitmap64::freeze(&mut bitmap).unwrap();
/// assert_eq!(view.to_vec(), [1, u64::MAX]);
/// assert_eq!(view, bitmap);
/// ```
pub struct FrozenBitmap64 {
    handle: Handle<ffi::roaring64_bitmap_t>,
    identity: Identity,
    registration: Dependent,
}

unsafe impl Send for FrozenBitmap64 {}
unsafe impl Sync for FrozenBitmap64 {}

impl FrozenBitmap64 {
    pub(crate) fn map(registration: Dependent) -> Result<Self, Error> {
        let bytes = registration.bytes();
        let raw = unsafe { ffi::roaring64_bitmap_frozen_view(bytes.as_ptr().cast(), bytes.len()) };
        let handle = unsafe { Handle::from_raw(raw) }.map_err(|_| Error::Deserialization {
            format: Format::Frozen,
        })?;
        let view = Self {
            handle,
            identity: Identity::fresh(),
            registration,
        };
        view.internal_validate()?;
        Ok(view)
    }

    /// Shrink `bitmap`, serialize it into a block of its own and map a view over it
    pub fn freeze(bitmap: &mut Bitmap64) -> Result<Self, Error> {
        bitmap.shrink_to_fit();
        let block = SharedMemoryBlock::from_bitmap64::<Frozen, Bitmap64>(bitmap)?;
        block.freeze64()
    }

    pub fn block_id(&self) -> InstanceId {
        self.registration.block_id()
    }

    pub fn shares_block_with(&self, other: &FrozenBitmap64) -> bool {
        self.block_id() == other.block_id()
    }
}

impl RawBitmap64 for FrozenBitmap64 {
    #[inline]
    fn raw(&self) -> *const ffi::roaring64_bitmap_t {
        self.handle.as_ptr()
    }

    #[inline]
    fn identity(&self) -> Identity {
        self.identity
    }
}

impl ReadBitmap64 for FrozenBitmap64 {}

impl crate::sealed::Sealed for FrozenBitmap64 {}

impl fmt::Debug for FrozenBitmap64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_bitmap64("FrozenBitmap64", self, f)
    }
}

impl<B: ReadBitmap64> PartialEq<B> for FrozenBitmap64 {
    #[inline]
    fn eq(&self, other: &B) -> bool {
        unsafe { ffi::roaring64_bitmap_equals(self.raw(), other.raw()) }
    }
}

impl Eq for FrozenBitmap64 {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::accounting;
    use crate::{Bitmap, BlockState, Portable};

    #[test]
    fn test_copy_survives_block_rewrite() {
        let bitmap = Bitmap::of(&[0, 1, 2, 3, 4, u32::MAX]).unwrap();
        let mut block = SharedMemoryBlock::from_bitmap::<Frozen, _>(&bitmap).unwrap();
        let view = block.freeze::<Frozen>().unwrap();
        let owned = view.to_bitmap().unwrap();
        drop(view);

        block.rewind();
        let zeroes = vec![0; block.size()];
        assert_eq!(block.write(&zeroes).unwrap(), zeroes.len());
        block.release();

        assert_eq!(owned.to_vec(), [0, 1, 2, 3, 4, u32::MAX]);
    }

    #[test]
    fn test_freeze_maps_aligned_private_block() {
        let bitmap = Bitmap::from_range(0..100_000).unwrap();
        let view = FrozenBitmap::freeze(&bitmap).unwrap();
        let shared = view.registration.bytes().as_ptr();
        assert_eq!(shared.align_offset(Frozen::REQUIRED_ALIGNMENT), 0);
        assert_eq!(view.cardinality(), 100_000);
        assert_eq!(view, bitmap);
    }

    #[test]
    fn test_view_frees_only_its_header() {
        let bitmap = Bitmap::of(&[5, 6, 7]).unwrap();
        let block = SharedMemoryBlock::from_bitmap::<Portable, _>(&bitmap).unwrap();
        let (alloc_before, free_before) = accounting::counts();
        let view = block.freeze::<Portable>().unwrap();
        drop(view);
        let (alloc_after, free_after) = accounting::counts();
        assert_eq!(alloc_after - alloc_before, 1);
        assert_eq!(free_after - free_before, 1);
        assert_eq!(block.state(), BlockState::Active);
    }

    #[test]
    fn test_view_identity_is_stable() {
        let bitmap = Bitmap::of(&[1, 2]).unwrap();
        let view = FrozenBitmap::freeze(&bitmap).unwrap();
        let identity = view.identity();
        assert!(view.contains(2));
        let _ = view.and(&bitmap).unwrap();
        assert_eq!(view.identity(), identity);
        assert_ne!(view.instance_id(), bitmap.instance_id());
    }

    #[test]
    fn test_view64_needs_no_shrink_by_caller() {
        let mut bitmap = Bitmap64::new().unwrap();
        bitmap.add_range(0..1000).unwrap();
        bitmap.add(1 << 50);
        let view = FrozenBitmap64::freeze(&mut bitmap).unwrap();
        assert_eq!(view.cardinality(), 1001);
        assert!(view.contains(1 << 50));
        let copy = view.to_bitmap64().unwrap();
        drop(view);
        assert_eq!(copy, bitmap);
    }

    #[test]
    fn test_two_views64_share_block() {
        let mut bitmap = Bitmap64::of(&[3, 1 << 33]).unwrap();
        bitmap.shrink_to_fit();
        let mut block = SharedMemoryBlock::from_bitmap64::<Frozen, _>(&bitmap).unwrap();
        let a = block.freeze64().unwrap();
        let b = block.freeze64().unwrap();
        block.release();
        assert!(a.shares_block_with(&b));
        assert_eq!(block.state(), BlockState::PendingRelease { dependents: 2 });
        drop((a, b));
        assert_eq!(block.state(), BlockState::Released);
    }
}
