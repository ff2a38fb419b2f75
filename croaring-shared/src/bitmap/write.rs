use super::raw::RawBitmapMut;
use super::read::ReadBitmap;
use crate::range::span32;
use crate::Error;
use std::ops::RangeBounds;

/// In-place mutation of an owned 32-bit bitmap
pub trait WriteBitmap: ReadBitmap + RawBitmapMut {
    #[inline]
    #[doc(alias = "roaring_bitmap_add")]
    fn add(&mut self, value: u32) {
        unsafe { ffi::roaring_bitmap_add(self.raw_mut(), value) }
    }

    /// Add `value`, returning true if it was not already present
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap, WriteBitmap};
    ///
    /// let mut bitmap = Bitmap::new().unwrap();
    /// assert!(bitmap.add_checked(1));
    /// assert!(!bitmap.add_checked(1));
    /// ```
    #[inline]
    #[doc(alias = "roaring_bitmap_add_checked")]
    fn add_checked(&mut self, value: u32) -> bool {
        unsafe { ffi::roaring_bitmap_add_checked(self.raw_mut(), value) }
    }

    #[inline]
    #[doc(alias = "roaring_bitmap_add_many")]
    fn add_many(&mut self, values: &[u32]) {
        unsafe { ffi::roaring_bitmap_add_many(self.raw_mut(), values.len(), values.as_ptr()) }
    }

    /// Add every value in `range`
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap, ReadBitmap, WriteBitmap};
    ///
    /// let mut bitmap = Bitmap::new().unwrap();
    /// bitmap.add_range(1..3).unwrap();
    /// assert_eq!(bitmap.to_vec(), [1, 2]);
    ///
    /// bitmap.add_range(3..3).unwrap();
    /// assert_eq!(bitmap.cardinality(), 2);
    ///
    /// #[allow(clippy::reversed_empty_ranges)]
    /// let reversed = bitmap.add_range(3..1);
    /// assert!(reversed.is_err());
    /// ```
    #[doc(alias = "roaring_bitmap_add_range_closed")]
    fn add_range<R: RangeBounds<u32>>(&mut self, range: R) -> Result<(), Error> {
        if let Some((first, last)) = span32(&range)?.closed() {
            unsafe { ffi::roaring_bitmap_add_range_closed(self.raw_mut(), first, last) }
        }
        Ok(())
    }

    #[inline]
    #[doc(alias = "roaring_bitmap_remove")]
    fn remove(&mut self, value: u32) {
        unsafe { ffi::roaring_bitmap_remove(self.raw_mut(), value) }
    }

    /// Remove `value`, returning true if it was present
    #[inline]
    #[doc(alias = "roaring_bitmap_remove_checked")]
    fn remove_checked(&mut self, value: u32) -> bool {
        unsafe { ffi::roaring_bitmap_remove_checked(self.raw_mut(), value) }
    }

    #[inline]
    #[doc(alias = "roaring_bitmap_remove_many")]
    fn remove_many(&mut self, values: &[u32]) {
        unsafe { ffi::roaring_bitmap_remove_many(self.raw_mut(), values.len(), values.as_ptr()) }
    }

    #[doc(alias = "roaring_bitmap_remove_range_closed")]
    fn remove_range<R: RangeBounds<u32>>(&mut self, range: R) -> Result<(), Error> {
        if let Some((first, last)) = span32(&range)?.closed() {
            unsafe { ffi::roaring_bitmap_remove_range_closed(self.raw_mut(), first, last) }
        }
        Ok(())
    }

    /// Negate the membership of every value in `range`
    #[doc(alias = "roaring_bitmap_flip_inplace")]
    fn flip_inplace<R: RangeBounds<u32>>(&mut self, range: R) -> Result<(), Error> {
        let span = span32(&range)?;
        if !span.is_empty() {
            unsafe { ffi::roaring_bitmap_flip_inplace(self.raw_mut(), span.start, span.end) }
        }
        Ok(())
    }

    #[inline]
    #[doc(alias = "roaring_bitmap_clear")]
    fn clear(&mut self) {
        unsafe { ffi::roaring_bitmap_clear(self.raw_mut()) }
    }

    #[inline]
    #[doc(alias = "roaring_bitmap_and_inplace")]
    fn and_inplace<B: ReadBitmap + ?Sized>(&mut self, other: &B) {
        let other = other.raw();
        unsafe { ffi::roaring_bitmap_and_inplace(self.raw_mut(), other) }
    }

    #[inline]
    #[doc(alias = "roaring_bitmap_or_inplace")]
    fn or_inplace<B: ReadBitmap + ?Sized>(&mut self, other: &B) {
        let other = other.raw();
        unsafe { ffi::roaring_bitmap_or_inplace(self.raw_mut(), other) }
    }

    #[inline]
    #[doc(alias = "roaring_bitmap_xor_inplace")]
    fn xor_inplace<B: ReadBitmap + ?Sized>(&mut self, other: &B) {
        let other = other.raw();
        unsafe { ffi::roaring_bitmap_xor_inplace(self.raw_mut(), other) }
    }

    #[inline]
    #[doc(alias = "roaring_bitmap_andnot_inplace")]
    fn andnot_inplace<B: ReadBitmap + ?Sized>(&mut self, other: &B) {
        let other = other.raw();
        unsafe { ffi::roaring_bitmap_andnot_inplace(self.raw_mut(), other) }
    }

    /// Convert containers to run containers wherever that is more compact
    ///
    /// Returns true if the result has at least one run container.
    #[inline]
    #[doc(alias = "roaring_bitmap_run_optimize")]
    fn run_optimize(&mut self) -> bool {
        unsafe { ffi::roaring_bitmap_run_optimize(self.raw_mut()) }
    }

    /// Remove run-length encoding even when it is more space efficient
    ///
    /// Returns true if a change was applied.
    #[inline]
    #[doc(alias = "roaring_bitmap_remove_run_compression")]
    fn remove_run_compression(&mut self) -> bool {
        unsafe { ffi::roaring_bitmap_remove_run_compression(self.raw_mut()) }
    }

    /// Release unused capacity, returning the number of bytes saved
    #[inline]
    #[doc(alias = "roaring_bitmap_shrink_to_fit")]
    fn shrink_to_fit(&mut self) -> usize {
        unsafe { ffi::roaring_bitmap_shrink_to_fit(self.raw_mut()) }
    }
}

impl WriteBitmap for super::Bitmap {}
