use super::raw::RawBitmap64Mut;
use super::read::ReadBitmap64;
use crate::range::span64;
use crate::Error;
use std::ops::RangeBounds;

/// In-place mutation of an owned 64-bit bitmap
pub trait WriteBitmap64: ReadBitmap64 + RawBitmap64Mut {
    #[inline]
    #[doc(alias = "roaring64_bitmap_add")]
    fn add(&mut self, value: u64) {
        unsafe { ffi::roaring64_bitmap_add(self.raw_mut(), value) }
    }

    #[inline]
    #[doc(alias = "roaring64_bitmap_add_checked")]
    fn add_checked(&mut self, value: u64) -> bool {
        unsafe { ffi::roaring64_bitmap_add_checked(self.raw_mut(), value) }
    }

    #[inline]
    #[doc(alias = "roaring64_bitmap_add_many")]
    fn add_many(&mut self, values: &[u64]) {
        unsafe { ffi::roaring64_bitmap_add_many(self.raw_mut(), values.len(), values.as_ptr()) }
    }

    #[doc(alias = "roaring64_bitmap_add_range_closed")]
    fn add_range<R: RangeBounds<u64>>(&mut self, range: R) -> Result<(), Error> {
        if let Some(span) = span64(&range)? {
            unsafe { ffi::roaring64_bitmap_add_range_closed(self.raw_mut(), span.start, span.last) }
        }
        Ok(())
    }

    #[inline]
    #[doc(alias = "roaring64_bitmap_remove")]
    fn remove(&mut self, value: u64) {
        unsafe { ffi::roaring64_bitmap_remove(self.raw_mut(), value) }
    }

    #[inline]
    #[doc(alias = "roaring64_bitmap_remove_checked")]
    fn remove_checked(&mut self, value: u64) -> bool {
        unsafe { ffi::roaring64_bitmap_remove_checked(self.raw_mut(), value) }
    }

    #[inline]
    #[doc(alias = "roaring64_bitmap_remove_many")]
    fn remove_many(&mut self, values: &[u64]) {
        unsafe { ffi::roaring64_bitmap_remove_many(self.raw_mut(), values.len(), values.as_ptr()) }
    }

    #[doc(alias = "roaring64_bitmap_remove_range_closed")]
    fn remove_range<R: RangeBounds<u64>>(&mut self, range: R) -> Result<(), Error> {
        if let Some(span) = span64(&range)? {
            unsafe {
                ffi::roaring64_bitmap_remove_range_closed(self.raw_mut(), span.start, span.last)
            }
        }
        Ok(())
    }

    #[doc(alias = "roaring64_bitmap_flip_closed_inplace")]
    fn flip_inplace<R: RangeBounds<u64>>(&mut self, range: R) -> Result<(), Error> {
        if let Some(span) = span64(&range)? {
            unsafe {
                ffi::roaring64_bitmap_flip_closed_inplace(self.raw_mut(), span.start, span.last)
            }
        }
        Ok(())
    }

    /// Remove every value
    #[inline]
    fn clear(&mut self) {
        unsafe { ffi::roaring64_bitmap_remove_range_closed(self.raw_mut(), 0, u64::MAX) }
    }

    #[inline]
    fn and_inplace<B: ReadBitmap64 + ?Sized>(&mut self, other: &B) {
        let other = other.raw();
        unsafe { ffi::roaring64_bitmap_and_inplace(self.raw_mut(), other) }
    }

    #[inline]
    fn or_inplace<B: ReadBitmap64 + ?Sized>(&mut self, other: &B) {
        let other = other.raw();
        unsafe { ffi::roaring64_bitmap_or_inplace(self.raw_mut(), other) }
    }

    #[inline]
    fn xor_inplace<B: ReadBitmap64 + ?Sized>(&mut self, other: &B) {
        let other = other.raw();
        unsafe { ffi::roaring64_bitmap_xor_inplace(self.raw_mut(), other) }
    }

    #[inline]
    fn andnot_inplace<B: ReadBitmap64 + ?Sized>(&mut self, other: &B) {
        let other = other.raw();
        unsafe { ffi::roaring64_bitmap_andnot_inplace(self.raw_mut(), other) }
    }

    #[inline]
    #[doc(alias = "roaring64_bitmap_run_optimize")]
    fn run_optimize(&mut self) -> bool {
        unsafe { ffi::roaring64_bitmap_run_optimize(self.raw_mut()) }
    }

    /// Release unused capacity, returning the number of bytes saved
    ///
    /// Required before a frozen serialization.
    #[inline]
    #[doc(alias = "roaring64_bitmap_shrink_to_fit")]
    fn shrink_to_fit(&mut self) -> usize {
        unsafe { ffi::roaring64_bitmap_shrink_to_fit(self.raw_mut()) }
    }
}

impl WriteBitmap64 for super::Bitmap64 {}
