use super::raw::RawBitmap64;
use super::serialization::Serializer;
use super::Bitmap64;
use crate::bitmap::Statistics;
use crate::handle::InstanceId;
use crate::iter::Bitmap64Cursor;
use crate::range::span64;
use crate::serialization::get_aligned_spare_capacity;
use crate::Error;
use std::ffi::{c_char, CStr};
use std::ops::RangeBounds;

/// Queries and non-mutating operations over a 64-bit bitmap
///
/// Implemented by [`Bitmap64`] and [`FrozenBitmap64`](crate::FrozenBitmap64).
pub trait ReadBitmap64: RawBitmap64 {
    #[inline]
    fn instance_id(&self) -> InstanceId {
        self.identity().id
    }

    #[inline]
    #[doc(alias = "roaring64_bitmap_get_cardinality")]
    fn cardinality(&self) -> u64 {
        unsafe { ffi::roaring64_bitmap_get_cardinality(self.raw()) }
    }

    #[inline]
    #[doc(alias = "roaring64_bitmap_is_empty")]
    fn is_empty(&self) -> bool {
        unsafe { ffi::roaring64_bitmap_is_empty(self.raw()) }
    }

    #[inline]
    #[doc(alias = "roaring64_bitmap_contains")]
    fn contains(&self, value: u64) -> bool {
        unsafe { ffi::roaring64_bitmap_contains(self.raw(), value) }
    }

    /// Check whether every value in `range` is in the bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap64, ReadBitmap64, WriteBitmap64};
    ///
    /// let mut bitmap = Bitmap64::new().unwrap();
    /// bitmap.add_range(u64::MAX - 2..=u64::MAX).unwrap();
    /// assert!(bitmap.contains_range(u64::MAX - 2..).unwrap());
    /// assert!(!bitmap.contains_range(u64::MAX - 3..).unwrap());
    /// ```
    #[doc(alias = "roaring64_bitmap_contains_range")]
    fn contains_range<R: RangeBounds<u64>>(&self, range: R) -> Result<bool, Error> {
        let Some(span) = span64(&range)? else {
            return Ok(true);
        };
        let ex = span.exclusive();
        if ex.needs_max && !self.contains(u64::MAX) {
            return Ok(false);
        }
        Ok(ex.start == ex.end
            || unsafe { ffi::roaring64_bitmap_contains_range(self.raw(), ex.start, ex.end) })
    }

    #[doc(alias = "roaring64_bitmap_range_cardinality")]
    fn range_cardinality<R: RangeBounds<u64>>(&self, range: R) -> Result<u64, Error> {
        let Some(span) = span64(&range)? else {
            return Ok(0);
        };
        let ex = span.exclusive();
        let mut cardinality =
            unsafe { ffi::roaring64_bitmap_range_cardinality(self.raw(), ex.start, ex.end) };
        if ex.needs_max {
            cardinality += u64::from(self.contains(u64::MAX));
        }
        Ok(cardinality)
    }

    #[inline]
    #[doc(alias = "roaring64_bitmap_minimum")]
    fn minimum(&self) -> Option<u64> {
        if self.is_empty() {
            None
        } else {
            Some(unsafe { ffi::roaring64_bitmap_minimum(self.raw()) })
        }
    }

    #[inline]
    #[doc(alias = "roaring64_bitmap_maximum")]
    fn maximum(&self) -> Option<u64> {
        if self.is_empty() {
            None
        } else {
            Some(unsafe { ffi::roaring64_bitmap_maximum(self.raw()) })
        }
    }

    #[inline]
    #[doc(alias = "roaring64_bitmap_rank")]
    fn rank(&self, value: u64) -> u64 {
        unsafe { ffi::roaring64_bitmap_rank(self.raw(), value) }
    }

    #[inline]
    #[doc(alias = "roaring64_bitmap_select")]
    fn select(&self, rank: u64) -> Option<u64> {
        let mut element = 0u64;
        let found = unsafe { ffi::roaring64_bitmap_select(self.raw(), rank, &mut element) };
        found.then_some(element)
    }

    /// Zero-based position of `value` in the bitmap, `None` if it is absent
    #[inline]
    #[doc(alias = "roaring64_bitmap_get_index")]
    fn position(&self, value: u64) -> Option<u64> {
        let mut index = 0u64;
        let found = unsafe { ffi::roaring64_bitmap_get_index(self.raw(), value, &mut index) };
        found.then_some(index)
    }

    #[inline]
    #[doc(alias = "roaring64_bitmap_is_subset")]
    fn is_subset<B: ReadBitmap64 + ?Sized>(&self, other: &B) -> bool {
        unsafe { ffi::roaring64_bitmap_is_subset(self.raw(), other.raw()) }
    }

    #[inline]
    #[doc(alias = "roaring64_bitmap_is_strict_subset")]
    fn is_strict_subset<B: ReadBitmap64 + ?Sized>(&self, other: &B) -> bool {
        unsafe { ffi::roaring64_bitmap_is_strict_subset(self.raw(), other.raw()) }
    }

    #[inline]
    #[doc(alias = "roaring64_bitmap_intersect")]
    fn intersect<B: ReadBitmap64 + ?Sized>(&self, other: &B) -> bool {
        unsafe { ffi::roaring64_bitmap_intersect(self.raw(), other.raw()) }
    }

    #[doc(alias = "roaring64_bitmap_intersect_with_range")]
    fn intersect_with_range<R: RangeBounds<u64>>(&self, range: R) -> Result<bool, Error> {
        let Some(span) = span64(&range)? else {
            return Ok(false);
        };
        let ex = span.exclusive();
        if ex.needs_max && self.contains(u64::MAX) {
            return Ok(true);
        }
        Ok(unsafe { ffi::roaring64_bitmap_intersect_with_range(self.raw(), ex.start, ex.end) })
    }

    #[inline]
    #[doc(alias = "roaring64_bitmap_jaccard_index")]
    fn jaccard_index<B: ReadBitmap64 + ?Sized>(&self, other: &B) -> f64 {
        unsafe { ffi::roaring64_bitmap_jaccard_index(self.raw(), other.raw()) }
    }

    #[inline]
    #[doc(alias = "roaring64_bitmap_and")]
    fn and<B: ReadBitmap64 + ?Sized>(&self, other: &B) -> Result<Bitmap64, Error> {
        unsafe { Bitmap64::take_heap(ffi::roaring64_bitmap_and(self.raw(), other.raw())) }
    }

    #[inline]
    #[doc(alias = "roaring64_bitmap_or")]
    fn or<B: ReadBitmap64 + ?Sized>(&self, other: &B) -> Result<Bitmap64, Error> {
        unsafe { Bitmap64::take_heap(ffi::roaring64_bitmap_or(self.raw(), other.raw())) }
    }

    #[inline]
    #[doc(alias = "roaring64_bitmap_xor")]
    fn xor<B: ReadBitmap64 + ?Sized>(&self, other: &B) -> Result<Bitmap64, Error> {
        unsafe { Bitmap64::take_heap(ffi::roaring64_bitmap_xor(self.raw(), other.raw())) }
    }

    #[inline]
    #[doc(alias = "roaring64_bitmap_andnot")]
    fn andnot<B: ReadBitmap64 + ?Sized>(&self, other: &B) -> Result<Bitmap64, Error> {
        unsafe { Bitmap64::take_heap(ffi::roaring64_bitmap_andnot(self.raw(), other.raw())) }
    }

    #[inline]
    fn and_cardinality<B: ReadBitmap64 + ?Sized>(&self, other: &B) -> u64 {
        unsafe { ffi::roaring64_bitmap_and_cardinality(self.raw(), other.raw()) }
    }

    #[inline]
    fn or_cardinality<B: ReadBitmap64 + ?Sized>(&self, other: &B) -> u64 {
        unsafe { ffi::roaring64_bitmap_or_cardinality(self.raw(), other.raw()) }
    }

    #[inline]
    fn xor_cardinality<B: ReadBitmap64 + ?Sized>(&self, other: &B) -> u64 {
        unsafe { ffi::roaring64_bitmap_xor_cardinality(self.raw(), other.raw()) }
    }

    #[inline]
    fn andnot_cardinality<B: ReadBitmap64 + ?Sized>(&self, other: &B) -> u64 {
        unsafe { ffi::roaring64_bitmap_andnot_cardinality(self.raw(), other.raw()) }
    }

    /// A new bitmap with the membership of every value in `range` negated
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap64, ReadBitmap64};
    ///
    /// let bitmap = Bitmap64::of(&[4]).unwrap();
    /// assert_eq!(bitmap.flip(1..5).unwrap().to_vec(), [1, 2, 3]);
    /// assert_eq!(bitmap.flip(4..4).unwrap().to_vec(), [4]);
    /// ```
    #[doc(alias = "roaring64_bitmap_flip_closed")]
    fn flip<R: RangeBounds<u64>>(&self, range: R) -> Result<Bitmap64, Error> {
        let Some(span) = span64(&range)? else {
            return self.to_bitmap64();
        };
        unsafe {
            Bitmap64::take_heap(ffi::roaring64_bitmap_flip_closed(
                self.raw(),
                span.start,
                span.last,
            ))
        }
    }

    /// Owned, mutable deep copy of this bitmap
    #[inline]
    #[doc(alias = "roaring64_bitmap_copy")]
    fn to_bitmap64(&self) -> Result<Bitmap64, Error> {
        unsafe { Bitmap64::take_heap(ffi::roaring64_bitmap_copy(self.raw())) }
    }

    #[doc(alias = "roaring64_bitmap_to_uint64_array")]
    fn to_vec(&self) -> Vec<u64> {
        let len = self.cardinality() as usize;
        let mut values = Vec::with_capacity(len);
        unsafe {
            ffi::roaring64_bitmap_to_uint64_array(self.raw(), values.as_mut_ptr());
            values.set_len(len);
        }
        values
    }

    /// A forward cursor over the values of the bitmap
    #[doc(alias = "roaring64_iterator_create")]
    fn iter(&self) -> Result<Bitmap64Cursor<'_>, Error> {
        unsafe { Bitmap64Cursor::from_raw(ffi::roaring64_iterator_create(self.raw())) }
    }

    /// Bytes needed to serialize the bitmap in format `S`
    ///
    /// For [`Frozen`](crate::Frozen) this is zero until the bitmap has been shrunk.
    #[inline]
    fn get_serialized_size_in_bytes<S: Serializer>(&self) -> usize {
        unsafe { S::size_in_bytes(self.raw()) }
    }

    /// Append the serialized bitmap to `dst`, returning the newly written bytes
    ///
    /// # Errors
    ///
    /// [`Error::SerializationFailed`] if the bitmap cannot be written in format `S`, such as a
    /// frozen serialization of a bitmap that has not been shrunk.
    fn serialize_into_vec<'a, S: Serializer>(
        &self,
        dst: &'a mut Vec<u8>,
    ) -> Result<&'a [u8], Error> {
        let len = self.get_serialized_size_in_bytes::<S>();
        if len == 0 {
            return Err(Error::SerializationFailed { format: S::FORMAT });
        }
        let spare = get_aligned_spare_capacity(dst, S::REQUIRED_ALIGNMENT, len);
        unsafe {
            S::serialize_raw(self.raw(), spare.as_mut_ptr().cast::<c_char>());
        }
        let start = dst.len();
        unsafe { dst.set_len(start + len) };
        Ok(&dst[start..])
    }

    #[doc(alias = "roaring64_bitmap_statistics")]
    fn statistics(&self) -> Statistics {
        let mut stats = std::mem::MaybeUninit::<ffi::roaring64_statistics_t>::zeroed();
        unsafe {
            ffi::roaring64_bitmap_statistics(self.raw(), stats.as_mut_ptr());
            Statistics::from(stats.assume_init())
        }
    }

    #[doc(alias = "roaring64_bitmap_internal_validate")]
    fn internal_validate(&self) -> Result<(), Error> {
        let mut reason: *const c_char = std::ptr::null();
        let valid = unsafe { ffi::roaring64_bitmap_internal_validate(self.raw(), &mut reason) };
        if valid {
            return Ok(());
        }
        let reason = if reason.is_null() {
            String::from("unknown")
        } else {
            unsafe { CStr::from_ptr(reason) }.to_string_lossy().into_owned()
        };
        Err(Error::Invalid { reason })
    }
}
