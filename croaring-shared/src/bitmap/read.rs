use super::raw::RawBitmap;
use super::serialization::{NoAlign, Serializer};
use super::{Bitmap, Statistics};
use crate::handle::InstanceId;
use crate::iter::BitmapCursor;
use crate::range::span32;
use crate::serialization::get_aligned_spare_capacity;
use crate::Error;
use std::ffi::{c_char, CStr};
use std::ops::RangeBounds;

/// Queries and non-mutating operations over a 32-bit bitmap
///
/// Implemented by [`Bitmap`] and [`FrozenBitmap`](crate::FrozenBitmap). Operations that
/// combine two bitmaps accept any mix of the two.
pub trait ReadBitmap: RawBitmap {
    /// Identity of this bitmap, stable for its whole lifetime
    #[inline]
    fn instance_id(&self) -> InstanceId {
        self.identity().id
    }

    /// Returns the number of integers contained in the bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap, ReadBitmap, WriteBitmap};
    ///
    /// let mut bitmap = Bitmap::new().unwrap();
    /// bitmap.add(1);
    /// assert_eq!(bitmap.cardinality(), 1);
    /// bitmap.add(2);
    /// assert_eq!(bitmap.cardinality(), 2);
    /// ```
    #[inline]
    #[doc(alias = "roaring_bitmap_get_cardinality")]
    fn cardinality(&self) -> u64 {
        unsafe { ffi::roaring_bitmap_get_cardinality(self.raw()) }
    }

    #[inline]
    #[doc(alias = "roaring_bitmap_is_empty")]
    fn is_empty(&self) -> bool {
        unsafe { ffi::roaring_bitmap_is_empty(self.raw()) }
    }

    #[inline]
    #[doc(alias = "roaring_bitmap_contains")]
    fn contains(&self, value: u32) -> bool {
        unsafe { ffi::roaring_bitmap_contains(self.raw(), value) }
    }

    /// Check whether every value in `range` is in the bitmap
    ///
    /// An empty range is always contained. A reversed range is an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap, ReadBitmap};
    ///
    /// let bitmap = Bitmap::of(&[1, 2, 3, 10]).unwrap();
    /// assert!(bitmap.contains_range(1..=3).unwrap());
    /// assert!(!bitmap.contains_range(1..=4).unwrap());
    /// assert!(bitmap.contains_range(7..7).unwrap());
    /// ```
    #[doc(alias = "roaring_bitmap_contains_range")]
    fn contains_range<R: RangeBounds<u32>>(&self, range: R) -> Result<bool, Error> {
        let span = span32(&range)?;
        if span.is_empty() {
            return Ok(true);
        }
        Ok(unsafe { ffi::roaring_bitmap_contains_range(self.raw(), span.start, span.end) })
    }

    /// Number of values in `range` which are in the bitmap
    #[doc(alias = "roaring_bitmap_range_cardinality")]
    fn range_cardinality<R: RangeBounds<u32>>(&self, range: R) -> Result<u64, Error> {
        let span = span32(&range)?;
        if span.is_empty() {
            return Ok(0);
        }
        Ok(unsafe { ffi::roaring_bitmap_range_cardinality(self.raw(), span.start, span.end) })
    }

    /// Returns the smallest value in the set, or `None` if the set is empty
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap, ReadBitmap};
    ///
    /// let empty = Bitmap::new().unwrap();
    /// assert_eq!(empty.minimum(), None);
    ///
    /// let bitmap = Bitmap::of(&[15, 4, 99]).unwrap();
    /// assert_eq!(bitmap.minimum(), Some(4));
    /// ```
    #[inline]
    #[doc(alias = "roaring_bitmap_minimum")]
    fn minimum(&self) -> Option<u32> {
        if self.is_empty() {
            None
        } else {
            Some(unsafe { ffi::roaring_bitmap_minimum(self.raw()) })
        }
    }

    #[inline]
    #[doc(alias = "roaring_bitmap_maximum")]
    fn maximum(&self) -> Option<u32> {
        if self.is_empty() {
            None
        } else {
            Some(unsafe { ffi::roaring_bitmap_maximum(self.raw()) })
        }
    }

    /// Number of values in the bitmap which are less than or equal to `value`
    #[inline]
    #[doc(alias = "roaring_bitmap_rank")]
    fn rank(&self, value: u32) -> u64 {
        unsafe { ffi::roaring_bitmap_rank(self.raw(), value) }
    }

    /// [`Self::rank`] for many values at once
    ///
    /// `values` must be sorted in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap, ReadBitmap};
    ///
    /// let bitmap = Bitmap::of(&[1, 5, 10]).unwrap();
    /// assert_eq!(bitmap.rank_many(&[0, 5, 11]).unwrap(), [0, 2, 3]);
    /// assert!(bitmap.rank_many(&[5, 1]).is_err());
    /// ```
    #[doc(alias = "roaring_bitmap_rank_many")]
    fn rank_many(&self, values: &[u32]) -> Result<Vec<u64>, Error> {
        if values.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::UnsortedInput);
        }
        let mut ranks = vec![0u64; values.len()];
        let range = values.as_ptr_range();
        unsafe {
            ffi::roaring_bitmap_rank_many(self.raw(), range.start, range.end, ranks.as_mut_ptr());
        }
        Ok(ranks)
    }

    /// Returns the value at position `rank` (counting from zero)
    #[inline]
    #[doc(alias = "roaring_bitmap_select")]
    fn select(&self, rank: u32) -> Option<u32> {
        let mut element = 0u32;
        let found = unsafe { ffi::roaring_bitmap_select(self.raw(), rank, &mut element) };
        found.then_some(element)
    }

    /// Zero-based position of `value` in the bitmap, `None` if it is absent
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap, ReadBitmap};
    ///
    /// let bitmap = Bitmap::of(&[10, 20, 30]).unwrap();
    /// assert_eq!(bitmap.position(20), Some(1));
    /// assert_eq!(bitmap.position(25), None);
    /// ```
    #[inline]
    #[doc(alias = "roaring_bitmap_get_index")]
    fn position(&self, value: u32) -> Option<u32> {
        let index = unsafe { ffi::roaring_bitmap_get_index(self.raw(), value) };
        u32::try_from(index).ok()
    }

    #[inline]
    #[doc(alias = "roaring_bitmap_is_subset")]
    fn is_subset<B: ReadBitmap + ?Sized>(&self, other: &B) -> bool {
        unsafe { ffi::roaring_bitmap_is_subset(self.raw(), other.raw()) }
    }

    #[inline]
    #[doc(alias = "roaring_bitmap_is_strict_subset")]
    fn is_strict_subset<B: ReadBitmap + ?Sized>(&self, other: &B) -> bool {
        unsafe { ffi::roaring_bitmap_is_strict_subset(self.raw(), other.raw()) }
    }

    #[inline]
    fn is_superset<B: ReadBitmap + ?Sized>(&self, other: &B) -> bool {
        other.is_subset(self)
    }

    /// Returns true if the two bitmaps share at least one value
    #[inline]
    #[doc(alias = "roaring_bitmap_intersect")]
    fn intersect<B: ReadBitmap + ?Sized>(&self, other: &B) -> bool {
        unsafe { ffi::roaring_bitmap_intersect(self.raw(), other.raw()) }
    }

    /// Returns true if any value in `range` is in the bitmap
    #[doc(alias = "roaring_bitmap_intersect_with_range")]
    fn intersect_with_range<R: RangeBounds<u32>>(&self, range: R) -> Result<bool, Error> {
        let span = span32(&range)?;
        if span.is_empty() {
            return Ok(false);
        }
        Ok(unsafe { ffi::roaring_bitmap_intersect_with_range(self.raw(), span.start, span.end) })
    }

    /// Jaccard index (Tanimoto distance, Jaccard similarity coefficient) of the two bitmaps
    ///
    /// The result is NaN when both bitmaps are empty.
    #[inline]
    #[doc(alias = "roaring_bitmap_jaccard_index")]
    fn jaccard_index<B: ReadBitmap + ?Sized>(&self, other: &B) -> f64 {
        unsafe { ffi::roaring_bitmap_jaccard_index(self.raw(), other.raw()) }
    }

    /// Intersection of the two bitmaps, as a new bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap, ReadBitmap};
    ///
    /// let a = Bitmap::of(&[1, 2, 3]).unwrap();
    /// let b = Bitmap::of(&[2, 3, 4]).unwrap();
    /// assert_eq!(a.and(&b).unwrap().to_vec(), [2, 3]);
    /// ```
    #[inline]
    #[doc(alias = "roaring_bitmap_and")]
    fn and<B: ReadBitmap + ?Sized>(&self, other: &B) -> Result<Bitmap, Error> {
        unsafe { Bitmap::take_heap(ffi::roaring_bitmap_and(self.raw(), other.raw())) }
    }

    #[inline]
    #[doc(alias = "roaring_bitmap_or")]
    fn or<B: ReadBitmap + ?Sized>(&self, other: &B) -> Result<Bitmap, Error> {
        unsafe { Bitmap::take_heap(ffi::roaring_bitmap_or(self.raw(), other.raw())) }
    }

    #[inline]
    #[doc(alias = "roaring_bitmap_xor")]
    fn xor<B: ReadBitmap + ?Sized>(&self, other: &B) -> Result<Bitmap, Error> {
        unsafe { Bitmap::take_heap(ffi::roaring_bitmap_xor(self.raw(), other.raw())) }
    }

    /// Values in `self` but not in `other`, as a new bitmap
    #[inline]
    #[doc(alias = "roaring_bitmap_andnot")]
    fn andnot<B: ReadBitmap + ?Sized>(&self, other: &B) -> Result<Bitmap, Error> {
        unsafe { Bitmap::take_heap(ffi::roaring_bitmap_andnot(self.raw(), other.raw())) }
    }

    #[inline]
    #[doc(alias = "roaring_bitmap_and_cardinality")]
    fn and_cardinality<B: ReadBitmap + ?Sized>(&self, other: &B) -> u64 {
        unsafe { ffi::roaring_bitmap_and_cardinality(self.raw(), other.raw()) }
    }

    #[inline]
    #[doc(alias = "roaring_bitmap_or_cardinality")]
    fn or_cardinality<B: ReadBitmap + ?Sized>(&self, other: &B) -> u64 {
        unsafe { ffi::roaring_bitmap_or_cardinality(self.raw(), other.raw()) }
    }

    #[inline]
    #[doc(alias = "roaring_bitmap_xor_cardinality")]
    fn xor_cardinality<B: ReadBitmap + ?Sized>(&self, other: &B) -> u64 {
        unsafe { ffi::roaring_bitmap_xor_cardinality(self.raw(), other.raw()) }
    }

    #[inline]
    #[doc(alias = "roaring_bitmap_andnot_cardinality")]
    fn andnot_cardinality<B: ReadBitmap + ?Sized>(&self, other: &B) -> u64 {
        unsafe { ffi::roaring_bitmap_andnot_cardinality(self.raw(), other.raw()) }
    }

    /// A new bitmap with every value shifted by `offset`
    ///
    /// Values which would fall outside `0..=u32::MAX` are dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap, ReadBitmap};
    ///
    /// let bitmap = Bitmap::of(&[0, 1, 4_000_000_000]).unwrap();
    /// let shifted = bitmap.offset(500_000_000).unwrap();
    /// assert_eq!(shifted.to_vec(), [500_000_000, 500_000_001]);
    /// ```
    #[inline]
    #[doc(alias = "roaring_bitmap_add_offset")]
    fn offset(&self, offset: i64) -> Result<Bitmap, Error> {
        unsafe { Bitmap::take_heap(ffi::roaring_bitmap_add_offset(self.raw(), offset)) }
    }

    /// A new bitmap with the membership of every value in `range` negated
    #[doc(alias = "roaring_bitmap_flip")]
    fn flip<R: RangeBounds<u32>>(&self, range: R) -> Result<Bitmap, Error> {
        let span = span32(&range)?;
        unsafe { Bitmap::take_heap(ffi::roaring_bitmap_flip(self.raw(), span.start, span.end)) }
    }

    /// Owned, mutable deep copy of this bitmap
    #[inline]
    #[doc(alias = "roaring_bitmap_copy")]
    fn to_bitmap(&self) -> Result<Bitmap, Error> {
        unsafe { Bitmap::take_heap(ffi::roaring_bitmap_copy(self.raw())) }
    }

    /// All values in ascending order
    #[doc(alias = "roaring_bitmap_to_uint32_array")]
    fn to_vec(&self) -> Vec<u32> {
        let len = self.cardinality() as usize;
        let mut values = Vec::with_capacity(len);
        unsafe {
            ffi::roaring_bitmap_to_uint32_array(self.raw(), values.as_mut_ptr());
            values.set_len(len);
        }
        values
    }

    /// A forward cursor over the values of the bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap, ReadBitmap};
    ///
    /// let bitmap = Bitmap::of(&[3, 1, 2]).unwrap();
    /// let mut cursor = bitmap.iter().unwrap();
    /// assert!(cursor.current().is_err());
    /// assert!(cursor.move_next().unwrap());
    /// assert_eq!(cursor.current().unwrap(), 1);
    /// assert_eq!(cursor.collect::<Vec<_>>(), [2, 3]);
    /// ```
    #[doc(alias = "roaring_iterator_create")]
    fn iter(&self) -> Result<BitmapCursor<'_>, Error> {
        unsafe { BitmapCursor::from_raw(ffi::roaring_iterator_create(self.raw())) }
    }

    /// Bytes needed to serialize the bitmap in format `S`
    #[inline]
    fn get_serialized_size_in_bytes<S: Serializer>(&self) -> usize {
        unsafe { S::size_in_bytes(self.raw()) }
    }

    /// Serialize into a new `Vec`
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap, Portable, ReadBitmap};
    ///
    /// let bitmap = Bitmap::of(&[1, 2, 3]).unwrap();
    /// let data = bitmap.serialize::<Portable>();
    /// let copy = Bitmap::try_deserialize::<Portable>(&data).unwrap();
    /// assert_eq!(bitmap, copy);
    /// ```
    fn serialize<S: NoAlign>(&self) -> Vec<u8> {
        let mut dst = Vec::new();
        self.serialize_into_vec::<S>(&mut dst);
        dst
    }

    /// Append the serialized bitmap to `dst`, returning the newly written bytes
    ///
    /// For formats with an alignment requirement, `dst` is zero-padded first so the returned
    /// slice starts at an aligned address.
    fn serialize_into_vec<'a, S: Serializer>(&self, dst: &'a mut Vec<u8>) -> &'a [u8] {
        let len = self.get_serialized_size_in_bytes::<S>();
        let spare = get_aligned_spare_capacity(dst, S::REQUIRED_ALIGNMENT, len);
        unsafe {
            S::serialize_raw(self.raw(), spare.as_mut_ptr().cast::<c_char>());
        }
        let start = dst.len();
        unsafe { dst.set_len(start + len) };
        &dst[start..]
    }

    /// Serialize into a caller-provided buffer, returning the number of bytes written
    ///
    /// # Errors
    ///
    /// [`Error::BufferTooSmall`] if `dst` is shorter than the serialized size, and
    /// [`Error::Misaligned`] if `dst` does not start at the alignment of `S`.
    fn try_serialize_into<S: Serializer>(&self, dst: &mut [u8]) -> Result<usize, Error> {
        let len = self.get_serialized_size_in_bytes::<S>();
        if dst.len() < len {
            return Err(Error::BufferTooSmall {
                required: len,
                available: dst.len(),
            });
        }
        if dst.as_ptr().align_offset(S::REQUIRED_ALIGNMENT) != 0 {
            return Err(Error::Misaligned {
                required: S::REQUIRED_ALIGNMENT,
            });
        }
        unsafe { S::serialize_raw(self.raw(), dst.as_mut_ptr().cast::<c_char>()) };
        Ok(len)
    }

    /// Composition of the bitmap's containers
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap, ReadBitmap};
    ///
    /// let bitmap = Bitmap::from_range(1..100).unwrap();
    /// let stats = bitmap.statistics();
    /// assert_eq!(stats.cardinality, 99);
    /// assert_eq!(stats.min_value, 1);
    /// assert_eq!(stats.max_value, 99);
    /// ```
    #[doc(alias = "roaring_bitmap_statistics")]
    fn statistics(&self) -> Statistics {
        let mut stats = std::mem::MaybeUninit::<ffi::roaring_statistics_t>::zeroed();
        unsafe {
            ffi::roaring_bitmap_statistics(self.raw(), stats.as_mut_ptr());
            Statistics::from(stats.assume_init())
        }
    }

    /// Run CRoaring's consistency checks over the bitmap's internal structure
    #[doc(alias = "roaring_bitmap_internal_validate")]
    fn internal_validate(&self) -> Result<(), Error> {
        let mut reason: *const c_char = std::ptr::null();
        let valid = unsafe { ffi::roaring_bitmap_internal_validate(self.raw(), &mut reason) };
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
