use super::raw::RawBitmap;
use super::serialization::Deserializer;
use super::{Bitmap, ReadBitmap};
use crate::handle::{Handle, Identity};
use crate::range::span32;
use crate::serialization::{Format, Native, Portable};
use crate::Error;
use ffi::roaring_bitmap_t;
use std::mem;
use std::ops::RangeBounds;

impl Bitmap {
    /// Smallest step CRoaring's stepped range constructor cannot walk without wrapping
    const NATIVE_STEP_LIMIT: u32 = 1 << 16;

    /// Take ownership of a bitmap returned by an allocating CRoaring call
    #[inline]
    pub(crate) unsafe fn take_heap(p: *mut roaring_bitmap_t) -> Result<Self, Error> {
        Ok(Self {
            handle: Handle::from_raw(p)?,
            identity: Identity::fresh(),
        })
    }

    /// Creates a new, empty bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap, ReadBitmap};
    ///
    /// let bitmap = Bitmap::new().unwrap();
    /// assert!(bitmap.is_empty());
    /// ```
    #[inline]
    pub fn new() -> Result<Self, Error> {
        Self::with_capacity(0)
    }

    /// Creates a new, empty bitmap with room for `capacity` containers
    #[inline]
    #[doc(alias = "roaring_bitmap_create_with_capacity")]
    pub fn with_capacity(capacity: u32) -> Result<Self, Error> {
        unsafe { Self::take_heap(ffi::roaring_bitmap_create_with_capacity(capacity)) }
    }

    /// Creates a bitmap holding exactly `values`
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap, ReadBitmap};
    ///
    /// let bitmap = Bitmap::of(&[3, 1, 2, 1]).unwrap();
    /// assert_eq!(bitmap.to_vec(), [1, 2, 3]);
    /// ```
    #[inline]
    #[doc(alias = "roaring_bitmap_of_ptr")]
    pub fn of(values: &[u32]) -> Result<Self, Error> {
        unsafe { Self::take_heap(ffi::roaring_bitmap_of_ptr(values.len(), values.as_ptr())) }
    }

    /// Creates a bitmap holding every value in `range`
    #[inline]
    pub fn from_range<R: RangeBounds<u32>>(range: R) -> Result<Self, Error> {
        Self::from_range_with_step(range, 1)
    }

    /// Creates a bitmap holding every `step`th value of `range`, starting at its first value
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap, Error, ReadBitmap};
    ///
    /// let bitmap = Bitmap::from_range_with_step(0..10, 3).unwrap();
    /// assert_eq!(bitmap.to_vec(), [0, 3, 6, 9]);
    ///
    /// let empty = Bitmap::from_range_with_step(5..5, 3).unwrap();
    /// assert!(empty.is_empty());
    ///
    /// assert!(matches!(Bitmap::from_range_with_step(0..10, 0), Err(Error::ZeroStep)));
    /// ```
    #[doc(alias = "roaring_bitmap_from_range")]
    pub fn from_range_with_step<R: RangeBounds<u32>>(range: R, step: u32) -> Result<Self, Error> {
        if step == 0 {
            return Err(Error::ZeroStep);
        }
        let span = span32(&range)?;
        if span.is_empty() {
            // from_range returns null for an empty range
            return Self::new();
        }
        if step >= Self::NATIVE_STEP_LIMIT {
            // CRoaring advances large steps with a 32-bit counter, which wraps instead of
            // passing the end of the range. At most 2^16 values fit here.
            let values: Vec<u32> = (span.start..span.end)
                .step_by(step as usize)
                .map(|value| value as u32)
                .collect();
            return Self::of(&values);
        }
        unsafe { Self::take_heap(ffi::roaring_bitmap_from_range(span.start, span.end, step)) }
    }

    /// Deep copy into a new, independently owned bitmap
    #[inline]
    pub fn try_clone(&self) -> Result<Self, Error> {
        self.to_bitmap()
    }

    /// Shift every value by `offset` in place
    ///
    /// Values which would fall outside `0..=u32::MAX` are dropped. The previous native
    /// bitmap is freed once the shifted one has been allocated; on allocation failure the
    /// bitmap is left unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap, ReadBitmap};
    ///
    /// let mut bitmap = Bitmap::of(&[0]).unwrap();
    /// bitmap.add_offset(i64::from(u32::MAX)).unwrap();
    /// assert_eq!(bitmap.to_vec(), [u32::MAX]);
    /// ```
    #[doc(alias = "roaring_bitmap_add_offset")]
    pub fn add_offset(&mut self, offset: i64) -> Result<(), Error> {
        let shifted =
            unsafe { Handle::from_raw(ffi::roaring_bitmap_add_offset(self.raw(), offset))? };
        let previous = mem::replace(&mut self.handle, shifted);
        drop(previous);
        self.identity.bump();
        tracing::debug!(bitmap = %self.identity.id, offset, "replaced native bitmap after offset");
        Ok(())
    }

    /// Union of many bitmaps at once
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap, ReadBitmap};
    ///
    /// let a = Bitmap::of(&[1]).unwrap();
    /// let b = Bitmap::of(&[2]).unwrap();
    /// let c = Bitmap::of(&[3]).unwrap();
    /// assert_eq!(Bitmap::fast_or(&[&a, &b, &c]).unwrap().to_vec(), [1, 2, 3]);
    /// assert!(Bitmap::fast_or::<Bitmap>(&[]).unwrap().is_empty());
    /// ```
    #[doc(alias = "roaring_bitmap_or_many")]
    pub fn fast_or<B: ReadBitmap>(bitmaps: &[&B]) -> Result<Self, Error> {
        let mut raws = raw_pointers(bitmaps);
        unsafe { Self::take_heap(ffi::roaring_bitmap_or_many(raws.len(), raws.as_mut_ptr())) }
    }

    /// Union of many bitmaps, using a heap-based strategy
    ///
    /// Can be faster than [`Bitmap::fast_or`] when there are many sparse bitmaps.
    #[doc(alias = "roaring_bitmap_or_many_heap")]
    pub fn fast_or_heap<B: ReadBitmap>(bitmaps: &[&B]) -> Result<Self, Error> {
        let mut raws = raw_pointers(bitmaps);
        let Ok(count) = u32::try_from(raws.len()) else {
            return Self::fast_or(bitmaps);
        };
        unsafe { Self::take_heap(ffi::roaring_bitmap_or_many_heap(count, raws.as_mut_ptr())) }
    }

    /// Symmetric difference of many bitmaps at once
    #[doc(alias = "roaring_bitmap_xor_many")]
    pub fn fast_xor<B: ReadBitmap>(bitmaps: &[&B]) -> Result<Self, Error> {
        let mut raws = raw_pointers(bitmaps);
        unsafe { Self::take_heap(ffi::roaring_bitmap_xor_many(raws.len(), raws.as_mut_ptr())) }
    }

    /// Rebuild a bitmap from bytes in format `D`
    ///
    /// The result is checked with CRoaring's internal validator before it is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap, Native, ReadBitmap};
    ///
    /// let bitmap = Bitmap::of(&[7, 8, 9]).unwrap();
    /// let data = bitmap.serialize::<Native>();
    /// assert_eq!(Bitmap::try_deserialize::<Native>(&data).unwrap(), bitmap);
    /// assert!(Bitmap::try_deserialize::<Native>(&[1, 2, 3]).is_err());
    /// ```
    pub fn try_deserialize<D: Deserializer>(data: &[u8]) -> Result<Self, Error> {
        let bitmap = unsafe { Self::take_heap(D::deserialize_raw(data)) }
            .map_err(|_| Error::Deserialization { format: D::FORMAT })?;
        bitmap.internal_validate()?;
        Ok(bitmap)
    }

    /// [`Bitmap::try_deserialize`] with the format chosen at runtime
    ///
    /// The [`Format::Frozen`] format cannot produce an owned bitmap: map a
    /// [`FrozenBitmap`](crate::FrozenBitmap) and copy it with
    /// [`ReadBitmap::to_bitmap`] instead.
    pub fn deserialize_as(format: Format, data: &[u8]) -> Result<Self, Error> {
        match format {
            Format::Portable => Self::try_deserialize::<Portable>(data),
            Format::Native => Self::try_deserialize::<Native>(data),
            Format::Frozen => Err(Error::UnsupportedFormat {
                format,
                operation: "deserialize",
            }),
        }
    }
}

fn raw_pointers<B: ReadBitmap>(bitmaps: &[&B]) -> Vec<*const roaring_bitmap_t> {
    bitmaps.iter().map(|b| b.raw()).collect()
}
