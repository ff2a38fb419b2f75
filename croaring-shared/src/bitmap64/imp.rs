use super::serialization::Deserializer;
use super::{Bitmap64, ReadBitmap64, WriteBitmap64};
use crate::handle::{Handle, Identity};
use crate::range::span64;
use crate::Error;

impl Bitmap64 {
    #[inline]
    pub(crate) unsafe fn take_heap(p: *mut ffi::roaring64_bitmap_t) -> Result<Self, Error> {
        Ok(Self {
            handle: Handle::from_raw(p)?,
            identity: Identity::fresh(),
        })
    }

    /// Create a new empty bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap64, ReadBitmap64};
    ///
    /// let bitmap = Bitmap64::new().unwrap();
    /// assert_eq!(bitmap.cardinality(), 0);
    /// ```
    #[inline]
    #[doc(alias = "roaring64_bitmap_create")]
    pub fn new() -> Result<Self, Error> {
        unsafe { Self::take_heap(ffi::roaring64_bitmap_create()) }
    }

    /// Creates a new bitmap from a slice of u64 integers
    #[inline]
    #[doc(alias = "roaring64_bitmap_of_ptr")]
    pub fn of(values: &[u64]) -> Result<Self, Error> {
        unsafe { Self::take_heap(ffi::roaring64_bitmap_of_ptr(values.len(), values.as_ptr())) }
    }

    #[inline]
    pub fn from_range<R: std::ops::RangeBounds<u64>>(range: R) -> Result<Self, Error> {
        Self::from_range_with_step(range, 1)
    }

    /// Create a new bitmap containing every `step`th value of `range`, starting at its first
    /// value
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap64, ReadBitmap64};
    ///
    /// let bitmap = Bitmap64::from_range_with_step(0..10, 3).unwrap();
    /// assert_eq!(bitmap.to_vec(), [0, 3, 6, 9]);
    ///
    /// // Ranges including max value
    /// let bitmap = Bitmap64::from_range_with_step((u64::MAX - 1)..=u64::MAX, 1).unwrap();
    /// assert_eq!(bitmap.to_vec(), [u64::MAX - 1, u64::MAX]);
    /// let bitmap = Bitmap64::from_range_with_step((u64::MAX - 1)..=u64::MAX, 3).unwrap();
    /// assert_eq!(bitmap.to_vec(), [u64::MAX - 1]);
    /// ```
    #[doc(alias = "roaring64_bitmap_from_range")]
    pub fn from_range_with_step<R: std::ops::RangeBounds<u64>>(
        range: R,
        step: u64,
    ) -> Result<Self, Error> {
        if step == 0 {
            return Err(Error::ZeroStep);
        }
        let Some(span) = span64(&range)? else {
            return Self::new();
        };
        let ex = span.exclusive();
        // from_range takes an exclusive end, so u64::MAX is added afterwards when it belongs
        let mut bitmap = if ex.start == ex.end {
            Self::new()?
        } else {
            unsafe { Self::take_heap(ffi::roaring64_bitmap_from_range(ex.start, ex.end, step))? }
        };
        if ex.needs_max && (u64::MAX - ex.start) % step == 0 {
            bitmap.add(u64::MAX);
        }
        Ok(bitmap)
    }

    #[inline]
    pub fn try_clone(&self) -> Result<Self, Error> {
        self.to_bitmap64()
    }

    /// Rebuild a bitmap from bytes in format `D`, checked with CRoaring's validator
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap64, Portable, ReadBitmap64};
    ///
    /// let bitmap = Bitmap64::of(&[1, u64::MAX]).unwrap();
    /// let mut data = Vec::new();
    /// bitmap.serialize_into_vec::<Portable>(&mut data).unwrap();
    /// assert_eq!(Bitmap64::try_deserialize::<Portable>(&data).unwrap(), bitmap);
    /// ```
    pub fn try_deserialize<D: Deserializer>(data: &[u8]) -> Result<Self, Error> {
        let bitmap = unsafe { Self::take_heap(D::deserialize_raw(data)) }
            .map_err(|_| Error::Deserialization { format: D::FORMAT })?;
        bitmap.internal_validate()?;
        Ok(bitmap)
    }
}
