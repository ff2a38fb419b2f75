use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Sub, SubAssign};

use super::raw::RawBitmap;
use super::{Bitmap, ReadBitmap, WriteBitmap};

impl ReadBitmap for Bitmap {}

/// Shared `Debug` rendering for every 32-bit bitmap type
pub(crate) fn fmt_bitmap<B: ReadBitmap + ?Sized>(
    name: &str,
    bitmap: &B,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    match (bitmap.minimum(), bitmap.maximum()) {
        (Some(min), Some(max)) if bitmap.cardinality() >= 32 => write!(
            f,
            "{name}<{:?} values between {:?} and {:?}>",
            bitmap.cardinality(),
            min,
            max
        ),
        _ => write!(f, "{name}<{:?}>", bitmap.to_vec()),
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_bitmap("Bitmap", self, f)
    }
}

impl<B: ReadBitmap> PartialEq<B> for Bitmap {
    #[inline]
    fn eq(&self, other: &B) -> bool {
        unsafe { ffi::roaring_bitmap_equals(self.raw(), other.raw()) }
    }
}

impl Eq for Bitmap {}

impl Extend<u32> for Bitmap {
    /// Add every value produced by the iterator
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap, ReadBitmap};
    ///
    /// let mut bitmap = Bitmap::new().unwrap();
    /// bitmap.extend([5, 1, 3]);
    /// assert_eq!(bitmap.to_vec(), [1, 3, 5]);
    /// ```
    #[doc(alias = "roaring_bitmap_add_bulk")]
    fn extend<I: IntoIterator<Item = u32>>(&mut self, iter: I) {
        let mut ctx = crate::BulkContext::new(self);
        for value in iter {
            // The context was created for `self` just above, so it cannot be foreign
            let _ = ctx.add(self, value);
        }
    }
}

impl<B: ReadBitmap> BitAndAssign<&B> for Bitmap {
    /// Syntactic sugar for `.and_inplace`
    #[inline]
    fn bitand_assign(&mut self, other: &B) {
        self.and_inplace(other);
    }
}

impl<B: ReadBitmap> BitOrAssign<&B> for Bitmap {
    /// Syntactic sugar for `.or_inplace`
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap, ReadBitmap};
    ///
    /// let mut bitmap = Bitmap::of(&[15]).unwrap();
    /// bitmap |= &Bitmap::of(&[25]).unwrap();
    /// assert_eq!(bitmap.to_vec(), [15, 25]);
    /// ```
    #[inline]
    fn bitor_assign(&mut self, other: &B) {
        self.or_inplace(other);
    }
}

impl<B: ReadBitmap> BitXorAssign<&B> for Bitmap {
    /// Syntactic sugar for `.xor_inplace`
    #[inline]
    fn bitxor_assign(&mut self, other: &B) {
        self.xor_inplace(other);
    }
}

impl<B: ReadBitmap> SubAssign<&B> for Bitmap {
    /// Syntactic sugar for `.andnot_inplace`
    #[inline]
    fn sub_assign(&mut self, other: &B) {
        self.andnot_inplace(other);
    }
}

// Owned left operands are combined in place, so these operators never allocate a new bitmap.
// Borrowed combines go through `ReadBitmap::and` and friends, which report allocation failure.

impl<B: ReadBitmap> BitAnd<&B> for Bitmap {
    type Output = Bitmap;

    /// Syntactic sugar for `.and_inplace`, reusing the left operand
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap, ReadBitmap};
    ///
    /// let bitmap1 = Bitmap::of(&[15, 25]).unwrap();
    /// let bitmap2 = Bitmap::of(&[25, 35]).unwrap();
    /// let bitmap3 = bitmap1 & &bitmap2;
    ///
    /// assert_eq!(bitmap3.to_vec(), [25]);
    /// ```
    #[inline]
    fn bitand(mut self, other: &B) -> Bitmap {
        self.and_inplace(other);
        self
    }
}

impl<B: ReadBitmap> BitOr<&B> for Bitmap {
    type Output = Bitmap;

    /// Syntactic sugar for `.or_inplace`, reusing the left operand
    #[inline]
    fn bitor(mut self, other: &B) -> Bitmap {
        self.or_inplace(other);
        self
    }
}

impl<B: ReadBitmap> BitXor<&B> for Bitmap {
    type Output = Bitmap;

    /// Syntactic sugar for `.xor_inplace`, reusing the left operand
    #[inline]
    fn bitxor(mut self, other: &B) -> Bitmap {
        self.xor_inplace(other);
        self
    }
}

impl<B: ReadBitmap> Sub<&B> for Bitmap {
    type Output = Bitmap;

    /// Syntactic sugar for `.andnot_inplace`, reusing the left operand
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap, ReadBitmap};
    ///
    /// let bitmap1 = Bitmap::of(&[15, 25]).unwrap();
    /// let bitmap2 = Bitmap::of(&[25, 35]).unwrap();
    ///
    /// assert_eq!((bitmap1 - &bitmap2).to_vec(), [15]);
    /// ```
    #[inline]
    fn sub(mut self, other: &B) -> Bitmap {
        self.andnot_inplace(other);
        self
    }
}
