use super::raw::RawBitmapMut;
use super::{Bitmap, ReadBitmap};
use crate::Error;

/// Handle for lazy bitwise operations inside [`Bitmap::lazy_batch`]
pub struct LazyBitmap<'a> {
    bitmap: &'a mut Bitmap,
}

impl<'a> LazyBitmap<'a> {
    /// Modifies the bitmap this lazy bitmap is associated with to be the union of the two bitmaps.
    ///
    /// # Arguments
    /// * `other` - The other bitmap to union with.
    /// * `force_bitsets` - Whether to force conversions to bitsets when modifying containers
    #[inline]
    #[doc(alias = "roaring_bitmap_lazy_or_inplace")]
    pub fn or_inplace<B: ReadBitmap + ?Sized>(
        &mut self,
        other: &B,
        force_bitsets: bool,
    ) -> &mut Self {
        // The mutable borrow of our bitmap means `other` cannot alias it
        let other = other.raw();
        unsafe { ffi::roaring_bitmap_lazy_or_inplace(self.bitmap.raw_mut(), other, force_bitsets) };
        self
    }

    /// Modifies the bitmap this lazy bitmap is associated with to be the xor of the two bitmaps.
    #[inline]
    #[doc(alias = "roaring_bitmap_lazy_xor_inplace")]
    pub fn xor_inplace<B: ReadBitmap + ?Sized>(&mut self, other: &B) -> &mut Self {
        let other = other.raw();
        unsafe { ffi::roaring_bitmap_lazy_xor_inplace(self.bitmap.raw_mut(), other) };
        self
    }
}

impl<B: ReadBitmap> std::ops::BitOrAssign<&B> for LazyBitmap<'_> {
    #[inline]
    fn bitor_assign(&mut self, other: &B) {
        self.or_inplace(other, false);
    }
}

impl<B: ReadBitmap> std::ops::BitXorAssign<&B> for LazyBitmap<'_> {
    #[inline]
    fn bitxor_assign(&mut self, other: &B) {
        self.xor_inplace(other);
    }
}

/// The result of a lazy union or symmetric difference, whose cardinality bookkeeping is stale
///
/// Nothing can be read from it until [`UnrepairedBitmap::repair`] turns it back into a
/// [`Bitmap`], so a lazy result can never be queried before it has been repaired.
#[must_use = "an unrepaired bitmap must be repaired before it can be used"]
pub struct UnrepairedBitmap {
    bitmap: Bitmap,
}

impl std::fmt::Debug for UnrepairedBitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Cardinalities are stale, so only the identity is printed
        write!(f, "UnrepairedBitmap<{}>", self.bitmap.instance_id())
    }
}

impl UnrepairedBitmap {
    /// Lazily union `other` into this result
    #[doc(alias = "roaring_bitmap_lazy_or_inplace")]
    pub fn or_inplace<B: ReadBitmap + ?Sized>(mut self, other: &B, force_bitsets: bool) -> Self {
        let other = other.raw();
        unsafe { ffi::roaring_bitmap_lazy_or_inplace(self.bitmap.raw_mut(), other, force_bitsets) };
        self
    }

    /// Lazily xor `other` into this result
    #[doc(alias = "roaring_bitmap_lazy_xor_inplace")]
    pub fn xor_inplace<B: ReadBitmap + ?Sized>(mut self, other: &B) -> Self {
        let other = other.raw();
        unsafe { ffi::roaring_bitmap_lazy_xor_inplace(self.bitmap.raw_mut(), other) };
        self
    }

    /// Recompute cardinalities, yielding a bitmap that can be queried again
    #[doc(alias = "roaring_bitmap_repair_after_lazy")]
    pub fn repair(mut self) -> Bitmap {
        unsafe { ffi::roaring_bitmap_repair_after_lazy(self.bitmap.raw_mut()) };
        self.bitmap
    }
}

impl Bitmap {
    /// Perform multiple bitwise operations on a bitmap.
    ///
    /// The passed closure will be passed a handle which can be used to perform bitwise
    /// operations on the bitmap lazily.
    ///
    /// The result will be equivalent to doing the same operations on this bitmap directly, but
    /// because of reduced bookkeeping in between operations, it should be faster
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap, ReadBitmap};
    ///
    /// let mut bitmap = Bitmap::of(&[99]).unwrap();
    /// let to_or = [Bitmap::of(&[1, 2, 5, 10]).unwrap(), Bitmap::of(&[1, 30, 100]).unwrap()];
    /// let to_xor = [Bitmap::of(&[5]).unwrap(), Bitmap::of(&[1, 1000, 1001]).unwrap()];
    ///
    /// bitmap.lazy_batch(|lazy| {
    ///     for b in &to_or {
    ///         *lazy |= b;
    ///     }
    ///     for b in &to_xor {
    ///         *lazy ^= b;
    ///     }
    /// });
    /// assert_eq!(bitmap.to_vec(), [2, 10, 30, 99, 100, 1000, 1001]);
    /// ```
    #[doc(alias = "roaring_bitmap_repair_after_lazy")]
    pub fn lazy_batch<F, O>(&mut self, f: F) -> O
    where
        F: FnOnce(&mut LazyBitmap<'_>) -> O,
    {
        let mut lazy_bitmap = LazyBitmap { bitmap: self };
        let result = f(&mut lazy_bitmap);
        unsafe { ffi::roaring_bitmap_repair_after_lazy(self.raw_mut()) };
        result
    }

    /// Lazy union of two bitmaps, which must be repaired before use
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap, ReadBitmap};
    ///
    /// let a = Bitmap::of(&[1, 2]).unwrap();
    /// let b = Bitmap::of(&[2, 3]).unwrap();
    /// let c = Bitmap::of(&[9]).unwrap();
    /// let union = Bitmap::lazy_or(&a, &b, false).unwrap().or_inplace(&c, false).repair();
    /// assert_eq!(union.to_vec(), [1, 2, 3, 9]);
    /// ```
    #[doc(alias = "roaring_bitmap_lazy_or")]
    pub fn lazy_or<A, B>(a: &A, b: &B, force_bitsets: bool) -> Result<UnrepairedBitmap, Error>
    where
        A: ReadBitmap + ?Sized,
        B: ReadBitmap + ?Sized,
    {
        let raw = unsafe { ffi::roaring_bitmap_lazy_or(a.raw(), b.raw(), force_bitsets) };
        let bitmap = unsafe { Bitmap::take_heap(raw)? };
        Ok(UnrepairedBitmap { bitmap })
    }

    /// Lazy symmetric difference of two bitmaps, which must be repaired before use
    #[doc(alias = "roaring_bitmap_lazy_xor")]
    pub fn lazy_xor<A, B>(a: &A, b: &B) -> Result<UnrepairedBitmap, Error>
    where
        A: ReadBitmap + ?Sized,
        B: ReadBitmap + ?Sized,
    {
        let bitmap = unsafe { Bitmap::take_heap(ffi::roaring_bitmap_lazy_xor(a.raw(), b.raw()))? };
        Ok(UnrepairedBitmap { bitmap })
    }

    /// Start a chain of lazy operations on this bitmap
    pub fn into_unrepaired(self) -> UnrepairedBitmap {
        UnrepairedBitmap { bitmap: self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_xor_matches_eager() {
        let a = Bitmap::from_range(0..5000).unwrap();
        let b = Bitmap::from_range(2500..7500).unwrap();
        let lazy = Bitmap::lazy_xor(&a, &b).unwrap().repair();
        assert_eq!(lazy, a.xor(&b).unwrap());
        assert_eq!(lazy.cardinality(), 5000);
    }

    #[test]
    fn test_unrepaired_chain_from_owned() {
        let parts: Vec<Bitmap> = (0..4)
            .map(|i| Bitmap::from_range(i * 100..i * 100 + 50).unwrap())
            .collect();
        let mut acc = Bitmap::new().unwrap().into_unrepaired();
        for part in &parts {
            acc = acc.or_inplace(part, true);
        }
        let result = acc.repair();
        assert_eq!(result.cardinality(), 200);
        result.internal_validate().unwrap();
    }
}
