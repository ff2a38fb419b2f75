use std::fmt;
use std::ops::{BitAndAssign, BitOrAssign, BitXorAssign, SubAssign};

use super::raw::RawBitmap64;
use super::{Bitmap64, ReadBitmap64, WriteBitmap64};

impl ReadBitmap64 for Bitmap64 {}

pub(crate) fn fmt_bitmap64<B: ReadBitmap64 + ?Sized>(
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

impl fmt::Debug for Bitmap64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_bitmap64("Bitmap64", self, f)
    }
}

impl<B: ReadBitmap64> PartialEq<B> for Bitmap64 {
    #[inline]
    #[doc(alias = "roaring64_bitmap_equals")]
    fn eq(&self, other: &B) -> bool {
        unsafe { ffi::roaring64_bitmap_equals(self.raw(), other.raw()) }
    }
}

impl Eq for Bitmap64 {}

impl Extend<u64> for Bitmap64 {
    #[doc(alias = "roaring64_bitmap_add_bulk")]
    fn extend<I: IntoIterator<Item = u64>>(&mut self, iter: I) {
        let mut ctx = crate::BulkContext64::new(self);
        for value in iter {
            // The context was created for `self` just above, so it cannot be foreign
            let _ = ctx.add(self, value);
        }
    }
}

impl<B: ReadBitmap64> BitAndAssign<&B> for Bitmap64 {
    #[inline]
    fn bitand_assign(&mut self, other: &B) {
        self.and_inplace(other);
    }
}

impl<B: ReadBitmap64> BitOrAssign<&B> for Bitmap64 {
    #[inline]
    fn bitor_assign(&mut self, other: &B) {
        self.or_inplace(other);
    }
}

impl<B: ReadBitmap64> BitXorAssign<&B> for Bitmap64 {
    #[inline]
    fn bitxor_assign(&mut self, other: &B) {
        self.xor_inplace(other);
    }
}

impl<B: ReadBitmap64> SubAssign<&B> for Bitmap64 {
    #[inline]
    fn sub_assign(&mut self, other: &B) {
        self.andnot_inplace(other);
    }
}
