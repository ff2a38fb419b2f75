use std::fmt;
use std::mem::MaybeUninit;

/// The `Portable` format is meant to be compatible with other roaring bitmap libraries, such as
/// Go or Java.
///
/// Note despite the name, it is not fully portable: it depends on native endianness.
///
/// It's defined here: <https://github.com/RoaringBitmap/RoaringFormatSpec>
pub enum Portable {}

/// The `Native` format format can sometimes be more space efficient than [`Portable`],
///
/// e.g. when the data is sparse. It's not compatible with Java and Go implementations.
/// Use [`Portable`] for that purpose.
pub enum Native {}

/// The `Frozen` format imitates memory layout of the underlying C library.
///
/// Deserializing it yields a view directly over the supplied bytes. Because the layout mirrors
/// the C structures, it differs between big and little endian platforms and may change with
/// the library version.
pub enum Frozen {}

impl Frozen {
    /// The frozen format requires 32-bit bitmaps to be aligned to 32 bytes.
    pub const REQUIRED_ALIGNMENT: usize = 32;
}

impl crate::sealed::Sealed for Portable {}
impl crate::sealed::Sealed for Native {}
impl crate::sealed::Sealed for Frozen {}

/// Runtime name of a serialization format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Format {
    Native,
    Portable,
    Frozen,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Native => "native",
            Format::Portable => "portable",
            Format::Frozen => "frozen",
        })
    }
}

/// Reserve `required_len` bytes past the end of `dst`, padding `dst` with zeroes so the
/// returned spare capacity starts at a multiple of `align`.
pub(crate) fn get_aligned_spare_capacity(
    dst: &mut Vec<u8>,
    align: usize,
    required_len: usize,
) -> &mut [MaybeUninit<u8>] {
    let padding = |v: &mut Vec<u8>| v.spare_capacity_mut().as_ptr().align_offset(align);
    let mut extra_offset = padding(dst);
    if dst.spare_capacity_mut().len() < required_len + extra_offset {
        dst.reserve(required_len + (align - 1));
        // The buffer may have moved
        extra_offset = padding(dst);
    }
    if extra_offset != 0 {
        let data_start = dst.len() + extra_offset;
        dst.resize(data_start, 0);
    }
    let spare_capacity = dst.spare_capacity_mut();
    debug_assert!(spare_capacity.len() >= required_len);
    debug_assert_eq!(spare_capacity.as_ptr().align_offset(align), 0);

    &mut spare_capacity[..required_len]
}
