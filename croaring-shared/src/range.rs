//! Normalisation of `RangeBounds` into the forms CRoaring's range calls accept.
//!
//! A range whose normalised start lies past its exclusive end is rejected before any native
//! call; an empty range (`5..5`) is valid.

use crate::Error;
use std::ops::{Bound, RangeBounds};

/// A half-open range of 32-bit values, widened so `end` can be `2^32`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span32 {
    pub(crate) start: u64,
    pub(crate) end: u64,
}

impl Span32 {
    pub(crate) fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Inclusive bounds as 32-bit values, `None` when empty
    pub(crate) fn closed(&self) -> Option<(u32, u32)> {
        if self.is_empty() {
            return None;
        }
        // start < end <= 2^32, so both fit
        Some((self.start as u32, (self.end - 1) as u32))
    }
}

pub(crate) fn span32<R: RangeBounds<u32>>(range: &R) -> Result<Span32, Error> {
    let start = match range.start_bound() {
        Bound::Included(&i) => u64::from(i),
        Bound::Excluded(&i) => u64::from(i) + 1,
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&i) => u64::from(i) + 1,
        Bound::Excluded(&i) => u64::from(i),
        Bound::Unbounded => u64::from(u32::MAX) + 1,
    };
    if start > end {
        return Err(Error::InvalidRange { start, end });
    }
    Ok(Span32 { start, end })
}

/// A non-empty closed range of 64-bit values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span64 {
    pub(crate) start: u64,
    pub(crate) last: u64,
}

/// Exclusive form of a [`Span64`]: `[start, end)` plus whether `u64::MAX` is also included,
/// which no exclusive 64-bit range can express
pub(crate) struct Exclusive64 {
    pub(crate) start: u64,
    pub(crate) end: u64,
    pub(crate) needs_max: bool,
}

impl Span64 {
    pub(crate) fn exclusive(&self) -> Exclusive64 {
        match self.last.checked_add(1) {
            Some(end) => Exclusive64 {
                start: self.start,
                end,
                needs_max: false,
            },
            None => Exclusive64 {
                start: self.start,
                end: u64::MAX,
                needs_max: true,
            },
        }
    }
}

/// Returns `Ok(None)` for an empty range
pub(crate) fn span64<R: RangeBounds<u64>>(range: &R) -> Result<Option<Span64>, Error> {
    // Widen so that Excluded(u64::MAX) and Unbounded ends are representable
    let start = match range.start_bound() {
        Bound::Included(&i) => u128::from(i),
        Bound::Excluded(&i) => u128::from(i) + 1,
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&i) => u128::from(i) + 1,
        Bound::Excluded(&i) => u128::from(i),
        Bound::Unbounded => u128::from(u64::MAX) + 1,
    };
    if start > end {
        return Err(Error::InvalidRange {
            start: u64::try_from(start).unwrap_or(u64::MAX),
            end: u64::try_from(end).unwrap_or(u64::MAX),
        });
    }
    if start == end {
        return Ok(None);
    }
    // start < end <= 2^64, so start and end - 1 fit in u64
    Ok(Some(Span64 {
        start: start as u64,
        last: (end - 1) as u64,
    }))
}
