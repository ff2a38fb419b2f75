use crate::Error;
use std::fmt;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};

/// A CRoaring object type paired with the call that frees it.
pub trait NativeResource: crate::sealed::Sealed {
    /// Name used in errors and logs
    #[doc(hidden)]
    const NAME: &'static str;

    #[doc(hidden)]
    unsafe fn free(raw: *mut Self);
}

impl crate::sealed::Sealed for ffi::roaring_bitmap_t {}
impl NativeResource for ffi::roaring_bitmap_t {
    const NAME: &'static str = "bitmap";

    unsafe fn free(raw: *mut Self) {
        ffi::roaring_bitmap_free(raw);
    }
}

impl crate::sealed::Sealed for ffi::roaring64_bitmap_t {}
impl NativeResource for ffi::roaring64_bitmap_t {
    const NAME: &'static str = "64-bit bitmap";

    unsafe fn free(raw: *mut Self) {
        ffi::roaring64_bitmap_free(raw);
    }
}

impl crate::sealed::Sealed for ffi::roaring_uint32_iterator_t {}
impl NativeResource for ffi::roaring_uint32_iterator_t {
    const NAME: &'static str = "bitmap iterator";

    unsafe fn free(raw: *mut Self) {
        ffi::roaring_uint32_iterator_free(raw);
    }
}

impl crate::sealed::Sealed for ffi::roaring64_iterator_t {}
impl NativeResource for ffi::roaring64_iterator_t {
    const NAME: &'static str = "64-bit bitmap iterator";

    unsafe fn free(raw: *mut Self) {
        ffi::roaring64_iterator_free(raw);
    }
}

/// Exclusive ownership of one object allocated by CRoaring.
///
/// The null address is never stored: it is turned into [`Error::AllocationFailed`] by
/// [`Handle::from_raw`]. The matching free call is issued once, when the handle drops.
pub(crate) struct Handle<T: NativeResource> {
    raw: NonNull<T>,
}

impl<T: NativeResource> Handle<T> {
    /// Take ownership of `raw`, which must have been returned by a CRoaring allocating call
    /// and must not be owned by anything else.
    #[inline]
    pub(crate) unsafe fn from_raw(raw: *mut T) -> Result<Self, Error> {
        let raw = NonNull::new(raw).ok_or(Error::AllocationFailed { what: T::NAME })?;
        #[cfg(test)]
        accounting::record_alloc();
        Ok(Self { raw })
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut T {
        self.raw.as_ptr()
    }
}

impl<T: NativeResource> Drop for Handle<T> {
    fn drop(&mut self) {
        unsafe { T::free(self.raw.as_ptr()) };
        #[cfg(test)]
        accounting::record_free();
    }
}

impl<T: NativeResource> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle<{}>({:p})", T::NAME, self.raw)
    }
}

/// Process-unique identity of a bitmap wrapper
///
/// Identities are never reused, so a bulk context bound to a dropped bitmap can never match a
/// bitmap created later at the same address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

impl InstanceId {
    pub(crate) fn next() -> Self {
        Self(NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed))
    }

    /// The numeric value of this identity
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity plus mutation generation of a bitmap wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub(crate) id: InstanceId,
    pub(crate) generation: u64,
}

impl Identity {
    pub(crate) fn fresh() -> Self {
        Self {
            id: InstanceId::next(),
            generation: 0,
        }
    }

    /// Record a mutation which did not go through a bulk context
    #[inline]
    pub(crate) fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

/// Per-thread counts of handle allocations and frees, for leak and double-free checks.
#[cfg(test)]
pub(crate) mod accounting {
    use std::cell::Cell;

    thread_local! {
        static ALLOCATED: Cell<usize> = const { Cell::new(0) };
        static FREED: Cell<usize> = const { Cell::new(0) };
    }

    pub(crate) fn record_alloc() {
        ALLOCATED.with(|c| c.set(c.get() + 1));
    }

    pub(crate) fn record_free() {
        FREED.with(|c| c.set(c.get() + 1));
    }

    /// (allocated, freed) on the current thread
    pub(crate) fn counts() -> (usize, usize) {
        (ALLOCATED.with(Cell::get), FREED.with(Cell::get))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_is_allocation_failure() {
        let err = unsafe { Handle::<ffi::roaring_bitmap_t>::from_raw(std::ptr::null_mut()) }
            .unwrap_err();
        assert!(matches!(err, Error::AllocationFailed { what: "bitmap" }));
    }

    #[test]
    fn test_drop_frees_once() {
        let (alloc_before, free_before) = accounting::counts();
        {
            let handle =
                unsafe { Handle::from_raw(ffi::roaring_bitmap_create_with_capacity(0)) }.unwrap();
            assert!(!handle.as_ptr().is_null());
        }
        let (alloc_after, free_after) = accounting::counts();
        assert_eq!(alloc_after - alloc_before, 1);
        assert_eq!(free_after - free_before, 1);
    }

    #[test]
    fn test_instance_ids_are_unique() {
        let a = InstanceId::next();
        let b = InstanceId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }
}
