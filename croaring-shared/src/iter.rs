//! Forward-only cursors over bitmap values.
//!
//! A cursor starts *before* the first value: [`ForwardIterator::current`] fails until the
//! first successful [`ForwardIterator::move_next`]. Cursors cannot be rewound.

use crate::handle::{Handle, NativeResource};
use crate::sealed::Sealed;
use crate::Error;
use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;

/// The native calls behind one kind of cursor
pub trait CursorProtocol: Sealed {
    type Value: Copy + fmt::Debug;
    #[doc(hidden)]
    type Native: NativeResource;

    #[doc(hidden)]
    unsafe fn has_value(raw: *const Self::Native) -> bool;

    /// Only called while `has_value` holds
    #[doc(hidden)]
    unsafe fn value(raw: *const Self::Native) -> Self::Value;

    #[doc(hidden)]
    unsafe fn advance(raw: *mut Self::Native) -> bool;

    #[doc(hidden)]
    unsafe fn copy(raw: *const Self::Native) -> *mut Self::Native;

    /// Read up to `dst.len()` values, leaving the native cursor on the next unread value
    #[doc(hidden)]
    unsafe fn read(raw: *mut Self::Native, dst: &mut [Self::Value]) -> usize;
}

/// Cursor protocol over 32-bit bitmaps
pub enum Values32 {}

/// Cursor protocol over 64-bit bitmaps
pub enum Values64 {}

impl Sealed for Values32 {}
impl Sealed for Values64 {}

impl CursorProtocol for Values32 {
    type Value = u32;
    type Native = ffi::roaring_uint32_iterator_t;

    #[inline]
    unsafe fn has_value(raw: *const Self::Native) -> bool {
        (*raw).has_value
    }

    #[inline]
    unsafe fn value(raw: *const Self::Native) -> u32 {
        (*raw).current_value
    }

    #[inline]
    unsafe fn advance(raw: *mut Self::Native) -> bool {
        ffi::roaring_uint32_iterator_advance(raw)
    }

    unsafe fn copy(raw: *const Self::Native) -> *mut Self::Native {
        ffi::roaring_uint32_iterator_copy(raw)
    }

    unsafe fn read(raw: *mut Self::Native, dst: &mut [u32]) -> usize {
        let count = u32::try_from(dst.len()).unwrap_or(u32::MAX);
        let read = ffi::roaring_uint32_iterator_read(raw, dst.as_mut_ptr(), count);
        debug_assert!(read <= count);
        read as usize
    }
}

impl CursorProtocol for Values64 {
    type Value = u64;
    type Native = ffi::roaring64_iterator_t;

    #[inline]
    unsafe fn has_value(raw: *const Self::Native) -> bool {
        ffi::roaring64_iterator_has_value(raw)
    }

    #[inline]
    unsafe fn value(raw: *const Self::Native) -> u64 {
        ffi::roaring64_iterator_value(raw)
    }

    #[inline]
    unsafe fn advance(raw: *mut Self::Native) -> bool {
        ffi::roaring64_iterator_advance(raw)
    }

    unsafe fn copy(raw: *const Self::Native) -> *mut Self::Native {
        ffi::roaring64_iterator_copy(raw)
    }

    unsafe fn read(raw: *mut Self::Native, dst: &mut [u64]) -> usize {
        let count = dst.len() as u64;
        let read = ffi::roaring64_iterator_read(raw, dst.as_mut_ptr(), count);
        debug_assert!(read <= count);
        read as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// The native cursor sits on a value not yet yielded, or on the end
    Pending,
    /// The native cursor sits on the value last yielded
    OnValue,
    Exhausted,
}

/// A forward cursor over the values of a bitmap, owning its native cursor
///
/// The cursor borrows the bitmap it walks, so the bitmap can neither be mutated nor dropped
/// while the cursor exists. [`ForwardIterator::release`] frees the native cursor early;
/// the cursor reports [`Error::Released`] after that.
pub struct ForwardIterator<'a, C: CursorProtocol> {
    handle: Option<Handle<C::Native>>,
    position: Position,
    _bitmap: PhantomData<&'a ()>,
}

/// Cursor over a [`Bitmap`](crate::Bitmap) or [`FrozenBitmap`](crate::FrozenBitmap)
pub type BitmapCursor<'a> = ForwardIterator<'a, Values32>;

/// Cursor over a [`Bitmap64`](crate::Bitmap64) or [`FrozenBitmap64`](crate::FrozenBitmap64)
pub type Bitmap64Cursor<'a> = ForwardIterator<'a, Values64>;

unsafe impl<C: CursorProtocol> Send for ForwardIterator<'_, C> {}
unsafe impl<C: CursorProtocol> Sync for ForwardIterator<'_, C> {}

impl<'a, C: CursorProtocol> ForwardIterator<'a, C> {
    const RESOURCE: &'static str = "iterator";

    pub(crate) unsafe fn from_raw(raw: *mut C::Native) -> Result<Self, Error> {
        Ok(Self {
            handle: Some(Handle::from_raw(raw)?),
            position: Position::Pending,
            _bitmap: PhantomData,
        })
    }

    fn raw(&self) -> Result<*mut C::Native, Error> {
        self.handle
            .as_ref()
            .map(Handle::as_ptr)
            .ok_or(Error::Released {
                resource: Self::RESOURCE,
            })
    }

    /// Step to the next value, returning false once the values are exhausted
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap, ReadBitmap};
    ///
    /// let empty = Bitmap::new().unwrap();
    /// let mut cursor = empty.iter().unwrap();
    /// assert!(!cursor.move_next().unwrap());
    /// assert!(!cursor.move_next().unwrap());
    /// assert!(cursor.current().is_err());
    /// ```
    pub fn move_next(&mut self) -> Result<bool, Error> {
        let raw = self.raw()?;
        let has_value = match self.position {
            Position::Exhausted => return Ok(false),
            Position::Pending => unsafe { C::has_value(raw) },
            Position::OnValue => unsafe { C::advance(raw) },
        };
        self.position = if has_value {
            Position::OnValue
        } else {
            Position::Exhausted
        };
        Ok(has_value)
    }

    /// The value the cursor is on
    ///
    /// # Errors
    ///
    /// [`Error::NotPositioned`] before the first [`Self::move_next`], after the values are
    /// exhausted, and after [`Self::next_many`]. [`Error::Released`] after [`Self::release`].
    pub fn current(&self) -> Result<C::Value, Error> {
        let raw = self.raw()?;
        match self.position {
            Position::OnValue => Ok(unsafe { C::value(raw) }),
            Position::Pending | Position::Exhausted => Err(Error::NotPositioned),
        }
    }

    /// Cursors are forward-only: always fails with [`Error::NotSupported`]
    pub fn reset(&mut self) -> Result<(), Error> {
        Err(Error::NotSupported("resetting a forward iterator"))
    }

    /// Read up to `dst.len()` values not yet yielded, returning how many were read
    ///
    /// Afterwards the cursor sits between values, so [`Self::current`] fails until the next
    /// [`Self::move_next`].
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap, ReadBitmap, WriteBitmap};
    ///
    /// let mut bitmap = Bitmap::from_range(0..100).unwrap();
    /// bitmap.add(222);
    /// bitmap.add(555);
    ///
    /// let mut buf = [0; 100];
    /// let mut iter = bitmap.iter().unwrap();
    /// assert_eq!(iter.next_many(&mut buf).unwrap(), 100);
    /// assert!(buf.iter().copied().eq(0..100));
    /// // Calls to next_many() can be interleaved with calls to next()
    /// assert_eq!(iter.next(), Some(222));
    /// assert_eq!(iter.next_many(&mut buf).unwrap(), 1);
    /// assert_eq!(buf[0], 555);
    ///
    /// assert_eq!(iter.next(), None);
    /// assert_eq!(iter.next_many(&mut buf).unwrap(), 0);
    /// ```
    pub fn next_many(&mut self, dst: &mut [C::Value]) -> Result<usize, Error> {
        let raw = self.raw()?;
        match self.position {
            Position::Exhausted => return Ok(0),
            Position::OnValue => {
                if !unsafe { C::advance(raw) } {
                    self.position = Position::Exhausted;
                    return Ok(0);
                }
            }
            Position::Pending => {}
        }
        let read = unsafe { C::read(raw, dst) };
        self.position = if unsafe { C::has_value(raw) } {
            Position::Pending
        } else {
            Position::Exhausted
        };
        Ok(read)
    }

    /// Free the native cursor now. Releasing twice is a no-op.
    pub fn release(&mut self) {
        if self.handle.take().is_some() {
            tracing::trace!("released iterator");
        }
    }

    pub fn is_released(&self) -> bool {
        self.handle.is_none()
    }

    /// An independent cursor at the same position
    pub fn try_clone(&self) -> Result<Self, Error> {
        let raw = self.raw()?;
        let copy = unsafe { Handle::from_raw(C::copy(raw))? };
        Ok(Self {
            handle: Some(copy),
            position: self.position,
            _bitmap: PhantomData,
        })
    }
}

impl<C: CursorProtocol> Iterator for ForwardIterator<'_, C> {
    type Item = C::Value;

    fn next(&mut self) -> Option<Self::Item> {
        match self.move_next() {
            Ok(true) => self.current().ok(),
            Ok(false) | Err(_) => None,
        }
    }
}

impl<C: CursorProtocol> FusedIterator for ForwardIterator<'_, C> {}

impl<C: CursorProtocol> fmt::Debug for ForwardIterator<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardIterator")
            .field("handle", &self.handle)
            .field("position", &self.position)
            .finish()
    }
}
