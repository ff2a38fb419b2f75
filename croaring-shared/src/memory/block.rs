use super::{pressure, CancellationSignal};
use crate::bitmap::{Serializer, ViewFormat};
use crate::bitmap64::Serializer as Serializer64;
use crate::handle::InstanceId;
use crate::serialization::{Format, Frozen, Portable};
use crate::{Error, FrozenBitmap, FrozenBitmap64, ReadBitmap, ReadBitmap64};
use std::alloc::{self, Layout};
use std::collections::HashSet;
use std::fmt;
use std::io::{self, Read};
use std::ptr::NonNull;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Observable lifecycle of a [`SharedMemoryBlock`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlockState {
    /// Writable if no view depends on it, and able to produce views
    Active,
    /// Released by its owner, waiting for `dependents` views to be dropped
    PendingRelease { dependents: usize },
    /// The buffer has been freed
    Released,
}

/// One zeroed allocation at [`SharedMemoryBlock::ALIGNMENT`], counted in [`pressure`]
struct AlignedBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

unsafe impl Send for AlignedBuffer {}
unsafe impl Sync for AlignedBuffer {}

impl AlignedBuffer {
    fn allocate(size: usize) -> Result<Self, Error> {
        let layout = Layout::from_size_align(size, SharedMemoryBlock::ALIGNMENT)
            .map_err(|_| Error::AllocationFailed {
                what: "memory block",
            })?;
        // Zeroed so a view over a partially written block never reads uninitialized bytes
        let ptr = NonNull::new(unsafe { alloc::alloc_zeroed(layout) }).ok_or(
            Error::AllocationFailed {
                what: "memory block",
            },
        )?;
        pressure::record_alloc(size);
        Ok(Self { ptr, layout })
    }

    fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    fn len(&self) -> usize {
        self.layout.size()
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
        pressure::record_free(self.layout.size());
    }
}

struct State {
    /// `None` once freed
    buffer: Option<AlignedBuffer>,
    dependents: HashSet<u64>,
    next_dependent: u64,
    release_requested: bool,
}

impl State {
    fn lifecycle(&self) -> BlockState {
        match (&self.buffer, self.release_requested) {
            (None, _) => BlockState::Released,
            (Some(_), true) => BlockState::PendingRelease {
                dependents: self.dependents.len(),
            },
            (Some(_), false) => BlockState::Active,
        }
    }
}

struct BlockShared {
    id: InstanceId,
    size: usize,
    state: Mutex<State>,
}

impl BlockShared {
    fn lock(&self) -> MutexGuard<'_, State> {
        // State is never left half-updated, so a poisoned lock is still consistent
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn unregister(&self, dependent: u64) {
        let freed = {
            let mut state = self.lock();
            state.dependents.remove(&dependent);
            tracing::trace!(
                block = %self.id,
                dependent,
                remaining = state.dependents.len(),
                "unregistered frozen view"
            );
            if state.release_requested && state.dependents.is_empty() {
                state.buffer.take()
            } else {
                None
            }
        };
        if let Some(buffer) = freed {
            drop(buffer);
            tracing::debug!(
                block = %self.id,
                size = self.size,
                "freed memory block after last view"
            );
        }
    }
}

/// A view's registration in the block it was mapped over
///
/// While a registration exists the block's buffer is neither freed nor written to.
/// Dropping the registration unregisters the view, which may free a released block.
pub(crate) struct Dependent {
    shared: Arc<BlockShared>,
    id: u64,
    data: NonNull<u8>,
}

unsafe impl Send for Dependent {}
unsafe impl Sync for Dependent {}

impl Dependent {
    /// The whole block's contents
    pub(crate) fn bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.data.as_ptr(), self.shared.size) }
    }

    pub(crate) fn block_id(&self) -> InstanceId {
        self.shared.id
    }
}

impl Drop for Dependent {
    fn drop(&mut self) {
        self.shared.unregister(self.id);
    }
}

impl fmt::Debug for Dependent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependent")
            .field("block", &self.shared.id)
            .field("id", &self.id)
            .finish()
    }
}

/// A fixed-size buffer, aligned for every frozen format, which frozen views map without
/// copying
///
/// The block is written first, through [`write`](Self::write), [`std::io::Write`] or one of
/// the `from_*` constructors, then frozen into any number of views. Writing is rejected
/// while a view exists. The buffer stays alive until the block has been released *and* every
/// view over it has been dropped.
///
/// # Examples
///
/// ```
/// use croaring_shared::{Bitmap, BlockState, Frozen, ReadBitmap, SharedMemoryBlock};
///
/// let bitmap = Bitmap::of(&[1, 2, 3]).unwrap();
/// let mut block = SharedMemoryBlock::from_bitmap::<Frozen, _>(&bitmap).unwrap();
///
/// let view = block.freeze::<Frozen>().unwrap();
/// block.release();
/// assert_eq!(block.state(), BlockState::PendingRelease { dependents: 1 });
/// assert_eq!(view.to_vec(), [1, 2, 3]);
///
/// drop(view);
/// assert_eq!(block.state(), BlockState::Released);
/// ```
pub struct SharedMemoryBlock {
    shared: Arc<BlockShared>,
    cursor: usize,
}

impl SharedMemoryBlock {
    /// Alignment of every block buffer, enough for 32-bit and 64-bit frozen data
    pub const ALIGNMENT: usize = 64;

    /// Allocate a zeroed block of `size` bytes
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Error, SharedMemoryBlock};
    ///
    /// let block = SharedMemoryBlock::allocate(128).unwrap();
    /// assert_eq!(block.size(), 128);
    /// assert!(matches!(SharedMemoryBlock::allocate(0), Err(Error::ZeroSizedBlock)));
    /// ```
    pub fn allocate(size: usize) -> Result<Self, Error> {
        if size == 0 {
            return Err(Error::ZeroSizedBlock);
        }
        let buffer = AlignedBuffer::allocate(size)?;
        let id = InstanceId::next();
        tracing::debug!(block = %id, size, "allocated memory block");
        Ok(Self {
            shared: Arc::new(BlockShared {
                id,
                size,
                state: Mutex::new(State {
                    buffer: Some(buffer),
                    dependents: HashSet::new(),
                    next_dependent: 0,
                    release_requested: false,
                }),
            }),
            cursor: 0,
        })
    }

    /// Allocate a block of exactly the serialized size of `bitmap` in format `S` and
    /// serialize into it
    pub fn from_bitmap<S: Serializer, B: ReadBitmap + ?Sized>(bitmap: &B) -> Result<Self, Error> {
        let size = bitmap.get_serialized_size_in_bytes::<S>();
        let mut block = Self::allocate(size)?;
        debug_assert!(S::REQUIRED_ALIGNMENT <= Self::ALIGNMENT);
        block.fill(|dst| unsafe { S::serialize_raw(bitmap.raw(), dst.cast()) })?;
        Ok(block)
    }

    /// [`from_bitmap`](Self::from_bitmap) for 64-bit bitmaps
    ///
    /// The frozen format needs a bitmap which was shrunk with
    /// [`WriteBitmap64::shrink_to_fit`](crate::WriteBitmap64::shrink_to_fit) since its last
    /// mutation, otherwise this fails with [`Error::SerializationFailed`].
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap64, Frozen, ReadBitmap64, SharedMemoryBlock, WriteBitmap64};
    ///
    /// let mut bitmap = Bitmap64::of(&[1, 1 << 40]).unwrap();
    /// bitmap.shrink_to_fit();
    /// let block = SharedMemoryBlock::from_bitmap64::<Frozen, _>(&bitmap).unwrap();
    /// assert_eq!(block.freeze64().unwrap().to_vec(), [1, 1 << 40]);
    /// ```
    pub fn from_bitmap64<S: Serializer64, B: ReadBitmap64 + ?Sized>(
        bitmap: &B,
    ) -> Result<Self, Error> {
        let size = bitmap.get_serialized_size_in_bytes::<S>();
        if size == 0 {
            return Err(Error::SerializationFailed { format: S::FORMAT });
        }
        let mut block = Self::allocate(size)?;
        debug_assert!(S::REQUIRED_ALIGNMENT <= Self::ALIGNMENT);
        block.fill(|dst| unsafe { S::serialize_raw(bitmap.raw(), dst.cast()) })?;
        Ok(block)
    }

    /// Allocate `len` bytes and fill them from `reader`
    ///
    /// Input shorter than `len` is an [`io::ErrorKind::UnexpectedEof`] error.
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Bitmap, Portable, ReadBitmap, SharedMemoryBlock};
    ///
    /// let data = Bitmap::of(&[10, 20]).unwrap().serialize::<Portable>();
    /// let block = SharedMemoryBlock::from_reader(&data[..], data.len()).unwrap();
    /// assert_eq!(block.freeze::<Portable>().unwrap().to_vec(), [10, 20]);
    /// ```
    pub fn from_reader<R: Read>(reader: R, len: usize) -> Result<Self, Error> {
        let mut block = Self::allocate(len)?;
        let limit = u64::try_from(len).unwrap_or(u64::MAX);
        let copied = io::copy(&mut reader.take(limit), &mut block)?;
        if block.cursor != len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {len} bytes, read {copied}"),
            )
            .into());
        }
        Ok(block)
    }

    pub fn id(&self) -> InstanceId {
        self.shared.id
    }

    /// Size of the buffer in bytes, fixed at allocation
    pub fn size(&self) -> usize {
        self.shared.size
    }

    /// Offset the next write starts at
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.shared.size - self.cursor
    }

    /// Move the write cursor back to the start of the block
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    pub fn state(&self) -> BlockState {
        self.shared.lock().lifecycle()
    }

    /// Copy `data` at the write cursor, returning how many bytes fit
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::SharedMemoryBlock;
    ///
    /// let mut block = SharedMemoryBlock::allocate(4).unwrap();
    /// assert_eq!(block.write(&[1, 2, 3]).unwrap(), 3);
    /// assert_eq!(block.write(&[4, 5, 6]).unwrap(), 1);
    /// assert_eq!(block.write(&[7]).unwrap(), 0);
    /// ```
    pub fn write(&mut self, data: &[u8]) -> Result<usize, Error> {
        self.write_from(data, 0, data.len())
    }

    /// Copy `data[offset..offset + count]` at the write cursor, returning how many bytes fit
    pub fn write_from(&mut self, data: &[u8], offset: usize, count: usize) -> Result<usize, Error> {
        let src = offset
            .checked_add(count)
            .and_then(|end| data.get(offset..end))
            .ok_or(Error::OutOfBounds {
                offset,
                count,
                len: data.len(),
            })?;
        let n = src.len().min(self.remaining());
        let cursor = self.cursor;
        self.fill(|dst| unsafe {
            std::ptr::copy_nonoverlapping(src.as_ptr(), dst.add(cursor), n);
        })?;
        self.cursor += n;
        Ok(n)
    }

    /// [`write`](Self::write) for asynchronous callers
    ///
    /// `cancel` is checked once, before copying. The copy itself runs to completion.
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Error, SharedMemoryBlock};
    /// use std::sync::atomic::AtomicBool;
    ///
    /// let mut block = SharedMemoryBlock::allocate(8).unwrap();
    /// let cancel = AtomicBool::new(true);
    /// let result = futures::executor::block_on(block.write_async(&[1, 2], &cancel));
    /// assert!(matches!(result, Err(Error::Cancelled)));
    /// assert_eq!(block.position(), 0);
    /// ```
    pub async fn write_async<C: CancellationSignal + ?Sized>(
        &mut self,
        data: &[u8],
        cancel: &C,
    ) -> Result<usize, Error> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.write(data)
    }

    /// Run `f` over the start of the buffer while nothing else can observe it
    fn fill<F: FnOnce(*mut u8)>(&mut self, f: F) -> Result<(), Error> {
        let state = self.shared.lock();
        let buffer = match &state.buffer {
            Some(buffer) if !state.release_requested => buffer,
            _ => {
                return Err(Error::Released {
                    resource: "memory block",
                })
            }
        };
        if !state.dependents.is_empty() {
            return Err(Error::BlockInUse {
                dependents: state.dependents.len(),
            });
        }
        f(buffer.as_ptr());
        Ok(())
    }

    /// Record a new view over the block
    fn register(&self) -> Result<Dependent, Error> {
        let mut state = self.shared.lock();
        let data = match &state.buffer {
            Some(buffer) if !state.release_requested => {
                debug_assert_eq!(buffer.len(), self.shared.size);
                buffer.ptr
            }
            _ => {
                return Err(Error::Released {
                    resource: "memory block",
                })
            }
        };
        let id = state.next_dependent;
        state.next_dependent += 1;
        state.dependents.insert(id);
        tracing::trace!(
            block = %self.shared.id,
            dependent = id,
            dependents = state.dependents.len(),
            "registered frozen view"
        );
        Ok(Dependent {
            shared: Arc::clone(&self.shared),
            id,
            data,
        })
    }

    /// Map a 32-bit view over the block's bytes in format `V`
    ///
    /// The view is checked with CRoaring's internal validator before it is returned.
    pub fn freeze<V: ViewFormat>(&self) -> Result<FrozenBitmap, Error> {
        debug_assert!(V::REQUIRED_ALIGNMENT <= Self::ALIGNMENT);
        FrozenBitmap::map::<V>(self.register()?)
    }

    /// [`freeze`](Self::freeze) with the format chosen at runtime
    ///
    /// # Examples
    ///
    /// ```
    /// use croaring_shared::{Error, Format, SharedMemoryBlock};
    ///
    /// let block = SharedMemoryBlock::allocate(64).unwrap();
    /// let err = block.freeze_as(Format::Native).unwrap_err();
    /// assert!(matches!(err, Error::UnsupportedFormat { format: Format::Native, .. }));
    /// ```
    pub fn freeze_as(&self, format: Format) -> Result<FrozenBitmap, Error> {
        match format {
            Format::Frozen => self.freeze::<Frozen>(),
            Format::Portable => self.freeze::<Portable>(),
            Format::Native => Err(Error::UnsupportedFormat {
                format,
                operation: "freeze",
            }),
        }
    }

    /// Map a 64-bit view over the block's bytes in the frozen format
    pub fn freeze64(&self) -> Result<FrozenBitmap64, Error> {
        FrozenBitmap64::map(self.register()?)
    }

    /// Give up the owner's claim on the buffer
    ///
    /// The buffer is freed now if no view depends on the block, otherwise when the last view
    /// is dropped. Every later operation on the block fails with [`Error::Released`]. Calling
    /// this again has no effect.
    pub fn release(&mut self) {
        let freed = {
            let mut state = self.shared.lock();
            if state.release_requested || state.buffer.is_none() {
                return;
            }
            state.release_requested = true;
            if state.dependents.is_empty() {
                state.buffer.take()
            } else {
                tracing::debug!(
                    block = %self.shared.id,
                    dependents = state.dependents.len(),
                    "memory block release pending on frozen views"
                );
                None
            }
        };
        if let Some(buffer) = freed {
            drop(buffer);
            tracing::debug!(block = %self.shared.id, size = self.shared.size, "freed memory block");
        }
    }
}

impl Drop for SharedMemoryBlock {
    fn drop(&mut self) {
        self.release();
    }
}

impl io::Write for SharedMemoryBlock {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        SharedMemoryBlock::write(self, buf).map_err(|e| match e {
            Error::Io(e) => e,
            other => io::Error::new(io::ErrorKind::Other, other),
        })
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Debug for SharedMemoryBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedMemoryBlock")
            .field("id", &self.shared.id)
            .field("size", &self.shared.size)
            .field("position", &self.cursor)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Bitmap, WriteBitmap};
    use std::io::Write;

    fn frozen_block() -> (Bitmap, SharedMemoryBlock) {
        let mut bitmap = Bitmap::of(&[0, 1, 2, 3, 4, u32::MAX]).unwrap();
        bitmap.add_range(1000..5000).unwrap();
        let block = SharedMemoryBlock::from_bitmap::<Frozen, _>(&bitmap).unwrap();
        (bitmap, block)
    }

    #[test]
    fn test_buffer_is_aligned() {
        for size in [1, 7, 64, 1000] {
            let block = SharedMemoryBlock::allocate(size).unwrap();
            let state = block.shared.lock();
            let ptr = state.buffer.as_ref().unwrap().as_ptr();
            assert_eq!(ptr.align_offset(SharedMemoryBlock::ALIGNMENT), 0);
        }
    }

    #[test]
    fn test_release_without_dependents_frees() {
        let mut block = SharedMemoryBlock::allocate(32).unwrap();
        block.release();
        assert_eq!(block.state(), BlockState::Released);
        assert!(block.shared.lock().buffer.is_none());
        block.release();
        assert_eq!(block.state(), BlockState::Released);
    }

    #[test]
    fn test_two_views_defer_free() {
        let (bitmap, mut block) = frozen_block();
        let a = block.freeze::<Frozen>().unwrap();
        let b = block.freeze::<Frozen>().unwrap();

        block.release();
        assert_eq!(block.state(), BlockState::PendingRelease { dependents: 2 });
        assert_eq!(a, bitmap);
        assert_eq!(b, bitmap);

        drop(a);
        assert_eq!(block.state(), BlockState::PendingRelease { dependents: 1 });
        assert!(b.contains(u32::MAX));

        drop(b);
        assert_eq!(block.state(), BlockState::Released);
    }

    #[test]
    fn test_views_outlive_dropped_block() {
        let (bitmap, block) = frozen_block();
        let view = block.freeze::<Frozen>().unwrap();
        let shared = Arc::clone(&block.shared);
        drop(block);
        assert!(shared.lock().buffer.is_some());
        assert_eq!(view, bitmap);
        drop(view);
        assert!(shared.lock().buffer.is_none());
    }

    #[test]
    fn test_write_rejected_while_viewed() {
        let (_bitmap, mut block) = frozen_block();
        let view = block.freeze::<Frozen>().unwrap();
        block.rewind();
        assert!(matches!(
            block.write(&[0xff]),
            Err(Error::BlockInUse { dependents: 1 })
        ));
        drop(view);
        assert_eq!(block.write(&[0xff]).unwrap(), 1);
    }

    #[test]
    fn test_operations_after_release() {
        let (_bitmap, mut block) = frozen_block();
        let view = block.freeze::<Frozen>().unwrap();
        block.release();
        assert!(matches!(block.freeze::<Frozen>(), Err(Error::Released { .. })));
        assert!(matches!(block.write(&[1]), Err(Error::Released { .. })));
        drop(view);
        assert!(matches!(block.freeze_as(Format::Frozen), Err(Error::Released { .. })));
    }

    #[test]
    fn test_write_from_bounds() {
        let mut block = SharedMemoryBlock::allocate(8).unwrap();
        assert!(matches!(
            block.write_from(&[1, 2, 3], 2, 2),
            Err(Error::OutOfBounds {
                offset: 2,
                count: 2,
                len: 3
            })
        ));
        assert!(matches!(
            block.write_from(&[1, 2, 3], usize::MAX, 2),
            Err(Error::OutOfBounds { .. })
        ));
        assert_eq!(block.write_from(&[1, 2, 3], 1, 2).unwrap(), 2);
        assert_eq!(block.position(), 2);
    }

    #[test]
    fn test_io_write_fills_block() {
        let mut block = SharedMemoryBlock::allocate(4).unwrap();
        block.write_all(&[1, 2, 3, 4]).unwrap();
        let err = block.write_all(&[5]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
    }

    #[test]
    fn test_short_reader_is_io_error() {
        let err = SharedMemoryBlock::from_reader(&[1u8, 2, 3][..], 8).unwrap_err();
        match err {
            Error::Io(e) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_garbage_does_not_freeze() {
        let mut block = SharedMemoryBlock::allocate(64).unwrap();
        block.write(&[0xAB; 64]).unwrap();
        assert!(block.freeze::<Portable>().is_err());
        assert!(block.freeze::<Frozen>().is_err());
        assert_eq!(block.state(), BlockState::Active);
        assert!(block.shared.lock().dependents.is_empty());
    }
}
