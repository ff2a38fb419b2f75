//! Aligned buffers shared by frozen views.
//!
//! A [`SharedMemoryBlock`] is filled once, then mapped by any number of
//! [`FrozenBitmap`](crate::FrozenBitmap)s. Its buffer is freed when the owner has called
//! [`SharedMemoryBlock::release`] (or dropped the block) and the last view over it is gone,
//! whichever comes last.

mod block;
pub mod pressure;

pub use self::block::{BlockState, SharedMemoryBlock};
pub(crate) use self::block::Dependent;
pub use self::pressure::MemorySnapshot;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A flag checked once before an asynchronous write starts copying
pub trait CancellationSignal {
    fn is_cancelled(&self) -> bool;
}

impl CancellationSignal for AtomicBool {
    #[inline]
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Acquire)
    }
}

impl CancellationSignal for bool {
    #[inline]
    fn is_cancelled(&self) -> bool {
        *self
    }
}

impl<T: CancellationSignal + ?Sized> CancellationSignal for &T {
    #[inline]
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

impl<T: CancellationSignal + ?Sized> CancellationSignal for Arc<T> {
    #[inline]
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}
