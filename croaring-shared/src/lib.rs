//! Ownership-checked wrappers for `CRoaring` (<https://github.com/RoaringBitmap/CRoaring>)
//!
//! Every bitmap, cursor and scratch structure allocated by CRoaring is owned by exactly one
//! Rust value and freed exactly once. On top of that, this crate lets several immutable
//! [`FrozenBitmap`]s alias one [`SharedMemoryBlock`] without copying: the block keeps its
//! buffer alive until it has been released by its owner *and* every view mapped over it has
//! been dropped.
//!
//! # Example
//!
//! ```rust
//! use croaring_shared::{Bitmap, Frozen, ReadBitmap, SharedMemoryBlock, WriteBitmap};
//!
//! let mut bitmap = Bitmap::of(&[1, 2, 3, 100, 1000]).unwrap();
//! bitmap.run_optimize();
//!
//! let mut block = SharedMemoryBlock::from_bitmap::<Frozen, _>(&bitmap).unwrap();
//! let first = block.freeze::<Frozen>().unwrap();
//! let second = block.freeze::<Frozen>().unwrap();
//!
//! // The buffer outlives the owner's release while views still read from it
//! block.release();
//! assert_eq!(first.cardinality(), 5);
//! assert!(second.contains(1000));
//! assert_eq!(first, bitmap);
//! ```

pub mod bitmap;
pub mod bitmap64;
mod bulk;
mod error;
mod frozen;
mod handle;
mod iter;
pub mod memory;
mod range;
mod serialization;

pub use bitmap::{Bitmap, LazyBitmap, ReadBitmap, Statistics, UnrepairedBitmap, WriteBitmap};
pub use bitmap64::{Bitmap64, ReadBitmap64, WriteBitmap64};
pub use bulk::{BulkContext, BulkContext64};
pub use error::{Error, ErrorKind};
pub use frozen::{FrozenBitmap, FrozenBitmap64};
pub use handle::InstanceId;
pub use iter::{Bitmap64Cursor, BitmapCursor, CursorProtocol, ForwardIterator, Values32, Values64};
pub use memory::{BlockState, CancellationSignal, MemorySnapshot, SharedMemoryBlock};
pub use serialization::{Format, Frozen, Native, Portable};

mod sealed {
    pub trait Sealed {}
}
