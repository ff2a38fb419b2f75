//! Process-wide accounting of memory held by shared blocks.
//!
//! Every byte allocated for a [`SharedMemoryBlock`](super::SharedMemoryBlock) is counted
//! here until the block's buffer is actually freed, including the time a released block
//! spends waiting for its last view.

use std::sync::atomic::{AtomicUsize, Ordering};

static TRACKED_BYTES: AtomicUsize = AtomicUsize::new(0);
static PEAK_BYTES: AtomicUsize = AtomicUsize::new(0);
static LIVE_BLOCKS: AtomicUsize = AtomicUsize::new(0);

/// Point-in-time copy of the block accounting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemorySnapshot {
    /// Bytes held by block buffers which have not been freed yet
    pub tracked_bytes: usize,
    /// Highest `tracked_bytes` seen since the process started
    pub peak_bytes: usize,
    /// Number of block buffers which have not been freed yet
    pub live_blocks: usize,
}

/// Read the current accounting
///
/// # Examples
///
/// ```
/// use croaring_shared::memory::pressure;
/// use croaring_shared::SharedMemoryBlock;
///
/// let block = SharedMemoryBlock::allocate(4096).unwrap();
/// let snapshot = pressure::snapshot();
/// assert!(snapshot.tracked_bytes >= 4096);
/// assert!(snapshot.peak_bytes >= snapshot.tracked_bytes);
/// drop(block);
/// ```
pub fn snapshot() -> MemorySnapshot {
    MemorySnapshot {
        tracked_bytes: TRACKED_BYTES.load(Ordering::Acquire),
        peak_bytes: PEAK_BYTES.load(Ordering::Acquire),
        live_blocks: LIVE_BLOCKS.load(Ordering::Acquire),
    }
}

pub(crate) fn record_alloc(bytes: usize) {
    let now = TRACKED_BYTES.fetch_add(bytes, Ordering::AcqRel) + bytes;
    PEAK_BYTES.fetch_max(now, Ordering::AcqRel);
    LIVE_BLOCKS.fetch_add(1, Ordering::AcqRel);
}

pub(crate) fn record_free(bytes: usize) {
    TRACKED_BYTES.fetch_sub(bytes, Ordering::AcqRel);
    LIVE_BLOCKS.fetch_sub(1, Ordering::AcqRel);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_covers_tracked() {
        record_alloc(100);
        let during = snapshot();
        assert!(during.tracked_bytes >= 100);
        assert!(during.live_blocks >= 1);
        assert!(during.peak_bytes >= during.tracked_bytes);
        record_free(100);
        assert!(snapshot().peak_bytes >= 100);
    }
}
