#![no_main]

use croaring_shared::{BlockState, Frozen, Portable, ReadBitmap, SharedMemoryBlock};
use libfuzzer_sys::fuzz_target;

// Untrusted bytes mapped as views: either rejected, or a view which passes validation
fuzz_target!(|input: &[u8]| {
    let Ok(mut block) = SharedMemoryBlock::from_reader(input, input.len()) else {
        return;
    };
    if let Ok(view) = block.freeze::<Portable>() {
        let owned = view.to_bitmap().unwrap();
        assert_eq!(owned, view);
    }
    if let Ok(view) = block.freeze::<Frozen>() {
        assert_eq!(view.to_vec().len() as u64, view.cardinality());
    }
    let _ = block.freeze64();
    block.release();
    assert_eq!(block.state(), BlockState::Released);
});
