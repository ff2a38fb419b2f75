use croaring_shared::{
    Bitmap64, Error, Frozen, FrozenBitmap64, Portable, ReadBitmap64, SharedMemoryBlock,
    WriteBitmap64,
};
use proptest::prelude::*;

fn expected_serialized_bitmap() -> Bitmap64 {
    let mut bitmap = Bitmap64::new().unwrap();

    for i in 0..2u64 {
        let base = i << 32;
        // Range container
        bitmap.add_range(base | 0x0_0000..=base | 0x0_9000).unwrap();
        bitmap.add_range(base | 0x0_A000..=base | 0x1_0000).unwrap();
        // Array container
        bitmap.add(base | 0x2_0000);
        bitmap.add(base | 0x2_0005);
        // Bitmap container
        for j in (0..0x1_0000).step_by(2) {
            bitmap.add(base | (0x80000 + j));
        }
    }
    bitmap
}

#[test]
fn portable_roundtrip() {
    let bitmap = expected_serialized_bitmap();
    let mut buffer = Vec::new();
    let data = bitmap.serialize_into_vec::<Portable>(&mut buffer).unwrap();
    assert_eq!(data.len(), bitmap.get_serialized_size_in_bytes::<Portable>());
    let deserialized = Bitmap64::try_deserialize::<Portable>(data).unwrap();
    assert_eq!(deserialized, bitmap);
    assert!(deserialized.iter().unwrap().eq(bitmap.iter().unwrap()));
}

#[test]
fn frozen_requires_shrink() {
    let mut bitmap = expected_serialized_bitmap();
    bitmap.add(1 << 60);
    let unshrunk = SharedMemoryBlock::from_bitmap64::<Frozen, _>(&bitmap);
    if bitmap.get_serialized_size_in_bytes::<Frozen>() == 0 {
        assert!(matches!(unshrunk, Err(Error::SerializationFailed { .. })));
    }

    bitmap.shrink_to_fit();
    let block = SharedMemoryBlock::from_bitmap64::<Frozen, _>(&bitmap).unwrap();
    let view = block.freeze64().unwrap();
    assert_eq!(view, bitmap);
}

#[test]
fn frozen_view_queries() {
    let mut bitmap = expected_serialized_bitmap();
    let view = FrozenBitmap64::freeze(&mut bitmap).unwrap();
    assert_eq!(view.cardinality(), bitmap.cardinality());
    assert_eq!(view.minimum(), Some(0));
    assert_eq!(view.maximum(), Some((1 << 32) | 0x8FFFE));
    assert!(view.contains_range(0..=0x9000).unwrap());
    assert_eq!(view.rank(0x9000), 0x9001);
    assert!(view.is_subset(&bitmap));
    assert_eq!(view.and_cardinality(&bitmap), bitmap.cardinality());
}

#[test]
fn ranges_reaching_max() {
    let mut bitmap = Bitmap64::new().unwrap();
    bitmap.add_range(u64::MAX - 2..=u64::MAX).unwrap();
    assert_eq!(bitmap.to_vec(), [u64::MAX - 2, u64::MAX - 1, u64::MAX]);
    bitmap.remove_range(u64::MAX..).unwrap();
    assert_eq!(bitmap.maximum(), Some(u64::MAX - 1));
    bitmap.flip_inplace(u64::MAX - 3..=u64::MAX).unwrap();
    assert_eq!(bitmap.to_vec(), [u64::MAX - 3, u64::MAX]);
    bitmap.clear();
    assert!(bitmap.is_empty());
}

proptest! {
    #[test]
    fn portable_serialization_roundtrip(
        indices in prop::collection::vec(proptest::num::u64::ANY, 1..3000)
    ) {
        let original = Bitmap64::of(&indices).unwrap();
        let mut buffer = Vec::new();
        let data = original.serialize_into_vec::<Portable>(&mut buffer).unwrap();
        let deserialized = Bitmap64::try_deserialize::<Portable>(data).unwrap();
        prop_assert_eq!(original, deserialized);
    }

    #[test]
    fn frozen_view_roundtrip(
        indices in prop::collection::vec(proptest::num::u64::ANY, 1..3000)
    ) {
        let mut original = Bitmap64::of(&indices).unwrap();
        let view = FrozenBitmap64::freeze(&mut original).unwrap();
        prop_assert_eq!(view.to_vec(), original.to_vec());
    }
}
