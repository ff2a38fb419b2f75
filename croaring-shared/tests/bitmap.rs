use croaring_shared::{
    Bitmap, Error, ErrorKind, Format, Frozen, Native, Portable, ReadBitmap, SharedMemoryBlock,
    WriteBitmap,
};
use proptest::prelude::*;
use std::ops::Bound::{self, Excluded, Included, Unbounded};
use std::ops::RangeInclusive;
use test_case::test_case;

// borrowed and adapted from https://github.com/Nemo157/roaring-rs/blob/5089f180ca7e17db25f5c58023f4460d973e747f/tests/lib.rs#L7-L37
#[test]
fn smoke1() {
    let mut bitmap = Bitmap::new().unwrap();
    assert_eq!(bitmap.cardinality(), 0);
    assert!(bitmap.is_empty());
    bitmap.remove(0);
    assert_eq!(bitmap.cardinality(), 0);
    assert!(bitmap.is_empty());
    bitmap.add(1);
    assert!(bitmap.contains(1));
    assert_eq!(bitmap.cardinality(), 1);
    assert!(!bitmap.is_empty());
    bitmap.add(u32::MAX - 2);
    assert!(bitmap.contains(u32::MAX - 2));
    assert_eq!(bitmap.cardinality(), 2);
    bitmap.add(u32::MAX);
    assert!(bitmap.contains(u32::MAX));
    assert_eq!(bitmap.cardinality(), 3);
    bitmap.add(2);
    assert!(bitmap.contains(2));
    assert_eq!(bitmap.cardinality(), 4);
    bitmap.remove(2);
    assert!(!bitmap.contains(2));
    assert_eq!(bitmap.cardinality(), 3);
    assert!(!bitmap.contains(0));
    assert!(bitmap.contains(1));
    assert!(!bitmap.contains(100));
    assert!(bitmap.contains(u32::MAX - 2));
    assert!(!bitmap.contains(u32::MAX - 1));
    assert!(bitmap.contains(u32::MAX));
    bitmap.clear();
    assert_eq!(bitmap.cardinality(), 0);
    assert!(bitmap.is_empty());
}

// borrowed and adapted from https://github.com/Bitmap/gocroaring/blob/4a2fc02f79b1c36b904301e7d052f7f0017b6973/gocroaring_test.go#L24-L64
#[test]
fn smoke2() {
    let mut rb1 = Bitmap::of(&[1, 2, 3, 4, 5, 100, 1000]).unwrap();
    rb1.run_optimize();

    let mut rb2 = Bitmap::of(&[3, 4, 1000]).unwrap();
    rb2.run_optimize();

    let mut rb3 = Bitmap::new().unwrap();

    assert_eq!(rb1.cardinality(), 7);
    assert!(rb1.contains(3));

    rb1.and_inplace(&rb2);
    rb3.add(5);
    rb3.or_inplace(&rb1);

    let rb4 = Bitmap::fast_or(&[&rb1, &rb2, &rb3]).unwrap();
    assert_eq!(rb4.to_vec(), [3, 4, 5, 1000]);
    assert_eq!(Bitmap::fast_or_heap(&[&rb1, &rb2, &rb3]).unwrap(), rb4);
    assert_eq!(
        Bitmap::fast_xor(&[&rb1, &rb2, &rb3]).unwrap().to_vec(),
        [3, 4, 5, 1000]
    );
}

#[test_case(Included(0), Excluded(0), &[] ; "empty exclusive")]
#[test_case(Included(5), Excluded(5), &[] ; "empty in the middle")]
#[test_case(Included(5), Included(5), &[5] ; "single inclusive")]
#[test_case(Excluded(4), Excluded(6), &[5] ; "both excluded")]
#[test_case(Included(u32::MAX), Included(u32::MAX), &[u32::MAX] ; "max value")]
#[test_case(Included(u32::MAX - 2), Unbounded, &[u32::MAX - 2, u32::MAX - 1, u32::MAX] ; "open ended")]
fn range_construction(start: Bound<u32>, end: Bound<u32>, expected: &[u32]) {
    let bitmap = Bitmap::from_range((start, end)).unwrap();
    assert_eq!(bitmap.to_vec(), expected);
}

#[test_case(0..=999_999, 1 << 17, 8 ; "large step inside range")]
#[test_case(u32::MAX - 10..=u32::MAX, 1 << 20, 1 ; "large step near max")]
#[test_case(0..=u32::MAX, 1 << 16, 65_536 ; "whole range at 2^16")]
#[test_case(0..=u32::MAX, u32::MAX, 2 ; "largest step")]
#[test_case(u32::MAX - 200_000..=u32::MAX, 65_535, 4 ; "just below 2^16")]
fn stepped_range_reaches_end(range: RangeInclusive<u32>, step: u32, expected: u64) {
    let first = *range.start();
    let bitmap = Bitmap::from_range_with_step(range, step).unwrap();
    assert_eq!(bitmap.cardinality(), expected);
    assert_eq!(bitmap.minimum(), Some(first));
    let last = u64::from(first) + u64::from(step) * (expected - 1);
    assert_eq!(bitmap.maximum().map(u64::from), Some(last));
}

#[test]
fn inverted_range_is_rejected() {
    let range = (Bound::Excluded(10), Bound::Excluded(5));
    let err = Bitmap::from_range(range).unwrap_err();
    assert!(matches!(err, Error::InvalidRange { .. }));
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let mut bitmap = Bitmap::of(&[7]).unwrap();
    assert!(bitmap.add_range(range).is_err());
    assert_eq!(bitmap.to_vec(), [7]);
}

#[test]
fn empty_range_queries() {
    let bitmap = Bitmap::of(&[1, 2, 3]).unwrap();
    assert!(bitmap.contains_range(2..2).unwrap());
    assert_eq!(bitmap.range_cardinality(2..2).unwrap(), 0);
    assert!(!bitmap.intersect_with_range(2..2).unwrap());
}

#[test]
fn add_offset_to_max() {
    let mut bitmap = Bitmap::of(&[0]).unwrap();
    bitmap.add_offset(4_294_967_295).unwrap();
    assert_eq!(bitmap.to_vec(), [4_294_967_295]);

    // Values shifted out of range are dropped
    bitmap.add_offset(1).unwrap();
    assert!(bitmap.is_empty());
}

#[test]
fn offset_leaves_source_alone() {
    let bitmap = Bitmap::of(&[10, 20]).unwrap();
    let shifted = bitmap.offset(-10).unwrap();
    assert_eq!(shifted.to_vec(), [0, 10]);
    assert_eq!(bitmap.to_vec(), [10, 20]);
}

#[test]
fn rank_and_select() {
    let bitmap = Bitmap::of(&[2, 4, 8, 16]).unwrap();
    assert_eq!(bitmap.rank(8), 3);
    assert_eq!(bitmap.select(0), Some(2));
    assert_eq!(bitmap.select(4), None);
    assert_eq!(bitmap.position(16), Some(3));
    assert_eq!(bitmap.position(3), None);
    assert_eq!(bitmap.rank_many(&[1, 4, 100]).unwrap(), [0, 2, 4]);
    assert!(matches!(
        bitmap.rank_many(&[100, 1]),
        Err(Error::UnsortedInput)
    ));
}

#[test]
fn lazy_batch_matches_eager() {
    let a = Bitmap::from_range(0..70_000).unwrap();
    let b = Bitmap::of(&[5, 80_000, 100_000]).unwrap();

    let mut lazy = Bitmap::new().unwrap();
    lazy.lazy_batch(|batch| {
        batch.or_inplace(&a, false);
        batch.xor_inplace(&b);
    });

    let mut eager = a.try_clone().unwrap();
    eager ^= &b;
    assert_eq!(lazy, eager);
    lazy.internal_validate().unwrap();

    let repaired = Bitmap::lazy_or(&a, &b, true).unwrap().repair();
    assert_eq!(repaired, a.or(&b).unwrap());
}

#[test]
fn statistics_add_up() {
    let mut bitmap = Bitmap::of(&[1, 2, 3]).unwrap();
    bitmap.add_range(100_000..200_000).unwrap();
    bitmap.run_optimize();
    let stats = bitmap.statistics();
    assert_eq!(stats.cardinality, bitmap.cardinality());
    assert_eq!(
        stats.containers,
        stats.array_containers + stats.run_containers + stats.bitset_containers
    );
    assert_eq!(stats.min_value, 1);
    assert_eq!(stats.max_value, 199_999);
}

#[test]
fn deserialize_as_rejects_garbage() {
    let garbage = [0xFF_u8; 17];
    for format in [Format::Portable, Format::Native] {
        let err = Bitmap::deserialize_as(format, &garbage).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }
    assert_eq!(
        Bitmap::deserialize_as(Format::Frozen, &garbage)
            .unwrap_err()
            .kind(),
        ErrorKind::Unsupported
    );
}

#[test]
fn try_serialize_into_checks_buffer() {
    let bitmap = Bitmap::of(&[1, 2, 3]).unwrap();
    let size = bitmap.get_serialized_size_in_bytes::<Portable>();
    let mut small = vec![0; size - 1];
    assert!(matches!(
        bitmap.try_serialize_into::<Portable>(&mut small),
        Err(Error::BufferTooSmall { .. })
    ));
    let mut exact = vec![0; size];
    assert_eq!(bitmap.try_serialize_into::<Portable>(&mut exact).unwrap(), size);
    assert_eq!(exact, bitmap.serialize::<Portable>());
}

#[test]
fn owned_operators_reuse_left_operand() {
    let evens = Bitmap::from_range_with_step(0..20, 2).unwrap();
    let low = Bitmap::from_range(0..10).unwrap();

    let bitmap = Bitmap::from_range(0..10).unwrap();
    let id = bitmap.instance_id();
    let and = bitmap & &evens;
    assert_eq!(and.instance_id(), id);
    assert_eq!(and.to_vec(), [0, 2, 4, 6, 8]);

    let or = and | &Bitmap::of(&[100]).unwrap();
    assert_eq!(or.to_vec(), [0, 2, 4, 6, 8, 100]);
    let xor = or ^ &low;
    assert_eq!(xor.to_vec(), [1, 3, 5, 7, 9, 100]);
    let sub = xor - &evens;
    assert_eq!(sub.to_vec(), [1, 3, 5, 7, 9, 100]);
    assert_eq!(sub - &low, Bitmap::of(&[100]).unwrap());
}

#[test]
fn serialize_into_vec_appends() {
    let bitmap = Bitmap::of(&[9, 99, 999]).unwrap();
    let mut buffer = vec![1, 2, 3];
    let written = bitmap.serialize_into_vec::<Native>(&mut buffer).to_vec();
    assert_eq!(&buffer[..3], &[1, 2, 3]);
    assert_eq!(Bitmap::try_deserialize::<Native>(&written).unwrap(), bitmap);
}

proptest! {
    #[test]
    fn bitmap_cardinality_roundtrip(
        indices in prop::collection::vec(proptest::num::u32::ANY, 1..3000)
    ) {
        let original = Bitmap::of(&indices).unwrap();
        let mut a = indices;
        a.sort_unstable();
        a.dedup();
        prop_assert_eq!(a.len(), original.cardinality() as usize);
    }

    #[test]
    fn portable_serialization_roundtrip(
        indices in prop::collection::vec(proptest::num::u32::ANY, 1..3000)
    ) {
        let original = Bitmap::of(&indices).unwrap();
        let buffer = original.serialize::<Portable>();
        prop_assert_eq!(buffer.len(), original.get_serialized_size_in_bytes::<Portable>());
        let deserialized = Bitmap::try_deserialize::<Portable>(&buffer).unwrap();
        prop_assert_eq!(original, deserialized);
    }

    #[test]
    fn native_serialization_roundtrip(
        indices in prop::collection::vec(proptest::num::u32::ANY, 1..3000)
    ) {
        let original = Bitmap::of(&indices).unwrap();
        let buffer = original.serialize::<Native>();
        let deserialized = Bitmap::try_deserialize::<Native>(&buffer).unwrap();
        prop_assert_eq!(original, deserialized);
    }

    #[test]
    fn frozen_block_roundtrip(
        indices in prop::collection::vec(proptest::num::u32::ANY, 1..3000)
    ) {
        let original = Bitmap::of(&indices).unwrap();
        let block = SharedMemoryBlock::from_bitmap::<Frozen, _>(&original).unwrap();
        prop_assert_eq!(block.size(), original.get_serialized_size_in_bytes::<Frozen>());
        let view = block.freeze::<Frozen>().unwrap();
        prop_assert_eq!(view.to_vec(), original.to_vec());
    }

    #[test]
    fn combine_cardinalities_match_combines(
        a in prop::collection::vec(0u32..200_000, 0..2000),
        b in prop::collection::vec(0u32..200_000, 0..2000),
    ) {
        let a = Bitmap::of(&a).unwrap();
        let b = Bitmap::of(&b).unwrap();
        prop_assert_eq!(a.and(&b).unwrap().cardinality(), a.and_cardinality(&b));
        prop_assert_eq!(a.or(&b).unwrap().cardinality(), a.or_cardinality(&b));
        prop_assert_eq!(a.xor(&b).unwrap().cardinality(), a.xor_cardinality(&b));
        prop_assert_eq!(a.andnot(&b).unwrap().cardinality(), a.andnot_cardinality(&b));
    }

    #[test]
    fn xor_is_union_without_intersection(
        a in prop::collection::vec(0u32..200_000, 0..2000),
        b in prop::collection::vec(proptest::num::u32::ANY, 0..2000),
    ) {
        let mut a = Bitmap::of(&a).unwrap();
        a.add_many(&b[..b.len() / 2]);
        let b = Bitmap::of(&b).unwrap();
        let intersection = a.and(&b).unwrap();
        let expected = a.or(&b).unwrap().andnot(&intersection).unwrap();
        prop_assert_eq!(a.xor(&b).unwrap(), expected);
    }
}
