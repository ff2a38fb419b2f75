use croaring_shared::{
    Bitmap, Bitmap64, BulkContext, BulkContext64, Error, ErrorKind, FrozenBitmap, ReadBitmap,
    ReadBitmap64, WriteBitmap,
};

#[test]
fn foreign_bitmap_is_never_touched() {
    let mut x = Bitmap::new().unwrap();
    let mut y = Bitmap::of(&[1, 2, 3]).unwrap();
    let mut ctx = BulkContext::new(&x);
    ctx.add(&mut x, 10).unwrap();

    for result in [
        ctx.add(&mut y, 99),
        ctx.remove(&mut y, 1),
        ctx.add_many(&mut y, &[7, 8]),
    ] {
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Misuse);
    }
    assert!(matches!(
        ctx.contains(&y, 1),
        Err(Error::ForeignBulkContext { .. })
    ));
    assert_eq!(y.to_vec(), [1, 2, 3]);
    assert_eq!(x.to_vec(), [10]);
}

#[test_log::test]
fn keeps_working_after_plain_mutation() {
    let mut bitmap = Bitmap::new().unwrap();
    let mut ctx = BulkContext::new(&bitmap);
    for i in 0..100 {
        ctx.add(&mut bitmap, i).unwrap();
    }

    // Turns the array container the context cached into a bitset, then drops it
    bitmap.add_range(0..60_000).unwrap();
    bitmap.remove_range(0..65_536).unwrap();
    bitmap.run_optimize();

    for i in 0..100 {
        ctx.add(&mut bitmap, i).unwrap();
    }
    assert!(ctx.contains(&bitmap, 50).unwrap());
    assert!(!ctx.contains(&bitmap, 500).unwrap());
    assert_eq!(bitmap.cardinality(), 100);
    bitmap.internal_validate().unwrap();
}

#[test]
fn replaced_handle_is_resynced() {
    let mut bitmap = Bitmap::new().unwrap();
    let mut ctx = BulkContext::new(&bitmap);
    ctx.add_many(&mut bitmap, &[1, 2, 3]).unwrap();

    bitmap.add_offset(1 << 20).unwrap();
    ctx.add(&mut bitmap, (1 << 20) + 4).unwrap();
    assert_eq!(
        bitmap.to_vec(),
        [(1 << 20) + 1, (1 << 20) + 2, (1 << 20) + 3, (1 << 20) + 4]
    );
}

#[test]
fn contains_on_frozen_view() {
    let bitmap = Bitmap::from_range_with_step(0..100_000, 7).unwrap();
    let view = FrozenBitmap::freeze(&bitmap).unwrap();
    let mut ctx = BulkContext::new(&view);
    for i in 0..100_000 {
        assert_eq!(ctx.contains(&view, i).unwrap(), i % 7 == 0);
    }
    assert!(ctx.contains(&bitmap, 0).is_err());
}

#[test]
fn extend_uses_one_context() {
    let mut bitmap = Bitmap::of(&[1]).unwrap();
    bitmap.extend((0..1000).map(|i| i * 3));
    assert_eq!(bitmap.cardinality(), 1001);

    let mut bitmap64 = Bitmap64::new().unwrap();
    bitmap64.extend([u64::MAX, 1 << 40, 0]);
    assert_eq!(bitmap64.to_vec(), [0, 1 << 40, u64::MAX]);
}

#[test]
fn bulk64_round_trip() {
    let mut bitmap = Bitmap64::new().unwrap();
    let mut ctx = BulkContext64::new(&bitmap);
    let values: Vec<u64> = (0..500).map(|i| (1 << 36) + i).collect();
    ctx.add_many(&mut bitmap, &values).unwrap();
    for &value in &values {
        assert!(ctx.contains(&bitmap, value).unwrap());
    }
    for &value in values.iter().step_by(2) {
        ctx.remove(&mut bitmap, value).unwrap();
    }
    assert_eq!(bitmap.cardinality(), 250);

    let other = Bitmap64::new().unwrap();
    assert!(matches!(
        ctx.contains(&other, 1),
        Err(Error::ForeignBulkContext { .. })
    ));
}
