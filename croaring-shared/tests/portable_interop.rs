use byteorder::{LittleEndian, ReadBytesExt};
use croaring_shared::{Bitmap, FrozenBitmap, Portable, ReadBitmap, SharedMemoryBlock, WriteBitmap};
use roaring::RoaringBitmap;

const SERIAL_COOKIE_NO_RUNCONTAINER: u32 = 12346;
const SERIAL_COOKIE: u16 = 12347;

/// `{0, 1000, 3k for k in 100000..200000, 700000..800000}`, built value by value so
/// CRoaring keeps array and bitset containers the way `roaring` does
fn reference_values() -> Vec<u32> {
    let mut values = vec![0, 1000];
    values.extend((100_000..200_000).map(|k| 3 * k));
    values.extend(700_000..800_000);
    values.sort_unstable();
    values.dedup();
    values
}

fn reference_bitmap() -> Bitmap {
    let mut bitmap = Bitmap::new().unwrap();
    bitmap.add_many(&reference_values());
    bitmap
}

fn roaring_bytes() -> Vec<u8> {
    let other: RoaringBitmap = reference_values().into_iter().collect();
    let mut buffer = Vec::with_capacity(other.serialized_size());
    other.serialize_into(&mut buffer).unwrap();
    buffer
}

#[test]
fn portable_bytes_match_independent_implementation() {
    let bitmap = reference_bitmap();
    let ours = bitmap.serialize::<Portable>();
    let theirs = roaring_bytes();
    assert_eq!(ours.len(), theirs.len());
    assert!(ours == theirs, "portable serialization differs from roaring");

    let mut header = &ours[..];
    assert_eq!(
        header.read_u32::<LittleEndian>().unwrap(),
        SERIAL_COOKIE_NO_RUNCONTAINER
    );
}

#[test]
fn independent_bytes_deserialize_to_same_values() {
    let theirs = roaring_bytes();
    let bitmap = Bitmap::try_deserialize::<Portable>(&theirs).unwrap();
    assert_eq!(bitmap, reference_bitmap());

    let block = SharedMemoryBlock::from_reader(&theirs[..], theirs.len()).unwrap();
    let view = block.freeze::<Portable>().unwrap();
    assert_eq!(view.to_vec(), reference_values());
}

#[test]
fn our_bytes_read_by_independent_implementation() {
    let mut bitmap = reference_bitmap();
    bitmap.add_range(2_000_000..2_100_000).unwrap();
    // Range adds produce run containers, which `roaring` does not read
    bitmap.remove_run_compression();
    let data = bitmap.serialize::<Portable>();
    let other = RoaringBitmap::deserialize_from(&data[..]).unwrap();
    assert_eq!(other.len(), bitmap.cardinality());
    assert!(other.iter().eq(bitmap.iter().unwrap()));
}

#[test]
fn run_optimized_bytes_start_with_run_cookie() {
    let mut bitmap = reference_bitmap();
    assert!(bitmap.run_optimize());
    let data = bitmap.serialize::<Portable>();

    let mut header = &data[..];
    let cookie = header.read_u16::<LittleEndian>().unwrap();
    let containers = header.read_u16::<LittleEndian>().unwrap();
    assert_eq!(cookie, SERIAL_COOKIE);
    assert_eq!(
        u64::from(containers) + 1,
        bitmap.statistics().containers
    );

    let view = FrozenBitmap::freeze(&bitmap).unwrap();
    assert_eq!(view, Bitmap::try_deserialize::<Portable>(&data).unwrap());
}
