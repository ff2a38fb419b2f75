#![no_main]

use croaring_shared::{Bitmap, Bitmap64, Native, Portable, ReadBitmap, ReadBitmap64, WriteBitmap};
use libfuzzer_sys::arbitrary::{self, Arbitrary};
use libfuzzer_sys::fuzz_target;

fn check_bitmap<D: croaring_shared::bitmap::Deserializer>(input: &[u8]) {
    if let Ok(mut bitmap) = Bitmap::try_deserialize::<D>(input) {
        bitmap.internal_validate().unwrap();

        let start_cardinality = bitmap.cardinality();
        let mut new_cardinality = start_cardinality;
        for i in 100..1000 {
            if !bitmap.contains(i) {
                bitmap.add(i);
                new_cardinality += 1;
            }
        }
        assert_eq!(
            new_cardinality,
            bitmap.cardinality(),
            "Cardinality mismatch in {}",
            std::any::type_name::<D>()
        );
    }
}

fn check_bitmap64(input: &[u8]) {
    if let Ok(bitmap) = Bitmap64::try_deserialize::<Portable>(input) {
        bitmap.internal_validate().unwrap();
        assert_eq!(bitmap.to_vec().len() as u64, bitmap.cardinality());
    }
}

#[derive(Arbitrary, Debug)]
enum BitmapType {
    Portable32,
    Native32,
    Portable64,
}

fuzz_target!(|input: (BitmapType, &[u8])| {
    let (ty, input) = input;
    match ty {
        BitmapType::Portable32 => check_bitmap::<Portable>(input),
        BitmapType::Native32 => check_bitmap::<Native>(input),
        BitmapType::Portable64 => check_bitmap64(input),
    }
});
