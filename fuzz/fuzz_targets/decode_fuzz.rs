#![no_main]
use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use oxipack::encoding::Encoding;
use oxipack::engine::{self, DecodeOptions};

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must only ever produce errors, never panics.
    let _ = engine::decode(data, &Encoding::any());

    let lenient = DecodeOptions {
        max_depth: 16,
        allow_trailing_data: true,
    };
    let typed = Encoding::FloorTypedArray {
        minimum: 0,
        encoding: Arc::new(Encoding::VarintTypedArbitraryObject {
            key_encoding: Arc::new(Encoding::PrefixVarintLengthStringShared),
            encoding: Arc::new(Encoding::any()),
        }),
        prefix_encodings: vec![
            Encoding::Rfc3339DateIntegerTriplet,
            Encoding::DoubleVarintTuple,
            Encoding::Bounded8BitPrefixUtf8StringShared {
                minimum: 0,
                maximum: 16,
            },
            Encoding::RoofVarintPrefixUtf8StringShared { maximum: 64 },
        ],
    };
    let _ = engine::decode_with_options(data, &typed, &lenient);
});
