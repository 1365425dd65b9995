#![no_main]
use libfuzzer_sys::fuzz_target;
use oxipack::codec::CacheConfig;
use oxipack::encoding::Encoding;
use oxipack::engine::{self, EncodeOptions};

fuzz_target!(|data: &[u8]| {
    let Some((&flags, text)) = data.split_first() else {
        return;
    };
    let Ok(document) = serde_json::from_slice::<serde_json::Value>(text) else {
        return;
    };

    // Low bits pick a small cache so eviction paths get exercised.
    let cache = CacheConfig {
        min_string_length: usize::from(flags & 0x07),
        max_byte_size: usize::from(flags >> 3) * 16,
    };
    let any = Encoding::any();
    // Reals with too many digits are rejected, not mangled.
    let opts = EncodeOptions {
        cache,
        ..Default::default()
    };
    let Ok(packed) = engine::encode_with_options(&document, &any, &opts) else {
        return;
    };
    let decoded = engine::decode(&packed, &any).unwrap();
    assert_eq!(decoded, document);
});
