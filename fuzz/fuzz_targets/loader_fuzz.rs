#![no_main]
use libfuzzer_sys::fuzz_target;
use oxipack::encoding::loader;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(encoding) = loader::from_str(text) else {
        return;
    };
    // Anything that loads must survive a trip through its JSON form.
    let reloaded = loader::load(&loader::to_json(&encoding)).unwrap();
    assert_eq!(reloaded, encoding);
});
