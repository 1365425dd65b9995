#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let args: Vec<String> = text
        .split_whitespace()
        .take(32)
        .map(str::to_string)
        .collect();
    oxipack::cli::fuzz_try_parse_args(&args);
});
