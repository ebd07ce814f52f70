#![no_main]

use libfuzzer_sys::fuzz_target;

// Cookie headers are client controlled, parsing should never panic
fuzz_target!(|data: &[u8]| {
    let header = match std::str::from_utf8(data) {
        Ok(s) => s,
        Err(_) => return,
    };
    let _ = tollgate_cookie::parse(header);
});
