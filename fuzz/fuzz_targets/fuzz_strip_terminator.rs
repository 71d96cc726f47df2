#![no_main]

use libfuzzer_sys::fuzz_target;
use needle::server::protocol::strip_terminator;

fuzz_target!(|data: &[u8]| {
    // Must never panic, strip at most one trailing byte, and leave
    // everything else untouched
    let stripped = strip_terminator(data);
    assert!(stripped.len() >= data.len().saturating_sub(1));
    assert!(data.starts_with(stripped));
    assert!(!stripped.ends_with(b"\n") || data.ends_with(b"\n\n"));
});
