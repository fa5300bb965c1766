//! Fuzz target for settings parsing
//!
//! Ensures arbitrary settings blobs never panic the parser.

#![no_main]

use libfuzzer_sys::fuzz_target;
use saxpack_core::parse_settings;

fuzz_target!(|data: &[u8]| {
    let _ = parse_settings(data);
});
