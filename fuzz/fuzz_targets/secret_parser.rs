//! Fuzz target for stored-secret parsing.
//!
//! Ensures `parse_secret` never panics on malformed records.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if input.len() > 1024 {
            return;
        }
        let _ = pgsasl_proto::secret::parse_secret(input);
    }
});
