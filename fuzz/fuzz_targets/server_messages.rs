//! Fuzz target for server-message handling in the SCRAM exchange.
//!
//! This fuzzer drives a client session with arbitrary bytes standing in
//! for the server-first and server-final messages, ensuring the parsers
//! and the state machine error out instead of panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pgsasl_proto::{Credential, SaslMechanism, ScramClient, ScramConfig};

fuzz_target!(|data: &[u8]| {
    // SCRAM messages are short; oversized inputs waste fuzzing time.
    if data.len() > 512 {
        return;
    }

    let Ok(client) = ScramClient::new(
        Credential::Password(b"pencil".to_vec()),
        SaslMechanism::ScramSha256,
        ScramConfig::default(),
    ) else {
        return;
    };
    let mut client = client.with_client_nonce("rOprNGfwEbeRWgbNEkqO");

    let _ = client.exchange(None);

    // Arbitrary server-first; if it happens to parse, the same bytes are
    // fed again as the server-final.
    if client.exchange(Some(data)).is_ok() {
        let _ = client.exchange(Some(data));
    }
});
