//! Fuzz test for container code decoding
//!
//! Feeds arbitrary strings to the decoder. Decoding must never panic, and
//! anything it accepts must re-encode to the same text.
//!
//! Run with: cargo +nightly fuzz run decode_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use wellplated_core::{BoundaryKey, ContainerCode, CODE_LENGTH};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(decoded) = ContainerCode::decode(input) {
            assert_eq!(input.len(), CODE_LENGTH);

            let key = BoundaryKey::derive(decoded.bottom_row, decoded.right_column, &decoded.prefix)
                .expect("decoded parts form a valid boundary key");
            let code = ContainerCode::encode(&key, decoded.sequence)
                .expect("decoded sequence fits its own field");
            assert_eq!(code.as_str(), input, "decode must be a left inverse of encode");
        }
    }
});
