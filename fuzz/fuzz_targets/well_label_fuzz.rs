//! Fuzz test for well label parsing
//!
//! Run with: cargo +nightly fuzz run well_label_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use wellplated_core::{ContainerCode, WellAddress};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(address) = input.parse::<WellAddress>() {
            assert!(('A'..='P').contains(&address.row));
            assert!(address.column <= 29);

            // Bounds checks must not panic for any parsed label.
            let code = ContainerCode::parse("H12PLATE0000001").expect("fixed code is valid");
            let _ = wellplated_core::validate_position(&code, address.row, address.column);
        }
    }
});
