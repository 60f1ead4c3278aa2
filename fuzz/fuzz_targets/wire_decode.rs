//! Fuzz target for packet and report decoding
//!
//! Feeds arbitrary bytes to the packet parser, the report parser and the
//! server's report evaluation.
//!
//! # Invariants
//!
//! - Decoding NEVER panics; wrong lengths and bad points return Err
//! - Anything that decodes re-encodes to the same bytes
//! - `evaluate` is Malformed exactly when the report does not decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use tracekey_core::{Packet, Report, ReportVerdict};

fuzz_target!(|data: &[u8]| {
    if let Ok(packet) = Packet::from_bytes(data) {
        assert_eq!(packet.to_bytes().as_slice(), data);
    }

    let decoded = Report::from_bytes(data);
    let verdict = ReportVerdict::evaluate(data);
    match decoded {
        Ok(report) => {
            assert_eq!(report.to_bytes().as_slice(), data);
            let expected =
                if report.verify() { ReportVerdict::Confirmed } else { ReportVerdict::Forged };
            assert_eq!(verdict, expected);
        },
        Err(_) => assert_eq!(verdict, ReportVerdict::Malformed),
    }
});
