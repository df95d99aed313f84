#![no_main]

use libfuzzer_sys::fuzz_target;
use conductor::protocol::{decode_inbound, decode_outbound, encode_inbound};

fuzz_target!(|data: &[u8]| {
    // Control frames are UTF-8 text (ignore invalid UTF-8)
    if let Ok(s) = std::str::from_utf8(data) {
        // Anything that decodes must survive a re-encode
        if let Ok(message) = decode_inbound(s) {
            let frame = encode_inbound(&message).unwrap();
            assert_eq!(decode_inbound(&frame).unwrap(), message);
        }
        let _ = decode_outbound(s);
    }
});
