#![no_main]

use libfuzzer_sys::fuzz_target;
use signed_object::crypto::signature::generate_key_pair_deterministic;
use signed_object::object::{SignedFrame, verify_object};

fuzz_target!(|data: &[u8]| {
    let (_, pk) = generate_key_pair_deterministic([0; 32]);
    let _res = verify_object::<Vec<String>>(data, &pk);
    if let Ok(frame) = SignedFrame::from_bytes_exact(data) {
        assert_eq!(frame.to_bytes(), data);
    }
});
