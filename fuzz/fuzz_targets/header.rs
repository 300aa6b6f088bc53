#![no_main]

use idx_wire::{HeaderPolicy, ImageHeader, LabelHeader};
use libfuzzer_sys::fuzz_target;

// Fuzz target: header validation under both policies.
//
// Catches bugs in:
// - Short buffers (every word offset)
// - Magic confusion between image and label files
// - Declared shapes that overflow record_size
fuzz_target!(|data: &[u8]| {
    for policy in [HeaderPolicy::Strict, HeaderPolicy::NonZero] {
        if let Ok(header) = ImageHeader::read_from(data, &ImageHeader::new(2, 2, 2), policy) {
            let _ = header.record_size();
        }
        let _ = LabelHeader::read_from(data, &LabelHeader::new(2), policy);
    }
});
