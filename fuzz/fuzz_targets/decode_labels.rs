#![no_main]

use idx_decoder::decode_labels;
use idx_wire::{HeaderPolicy, LabelHeader, LABEL_HEADER_SIZE};
use libfuzzer_sys::fuzz_target;

// Fuzz target: whole-buffer label decoding.
//
// Anything accepted under the lenient policy must hold exactly the
// declared number of labels.
fuzz_target!(|data: &[u8]| {
    let _ = decode_labels(data, &LabelHeader::new(4), HeaderPolicy::Strict);
    if let Ok(labels) = decode_labels(data, &LabelHeader::new(4), HeaderPolicy::NonZero) {
        assert_eq!(labels.len(), data.len() - LABEL_HEADER_SIZE);
    }
});
