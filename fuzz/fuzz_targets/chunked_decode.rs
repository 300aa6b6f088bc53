#![no_main]

use arbitrary::Arbitrary;
use idx_decoder::{decode_images, DecodeError, ImageRecords, ImageStreamDecoder};
use idx_wire::{HeaderPolicy, ImageHeader};
use libfuzzer_sys::fuzz_target;

// Fuzz target: ImageStreamDecoder with arbitrary split points.
//
// The same bytes are decoded once as a single chunk and once split at
// the fuzzer's cut points. Both runs must agree on success and, when
// they succeed, on every record.
#[derive(Debug, Arbitrary)]
struct FuzzInput {
    lenient: bool,
    count: u8,
    rows: u8,
    cols: u8,
    cuts: Vec<u16>,
    data: Vec<u8>,
}

fn chunked(
    data: &[u8],
    cuts: &[usize],
    expected: ImageHeader,
    policy: HeaderPolicy,
) -> Result<ImageRecords, DecodeError> {
    let mut decoder = ImageStreamDecoder::new(expected, policy);
    let mut start = 0;
    for &cut in cuts {
        decoder.push(&data[start..cut])?;
        start = cut;
    }
    decoder.push(&data[start..])?;
    decoder.finish()
}

fuzz_target!(|input: FuzzInput| {
    let policy = if input.lenient {
        HeaderPolicy::NonZero
    } else {
        HeaderPolicy::Strict
    };
    let expected = ImageHeader::new(
        u32::from(input.count),
        u32::from(input.rows),
        u32::from(input.cols),
    );

    let mut cuts: Vec<usize> = input
        .cuts
        .iter()
        .map(|&c| usize::from(c) % (input.data.len() + 1))
        .collect();
    cuts.sort_unstable();

    let whole = decode_images(&input.data, &expected, policy);
    let split = chunked(&input.data, &cuts, expected, policy);

    match (whole, split) {
        (Ok(a), Ok(b)) => {
            assert_eq!(a, b);
            assert_eq!(a.len() * a.record_size() + 16, input.data.len());
        }
        (Err(_), Err(_)) => {}
        (a, b) => panic!("single chunk {a:?} disagrees with split {b:?}"),
    }
});
