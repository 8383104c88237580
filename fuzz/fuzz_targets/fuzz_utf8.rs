#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use utfstream::{Utf8State, validate_utf8, validate_utf8_chunk};

#[derive(Debug, Arbitrary)]
struct Input {
    split_seed: u64,
    data: Vec<u8>,
}

/// Split `data` into chunks of at least one byte, sized from `split_seed`,
/// deliberately ignoring character boundaries.
fn split_chunks(data: &[u8], split_seed: u64) -> Vec<&[u8]> {
    let mut chunks = Vec::new();
    let mut seed = split_seed;
    let mut rest = data;
    while !rest.is_empty() {
        let size = (seed as usize % rest.len()) + 1;
        let (head, tail) = rest.split_at(size);
        chunks.push(head);
        rest = tail;
        seed = seed.rotate_left(7) ^ 0x9E37_79B9_7F4A_7C15;
    }
    chunks
}

fuzz_target!(|input: Input| {
    let expected = core::str::from_utf8(&input.data);
    assert_eq!(validate_utf8(&input.data), expected.is_ok());

    let mut state = Utf8State::new();
    let mut start = 0;
    for chunk in split_chunks(&input.data, input.split_seed) {
        if let Err(err) = validate_utf8_chunk(chunk, &mut state) {
            let at = start + err.offset().unwrap();
            let err = expected.expect_err("chunked validation rejected valid UTF-8");
            assert!(at >= err.valid_up_to());
            return;
        }
        start += chunk.len();
    }
    assert_eq!(state.finish().is_ok(), expected.is_ok());
});
