#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use utfstream::{ByteOrder, Utf16State, utf16_to_utf8_append};

#[derive(Debug, Arbitrary)]
struct Input {
    little_endian: bool,
    split_seed: u64,
    data: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let order = if input.little_endian {
        ByteOrder::LittleEndian
    } else {
        ByteOrder::BigEndian
    };
    let units = input
        .data
        .chunks_exact(2)
        .map(|pair| order.unit(pair[0], pair[1]));
    let expected: Result<String, _> = char::decode_utf16(units).collect();
    let expected = expected.ok().filter(|_| input.data.len() % 2 == 0);

    let mut out = Vec::new();
    let mut state = Utf16State::new();
    let mut rest = &input.data[..];
    let mut seed = input.split_seed;
    while !rest.is_empty() {
        let (head, tail) = rest.split_at((seed as usize % rest.len()) + 1);
        if utf16_to_utf8_append(&mut out, head, &mut state, order).is_err() {
            assert!(expected.is_none(), "rejected valid UTF-16");
            return;
        }
        rest = tail;
        seed = seed.rotate_left(11) ^ 0xA076_1D64_78BD_642F;
    }
    match expected {
        Some(text) => {
            assert!(state.finish().is_ok());
            assert_eq!(out, text.as_bytes());
        }
        None => assert!(state.finish().is_err()),
    }
    assert!(core::str::from_utf8(&out).is_ok());
});
