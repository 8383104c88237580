#![expect(missing_docs)]

use std::thread;

use rstest::rstest;
use utfstream::{
    BomMode, ByteOrder, EncodingError, Utf8State, Utf8Validator, Utf16Decoder, Utf16Options,
    Utf16State, utf16_to_utf8_append, validate_utf8_chunk,
};

const SAMPLE: &str = "Grüße, 世界! 😀 \u{10FFFF} done";

fn utf16(text: &str, order: ByteOrder) -> Vec<u8> {
    text.encode_utf16()
        .flat_map(|unit| match order {
            ByteOrder::BigEndian => unit.to_be_bytes(),
            ByteOrder::LittleEndian => unit.to_le_bytes(),
        })
        .collect()
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(3)]
#[case(7)]
#[case(64)]
fn validator_over_fixed_chunk_sizes(#[case] size: usize) {
    let mut validator = Utf8Validator::new();
    for chunk in SAMPLE.as_bytes().chunks(size) {
        validator.feed(chunk).unwrap();
    }
    assert_eq!(validator.position(), SAMPLE.len());
    validator.finish().unwrap();
}

#[rstest]
#[case(ByteOrder::BigEndian, 1)]
#[case(ByteOrder::BigEndian, 3)]
#[case(ByteOrder::LittleEndian, 1)]
#[case(ByteOrder::LittleEndian, 5)]
fn decoder_over_fixed_chunk_sizes(#[case] order: ByteOrder, #[case] size: usize) {
    let input = utf16(SAMPLE, order);
    let mut decoder = Utf16Decoder::new(Utf16Options {
        byte_order: order,
        ..Default::default()
    });
    let mut out = Vec::new();
    for chunk in input.chunks(size) {
        decoder.feed(&mut out, chunk).unwrap();
    }
    decoder.finish().unwrap();
    assert_eq!(out, SAMPLE.as_bytes());
}

#[test]
fn detect_with_little_endian_mark() {
    let mut input = vec![0xFF, 0xFE];
    input.extend(utf16(SAMPLE, ByteOrder::LittleEndian));
    let mut decoder = Utf16Decoder::new(Utf16Options {
        byte_order: ByteOrder::BigEndian,
        bom: BomMode::Detect,
    });
    let mut out = Vec::new();
    for chunk in input.chunks(3) {
        decoder.feed(&mut out, chunk).unwrap();
    }
    assert_eq!(decoder.byte_order(), ByteOrder::LittleEndian);
    decoder.finish().unwrap();
    assert_eq!(out, SAMPLE.as_bytes());
}

#[test]
fn state_can_be_saved_and_restored_between_calls() {
    let bytes = SAMPLE.as_bytes();
    let mut bits = Utf8State::new().to_bits();
    for chunk in bytes.chunks(5) {
        let mut state = Utf8State::from_bits(bits).expect("bits came from to_bits");
        validate_utf8_chunk(chunk, &mut state).unwrap();
        bits = state.to_bits();
    }
    assert_eq!(bits, 0);

    let input = utf16(SAMPLE, ByteOrder::BigEndian);
    let mut out = Vec::new();
    let mut bits = 0;
    for chunk in input.chunks(3) {
        let mut state = Utf16State::try_from(bits).unwrap();
        utf16_to_utf8_append(&mut out, chunk, &mut state, ByteOrder::BigEndian).unwrap();
        bits = u32::from(state);
    }
    assert_eq!(bits, 0);
    assert_eq!(out, SAMPLE.as_bytes());
}

#[test]
fn resumed_validator_continues_a_sequence() {
    let mut first = Utf8Validator::new();
    first.feed(b"\xF0\x9F").unwrap();
    let mut second = Utf8Validator::with_state(first.state());
    second.feed(b"\x98\x80").unwrap();
    assert_eq!(second.position(), 2);
    second.finish().unwrap();
}

#[test]
fn independent_streams_on_separate_threads() {
    let handles: Vec<_> = (1..=8)
        .map(|size| {
            thread::spawn(move || {
                let mut state = Utf8State::new();
                for chunk in SAMPLE.as_bytes().chunks(size) {
                    validate_utf8_chunk(chunk, &mut state)?;
                }
                state.finish()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), Ok::<(), EncodingError>(()));
    }
}

#[cfg(feature = "serde")]
#[test]
fn states_serialize_as_bits() {
    let mut state = Utf8State::new();
    validate_utf8_chunk(b"\xE2\x82", &mut state).unwrap();
    let json = serde_json::to_string(&state).unwrap();
    assert_eq!(json, state.to_bits().to_string());
    assert_eq!(serde_json::from_str::<Utf8State>(&json).unwrap(), state);
    assert!(serde_json::from_str::<Utf8State>("65").is_err());

    let options = Utf16Options {
        byte_order: ByteOrder::LittleEndian,
        bom: BomMode::Strip,
    };
    let json = serde_json::to_string(&options).unwrap();
    assert_eq!(serde_json::from_str::<Utf16Options>(&json).unwrap(), options);
}
