// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Zero-width text codec.
//!
//! Maps a string onto a carrier made only of three invisible code points.
//! Every input character becomes one segment:
//!
//! ```text
//! [8 marks]  code point, MSB first: U+200B = 0, U+200C = 1
//! [1 mark ]  U+200D terminator
//! ```
//!
//! So a carrier for an `n`-character string is exactly `9 * n` code points
//! long. Only code points 0–255 fit in a segment; anything wider is rejected
//! with [`ZwError::EncodingRange`] instead of being truncated.
//!
//! Arbitrary bytes go through Base64 first ([`encode_bytes`]), which keeps them
//! inside the ASCII range.

pub mod chunk;
pub mod error;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

pub use error::{Result, ZwError};

/// ZERO WIDTH SPACE, the `0` bit.
pub const ZERO: char = '\u{200B}';
/// ZERO WIDTH NON-JOINER, the `1` bit.
pub const ONE: char = '\u{200C}';
/// ZERO WIDTH JOINER, ends every character segment.
pub const TERMINATOR: char = '\u{200D}';

/// Bits per encoded character.
pub const BITS_PER_CHAR: usize = 8;

/// Largest code point a segment can hold.
const MAX_CODE_POINT: u32 = (1 << BITS_PER_CHAR) - 1;

/// Encode `text` into a zero-width carrier.
///
/// Iterates Unicode scalar values, not UTF-16 units.
///
/// # Errors
/// [`ZwError::EncodingRange`] for the first character above U+00FF.
pub fn encode(text: &str) -> Result<String> {
    // Each mark is 3 bytes of UTF-8.
    let mut out = String::with_capacity(text.len() * (BITS_PER_CHAR + 1) * 3);
    for (index, ch) in text.chars().enumerate() {
        let code = ch as u32;
        if code > MAX_CODE_POINT {
            return Err(ZwError::EncodingRange { ch, index });
        }
        for bit in (0..BITS_PER_CHAR).rev() {
            out.push(if (code >> bit) & 1 == 1 { ONE } else { ZERO });
        }
        out.push(TERMINATOR);
    }
    Ok(out)
}

/// Decode a zero-width carrier back into text.
///
/// Empty segments (doubled terminators, a leading terminator) are skipped.
///
/// # Errors
/// [`ZwError::MalformedCarrier`] if a segment is not exactly 8 marks or holds
/// anything other than U+200B / U+200C.
pub fn decode(carrier: &str) -> Result<String> {
    let mut out = String::with_capacity(carrier.len() / ((BITS_PER_CHAR + 1) * 3));
    for (segment, bits) in carrier
        .split(TERMINATOR)
        .filter(|s| !s.is_empty())
        .enumerate()
    {
        let mut code: u32 = 0;
        let mut len = 0usize;
        for mark in bits.chars() {
            let bit = match mark {
                ZERO => 0,
                ONE => 1,
                _ => {
                    return Err(ZwError::MalformedCarrier {
                        segment,
                        reason: "unexpected character in segment",
                    })
                }
            };
            len += 1;
            if len > BITS_PER_CHAR {
                break;
            }
            code = (code << 1) | bit;
        }
        if len != BITS_PER_CHAR {
            return Err(ZwError::MalformedCarrier {
                segment,
                reason: "segment is not 8 marks long",
            });
        }
        // code <= 255, always a valid scalar value.
        out.push(char::from(code as u8));
    }
    Ok(out)
}

/// Base64-encode `bytes` and wrap the result in a carrier.
pub fn encode_bytes(bytes: &[u8]) -> String {
    let ascii = STANDARD.encode(bytes);
    let mut out = String::with_capacity(ascii.len() * (BITS_PER_CHAR + 1) * 3);
    for byte in ascii.bytes() {
        for bit in (0..BITS_PER_CHAR).rev() {
            out.push(if (byte >> bit) & 1 == 1 { ONE } else { ZERO });
        }
        out.push(TERMINATOR);
    }
    out
}

/// Reverse of [`encode_bytes`].
///
/// # Errors
/// [`ZwError::MalformedCarrier`] if the carrier is malformed or does not hold
/// valid Base64.
pub fn decode_bytes(carrier: &str) -> Result<Vec<u8>> {
    let ascii = decode(carrier)?;
    STANDARD
        .decode(ascii.as_bytes())
        .map_err(|_| ZwError::MalformedCarrier {
            segment: 0,
            reason: "carrier does not contain Base64",
        })
}

/// Returns `true` if `c` is one of the three carrier marks.
pub fn is_mark(c: char) -> bool {
    matches!(c, ZERO | ONE | TERMINATOR)
}

/// Returns `true` if `text` is a non-empty string of carrier marks only.
pub fn is_carrier(text: &str) -> bool {
    !text.is_empty() && text.chars().all(is_mark)
}

/// Keep only the carrier marks from `mixed`.
///
/// Text pulled out of a PDF page interleaves visible glyphs with the hidden
/// run; this strips the glyphs so the result can go to [`decode`].
pub fn extract_carrier(mixed: &str) -> String {
    mixed.chars().filter(|&c| is_mark(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_roundtrip() {
        let carrier = encode("Hi").unwrap();
        assert_eq!(decode(&carrier).unwrap(), "Hi");
    }

    #[test]
    fn known_bits_for_letter_h() {
        // 'H' = 0x48 = 0100_1000
        let carrier = encode("H").unwrap();
        let expected: String = [ZERO, ONE, ZERO, ZERO, ONE, ZERO, ZERO, ZERO, TERMINATOR]
            .iter()
            .collect();
        assert_eq!(carrier, expected);
    }

    #[test]
    fn full_latin1_range_roundtrip() {
        let all: String = (0u8..=255).map(char::from).collect();
        let carrier = encode(&all).unwrap();
        assert_eq!(decode(&carrier).unwrap(), all);
    }

    #[test]
    fn terminator_count_matches_char_count() {
        let text = "Ünïcödé ÿ\u{0}\n";
        let carrier = encode(text).unwrap();
        let terminators = carrier.chars().filter(|&c| c == TERMINATOR).count();
        assert_eq!(terminators, text.chars().count());
        assert!(carrier.chars().all(is_mark));
        assert_eq!(carrier.chars().count(), text.chars().count() * 9);
    }

    #[test]
    fn empty_roundtrip() {
        assert_eq!(encode("").unwrap(), "");
        assert_eq!(decode("").unwrap(), "");
    }

    #[test]
    fn rejects_emoji() {
        match encode("ok😀") {
            Err(ZwError::EncodingRange { ch, index }) => {
                assert_eq!(ch, '😀');
                assert_eq!(index, 2);
            }
            other => panic!("expected EncodingRange, got {other:?}"),
        }
    }

    #[test]
    fn rejects_first_char_above_latin1() {
        assert!(matches!(
            encode("\u{100}"),
            Err(ZwError::EncodingRange { index: 0, .. })
        ));
    }

    #[test]
    fn decode_skips_empty_segments() {
        let mut carrier = String::new();
        carrier.push(TERMINATOR);
        carrier.push_str(&encode("a").unwrap());
        carrier.push(TERMINATOR);
        carrier.push_str(&encode("b").unwrap());
        assert_eq!(decode(&carrier).unwrap(), "ab");
    }

    #[test]
    fn decode_rejects_short_segment() {
        let carrier: String = [ZERO, ONE, TERMINATOR].iter().collect();
        assert!(matches!(
            decode(&carrier),
            Err(ZwError::MalformedCarrier { segment: 0, .. })
        ));
    }

    #[test]
    fn decode_rejects_long_segment() {
        let carrier: String = std::iter::repeat(ONE).take(9).chain([TERMINATOR]).collect();
        assert!(decode(&carrier).is_err());
    }

    #[test]
    fn decode_rejects_foreign_character() {
        let mut carrier = encode("a").unwrap();
        carrier.push_str("x");
        carrier.push(TERMINATOR);
        assert!(matches!(
            decode(&carrier),
            Err(ZwError::MalformedCarrier { segment: 1, .. })
        ));
    }

    #[test]
    fn bytes_roundtrip() {
        let data: Vec<u8> = (0u8..=255).rev().collect();
        let carrier = encode_bytes(&data);
        assert!(is_carrier(&carrier));
        assert_eq!(decode_bytes(&carrier).unwrap(), data);
    }

    #[test]
    fn encode_bytes_matches_encode_of_base64() {
        let data = b"\x00\xffhello";
        assert_eq!(encode_bytes(data), encode(&STANDARD.encode(data)).unwrap());
    }

    #[test]
    fn decode_bytes_rejects_non_base64() {
        let carrier = encode("not base64!").unwrap();
        assert!(decode_bytes(&carrier).is_err());
    }

    #[test]
    fn extract_carrier_strips_visible_text() {
        let carrier = encode("secret").unwrap();
        let mixed = format!("Page 1 {carrier} footer");
        let extracted = extract_carrier(&mixed);
        assert_eq!(extracted, carrier);
        assert_eq!(decode(&extracted).unwrap(), "secret");
    }

    #[test]
    fn is_carrier_rejects_empty_and_mixed() {
        assert!(!is_carrier(""));
        assert!(!is_carrier("a\u{200B}"));
        assert!(is_carrier("\u{200B}\u{200D}"));
    }
}
