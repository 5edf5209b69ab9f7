// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Payload encoding for marker records.
//!
//! Every payload is turned into a Base64 string before it goes into a record:
//!
//! ```text
//! text   ->  Base64(gzip(UTF-8))                 tag "ztext"
//!            Base64(percent-encode(UTF-8))       fallback when gzip fails
//! image  ->  Base64(bytes)                       tag "image"
//! audio  ->  Base64(bytes)                       tag "audio"
//! ```
//!
//! The `ztext` tag does not say which of the text sub-encodings a writer
//! used, and older writers also stored plain Base64 of the raw text. The
//! reader therefore probes [`TEXT_STRATEGIES`] in order and takes the first
//! one that applies.

use std::io::{Read, Write};

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::{debug, warn};

use crate::stego::error::RecordError;

/// Upper bound on inflated text size. Guards against decompression bombs.
pub const MAX_DECOMPRESSED_LEN: usize = 16 * 1024 * 1024;

/// gzip member magic bytes.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Decoder that accepts missing padding and stray trailing bits, the way a
/// browser's `atob` does.
const BASE64_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Sub-encoding of a `ztext` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// gzip stream of UTF-8 text.
    Gzip,
    /// ASCII percent-encoding of UTF-8 text.
    PercentEncoded,
    /// The bytes themselves: UTF-8 if valid, otherwise one char per byte.
    Raw,
}

/// Order in which [`decode_text`] probes the text sub-encodings.
pub const TEXT_STRATEGIES: [TextEncoding; 3] = [
    TextEncoding::Gzip,
    TextEncoding::PercentEncoded,
    TextEncoding::Raw,
];

impl TextEncoding {
    /// Try to read `bytes` as this sub-encoding. `None` means "not applicable".
    pub fn try_decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            Self::Gzip => {
                let inflated = decompress_gzip(bytes)?;
                String::from_utf8(inflated).ok()
            }
            Self::PercentEncoded => {
                if !is_percent_encoded(bytes) {
                    return None;
                }
                let ascii = std::str::from_utf8(bytes).ok()?;
                urlencoding::decode(ascii).ok().map(|s| s.into_owned())
            }
            Self::Raw => Some(match std::str::from_utf8(bytes) {
                Ok(s) => s.to_string(),
                Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
            }),
        }
    }
}

/// Text recovered from a `ztext` payload and the sub-encoding that matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: TextEncoding,
}

/// Encode text for a `ztext` record: gzip, then Base64.
///
/// Falls back to Base64 of the percent-encoded text if the gzip writer fails.
pub fn encode_text(text: &str) -> String {
    match compress_gzip(text.as_bytes()) {
        Ok(compressed) => STANDARD.encode(compressed),
        Err(e) => {
            warn!(error = %e, "gzip failed, storing percent-encoded text");
            encode_text_as(text, TextEncoding::PercentEncoded)
        }
    }
}

/// Encode text with an explicit sub-encoding.
///
/// Writers only ever need [`encode_text`]; this exists so the legacy forms
/// can be produced for compatibility checks.
pub fn encode_text_as(text: &str, encoding: TextEncoding) -> String {
    match encoding {
        TextEncoding::Gzip => encode_text(text),
        TextEncoding::PercentEncoded => STANDARD.encode(urlencoding::encode(text).as_bytes()),
        TextEncoding::Raw => STANDARD.encode(text.as_bytes()),
    }
}

/// Decode the data field of a `ztext` record.
///
/// # Errors
/// [`RecordError::InvalidBase64`] if `data` is not Base64. Once the Base64
/// layer decodes, the [`TextEncoding::Raw`] strategy always applies.
pub fn decode_text(data: &str) -> Result<DecodedText, RecordError> {
    let bytes = BASE64_LENIENT
        .decode(data.trim())
        .map_err(|_| RecordError::InvalidBase64)?;

    for encoding in TEXT_STRATEGIES {
        if let Some(text) = encoding.try_decode(&bytes) {
            if encoding != TextEncoding::Gzip {
                if bytes.starts_with(&GZIP_MAGIC) {
                    warn!(?encoding, "gzip header present but stream did not inflate");
                } else {
                    debug!(?encoding, "text payload is not gzip");
                }
            }
            return Ok(DecodedText { text, encoding });
        }
    }
    // Raw always applies.
    Err(RecordError::InvalidBase64)
}

/// Encode an image or audio payload. No compression.
pub fn encode_binary(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode the data field of an `image` or `audio` record.
///
/// # Errors
/// - [`RecordError::InvalidBase64`] if `data` is empty, contains anything
///   outside `[A-Za-z0-9+/=]`, or does not decode.
/// - [`RecordError::EmptyPayload`] if it decodes to zero bytes.
pub fn decode_binary(data: &str) -> Result<Vec<u8>, RecordError> {
    if !is_base64_class(data) {
        return Err(RecordError::InvalidBase64);
    }
    let bytes = BASE64_LENIENT
        .decode(data)
        .map_err(|_| RecordError::InvalidBase64)?;
    if bytes.is_empty() {
        return Err(RecordError::EmptyPayload);
    }
    Ok(bytes)
}

/// `[A-Za-z0-9+/=]+`
pub fn is_base64_class(data: &str) -> bool {
    !data.is_empty()
        && data
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'=')
}

/// ASCII only, and every `%` starts a two-digit hex escape.
fn is_percent_encoded(bytes: &[u8]) -> bool {
    if !bytes.is_ascii() {
        return false;
    }
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3);
            match escape {
                Some([h, l]) if h.is_ascii_hexdigit() && l.is_ascii_hexdigit() => i += 3,
                _ => return false,
            }
        } else {
            i += 1;
        }
    }
    true
}

/// Compress data into a single gzip member.
fn compress_gzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2 + 32), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Inflate a gzip stream. `None` if it is not gzip, is truncated, or would
/// exceed [`MAX_DECOMPRESSED_LEN`].
fn decompress_gzip(data: &[u8]) -> Option<Vec<u8>> {
    if !data.starts_with(&GZIP_MAGIC) {
        return None;
    }
    let mut output = Vec::new();
    let decoder = GzDecoder::new(data);
    decoder
        .take(MAX_DECOMPRESSED_LEN as u64 + 1)
        .read_to_end(&mut output)
        .ok()?;
    if output.len() > MAX_DECOMPRESSED_LEN {
        return None;
    }
    Some(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_roundtrip_uses_gzip() {
        let data = encode_text("secret");
        let decoded = decode_text(&data).unwrap();
        assert_eq!(decoded.text, "secret");
        assert_eq!(decoded.encoding, TextEncoding::Gzip);
    }

    #[test]
    fn gzip_output_has_magic() {
        let bytes = STANDARD.decode(encode_text("hello")).unwrap();
        assert_eq!(&bytes[..2], &GZIP_MAGIC);
    }

    #[test]
    fn empty_text_roundtrip() {
        let decoded = decode_text(&encode_text("")).unwrap();
        assert_eq!(decoded.text, "");
        assert_eq!(decoded.encoding, TextEncoding::Gzip);
    }

    #[test]
    fn unicode_text_roundtrip() {
        let text = "Ünïcödé 🎉 日本語";
        assert_eq!(decode_text(&encode_text(text)).unwrap().text, text);
    }

    #[test]
    fn long_repetitive_text_shrinks() {
        let text = "abcdefghij".repeat(200);
        let data = encode_text(&text);
        assert!(data.len() < text.len());
        assert_eq!(decode_text(&data).unwrap().text, text);
    }

    #[test]
    fn percent_fallback_is_detected() {
        let text = "grüße & 100% sure";
        let data = encode_text_as(text, TextEncoding::PercentEncoded);
        let decoded = decode_text(&data).unwrap();
        assert_eq!(decoded.text, text);
        assert_eq!(decoded.encoding, TextEncoding::PercentEncoded);
    }

    #[test]
    fn raw_utf8_is_last_resort() {
        // Non-ASCII bytes rule out the percent tier.
        let text = "naïve 100%";
        let data = encode_text_as(text, TextEncoding::Raw);
        let decoded = decode_text(&data).unwrap();
        assert_eq!(decoded.text, text);
        assert_eq!(decoded.encoding, TextEncoding::Raw);
    }

    #[test]
    fn raw_non_utf8_maps_bytes_to_chars() {
        let data = STANDARD.encode([0x48, 0xE9, 0xFF]);
        let decoded = decode_text(&data).unwrap();
        assert_eq!(decoded.text, "Hé\u{ff}");
        assert_eq!(decoded.encoding, TextEncoding::Raw);
    }

    #[test]
    fn plain_ascii_reads_through_percent_tier() {
        let data = STANDARD.encode("hello world");
        let decoded = decode_text(&data).unwrap();
        assert_eq!(decoded.text, "hello world");
        assert_eq!(decoded.encoding, TextEncoding::PercentEncoded);
    }

    #[test]
    fn broken_percent_escape_falls_to_raw() {
        let data = STANDARD.encode("50%zz");
        let decoded = decode_text(&data).unwrap();
        assert_eq!(decoded.text, "50%zz");
        assert_eq!(decoded.encoding, TextEncoding::Raw);
    }

    #[test]
    fn corrupt_gzip_body_falls_through() {
        // Magic bytes followed by garbage.
        let data = STANDARD.encode([0x1f, 0x8b, 0xff, 0xff, 0xff, 0xff]);
        let decoded = decode_text(&data).unwrap();
        assert_eq!(decoded.encoding, TextEncoding::Raw);
    }

    #[test]
    fn text_rejects_non_base64() {
        assert_eq!(decode_text("***"), Err(RecordError::InvalidBase64));
    }

    #[test]
    fn text_accepts_unpadded_base64() {
        let data = encode_text("pad me");
        let unpadded = data.trim_end_matches('=');
        assert_eq!(decode_text(unpadded).unwrap().text, "pad me");
    }

    #[test]
    fn binary_roundtrip() {
        let bytes: Vec<u8> = (0..=255).collect();
        assert_eq!(decode_binary(&encode_binary(&bytes)).unwrap(), bytes);
    }

    #[test]
    fn binary_rejects_bad_alphabet() {
        assert_eq!(decode_binary("abc-def_"), Err(RecordError::InvalidBase64));
        assert_eq!(decode_binary("ab cd"), Err(RecordError::InvalidBase64));
        assert_eq!(decode_binary(""), Err(RecordError::InvalidBase64));
    }

    #[test]
    fn binary_rejects_padding_only() {
        assert!(decode_binary("====").is_err());
    }

    #[test]
    fn percent_detection() {
        assert!(is_percent_encoded(b"a%20b%C3%A9"));
        assert!(!is_percent_encoded(b"a%2"));
        assert!(!is_percent_encoded(b"a%g0"));
        assert!(!is_percent_encoded("é".as_bytes()));
    }

    #[test]
    fn encoders_do_not_share_state() {
        let a = encode_text("same");
        let b = encode_text("same");
        assert_eq!(a, b);
    }
}
