// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Chunked carriers.
//!
//! Long payloads (a recorded audio clip is easily 100 KB of Base64) are split
//! into fixed-size runs before encoding, so each invisible text run stays a
//! reasonable size. Concatenating the chunk carriers gives the same string as
//! encoding the whole input at once, since segments never span chunks.

use super::{decode, encode, Result, ZwError};

/// Default run length in input characters.
pub const DEFAULT_CHUNK_CHARS: usize = 3000;

/// Split `text` into runs of at most `chunk_chars` characters and encode each.
///
/// `chunk_chars == 0` means "no splitting". An empty input yields no chunks.
pub fn encode_chunked(text: &str, chunk_chars: usize) -> Result<Vec<String>> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    if chunk_chars == 0 {
        return Ok(vec![encode(text)?]);
    }

    let mut chunks = Vec::with_capacity(text.len() / chunk_chars + 1);
    let mut start = 0usize;
    let mut count = 0usize;
    for (offset, _) in text.char_indices() {
        if count == chunk_chars {
            chunks.push(encode_at(&text[start..offset], chunks.len() * chunk_chars)?);
            start = offset;
            count = 0;
        }
        count += 1;
    }
    chunks.push(encode_at(&text[start..], chunks.len() * chunk_chars)?);
    Ok(chunks)
}

/// Encode one chunk, reporting range errors against the whole input.
fn encode_at(chunk: &str, first_char: usize) -> Result<String> {
    encode(chunk).map_err(|e| match e {
        ZwError::EncodingRange { ch, index } => ZwError::EncodingRange {
            ch,
            index: first_char + index,
        },
        other => other,
    })
}

/// Decode chunks in order and concatenate the results.
pub fn decode_chunked<S: AsRef<str>>(chunks: &[S]) -> Result<String> {
    let mut out = String::new();
    for chunk in chunks {
        out.push_str(&decode(chunk.as_ref())?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zw::TERMINATOR;

    #[test]
    fn splits_on_char_boundaries() {
        let text = "abcdefg";
        let chunks = encode_chunked(text, 3).unwrap();
        assert_eq!(chunks.len(), 3);
        let sizes: Vec<usize> = chunks
            .iter()
            .map(|c| c.chars().filter(|&m| m == TERMINATOR).count())
            .collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        assert_eq!(decode_chunked(&chunks).unwrap(), text);
    }

    #[test]
    fn concatenation_equals_single_carrier() {
        let text = "é".repeat(10) + "plain";
        let chunks = encode_chunked(&text, 4).unwrap();
        assert_eq!(chunks.concat(), encode(&text).unwrap());
    }

    #[test]
    fn exact_multiple_has_no_empty_tail() {
        let chunks = encode_chunked("abcdef", 3).unwrap();
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn zero_chunk_size_is_single_chunk() {
        let chunks = encode_chunked("abcdef", 0).unwrap();
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn empty_input_has_no_chunks() {
        assert!(encode_chunked("", DEFAULT_CHUNK_CHARS).unwrap().is_empty());
        assert_eq!(decode_chunked::<&str>(&[]).unwrap(), "");
    }

    #[test]
    fn out_of_range_fails_whole_call() {
        let text = format!("{}€", "a".repeat(10));
        assert!(matches!(
            encode_chunked(&text, 4),
            Err(ZwError::EncodingRange { ch: '€', index: 10 })
        ));
    }
}
