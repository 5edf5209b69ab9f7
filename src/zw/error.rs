// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Error types for the zero-width codec.

use core::fmt;

/// Errors that can occur while encoding or decoding a zero-width carrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZwError {
    /// A character does not fit in the 8-bit-per-character scheme.
    EncodingRange {
        /// The offending character.
        ch: char,
        /// Its position in the input, counted in characters.
        index: usize,
    },
    /// The carrier contains a segment that is not 8 binary marks.
    MalformedCarrier {
        /// Zero-based index of the bad segment (empty segments not counted).
        segment: usize,
        /// What was wrong with it.
        reason: &'static str,
    },
}

impl fmt::Display for ZwError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EncodingRange { ch, index } => write!(
                f,
                "character U+{:04X} at index {index} is outside the 8-bit carrier range",
                *ch as u32
            ),
            Self::MalformedCarrier { segment, reason } => {
                write!(f, "malformed carrier segment {segment}: {reason}")
            }
        }
    }
}

impl std::error::Error for ZwError {}

pub type Result<T> = std::result::Result<T, ZwError>;
