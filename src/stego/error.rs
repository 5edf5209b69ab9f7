// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Error types for the marker container layer.
//!
//! [`RecordError`] describes why a single marker record was dropped; it is a
//! warning as far as a restore is concerned. [`StegoError`] covers failures
//! of a whole save or restore operation.

use core::fmt;

use crate::zw::ZwError;

/// Why one marker record could not be turned back into a marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Fewer than the 5 mandatory `|`-separated fields.
    TooFewFields(usize),
    /// The page field is not an integer >= 1.
    InvalidPage(String),
    /// A coordinate field is not a finite, non-negative number.
    InvalidCoordinate(String),
    /// The encoding tag is not one this reader understands.
    UnknownTag(String),
    /// The data field is not Base64.
    InvalidBase64,
    /// The data field decoded to zero bytes.
    EmptyPayload,
    /// The envelope entry is not a JSON string.
    NotAString,
    /// The record points at a page the document does not have.
    PageOutOfRange { page: u32, page_count: u32 },
    /// A zero-width carrier failed to encode or decode.
    Carrier(ZwError),
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewFields(n) => write!(f, "record has {n} fields, need at least 5"),
            Self::InvalidPage(p) => write!(f, "invalid page number: {p:?}"),
            Self::InvalidCoordinate(c) => write!(f, "invalid coordinate: {c:?}"),
            Self::UnknownTag(t) => write!(f, "unknown encoding tag: {t:?}"),
            Self::InvalidBase64 => write!(f, "payload is not valid Base64"),
            Self::EmptyPayload => write!(f, "payload is empty"),
            Self::NotAString => write!(f, "marker entry is not a string"),
            Self::PageOutOfRange { page, page_count } => {
                write!(f, "page {page} not found (document has {page_count} pages)")
            }
            Self::Carrier(e) => write!(f, "carrier error: {e}"),
        }
    }
}

impl std::error::Error for RecordError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Carrier(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ZwError> for RecordError {
    fn from(e: ZwError) -> Self {
        Self::Carrier(e)
    }
}

/// Errors from saving or restoring a whole marker set.
#[derive(Debug)]
pub enum StegoError {
    /// The registry is empty; there is nothing worth writing.
    NothingToSave,
    /// The metadata field holds no recognisable envelope.
    EnvelopeNotFound,
    /// An envelope candidate was found but could not be parsed.
    EnvelopeMalformed(String),
    /// A marker failed validation before being added.
    InvalidMarker(&'static str),
    /// No marker exists under the given id.
    UnknownMarker,
    /// Zero-width encoding failed.
    Carrier(ZwError),
    /// JSON serialization failed.
    Json(serde_json::Error),
}

impl fmt::Display for StegoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NothingToSave => write!(f, "no markers to save"),
            Self::EnvelopeNotFound => write!(f, "no hidden marker data found"),
            Self::EnvelopeMalformed(why) => write!(f, "malformed marker envelope: {why}"),
            Self::InvalidMarker(why) => write!(f, "invalid marker: {why}"),
            Self::UnknownMarker => write!(f, "no such marker"),
            Self::Carrier(e) => write!(f, "carrier error: {e}"),
            Self::Json(e) => write!(f, "JSON error: {e}"),
        }
    }
}

impl std::error::Error for StegoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Carrier(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ZwError> for StegoError {
    fn from(e: ZwError) -> Self {
        Self::Carrier(e)
    }
}

impl From<serde_json::Error> for StegoError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn carrier_error_is_the_source() {
        let zw = ZwError::EncodingRange { ch: '😀', index: 2 };
        let err = StegoError::from(zw.clone());
        assert_eq!(err.to_string(), format!("carrier error: {zw}"));
        assert!(err.source().is_some());
        assert!(StegoError::NothingToSave.source().is_none());
    }

    #[test]
    fn record_errors_stay_per_record() {
        let err = RecordError::from(ZwError::MalformedCarrier { segment: 0, reason: "short" });
        assert!(matches!(err, RecordError::Carrier(_)));
        assert!(err.source().is_some());
    }
}
