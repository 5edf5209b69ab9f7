// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Envelope container for a document's marker records.
//!
//! All records of a document are stored together in the PDF keywords field
//! as one JSON object:
//!
//! ```text
//! { "version": "2.0", "timestamp": "<ISO-8601>", "markers": ["<record>", ...] }
//! ```
//!
//! The whole envelope is rewritten on every save. On read the keywords field
//! may hold other text around the JSON, and older writers stored a bare array
//! of records with no wrapper object. Finding the JSON is done by the ordered
//! [`LOCATORS`]; the first locator that applies decides, and a parse failure
//! of its candidate is final.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::stego::error::StegoError;

/// Version written into new envelopes.
pub const ENVELOPE_VERSION: &str = "2.0";

/// Key of the record array inside the envelope object.
const MARKERS_KEY: &str = "markers";

/// Serialized marker set of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub version: String,
    pub timestamp: String,
    pub markers: Vec<String>,
}

impl Envelope {
    /// Wrap `records` in a new envelope stamped with the current time.
    ///
    /// # Errors
    /// [`StegoError::NothingToSave`] if `records` is empty, so an empty set
    /// never overwrites the keywords field.
    pub fn build(records: Vec<String>) -> Result<Self, StegoError> {
        Self::with_timestamp(records, timestamp_now())
    }

    /// Like [`Envelope::build`] with an explicit timestamp.
    pub fn with_timestamp(records: Vec<String>, timestamp: String) -> Result<Self, StegoError> {
        if records.is_empty() {
            return Err(StegoError::NothingToSave);
        }
        Ok(Self {
            version: ENVELOPE_VERSION.to_string(),
            timestamp,
            markers: records,
        })
    }

    pub fn to_json(&self) -> Result<String, StegoError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Current UTC time as `2026-01-31T12:34:56.789Z`.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A way of finding envelope JSON inside free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    /// From the first `{` to the last `}`.
    BraceSpan,
    /// From the first `[` to the last `]`, only if that span is a non-empty
    /// JSON array of strings (bare record array). Bracketed free text such
    /// as `see [1]` does not apply.
    BracketSpan,
    /// The whole field, if it mentions `"markers"`.
    MarkersKeyword,
}

/// Order in which [`locate`] tries the locators.
pub const LOCATORS: [Locator; 3] = [
    Locator::BraceSpan,
    Locator::BracketSpan,
    Locator::MarkersKeyword,
];

impl Locator {
    /// Candidate JSON text, or `None` if this locator does not apply.
    pub fn find<'a>(&self, field: &'a str) -> Option<&'a str> {
        match self {
            Self::BraceSpan => span(field, '{', '}'),
            Self::BracketSpan => span(field, '[', ']').filter(|json| is_record_array(json)),
            Self::MarkersKeyword => field.contains("\"markers\"").then_some(field),
        }
    }
}

fn span(field: &str, open: char, close: char) -> Option<&str> {
    let start = field.find(open)?;
    let end = field.rfind(close)?;
    (start < end).then(|| &field[start..=end])
}

fn is_record_array(json: &str) -> bool {
    match serde_json::from_str::<Vec<Value>>(json) {
        Ok(entries) => !entries.is_empty() && entries.iter().all(Value::is_string),
        Err(_) => false,
    }
}

/// Run the locators in order and return the first hit.
pub fn locate(field: &str) -> Option<(Locator, &str)> {
    LOCATORS
        .iter()
        .find_map(|locator| locator.find(field).map(|json| (*locator, json)))
}

/// Envelope content as read back, in either the wrapped or the legacy shape.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeContents {
    /// `None` for the legacy bare-array shape.
    pub version: Option<String>,
    pub timestamp: Option<String>,
    /// Raw entries; each should be a record string.
    pub entries: Vec<Value>,
}

/// Parse envelope JSON in either recognised shape.
///
/// # Errors
/// [`StegoError::EnvelopeMalformed`] if the text is not JSON, or is neither
/// an object with a `markers` array nor an array.
pub fn parse_contents(json: &str) -> Result<EnvelopeContents, StegoError> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| StegoError::EnvelopeMalformed(e.to_string()))?;

    match value {
        Value::Object(mut map) => {
            let entries = match map.remove(MARKERS_KEY) {
                Some(Value::Array(entries)) => entries,
                Some(_) => {
                    return Err(StegoError::EnvelopeMalformed(
                        "\"markers\" is not an array".to_string(),
                    ))
                }
                None => {
                    return Err(StegoError::EnvelopeMalformed(
                        "object has no \"markers\" array".to_string(),
                    ))
                }
            };
            let text_field = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
            Ok(EnvelopeContents {
                version: text_field("version"),
                timestamp: text_field("timestamp"),
                entries,
            })
        }
        Value::Array(entries) => Ok(EnvelopeContents {
            version: None,
            timestamp: None,
            entries,
        }),
        _ => Err(StegoError::EnvelopeMalformed(
            "expected an object or an array".to_string(),
        )),
    }
}

/// Find and parse the envelope held in a metadata field.
///
/// # Errors
/// - [`StegoError::EnvelopeNotFound`] if the field is blank, no locator
///   applies, or the envelope holds no entries.
/// - [`StegoError::EnvelopeMalformed`] if the located text does not parse.
pub fn extract_contents(field: &str) -> Result<EnvelopeContents, StegoError> {
    if field.trim().is_empty() {
        return Err(StegoError::EnvelopeNotFound);
    }
    let (locator, json) = locate(field).ok_or(StegoError::EnvelopeNotFound)?;
    debug!(?locator, len = json.len(), "envelope candidate located");

    let contents = parse_contents(json)?;
    if contents.entries.is_empty() {
        return Err(StegoError::EnvelopeNotFound);
    }
    match contents.version.as_deref() {
        None => debug!(entries = contents.entries.len(), "legacy marker array"),
        Some(ENVELOPE_VERSION) => debug!(entries = contents.entries.len(), "envelope found"),
        Some(other) => debug!(version = other, "envelope version differs, reading anyway"),
    }
    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records() -> Vec<String> {
        vec!["1|10|20|image|AQID".to_string(), "2|0|0|audio|AAAA".to_string()]
    }

    #[test]
    fn empty_build_is_nothing_to_save() {
        assert!(matches!(Envelope::build(vec![]), Err(StegoError::NothingToSave)));
    }

    #[test]
    fn json_shape() {
        let env = Envelope::with_timestamp(sample_records(), "2026-01-01T00:00:00.000Z".into())
            .unwrap();
        let json = env.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"version":"2.0","timestamp":"2026-01-01T00:00:00.000Z","markers":["1|10|20|image|AQID","2|0|0|audio|AAAA"]}"#
        );
    }

    #[test]
    fn timestamp_is_iso8601_utc() {
        let ts = timestamp_now();
        assert!(ts.ends_with('Z'), "{ts}");
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }

    #[test]
    fn locates_json_between_unrelated_text() {
        let env = Envelope::build(sample_records()).unwrap().to_json().unwrap();
        let field = format!("pdf, notes, {env} trailing words");
        let (locator, json) = locate(&field).unwrap();
        assert_eq!(locator, Locator::BraceSpan);
        assert_eq!(json, env);
        let contents = extract_contents(&field).unwrap();
        assert_eq!(contents.version.as_deref(), Some("2.0"));
        assert_eq!(contents.entries.len(), 2);
    }

    #[test]
    fn legacy_bare_array() {
        let field = r#"["1|10|20|image|AQID","2|0|0|audio|AAAA"]"#;
        let (locator, _) = locate(field).unwrap();
        assert_eq!(locator, Locator::BracketSpan);
        let contents = extract_contents(field).unwrap();
        assert_eq!(contents.version, None);
        assert_eq!(contents.entries.len(), 2);
    }

    #[test]
    fn markers_keyword_needs_parseable_field() {
        let field = r#"note "markers" without json"#;
        assert_eq!(locate(field).map(|(l, _)| l), Some(Locator::MarkersKeyword));
        assert!(matches!(
            extract_contents(field),
            Err(StegoError::EnvelopeMalformed(_))
        ));
    }

    #[test]
    fn unrelated_text_is_not_found() {
        assert!(locate("scanned by office printer").is_none());
        assert!(matches!(
            extract_contents("scanned by office printer"),
            Err(StegoError::EnvelopeNotFound)
        ));
        assert!(matches!(extract_contents("   "), Err(StegoError::EnvelopeNotFound)));
    }

    #[test]
    fn bracketed_free_text_is_not_an_envelope() {
        for field in ["Smith et al. [1], [2]", "tags: [draft] final", "see [1]", "[]"] {
            assert_eq!(Locator::BracketSpan.find(field), None, "{field}");
            assert!(
                matches!(extract_contents(field), Err(StegoError::EnvelopeNotFound)),
                "{field}"
            );
        }
    }

    #[test]
    fn bracketed_text_with_markers_keyword_still_reports_malformed() {
        let field = r#"see [1] and "markers""#;
        assert_eq!(locate(field).map(|(l, _)| l), Some(Locator::MarkersKeyword));
        assert!(matches!(
            extract_contents(field),
            Err(StegoError::EnvelopeMalformed(_))
        ));
    }

    #[test]
    fn reversed_braces_do_not_apply() {
        assert_eq!(Locator::BraceSpan.find("} then {"), None);
    }

    #[test]
    fn broken_json_is_malformed() {
        assert!(matches!(
            extract_contents(r#"{"version":"2.0","markers":["1|1|1|audio|AQID"}"#),
            Err(StegoError::EnvelopeMalformed(_))
        ));
    }

    #[test]
    fn object_without_markers_is_malformed() {
        assert!(matches!(
            extract_contents(r#"{"author":"someone"}"#),
            Err(StegoError::EnvelopeMalformed(_))
        ));
        assert!(matches!(
            extract_contents(r#"{"markers":"1|1|1|audio|AQID"}"#),
            Err(StegoError::EnvelopeMalformed(_))
        ));
    }

    #[test]
    fn empty_markers_is_not_found() {
        assert!(matches!(
            extract_contents(r#"{"version":"2.0","timestamp":"x","markers":[]}"#),
            Err(StegoError::EnvelopeNotFound)
        ));
    }

    #[test]
    fn envelope_deserializes() {
        let env = Envelope::build(sample_records()).unwrap();
        let back: Envelope = serde_json::from_str(&env.to_json().unwrap()).unwrap();
        assert_eq!(back, env);
    }
}
