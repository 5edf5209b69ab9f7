// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Marker record wire format.
//!
//! One marker serializes to one `|`-separated line:
//!
//! ```text
//! page | x | y | tag | data [ | width | height ]
//! ```
//!
//! - `page`: 1-based page number.
//! - `x`, `y`: position rounded to whole pixels on write. Readers also accept
//!   fractional values, which older writers produced.
//! - `tag`: `ztext`, `image` or `audio` (see [`EncodingTag`]).
//! - `data`: Base64 payload (see [`crate::stego::payload`]).
//! - `width`, `height`: optional display size, image records only.
//!
//! Base64 never contains `|`, so the split is unambiguous.

use core::fmt;
use core::str::FromStr;

use tracing::debug;

use crate::stego::error::RecordError;
use crate::stego::marker::{DisplaySize, Marker, MarkerKind, Payload, Position};
use crate::stego::payload::{decode_binary, decode_text, encode_binary, encode_text, is_base64_class};

/// Field separator.
pub const FIELD_SEP: char = '|';

/// Mandatory field count.
pub const MIN_FIELDS: usize = 5;

/// Field count of an image record carrying a display size.
pub const SIZED_FIELDS: usize = 7;

/// How the data field of a record is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodingTag {
    /// Compressed text, Base64.
    ZText,
    /// Raw image bytes, Base64.
    Image,
    /// Raw audio bytes, Base64.
    Audio,
}

impl EncodingTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ZText => "ztext",
            Self::Image => "image",
            Self::Audio => "audio",
        }
    }

    /// Tag a writer uses for a marker of the given kind.
    pub fn for_kind(kind: MarkerKind) -> Self {
        match kind {
            MarkerKind::Text => Self::ZText,
            MarkerKind::Image => Self::Image,
            MarkerKind::Audio => Self::Audio,
        }
    }

    /// Marker kind a record with this tag restores to.
    pub fn kind(&self) -> MarkerKind {
        match self {
            Self::ZText => MarkerKind::Text,
            Self::Image => MarkerKind::Image,
            Self::Audio => MarkerKind::Audio,
        }
    }

    fn is_binary(&self) -> bool {
        !matches!(self, Self::ZText)
    }
}

impl FromStr for EncodingTag {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ztext" => Ok(Self::ZText),
            "image" => Ok(Self::Image),
            "audio" => Ok(Self::Audio),
            other => Err(RecordError::UnknownTag(other.to_string())),
        }
    }
}

impl fmt::Display for EncodingTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed (but not yet payload-decoded) marker record.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerRecord {
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub tag: EncodingTag,
    /// Base64 payload as it appears on the wire.
    pub data: String,
    /// Display size, image records only.
    pub size: Option<DisplaySize>,
}

impl MarkerRecord {
    /// Build the wire record for `marker`.
    ///
    /// Coordinates are rounded to whole pixels; sub-pixel precision is lost.
    /// Text is gzip-compressed here, which is the expensive part of a save.
    pub fn from_marker(marker: &Marker) -> Self {
        let (x, y) = marker.position.rounded();
        let (data, size) = match &marker.payload {
            Payload::Text(text) => (encode_text(text), None),
            Payload::Image { data, size } => (encode_binary(data), *size),
            Payload::Audio(data) => (encode_binary(data), None),
        };
        Self {
            page: marker.page,
            x: f64::from(x),
            y: f64::from(y),
            tag: EncodingTag::for_kind(marker.kind()),
            data,
            size,
        }
    }

    /// Parse one record line.
    ///
    /// Validates structure, page, coordinates, tag and (for binary tags) the
    /// Base64 character class. The payload itself is decoded by
    /// [`MarkerRecord::into_marker`].
    ///
    /// # Errors
    /// - [`RecordError::TooFewFields`] for fewer than 5 fields.
    /// - [`RecordError::InvalidPage`] unless the page is an integer >= 1.
    /// - [`RecordError::InvalidCoordinate`] for non-numeric, negative or
    ///   non-finite coordinates.
    /// - [`RecordError::UnknownTag`] for tags this reader does not know.
    /// - [`RecordError::InvalidBase64`] if an image/audio data field has
    ///   characters outside `[A-Za-z0-9+/=]`.
    pub fn parse(line: &str) -> Result<Self, RecordError> {
        let fields: Vec<&str> = line.split(FIELD_SEP).collect();
        if fields.len() < MIN_FIELDS {
            return Err(RecordError::TooFewFields(fields.len()));
        }

        let page = parse_page(fields[0])?;
        let x = parse_coordinate(fields[1])?;
        let y = parse_coordinate(fields[2])?;
        let tag: EncodingTag = fields[3].trim().parse()?;
        let data = fields[4].trim();

        if tag.is_binary() && !is_base64_class(data) {
            return Err(RecordError::InvalidBase64);
        }

        let size = if tag == EncodingTag::Image && fields.len() >= SIZED_FIELDS {
            parse_size(fields[5], fields[6])
        } else {
            None
        };

        Ok(Self {
            page,
            x,
            y,
            tag,
            data: data.to_string(),
            size,
        })
    }

    /// Decode the payload and produce the marker.
    ///
    /// # Errors
    /// Text payloads fail only if the data is not Base64. Binary payloads
    /// fail on bad Base64 or a zero-length result.
    pub fn into_marker(self) -> Result<Marker, RecordError> {
        let position = Position::new(self.x, self.y);
        let payload = match self.tag {
            EncodingTag::ZText => Payload::Text(decode_text(&self.data)?.text),
            EncodingTag::Image => Payload::Image {
                data: decode_binary(&self.data)?,
                size: self.size,
            },
            EncodingTag::Audio => Payload::Audio(decode_binary(&self.data)?),
        };
        Ok(Marker::new(self.page, position, payload))
    }
}

impl fmt::Display for MarkerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{FIELD_SEP}{}{FIELD_SEP}{}{FIELD_SEP}{}{FIELD_SEP}{}",
            self.page, self.x, self.y, self.tag, self.data
        )?;
        if let (EncodingTag::Image, Some(size)) = (self.tag, self.size) {
            write!(f, "{FIELD_SEP}{}{FIELD_SEP}{}", size.width, size.height)?;
        }
        Ok(())
    }
}

/// Serialize one marker to its wire line.
pub fn encode_marker(marker: &Marker) -> String {
    MarkerRecord::from_marker(marker).to_string()
}

/// Parse one wire line all the way to a marker.
pub fn parse_marker(line: &str) -> Result<Marker, RecordError> {
    MarkerRecord::parse(line)?.into_marker()
}

// Writers emit plain digits. Reading goes through `str::parse`, so
// surrounding whitespace, a leading `+` and (for coordinates) exponent or
// fraction forms are accepted as well.
fn parse_page(field: &str) -> Result<u32, RecordError> {
    match field.trim().parse::<u32>() {
        Ok(page) if page >= 1 => Ok(page),
        _ => Err(RecordError::InvalidPage(field.to_string())),
    }
}

fn parse_coordinate(field: &str) -> Result<f64, RecordError> {
    match field.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(RecordError::InvalidCoordinate(field.to_string())),
    }
}

/// Size is only a display hint; a bad one is dropped, not fatal.
fn parse_size(width: &str, height: &str) -> Option<DisplaySize> {
    match (width.trim().parse::<u32>(), height.trim().parse::<u32>()) {
        (Ok(width), Ok(height)) => Some(DisplaySize { width, height }),
        _ => {
            debug!(width, height, "ignoring unparsable image size");
            None
        }
    }
}
