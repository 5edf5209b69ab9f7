// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Hidden annotation model.
//!
//! A [`Marker`] pins one payload (text, image or audio) to a point on a page.
//! Positions are stored in page-local pixels at [`REFERENCE_SCALE`]; the
//! viewer converts to and from its current zoom with [`Position::rescaled`].

use crate::stego::error::StegoError;

/// Render scale that stored coordinates refer to.
pub const REFERENCE_SCALE: f64 = 1.5;

/// Half the on-screen marker size. Zoom keeps the marker centre fixed.
pub const MARKER_RADIUS: f64 = 12.0;

pub(crate) const INVALID_POSITION: &str = "position must be finite and non-negative";

/// Size used to display an image marker that carries no size hint.
pub const DEFAULT_IMAGE_SIZE: DisplaySize = DisplaySize { width: 250, height: 250 };

/// Page-local position in pixels, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Nearest whole pixel, halves rounded away from zero.
    ///
    /// Callers validate first; negative or non-finite values saturate to 0.
    pub fn rounded(&self) -> (u32, u32) {
        (self.x.round() as u32, self.y.round() as u32)
    }

    /// Position after the page is zoomed by `ratio` (new scale / old scale).
    pub fn rescaled(&self, ratio: f64) -> Self {
        Self {
            x: (self.x + MARKER_RADIUS) * ratio - MARKER_RADIUS,
            y: (self.y + MARKER_RADIUS) * ratio - MARKER_RADIUS,
        }
    }

    /// Convert to PDF user space (points, origin bottom-left).
    ///
    /// `page_height` is in points; `scale` is the render scale the position
    /// was taken at.
    pub fn to_pdf_space(&self, page_height: f64, scale: f64) -> (f64, f64) {
        let x = self.x / scale;
        let y = page_height - self.y / scale;
        (x, y)
    }

    /// Finite and non-negative on both axes.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.x >= 0.0 && self.y >= 0.0
    }
}

/// Width/height hint for re-displaying an image marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySize {
    pub width: u32,
    pub height: u32,
}

/// Kind of a marker, and the tag name used on the wire for binary kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Text,
    Image,
    Audio,
}

impl MarkerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Audio => "audio",
        }
    }
}

/// Kind-specific hidden content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Image {
        data: Vec<u8>,
        size: Option<DisplaySize>,
    },
    Audio(Vec<u8>),
}

impl Payload {
    pub fn kind(&self) -> MarkerKind {
        match self {
            Self::Text(_) => MarkerKind::Text,
            Self::Image { .. } => MarkerKind::Image,
            Self::Audio(_) => MarkerKind::Audio,
        }
    }
}

/// One hidden annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// 1-based page number.
    pub page: u32,
    pub position: Position,
    pub payload: Payload,
}

impl Marker {
    pub fn new(page: u32, position: Position, payload: Payload) -> Self {
        Self { page, position, payload }
    }

    pub fn text(page: u32, position: Position, text: impl Into<String>) -> Self {
        Self::new(page, position, Payload::Text(text.into()))
    }

    pub fn image(page: u32, position: Position, data: Vec<u8>, size: Option<DisplaySize>) -> Self {
        Self::new(page, position, Payload::Image { data, size })
    }

    pub fn audio(page: u32, position: Position, data: Vec<u8>) -> Self {
        Self::new(page, position, Payload::Audio(data))
    }

    pub fn kind(&self) -> MarkerKind {
        self.payload.kind()
    }

    /// Display size for an image marker, falling back to [`DEFAULT_IMAGE_SIZE`].
    /// `None` for other kinds.
    pub fn display_size(&self) -> Option<DisplaySize> {
        match &self.payload {
            Payload::Image { size, .. } => Some(size.unwrap_or(DEFAULT_IMAGE_SIZE)),
            _ => None,
        }
    }

    /// Check the invariants a marker must hold before it is stored.
    ///
    /// # Errors
    /// [`StegoError::InvalidMarker`] if the page is 0 or the position is
    /// negative or not finite.
    pub fn validate(&self) -> Result<(), StegoError> {
        if self.page == 0 {
            return Err(StegoError::InvalidMarker("page numbers start at 1"));
        }
        if !self.position.is_valid() {
            return Err(StegoError::InvalidMarker(INVALID_POSITION));
        }
        Ok(())
    }
}
