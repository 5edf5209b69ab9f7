// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Invisible text layer.
//!
//! Besides the keywords envelope, each marker can be drawn onto its page as
//! a run of zero-width text: one-point type, white, nearly transparent, at
//! the marker's position. The run holds the marker's record line followed by
//! a newline, zero-width encoded and split into chunks. Any PDF text
//! extractor that keeps the marks can then recover the records.
//!
//! This path is best effort. Tools that re-typeset or rasterize the PDF drop
//! the layer, which is why the envelope stays the primary store.

use tracing::warn;

use crate::stego::error::{RecordError, StegoError};
use crate::stego::record::{encode_marker, parse_marker};
use crate::stego::marker::Marker;
use crate::stego::registry::MarkerRegistry;
use crate::zw::{self, chunk};

/// Font size of hidden runs, in points.
pub const HIDDEN_FONT_SIZE: f64 = 1.0;

/// Fill opacity of hidden runs.
pub const HIDDEN_OPACITY: f64 = 0.01;

/// Ends each record inside the layer.
const LINE_END: char = '\n';

/// One run of invisible text to draw, in PDF user space.
#[derive(Debug, Clone, PartialEq)]
pub struct HiddenTextRun {
    pub page: u32,
    /// Points from the left edge.
    pub x: f64,
    /// Points from the bottom edge (baseline).
    pub y: f64,
    pub font_size: f64,
    pub opacity: f64,
    /// Zero-width marks only.
    pub carrier: String,
}

/// Lay out hidden runs for every marker in `registry`.
///
/// `page_heights[i]` is the height in points of page `i + 1`; `scale` is the
/// render scale marker positions refer to. Chunks of one marker are stacked
/// downward one font size apart.
///
/// # Errors
/// [`StegoError::InvalidMarker`] if a marker's page has no entry in
/// `page_heights`.
pub fn build_hidden_runs(
    registry: &MarkerRegistry,
    page_heights: &[f64],
    scale: f64,
    chunk_chars: usize,
) -> Result<Vec<HiddenTextRun>, StegoError> {
    let mut runs = Vec::new();
    for (_, marker) in registry.iter() {
        let height = page_heights
            .get(marker.page as usize - 1)
            .copied()
            .ok_or(StegoError::InvalidMarker("page has no known height"))?;
        let (x, y) = marker.position.to_pdf_space(height, scale);

        let mut line = encode_marker(marker);
        line.push(LINE_END);
        // Record lines are ASCII, so encoding cannot hit the range limit.
        let chunks = chunk::encode_chunked(&line, chunk_chars)?;
        for (i, carrier) in chunks.into_iter().enumerate() {
            runs.push(HiddenTextRun {
                page: marker.page,
                x,
                y: y - i as f64 * HIDDEN_FONT_SIZE,
                font_size: HIDDEN_FONT_SIZE,
                opacity: HIDDEN_OPACITY,
                carrier,
            });
        }
    }
    Ok(runs)
}

/// Recover markers from extracted page text, in reading order.
///
/// Visible glyphs are ignored. A run that fails to decode is reported once
/// and its text is dropped; the record it belonged to then fails to parse
/// and is reported too. Other records are unaffected.
pub fn recover_markers<'a, I>(texts: I) -> Vec<Result<Marker, RecordError>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut results = Vec::new();
    let mut decoded = String::new();
    for text in texts {
        let carrier = zw::extract_carrier(text);
        if carrier.is_empty() {
            continue;
        }
        match zw::decode(&carrier) {
            Ok(part) => decoded.push_str(&part),
            Err(e) => {
                warn!(error = %e, "dropping undecodable hidden text run");
                results.push(Err(RecordError::Carrier(e)));
            }
        }
    }

    results.extend(
        decoded
            .split(LINE_END)
            .filter(|line| !line.is_empty())
            .map(parse_marker),
    );
    results
}
