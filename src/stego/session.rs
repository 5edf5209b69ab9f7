// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Document session: the marker registry plus save and restore.
//!
//! Save turns every marker into a record and wraps them in one envelope
//! string, which the caller writes into the PDF keywords field in a single
//! replace. Restore reads that field back:
//!
//! 1. Locate and parse the envelope. Failure here restores nothing and is
//!    reported as [`RestoreStatus::NotFound`] or [`RestoreStatus::Malformed`].
//! 2. Decode every record on its own. A bad record is logged, listed in
//!    [`RestoreReport::skipped`], and does not affect the others.
//!
//! With the `parallel` feature the per-record work (gzip on save, payload
//! decoding on restore) runs on the rayon pool. Results keep input order.

use serde_json::Value;
use tracing::{debug, warn};

use crate::stego::envelope::{extract_contents, Envelope};
use crate::stego::error::{RecordError, StegoError};
use crate::stego::marker::{Marker, Position};
use crate::stego::record::{encode_marker, MarkerRecord};
use crate::stego::registry::{MarkerId, MarkerRegistry};

/// Runtime settings of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Page count of the open document. Records for pages beyond it are
    /// skipped on restore. `None` accepts any page.
    pub page_count: Option<u32>,
}

/// A record that was dropped during restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Position of the entry in the envelope's record list.
    pub index: usize,
    pub error: RecordError,
}

/// Overall outcome of reading a metadata field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreStatus {
    /// An envelope was found; see the counts for how many records survived.
    Restored,
    /// The field holds no hidden data.
    NotFound,
    /// An envelope candidate was found but did not parse.
    Malformed(String),
}

/// Result of a restore. Never an error: "no data" is a normal outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    pub status: RestoreStatus,
    /// Number of markers restored.
    pub restored: usize,
    pub skipped: Vec<SkippedRecord>,
}

impl RestoreReport {
    fn empty(status: RestoreStatus) -> Self {
        Self {
            status,
            restored: 0,
            skipped: Vec::new(),
        }
    }

    /// `true` if an envelope was found, even if every record was skipped.
    pub fn is_found(&self) -> bool {
        self.status == RestoreStatus::Restored
    }
}

/// Serialize markers to record lines, preserving order.
#[cfg(not(feature = "parallel"))]
pub fn encode_records(markers: &[&Marker]) -> Vec<String> {
    markers.iter().map(|m| encode_marker(m)).collect()
}

/// Serialize markers to record lines, preserving order.
#[cfg(feature = "parallel")]
pub fn encode_records(markers: &[&Marker]) -> Vec<String> {
    use rayon::prelude::*;
    markers.par_iter().map(|m| encode_marker(m)).collect()
}

/// Decode envelope entries to markers, one result per entry, in order.
#[cfg(not(feature = "parallel"))]
pub fn decode_records(entries: &[Value], page_count: Option<u32>) -> Vec<Result<Marker, RecordError>> {
    entries.iter().map(|e| decode_entry(e, page_count)).collect()
}

/// Decode envelope entries to markers, one result per entry, in order.
#[cfg(feature = "parallel")]
pub fn decode_records(entries: &[Value], page_count: Option<u32>) -> Vec<Result<Marker, RecordError>> {
    use rayon::prelude::*;
    entries.par_iter().map(|e| decode_entry(e, page_count)).collect()
}

fn decode_entry(entry: &Value, page_count: Option<u32>) -> Result<Marker, RecordError> {
    let line = entry.as_str().ok_or(RecordError::NotAString)?;
    let record = MarkerRecord::parse(line)?;
    if let Some(page_count) = page_count {
        if record.page > page_count {
            return Err(RecordError::PageOutOfRange {
                page: record.page,
                page_count,
            });
        }
    }
    record.into_marker()
}

/// Read the markers held in a metadata field without touching any session.
pub fn restore_markers(field: &str, page_count: Option<u32>) -> (Vec<Marker>, RestoreReport) {
    let contents = match extract_contents(field) {
        Ok(contents) => contents,
        Err(StegoError::EnvelopeMalformed(reason)) => {
            warn!(%reason, "marker envelope is malformed, nothing restored");
            return (Vec::new(), RestoreReport::empty(RestoreStatus::Malformed(reason)));
        }
        Err(e) => {
            debug!(error = %e, "no marker envelope in field");
            return (Vec::new(), RestoreReport::empty(RestoreStatus::NotFound));
        }
    };

    let mut markers = Vec::with_capacity(contents.entries.len());
    let mut report = RestoreReport::empty(RestoreStatus::Restored);
    for (index, result) in decode_records(&contents.entries, page_count)
        .into_iter()
        .enumerate()
    {
        match result {
            Ok(marker) => markers.push(marker),
            Err(error) => {
                warn!(index, %error, "skipping marker record");
                report.skipped.push(SkippedRecord { index, error });
            }
        }
    }
    report.restored = markers.len();
    debug!(
        restored = report.restored,
        skipped = report.skipped.len(),
        "marker restore finished"
    );
    (markers, report)
}

/// Owned state of one open document.
#[derive(Debug, Clone, Default)]
pub struct DocumentSession {
    registry: MarkerRegistry,
    config: SessionConfig,
}

impl DocumentSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            registry: MarkerRegistry::new(),
            config,
        }
    }

    /// Start a session for a freshly loaded document and restore whatever
    /// its keywords field holds.
    pub fn open(config: SessionConfig, keywords: &str) -> (Self, RestoreReport) {
        let mut session = Self::new(config);
        let report = session.restore(keywords);
        (session, report)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn registry(&self) -> &MarkerRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut MarkerRegistry {
        &mut self.registry
    }

    /// Add a marker. Rejects pages beyond the configured page count.
    pub fn add_marker(&mut self, marker: Marker) -> Result<MarkerId, StegoError> {
        if let Some(page_count) = self.config.page_count {
            if marker.page > page_count {
                return Err(StegoError::InvalidMarker("page is beyond the end of the document"));
            }
        }
        self.registry.add(marker)
    }

    pub fn move_marker(&mut self, id: MarkerId, position: Position) -> Result<(), StegoError> {
        self.registry.reposition(id, position)
    }

    pub fn remove_marker(&mut self, id: MarkerId) -> Option<Marker> {
        self.registry.remove(id)
    }

    /// Build the envelope for the current markers.
    ///
    /// # Errors
    /// [`StegoError::NothingToSave`] if there are no markers.
    pub fn envelope(&self) -> Result<Envelope, StegoError> {
        if self.registry.is_empty() {
            return Err(StegoError::NothingToSave);
        }
        let markers: Vec<&Marker> = self.registry.iter().map(|(_, m)| m).collect();
        Envelope::build(encode_records(&markers))
    }

    /// Serialize all markers to the string stored in the keywords field.
    ///
    /// # Errors
    /// [`StegoError::NothingToSave`] if there are no markers; the caller
    /// should leave the field untouched in that case.
    pub fn save(&self) -> Result<String, StegoError> {
        let json = self.envelope()?.to_json()?;
        debug!(markers = self.registry.len(), bytes = json.len(), "markers saved");
        Ok(json)
    }

    /// Restore markers from a keywords field and append them to the registry.
    ///
    /// Nothing is added unless an envelope is found and parses.
    pub fn restore(&mut self, keywords: &str) -> RestoreReport {
        let (markers, report) = restore_markers(keywords, self.config.page_count);
        for marker in markers {
            self.registry.push(marker);
        }
        report
    }
}
