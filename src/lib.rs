// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! # pdfnotes-core
//!
//! Steganographic notes for PDF documents. Text, images and audio clips are
//! pinned to positions on a page, stay invisible when the page is rendered,
//! and can be recovered from the file later.
//!
//! Two layers:
//!
//! - **Zero-width codec** (`zw` module): a reversible mapping from text (or
//!   Base64'd bytes) to a string of three invisible Unicode marks. Std only,
//!   plus Base64.
//! - **Marker container** (`stego` module): per-marker records, compressed
//!   where it pays off, packed in a versioned JSON envelope that is stored in
//!   the PDF keywords field and located again on load.
//!
//! This is obfuscation, not encryption. Anyone who decodes the envelope or
//! the zero-width runs reads the notes. PDF parsing and rendering are left
//! to the caller, which only has to read and write the keywords string.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use pdfnotes_core::{DocumentSession, Marker, Position, SessionConfig};
//!
//! let mut session = DocumentSession::new(SessionConfig::default());
//! session.add_marker(Marker::text(1, Position::new(120.0, 45.0), "secret")).unwrap();
//! let keywords = session.save().unwrap();
//!
//! let (_session, report) = DocumentSession::open(SessionConfig::default(), &keywords);
//! assert_eq!(report.restored, 1);
//! ```

pub mod stego;
pub mod zw;

pub use zw::{ZwError, Result as ZwResult};
pub use zw::chunk::DEFAULT_CHUNK_CHARS;
pub use stego::{DocumentSession, SessionConfig, RestoreReport, RestoreStatus, SkippedRecord, StegoError, RecordError};
pub use stego::{Marker, MarkerKind, Payload, Position, DisplaySize, MarkerId, MarkerRegistry};
pub use stego::{Envelope, MarkerRecord, EncodingTag, ENVELOPE_VERSION};
pub use stego::{build_hidden_runs, recover_markers, restore_markers, HiddenTextRun};
