// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Marker container layer.
//!
//! Turns a document's hidden annotations into the string stored in the PDF
//! keywords field, and back:
//!
//! ```text
//! Marker --payload--> Base64 --record--> "page|x|y|tag|data" --envelope--> JSON
//! ```
//!
//! - [`payload`]: gzip+Base64 for text, plain Base64 for image/audio.
//! - [`record`]: one `|`-separated line per marker.
//! - [`envelope`]: versioned JSON wrapper, located inside free text on read.
//! - [`registry`] / [`session`]: the in-memory marker set of an open document
//!   and its save/restore entry points.
//! - [`layer`]: optional invisible text runs drawn onto the pages.
//!
//! Restore tolerates the format's history: individual bad records are
//! skipped, and a missing or broken envelope means "no hidden data" rather
//! than an error.

pub mod envelope;
pub mod error;
pub mod layer;
pub mod marker;
pub mod payload;
pub mod record;
pub mod registry;
pub mod session;

pub use envelope::{Envelope, Locator, ENVELOPE_VERSION, LOCATORS};
pub use error::{RecordError, StegoError};
pub use layer::{build_hidden_runs, recover_markers, HiddenTextRun};
pub use marker::{DisplaySize, Marker, MarkerKind, Payload, Position, DEFAULT_IMAGE_SIZE, REFERENCE_SCALE};
pub use payload::{TextEncoding, TEXT_STRATEGIES};
pub use record::{encode_marker, parse_marker, EncodingTag, MarkerRecord};
pub use registry::{MarkerId, MarkerRegistry};
pub use session::{restore_markers, DocumentSession, RestoreReport, RestoreStatus, SessionConfig, SkippedRecord};
