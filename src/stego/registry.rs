// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! In-memory marker registry: markers grouped by page, in insertion order.

use std::collections::BTreeMap;

use crate::stego::error::StegoError;
use crate::stego::marker::{Marker, Position, INVALID_POSITION};

/// Address of a marker: its page and its index among that page's markers.
///
/// Indices shift down when an earlier marker on the same page is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId {
    pub page: u32,
    pub index: usize,
}

/// Ordered page -> markers mapping.
///
/// Iteration visits pages in ascending order and each page's markers in the
/// order they were added, which is also the record order of a saved envelope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerRegistry {
    pages: BTreeMap<u32, Vec<Marker>>,
}

impl MarkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append a marker to its page.
    pub fn add(&mut self, marker: Marker) -> Result<MarkerId, StegoError> {
        marker.validate()?;
        let page = marker.page;
        let markers = self.pages.entry(page).or_default();
        markers.push(marker);
        Ok(MarkerId {
            page,
            index: markers.len() - 1,
        })
    }

    /// Append a marker that is already known to be valid.
    pub(crate) fn push(&mut self, marker: Marker) {
        self.pages.entry(marker.page).or_default().push(marker);
    }

    pub fn get(&self, id: MarkerId) -> Option<&Marker> {
        self.pages.get(&id.page)?.get(id.index)
    }

    /// Move a marker (drag). Only the position changes.
    ///
    /// # Errors
    /// - [`StegoError::UnknownMarker`] if `id` does not exist.
    /// - [`StegoError::InvalidMarker`] if `position` is negative or not finite.
    pub fn reposition(&mut self, id: MarkerId, position: Position) -> Result<(), StegoError> {
        let marker = self
            .pages
            .get_mut(&id.page)
            .and_then(|markers| markers.get_mut(id.index))
            .ok_or(StegoError::UnknownMarker)?;
        if !position.is_valid() {
            return Err(StegoError::InvalidMarker(INVALID_POSITION));
        }
        marker.position = position;
        Ok(())
    }

    /// Remove and return a marker. Empty pages are dropped from the map.
    pub fn remove(&mut self, id: MarkerId) -> Option<Marker> {
        let markers = self.pages.get_mut(&id.page)?;
        if id.index >= markers.len() {
            return None;
        }
        let removed = markers.remove(id.index);
        if markers.is_empty() {
            self.pages.remove(&id.page);
        }
        Some(removed)
    }

    /// Markers on `page`, in insertion order.
    pub fn on_page(&self, page: u32) -> &[Marker] {
        self.pages.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Pages that have at least one marker, ascending.
    pub fn pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.keys().copied()
    }

    /// All markers, by page then insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (MarkerId, &Marker)> + '_ {
        self.pages.iter().flat_map(|(&page, markers)| {
            markers
                .iter()
                .enumerate()
                .map(move |(index, marker)| (MarkerId { page, index }, marker))
        })
    }

    pub fn len(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }
}
