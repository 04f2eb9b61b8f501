/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Groups segments into data sets.
//!
//! A data set (DS) is every segment from the one following the previous end segment up to
//! and including the next end segment. It is the unit the epoch state machine consumes.


mod datasetread;

pub use datasetread::*;

use super::segment::{PresentationCompositionSegment, Segment, SegmentKind, SegmentPayload};
use std::io::Cursor;

/// An ordered run of segments whose last (and only last) segment is an end segment.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct DataSet {
    /// The segments in stream order. Data sets read from a source always end with their one
    /// end segment; hand-built ones need not, and consumers accept any sequence.
    pub segments: Vec<Segment>,
}

impl DataSet {

    /// Reads the first data set found at the start of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> ReadResult<Self> {
        Cursor::new(bytes).read_data_set()
    }

    /// The PTS of the first segment.
    pub fn pts(&self) -> Option<u32> {
        self.segments.first().map(|segment| segment.pts)
    }

    /// The DTS of the first segment.
    pub fn dts(&self) -> Option<u32> {
        self.segments.first().map(|segment| segment.dts)
    }

    /// The segments up to (not including) the first end segment.
    pub fn body(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().take_while(|segment| segment.kind() != SegmentKind::End)
    }

    /// The first presentation composition segment of this data set, if any.
    pub fn composition(&self) -> Option<&PresentationCompositionSegment> {
        self.body().find_map(|segment| {
            match &segment.payload {
                SegmentPayload::PresentationComposition(pcs) => Some(pcs),
                _ => None,
            }
        })
    }

    /// Whether any PCS of this data set starts a new epoch or marks an acquisition point.
    pub fn resets_epoch(&self) -> bool {
        self.body().any(|segment| {
            match &segment.payload {
                SegmentPayload::PresentationComposition(pcs) => {
                    pcs.composition_state.resets_epoch()
                }
                _ => false,
            }
        })
    }
}
