/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Operates on individual segments.
//!
//! # Overview
//!
//! A segment is the most fundamental data structure within a PGS bitstream. Multiple segments
//! come together to form a data set (DS), which is always terminated by an end segment.
//!
//! Every segment begins with the same 13-byte header:
//!
//! | Field        | Size    | Notes                         |
//! |--------------|---------|-------------------------------|
//! | Magic        | 2 bytes | ASCII `"PG"`                  |
//! | PTS          | 4 bytes | 90 kHz ticks                  |
//! | DTS          | 4 bytes | 90 kHz ticks                  |
//! | Kind         | 1 byte  | see [`SegmentKind`]           |
//! | Payload size | 2 bytes | length of the following bytes |
//!
//! All multi-byte integers are big-endian.
//!
//! ## Presentation Composition Segment (PCS)
//!
//! A PCS defines the role of its DS within the larger epoch, the screen resolution, the
//! palette in use, and the placement of objects onto the screen.
//!
//! ## Window Definition Segment (WDS)
//!
//! A WDS defines the areas of the screen that will be used to show objects during the larger
//! epoch.
//!
//! ## Palette Definition Segment (PDS)
//!
//! A PDS contains a list of YCbCrA values with each one having a unique ID.
//!
//! ## Object Definition Segment (ODS)
//!
//! An ODS carries one fragment of a run-length encoded bitmap. Fragments sharing an object ID
//! and version are concatenated to form the complete bitmap.
//!
//! ## End Segment (ES)
//!
//! An ES signals that the current DS has come to an end.


mod segmentread;
mod segmentwrite;

pub use segmentread::*;
pub use segmentwrite::*;

use std::fmt::{Display, Formatter, Result as FmtResult};

/// The magic number every segment begins with (`"PG"`).
pub const MAGIC_NUMBER: u16 = 0x5047;

/// Represents a single PGS segment: its timestamps and its decoded payload.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Segment {
    /// The timestamp indicating when composition decoding should start. In practice, this is
    /// the time at which the composition is displayed. All segments within a DS typically have
    /// identical values here.
    pub pts: u32,
    /// The timestamp indicating when the composition should be displayed. In practice, this
    /// value is always zero.
    pub dts: u32,
    pub payload: SegmentPayload,
}

impl Segment {

    /// Returns the kind of this segment as declared on the wire.
    pub fn kind(&self) -> SegmentKind {
        self.payload.kind()
    }

    /// The PTS converted to milliseconds.
    pub fn pts_ms(&self) -> u32 {
        self.pts / 90
    }

    /// The DTS converted to milliseconds.
    pub fn dts_ms(&self) -> u32 {
        self.dts / 90
    }
}

/// The decoded payload of a segment, one variant per segment kind.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum SegmentPayload {
    /// Represents a Presentation Composition Segment (PCS).
    PresentationComposition(PresentationCompositionSegment),
    /// Represents a Window Definition Segment (WDS).
    WindowDefinition(WindowDefinitionSegment),
    /// Represents a Palette Definition Segment (PDS).
    PaletteDefinition(PaletteDefinitionSegment),
    /// Represents an Object Definition Segment (ODS).
    ObjectDefinition(ObjectDefinitionSegment),
    /// Represents an End Segment (ES).
    End,
}

impl SegmentPayload {

    pub fn kind(&self) -> SegmentKind {
        match self {
            SegmentPayload::PresentationComposition(_) => SegmentKind::PresentationComposition,
            SegmentPayload::WindowDefinition(_) => SegmentKind::WindowDefinition,
            SegmentPayload::PaletteDefinition(_) => SegmentKind::PaletteDefinition,
            SegmentPayload::ObjectDefinition(_) => SegmentKind::ObjectDefinition,
            SegmentPayload::End => SegmentKind::End,
        }
    }
}

/// Identifies the kind of a segment.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum SegmentKind {
    PaletteDefinition,
    ObjectDefinition,
    PresentationComposition,
    WindowDefinition,
    End,
}

impl SegmentKind {

    /// Maps a kind byte from the segment header.
    pub fn from_byte(value: u8) -> Option<Self> {
        match value {
            0x14 => Some(SegmentKind::PaletteDefinition),
            0x15 => Some(SegmentKind::ObjectDefinition),
            0x16 => Some(SegmentKind::PresentationComposition),
            0x17 => Some(SegmentKind::WindowDefinition),
            0x80 => Some(SegmentKind::End),
            _ => None,
        }
    }

    /// The kind byte written into the segment header.
    pub fn to_byte(self) -> u8 {
        match self {
            SegmentKind::PaletteDefinition => 0x14,
            SegmentKind::ObjectDefinition => 0x15,
            SegmentKind::PresentationComposition => 0x16,
            SegmentKind::WindowDefinition => 0x17,
            SegmentKind::End => 0x80,
        }
    }

    /// The smallest payload, in bytes, a segment of this kind may carry.
    pub fn min_payload_size(self) -> usize {
        match self {
            SegmentKind::PresentationComposition => 11,
            SegmentKind::ObjectDefinition => 11,
            SegmentKind::PaletteDefinition => 7,
            SegmentKind::WindowDefinition => 9,
            SegmentKind::End => 0,
        }
    }
}

impl Display for SegmentKind {

    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(
            match self {
                SegmentKind::PaletteDefinition => "PDS",
                SegmentKind::ObjectDefinition => "ODS",
                SegmentKind::PresentationComposition => "PCS",
                SegmentKind::WindowDefinition => "WDS",
                SegmentKind::End => "END",
            }
        )
    }
}

/// Defines the role of a PCS (and thereby the associated DS) within an epoch.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum CompositionState {
    /// Indicates that the associated PCS (and the DS it belongs to) defines the start of a new
    /// epoch. As such, the associated DS should contain all other segments necessary to render
    /// a composition onto the screen.
    EpochStart,
    /// Similar to `EpochStart`, except used to refresh the screen with the current composition.
    /// This allows a player to seek past an `EpochStart` and land in the middle of an epoch,
    /// while still being able to show the relevant composition once the `AcquisitionPoint` is
    /// encountered. Decoding treats it exactly like `EpochStart`.
    AcquisitionPoint,
    /// This updates the composition that is on the screen. This is typically used to clear the
    /// current composition from the screen by defining a PCS with no composition objects,
    /// thereby effectively closing out the current epoch. Palette-only updates and object
    /// substitution are also done this way.
    ///
    /// A state byte other than `0x00`, `0x40` or `0x80` is read as `Normal`.
    Normal,
}

impl CompositionState {

    /// Whether a PCS in this state discards everything accumulated in the current epoch.
    pub fn resets_epoch(self) -> bool {
        matches!(self, CompositionState::EpochStart | CompositionState::AcquisitionPoint)
    }
}

impl Default for CompositionState {
    fn default() -> Self { Self::EpochStart }
}

/// Defines this object's role in a possible multi-part object.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Sequence {
    /// This object is discrete and stands alone (both flags set).
    Single,
    /// This object is the first portion in a multi-part object.
    First,
    /// This object is neither the first nor the last portion (no flags set).
    Middle,
    /// This object is the last portion in a multi-part object.
    Last,
}

impl Sequence {

    /// Decodes the last-in-sequence flag byte. Only the two high bits are meaningful.
    pub fn from_flags(value: u8) -> Self {
        match (value & 0x80 != 0, value & 0x40 != 0) {
            (true, true) => Sequence::Single,
            (true, false) => Sequence::First,
            (false, true) => Sequence::Last,
            (false, false) => Sequence::Middle,
        }
    }

    pub fn to_flags(self) -> u8 {
        match self {
            Sequence::Single => 0xC0,
            Sequence::First => 0x80,
            Sequence::Middle => 0x00,
            Sequence::Last => 0x40,
        }
    }
}

impl Default for Sequence {
    fn default() -> Self { Self::Single }
}

/// Defines a Presentation Composition Segment (PCS).
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct PresentationCompositionSegment {
    /// The width of the display in pixels. This value should be consistent within a
    /// presentation.
    pub width: u16,
    /// The height of the display in pixels. This value should be consistent within a
    /// presentation.
    pub height: u16,
    /// This value should be set to `0x10` and can typically be ignored.
    pub frame_rate: u8,
    pub composition_number: u16,
    pub composition_state: CompositionState,
    /// Set when this PCS only switches the palette of the composition on screen.
    pub palette_update: bool,
    pub palette_id: u8,
    /// The object count as declared on the wire. This is what decides whether a composition
    /// is shown at all; it is not required to match `composition_objects.len()`.
    pub object_count: u8,
    pub composition_objects: Vec<CompositionObject>,
}

/// Places an object onto the screen.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct CompositionObject {
    pub object_id: u16,
    pub window_id: u8,
    pub x: u16,
    pub y: u16,
    /// Cropping rectangle, present when the cropped flag (`0x40`) is set. It is parsed but
    /// never applied when rendering.
    pub crop: Option<Crop>,
}

impl CompositionObject {

    pub fn is_cropped(&self) -> bool {
        self.crop.is_some()
    }
}

#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Crop {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct WindowDefinitionSegment {
    pub windows: Vec<WindowDefinition>,
}

#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct WindowDefinition {
    pub id: u8,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct PaletteDefinitionSegment {
    pub id: u8,
    pub version: u8,
    pub entries: Vec<PaletteEntry>,
}

/// A single YCbCrA color within a palette.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct PaletteEntry {
    pub id: u8,
    pub y: u8,
    pub cr: u8,
    pub cb: u8,
    pub alpha: u8,
}

/// Defines one fragment of an object.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct ObjectDefinitionSegment {
    pub id: u16,
    pub version: u8,
    pub sequence: Sequence,
    pub width: u16,
    pub height: u16,
    /// The run-length encoded bytes carried by this fragment.
    pub data: Vec<u8>,
}

impl ObjectDefinitionSegment {

    /// The value of the 3-byte object data length field, which counts the width and height
    /// fields along with the RLE bytes.
    pub fn data_length(&self) -> usize {
        self.data.len() + 4
    }
}
