/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Tracks the state of an epoch across data sets.
//!
//! # Overview
//!
//! An epoch begins with a data set whose PCS is an `EpochStart` (or an `AcquisitionPoint`,
//! which is treated the same way). Within an epoch, palettes and objects accumulate:
//!
//! - A palette is kept per ID. A later definition replaces it only when its version is
//!   strictly greater.
//! - An object is kept per ID as a list of fragments. A fragment with the same version as the
//!   stored ones is appended, a fragment with a greater version replaces them all, and a
//!   fragment with a lesser version is dropped.
//! - An `EpochStart` or `AcquisitionPoint` PCS replaces the composition outright. A `Normal`
//!   PCS always switches the palette, and unless it is a palette-only update it also
//!   replaces the composition objects.
//!
//! After each data set, a composition that declares at least one object is resolved against
//! the accumulated palettes and fragments.

#[cfg(test)]
mod tests;

use super::{
    color::Palette,
    dataset::DataSet,
    raster::RasterImage,
    rle,
    segment::{
        CompositionState,
        Crop,
        ObjectDefinitionSegment,
        PaletteDefinitionSegment,
        PresentationCompositionSegment,
        SegmentPayload,
        WindowDefinition,
    },
};
use std::collections::{btree_map::Entry, BTreeMap};
use thiserror::Error as ThisError;

/// A specialized [`Result`](std::result::Result) type for composition resolution.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// The error type for [`EpochState::process`].
#[derive(ThisError, Clone, Debug, Eq, PartialEq)]
pub enum ResolveError {
    /// The composition places an object that was never defined in this epoch.
    #[error("composition references undefined object {object_id}")]
    DanglingObjectReference {
        object_id: u16,
    },
    /// The composition uses a palette that was never defined in this epoch.
    #[error("composition references undefined palette {palette_id}")]
    DanglingPaletteReference {
        palette_id: u8,
    },
}

/// A composition resolved against the state of its epoch, ready to be rendered.
#[derive(Clone, Debug, PartialEq)]
pub struct Composition {
    /// The PTS of the data set that produced this composition.
    pub pts: u32,
    pub number: u16,
    pub state: CompositionState,
    /// The width of the display in pixels.
    pub width: u16,
    /// The height of the display in pixels.
    pub height: u16,
    pub palette_id: u8,
    pub palette: Palette,
    /// Every window defined so far in this epoch. Rendering does not use them.
    pub windows: BTreeMap<u8, WindowDefinition>,
    /// One entry per composition object, in composition order.
    pub objects: Vec<CompositionBitmap>,
}

impl Composition {

    /// Renders every object of this composition, in composition order.
    pub fn render(&self) -> Vec<RasterImage> {
        self.objects.iter().map(|object| object.render(&self.palette)).collect()
    }
}

/// An object placed by a composition, along with its complete RLE data.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct CompositionBitmap {
    pub object_id: u16,
    pub window_id: u8,
    pub x: u16,
    pub y: u16,
    /// Parsed from the composition but not applied when rendering.
    pub crop: Option<Crop>,
    /// Taken from the first fragment of the object.
    pub width: u16,
    /// Taken from the first fragment of the object.
    pub height: u16,
    /// The RLE data of every fragment, concatenated in arrival order.
    pub data: Vec<u8>,
}

impl CompositionBitmap {

    pub fn render(&self, palette: &Palette) -> RasterImage {
        rle::decode(&self.data, self.width, self.height, palette)
    }
}

/// The working state of a single decoding session.
#[derive(Clone, Debug, Default)]
pub struct EpochState {
    composition: PresentationCompositionSegment,
    palettes: BTreeMap<u8, PaletteDefinitionSegment>,
    objects: BTreeMap<u16, Vec<ObjectDefinitionSegment>>,
    windows: BTreeMap<u8, WindowDefinition>,
}

impl EpochState {

    pub fn new() -> Self {
        Self::default()
    }

    /// Discards everything accumulated in the current epoch.
    pub fn reset(&mut self) {
        self.composition = PresentationCompositionSegment::default();
        self.palettes.clear();
        self.objects.clear();
        self.windows.clear();
    }

    /// The composition currently in force.
    pub fn composition(&self) -> &PresentationCompositionSegment {
        &self.composition
    }

    pub fn palette(&self, id: u8) -> Option<&PaletteDefinitionSegment> {
        self.palettes.get(&id)
    }

    /// The fragments stored for an object, in arrival order.
    pub fn fragments(&self, object_id: u16) -> Option<&[ObjectDefinitionSegment]> {
        self.objects.get(&object_id).map(Vec::as_slice)
    }

    pub fn windows(&self) -> &BTreeMap<u8, WindowDefinition> {
        &self.windows
    }

    /// Folds a data set into the state and resolves the resulting composition.
    ///
    /// Returns `None` when the composition declares no objects. The data set is folded in
    /// even when resolution fails.
    pub fn process(&mut self, data_set: &DataSet) -> ResolveResult<Option<Composition>> {
        self.fold(data_set);
        self.resolve(data_set.pts().unwrap_or_default())
    }

    /// Applies every segment of a data set to the state, resetting it first if the data set
    /// begins a new epoch.
    ///
    /// Segments after the first end segment are ignored. A data set without one is folded in
    /// full, and an empty one changes nothing.
    pub fn fold(&mut self, data_set: &DataSet) {

        if data_set.resets_epoch() {
            tracing::debug!(pts = ?data_set.pts(), "resetting epoch");
            self.reset();
        }

        for segment in data_set.body() {

            tracing::trace!(pts = segment.pts, kind = %segment.kind(), "folding segment");

            match &segment.payload {
                SegmentPayload::WindowDefinition(wds) => {
                    for window in wds.windows.iter() {
                        self.windows.insert(window.id, window.clone());
                    }
                }
                SegmentPayload::PaletteDefinition(pds) => {
                    self.fold_palette(pds);
                }
                SegmentPayload::ObjectDefinition(ods) => {
                    self.fold_object(ods);
                }
                SegmentPayload::PresentationComposition(pcs) => {
                    self.fold_composition(pcs);
                }
                SegmentPayload::End => { }
            }
        }
    }

    fn fold_palette(&mut self, pds: &PaletteDefinitionSegment) {
        match self.palettes.entry(pds.id) {
            Entry::Vacant(entry) => {
                entry.insert(pds.clone());
            }
            Entry::Occupied(mut entry) => {
                if pds.version > entry.get().version {
                    entry.insert(pds.clone());
                }
            }
        }
    }

    fn fold_object(&mut self, ods: &ObjectDefinitionSegment) {
        match self.objects.entry(ods.id) {
            Entry::Vacant(entry) => {
                entry.insert(vec![ods.clone()]);
            }
            Entry::Occupied(mut entry) => {
                let fragments = entry.get_mut();
                let version = fragments.first().map(|fragment| fragment.version);
                match version {
                    Some(version) if ods.version == version => {
                        fragments.push(ods.clone());
                    }
                    Some(version) if ods.version < version => {
                        tracing::trace!(id = ods.id, version = ods.version, "dropping stale object");
                    }
                    _ => {
                        fragments.clear();
                        fragments.push(ods.clone());
                    }
                }
            }
        }
    }

    fn fold_composition(&mut self, pcs: &PresentationCompositionSegment) {

        if pcs.composition_state.resets_epoch() {
            self.composition = pcs.clone();
            return
        }

        self.composition.palette_id = pcs.palette_id;

        if pcs.palette_update {
            return
        }

        self.composition.object_count = pcs.object_count;
        self.composition.composition_objects = pcs.composition_objects.clone();
    }

    /// Resolves the composition currently in force.
    ///
    /// Returns `None` when the composition declares no objects.
    pub fn resolve(&self, pts: u32) -> ResolveResult<Option<Composition>> {

        if self.composition.object_count == 0 {
            return Ok(None)
        }

        let mut palette = None;
        let mut objects = Vec::with_capacity(self.composition.composition_objects.len());

        for comp_obj in self.composition.composition_objects.iter() {

            let fragments = self.objects.get(&comp_obj.object_id)
                .filter(|fragments| !fragments.is_empty())
                .ok_or(ResolveError::DanglingObjectReference { object_id: comp_obj.object_id })?;

            if palette.is_none() {
                palette = Some(self.resolve_palette()?);
            }

            objects.push(
                CompositionBitmap {
                    object_id: comp_obj.object_id,
                    window_id: comp_obj.window_id,
                    x: comp_obj.x,
                    y: comp_obj.y,
                    crop: comp_obj.crop.clone(),
                    width: fragments[0].width,
                    height: fragments[0].height,
                    data: fragments.iter()
                        .flat_map(|fragment| fragment.data.iter().copied())
                        .collect(),
                }
            );
        }

        tracing::debug!(
            pts,
            number = self.composition.composition_number,
            objects = objects.len(),
            "resolved composition"
        );

        Ok(
            Some(
                Composition {
                    pts,
                    number: self.composition.composition_number,
                    state: self.composition.composition_state,
                    width: self.composition.width,
                    height: self.composition.height,
                    palette_id: self.composition.palette_id,
                    palette: palette.unwrap_or_default(),
                    windows: self.windows.clone(),
                    objects,
                }
            )
        )
    }

    fn resolve_palette(&self) -> ResolveResult<Palette> {
        self.palettes.get(&self.composition.palette_id)
            .map(Palette::from)
            .ok_or(ResolveError::DanglingPaletteReference {
                palette_id: self.composition.palette_id,
            })
    }
}
