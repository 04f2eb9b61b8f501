/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

use super::*;
use crate::{
    color::Rgba,
    segment::{CompositionObject, PaletteEntry, Segment, Sequence, WindowDefinitionSegment},
};
use rand::{thread_rng, Rng};
use std::collections::HashSet;

const WHITE: Rgba = Rgba { red: 255, green: 255, blue: 255, alpha: 255 };
const BLACK: Rgba = Rgba { red: 0, green: 0, blue: 0, alpha: 255 };

fn segment(payload: SegmentPayload) -> Segment {
    Segment { pts: 900, dts: 0, payload }
}

fn pcs(
    composition_state: CompositionState,
    palette_update: bool,
    palette_id: u8,
    object_ids: &[u16],
) -> Segment {

    let mut rng = thread_rng();

    segment(
        SegmentPayload::PresentationComposition(
            PresentationCompositionSegment {
                width: 1920,
                height: 1080,
                frame_rate: 0x10,
                composition_number: rng.gen(),
                composition_state,
                palette_update,
                palette_id,
                object_count: object_ids.len() as u8,
                composition_objects: object_ids.iter()
                    .map(|&object_id| {
                        CompositionObject {
                            object_id,
                            window_id: 0,
                            x: rng.gen(),
                            y: rng.gen(),
                            crop: None,
                        }
                    })
                    .collect(),
            }
        )
    )
}

fn pds(id: u8, version: u8, y: u8) -> Segment {
    segment(
        SegmentPayload::PaletteDefinition(
            PaletteDefinitionSegment {
                id,
                version,
                entries: vec![PaletteEntry { id: 1, y, cr: 128, cb: 128, alpha: 255 }],
            }
        )
    )
}

fn ods(id: u16, version: u8, width: u16, data: &[u8]) -> Segment {
    segment(
        SegmentPayload::ObjectDefinition(
            ObjectDefinitionSegment {
                id,
                version,
                sequence: Sequence::Single,
                width,
                height: 1,
                data: data.to_vec(),
            }
        )
    )
}

fn end() -> Segment {
    segment(SegmentPayload::End)
}

fn ds(segments: Vec<Segment>) -> DataSet {
    DataSet { segments }
}

fn epoch_start() -> DataSet {
    ds(vec![
        pcs(CompositionState::EpochStart, false, 0, &[1]),
        pds(0, 0, 235),
        ods(1, 0, 2, &[0x01, 0x01]),
        end(),
    ])
}

#[test]
fn test_epoch_start_resolves_composition() {

    let mut state = EpochState::new();
    let composition = state.process(&epoch_start()).unwrap().unwrap();

    assert_eq!(composition.pts, 900);
    assert_eq!(composition.state, CompositionState::EpochStart);
    assert_eq!(composition.width, 1920);
    assert_eq!(composition.height, 1080);
    assert_eq!(composition.palette_id, 0);
    assert_eq!(composition.objects.len(), 1);
    assert_eq!(composition.objects[0].object_id, 1);
    assert_eq!(composition.objects[0].data, vec![0x01, 0x01]);

    let images = composition.render();

    assert_eq!(images.len(), 1);
    assert_eq!(images[0].width(), 2);
    assert_eq!(images[0].height(), 1);
    assert_eq!(images[0].pixel(0, 0), Some(WHITE));
    assert_eq!(images[0].pixel(1, 0), Some(WHITE));
}

#[test]
fn test_no_objects_emits_nothing() {

    let mut state = EpochState::new();
    let data_set = ds(vec![
        pcs(CompositionState::EpochStart, false, 0, &[]),
        pds(0, 0, 235),
        end(),
    ]);

    assert_eq!(state.process(&data_set), Ok(None));
    assert!(state.palette(0).is_some());
}

#[test]
fn test_end_only_data_set_reemits_composition() {

    let mut state = EpochState::new();

    state.process(&epoch_start()).unwrap();

    let composition = state.process(&ds(vec![end()])).unwrap().unwrap();

    assert_eq!(composition.objects.len(), 1);
}

#[test]
fn test_epoch_start_clears_previous_epoch() {

    let mut state = EpochState::new();

    state.process(&epoch_start()).unwrap();

    let clear = ds(vec![pcs(CompositionState::EpochStart, false, 0, &[]), end()]);

    assert_eq!(state.process(&clear), Ok(None));
    assert!(state.palette(0).is_none());
    assert!(state.fragments(1).is_none());

    let normal = ds(vec![pcs(CompositionState::Normal, false, 0, &[1]), end()]);

    assert_eq!(
        state.process(&normal),
        Err(ResolveError::DanglingObjectReference { object_id: 1 }),
    );
}

#[test]
fn test_acquisition_point_clears_previous_epoch() {

    let mut state = EpochState::new();

    state.process(&epoch_start()).unwrap();

    let refresh = ds(vec![
        pcs(CompositionState::AcquisitionPoint, false, 0, &[1]),
        ods(1, 0, 1, &[0x01]),
        end(),
    ]);

    assert_eq!(
        state.process(&refresh),
        Err(ResolveError::DanglingPaletteReference { palette_id: 0 }),
    );
    assert_eq!(state.fragments(1).unwrap().len(), 1);
}

#[test]
fn test_reset_happens_before_any_segment() {

    let mut state = EpochState::new();

    state.process(&epoch_start()).unwrap();

    // The PDS precedes the resetting PCS but still belongs to the new epoch.
    let data_set = ds(vec![
        pds(3, 0, 16),
        ods(2, 0, 1, &[0x01]),
        pcs(CompositionState::EpochStart, false, 3, &[2]),
        end(),
    ]);
    let composition = state.process(&data_set).unwrap().unwrap();

    assert!(state.fragments(1).is_none());
    assert_eq!(composition.objects[0].object_id, 2);
    assert_eq!(composition.render()[0].pixel(0, 0), Some(BLACK));
}

#[test]
fn test_dangling_object_is_reported_before_dangling_palette() {

    let mut state = EpochState::new();
    let data_set = ds(vec![pcs(CompositionState::EpochStart, false, 9, &[4]), end()]);

    assert_eq!(
        state.process(&data_set),
        Err(ResolveError::DanglingObjectReference { object_id: 4 }),
    );
}

#[test]
fn test_failed_resolution_still_folds() {

    let mut state = EpochState::new();
    let data_set = ds(vec![
        pcs(CompositionState::EpochStart, false, 0, &[1]),
        ods(1, 0, 1, &[0x01]),
        end(),
    ]);

    assert!(state.process(&data_set).is_err());

    let palette = ds(vec![pds(0, 0, 235), end()]);
    let composition = state.process(&palette).unwrap().unwrap();

    assert_eq!(composition.render()[0].pixel(0, 0), Some(WHITE));
}

#[test]
fn test_same_version_fragments_concatenate_and_newer_version_replaces() {

    let mut state = EpochState::new();
    let data_set = ds(vec![
        pcs(CompositionState::EpochStart, false, 0, &[1]),
        pds(0, 0, 235),
        ods(1, 0, 4, &[0x01, 0x01]),
        ods(1, 0, 9, &[0x00, 0x02]),
        end(),
    ]);
    let composition = state.process(&data_set).unwrap().unwrap();

    assert_eq!(composition.objects[0].data, vec![0x01, 0x01, 0x00, 0x02]);
    assert_eq!(composition.objects[0].width, 4);

    let image = &composition.render()[0];

    assert_eq!(image.pixel(0, 0), Some(WHITE));
    assert_eq!(image.pixel(1, 0), Some(WHITE));
    assert_eq!(image.pixel(2, 0), Some(Rgba::TRANSPARENT));
    assert_eq!(image.pixel(3, 0), Some(Rgba::TRANSPARENT));

    let update = ds(vec![ods(1, 1, 1, &[0x01]), end()]);
    let composition = state.process(&update).unwrap().unwrap();

    assert_eq!(state.fragments(1).unwrap().len(), 1);
    assert_eq!(composition.objects[0].data, vec![0x01]);
    assert_eq!(composition.objects[0].width, 1);
}

#[test]
fn test_older_fragment_is_dropped() {

    let mut state = EpochState::new();
    let data_set = ds(vec![
        pcs(CompositionState::EpochStart, false, 0, &[1]),
        pds(0, 0, 235),
        ods(1, 5, 2, &[0x01, 0x01]),
        ods(1, 4, 2, &[0x00, 0x02]),
        end(),
    ]);
    let composition = state.process(&data_set).unwrap().unwrap();

    assert_eq!(state.fragments(1).unwrap().len(), 1);
    assert_eq!(composition.objects[0].data, vec![0x01, 0x01]);
}

#[test]
fn test_palette_versions() {

    let mut state = EpochState::new();

    state.fold(&ds(vec![pds(0, 1, 235), end()]));
    state.fold(&ds(vec![pds(0, 1, 16), pds(0, 0, 16), end()]));

    assert_eq!(state.palette(0).unwrap().version, 1);
    assert_eq!(state.palette(0).unwrap().entries[0].y, 235);

    state.fold(&ds(vec![pds(0, 2, 16), end()]));

    assert_eq!(state.palette(0).unwrap().version, 2);
    assert_eq!(state.palette(0).unwrap().entries[0].y, 16);
}

#[test]
fn test_palette_only_update_keeps_objects() {

    let mut state = EpochState::new();

    state.process(&epoch_start()).unwrap();

    let update = ds(vec![
        pcs(CompositionState::Normal, true, 1, &[]),
        pds(1, 0, 16),
        end(),
    ]);
    let composition = state.process(&update).unwrap().unwrap();

    assert_eq!(composition.palette_id, 1);
    assert_eq!(composition.objects.len(), 1);
    assert_eq!(composition.render()[0].pixel(0, 0), Some(BLACK));
}

#[test]
fn test_normal_update_replaces_objects() {

    let mut state = EpochState::new();
    let first = epoch_start();

    state.process(&first).unwrap();

    let update = ds(vec![
        pcs(CompositionState::Normal, false, 0, &[2, 1]),
        ods(2, 0, 1, &[0x01]),
        end(),
    ]);
    let composition = state.process(&update).unwrap().unwrap();

    // Everything but the palette and objects comes from the epoch start.
    assert_eq!(composition.state, CompositionState::EpochStart);
    assert_eq!(Some(composition.number), first.composition().map(|pcs| pcs.composition_number));
    assert_eq!(
        composition.objects.iter().map(|object| object.object_id).collect::<Vec<u16>>(),
        vec![2, 1],
    );

    let clear = ds(vec![pcs(CompositionState::Normal, false, 0, &[]), end()]);

    assert_eq!(state.process(&clear), Ok(None));
    assert_eq!(state.composition().object_count, 0);
    assert!(state.fragments(2).is_some());
}

#[test]
fn test_declared_count_decides_emission() {

    let mut state = EpochState::new();
    let mut data_set = epoch_start();

    if let SegmentPayload::PresentationComposition(pcs) = &mut data_set.segments[0].payload {
        pcs.object_count = 0;
    }

    assert_eq!(state.process(&data_set), Ok(None));

    if let SegmentPayload::PresentationComposition(pcs) = &mut data_set.segments[0].payload {
        pcs.object_count = 3;
        pcs.composition_objects.clear();
    }

    let composition = state.process(&data_set).unwrap().unwrap();

    assert!(composition.objects.is_empty());
    assert!(composition.render().is_empty());
}

#[test]
fn test_windows_accumulate_until_reset() {

    let mut state = EpochState::new();
    let window = |id| {
        segment(
            SegmentPayload::WindowDefinition(
                WindowDefinitionSegment {
                    windows: vec![WindowDefinition { id, x: 1, y: 2, width: 3, height: 4 }],
                }
            )
        )
    };
    let mut first = epoch_start();

    first.segments.insert(1, window(0));

    let composition = state.process(&first).unwrap().unwrap();

    assert_eq!(composition.windows.len(), 1);

    state.fold(&ds(vec![window(1), end()]));

    assert_eq!(state.windows().keys().copied().collect::<Vec<u8>>(), vec![0, 1]);

    state.fold(&ds(vec![pcs(CompositionState::EpochStart, false, 0, &[]), end()]));

    assert!(state.windows().is_empty());
}

#[test]
fn test_crop_is_carried_but_not_applied() {

    let mut state = EpochState::new();
    let mut data_set = epoch_start();

    if let SegmentPayload::PresentationComposition(pcs) = &mut data_set.segments[0].payload {
        pcs.composition_objects[0].crop = Some(Crop { x: 1, y: 0, width: 1, height: 1 });
    }

    let composition = state.process(&data_set).unwrap().unwrap();
    let image = &composition.render()[0];

    assert!(composition.objects[0].crop.is_some());
    assert_eq!(image.width(), 2);
    assert_eq!(image.pixel(0, 0), Some(WHITE));
}

#[test]
fn test_repeated_bitmaps_compare_equal() {

    let mut state = EpochState::new();
    let first = state.process(&epoch_start()).unwrap().unwrap();
    let second = state.process(&ds(vec![end()])).unwrap().unwrap();
    let bitmaps = first.objects.iter()
        .chain(second.objects.iter())
        .cloned()
        .collect::<HashSet<CompositionBitmap>>();

    assert_eq!(bitmaps.len(), 1);
}

#[test]
fn test_fold_accepts_hand_built_data_sets() {

    let mut state = EpochState::new();

    state.process(&epoch_start()).unwrap();

    // Nothing after the end segment is applied, including a resetting PCS.
    let trailing = ds(vec![
        end(),
        pcs(CompositionState::EpochStart, false, 0, &[]),
        pds(0, 1, 16),
    ]);
    let composition = state.process(&trailing).unwrap().unwrap();

    assert_eq!(state.palette(0).unwrap().version, 0);
    assert_eq!(composition.render()[0].pixel(0, 0), Some(WHITE));

    // Without an end segment every segment is applied.
    state.fold(&ds(vec![pds(0, 1, 16)]));

    assert_eq!(state.palette(0).unwrap().version, 1);

    let before = state.composition().clone();

    assert_eq!(state.process(&ds(vec![])).unwrap().map(|c| c.objects.len()), Some(1));
    assert_eq!(state.composition(), &before);
}
