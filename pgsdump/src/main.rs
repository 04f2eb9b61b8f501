/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * Copyright 2021 William Swartzendruber
 *
 * SPDX-License-Identifier: MPL-2.0
 */

use pgs::{
    decode_data_sets,
    ts_to_timestamp,
    dataset::DataSet,
    epoch::EpochState,
    segment::{
        CompositionState,
        Segment,
        SegmentPayload,
        Sequence,
    },
};
use std::{
    fs::File,
    io::{stderr, stdin, BufReader, Read},
    process::exit,
};
use clap::{app_from_crate, crate_authors, crate_description, crate_name, crate_version, Arg};
use tracing_subscriber::EnvFilter;

fn main() {

    let matches = app_from_crate!()
        .arg(Arg::with_name("verbose")
            .long("verbose")
            .short("v")
            .help("Also logs epoch resets and resolved compositions")
            .required(false)
        )
        .arg(Arg::with_name("input")
            .index(1)
            .value_name("INPUT-FILE")
            .help("Input PGS file; use - for STDIN")
            .required(true)
        )
        .after_help(format!("This utility will dump PGS subtitle bitstream data, one data set \
            at a time.\n\n\
            Copyright © 2021 William Swartzendruber\n\
            Licensed under the Mozilla Public License 2.0\n\
            <{}>", env!("CARGO_PKG_REPOSITORY")).as_str())
        .get_matches();

    tracing_subscriber::fmt()
        .with_writer(stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new(if matches.is_present("verbose") { "debug" } else { "info" })
            })
        )
        .init();

    let input_value = matches.value_of("input").unwrap_or("-");
    let (mut stdin_read, mut file_read);
    let input = BufReader::<&mut dyn Read>::new(
        if input_value == "-" {
            stdin_read = stdin();
            &mut stdin_read
        } else {
            file_read = match File::open(input_value) {
                Ok(file) => file,
                Err(err) => {
                    tracing::error!(path = input_value, error = %err, "could not open input file");
                    exit(1)
                }
            };
            &mut file_read
        }
    );
    let mut state = EpochState::new();
    let mut count = 0_usize;
    let mut failures = 0_usize;

    tracing::info!("iterating through PGS data sets");

    for result in decode_data_sets(input) {
        match result {
            Ok(data_set) => {
                dump_data_set(&data_set);
                match state.process(&data_set) {
                    Ok(Some(composition)) => {
                        println!(
                            "  => composition {} places {} object(s)",
                            composition.number,
                            composition.objects.len(),
                        );
                    }
                    Ok(None) => { }
                    Err(err) => {
                        tracing::warn!(error = %err, "could not resolve composition");
                    }
                }
                println!();
                count += 1;
            }
            Err(err) => {
                tracing::error!(
                    error = ?err,
                    recoverable = err.leaves_stream_aligned(),
                    "could not read data set"
                );
                failures += 1;
            }
        }
    }

    tracing::info!(count, failures, "finished");

    if failures > 0 {
        exit(1)
    }
}

fn dump_data_set(data_set: &DataSet) {

    println!(
        "data_set({})",
        data_set.pts().map(ts_to_timestamp).unwrap_or_default(),
    );

    for segment in data_set.segments.iter() {
        dump_segment(segment);
    }
}

fn dump_segment(segment: &Segment) {

    let timestamp = ts_to_timestamp(segment.pts);

    match &segment.payload {
        SegmentPayload::PresentationComposition(pcs) => {
            println!("  presentation_composition_segment({})", timestamp);
            println!("    decode_timestamp = {}", ts_to_timestamp(segment.dts));
            println!("    video_width = {}", pcs.width);
            println!("    video_height = {}", pcs.height);
            println!("    frame_rate = {}", pcs.frame_rate);
            println!("    composition_number = {}", pcs.composition_number);
            println!("    composition_state = {}", match pcs.composition_state {
                CompositionState::EpochStart => "EPOCH_START",
                CompositionState::Normal => "NORMAL_CASE",
                CompositionState::AcquisitionPoint => "ACQUISITION_POINT",
            });
            println!("    palette_update_flag = {}", pcs.palette_update);
            println!("    palette_id = {}", pcs.palette_id);
            println!("    number_of_composition_objects = {}", pcs.object_count);
            for comp_obj in pcs.composition_objects.iter() {
                println!("    composition_object");
                println!("      object_id = {}", comp_obj.object_id);
                println!("      window_id = {}", comp_obj.window_id);
                println!("      object_horizontal_position = {}", comp_obj.x);
                println!("      object_vertical_position = {}", comp_obj.y);
                if let Some(crop) = &comp_obj.crop {
                    println!("      object_cropping_horizontal_position = {}", crop.x);
                    println!("      object_cropping_vertical_position = {}", crop.y);
                    println!("      object_cropping_width = {}", crop.width);
                    println!("      object_cropping_height = {}", crop.height);
                }
            }
        }
        SegmentPayload::WindowDefinition(wds) => {
            println!("  window_definition_segment({})", timestamp);
            for wd in wds.windows.iter() {
                println!("    window");
                println!("      window_id = {}", wd.id);
                println!("      window_horizontal_position = {}", wd.x);
                println!("      window_vertical_position = {}", wd.y);
                println!("      window_width = {}", wd.width);
                println!("      window_height = {}", wd.height);
            }
        }
        SegmentPayload::PaletteDefinition(pds) => {
            println!("  palette_definition_segment({})", timestamp);
            println!("    palette_id = {}", pds.id);
            println!("    palette_version = {}", pds.version);
            println!("    palette_entries = [{}]", pds.entries.len());
        }
        SegmentPayload::ObjectDefinition(ods) => {
            println!("  object_definition_segment({})", timestamp);
            println!("    object_id = {}", ods.id);
            println!("    object_version = {}", ods.version);
            println!("    sequence = {}", match ods.sequence {
                Sequence::Single => "FIRST_AND_LAST",
                Sequence::First => "FIRST",
                Sequence::Middle => "MIDDLE",
                Sequence::Last => "LAST",
            });
            println!("    object_data_length = {}", ods.data_length());
            println!("    object_width = {}", ods.width);
            println!("    object_height = {}", ods.height);
            println!("    object_data = [{}]", ods.data.len());
        }
        SegmentPayload::End => {
            println!("  end_segment({})", timestamp);
        }
    }
}
