/*
 * Copyright 2021 William Swartzendruber
 *
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */


use pgs::{
    decode_compositions,
    ts_to_timestamp,
    RasterImage,
};
use std::{
    fs::{create_dir_all, File},
    io::{stderr, stdin, BufReader, Read},
    path::{Path, PathBuf},
    process::exit,
};
use clap::{app_from_crate, crate_authors, crate_description, crate_name, crate_version, Arg};
use image::{save_buffer_with_format, ColorType, ImageFormat, ImageResult};
use tracing_subscriber::EnvFilter;

fn main() {

    let matches = app_from_crate!()
        .arg(Arg::with_name("prefix")
            .long("prefix")
            .short("p")
            .value_name("NAME")
            .help("Prefix of each image file name")
            .takes_value(true)
            .required(false)
            .default_value("subtitle")
            .validator(|value| {
                if !value.is_empty() && !value.contains(|c: char| c == '/' || c == '\\') {
                    Ok(())
                } else {
                    Err("must be a non-empty file name".to_string())
                }
            })
        )
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
        .arg(Arg::with_name("output")
            .index(2)
            .value_name("OUTPUT-DIR")
            .help("Directory to write PNG images to; created if missing")
            .required(true)
        )
        .after_help(format!("This utility will render every object of every PGS composition \
            to its own PNG image, named after the composition's presentation time in \
            milliseconds and the object's position within the composition.\n\n\
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

    let prefix = matches.value_of("prefix").unwrap_or("subtitle");
    let output_dir = Path::new(matches.value_of("output").unwrap_or("."));

    if let Err(err) = create_dir_all(output_dir) {
        tracing::error!(path = %output_dir.display(), error = %err, "could not create output directory");
        exit(1)
    }

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
    let mut written = 0_usize;
    let mut failures = 0_usize;

    for result in decode_compositions(input) {

        let composition = match result {
            Ok(composition) => composition,
            Err(err) => {
                tracing::error!(
                    error = ?err,
                    recoverable = err.leaves_stream_aligned(),
                    "could not decode composition"
                );
                failures += 1;
                continue
            }
        };

        tracing::info!(
            timestamp = %ts_to_timestamp(composition.pts),
            objects = composition.objects.len(),
            "rendering composition"
        );

        for (index, object) in composition.objects.iter().enumerate() {

            let image = object.render(&composition.palette);

            if image.width() == 0 || image.height() == 0 {
                tracing::warn!(object_id = object.object_id, "skipping empty object");
                continue
            }

            let path = output_dir.join(image_file_name(prefix, composition.pts, index));

            if let Err(err) = save_png(&path, &image) {
                tracing::error!(path = %path.display(), error = %err, "could not write image");
                exit(1)
            }

            written += 1;
        }
    }

    tracing::info!(written, failures, "finished");

    if failures > 0 {
        exit(1)
    }
}

fn image_file_name(prefix: &str, pts: u32, index: usize) -> PathBuf {
    PathBuf::from(format!("{}-{:010}-{:02}.png", prefix, pts / 90, index))
}

fn save_png(path: &Path, image: &RasterImage) -> ImageResult<()> {
    save_buffer_with_format(
        path,
        image.as_bytes(),
        image.width() as u32,
        image.height() as u32,
        ColorType::Rgba8,
        ImageFormat::Png,
    )
}
