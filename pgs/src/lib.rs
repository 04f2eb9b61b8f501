/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Decodes Presentation Graphics Stream (PGS) subtitles, as found on Blu-ray discs, into
//! raster images.
//!
//! # Layers
//!
//! - [`segment`] reads and writes individual segments.
//! - [`dataset`] groups segments into data sets, each closed by an end segment.
//! - [`epoch`] folds data sets into the working state of an epoch and resolves the
//!   composition in force after each one.
//! - [`color`] and [`rle`] turn a resolved object and its palette into a [`RasterImage`].
//! - [`decode`] ties these together into lazy sequences over a whole stream.


pub mod color;
pub mod dataset;
pub mod decode;
pub mod epoch;
pub mod raster;
pub mod rle;
pub mod segment;

pub use decode::{
    decode_compositions,
    decode_data_sets,
    decode_data_sets_from_path,
    decode_images,
    decode_images_from_path,
    DecodeError,
    DecodeResult,
};
pub use raster::RasterImage;

/// Formats a 90 kHz timestamp as `HH:MM:SS.mmm`.
pub fn ts_to_timestamp(ts: u32) -> String {

    let ms = ts / 90;
    let h = ms / 3_600_000;
    let m = ms / 60_000 % 60;
    let s = ms / 1_000 % 60;

    format!("{:02}:{:02}:{:02}.{:03}", h, m, s, ms % 1_000)
}
