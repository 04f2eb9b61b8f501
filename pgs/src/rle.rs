/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Decodes run-length encoded object data.
//!
//! Each line of an object is a series of codes:
//!
//! | Bytes                      | Meaning                                   |
//! |----------------------------|-------------------------------------------|
//! | `CCCCCCCC`                 | one pixel of color `C`                    |
//! | `00000000 00000000`        | end of line                               |
//! | `00000000 00LLLLLL`        | `L` pixels of color 0                     |
//! | `00000000 01LLLLLL LLLLLLLL` | `L` pixels of color 0                   |
//! | `00000000 10LLLLLL CCCCCCCC` | `L` pixels of color `C`                 |
//! | `00000000 11LLLLLL LLLLLLLL CCCCCCCC` | `L` pixels of color `C`        |


use super::{
    color::Palette,
    raster::{Canvas, RasterImage},
};

/// Decodes `data` into a fresh transparent raster of the given size.
///
/// Pixels that would land outside of the raster are dropped.
pub fn decode(data: &[u8], width: u16, height: u16, palette: &Palette) -> RasterImage {

    let mut image = RasterImage::new(width, height);
    let dropped = decode_into(data, palette, &mut image);

    if dropped > 0 {
        tracing::warn!(width, height, dropped, "object data paints outside of its raster");
    }

    image
}

/// Decodes `data` onto any canvas, starting at its top-left corner, and returns the number of
/// pixels the canvas refused.
///
/// Decoding ends with the data; an escape sequence cut short by the end of the data is
/// ignored.
pub fn decode_into<C: Canvas + ?Sized>(data: &[u8], palette: &Palette, canvas: &mut C) -> usize {

    let mut i = 0;
    let mut col = 0usize;
    let mut row = 0usize;
    let mut dropped = 0usize;

    while i < data.len() {

        if data[i] != 0 {
            if !canvas.put_pixel(col, row, palette.get(data[i])) {
                dropped += 1;
            }
            col += 1;
            i += 1;
            continue
        }

        let b = match data.get(i + 1) {
            Some(&b) => b,
            None => break,
        };

        if b == 0 {
            row += 1;
            col = 0;
            i += 2;
            continue
        }

        let low = (b & 0x3F) as usize;
        let (count, color, width) = match (b & 0x80 != 0, b & 0x40 != 0) {
            (false, false) => (low, 0, 2),
            (false, true) => match data.get(i + 2) {
                Some(&next) => (low << 8 | next as usize, 0, 3),
                None => break,
            },
            (true, false) => match data.get(i + 2) {
                Some(&color) => (low, color, 3),
                None => break,
            },
            (true, true) => match (data.get(i + 2), data.get(i + 3)) {
                (Some(&next), Some(&color)) => (low << 8 | next as usize, color, 4),
                _ => break,
            },
        };

        dropped += count - canvas.put_run(col, row, count, palette.get(color));
        col += count;
        i += width;
    }

    dropped
}
