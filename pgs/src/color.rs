/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Converts palette entries into RGBA colors.
//!
//! Palette entries are stored as HDTV-range YCbCr with a separate alpha channel. Conversion
//! uses the BT.709 coefficients with limited-range expansion:
//!
//! ```text
//! R = 1.1644 (Y - 16) + 1.596 (Cr - 128)
//! G = 1.1644 (Y - 16) - 0.813 (Cr - 128) - 0.391 (Cb - 128)
//! B = 1.1644 (Y - 16) + 2.018 (Cb - 128)
//! ```
//!
//! Each channel is rounded half away from zero and then clamped to `0..=255`.


use super::segment::{PaletteDefinitionSegment, PaletteEntry};

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Rgba {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Rgba {

    /// Fully transparent black, used wherever a color cannot be resolved.
    pub const TRANSPARENT: Rgba = Rgba { red: 0, green: 0, blue: 0, alpha: 0 };

    pub fn to_bytes(self) -> [u8; 4] {
        [self.red, self.green, self.blue, self.alpha]
    }
}

/// Resolves a single palette entry. Alpha passes through unchanged.
pub fn rgba_pixel(entry: &PaletteEntry) -> Rgba {

    let y = entry.y as f64 - 16.0;
    let cr = entry.cr as f64 - 128.0;
    let cb = entry.cb as f64 - 128.0;

    Rgba {
        red:   channel(1.1644 * y + 1.596 * cr),
        green: channel(1.1644 * y - 0.813 * cr - 0.391 * cb),
        blue:  channel(1.1644 * y + 2.018 * cb),
        alpha: entry.alpha,
    }
}

fn channel(value: f64) -> u8 {
    value.round().max(0.0).min(255.0) as u8
}

/// A fully resolved palette: one RGBA color per possible index.
///
/// Indices that no entry defines resolve to [`Rgba::TRANSPARENT`].
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Palette {
    colors: [Rgba; 256],
}

impl Palette {

    /// Resolves every entry. When an index appears more than once, the last entry wins.
    pub fn from_entries(entries: &[PaletteEntry]) -> Self {

        let mut colors = [Rgba::TRANSPARENT; 256];

        for entry in entries {
            colors[entry.id as usize] = rgba_pixel(entry);
        }

        Self { colors }
    }

    pub fn get(&self, index: u8) -> Rgba {
        self.colors[index as usize]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self { colors: [Rgba::TRANSPARENT; 256] }
    }
}

impl From<&PaletteDefinitionSegment> for Palette {
    fn from(pds: &PaletteDefinitionSegment) -> Self {
        Self::from_entries(&pds.entries)
    }
}
