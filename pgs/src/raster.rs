/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Pixel destinations for decoded objects.


use super::color::Rgba;

/// Something pixels can be painted onto.
///
/// Coordinates outside of the canvas are dropped, and both methods report how many pixels
/// actually landed.
pub trait Canvas {

    fn put_pixel(&mut self, x: usize, y: usize, color: Rgba) -> bool;

    /// Paints `length` pixels starting at `(x, y)` and extending to the right.
    fn put_run(&mut self, x: usize, y: usize, length: usize, color: Rgba) -> usize {
        (x..x.saturating_add(length))
            .filter(|&column| self.put_pixel(column, y, color))
            .count()
    }
}

/// A `width` by `height` RGBA raster, stored row by row with four bytes per pixel.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct RasterImage {
    width: u16,
    height: u16,
    pixels: Vec<u8>,
}

impl RasterImage {

    /// Creates a fully transparent raster.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        self.offset(x, y).map(|offset| {
            Rgba {
                red: self.pixels[offset],
                green: self.pixels[offset + 1],
                blue: self.pixels[offset + 2],
                alpha: self.pixels[offset + 3],
            }
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.pixels
    }

    fn offset(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.width as usize && y < self.height as usize {
            Some((y * self.width as usize + x) * 4)
        } else {
            None
        }
    }
}

impl Canvas for RasterImage {

    fn put_pixel(&mut self, x: usize, y: usize, color: Rgba) -> bool {
        match self.offset(x, y) {
            Some(offset) => {
                self.pixels[offset..offset + 4].copy_from_slice(&color.to_bytes());
                true
            }
            None => false,
        }
    }

    fn put_run(&mut self, x: usize, y: usize, length: usize, color: Rgba) -> usize {

        if y >= self.height as usize || x >= self.width as usize {
            return 0
        }

        let painted = length.min(self.width as usize - x);
        let start = (y * self.width as usize + x) * 4;
        let bytes = color.to_bytes();

        for pixel in self.pixels[start..start + painted * 4].chunks_exact_mut(4) {
            pixel.copy_from_slice(&bytes);
        }

        painted
    }
}
