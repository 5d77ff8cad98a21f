//! # Grayscale frame model

use crate::prelude::v1::*;
use bytemuck::{Pod, Zeroable};
use nalgebra as na;

/// RGBA colour structure.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct RGBA {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl RGBA {
    /// Convert from a slice containing `[r, g, b]` elements.
    pub fn from_rgb_slice(rgb: &[u8]) -> Self {
        Self {
            r: rgb[0],
            g: rgb[1],
            b: rgb[2],
            a: 255,
        }
    }

    /// Convert from a slice containing [r, g, b, a] elements.
    pub fn from_rgba_slice(rgba: &[u8]) -> Self {
        Self {
            r: rgba[0],
            g: rgba[1],
            b: rgba[2],
            a: rgba[3],
        }
    }

    /// BT.601 luma of the colour.
    pub fn luma(&self) -> u8 {
        ((77 * self.r as u32 + 150 * self.g as u32 + 29 * self.b as u32) >> 8) as u8
    }
}

/// Single grayscale video frame.
///
/// Frames are immutable once captured. Pixels are stored in row-major order, one byte of
/// luminance per pixel.
#[derive(Clone, Debug)]
pub struct Frame {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Frame {
    /// Create a frame from raw luma bytes.
    ///
    /// # Arguments
    ///
    /// * `width` - width of the frame.
    /// * `height` - height of the frame.
    /// * `data` - row-major luminance data of `width * height` length.
    pub fn from_luma(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        if data.len() != width * height {
            return Err(anyhow!(
                "luma buffer of {} bytes does not match {}x{} frame",
                data.len(),
                width,
                height
            ));
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Create a frame from packed RGBA pixels, converting to luma.
    pub fn from_rgba(width: usize, height: usize, rgba: &[RGBA]) -> Result<Self> {
        if rgba.len() != width * height {
            return Err(anyhow!(
                "{} RGBA pixels do not match {}x{} frame",
                rgba.len(),
                width,
                height
            ));
        }

        Ok(Self {
            width,
            height,
            data: rgba.iter().map(RGBA::luma).collect(),
        })
    }

    /// Create a frame from a packed RGBA byte buffer.
    pub fn from_rgba_bytes(width: usize, height: usize, bytes: &[u8]) -> Result<Self> {
        let rgba = bytemuck::try_cast_slice(bytes).map_err(|_| {
            anyhow!(
                "RGBA buffer of {} bytes is not a whole number of pixels",
                bytes.len()
            )
        })?;
        Self::from_rgba(width, height, rgba)
    }

    /// Get width of the frame.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Get height of the frame.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Get the raw luma data in row-major order.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Get the pixel value at integer coordinates.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates lie outside the frame.
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    /// Check whether a subpixel position lies within the frame.
    pub fn contains(&self, pos: na::Point2<f32>) -> bool {
        pos.x >= 0.0 && pos.y >= 0.0 && pos.x < self.width as f32 && pos.y < self.height as f32
    }
}
