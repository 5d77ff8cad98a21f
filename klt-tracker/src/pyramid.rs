//! # Multi-resolution grayscale pyramid

use moseg::prelude::v1::*;

/// Floating point grayscale image with clamped border access.
///
/// Intensities are normalised to `[0; 1]`. Out-of-bounds reads replicate the border
/// pixel, which keeps window operations well defined near the frame edge.
#[derive(Clone, Debug)]
pub struct GrayImage {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl GrayImage {
    /// Convert a frame to a normalised floating point image.
    pub fn from_frame(frame: &Frame) -> Self {
        Self {
            width: frame.width(),
            height: frame.height(),
            data: frame.as_slice().iter().map(|&v| v as f32 / 255.0).collect(),
        }
    }

    fn from_parts(width: usize, height: usize, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Get the pixel value at integer coordinates, replicating the border.
    pub fn get(&self, x: isize, y: isize) -> f32 {
        let x = x.clamp(0, self.width as isize - 1) as usize;
        let y = y.clamp(0, self.height as isize - 1) as usize;
        self.data[y * self.width + x]
    }

    /// Bilinearly interpolated value at subpixel coordinates.
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as isize, y0 as isize);

        let v00 = self.get(x0, y0);
        let v10 = self.get(x0 + 1, y0);
        let v01 = self.get(x0, y0 + 1);
        let v11 = self.get(x0 + 1, y0 + 1);

        (v00 * (1.0 - fx) + v10 * fx) * (1.0 - fy) + (v01 * (1.0 - fx) + v11 * fx) * fy
    }

    /// Central-difference spatial gradient at subpixel coordinates.
    pub fn gradient(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (self.sample(x + 1.0, y) - self.sample(x - 1.0, y)) * 0.5,
            (self.sample(x, y + 1.0) - self.sample(x, y - 1.0)) * 0.5,
        )
    }

    /// Whether the point lies within the image.
    pub fn in_bounds(&self, x: f32, y: f32) -> bool {
        x >= 0.0 && y >= 0.0 && x < self.width as f32 && y < self.height as f32
    }
}

/// Smooth with a 3x3 binomial kernel and drop every second row and column.
fn downsample(src: &GrayImage) -> GrayImage {
    let width = (src.width + 1) / 2;
    let height = (src.height + 1) / 2;
    let mut data = Vec::with_capacity(width * height);

    for y in 0..height {
        for x in 0..width {
            let (sx, sy) = (2 * x as isize, 2 * y as isize);
            let mut acc = 0.0;
            for (oy, wy) in [(-1, 1.0), (0, 2.0), (1, 1.0)] {
                for (ox, wx) in [(-1, 1.0), (0, 2.0), (1, 1.0)] {
                    acc += src.get(sx + ox, sy + oy) * wx * wy;
                }
            }
            data.push(acc / 16.0);
        }
    }

    GrayImage::from_parts(width, height, data)
}

/// Coarse-to-fine image pyramid.
///
/// Level 0 is full resolution; each further level halves both dimensions. Construction
/// stops early once a level would become too small to hold a tracking window.
pub struct Pyramid {
    levels: Vec<GrayImage>,
}

impl Pyramid {
    const MIN_DIM: usize = 8;

    /// Build a pyramid with up to `extra_levels` reduced levels.
    pub fn build(frame: &Frame, extra_levels: usize) -> Self {
        let mut levels = vec![GrayImage::from_frame(frame)];

        for i in 0..extra_levels {
            if levels[i].width() / 2 < Self::MIN_DIM || levels[i].height() / 2 < Self::MIN_DIM {
                break;
            }
            let next = downsample(&levels[i]);
            levels.push(next);
        }

        Self { levels }
    }

    pub fn levels(&self) -> &[GrayImage] {
        &self.levels
    }
}
