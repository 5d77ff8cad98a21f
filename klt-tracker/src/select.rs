//! # Shi-Tomasi corner selection

use crate::pyramid::GrayImage;
use log::{debug, warn};
use moseg::prelude::v1::*;
use nalgebra as na;

/// Minimum-eigenvalue corner selector.
///
/// Scores every pixel by the smaller eigenvalue of the local gradient structure
/// tensor, keeps pixels above a quality threshold relative to the strongest response
/// in the frame, and accepts them strongest first subject to a minimum pairwise
/// separation.
#[derive(Clone, Copy, Debug)]
pub struct ShiTomasiSelector {
    /// Fraction of the strongest response a corner must reach to qualify.
    pub quality_level: f32,
    /// Minimum pixel distance between any two selected corners.
    pub min_distance: f32,
}

impl Default for ShiTomasiSelector {
    fn default() -> Self {
        Self {
            quality_level: 0.001,
            min_distance: 10.0,
        }
    }
}

impl Properties for ShiTomasiSelector {
    fn props_mut(&mut self) -> Vec<(&str, PropertyMut)> {
        vec![
            (
                "Quality level",
                PropertyMut::float(&mut self.quality_level, 0.0001, 0.5),
            ),
            (
                "Min distance",
                PropertyMut::float(&mut self.min_distance, 1.0, 100.0),
            ),
        ]
    }
}

/// Smaller eigenvalue of the 2x2 structure tensor.
fn min_eigenvalue(ixx: f32, iyy: f32, ixy: f32) -> f32 {
    let trace = ixx + iyy;
    let diff = ixx - iyy;
    0.5 * (trace - (diff * diff + 4.0 * ixy * ixy).sqrt())
}

impl ShiTomasiSelector {
    /// Corner response of every pixel, with a zeroed margin where the summation
    /// window does not fit.
    fn response_map(&self, img: &GrayImage) -> Vec<f32> {
        let (w, h) = (img.width(), img.height());

        let mut gx = vec![0.0f32; w * h];
        let mut gy = vec![0.0f32; w * h];
        for y in 0..h {
            for x in 0..w {
                let (dx, dy) = img.gradient(x as f32, y as f32);
                gx[y * w + x] = dx;
                gy[y * w + x] = dy;
            }
        }

        let mut response = vec![0.0f32; w * h];
        if w < 4 || h < 4 {
            return response;
        }

        for y in 2..h - 2 {
            for x in 2..w - 2 {
                let mut ixx = 0.0;
                let mut iyy = 0.0;
                let mut ixy = 0.0;
                for oy in 0..3 {
                    for ox in 0..3 {
                        let i = (y + oy - 1) * w + x + ox - 1;
                        ixx += gx[i] * gx[i];
                        iyy += gy[i] * gy[i];
                        ixy += gx[i] * gy[i];
                    }
                }
                response[y * w + x] = min_eigenvalue(ixx, iyy, ixy);
            }
        }

        response
    }
}

impl FeatureSelector for ShiTomasiSelector {
    fn select(&self, frame: &Frame, max_points: usize) -> Result<Vec<na::Point2<f32>>> {
        let img = GrayImage::from_frame(frame);
        let (w, h) = (img.width(), img.height());

        let response = self.response_map(&img);

        let strongest = response.iter().cloned().fold(0.0f32, f32::max);
        if strongest <= 0.0 {
            warn!("frame has no corner response, nothing to select");
            return Ok(vec![]);
        }

        let threshold = strongest * self.quality_level;

        let mut candidates = response
            .iter()
            .enumerate()
            .filter(|(_, &r)| r >= threshold)
            .map(|(i, &r)| (r, (i % w) as f32, (i / w) as f32))
            .collect::<Vec<_>>();
        candidates.sort_unstable_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        // Greedy strongest-first acceptance with a coarse occupancy grid, so the
        // separation check only looks at neighboring cells.
        let min_dist = self.min_distance.max(1.0);
        let cell = min_dist.ceil() as usize;
        let (cells_x, cells_y) = ((w + cell - 1) / cell, (h + cell - 1) / cell);
        let mut grid: Vec<Vec<na::Point2<f32>>> = vec![vec![]; cells_x * cells_y];

        let mut selected = Vec::new();

        for (_, x, y) in candidates {
            if selected.len() >= max_points {
                break;
            }

            let pos = na::Point2::new(x, y);
            let (cx, cy) = (x as usize / cell, y as usize / cell);

            let mut crowded = false;
            'scan: for oy in cy.saturating_sub(1)..=(cy + 1).min(cells_y - 1) {
                for ox in cx.saturating_sub(1)..=(cx + 1).min(cells_x - 1) {
                    for p in &grid[oy * cells_x + ox] {
                        if (pos - *p).magnitude() < min_dist {
                            crowded = true;
                            break 'scan;
                        }
                    }
                }
            }

            if !crowded {
                grid[cy * cells_x + cx].push(pos);
                selected.push(pos);
            }
        }

        debug!(
            "selected {}/{} corners (threshold {:.3e})",
            selected.len(),
            max_points,
            threshold
        );

        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Checkerboard with plenty of strong corners.
    fn checkerboard(w: usize, h: usize, square: usize) -> Frame {
        let data = (0..w * h)
            .map(|i| {
                let (x, y) = (i % w, i / w);
                if (x / square + y / square) % 2 == 0 {
                    220
                } else {
                    30
                }
            })
            .collect();
        Frame::from_luma(w, h, data).unwrap()
    }

    #[test]
    fn uniform_frame_selects_nothing() {
        let frame = Frame::from_luma(64, 64, vec![128; 64 * 64]).unwrap();
        let selector = ShiTomasiSelector::default();
        assert!(selector.select(&frame, 100).unwrap().is_empty());
    }

    #[test]
    fn never_exceeds_max_points() {
        let frame = checkerboard(128, 128, 8);
        let selector = ShiTomasiSelector {
            min_distance: 2.0,
            ..Default::default()
        };
        let points = selector.select(&frame, 17).unwrap();
        assert!(!points.is_empty());
        assert!(points.len() <= 17);
    }

    #[test]
    fn enforces_min_separation() {
        let frame = checkerboard(128, 128, 16);
        let selector = ShiTomasiSelector::default();
        let points = selector.select(&frame, 1000).unwrap();

        assert!(points.len() > 4);
        for (i, a) in points.iter().enumerate() {
            for b in points.iter().skip(i + 1) {
                assert!(
                    (a - b).magnitude() >= selector.min_distance,
                    "{} and {} are too close",
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn points_lie_within_frame() {
        let frame = checkerboard(96, 64, 12);
        let points = ShiTomasiSelector::default().select(&frame, 1000).unwrap();
        assert!(points.iter().all(|p| frame.contains(*p)));
    }

    #[test]
    fn picks_the_isolated_corner_first() {
        // Single bright square on a flat background: the strongest responses must
        // cluster around its corners.
        let (w, h) = (64, 64);
        let mut data = vec![20u8; w * h];
        for y in 24..40 {
            for x in 24..40 {
                data[y * w + x] = 230;
            }
        }
        let frame = Frame::from_luma(w, h, data).unwrap();

        let points = ShiTomasiSelector::default().select(&frame, 4).unwrap();
        assert!(!points.is_empty());
        for p in points {
            assert!(
                (22.0..=41.0).contains(&p.x) && (22.0..=41.0).contains(&p.y),
                "corner {} is far from the square",
                p
            );
        }
    }
}
