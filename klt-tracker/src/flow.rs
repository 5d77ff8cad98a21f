//! # Pyramidal Lucas-Kanade sparse flow

use crate::pyramid::{GrayImage, Pyramid};
use log::{debug, trace};
use moseg::prelude::v1::*;
use nalgebra as na;

/// Iterative coarse-to-fine patch alignment tracker.
///
/// For each input point the displacement is estimated at the coarsest pyramid level
/// and refined level by level with Gauss-Newton iterations over a fixed window.
/// Border pixels are replicated by the pyramid, so windows near the frame edge stay
/// usable; a point only fails when its center leaves the image, or when the local
/// structure tensor cannot resolve a displacement.
#[derive(Clone, Copy, Debug)]
pub struct PyrLkTracker {
    /// Number of reduced pyramid levels on top of full resolution.
    pub pyramid_levels: usize,
    /// Side length of the square alignment window, in pixels. Must be odd.
    pub window_size: usize,
    /// Iteration cap per pyramid level.
    pub max_iterations: usize,
    /// Subpixel displacement update below which iteration stops.
    pub epsilon: f32,
    /// Minimum eigenvalue of the window structure tensor for a point to count as
    /// trackable.
    pub min_eigenvalue: f32,
}

impl Default for PyrLkTracker {
    fn default() -> Self {
        Self {
            pyramid_levels: 2,
            window_size: 15,
            max_iterations: 10,
            epsilon: 0.03,
            min_eigenvalue: 1e-4,
        }
    }
}

impl Properties for PyrLkTracker {
    fn props_mut(&mut self) -> Vec<(&str, PropertyMut)> {
        vec![
            (
                "Pyramid levels",
                PropertyMut::usize(&mut self.pyramid_levels, 0, 6),
            ),
            (
                "Window size",
                PropertyMut::usize(&mut self.window_size, 5, 51),
            ),
            (
                "Max iterations",
                PropertyMut::usize(&mut self.max_iterations, 1, 100),
            ),
            ("Epsilon", PropertyMut::float(&mut self.epsilon, 0.001, 1.0)),
            (
                "Min eigenvalue",
                PropertyMut::float(&mut self.min_eigenvalue, 1e-6, 1.0),
            ),
        ]
    }
}

impl PyrLkTracker {
    /// Align a single point, returning its position in the current frame.
    fn track_point(
        &self,
        prev: &[GrayImage],
        curr: &[GrayImage],
        pos: na::Point2<f32>,
    ) -> Option<na::Point2<f32>> {
        let top = prev.len() - 1;
        let half = (self.window_size / 2) as isize;
        let eps_sq = self.epsilon * self.epsilon;

        let mut p = pos / (1 << top) as f32;
        let mut d = na::Vector2::zeros();

        for lvl in (0..=top).rev() {
            let prev_img = &prev[lvl];
            let curr_img = &curr[lvl];

            if lvl < top {
                p *= 2.0;
                d *= 2.0;
            }

            if !prev_img.in_bounds(p.x, p.y) {
                return None;
            }

            for _ in 0..self.max_iterations {
                if !curr_img.in_bounds(p.x + d.x, p.y + d.y) {
                    return None;
                }

                let mut ixx = 0.0;
                let mut iyy = 0.0;
                let mut ixy = 0.0;
                let mut bx = 0.0;
                let mut by = 0.0;

                for wy in -half..=half {
                    for wx in -half..=half {
                        let px = p.x + wx as f32;
                        let py = p.y + wy as f32;

                        let (gx, gy) = prev_img.gradient(px, py);
                        let it = curr_img.sample(px + d.x, py + d.y) - prev_img.sample(px, py);

                        ixx += gx * gx;
                        iyy += gy * gy;
                        ixy += gx * gy;
                        bx += gx * it;
                        by += gy * it;
                    }
                }

                let det = ixx * iyy - ixy * ixy;
                if det.abs() < 1e-7 {
                    return None;
                }

                let trace = ixx + iyy;
                let diff = ixx - iyy;
                let lambda_min = 0.5 * (trace - (diff * diff + 4.0 * ixy * ixy).sqrt());
                if lambda_min < self.min_eigenvalue {
                    return None;
                }

                let inv_det = 1.0 / det;
                let delta = na::Vector2::new(
                    inv_det * (ixy * by - iyy * bx),
                    inv_det * (ixy * bx - ixx * by),
                );

                d += delta;

                if delta.magnitude_squared() < eps_sq {
                    break;
                }
            }
        }

        let tracked = p + d;
        if prev[0].in_bounds(tracked.x, tracked.y) {
            Some(tracked)
        } else {
            None
        }
    }
}

impl FlowTracker for PyrLkTracker {
    fn track(
        &self,
        previous: &Frame,
        current: &Frame,
        points: &[TrackPoint],
    ) -> Result<MatchResult> {
        if previous.width() != current.width() || previous.height() != current.height() {
            return Err(anyhow!(
                "frame size changed mid-stream: {}x{} -> {}x{}",
                previous.width(),
                previous.height(),
                current.width(),
                current.height()
            ));
        }
        if self.window_size % 2 == 0 {
            return Err(anyhow!("window size {} must be odd", self.window_size));
        }

        let prev_pyr = Pyramid::build(previous, self.pyramid_levels);
        let curr_pyr = Pyramid::build(current, self.pyramid_levels);

        let mut matches = MatchResult::with_capacity(points.len());

        for point in points {
            match self.track_point(prev_pyr.levels(), curr_pyr.levels(), point.pos) {
                Some(tracked) => matches.push(point.id, point.pos, tracked),
                None => trace!("track {} lost at {}", point.id, point.pos),
            }
        }

        debug!("tracked {}/{} points", matches.len(), points.len());

        Ok(matches)
    }
}
