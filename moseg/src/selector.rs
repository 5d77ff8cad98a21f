//! # Feature selection

use crate::prelude::v1::*;
use nalgebra as na;

/// Trackable point selector.
pub trait FeatureSelector {
    /// Pick a bounded set of trackable point locations in a frame.
    ///
    /// Implementations detect locally distinctive, corner-like locations suitable for
    /// short-baseline tracking, spread across the frame. Fewer than `max_points`
    /// results is an ordinary outcome, not an error; a degenerate (uniform) frame
    /// yields an empty set. All returned points lie within frame bounds.
    ///
    /// # Arguments
    ///
    /// * `frame` - frame to select features in.
    /// * `max_points` - upper bound on the number of returned points.
    fn select(&self, frame: &Frame, max_points: usize) -> Result<Vec<na::Point2<f32>>>;
}
