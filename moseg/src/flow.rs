//! # Frame-to-frame flow tracking

use crate::prelude::v1::*;

/// Sparse optical flow tracker.
pub trait FlowTracker {
    /// Estimate the displaced location of each point in the next frame.
    ///
    /// Each input point independently either succeeds and appears in the result, or
    /// fails (insufficient local texture, or the point leaves the frame) and is
    /// dropped. The previous and current position of a point are always kept or
    /// dropped together, and the input order is preserved restricted to successes.
    ///
    /// # Arguments
    ///
    /// * `previous` - frame the points were located in.
    /// * `current` - frame to track into.
    /// * `points` - point set to track.
    fn track(&self, previous: &Frame, current: &Frame, points: &[TrackPoint])
        -> Result<MatchResult>;
}
