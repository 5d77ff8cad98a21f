//! # Dominant motion estimation

use crate::prelude::v1::*;

/// Dominant ("camera") motion estimator.
pub trait MotionEstimator {
    /// Estimate the dominant displacement of one frame's correspondences.
    ///
    /// Produces the camera motion proxy, the per-point deviations from it, and a
    /// robust scale of those deviations. Estimation is stateless across frames.
    ///
    /// Passing an empty match result is a contract violation and yields an error; the
    /// orchestrating session skips estimation entirely when nothing was matched.
    fn estimate(&self, matches: &MatchResult) -> Result<MotionEstimate>;
}

/// Per-point inlier/outlier labelling.
pub trait OutlierClassifier {
    /// Label each point of an estimate as camera-consistent (`false`) or independently
    /// moving (`true`).
    ///
    /// The returned mask is parallel to the deviations of the estimate. Classification
    /// is per-frame; no hysteresis is applied across frames.
    fn classify(&self, estimate: &MotionEstimate) -> Vec<bool>;
}
