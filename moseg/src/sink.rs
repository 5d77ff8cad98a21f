//! # Classified trajectory output

use crate::prelude::v1::*;

/// Consumer of per-frame classified trajectories.
///
/// Presentation collaborators (overlays, recorders, metrics) implement this. The
/// session only ever emits complete classifications: the outlier mask is always
/// parallel to the match result.
pub trait TrajectorySink {
    /// Consume one frame's classified trajectories.
    ///
    /// # Arguments
    ///
    /// * `frame_idx` - zero-based index of the frame tracked into.
    /// * `matches` - surviving correspondences of this frame.
    /// * `outlier_mask` - `true` where a point moves independently of the camera.
    fn emit(&mut self, frame_idx: usize, matches: &MatchResult, outlier_mask: &[bool])
        -> Result<()>;
}

/// Sink discarding everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl TrajectorySink for NullSink {
    fn emit(&mut self, _: usize, _: &MatchResult, _: &[bool]) -> Result<()> {
        Ok(())
    }
}
