//! # Point tracks and match results

use nalgebra as na;
use std::fmt;

/// Pair containing coordinates and motion at them.
pub type FlowEntry = (na::Point2<f32>, na::Vector2<f32>);

/// Stable identifier of a tracked point.
///
/// Identifiers are allocated by the tracking session from a monotonically increasing
/// counter and survive as long as the point keeps tracking. Re-seeding allocates fresh
/// identifiers, so an id never refers to two different physical points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A tracked point: identity plus current image position.
#[derive(Clone, Copy, Debug)]
pub struct TrackPoint {
    pub id: TrackId,
    pub pos: na::Point2<f32>,
}

impl TrackPoint {
    pub fn new(id: TrackId, pos: na::Point2<f32>) -> Self {
        Self { id, pos }
    }
}

/// Successfully tracked correspondences between two consecutive frames.
///
/// Holds three parallel sequences. Index `i` of each refers to the same physical
/// point, and the order of the input point set is preserved restricted to successes.
/// The parallel layout is only ever mutated through [`MatchResult::push`], which keeps
/// the length invariant by construction.
#[derive(Clone, Debug, Default)]
pub struct MatchResult {
    ids: Vec<TrackId>,
    previous: Vec<na::Point2<f32>>,
    current: Vec<na::Point2<f32>>,
}

impl MatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
            previous: Vec::with_capacity(capacity),
            current: Vec::with_capacity(capacity),
        }
    }

    /// Append one successful correspondence.
    pub fn push(&mut self, id: TrackId, previous: na::Point2<f32>, current: na::Point2<f32>) {
        self.ids.push(id);
        self.previous.push(previous);
        self.current.push(current);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[TrackId] {
        &self.ids
    }

    pub fn previous(&self) -> &[na::Point2<f32>] {
        &self.previous
    }

    pub fn current(&self) -> &[na::Point2<f32>] {
        &self.current
    }

    /// Displacement of the point at the given index.
    pub fn motion(&self, idx: usize) -> na::Vector2<f32> {
        self.current[idx] - self.previous[idx]
    }

    /// Iterate correspondences as `(id, previous, current)` triples.
    pub fn iter(&self) -> impl Iterator<Item = (TrackId, na::Point2<f32>, na::Point2<f32>)> + '_ {
        self.ids
            .iter()
            .zip(self.previous.iter().zip(self.current.iter()))
            .map(|(&id, (&p, &c))| (id, p, c))
    }

    /// Iterate `FlowEntry` elements anchored at the previous position.
    pub fn motion_iter(&self) -> impl Iterator<Item = FlowEntry> + '_ {
        self.previous
            .iter()
            .zip(self.current.iter())
            .map(|(&p, &c)| (p, c - p))
    }

    /// Surviving points at their current positions, ready for the next iteration.
    pub fn into_points(self) -> Vec<TrackPoint> {
        self.ids
            .into_iter()
            .zip(self.current.into_iter())
            .map(|(id, pos)| TrackPoint::new(id, pos))
            .collect()
    }
}

/// Dominant motion estimate for one frame.
///
/// All fields are recomputed from scratch every frame; there is no temporal smoothing
/// of the camera motion proxy.
#[derive(Clone, Debug)]
pub struct MotionEstimate {
    /// Displacement shared by the majority of tracked points.
    pub dominant: na::Vector2<f32>,
    /// Robust spread (MAD) of per-point deviations from the dominant motion.
    pub scale: f32,
    /// Euclidean deviation of each motion vector from the dominant motion, parallel to
    /// the match result it was computed from.
    pub deviations: Vec<f32>,
}
