//! # Frame-sequential tracking session
//!
//! The session pulls frames from a [`FrameSource`], keeps the current point set and
//! previous frame, and drives the select/track/estimate/classify pipeline once per
//! frame. Classified trajectories are handed to a [`TrajectorySink`] collaborator.

use crate::prelude::v1::*;
use log::{debug, info, warn};
use nalgebra as na;
use std::sync::atomic::{AtomicBool, Ordering};

/// Orchestration parameters.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct SessionConfig {
    /// Upper bound on the tracked point set size.
    pub max_points: usize,
    /// Survivor count below which the point set is replaced by a fresh selection.
    pub reseed_threshold: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_points: 1000,
            reseed_threshold: 600,
        }
    }
}

impl Properties for SessionConfig {
    fn props_mut(&mut self) -> Vec<(&str, PropertyMut)> {
        vec![
            (
                "Max points",
                PropertyMut::usize(&mut self.max_points, 10, 10000),
            ),
            (
                "Reseed threshold",
                PropertyMut::usize(&mut self.reseed_threshold, 0, 10000),
            ),
        ]
    }
}

/// Outcome of a single session step.
#[derive(Clone, Debug)]
pub enum SessionStatus {
    /// Initial point set created; tracking starts with the next frame.
    Seeded(usize),
    /// The frame was too uniform to select any features; selection retries on the
    /// next frame.
    AwaitingFeatures,
    /// A frame was tracked and its classification emitted.
    Tracked {
        matched: usize,
        outliers: usize,
        dominant: na::Vector2<f32>,
    },
    /// Not a single point survived tracking; prior state was retained and no
    /// classification was emitted.
    Lost,
    /// The frame source is exhausted.
    Finished,
}

enum State {
    Uninitialized,
    Tracking {
        frame: Frame,
        points: Vec<TrackPoint>,
        survivors: usize,
    },
    Terminated,
}

/// Motion segmentation session over one frame stream.
///
/// States: `Uninitialized -> Tracking -> Terminated`. All per-frame products (match
/// result, estimate, mask) live only within one [`TrackingSession::step`] call.
pub struct TrackingSession<S, F, E, C> {
    source: Box<dyn FrameSource>,
    selector: S,
    flow: F,
    estimator: E,
    classifier: C,
    config: SessionConfig,
    state: State,
    frame_idx: usize,
    next_id: u64,
}

impl<S, F, E, C> TrackingSession<S, F, E, C>
where
    S: FeatureSelector,
    F: FlowTracker,
    E: MotionEstimator,
    C: OutlierClassifier,
{
    pub fn new(
        source: Box<dyn FrameSource>,
        selector: S,
        flow: F,
        estimator: E,
        classifier: C,
        config: SessionConfig,
    ) -> Self {
        Self {
            source,
            selector,
            flow,
            estimator,
            classifier,
            config,
            state: State::Uninitialized,
            frame_idx: 0,
            next_id: 0,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.state, State::Terminated)
    }

    /// Select a fresh point set and allocate identifiers for it.
    fn seed(
        selector: &S,
        next_id: &mut u64,
        frame: &Frame,
        max_points: usize,
    ) -> Result<Vec<TrackPoint>> {
        let selected = selector.select(frame, max_points)?;

        let points = selected
            .into_iter()
            .map(|pos| {
                let id = TrackId(*next_id);
                *next_id += 1;
                TrackPoint::new(id, pos)
            })
            .collect::<Vec<_>>();

        debug!("selected {} features", points.len());

        Ok(points)
    }

    /// Process a single frame of the stream.
    ///
    /// Pulls one frame and runs the full pipeline against it. Every classification
    /// emitted to `sink` is complete; the step never hands over partial data. An
    /// error from a collaborator propagates without disturbing the retained point
    /// set and previous frame, so a later step may still succeed; the pulled frame,
    /// however, is consumed.
    pub fn step(&mut self, sink: &mut dyn TrajectorySink) -> Result<SessionStatus> {
        if self.is_terminated() {
            return Ok(SessionStatus::Finished);
        }

        let frame = match self.source.next_frame()? {
            Some(frame) => frame,
            None => {
                info!("frame source exhausted after {} frames", self.frame_idx);
                self.state = State::Terminated;
                return Ok(SessionStatus::Finished);
            }
        };

        let idx = self.frame_idx;
        self.frame_idx += 1;

        match &mut self.state {
            State::Uninitialized => {
                let points =
                    Self::seed(&self.selector, &mut self.next_id, &frame, self.config.max_points)?;

                if points.is_empty() {
                    warn!("frame {} is degenerate, retrying selection next frame", idx);
                    return Ok(SessionStatus::AwaitingFeatures);
                }

                let survivors = points.len();
                self.state = State::Tracking {
                    frame,
                    points,
                    survivors,
                };
                Ok(SessionStatus::Seeded(survivors))
            }
            State::Tracking {
                frame: prev_frame,
                points,
                survivors,
            } => {
                // Re-seed on the frame being tracked *from*: the fresh points must
                // exist in the previous frame for the tracker to find them in this
                // one.
                if *survivors < self.config.reseed_threshold {
                    let fresh = Self::seed(
                        &self.selector,
                        &mut self.next_id,
                        prev_frame,
                        self.config.max_points,
                    )?;
                    if fresh.is_empty() {
                        warn!("re-seed found no features, keeping {} stale points", points.len());
                    } else {
                        debug!("re-seeded {} -> {} points", points.len(), fresh.len());
                        *points = fresh;
                    }
                }

                let matches = self.flow.track(prev_frame, &frame, points)?;

                if matches.is_empty() {
                    warn!("no correspondences in frame {}, retaining prior state", idx);
                    *survivors = 0;
                    return Ok(SessionStatus::Lost);
                }

                let estimate = self.estimator.estimate(&matches)?;
                let mask = self.classifier.classify(&estimate);
                debug_assert_eq!(mask.len(), matches.len());

                sink.emit(idx, &matches, &mask)?;

                let matched = matches.len();
                let outliers = mask.iter().filter(|&&o| o).count();
                let dominant = estimate.dominant;

                debug!(
                    "frame {}: {} matched, {} outliers, dominant ({:.3}, {:.3})",
                    idx, matched, outliers, dominant.x, dominant.y
                );

                self.state = State::Tracking {
                    frame,
                    points: matches.into_points(),
                    survivors: matched,
                };

                Ok(SessionStatus::Tracked {
                    matched,
                    outliers,
                    dominant,
                })
            }
            // Unreachable behind the guard at the top, but harmless to answer.
            State::Terminated => Ok(SessionStatus::Finished),
        }
    }

    /// Run the session until the source is exhausted or `stop` is raised.
    ///
    /// The stop flag is checked between frames only, so an in-flight classification
    /// is always fully emitted before the loop exits.
    pub fn run(&mut self, sink: &mut dyn TrajectorySink, stop: &AtomicBool) -> Result<()> {
        loop {
            if stop.load(Ordering::Relaxed) {
                info!("stop requested, ending session after {} frames", self.frame_idx);
                return Ok(());
            }

            if matches!(self.step(sink)?, SessionStatus::Finished) {
                return Ok(());
            }
        }
    }
}
