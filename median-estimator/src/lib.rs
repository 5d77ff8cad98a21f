//! # Robust dominant-motion estimation via medians.
//!
//! The dominant ("camera") motion of a frame is taken as the coordinate-wise median
//! of all point displacements, and the spread of deviations from it as their median
//! absolute deviation (MAD). Both statistics stay stable with up to about half the
//! points moving independently, which is exactly the regime where a mean and standard
//! deviation would be dragged toward the moving objects.
//!
//! Classification is a modified z-score test against the MAD, one frame at a time.

use log::debug;
use moseg::prelude::v1::*;
use nalgebra as na;

/// Median of a set of samples.
///
/// Even-length inputs average the two middle elements. The input order is not
/// preserved.
fn median(values: &mut [f32]) -> f32 {
    debug_assert!(!values.is_empty());

    values.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) * 0.5
    } else {
        values[mid]
    }
}

/// Coordinate-wise-median dominant motion estimator.
///
/// Stateless: every frame is estimated from scratch, with no smoothing of the camera
/// motion proxy across frames.
#[derive(Clone, Copy, Debug, Default)]
pub struct MedianEstimator;

impl Properties for MedianEstimator {}

impl MotionEstimator for MedianEstimator {
    fn estimate(&self, matches: &MatchResult) -> Result<MotionEstimate> {
        if matches.is_empty() {
            return Err(anyhow!("cannot estimate dominant motion without correspondences"));
        }

        let mut xs = Vec::with_capacity(matches.len());
        let mut ys = Vec::with_capacity(matches.len());
        for (_, motion) in matches.motion_iter() {
            xs.push(motion.x);
            ys.push(motion.y);
        }

        let dominant = na::Vector2::new(median(&mut xs), median(&mut ys));

        let deviations = matches
            .motion_iter()
            .map(|(_, motion)| (motion - dominant).magnitude())
            .collect::<Vec<_>>();

        let center = median(&mut deviations.clone());
        let mut spread = deviations.iter().map(|d| (d - center).abs()).collect::<Vec<_>>();
        let scale = median(&mut spread);

        debug!(
            "dominant ({:.3}, {:.3}), deviation median {:.3}, MAD {:.3}",
            dominant.x, dominant.y, center, scale
        );

        Ok(MotionEstimate {
            dominant,
            scale,
            deviations,
        })
    }
}

/// MAD-based modified z-score classifier.
///
/// A point is an outlier iff its deviation strictly exceeds `z_threshold` times the
/// robust scale. The comparison multiplies instead of dividing, so a zero MAD needs
/// no special case: a perfectly agreeing majority flags exactly the points that
/// deviate from it at all, and with every deviation at zero nothing is flagged.
#[derive(Clone, Copy, Debug)]
pub struct MadClassifier {
    /// Modified z-score threshold.
    pub z_threshold: f32,
}

impl Default for MadClassifier {
    fn default() -> Self {
        Self { z_threshold: 5.0 }
    }
}

impl Properties for MadClassifier {
    fn props_mut(&mut self) -> Vec<(&str, PropertyMut)> {
        vec![(
            "Z threshold",
            PropertyMut::float(&mut self.z_threshold, 1.0, 20.0),
        )]
    }
}

impl OutlierClassifier for MadClassifier {
    fn classify(&self, estimate: &MotionEstimate) -> Vec<bool> {
        let cutoff = self.z_threshold * estimate.scale;
        estimate.deviations.iter().map(|&d| d > cutoff).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn matches_from(motions: &[na::Vector2<f32>]) -> MatchResult {
        let mut matches = MatchResult::new();
        for (i, m) in motions.iter().enumerate() {
            let prev = na::Point2::new((i % 10) as f32 * 12.0, (i / 10) as f32 * 12.0);
            matches.push(TrackId(i as u64), prev, prev + m);
        }
        matches
    }

    #[test]
    fn median_averages_even_lengths() {
        assert_approx_eq!(median(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_approx_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_approx_eq!(median(&mut [1.0]), 1.0);
    }

    #[test]
    fn empty_matches_are_rejected() {
        assert!(MedianEstimator.estimate(&MatchResult::new()).is_err());
    }

    #[test]
    fn uniform_motion_has_zero_scale_and_no_outliers() {
        let motions = vec![na::Vector2::new(1.5, -0.5); 40];
        let estimate = MedianEstimator.estimate(&matches_from(&motions)).unwrap();

        assert_approx_eq!(estimate.dominant.x, 1.5);
        assert_approx_eq!(estimate.dominant.y, -0.5);
        assert_approx_eq!(estimate.scale, 0.0);

        let mask = MadClassifier::default().classify(&estimate);
        assert_eq!(mask.len(), 40);
        assert!(mask.iter().all(|&o| !o));
    }

    #[test]
    fn minority_of_movers_is_flagged() {
        // 50 points carried by the camera, 3 moving on their own. The camera jitter
        // magnitudes form two clusters, keeping the MAD a usable yardstick well
        // above a fifth of the largest background deviation.
        let rng = &mut StdRng::seed_from_u64(11);
        let mut motions = (0..50)
            .map(|i| {
                let r = if i % 2 == 0 {
                    rng.gen_range(0.0..0.02)
                } else {
                    rng.gen_range(0.08..0.1)
                };
                let theta = rng.gen_range(0.0..std::f32::consts::TAU);
                na::Vector2::new(2.0 + r * theta.cos(), r * theta.sin())
            })
            .collect::<Vec<_>>();
        motions.extend(std::iter::repeat(na::Vector2::new(2.0, 20.0)).take(3));

        let estimate = MedianEstimator.estimate(&matches_from(&motions)).unwrap();
        assert_approx_eq!(estimate.dominant.x, 2.0, 0.05);
        assert_approx_eq!(estimate.dominant.y, 0.0, 0.05);

        let mask = MadClassifier::default().classify(&estimate);
        assert_eq!(mask.len(), 53);
        assert!(mask[..50].iter().all(|&o| !o), "camera points misclassified");
        assert!(mask[50..].iter().all(|&o| o), "independent movers missed");
    }

    #[test]
    fn single_far_point_is_the_only_outlier() {
        let rng = &mut StdRng::seed_from_u64(7);
        let mut motions = (0..30)
            .map(|i| {
                let r = if i % 2 == 0 {
                    rng.gen_range(0.0..0.02)
                } else {
                    rng.gen_range(0.08..0.1)
                };
                let theta = rng.gen_range(0.0..std::f32::consts::TAU);
                na::Vector2::new(-1.0 + r * theta.cos(), 3.0 + r * theta.sin())
            })
            .collect::<Vec<_>>();
        motions[17] = na::Vector2::new(-1.0, 15.0);

        let estimate = MedianEstimator.estimate(&matches_from(&motions)).unwrap();
        let mask = MadClassifier::default().classify(&estimate);

        for (i, &o) in mask.iter().enumerate() {
            assert_eq!(o, i == 17, "wrong label at {}", i);
        }
    }

    #[test]
    fn agreeing_majority_with_zero_spread_still_flags_movers() {
        // 50 points carried exactly by the camera, 3 moving on their own. Both the
        // deviation median and the MAD collapse to zero, and the flagged set must
        // still be exactly the 3 movers.
        let mut motions = vec![na::Vector2::new(2.0, 0.0); 50];
        motions.extend(std::iter::repeat(na::Vector2::new(2.0, 20.0)).take(3));

        let estimate = MedianEstimator.estimate(&matches_from(&motions)).unwrap();
        assert_approx_eq!(estimate.dominant.x, 2.0);
        assert_approx_eq!(estimate.dominant.y, 0.0);
        assert_approx_eq!(estimate.scale, 0.0);

        let mask = MadClassifier::default().classify(&estimate);
        assert_eq!(mask.len(), 53);
        assert!(mask[..50].iter().all(|&o| !o), "camera points misclassified");
        assert!(mask[50..].iter().all(|&o| o), "independent movers missed");
    }

    #[test]
    fn mad_survives_half_outliers_where_stddev_would_not() {
        // 14 still points, 10 movers: the median and MAD must stick with the majority.
        let mut motions = vec![na::Vector2::new(0.0, 0.0); 14];
        motions.extend(std::iter::repeat(na::Vector2::new(8.0, 8.0)).take(10));

        let estimate = MedianEstimator.estimate(&matches_from(&motions)).unwrap();
        assert_approx_eq!(estimate.dominant.x, 0.0);
        assert_approx_eq!(estimate.dominant.y, 0.0);
        // Majority deviation is 0, so the MAD stays 0 despite 40% outliers.
        assert_approx_eq!(estimate.scale, 0.0);

        let mask = MadClassifier::default().classify(&estimate);
        assert!(mask[..14].iter().all(|&o| !o));
        assert!(mask[14..].iter().all(|&o| o));
    }

    mod pipeline {
        //! End-to-end checks through selection, tracking and classification.

        use super::*;
        use klt_tracker::{PyrLkTracker, ShiTomasiSelector};

        fn wavy(w: usize, h: usize, dx: f32, dy: f32) -> Frame {
            let data = (0..w * h)
                .map(|i| {
                    let x = (i % w) as f32 - dx;
                    let y = (i / w) as f32 - dy;
                    let v = 128.0
                        + 55.0 * (0.31 * x).sin()
                        + 45.0 * (0.27 * y).cos()
                        + 25.0 * (0.22 * x + 0.19 * y).sin();
                    v.clamp(0.0, 255.0) as u8
                })
                .collect();
            Frame::from_luma(w, h, data).unwrap()
        }

        fn select_points(frame: &Frame) -> Vec<TrackPoint> {
            ShiTomasiSelector::default()
                .select(frame, 1000)
                .unwrap()
                .into_iter()
                .enumerate()
                .map(|(i, pos)| TrackPoint::new(TrackId(i as u64), pos))
                .collect()
        }

        #[test]
        fn identical_frames_yield_zero_motion_all_inlier() {
            let frame = wavy(128, 128, 0.0, 0.0);
            let points = select_points(&frame);
            assert!(!points.is_empty());

            let matches = PyrLkTracker::default().track(&frame, &frame, &points).unwrap();
            let estimate = MedianEstimator.estimate(&matches).unwrap();
            let mask = MadClassifier::default().classify(&estimate);

            assert!(estimate.dominant.magnitude() < 0.05);
            assert!(estimate.scale < 0.05);
            assert_eq!(mask.len(), matches.len());
            assert!(mask.iter().all(|&o| !o));
        }

        #[test]
        fn global_translation_is_recovered_with_no_outliers() {
            let prev = wavy(160, 120, 0.0, 0.0);
            let curr = wavy(160, 120, 2.0, 1.0);
            let points = select_points(&prev);
            assert!(!points.is_empty());

            let matches = PyrLkTracker::default().track(&prev, &curr, &points).unwrap();
            assert!(!matches.is_empty());

            let estimate = MedianEstimator.estimate(&matches).unwrap();
            assert_approx_eq!(estimate.dominant.x, 2.0, 0.2);
            assert_approx_eq!(estimate.dominant.y, 1.0, 0.2);

            // The ratio test runs against genuine tracker noise here, so allow a
            // stray flag or two rather than demanding an exact zero.
            let mask = MadClassifier::default().classify(&estimate);
            let flagged = mask.iter().filter(|&&o| o).count();
            assert!(
                flagged <= matches.len() / 20,
                "{}/{} points flagged on a pure camera pan",
                flagged,
                matches.len()
            );
        }
    }
}
