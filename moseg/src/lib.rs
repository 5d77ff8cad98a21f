//! # Sparse Motion Segmentation Library
//!
//! This library provides the data model and a framework for separating camera-induced
//! motion from independent object motion in a sparse feature point stream. There are
//! frame sourcing, feature selection, flow tracking and motion estimation traits
//! available, tied together by a frame-sequential tracking session.
//!
//! The easiest way to use the library is to import its prelude:
//!
//! ```
//! use moseg::prelude::v1::*;
//! ```
//!
//! You may need [`nalgebra`](https://crates.io/crates/nalgebra) to make use of the functionality.

pub mod estimator;
pub mod flow;
pub mod frame;
pub mod properties;
pub mod selector;
pub mod session;
pub mod sink;
pub mod source;
pub mod track;

pub mod prelude {
    pub mod v1 {
        pub use crate::{
            estimator::{MotionEstimator, OutlierClassifier},
            flow::FlowTracker,
            frame::{Frame, RGBA},
            properties::{Properties, Property, PropertyMut},
            selector::FeatureSelector,
            session::{SessionConfig, SessionStatus, TrackingSession},
            sink::{NullSink, TrajectorySink},
            source::FrameSource,
            track::{FlowEntry, MatchResult, MotionEstimate, TrackId, TrackPoint},
        };
        pub use anyhow::{anyhow, Error, Result};
    }
}
