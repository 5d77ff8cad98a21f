//! # Lucas-Kanade feature tracking for moseg.
//!
//! This crate implements the image-space half of the motion segmentation pipeline:
//! Shi-Tomasi corner selection ([`ShiTomasiSelector`]) and pyramidal Lucas-Kanade
//! sparse flow ([`PyrLkTracker`]), both against the `moseg` core traits.
//!
//! Neither component keeps state between frames; all per-frame scratch data (pyramids,
//! gradients) is rebuilt per call.

pub mod flow;
pub mod pyramid;
pub mod select;

pub use flow::PyrLkTracker;
pub use pyramid::{GrayImage, Pyramid};
pub use select::ShiTomasiSelector;
