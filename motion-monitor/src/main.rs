//! Terminal motion segmentation viewer.
//!
//! Reads a headerless raw Y8 stream (`width * height` bytes per frame), runs the
//! segmentation pipeline, and renders each frame as an ASCII grid: quiet cells stay
//! blank, camera-consistent tracks show as dots, independently moving tracks as
//! increasingly dense glyphs.

use klt_tracker::{PyrLkTracker, ShiTomasiSelector};
use log::info;
use median_estimator::{MadClassifier, MedianEstimator};
use moseg::prelude::v1::*;
use moseg::source::RawLumaSource;
use nalgebra as na;
use std::fs::File;
use std::io::BufReader;
use std::sync::atomic::AtomicBool;
use terminal_size::{terminal_size, Height, Width};

const OUTLIER_CHARS: &str = "o*#@";

struct AsciiSink {
    cols: usize,
    rows: usize,
    frame_width: f32,
    frame_height: f32,
}

impl AsciiSink {
    fn new(frame_width: usize, frame_height: usize) -> Self {
        let (cols, rows) = if let Some((Width(w), Height(h))) = terminal_size() {
            (w as usize, h.saturating_sub(2) as usize)
        } else {
            (60, 30)
        };

        Self {
            cols: cols.max(8),
            rows: rows.max(8),
            frame_width: frame_width as f32,
            frame_height: frame_height as f32,
        }
    }

    fn cell(&self, pos: &na::Point2<f32>) -> (usize, usize) {
        let x = (pos.x / self.frame_width * self.cols as f32) as usize;
        let y = (pos.y / self.frame_height * self.rows as f32) as usize;
        (x.min(self.cols - 1), y.min(self.rows - 1))
    }
}

impl TrajectorySink for AsciiSink {
    fn emit(&mut self, frame_idx: usize, matches: &MatchResult, mask: &[bool]) -> Result<()> {
        let mut inliers = vec![0u32; self.cols * self.rows];
        let mut outliers = vec![0u32; self.cols * self.rows];

        for (i, pos) in matches.current().iter().enumerate() {
            let (x, y) = self.cell(pos);
            if mask[i] {
                outliers[y * self.cols + x] += 1;
            } else {
                inliers[y * self.cols + x] += 1;
            }
        }

        let moving = mask.iter().filter(|&&o| o).count();
        println!(
            "frame {}: {} tracked, {} moving independently",
            frame_idx,
            matches.len(),
            moving
        );

        for y in 0..self.rows {
            let mut line = String::with_capacity(self.cols);
            for x in 0..self.cols {
                let i = y * self.cols + x;
                let c = if outliers[i] > 0 {
                    let idx = (outliers[i] as usize - 1).min(OUTLIER_CHARS.len() - 1);
                    OUTLIER_CHARS.chars().nth(idx).unwrap_or('#')
                } else if inliers[i] > 0 {
                    '.'
                } else {
                    ' '
                };
                line.push(c);
            }
            println!("{}", line);
        }

        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let input = args
        .next()
        .ok_or_else(|| anyhow!("usage: motion-monitor <file.y8> <width> <height>"))?;
    let width = args
        .next()
        .ok_or_else(|| anyhow!("missing frame width"))?
        .parse::<usize>()?;
    let height = args
        .next()
        .ok_or_else(|| anyhow!("missing frame height"))?
        .parse::<usize>()?;

    let reader = BufReader::new(File::open(&input)?);
    let source = RawLumaSource::new(reader, width, height)?;

    info!("segmenting {} at {}x{}", input, width, height);

    let mut sink = AsciiSink::new(width, height);
    let mut session = TrackingSession::new(
        Box::new(source),
        ShiTomasiSelector::default(),
        PyrLkTracker::default(),
        MedianEstimator,
        MadClassifier::default(),
        SessionConfig::default(),
    );

    let stop = AtomicBool::new(false);
    session.run(&mut sink, &stop)
}
