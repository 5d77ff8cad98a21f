//! # Frame sourcing

use crate::prelude::v1::*;
use std::io::{ErrorKind, Read};

/// Sequential frame source.
///
/// Implementations wrap a capture device, a decoded video stream, or a synthetic
/// generator. Reads may block until the next frame arrives; any timeout policy is the
/// source's own concern.
pub trait FrameSource {
    /// Pull the next frame from the stream.
    ///
    /// Returns `Ok(Some(frame))` while the stream has frames, and `Ok(None)` once it is
    /// cleanly exhausted. `Err` is reserved for genuine acquisition failures.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Get the framerate of the stream.
    ///
    /// This will return `Some(framerate)` if it is known. On realtime streams it may
    /// not always be known. In such cases, `None` is returned.
    fn frame_rate(&self) -> Option<f64> {
        None
    }

    /// Get frame dimensions of the stream, if fixed and known up front.
    fn frame_size(&self) -> Option<(usize, usize)> {
        None
    }
}

/// Reader-backed source of fixed-size raw Y8 frames.
///
/// The stream is expected to be a plain concatenation of `width * height` luma bytes
/// per frame with no container or per-frame header.
pub struct RawLumaSource<T> {
    reader: T,
    width: usize,
    height: usize,
}

impl<T: Read> RawLumaSource<T> {
    /// Create a raw luma source.
    ///
    /// # Arguments
    ///
    /// * `reader` - underlying byte stream.
    /// * `width` - width of every frame.
    /// * `height` - height of every frame.
    pub fn new(reader: T, width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(anyhow!("invalid frame dimensions {}x{}", width, height));
        }

        Ok(Self {
            reader,
            width,
            height,
        })
    }
}

impl<T: Read> FrameSource for RawLumaSource<T> {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let mut data = vec![0u8; self.width * self.height];

        match self.reader.read_exact(&mut data) {
            Ok(()) => Frame::from_luma(self.width, self.height, data).map(Some),
            // A clean cut at a frame boundary and a truncated tail frame both terminate
            // the stream.
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn frame_size(&self) -> Option<(usize, usize)> {
        Some((self.width, self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_consecutive_frames_then_ends() {
        let bytes = (0u8..32).collect::<Vec<_>>();
        let mut source = RawLumaSource::new(bytes.as_slice(), 4, 4).unwrap();

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.get(0, 0), 0);
        let second = source.next_frame().unwrap().unwrap();
        assert_eq!(second.get(0, 0), 16);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn truncated_tail_ends_the_stream() {
        let bytes = vec![7u8; 20];
        let mut source = RawLumaSource::new(bytes.as_slice(), 4, 4).unwrap();

        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn rejects_empty_dimensions() {
        assert!(RawLumaSource::new([].as_slice(), 0, 4).is_err());
    }
}
