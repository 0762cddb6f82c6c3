//! Immutable luma frames.
//!
//! A [`Frame`] is a 2D grid of 8-bit pixel intensities plus a capture
//! timestamp. Frames are owned by the caller for their lifetime; the core
//! never retains a reference beyond one `tick` call.

use anyhow::{anyhow, Result};

/// One captured frame: row-major 8-bit luma plane with a capture timestamp.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    timestamp_s: u64,
}

impl Frame {
    /// Wrap a row-major luma plane. Fails when the buffer length does not
    /// match `width * height`.
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp_s: u64) -> Result<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(anyhow!(
                "frame buffer is {} bytes, expected {} for {}x{}",
                data.len(),
                expected,
                width,
                height
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            timestamp_s,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Capture time in seconds since the Unix epoch.
    pub fn timestamp_s(&self) -> u64 {
        self.timestamp_s
    }

    /// Row-major pixel intensities, `width * height` bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rejects_mismatched_buffer() {
        assert!(Frame::new(vec![0u8; 11], 4, 3, 0).is_err());
        assert!(Frame::new(vec![0u8; 12], 4, 3, 0).is_ok());
    }

    #[test]
    fn frame_exposes_metadata() {
        let frame = Frame::new(vec![7u8; 6], 3, 2, 42).unwrap();
        assert_eq!(frame.width(), 3);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.timestamp_s(), 42);
        assert_eq!(frame.pixels().len(), 6);
    }
}
