//! Frame ingestion sources.
//!
//! Sources supply [`Frame`](crate::Frame) instances at a configured resolution
//! and hand them to the pipeline one at a time, in capture order. The only
//! built-in backend is the synthetic `stub://` source used by the demo, the
//! daemon's default configuration, and tests; real camera acquisition is an
//! external collaborator wired in behind the same trait.

mod stub;

use anyhow::{anyhow, Result};

pub use stub::{StubConfig, StubSource};

use crate::frame::Frame;

/// Running counters for a source, for periodic health logging.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub url: String,
}

/// One stream of frames in non-decreasing timestamp order.
pub trait FrameSource {
    fn connect(&mut self) -> Result<()>;

    /// Capture the next frame. Pacing to the target frame rate is the
    /// caller's concern.
    fn next_frame(&mut self) -> Result<Frame>;

    fn is_healthy(&self) -> bool;

    fn stats(&self) -> SourceStats;
}

/// Open the source named by a URL. Only `stub://` URLs are built in.
pub fn open_source(url: &str, width: u32, height: u32, target_fps: u32) -> Result<Box<dyn FrameSource>> {
    if url.starts_with("stub://") {
        Ok(Box::new(StubSource::new(StubConfig {
            url: url.to_string(),
            width,
            height,
            target_fps,
            ..StubConfig::default()
        })))
    } else {
        Err(anyhow!(
            "unsupported frame source {} (only stub:// is built in)",
            url
        ))
    }
}
