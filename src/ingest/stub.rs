//! Synthetic frame source.
//!
//! Generates a flat scene with intermittent activity bursts: a bright block
//! sweeping across the frame for a stretch of frames, then stillness. Burst
//! onset is random (seedable for deterministic runs), which makes this a
//! usable stand-in for a camera in the demo and in daemon smoke runs.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{FrameSource, SourceStats};
use crate::frame::Frame;

const BACKGROUND_LEVEL: u8 = 60;
const BLOCK_LEVEL: u8 = 230;

#[derive(Clone, Debug)]
pub struct StubConfig {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub target_fps: u32,
    /// Probability per frame that a new activity burst starts.
    pub motion_probability: f64,
    /// Burst length in frames.
    pub burst_frames: u32,
    /// Deterministic seed; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            url: "stub://synthetic".to_string(),
            width: 640,
            height: 480,
            target_fps: 10,
            motion_probability: 0.05,
            burst_frames: 20,
            seed: None,
        }
    }
}

pub struct StubSource {
    config: StubConfig,
    rng: StdRng,
    connected: bool,
    frames_captured: u64,
    burst_remaining: u32,
    block_x: usize,
}

impl StubSource {
    pub fn new(config: StubConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng,
            connected: false,
            frames_captured: 0,
            burst_remaining: 0,
            block_x: 0,
        }
    }

    fn block_size(&self) -> usize {
        (self.config.width as usize / 8).clamp(8, 64)
    }
}

impl FrameSource for StubSource {
    fn connect(&mut self) -> Result<()> {
        self.connected = true;
        log::debug!("stub source {} connected", self.config.url);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame> {
        let w = self.config.width as usize;
        let h = self.config.height as usize;
        let mut data = vec![BACKGROUND_LEVEL; w * h];

        let burst_p = self.config.motion_probability.clamp(0.0, 1.0);
        if self.burst_remaining == 0 && self.rng.gen_bool(burst_p) {
            self.burst_remaining = self.config.burst_frames;
            self.block_x = 0;
        }

        if self.burst_remaining > 0 {
            let block = self.block_size();
            let y0 = (h.saturating_sub(block)) / 2;
            for y in y0..(y0 + block).min(h) {
                for x in self.block_x..(self.block_x + block).min(w) {
                    data[y * w + x] = BLOCK_LEVEL;
                }
            }
            self.block_x = (self.block_x + block / 2) % w.max(1);
            self.burst_remaining -= 1;
        }

        self.frames_captured += 1;
        Frame::new(data, self.config.width, self.config.height, crate::now_s()?)
    }

    fn is_healthy(&self) -> bool {
        self.connected
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frames_captured,
            url: self.config.url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always_moving() -> StubConfig {
        StubConfig {
            width: 64,
            height: 64,
            motion_probability: 1.0,
            seed: Some(7),
            ..StubConfig::default()
        }
    }

    #[test]
    fn frames_match_configured_resolution() {
        let mut source = StubSource::new(always_moving());
        source.connect().unwrap();
        let frame = source.next_frame().unwrap();
        assert_eq!(frame.width(), 64);
        assert_eq!(frame.height(), 64);
        assert_eq!(source.stats().frames_captured, 1);
    }

    #[test]
    fn burst_paints_a_block() {
        let mut source = StubSource::new(always_moving());
        source.connect().unwrap();
        let frame = source.next_frame().unwrap();
        assert!(frame.pixels().iter().any(|&px| px == BLOCK_LEVEL));
    }

    #[test]
    fn quiet_source_stays_flat() {
        let mut source = StubSource::new(StubConfig {
            width: 32,
            height: 32,
            motion_probability: 0.0,
            seed: Some(7),
            ..StubConfig::default()
        });
        source.connect().unwrap();
        let frame = source.next_frame().unwrap();
        assert!(frame.pixels().iter().all(|&px| px == BACKGROUND_LEVEL));
    }
}
