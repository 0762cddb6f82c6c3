//! Frame differencing against an adaptive background model.
//!
//! The differencer maintains per-pixel running mean and variance, exponentially
//! decayed on every call, and quantizes each frame into a [`MotionSample`]:
//! a foreground pixel count plus a binary "motion present" flag.
//!
//! The background model is exclusive internal state. It is never exposed and
//! shares no buffers with any other component.

use crate::error::PipelineError;
use crate::frame::Frame;

/// Variance assigned to every pixel when the model is seeded from the first
/// frame, and the floor used in the foreground test.
const INITIAL_VARIANCE: f32 = 100.0;
const MIN_VARIANCE: f32 = 4.0;
const MAX_VARIANCE: f32 = 5_000.0;

/// Pixels darker than the background by a roughly uniform factor in this band
/// are classified as shadow rather than foreground.
const SHADOW_RATIO_LOW: f32 = 0.5;
const SHADOW_RATIO_HIGH: f32 = 0.95;

/// Configuration for the frame differencer.
#[derive(Clone, Debug)]
pub struct DifferencerConfig {
    /// Expected frame width. Frames with other dimensions are rejected.
    pub width: u32,
    /// Expected frame height.
    pub height: u32,
    /// Foreground threshold: a pixel is foreground when its squared deviation
    /// from the background mean exceeds `sensitivity * variance`. Lower values
    /// make detection more sensitive.
    pub sensitivity: f32,
    /// Minimum surviving foreground pixel count for `motion_detected`.
    pub min_area: u32,
    /// Exclude shadow-classified pixels from the foreground mask.
    pub detect_shadows: bool,
    /// Exponential decay rate for the background model, in (0, 1].
    pub learning_rate: f32,
}

impl Default for DifferencerConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            sensitivity: 25.0,
            min_area: 1000,
            detect_shadows: true,
            learning_rate: 0.05,
        }
    }
}

/// Quantized motion signal for one frame. Produced and consumed within one
/// pipeline tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MotionSample {
    /// Capture timestamp of the frame this sample was derived from.
    pub timestamp_s: u64,
    /// Whether the foreground area reached the configured minimum.
    pub motion_detected: bool,
    /// Foreground pixel count after noise suppression.
    pub motion_area: u32,
}

/// Converts raw frames into per-frame motion samples.
pub struct FrameDifferencer {
    config: DifferencerConfig,
    mean: Vec<f32>,
    variance: Vec<f32>,
    mask: Vec<bool>,
    eroded: Vec<bool>,
    initialized: bool,
}

impl FrameDifferencer {
    pub fn new(config: DifferencerConfig) -> Self {
        let len = config.width as usize * config.height as usize;
        Self {
            config,
            mean: vec![0.0; len],
            variance: vec![INITIAL_VARIANCE; len],
            mask: vec![false; len],
            eroded: vec![false; len],
            initialized: false,
        }
    }

    /// Process one frame: classify foreground, suppress isolated noise, update
    /// the background model, and quantize the result.
    ///
    /// The first call seeds the model from the frame and reports no motion;
    /// an empty baseline must not produce a spurious detection.
    pub fn process(&mut self, frame: &Frame) -> Result<MotionSample, PipelineError> {
        if frame.width() != self.config.width || frame.height() != self.config.height {
            return Err(PipelineError::Input {
                want_width: self.config.width,
                want_height: self.config.height,
                got_width: frame.width(),
                got_height: frame.height(),
            });
        }

        let pixels = frame.pixels();

        if !self.initialized {
            for (i, &px) in pixels.iter().enumerate() {
                self.mean[i] = px as f32;
                self.variance[i] = INITIAL_VARIANCE;
            }
            self.initialized = true;
            return Ok(MotionSample {
                timestamp_s: frame.timestamp_s(),
                motion_detected: false,
                motion_area: 0,
            });
        }

        let alpha = self.config.learning_rate;
        for (i, &px) in pixels.iter().enumerate() {
            let value = px as f32;
            let deviation = value - self.mean[i];
            let variance = self.variance[i].max(MIN_VARIANCE);

            let mut foreground = deviation * deviation > self.config.sensitivity * variance;
            if foreground && self.config.detect_shadows {
                let ratio = value / self.mean[i].max(1.0);
                if (SHADOW_RATIO_LOW..=SHADOW_RATIO_HIGH).contains(&ratio) {
                    foreground = false;
                }
            }
            self.mask[i] = foreground;

            self.mean[i] += alpha * deviation;
            self.variance[i] = (self.variance[i]
                + alpha * (deviation * deviation - self.variance[i]))
                .clamp(MIN_VARIANCE, MAX_VARIANCE);
        }

        let motion_area = self.open_and_count();
        Ok(MotionSample {
            timestamp_s: frame.timestamp_s(),
            motion_detected: motion_area >= self.config.min_area,
            motion_area,
        })
    }

    /// Binary morphological open (3x3 erode then dilate) over the foreground
    /// mask, returning the surviving pixel count. Kills isolated single-pixel
    /// noise while preserving blobs of real motion.
    fn open_and_count(&mut self) -> u32 {
        let w = self.config.width as usize;
        let h = self.config.height as usize;

        for y in 0..h {
            for x in 0..w {
                let idx = y * w + x;
                self.eroded[idx] = if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
                    false
                } else {
                    let mut keep = true;
                    'neighborhood: for dy in 0..3 {
                        for dx in 0..3 {
                            if !self.mask[(y + dy - 1) * w + (x + dx - 1)] {
                                keep = false;
                                break 'neighborhood;
                            }
                        }
                    }
                    keep
                };
            }
        }

        let mut count = 0u32;
        for y in 0..h {
            for x in 0..w {
                let mut set = false;
                'dilate: for dy in 0..3 {
                    for dx in 0..3 {
                        let ny = y + dy;
                        let nx = x + dx;
                        if ny == 0 || nx == 0 || ny > h || nx > w {
                            continue;
                        }
                        if self.eroded[(ny - 1) * w + (nx - 1)] {
                            set = true;
                            break 'dilate;
                        }
                    }
                }
                if set {
                    count += 1;
                }
            }
        }
        count
    }
}
