//! Occupancy debouncing.
//!
//! The debouncer turns the noisy per-frame motion signal into a stable
//! occupancy fact and tracks "time since last motion". It flips `occupied`
//! to true on the first motion sample of an episode; it never flips it back
//! to false on its own - "no motion for too long" is an appliance-control
//! policy, not an occupancy fact, because channels may time out at different
//! moments. The orchestrator marks the space vacant once every channel has
//! timed out.

use crate::detect::MotionSample;
use crate::error::PipelineError;

/// Debounced occupancy of the monitored space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OccupancyState {
    /// Inferred presence, derived from motion, not ground truth.
    pub occupied: bool,
    /// Timestamp of the most recent motion sample (monotonically
    /// non-decreasing while occupied).
    pub last_motion_s: u64,
    /// When the current `occupied` value was entered.
    pub since_s: u64,
}

/// Converts per-frame motion samples into [`OccupancyState`].
///
/// `update` must be called exactly once per frame tick, in chronological
/// order; out-of-order samples are rejected and leave the state unchanged.
pub struct OccupancyDebouncer {
    state: OccupancyState,
    last_sample_s: Option<u64>,
}

impl OccupancyDebouncer {
    /// At startup the space is treated as not-yet-observed: `occupied` is
    /// false and the motion clock starts at `start_s`, so appliances time out
    /// `timeout` seconds after observation begins if nothing ever moves.
    pub fn new(start_s: u64) -> Self {
        Self {
            state: OccupancyState {
                occupied: false,
                last_motion_s: start_s,
                since_s: start_s,
            },
            last_sample_s: None,
        }
    }

    /// Fold one motion sample into the occupancy state.
    ///
    /// Returns the updated state plus whether this sample started a motion
    /// episode (the caller turns that into a `MotionStarted` event).
    pub fn update(&mut self, sample: &MotionSample) -> Result<(OccupancyState, bool), PipelineError> {
        if let Some(prev_s) = self.last_sample_s {
            if sample.timestamp_s < prev_s {
                return Err(PipelineError::OutOfOrder {
                    prev_s,
                    got_s: sample.timestamp_s,
                });
            }
        }
        self.last_sample_s = Some(sample.timestamp_s);

        let mut started = false;
        if sample.motion_detected {
            self.state.last_motion_s = sample.timestamp_s;
            if !self.state.occupied {
                self.state.occupied = true;
                self.state.since_s = sample.timestamp_s;
                started = true;
            }
        }
        Ok((self.state, started))
    }

    /// Operator "I am still here": restart the no-motion clock without an
    /// actual motion sample.
    pub fn reset_timer(&mut self, now_s: u64) {
        self.state.last_motion_s = now_s;
    }

    /// Appliance-control verdict that the space is vacant. Called by the
    /// orchestrator once every channel has timed out.
    pub(crate) fn mark_vacant(&mut self, now_s: u64) {
        if self.state.occupied {
            self.state.occupied = false;
            self.state.since_s = now_s;
        }
    }

    pub fn state(&self) -> OccupancyState {
        self.state
    }
}
