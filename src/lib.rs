//! Occupancy Sentinel
//!
//! This crate implements the occupancy-inference and appliance-control core of
//! an energy-saving system: it watches a single video stream, decides whether
//! the monitored space is occupied, and drives binary appliance channels
//! (lights, fans) with asymmetric hysteresis - instant-on when motion appears,
//! delayed-off after a configurable period of sustained inactivity.
//!
//! # Pipeline
//!
//! One `tick` per frame, strictly serialized:
//!
//! 1. `detect`: frame -> background subtraction -> [`MotionSample`]
//! 2. `occupancy`: noisy motion signal -> debounced [`OccupancyState`]
//! 3. `control`: occupancy + elapsed no-motion time -> per-channel transitions
//! 4. `events`: append-only [`Event`] records + [`DailyStatistics`]
//!
//! The core performs no I/O and never blocks. Camera acquisition, actuator
//! wiring, and event persistence are external collaborators behind the
//! [`ingest::FrameSource`], [`actuate::Actuator`], and [`events::EventSink`]
//! seams.
//!
//! # Module Structure
//!
//! - `frame`: immutable luma frames with capture timestamps
//! - `detect`: adaptive background model and per-frame motion quantization
//! - `occupancy`: motion-signal debouncing and "time since last motion"
//! - `control`: the per-channel ON/OFF state machine with timeout hysteresis
//! - `events`: transition log, daily statistics, sink seam
//! - `pipeline`: the orchestrator driving one tick per frame
//! - `ingest` / `actuate` / `config`: thin collaborator shims

use anyhow::Result;
use std::time::{SystemTime, UNIX_EPOCH};

pub mod actuate;
pub mod config;
pub mod control;
pub mod detect;
pub mod error;
pub mod events;
pub mod frame;
pub mod ingest;
pub mod occupancy;
pub mod pipeline;

pub use control::{ApplianceController, ApplianceState, ChannelConfig, DesiredState};
pub use detect::{DifferencerConfig, FrameDifferencer, MotionSample};
pub use error::PipelineError;
pub use events::{
    DailyStatistics, Event, EventKind, EventRecorder, EventSink, JsonLinesSink, LogSink, NullSink,
};
pub use frame::Frame;
pub use occupancy::{OccupancyDebouncer, OccupancyState};
pub use pipeline::{Pipeline, PipelineConfig, TickOutcome};

/// Current wall-clock time in seconds since the Unix epoch.
pub fn now_s() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}
