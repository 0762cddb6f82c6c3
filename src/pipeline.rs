//! Tick orchestration.
//!
//! The pipeline drives one tick per frame, strictly in order: differencer ->
//! debouncer -> controller -> recorder. All state advances only through
//! [`Pipeline::tick`] and the out-of-band operator calls; callers that invoke
//! them from multiple threads put one mutual-exclusion boundary around the
//! whole pipeline (`&mut self` enforces that here).

use std::collections::BTreeMap;

use crate::control::{ApplianceController, ApplianceState, ChannelConfig, DesiredState};
use crate::detect::{DifferencerConfig, FrameDifferencer, MotionSample};
use crate::error::PipelineError;
use crate::events::{DailyStatistics, Event, EventRecorder, EventSink};
use crate::frame::Frame;
use crate::occupancy::{OccupancyDebouncer, OccupancyState};

/// Everything the pipeline needs at construction.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub differencer: DifferencerConfig,
    /// Global no-motion timeout, overridable per channel.
    pub timeout_secs: u64,
    pub channels: Vec<ChannelConfig>,
}

/// Observable result of one tick.
#[derive(Clone, Debug)]
pub struct TickOutcome {
    pub sample: MotionSample,
    pub occupancy: OccupancyState,
    pub appliances: BTreeMap<String, ApplianceState>,
    /// Transition events generated this tick, in emission order. They have
    /// already been forwarded to the recorder's sink.
    pub events: Vec<Event>,
}

/// Drives the whole frame-to-appliances pipeline.
pub struct Pipeline {
    differencer: FrameDifferencer,
    debouncer: OccupancyDebouncer,
    controller: ApplianceController,
    recorder: EventRecorder,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, sink: Box<dyn EventSink>, start_s: u64) -> Self {
        Self {
            differencer: FrameDifferencer::new(config.differencer),
            debouncer: OccupancyDebouncer::new(start_s),
            controller: ApplianceController::new(&config.channels, config.timeout_secs, start_s),
            recorder: EventRecorder::new(sink),
        }
    }

    /// Process one frame at wall-clock time `now_s`.
    ///
    /// On error the tick is aborted and reported upward; occupancy and
    /// appliance state are left untouched and the caller may simply continue
    /// with the next frame.
    pub fn tick(&mut self, frame: &Frame, now_s: u64) -> Result<TickOutcome, PipelineError> {
        let sample = self.differencer.process(frame)?;
        let (occupancy, motion_started) = self.debouncer.update(&sample)?;

        let mut events = Vec::new();
        if motion_started {
            events.push(Event::motion_started(sample.timestamp_s, sample.motion_area));
        }
        events.extend(self.controller.evaluate(&occupancy, &sample, now_s));

        // The space counts as vacant once every channel has timed out; the
        // debouncer itself never clears the occupied flag.
        if occupancy.occupied && !sample.motion_detected && self.controller.all_off() {
            self.debouncer.mark_vacant(now_s);
        }

        self.recorder.observe(now_s);
        for event in &events {
            self.recorder.record(event);
        }

        Ok(TickOutcome {
            sample,
            occupancy: self.debouncer.state(),
            appliances: self.controller.states(),
            events,
        })
    }

    /// Operator "I am still here": restart the no-motion clock.
    pub fn reset_timer(&mut self, now_s: u64) {
        self.debouncer.reset_timer(now_s);
    }

    /// Operator override for one channel, bypassing the timeout rule. The
    /// `Override` event (if the channel actually changed) is recorded and
    /// returned.
    pub fn force(
        &mut self,
        channel: &str,
        desired: DesiredState,
        now_s: u64,
    ) -> Result<Option<Event>, PipelineError> {
        let event = self.controller.force(channel, desired, now_s)?;
        if let Some(event) = &event {
            self.recorder.record(event);
        }
        Ok(event)
    }

    /// Current daily statistics, without mutation.
    pub fn snapshot(&self) -> DailyStatistics {
        self.recorder.snapshot()
    }

    pub fn occupancy(&self) -> OccupancyState {
        self.debouncer.state()
    }

    pub fn appliances(&self) -> BTreeMap<String, ApplianceState> {
        self.controller.states()
    }
}
