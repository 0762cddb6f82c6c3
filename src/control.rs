//! Appliance channel state machine.
//!
//! Each channel is a two-state machine (ON/OFF) with asymmetric hysteresis:
//! any detected motion re-enables an OFF channel in the same tick, while
//! turning OFF requires `timeout` seconds without motion. All channels observe
//! the same shared occupancy state; each may override the global timeout
//! (fans off sooner than lights, say). Transitions are evaluated once per
//! tick, serialized with frame processing - there is no timer thread.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::detect::MotionSample;
use crate::error::PipelineError;
use crate::events::Event;
use crate::occupancy::OccupancyState;

/// Target state for a manual `force` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesiredState {
    On,
    Off,
}

impl DesiredState {
    fn enabled(self) -> bool {
        matches!(self, DesiredState::On)
    }
}

/// One configured appliance channel.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Channel name, e.g. "lights" or "fans".
    pub name: String,
    /// Per-channel no-motion timeout. Falls back to the global value.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

/// Observable state of one channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ApplianceState {
    pub enabled: bool,
    /// When the channel last actually transitioned. No-op evaluations do not
    /// touch this.
    pub last_changed_s: u64,
}

struct Channel {
    state: ApplianceState,
    timeout_secs: u64,
}

/// Drives every configured channel from the shared occupancy state.
pub struct ApplianceController {
    channels: BTreeMap<String, Channel>,
}

impl ApplianceController {
    /// Channels start ON: someone may already be present when observation
    /// begins.
    pub fn new(channels: &[ChannelConfig], default_timeout_secs: u64, start_s: u64) -> Self {
        let channels = channels
            .iter()
            .map(|cfg| {
                (
                    cfg.name.clone(),
                    Channel {
                        state: ApplianceState {
                            enabled: true,
                            last_changed_s: start_s,
                        },
                        timeout_secs: cfg.timeout_seconds.unwrap_or(default_timeout_secs),
                    },
                )
            })
            .collect();
        Self { channels }
    }

    /// Evaluate every channel against the current sample. Returns one event
    /// per actual transition, in channel-name order.
    ///
    /// OFF -> ON fires immediately on motion, with no timeout gate. ON -> OFF
    /// fires only when the sample is motion-free and the no-motion clock has
    /// reached the channel's timeout.
    pub fn evaluate(
        &mut self,
        occupancy: &OccupancyState,
        sample: &MotionSample,
        now_s: u64,
    ) -> Vec<Event> {
        let mut events = Vec::new();
        for (name, channel) in &mut self.channels {
            if sample.motion_detected {
                if !channel.state.enabled {
                    channel.state = ApplianceState {
                        enabled: true,
                        last_changed_s: now_s,
                    };
                    events.push(Event::appliance_on(now_s, name));
                }
            } else if channel.state.enabled
                && now_s.saturating_sub(occupancy.last_motion_s) >= channel.timeout_secs
            {
                channel.state = ApplianceState {
                    enabled: false,
                    last_changed_s: now_s,
                };
                events.push(Event::appliance_off(now_s, name));
            }
        }
        events
    }

    /// Manual override: set a channel directly, bypassing the timeout rule.
    ///
    /// Returns the `Override` event when the channel actually changed, `None`
    /// when it was already in the desired state (idempotent - forcing twice
    /// yields exactly one event). Unknown channels surface
    /// [`PipelineError::UnknownChannel`].
    pub fn force(
        &mut self,
        channel: &str,
        desired: DesiredState,
        now_s: u64,
    ) -> Result<Option<Event>, PipelineError> {
        let entry = self
            .channels
            .get_mut(channel)
            .ok_or_else(|| PipelineError::UnknownChannel(channel.to_string()))?;
        if entry.state.enabled == desired.enabled() {
            return Ok(None);
        }
        entry.state = ApplianceState {
            enabled: desired.enabled(),
            last_changed_s: now_s,
        };
        Ok(Some(Event::forced(now_s, channel, desired)))
    }

    /// Current state of every channel.
    pub fn states(&self) -> BTreeMap<String, ApplianceState> {
        self.channels
            .iter()
            .map(|(name, channel)| (name.clone(), channel.state))
            .collect()
    }

    /// True when no channel is enabled.
    pub fn all_off(&self) -> bool {
        self.channels.values().all(|channel| !channel.state.enabled)
    }
}
