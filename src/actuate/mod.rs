//! Appliance actuators.
//!
//! Actuators receive `{channel, desired_state}` whenever a channel
//! transitions. The core only emits the intended state; relay or broker
//! failures stay on this side of the seam and never propagate into the state
//! machine.

#[cfg(feature = "actuate-mqtt")]
mod mqtt;

#[cfg(feature = "actuate-mqtt")]
pub use mqtt::{MqttActuator, MqttActuatorConfig};

use crate::control::DesiredState;

pub trait Actuator {
    fn apply(&mut self, channel: &str, desired: DesiredState);
}

/// Default actuator: one log line per intended transition. Stands in for
/// relay/GPIO wiring on development hosts.
pub struct LogActuator;

impl Actuator for LogActuator {
    fn apply(&mut self, channel: &str, desired: DesiredState) {
        let state = match desired {
            DesiredState::On => "ON",
            DesiredState::Off => "OFF",
        };
        log::info!("actuate {} -> {}", channel, state);
    }
}
