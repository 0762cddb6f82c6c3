//! MQTT actuator.
//!
//! Publishes intended channel states as retained messages on
//! `<prefix>/<channel>` with ON/OFF payloads, so relay controllers and Home
//! Assistant style consumers can follow along. The MQTT event loop runs on a
//! background thread; publish failures are logged and swallowed.

use anyhow::{anyhow, Result};
use rumqttc::{Client, MqttOptions, QoS};
use std::time::Duration;

use super::Actuator;
use crate::control::DesiredState;

#[derive(Clone, Debug)]
pub struct MqttActuatorConfig {
    /// Broker address as `host:port`.
    pub broker_addr: String,
    pub client_id: String,
    /// Topic prefix, e.g. "classroom" publishes to "classroom/lights".
    pub topic_prefix: String,
}

impl Default for MqttActuatorConfig {
    fn default() -> Self {
        Self {
            broker_addr: "127.0.0.1:1883".to_string(),
            client_id: "occupancy-sentinel".to_string(),
            topic_prefix: "classroom".to_string(),
        }
    }
}

pub struct MqttActuator {
    client: Client,
    topic_prefix: String,
}

impl MqttActuator {
    pub fn connect(config: MqttActuatorConfig) -> Result<Self> {
        let (host, port) = config
            .broker_addr
            .rsplit_once(':')
            .ok_or_else(|| anyhow!("broker address must be host:port"))?;
        let port: u16 = port
            .parse()
            .map_err(|_| anyhow!("invalid broker port in {}", config.broker_addr))?;

        let mut options = MqttOptions::new(config.client_id, host, port);
        options.set_keep_alive(Duration::from_secs(30));

        let (client, mut connection) = Client::new(options, 32);
        std::thread::spawn(move || {
            for notification in connection.iter() {
                if let Err(e) = notification {
                    log::warn!("mqtt connection error: {}", e);
                    std::thread::sleep(Duration::from_secs(1));
                }
            }
        });

        Ok(Self {
            client,
            topic_prefix: config.topic_prefix,
        })
    }
}

impl Actuator for MqttActuator {
    fn apply(&mut self, channel: &str, desired: DesiredState) {
        let topic = format!("{}/{}", self.topic_prefix, channel);
        let payload = match desired {
            DesiredState::On => "ON",
            DesiredState::Off => "OFF",
        };
        if let Err(e) = self.client.try_publish(&topic, QoS::AtLeastOnce, true, payload) {
            log::warn!("mqtt publish to {} failed: {}", topic, e);
        }
    }
}
