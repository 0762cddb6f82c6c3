//! sentineld - occupancy sentinel daemon
//!
//! This daemon:
//! 1. Ingests frames from the configured source (stub:// built in)
//! 2. Runs the occupancy pipeline once per frame
//! 3. Dispatches intended appliance states to the actuator
//! 4. Appends transition events to the JSONL event log
//! 5. Logs daily statistics and source health periodically
//!
//! SIGINT stops the loop and logs the final statistics.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use occupancy_sentinel::actuate::{Actuator, LogActuator};
use occupancy_sentinel::config::SentinelConfig;
use occupancy_sentinel::ingest::open_source;
use occupancy_sentinel::{now_s, DesiredState, EventSink, JsonLinesSink, LogSink, Pipeline};

#[cfg(feature = "actuate-mqtt")]
use occupancy_sentinel::actuate::{MqttActuator, MqttActuatorConfig};

const STATS_LOG_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser, Debug)]
#[command(author, version, about = "Occupancy-driven appliance control daemon")]
struct Args {
    /// No-motion timeout in seconds (overrides config).
    #[arg(long)]
    timeout: Option<u64>,

    /// Motion detection sensitivity; lower is more sensitive (overrides config).
    #[arg(long)]
    sensitivity: Option<f32>,

    /// Minimum foreground area in pixels (overrides config).
    #[arg(long)]
    min_area: Option<u32>,

    /// Frame source URL (overrides config).
    #[arg(long)]
    source: Option<String>,

    /// JSONL event log path (overrides config).
    #[arg(long)]
    event_log: Option<PathBuf>,

    /// MQTT broker as host:port for appliance state publishing.
    #[cfg(feature = "actuate-mqtt")]
    #[arg(long, env = "SENTINEL_MQTT_BROKER")]
    mqtt_broker: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = SentinelConfig::load()?;
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err(anyhow!("--timeout must be greater than zero"));
        }
        cfg.control.timeout_secs = timeout;
    }
    if let Some(sensitivity) = args.sensitivity {
        if sensitivity <= 0.0 {
            return Err(anyhow!("--sensitivity must be positive"));
        }
        cfg.detector.sensitivity = sensitivity;
    }
    if let Some(min_area) = args.min_area {
        cfg.detector.min_area = min_area.max(1);
    }
    if let Some(source) = args.source.clone() {
        cfg.source.url = source;
    }
    if let Some(path) = args.event_log.clone() {
        cfg.event_log = Some(path);
    }

    let sink: Box<dyn EventSink> = match &cfg.event_log {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            log::info!("event log: {}", path.display());
            Box::new(JsonLinesSink::new(file))
        }
        None => Box::new(LogSink),
    };

    let mut actuator = build_actuator(&args)?;

    let mut source = open_source(
        &cfg.source.url,
        cfg.source.width,
        cfg.source.height,
        cfg.source.target_fps,
    )?;
    source.connect()?;

    let start_s = now_s()?;
    let mut pipeline = Pipeline::new(cfg.pipeline_config(), sink, start_s);

    let running = Arc::new(AtomicBool::new(true));
    let running_flag = running.clone();
    ctrlc::set_handler(move || {
        running_flag.store(false, Ordering::SeqCst);
    })?;

    let frame_interval = Duration::from_millis(1000 / cfg.source.target_fps.max(1) as u64);
    let mut last_stats_log = Instant::now();

    log::info!(
        "sentineld running: source={} timeout={}s channels={:?}",
        cfg.source.url,
        cfg.control.timeout_secs,
        cfg.control
            .channels
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
    );

    while running.load(Ordering::SeqCst) {
        let frame = match source.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("frame capture failed: {}", e);
                break;
            }
        };
        let now = now_s()?;

        match pipeline.tick(&frame, now) {
            Ok(outcome) => {
                for event in &outcome.events {
                    let Some(channel) = &event.channel else {
                        continue;
                    };
                    if let Some(state) = outcome.appliances.get(channel) {
                        let desired = if state.enabled {
                            DesiredState::On
                        } else {
                            DesiredState::Off
                        };
                        actuator.apply(channel, desired);
                    }
                }
            }
            // Bad frames abort only their own tick; keep observing.
            Err(e) => log::warn!("tick dropped: {}", e),
        }

        if last_stats_log.elapsed() >= STATS_LOG_INTERVAL {
            let stats = source.stats();
            log::info!(
                "source health={} frames={} url={}",
                source.is_healthy(),
                stats.frames_captured,
                stats.url
            );
            log::info!(
                "daily stats: {}",
                serde_json::to_string(&pipeline.snapshot())?
            );
            last_stats_log = Instant::now();
        }

        std::thread::sleep(frame_interval);
    }

    log::info!(
        "shutting down. final daily stats: {}",
        serde_json::to_string(&pipeline.snapshot())?
    );
    Ok(())
}

#[cfg(feature = "actuate-mqtt")]
fn build_actuator(args: &Args) -> Result<Box<dyn Actuator>> {
    match &args.mqtt_broker {
        Some(broker) => {
            let actuator = MqttActuator::connect(MqttActuatorConfig {
                broker_addr: broker.clone(),
                ..MqttActuatorConfig::default()
            })?;
            log::info!("publishing appliance states to mqtt broker {}", broker);
            Ok(Box::new(actuator))
        }
        None => Ok(Box::new(LogActuator)),
    }
}

#[cfg(not(feature = "actuate-mqtt"))]
fn build_actuator(_args: &Args) -> Result<Box<dyn Actuator>> {
    Ok(Box::new(LogActuator))
}
