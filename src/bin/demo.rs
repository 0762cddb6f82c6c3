//! demo - camera-free synthetic run of the occupancy pipeline
//!
//! Simulates random activity bursts against a synthetic scene, with a short
//! timeout so ON/OFF cycles are visible within a minute. Useful for trying the
//! system without a camera attached.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::time::Duration;

use occupancy_sentinel::ingest::{FrameSource, StubConfig, StubSource};
use occupancy_sentinel::{
    now_s, ChannelConfig, DifferencerConfig, EventKind, NullSink, Pipeline, PipelineConfig,
};

const DEMO_WIDTH: u32 = 320;
const DEMO_HEIGHT: u32 = 240;

#[derive(Parser, Debug)]
#[command(author, version, about = "Synthetic occupancy demo (no camera required)")]
struct Args {
    /// Demo duration in seconds.
    #[arg(long, default_value_t = 60)]
    seconds: u64,

    /// Frames per second for the synthetic source.
    #[arg(long, default_value_t = 2)]
    fps: u32,

    /// No-motion timeout in seconds (short, so the demo shows off/on cycles).
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Probability per frame that an activity burst starts.
    #[arg(long, default_value_t = 0.3)]
    motion_probability: f64,

    /// Deterministic seed for the synthetic source.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    if args.fps == 0 {
        return Err(anyhow!("fps must be >= 1"));
    }
    if args.timeout == 0 {
        return Err(anyhow!("timeout must be >= 1"));
    }

    let mut source = StubSource::new(StubConfig {
        url: "stub://demo".to_string(),
        width: DEMO_WIDTH,
        height: DEMO_HEIGHT,
        target_fps: args.fps,
        motion_probability: args.motion_probability,
        burst_frames: args.fps.max(1) * 2,
        seed: args.seed,
    });
    source.connect()?;

    let start_s = now_s()?;
    let mut pipeline = Pipeline::new(
        PipelineConfig {
            differencer: DifferencerConfig {
                width: DEMO_WIDTH,
                height: DEMO_HEIGHT,
                min_area: 200,
                detect_shadows: false,
                ..DifferencerConfig::default()
            },
            timeout_secs: args.timeout,
            channels: vec![
                ChannelConfig {
                    name: "lights".to_string(),
                    timeout_seconds: None,
                },
                ChannelConfig {
                    name: "fans".to_string(),
                    timeout_seconds: None,
                },
            ],
        },
        Box::new(NullSink),
        start_s,
    );

    println!("occupancy demo: {}s at {} fps, timeout {}s", args.seconds, args.fps, args.timeout);

    let frame_interval = Duration::from_millis(1000 / args.fps as u64);
    let total_frames = args.seconds.saturating_mul(args.fps as u64);

    for _ in 0..total_frames {
        let frame = source.next_frame()?;
        let now = now_s()?;
        let outcome = pipeline.tick(&frame, now)?;

        for event in &outcome.events {
            match event.kind {
                EventKind::MotionStarted => println!("[t+{:3}s] motion detected", now - start_s),
                EventKind::ApplianceOn => println!(
                    "[t+{:3}s] {} ON",
                    now - start_s,
                    event.channel.as_deref().unwrap_or("?")
                ),
                EventKind::ApplianceOff => println!(
                    "[t+{:3}s] energy saving: {} OFF",
                    now - start_s,
                    event.channel.as_deref().unwrap_or("?")
                ),
                EventKind::Override => {}
            }
        }

        let states: Vec<String> = outcome
            .appliances
            .iter()
            .map(|(name, st)| format!("{}={}", name, if st.enabled { "ON" } else { "OFF" }))
            .collect();
        println!(
            "[t+{:3}s] status {} since_motion={}s",
            now - start_s,
            states.join(" "),
            now.saturating_sub(outcome.occupancy.last_motion_s)
        );

        std::thread::sleep(frame_interval);
    }

    let stats = pipeline.snapshot();
    println!("summary: {}", serde_json::to_string(&stats)?);
    Ok(())
}
