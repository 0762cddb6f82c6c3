//! End-to-end scenarios for the occupancy pipeline: synthetic frames in,
//! appliance transitions and events out.

use std::sync::{Arc, Mutex};

use occupancy_sentinel::{
    ChannelConfig, DesiredState, DifferencerConfig, Event, EventKind, EventSink, Frame, NullSink,
    Pipeline, PipelineConfig, PipelineError,
};

const W: u32 = 16;
const H: u32 = 16;
const FLAT: u8 = 40;

struct CaptureSink(Arc<Mutex<Vec<Event>>>);

impl EventSink for CaptureSink {
    fn record(&mut self, event: &Event) {
        self.0.lock().unwrap().push(event.clone());
    }
}

fn flat_frame(ts: u64) -> Frame {
    Frame::new(vec![FLAT; (W * H) as usize], W, H, ts).unwrap()
}

/// A 4x4 bright block, alternating between two positions so the adapting
/// background model always sees fresh deviation.
fn motion_frame(ts: u64, step: usize) -> Frame {
    let (x0, y0) = if step % 2 == 0 { (2, 2) } else { (9, 9) };
    let mut data = vec![FLAT; (W * H) as usize];
    for y in y0..y0 + 4 {
        for x in x0..x0 + 4 {
            data[y * W as usize + x] = 255;
        }
    }
    Frame::new(data, W, H, ts).unwrap()
}

fn pipeline_config(timeout_secs: u64, channels: Vec<ChannelConfig>) -> PipelineConfig {
    PipelineConfig {
        differencer: DifferencerConfig {
            width: W,
            height: H,
            sensitivity: 25.0,
            min_area: 9,
            detect_shadows: false,
            learning_rate: 0.05,
        },
        timeout_secs,
        channels,
    }
}

fn channel(name: &str, timeout_seconds: Option<u64>) -> ChannelConfig {
    ChannelConfig {
        name: name.to_string(),
        timeout_seconds,
    }
}

fn default_pipeline(timeout_secs: u64) -> Pipeline {
    Pipeline::new(
        pipeline_config(
            timeout_secs,
            vec![channel("lights", None), channel("fans", None)],
        ),
        Box::new(NullSink),
        0,
    )
}

#[test]
fn sixty_second_timeout_cycle() {
    let mut pipeline = default_pipeline(60);

    // Model seed frame, then motion at t=1.
    pipeline.tick(&flat_frame(0), 0).unwrap();
    let outcome = pipeline.tick(&motion_frame(1, 0), 1).unwrap();
    assert!(outcome.sample.motion_detected);
    assert!(outcome.occupancy.occupied);
    assert_eq!(outcome.events.len(), 1);
    assert_eq!(outcome.events[0].kind, EventKind::MotionStarted);

    // No motion t=2..=60: channels stay ON (59s elapsed at t=60).
    for ts in 2..=60 {
        let outcome = pipeline.tick(&flat_frame(ts), ts).unwrap();
        assert!(
            outcome.appliances.values().all(|s| s.enabled),
            "channel off early at t={}",
            ts
        );
        assert!(outcome.events.is_empty());
    }

    // t=61: 60 seconds since last motion - both channels off, exactly once.
    let outcome = pipeline.tick(&flat_frame(61), 61).unwrap();
    let kinds: Vec<EventKind> = outcome.events.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EventKind::ApplianceOff, EventKind::ApplianceOff]);
    assert!(outcome.appliances.values().all(|s| !s.enabled));
    assert!(!outcome.occupancy.occupied);

    for ts in 62..=64 {
        let outcome = pipeline.tick(&flat_frame(ts), ts).unwrap();
        assert!(outcome.events.is_empty());
    }

    // Motion resumes at t=65: re-activation within the same tick.
    let outcome = pipeline.tick(&motion_frame(65, 1), 65).unwrap();
    let kinds: Vec<EventKind> = outcome.events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::MotionStarted,
            EventKind::ApplianceOn,
            EventKind::ApplianceOn
        ]
    );
    assert!(outcome.appliances.values().all(|s| s.enabled));

    let stats = pipeline.snapshot();
    assert_eq!(stats.motion_count, 2);
    assert_eq!(stats.energy_events, 2);
}

#[test]
fn per_channel_timeouts_share_one_occupancy() {
    let mut pipeline = Pipeline::new(
        pipeline_config(60, vec![channel("fans", Some(30)), channel("lights", Some(90))]),
        Box::new(NullSink),
        0,
    );

    pipeline.tick(&flat_frame(0), 0).unwrap();
    pipeline.tick(&motion_frame(1, 0), 1).unwrap();

    let mut fans_off_at = None;
    let mut lights_off_at = None;
    for ts in 2..=95 {
        let outcome = pipeline.tick(&flat_frame(ts), ts).unwrap();
        for event in &outcome.events {
            assert_eq!(event.kind, EventKind::ApplianceOff);
            match event.channel.as_deref() {
                Some("fans") => fans_off_at = Some(ts),
                Some("lights") => lights_off_at = Some(ts),
                other => panic!("unexpected channel {:?}", other),
            }
        }
        if ts == 45 {
            assert!(!outcome.appliances["fans"].enabled);
            assert!(outcome.appliances["lights"].enabled);
        }
    }
    assert_eq!(fans_off_at, Some(31));
    assert_eq!(lights_off_at, Some(91));
}

#[test]
fn reset_timer_defers_shutdown() {
    let mut pipeline = default_pipeline(60);
    pipeline.tick(&flat_frame(0), 0).unwrap();
    pipeline.tick(&motion_frame(1, 0), 1).unwrap();
    for ts in 2..=20 {
        pipeline.tick(&flat_frame(ts), ts).unwrap();
    }

    pipeline.reset_timer(20);

    for ts in 21..=79 {
        let outcome = pipeline.tick(&flat_frame(ts), ts).unwrap();
        assert!(
            outcome.appliances.values().all(|s| s.enabled),
            "channel off before timeout elapsed from reset at t={}",
            ts
        );
    }
    let outcome = pipeline.tick(&flat_frame(80), 80).unwrap();
    assert_eq!(outcome.events.len(), 2);
    assert!(outcome.appliances.values().all(|s| !s.enabled));
}

#[test]
fn force_is_idempotent_and_not_an_energy_event() {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let mut pipeline = Pipeline::new(
        pipeline_config(60, vec![channel("lights", None)]),
        Box::new(CaptureSink(captured.clone())),
        0,
    );

    let first = pipeline.force("lights", DesiredState::Off, 5).unwrap();
    assert!(first.is_some());
    let second = pipeline.force("lights", DesiredState::Off, 6).unwrap();
    assert!(second.is_none());

    let overrides = captured
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.kind == EventKind::Override)
        .count();
    assert_eq!(overrides, 1);

    // Manual overrides are audit-distinct and never counted as energy saving.
    assert_eq!(pipeline.snapshot().energy_events, 0);

    let err = pipeline.force("heater", DesiredState::On, 7).unwrap_err();
    assert_eq!(err, PipelineError::UnknownChannel("heater".to_string()));
}

#[test]
fn out_of_order_frame_aborts_tick_without_state_change() {
    let mut pipeline = default_pipeline(60);
    pipeline.tick(&flat_frame(0), 0).unwrap();
    pipeline.tick(&motion_frame(10, 0), 10).unwrap();
    let before = pipeline.occupancy();

    let err = pipeline.tick(&flat_frame(5), 11).unwrap_err();
    assert!(matches!(err, PipelineError::OutOfOrder { prev_s: 10, got_s: 5 }));
    assert_eq!(pipeline.occupancy(), before);

    // The stream recovers on the next in-order frame.
    pipeline.tick(&flat_frame(12), 12).unwrap();
}

#[test]
fn mismatched_frame_aborts_tick_and_reports_upward() {
    let mut pipeline = default_pipeline(60);
    pipeline.tick(&flat_frame(0), 0).unwrap();

    let wrong = Frame::new(vec![FLAT; 64], 8, 8, 1).unwrap();
    let err = pipeline.tick(&wrong, 1).unwrap_err();
    assert!(matches!(err, PipelineError::Input { .. }));

    pipeline.tick(&flat_frame(2), 2).unwrap();
}
