//! Transition events and daily statistics.
//!
//! Every OccupancyState or ApplianceState transition produces one [`Event`],
//! recorded in the exact order it was generated. Persistence is an external
//! collaborator's concern behind the [`EventSink`] seam; `record` itself never
//! fails. Statistics accumulate monotonically within a UTC day and reset at
//! the day boundary.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Write;

use crate::control::DesiredState;

const SECS_PER_DAY: u64 = 86_400;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A motion episode started (space flipped to occupied).
    MotionStarted,
    /// Automatic channel transition to ON.
    ApplianceOn,
    /// Automatic channel transition to OFF (an energy-saving event).
    ApplianceOff,
    /// Manual `force` transition. Kept distinct from automatic transitions so
    /// audit trails and statistics never conflate the two.
    Override,
}

/// One append-only transition record. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub timestamp_s: u64,
    pub kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl Event {
    pub fn motion_started(timestamp_s: u64, motion_area: u32) -> Self {
        Self {
            timestamp_s,
            kind: EventKind::MotionStarted,
            channel: None,
            payload: Some(json!({ "motion_area": motion_area })),
        }
    }

    pub fn appliance_on(timestamp_s: u64, channel: &str) -> Self {
        Self {
            timestamp_s,
            kind: EventKind::ApplianceOn,
            channel: Some(channel.to_string()),
            payload: None,
        }
    }

    pub fn appliance_off(timestamp_s: u64, channel: &str) -> Self {
        Self {
            timestamp_s,
            kind: EventKind::ApplianceOff,
            channel: Some(channel.to_string()),
            payload: None,
        }
    }

    pub fn forced(timestamp_s: u64, channel: &str, desired: DesiredState) -> Self {
        Self {
            timestamp_s,
            kind: EventKind::Override,
            channel: Some(channel.to_string()),
            payload: Some(json!({ "desired": desired })),
        }
    }
}

/// Counters for one UTC day.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DailyStatistics {
    /// UTC day ordinal (days since the Unix epoch).
    pub day: u64,
    /// Motion episodes started today.
    pub motion_count: u64,
    /// Automatic appliance-off transitions today. Overrides never count.
    pub energy_events: u64,
    /// Seconds of observation accumulated today.
    pub uptime_seconds: u64,
}

/// Where ordered event records go. Implementations must not block the tick;
/// best-effort delivery is acceptable, reordering is not.
pub trait EventSink: Send {
    fn record(&mut self, event: &Event);
}

/// Discards events. Useful in tests and for callers that only want
/// [`TickOutcome`](crate::pipeline::TickOutcome) events.
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&mut self, _event: &Event) {}
}

/// Emits one log line per event via the `log` crate.
pub struct LogSink;

impl EventSink for LogSink {
    fn record(&mut self, event: &Event) {
        match serde_json::to_string(event) {
            Ok(line) => log::info!("event {}", line),
            Err(e) => log::warn!("event serialization failed: {}", e),
        }
    }
}

/// Writes one structured JSON record per line. Write errors are logged and
/// swallowed; the core's only contract here is ordering.
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write + Send> EventSink for JsonLinesSink<W> {
    fn record(&mut self, event: &Event) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                log::warn!("event serialization failed: {}", e);
                return;
            }
        };
        if let Err(e) = writeln!(self.writer, "{}", line) {
            log::warn!("event sink write failed: {}", e);
        }
    }
}

/// Append-only recorder: forwards events to the sink in generation order and
/// accumulates [`DailyStatistics`].
pub struct EventRecorder {
    sink: Box<dyn EventSink>,
    stats: DailyStatistics,
    day_started_s: Option<u64>,
}

impl EventRecorder {
    pub fn new(sink: Box<dyn EventSink>) -> Self {
        Self {
            sink,
            stats: DailyStatistics::default(),
            day_started_s: None,
        }
    }

    /// Record one event. Synchronous, ordering-preserving, infallible.
    pub fn record(&mut self, event: &Event) {
        self.roll_day(event.timestamp_s);
        match event.kind {
            EventKind::MotionStarted => self.stats.motion_count += 1,
            EventKind::ApplianceOff => self.stats.energy_events += 1,
            EventKind::ApplianceOn | EventKind::Override => {}
        }
        self.sink.record(event);
    }

    /// Note that a tick was observed at `now_s`, extending today's uptime.
    pub fn observe(&mut self, now_s: u64) {
        self.roll_day(now_s);
        if let Some(started) = self.day_started_s {
            let uptime = now_s.saturating_sub(started);
            if uptime > self.stats.uptime_seconds {
                self.stats.uptime_seconds = uptime;
            }
        }
    }

    /// Current accumulated counters, without mutation.
    pub fn snapshot(&self) -> DailyStatistics {
        self.stats
    }

    fn roll_day(&mut self, now_s: u64) {
        let day = now_s / SECS_PER_DAY;
        if self.day_started_s.is_none() || day != self.stats.day {
            self.stats = DailyStatistics {
                day,
                ..DailyStatistics::default()
            };
            self.day_started_s = Some(now_s);
        }
    }
}
