//! 遥测模块：固定容量环形缓冲区中的运行事件记录与统计。
//!
//! # Telemetry Module
//!
//! Bounded, in-memory operational event log. Components append events; the
//! buffer holds the most recent `capacity` of them (default 1000) and evicts
//! oldest-first when full, so memory stays bounded no matter how long the
//! process runs.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`EventRecorder`] | Fixed-capacity event ring buffer |
//! | [`Event`] | A recorded event (kind, timestamp, payload) |
//! | [`EventKind`] | Event classification: info / warn / error / call |
//! | [`RecorderStats`] | Aggregate counts over the buffered events |
//!
//! The recorder is a plain value with interior mutability: construct one,
//! share it behind an [`Arc`](std::sync::Arc), and drop it when done. There
//! is no global instance.

use serde::Serialize;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Default ring-buffer capacity.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Default lookback window for [`EventRecorder::stats`].
const DEFAULT_STATS_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Event classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Info,
    Warn,
    Error,
    /// Telemetry for one outbound call attempt; see [`EventRecorder::track_call`].
    Call,
}

/// A single recorded event.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub kind: EventKind,
    /// Wall-clock milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    pub payload: serde_json::Value,
}

/// Aggregate counts over the events currently in the buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecorderStats {
    /// Events currently buffered.
    pub total: usize,
    /// Events whose timestamp falls within the lookback window.
    pub recent: usize,
    /// Error events plus failed calls.
    pub errors: usize,
    /// Call events, successful or not.
    pub calls: usize,
}

/// Fixed-capacity ring buffer of operational events, oldest evicted first.
pub struct EventRecorder {
    events: Mutex<VecDeque<Event>>,
    capacity: usize,
}

impl EventRecorder {
    /// Recorder with the default capacity of 1000 events.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Recorder with an explicit capacity. Capacity is clamped to at least 1.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a timestamped event, evicting the oldest if the buffer is full.
    pub fn record(&self, kind: EventKind, payload: serde_json::Value) {
        self.record_at(kind, payload, now_millis());
    }

    pub(crate) fn record_at(&self, kind: EventKind, payload: serde_json::Value, timestamp_ms: u64) {
        if let Ok(mut events) = self.events.lock() {
            if events.len() == self.capacity {
                events.pop_front();
            }
            events.push_back(Event {
                kind,
                timestamp_ms,
                payload,
            });
            debug!(kind = ?kind, buffered = events.len(), "event recorded");
        }
    }

    /// Record standard call telemetry for one outbound attempt.
    pub fn track_call(&self, name: &str, duration: Duration, success: bool, error: Option<&str>) {
        let mut payload = json!({
            "name": name,
            "duration_ms": duration.as_millis() as u64,
            "success": success,
        });
        if let Some(err) = error {
            payload["error"] = json!(err);
        }
        self.record(EventKind::Call, payload);
    }

    /// Aggregate counts over the buffer. `window` defaults to 24 hours.
    pub fn stats(&self, window: Option<Duration>) -> RecorderStats {
        let window = window.unwrap_or(DEFAULT_STATS_WINDOW);
        let cutoff = now_millis().saturating_sub(window.as_millis() as u64);

        let Ok(events) = self.events.lock() else {
            return RecorderStats {
                total: 0,
                recent: 0,
                errors: 0,
                calls: 0,
            };
        };
        let mut stats = RecorderStats {
            total: events.len(),
            recent: 0,
            errors: 0,
            calls: 0,
        };
        for event in events.iter() {
            if event.timestamp_ms >= cutoff {
                stats.recent += 1;
            }
            match event.kind {
                EventKind::Error => stats.errors += 1,
                EventKind::Call => {
                    stats.calls += 1;
                    if event.payload["success"] == serde_json::Value::Bool(false) {
                        stats.errors += 1;
                    }
                }
                _ => {}
            }
        }
        stats
    }

    /// The most recent `count` events, oldest of those first.
    pub fn recent(&self, count: usize) -> Vec<Event> {
        self.events
            .lock()
            .map(|events| {
                let skip = events.len().saturating_sub(count);
                events.iter().skip(skip).cloned().collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }

    /// Run `fut`, record a call event with its duration and outcome, and pass
    /// its result through unchanged.
    pub async fn time_call<T, E, F>(&self, name: &str, fut: F) -> std::result::Result<T, E>
    where
        F: std::future::Future<Output = std::result::Result<T, E>>,
        E: std::fmt::Display,
    {
        let started = Instant::now();
        match fut.await {
            Ok(value) => {
                self.track_call(name, started.elapsed(), true, None);
                Ok(value)
            }
            Err(err) => {
                self.track_call(name, started.elapsed(), false, Some(&err.to_string()));
                Err(err)
            }
        }
    }
}

impl Default for EventRecorder {
    fn default() -> Self {
        Self::new()
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
