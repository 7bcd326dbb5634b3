// src/logging.rs
//
// Step event sinks.
//
// The episode controller emits one event per reset and per step; sinks
// turn them into JSONL for offline analysis. Logging is best-effort:
// a sink must never fail the control loop, so I/O errors are dropped.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde_json::json;

use crate::observation::StateSnapshot;
use crate::types::{ActionCode, ActionOutcome};

pub trait StepSink {
    fn log_reset(&mut self, episode: u64, snapshot: &StateSnapshot);

    #[allow(clippy::too_many_arguments)]
    fn log_step(
        &mut self,
        episode: u64,
        tick: u64,
        action: Option<ActionCode>,
        reason: &str,
        outcome: &ActionOutcome,
        reward: f64,
        snapshot: &StateSnapshot,
    );
}

/// Sink that discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl StepSink for NoopSink {
    fn log_reset(&mut self, _episode: u64, _snapshot: &StateSnapshot) {}

    fn log_step(
        &mut self,
        _episode: u64,
        _tick: u64,
        _action: Option<ActionCode>,
        _reason: &str,
        _outcome: &ActionOutcome,
        _reward: f64,
        _snapshot: &StateSnapshot,
    ) {
    }
}

/// JSONL file sink, one event object per line.
pub struct FileSink {
    writer: BufWriter<File>,
}

impl FileSink {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    fn write_line(&mut self, value: &serde_json::Value) {
        // Best-effort: a full disk must not stop the episode.
        let _ = serde_json::to_writer(&mut self.writer, value);
        let _ = self.writer.write_all(b"\n");
        let _ = self.writer.flush();
    }
}

impl StepSink for FileSink {
    fn log_reset(&mut self, episode: u64, snapshot: &StateSnapshot) {
        let value = json!({
            "event": "reset",
            "episode": episode,
            "health": snapshot.stats.current_health,
            "max_health": snapshot.stats.max_health,
            "x": snapshot.location.x,
            "y": snapshot.location.y,
        });
        self.write_line(&value);
    }

    fn log_step(
        &mut self,
        episode: u64,
        tick: u64,
        action: Option<ActionCode>,
        reason: &str,
        outcome: &ActionOutcome,
        reward: f64,
        snapshot: &StateSnapshot,
    ) {
        let value = json!({
            "event": "step",
            "episode": episode,
            "tick": tick,
            "action": action.map(|a| a.as_str()),
            "reason": reason,
            "outcome": outcome.status.as_str(),
            "outcome_message": outcome.message,
            "reward": reward,
            "health": snapshot.stats.current_health,
            "x": snapshot.location.x,
            "y": snapshot.location.y,
        });
        self.write_line(&value);
    }
}
