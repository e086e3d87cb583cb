//! Pluggable event sinks.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::events::{EventKind, SimulationEvent};

/// Trait for event consumers.
pub trait EventSink: Send {
    /// Process a single event.
    fn handle(&mut self, event: &SimulationEvent);

    /// Called when the run ends. Flush buffers, close files.
    fn finalize(&mut self) {}

    fn name(&self) -> &str;
}

/// Collects events in memory. Clones share the same buffer, so a test
/// can keep one clone while the bus owns the other.
#[derive(Debug, Clone, Default)]
pub struct VecSink {
    events: Arc<Mutex<Vec<SimulationEvent>>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the collected events.
    pub fn events(&self) -> Vec<SimulationEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for VecSink {
    fn handle(&mut self, event: &SimulationEvent) {
        self.events.lock().push(event.clone());
    }

    fn name(&self) -> &str {
        "vec_sink"
    }
}

/// Forwards events to `tracing` with structured fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn handle(&mut self, event: &SimulationEvent) {
        let step = event.step;
        match &event.kind {
            EventKind::RunStarted {
                nodes,
                elements,
                dt,
                duration,
            } => tracing::info!(step, nodes, elements, dt, duration, "run started"),
            EventKind::StatusChanged { from, to } => tracing::info!(step, %from, %to, "status changed"),
            EventKind::Progress {
                time,
                progress_pct,
                elapsed_time,
            } => tracing::debug!(step, time, progress_pct, elapsed_time, "progress"),
            EventKind::Contact {
                contact_count,
                ground_force,
            } => tracing::debug!(step, contact_count, ground_force, "contact"),
            EventKind::Energy {
                kinetic,
                potential,
                strain,
            } => tracing::debug!(step, kinetic, potential, strain, "energy"),
            EventKind::Finished { status, peak_g, error } => match error {
                Some(error) => tracing::warn!(step, %status, %error, "run finished"),
                None => tracing::info!(step, %status, peak_g = peak_g.unwrap_or(0.0), "run finished"),
            },
        }
    }

    fn name(&self) -> &str {
        "tracing_sink"
    }
}

/// Writes one JSON object per line.
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
    failed: bool,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, failed: false }
    }

    /// Gives the writer back.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> EventSink for JsonLinesSink<W> {
    fn handle(&mut self, event: &SimulationEvent) {
        if self.failed {
            return;
        }
        let result = serde_json::to_writer(&mut self.writer, event)
            .map_err(std::io::Error::from)
            .and_then(|()| self.writer.write_all(b"\n"));
        if let Err(err) = result {
            // Disabled after the first write error.
            tracing::warn!(error = %err, "json lines sink disabled");
            self.failed = true;
        }
    }

    fn finalize(&mut self) {
        if let Err(err) = self.writer.flush() {
            tracing::warn!(error = %err, "json lines sink flush failed");
        }
    }

    fn name(&self) -> &str {
        "json_lines_sink"
    }
}
