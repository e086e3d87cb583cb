//! Event bus: channel-backed event dispatch with pluggable sinks.
//!
//! Producers hold an [`EventSender`] (cheap to clone, usable from any
//! thread); the bus owner drains the channel into its sinks with
//! [`EventBus::flush`].

use std::sync::mpsc;

use crate::events::SimulationEvent;
use crate::sinks::EventSink;

/// Producer handle of an [`EventBus`].
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<SimulationEvent>,
    enabled: bool,
}

impl EventSender {
    /// Emit an event. A disabled sender drops it.
    pub fn emit(&self, event: SimulationEvent) {
        if self.enabled {
            // Receiver gone means the bus was dropped; nothing left to deliver to.
            let _ = self.sender.send(event);
        }
    }
}

/// Event bus for simulation telemetry.
pub struct EventBus {
    sender: mpsc::Sender<SimulationEvent>,
    receiver: mpsc::Receiver<SimulationEvent>,
    sinks: Vec<Box<dyn EventSink>>,
    enabled: bool,
    delivered: u64,
}

impl EventBus {
    /// Creates a new event bus with no sinks.
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            sinks: Vec::new(),
            enabled: true,
            delivered: 0,
        }
    }

    /// Registers a sink to receive events.
    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// Enables or disables the bus. Senders created while disabled drop events.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// New producer handle.
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
            enabled: self.enabled,
        }
    }

    /// Emit an event from the owning thread.
    pub fn emit(&self, event: SimulationEvent) {
        if self.enabled {
            let _ = self.sender.send(event);
        }
    }

    /// Deliver all pending events to every sink, in emission order.
    /// Returns how many events were delivered.
    pub fn flush(&mut self) -> usize {
        let mut count = 0;
        while let Ok(event) = self.receiver.try_recv() {
            for sink in &mut self.sinks {
                sink.handle(&event);
            }
            count += 1;
        }
        self.delivered += count as u64;
        count
    }

    /// Flush, then let every sink finalize.
    pub fn finish(&mut self) {
        self.flush();
        for sink in &mut self.sinks {
            sink.finalize();
        }
    }

    /// Events delivered so far.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
