//! # dropsim-telemetry
//!
//! Event bus for simulation telemetry. The integrator side emits
//! structured events (lifecycle, progress, contacts, energy) which are
//! consumed by pluggable sinks: an in-memory buffer, `tracing`, or a
//! JSON-lines stream.

pub mod bus;
pub mod events;
pub mod observer;
pub mod sinks;

pub use bus::{EventBus, EventSender};
pub use events::{EventKind, SimulationEvent};
pub use observer::TelemetryObserver;
pub use sinks::{EventSink, JsonLinesSink, TracingSink, VecSink};
