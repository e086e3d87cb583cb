//! # dropsim-bench
//!
//! Benchmark and calibration suite for the dropsim solver.
//!
//! Provides five reproducible drop-test scenarios, a runner that
//! collects timing and physics metrics, and CSV/JSON export for
//! regression tracking.

pub mod metrics;
pub mod runner;
pub mod scenarios;

pub use metrics::BenchmarkMetrics;
pub use runner::BenchmarkRunner;
pub use scenarios::{flat_impact_peak_g, Scenario, ScenarioKind};
