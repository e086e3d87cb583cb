//! # dropsim-compute
//!
//! Execution backends for the per-element and per-node loops of the
//! explicit integrator.
//!
//! Provides a [`Backend`] with two strategies:
//! - [`Backend::Scalar`] — Sequential reference (always available, used
//!   for in-process runs)
//! - [`Backend::Parallel`] — Data-parallel via rayon (server CPU workers
//!   and the GPU slot), behind the `parallel` feature
//!
//! Both strategies produce identical results. Work items are computed
//! independently and handed back in index order; any reduction
//! (force scatter, energy sums) is done sequentially by the caller, so
//! floating-point summation order never depends on thread scheduling.

pub mod backend;

pub use backend::Backend;
