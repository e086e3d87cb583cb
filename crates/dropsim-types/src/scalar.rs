//! Scalar type alias for the solver.
//!
//! Explicit dynamics accumulates millions of small increments, so the
//! whole pipeline runs in double precision.

/// The floating-point type used throughout the solver.
pub type Scalar = f64;
