//! Physical constants and solver defaults.

/// Standard gravitational acceleration (m/s²).
pub const STANDARD_GRAVITY: f64 = 9.80665;

/// Metres per inch.
pub const METERS_PER_INCH: f64 = 0.0254;

/// Pascals per pound-force per square inch.
pub const PASCALS_PER_PSI: f64 = 6_894.757_293_168;

/// Kilograms per avoirdupois pound.
pub const KILOGRAMS_PER_POUND: f64 = 0.453_592_37;

/// Element count at or below which a job may run in-process.
pub const DEFAULT_LOCAL_ELEMENT_THRESHOLD: usize = 10_000;

/// Element count above which a GPU-entitled job goes to the GPU slot.
pub const DEFAULT_GPU_ELEMENT_THRESHOLD: usize = 50_000;

/// Fraction of the critical timestep used when the caller does not fix Δt.
///
/// Foams stiffen sharply under compression, so the initial estimate
/// overstates the stable step late in an impact.
pub const DEFAULT_TIMESTEP_SAFETY: f64 = 0.25;

/// Velocity blow-up threshold as a multiple of the impact speed.
pub const DEFAULT_DIVERGENCE_FACTOR: f64 = 100.0;

/// Multiplier on the softest effective modulus for automatic contact stiffness.
pub const DEFAULT_CONTACT_STIFFNESS_SCALE: f64 = 10.0;

/// Progress messages are emitted every this many steps by default.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10;

/// Default sensor sampling interval (seconds).
pub const DEFAULT_SAMPLE_INTERVAL: f64 = 1.0e-3;

/// Relative volume below which a tetrahedron counts as degenerate.
///
/// Compared against the cube of the element's longest edge.
pub const DEGENERATE_VOLUME_RATIO: f64 = 1.0e-10;

/// Epsilon for floating-point comparisons.
pub const EPSILON: f64 = 1.0e-12;
