/// Physical and numerical constants used in CR3BP trajectory propagation
///
/// All trajectory quantities are nondimensional: the primary separation,
/// total system mass, and rotating-frame angular rate are scaled to 1.
/// The only dimensional values here are the body masses, which enter the
/// problem solely through their ratio.

/// Mass of the Earth in kilograms
///
/// Used together with [`MOON_MASS_KG`] to derive the reference mass ratio
/// pi2 = m2 / (m1 + m2) ~= 0.01215 for the Earth-Moon system.
pub const EARTH_MASS_KG: f64 = 5.974e24;

/// Mass of the Moon in kilograms
pub const MOON_MASS_KG: f64 = 7.348e22;

// Reference release geometry for the demonstration scenario.
// The probe is released at a radial offset from the rotating-frame origin
// with a velocity of the given magnitude directed 90 degrees clockwise
// from the radial direction (tangential release).

/// Launch angle of the reference scenario, degrees counterclockwise from +x
pub const REFERENCE_LAUNCH_ANGLE_DEG: f64 = 122.7;

/// Radial offset of the release point from the rotating-frame origin
pub const REFERENCE_INITIAL_OFFSET: f64 = 0.04;

/// Release speed magnitude (nondimensional)
pub const REFERENCE_INITIAL_SPEED: f64 = 8.9044;

/// Start of the reference integration interval (nondimensional time)
pub const REFERENCE_T_START: f64 = 0.0;

/// End of the reference integration interval (nondimensional time)
///
/// One nondimensional time unit corresponds to 1/(2*pi) of the primaries'
/// orbital period, about 4.34 days for the Earth-Moon system.
pub const REFERENCE_T_END: f64 = 1.0;

/// Default number of requested output samples
///
/// Output sample count only controls presentation density; integration
/// accuracy is governed by the tolerances. Callers wanting smoother plots
/// raise this independently.
pub const DEFAULT_SAMPLE_COUNT: usize = 1000;

/// Default absolute error tolerance for the adaptive integrator
pub const DEFAULT_ABS_TOLERANCE: f64 = 1e-9;

/// Default relative error tolerance for the adaptive integrator
pub const DEFAULT_REL_TOLERANCE: f64 = 1e-6;

/// Default initial step size guess (nondimensional time)
///
/// The step controller adapts away from this within a few steps; it only
/// needs to be small enough that the first step is not rejected forever.
pub const DEFAULT_INITIAL_STEP: f64 = 1e-4;

/// Default upper bound on integrator steps before a run is declared
/// non-convergent
///
/// Bounds runaway integrations near a singularity so a run fails fast
/// instead of hanging.
pub const DEFAULT_MAX_STEPS: u64 = 10_000_000;

// Numerical stability constants

/// Distance to a primary body below which a state is classified as a
/// collision
///
/// The equations of motion divide by the cubed distance to each primary;
/// inside this radius the derivative is numerically meaningless and the
/// run is terminated with a singularity error rather than letting
/// non-finite values propagate.
pub const SINGULARITY_THRESHOLD: f64 = 1e-8;

/// Smallest step size the adaptive controller may select
pub const MIN_STEP_SIZE: f64 = 1e-14;
