//! Trajectory driver: initial-condition construction, integration over a
//! fixed nondimensional interval, and dense sampling of the result
//!
//! The driver is the single point that classifies an integration outcome:
//! success, a collision singularity, or non-convergence. The dynamics
//! model never hides numerical failure; non-finite derivatives are data
//! that the driver inspects and converts into typed errors, together with
//! whatever prefix of the trajectory was recovered.

use nalgebra::Vector3;

use crate::constants::{
    DEFAULT_ABS_TOLERANCE, DEFAULT_INITIAL_STEP, DEFAULT_MAX_STEPS, DEFAULT_REL_TOLERANCE,
    DEFAULT_SAMPLE_COUNT, REFERENCE_T_END, REFERENCE_T_START, SINGULARITY_THRESHOLD,
};
use crate::dynamics::{Cr3bp, State, STATE_DIM};
use crate::solver::{hermite_state, Dopri5, OdeSystem, Stats, Tolerances};

/// Release geometry of the probe in the rotating frame
///
/// The probe starts at a radial offset from the frame origin along the
/// launch-angle direction, moving tangentially: the velocity is rotated
/// 90 degrees clockwise from the radial direction. This is the standard
/// periodic-orbit-seeking initial condition for the CR3BP.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReleaseGeometry {
    /// Launch angle in radians, counterclockwise from +x
    pub angle_rad: f64,
    /// Radial offset of the release point from the origin
    pub offset: f64,
    /// Release speed magnitude
    pub speed: f64,
}

impl ReleaseGeometry {
    /// Build the packed initial state [x, y, z, vx, vy, vz]
    pub fn initial_state(&self) -> State {
        let x0 = self.offset * self.angle_rad.cos();
        let y0 = self.offset * self.angle_rad.sin();

        let heading = self.angle_rad - std::f64::consts::FRAC_PI_2;
        let vx0 = self.speed * heading.cos();
        let vy0 = self.speed * heading.sin();

        [x0, y0, 0.0, vx0, vy0, 0.0]
    }
}

/// Integration settings for one propagation run
#[derive(Debug, Clone)]
pub struct PropagationSettings {
    /// Start of the integration interval (nondimensional time)
    pub t_start: f64,
    /// End of the integration interval
    pub t_end: f64,
    /// Requested output sample times, strictly increasing, inside the span
    pub sample_times: Vec<f64>,
    /// Absolute error tolerance
    pub atol: f64,
    /// Relative error tolerance
    pub rtol: f64,
    /// Initial step size guess
    pub initial_step: f64,
    /// Step budget before the run is declared non-convergent
    pub max_steps: u64,
    /// Distance to a primary below which the run is a collision
    pub singularity_threshold: f64,
}

impl Default for PropagationSettings {
    fn default() -> Self {
        Self {
            t_start: REFERENCE_T_START,
            t_end: REFERENCE_T_END,
            sample_times: sample_times(REFERENCE_T_START, REFERENCE_T_END, DEFAULT_SAMPLE_COUNT),
            atol: DEFAULT_ABS_TOLERANCE,
            rtol: DEFAULT_REL_TOLERANCE,
            initial_step: DEFAULT_INITIAL_STEP,
            max_steps: DEFAULT_MAX_STEPS,
            singularity_threshold: SINGULARITY_THRESHOLD,
        }
    }
}

/// Evenly spaced sample times over [t0, tf], inclusive of both endpoints
pub fn sample_times(t0: f64, tf: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![t0],
        _ => {
            let dt = (tf - t0) / (n - 1) as f64;
            let mut times: Vec<f64> = (0..n).map(|i| t0 + dt * i as f64).collect();
            // pin the endpoint exactly
            times[n - 1] = tf;
            times
        }
    }
}

/// A sampled trajectory: (time, state) pairs in strictly increasing time
/// order, read-only after the run
#[derive(Debug, Clone)]
pub struct Trajectory {
    times: Vec<f64>,
    states: Vec<State>,
    step_times: Vec<f64>,
    stats: Stats,
}

impl Trajectory {
    /// Number of samples
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Whether the trajectory holds no samples
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Sample times, matching the requested sequence exactly
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Sampled state vectors, one per sample time
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// The integrator's accepted internal step times
    pub fn step_times(&self) -> &[f64] {
        &self.step_times
    }

    /// Integration statistics of the run
    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Position sub-vector of sample `i`
    pub fn position(&self, i: usize) -> Vector3<f64> {
        let y = &self.states[i];
        Vector3::new(y[0], y[1], y[2])
    }

    /// Velocity sub-vector of sample `i`
    pub fn velocity(&self, i: usize) -> Vector3<f64> {
        let y = &self.states[i];
        Vector3::new(y[3], y[4], y[5])
    }

    /// Per-sample speed: Euclidean norm of the velocity sub-vector
    pub fn speeds(&self) -> Vec<f64> {
        (0..self.len()).map(|i| self.velocity(i).norm()).collect()
    }

    /// The last sample, if any
    pub fn final_sample(&self) -> Option<(f64, &State)> {
        self.times
            .last()
            .zip(self.states.last())
            .map(|(&t, y)| (t, y))
    }

    /// Iterator over (time, state) pairs
    pub fn samples(&self) -> impl Iterator<Item = (f64, &State)> + '_ {
        self.times.iter().copied().zip(self.states.iter())
    }
}

/// Errors a propagation run can produce
///
/// Failures mid-run carry the failing time, the offending state, and the
/// recovered prefix of the trajectory; a trajectory wrapped in an error is
/// incomplete by construction and never returned as valid data.
#[derive(Debug, Clone)]
pub enum SimulationError {
    /// The state reached a primary body: a sub-threshold body distance or
    /// a non-finite state/derivative from the near-singular division
    Singularity {
        /// Time of the failing state
        t: f64,
        /// The offending state (or as much of it as was computed)
        state: State,
        /// Samples recovered before the failure
        partial: Trajectory,
    },
    /// The integrator could not satisfy the tolerances: step size hit the
    /// floor or the step budget ran out
    NonConvergence {
        /// Time at which progress stopped
        t: f64,
        /// State at that time
        state: State,
        /// Samples recovered before the failure
        partial: Trajectory,
    },
    /// Configuration rejected before any integration work
    InvalidConfiguration {
        /// Description of the offending input
        message: String,
    },
}

impl std::fmt::Display for SimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationError::Singularity { t, state, partial } => write!(
                f,
                "collision singularity at t = {}: state {:?} ({} samples recovered)",
                t,
                state,
                partial.len(),
            ),
            SimulationError::NonConvergence { t, state, partial } => write!(
                f,
                "integration failed to converge at t = {}: state {:?} ({} samples recovered)",
                t,
                state,
                partial.len(),
            ),
            SimulationError::InvalidConfiguration { message } => {
                write!(f, "invalid configuration: {}", message)
            }
        }
    }
}

impl std::error::Error for SimulationError {}

/// Drives one integration run of the CR3BP dynamics and collects the
/// sampled trajectory
#[derive(Debug, Clone)]
pub struct TrajectoryDriver {
    dynamics: Cr3bp,
    geometry: ReleaseGeometry,
    settings: PropagationSettings,
}

impl TrajectoryDriver {
    /// Create a driver for the given dynamics, release geometry, and
    /// integration settings
    pub fn new(dynamics: Cr3bp, geometry: ReleaseGeometry, settings: PropagationSettings) -> Self {
        Self {
            dynamics,
            geometry,
            settings,
        }
    }

    /// The dynamics model this driver propagates
    pub fn dynamics(&self) -> &Cr3bp {
        &self.dynamics
    }

    /// Integrate over the configured span and sample at the requested times
    ///
    /// The first sample is the constructed initial state, bit-exact, when
    /// the first requested time equals the span start. Sample states at
    /// times between the integrator's own steps come from cubic Hermite
    /// dense output over the bracketing accepted step.
    pub fn propagate(&self) -> Result<Trajectory, SimulationError> {
        self.validate()?;

        let s = &self.settings;
        let n = s.sample_times.len();

        let mut solver = Dopri5::new(Tolerances::new(s.atol, s.rtol));

        let mut t = s.t_start;
        let mut y = self.geometry.initial_state();
        let mut f_cur = [0.0; STATE_DIM];
        self.dynamics.rhs(t, &y, &mut f_cur);
        solver.stats.fn_evals += 1;

        let mut states: Vec<State> = Vec::with_capacity(n);
        let mut step_times: Vec<f64> = Vec::new();
        let mut filled = 0usize;

        // Screen the release point itself before doing any work
        if self.is_singular(&y, &f_cur) {
            return Err(SimulationError::Singularity {
                t,
                state: y,
                partial: partial_of(&s.sample_times, &states, &step_times, solver.stats),
            });
        }

        // Exact initial sample when requested at the span start
        while filled < n && s.sample_times[filled] <= t {
            states.push(y);
            filled += 1;
        }

        let mut h = s.initial_step;
        let mut steps = 0u64;

        while s.t_end - t > solver.h_min {
            // Don't overshoot the endpoint
            if t + h > s.t_end {
                h = s.t_end - t;
            }

            let result = solver.step(&self.dynamics, t, &y, h);

            steps += 1;
            if steps > s.max_steps {
                return Err(SimulationError::NonConvergence {
                    t,
                    state: y,
                    partial: partial_of(&s.sample_times, &states, &step_times, solver.stats),
                });
            }

            if result.accepted {
                if self.is_singular(&result.y, &result.f) {
                    return Err(SimulationError::Singularity {
                        t: result.t,
                        state: result.y,
                        partial: partial_of(&s.sample_times, &states, &step_times, solver.stats),
                    });
                }

                // Fill requested samples inside (t, result.t]
                while filled < n && s.sample_times[filled] <= result.t {
                    let ts = s.sample_times[filled];
                    let sample = if ts == result.t {
                        result.y
                    } else {
                        hermite_state(t, &y, &f_cur, result.t, &result.y, &result.f, ts)
                    };
                    states.push(sample);
                    filled += 1;
                }

                t = result.t;
                y = result.y;
                f_cur = result.f;
                step_times.push(t);
            } else if result.h_next <= solver.h_min && s.t_end - t > solver.h_min {
                return Err(SimulationError::NonConvergence {
                    t,
                    state: y,
                    partial: partial_of(&s.sample_times, &states, &step_times, solver.stats),
                });
            }

            h = result.h_next;
        }

        // Endpoint samples the final-step comparison missed by roundoff
        while filled < n {
            states.push(y);
            filled += 1;
        }

        Ok(Trajectory {
            times: s.sample_times.clone(),
            states,
            step_times,
            stats: solver.stats,
        })
    }

    /// Whether a state sits on a collision: non-finite components, a
    /// non-finite derivative, or a body distance below the threshold
    fn is_singular(&self, y: &State, dydt: &State) -> bool {
        if y.iter().any(|v| !v.is_finite()) || dydt.iter().any(|v| !v.is_finite()) {
            return true;
        }
        let pos = Vector3::new(y[0], y[1], y[2]);
        let (sigma, psi) = self.dynamics.body_distances(&pos);
        sigma < self.settings.singularity_threshold || psi < self.settings.singularity_threshold
    }

    /// Fail fast on invalid configuration, before any integration work
    fn validate(&self) -> Result<(), SimulationError> {
        let s = &self.settings;
        let g = &self.geometry;

        if !s.t_start.is_finite() || !s.t_end.is_finite() || s.t_end <= s.t_start {
            return Err(invalid(format!(
                "time span must be positive, got [{}, {}]",
                s.t_start, s.t_end
            )));
        }
        if s.sample_times.is_empty() {
            return Err(invalid("at least one sample time is required".to_string()));
        }
        for pair in s.sample_times.windows(2) {
            if !(pair[1] > pair[0]) {
                return Err(invalid(format!(
                    "sample times must be strictly increasing, got {} then {}",
                    pair[0], pair[1]
                )));
            }
        }
        let first = s.sample_times[0];
        let last = s.sample_times[s.sample_times.len() - 1];
        if !first.is_finite() || !last.is_finite() || first < s.t_start || last > s.t_end {
            return Err(invalid(format!(
                "sample times [{}, {}] must lie within the span [{}, {}]",
                first, last, s.t_start, s.t_end
            )));
        }
        if !s.atol.is_finite() || s.atol <= 0.0 {
            return Err(invalid(format!("atol must be positive and finite, got {}", s.atol)));
        }
        if !s.rtol.is_finite() || s.rtol < 0.0 {
            return Err(invalid(format!(
                "rtol must be non-negative and finite, got {}",
                s.rtol
            )));
        }
        if !s.initial_step.is_finite() || s.initial_step <= 0.0 {
            return Err(invalid(format!(
                "initial step must be positive and finite, got {}",
                s.initial_step
            )));
        }
        if !s.singularity_threshold.is_finite() || s.singularity_threshold < 0.0 {
            return Err(invalid(format!(
                "singularity threshold must be non-negative, got {}",
                s.singularity_threshold
            )));
        }
        if !g.angle_rad.is_finite() {
            return Err(invalid(format!("launch angle must be finite, got {}", g.angle_rad)));
        }
        if !g.offset.is_finite() || g.offset < 0.0 {
            return Err(invalid(format!(
                "initial offset must be non-negative and finite, got {}",
                g.offset
            )));
        }
        if !g.speed.is_finite() || g.speed < 0.0 {
            return Err(invalid(format!(
                "initial speed must be non-negative and finite, got {}",
                g.speed
            )));
        }
        Ok(())
    }
}

fn invalid(message: String) -> SimulationError {
    SimulationError::InvalidConfiguration { message }
}

fn partial_of(
    sample_times: &[f64],
    states: &[State],
    step_times: &[f64],
    stats: Stats,
) -> Trajectory {
    Trajectory {
        times: sample_times[..states.len()].to_vec(),
        states: states.to_vec(),
        step_times: step_times.to_vec(),
        stats,
    }
}
