//! Adaptive Dormand-Prince 5(4) integrator
//!
//! A 7-stage embedded RK5(4) pair with proportional step-size control,
//! used to propagate the CR3BP equations of motion. The pair matches the
//! classic RK45 found in MATLAB and SciPy.
//!
//! Reference: Dormand & Prince (1980); Hairer, Norsett & Wanner,
//! "Solving Ordinary Differential Equations I".

use crate::coefficients::{A, B, B_ERR, C, STAGES};

/// System of ordinary differential equations: dy/dt = f(t, y)
///
/// Implementations must be pure: no mutation of shared state, so the
/// integrator is free to evaluate trial states in any order.
pub trait OdeSystem<const N: usize> {
    /// Evaluate the right-hand side of the ODE system
    ///
    /// # Arguments
    /// * `t` - Current time
    /// * `y` - Current state vector
    /// * `dydt` - Output: derivative dy/dt
    fn rhs(&self, t: f64, y: &[f64; N], dydt: &mut [f64; N]);
}

/// Integration result from a single step
#[derive(Debug, Clone)]
pub struct StepResult<const N: usize> {
    /// New state after the step (5th-order solution)
    pub y: [f64; N],
    /// New time value
    pub t: f64,
    /// Derivative at the new state (stage 7 of the step)
    pub f: [f64; N],
    /// Normalized error estimate (<= 1.0 for acceptance)
    pub error: f64,
    /// Suggested step size magnitude for the next step
    pub h_next: f64,
    /// Whether the step was accepted
    pub accepted: bool,
}

/// Integration statistics for diagnostics
#[derive(Debug, Clone, Copy, Default)]
pub struct Stats {
    /// Total number of function evaluations
    pub fn_evals: u64,
    /// Number of accepted steps
    pub accepted_steps: u64,
    /// Number of rejected steps
    pub rejected_steps: u64,
}

/// Step-size controller using an I-controller
///
/// h_new = safety * h * error^(-1/(q+1))
/// where q = 4 is the order of the embedded error estimate
#[derive(Debug, Clone)]
pub struct StepController {
    /// Safety factor (0.8-0.9 typical)
    pub safety: f64,
    /// Maximum growth factor per step
    pub max_factor: f64,
    /// Minimum reduction factor per step
    pub min_factor: f64,
    exponent: f64,
}

impl Default for StepController {
    fn default() -> Self {
        Self {
            safety: 0.9,
            max_factor: 5.0,
            min_factor: 0.2,
            exponent: 1.0 / 5.0,
        }
    }
}

impl StepController {
    /// Compute the step size adjustment factor from a normalized error
    pub fn compute_factor(&self, error: f64) -> f64 {
        if error == 0.0 {
            return self.max_factor;
        }

        let factor = self.safety * error.powf(-self.exponent);
        factor.clamp(self.min_factor, self.max_factor)
    }
}

/// Tolerance specification for error control
///
/// Error is normalized per component as |err_i| / (atol_i + rtol_i * |y_i|)
#[derive(Debug, Clone)]
pub struct Tolerances<const N: usize> {
    /// Absolute tolerance per component
    pub atol: [f64; N],
    /// Relative tolerance per component
    pub rtol: [f64; N],
}

impl<const N: usize> Tolerances<N> {
    /// Create tolerances with uniform values
    pub fn new(atol: f64, rtol: f64) -> Self {
        Self {
            atol: [atol; N],
            rtol: [rtol; N],
        }
    }

    /// Create tolerances with per-component values
    pub fn with_components(atol: [f64; N], rtol: [f64; N]) -> Self {
        Self { atol, rtol }
    }
}

/// Adaptive Dormand-Prince 5(4) integrator
///
/// # Type Parameters
/// * `N` - Dimension of the state vector
#[derive(Debug, Clone)]
pub struct Dopri5<const N: usize> {
    tol: Tolerances<N>,
    controller: StepController,
    /// Minimum step size magnitude
    pub h_min: f64,
    /// Maximum step size magnitude
    pub h_max: f64,
    /// Maximum number of integration steps before error
    pub max_steps: u64,
    /// Stage evaluations (pre-allocated workspace)
    k: [[f64; N]; STAGES],
    /// Integration statistics
    pub stats: Stats,
}

impl<const N: usize> Dopri5<N> {
    /// Create a new DOPRI5 solver with the given tolerances
    pub fn new(tol: Tolerances<N>) -> Self {
        Self {
            tol,
            controller: StepController::default(),
            h_min: crate::constants::MIN_STEP_SIZE,
            h_max: f64::INFINITY,
            max_steps: crate::constants::DEFAULT_MAX_STEPS,
            k: [[0.0; N]; STAGES],
            stats: Stats::default(),
        }
    }

    /// Set minimum and maximum step size magnitudes
    pub fn set_step_limits(&mut self, h_min: f64, h_max: f64) {
        self.h_min = h_min;
        self.h_max = h_max;
    }

    /// Reset statistics
    pub fn reset_stats(&mut self) {
        self.stats = Stats::default();
    }

    /// Perform a single integration step
    ///
    /// Computes the 7 stages, forms the 5th-order solution, estimates the
    /// error against the embedded 4th-order solution, and decides whether
    /// the step is accepted.
    pub fn step<S: OdeSystem<N>>(
        &mut self,
        sys: &S,
        t: f64,
        y: &[f64; N],
        h: f64,
    ) -> StepResult<N> {
        let h = h.signum() * h.abs().clamp(self.h_min, self.h_max);

        self.compute_stages(sys, t, y, h);
        let y5 = self.compute_solution(y, h);
        let error = self.compute_error(&y5, h);

        let accepted = error <= 1.0;
        let factor = self.controller.compute_factor(error);
        let h_next = (h.abs() * factor).clamp(self.h_min, self.h_max);

        self.stats.fn_evals += STAGES as u64;
        if accepted {
            self.stats.accepted_steps += 1;
        } else {
            self.stats.rejected_steps += 1;
        }

        // The last stage is evaluated at (t + h, y5), so it doubles as the
        // derivative at the new state for dense-output interpolation
        StepResult {
            y: y5,
            t: t + h,
            f: self.k[STAGES - 1],
            error,
            h_next,
            accepted,
        }
    }

    /// Integrate from t0 to tf, returning only the endpoint
    ///
    /// # Arguments
    /// * `sys` - The ODE system to integrate
    /// * `t0` - Initial time
    /// * `y0` - Initial state
    /// * `tf` - Final time (may be less than t0 for backward integration)
    /// * `h0` - Initial step size guess, signed to match the direction
    ///
    /// # Returns
    /// * `Ok((t_final, y_final))` on success
    /// * `Err(IntegrationError)` on failure
    pub fn integrate<S: OdeSystem<N>>(
        &mut self,
        sys: &S,
        t0: f64,
        y0: &[f64; N],
        tf: f64,
        h0: f64,
    ) -> Result<(f64, [f64; N]), IntegrationError<N>> {
        if t0 == tf {
            return Ok((t0, *y0));
        }
        self.validate_inputs(t0, y0, tf, h0)?;

        let mut t = t0;
        let mut y = *y0;
        let mut h = h0;

        let direction = (tf - t0).signum();
        let mut step_count = 0u64;

        while (tf - t) * direction > self.h_min {
            // Don't overshoot the endpoint
            if (t + h - tf) * direction > 0.0 {
                h = tf - t;
            }

            let result = self.step(sys, t, &y, h);

            if result.accepted {
                t = result.t;
                y = result.y;
                if !y.iter().all(|v| v.is_finite()) {
                    return Err(IntegrationError::NonFiniteState { t, y });
                }
            }

            h = result.h_next * direction;

            step_count += 1;
            if step_count > self.max_steps {
                return Err(IntegrationError::MaxStepsExceeded { t });
            }

            // A rejected step whose successor is already at the floor means
            // the controller cannot make progress
            if !result.accepted && result.h_next <= self.h_min && (tf - t) * direction > self.h_min
            {
                return Err(IntegrationError::StepSizeTooSmall {
                    t,
                    h: result.h_next,
                });
            }
        }

        Ok((t, y))
    }

    /// Compute all 7 stages
    #[allow(clippy::needless_range_loop)]
    fn compute_stages<S: OdeSystem<N>>(&mut self, sys: &S, t: f64, y: &[f64; N], h: f64) {
        let mut y_temp = [0.0; N];

        sys.rhs(t, y, &mut self.k[0]);

        for i in 1..STAGES {
            for n in 0..N {
                let mut sum = 0.0;
                for j in 0..i {
                    sum += A[i][j] * self.k[j][n];
                }
                y_temp[n] = y[n] + h * sum;
            }

            sys.rhs(t + C[i] * h, &y_temp, &mut self.k[i]);
        }
    }

    /// Compute the 5th-order solution from the stages
    #[allow(clippy::needless_range_loop)]
    fn compute_solution(&self, y: &[f64; N], h: f64) -> [f64; N] {
        let mut y_new = [0.0; N];

        for n in 0..N {
            let mut sum = 0.0;
            for i in 0..STAGES {
                sum += B[i] * self.k[i][n];
            }
            y_new[n] = y[n] + h * sum;
        }

        y_new
    }

    /// Compute the normalized error estimate
    ///
    /// Infinity norm of the scaled error:
    /// error = max_n( |h * sum_i B_ERR[i] * k[i][n]| / scale[n] )
    /// where scale[n] = atol[n] + rtol[n] * |y5[n]|
    #[allow(clippy::needless_range_loop)]
    fn compute_error(&self, y5: &[f64; N], h: f64) -> f64 {
        let mut max_err: f64 = 0.0;

        for n in 0..N {
            let mut err_n = 0.0;
            for i in 0..STAGES {
                err_n += B_ERR[i] * self.k[i][n];
            }
            err_n *= h;

            let scale = self.tol.atol[n] + self.tol.rtol[n] * y5[n].abs();
            max_err = max_err.max(err_n.abs() / scale);
        }

        max_err
    }

    /// Validate integration inputs
    fn validate_inputs(
        &self,
        t0: f64,
        y0: &[f64; N],
        tf: f64,
        h0: f64,
    ) -> Result<(), IntegrationError<N>> {
        if !t0.is_finite() || !tf.is_finite() || !h0.is_finite() {
            return Err(IntegrationError::InvalidInput {
                message: "t0, tf, and h0 must be finite".to_string(),
            });
        }
        if h0 == 0.0 {
            return Err(IntegrationError::InvalidInput {
                message: "h0 must be non-zero".to_string(),
            });
        }
        let direction = tf - t0;
        if direction != 0.0 && h0.signum() != direction.signum() {
            return Err(IntegrationError::InvalidInput {
                message: "h0 sign must match integration direction (tf - t0)".to_string(),
            });
        }
        for (i, &val) in y0.iter().enumerate() {
            if !val.is_finite() {
                return Err(IntegrationError::InvalidInput {
                    message: format!("y0[{}] is not finite", i),
                });
            }
        }
        for (i, (&a, &r)) in self.tol.atol.iter().zip(self.tol.rtol.iter()).enumerate() {
            if !a.is_finite() || a <= 0.0 {
                return Err(IntegrationError::InvalidInput {
                    message: format!("atol[{}] must be positive and finite", i),
                });
            }
            if !r.is_finite() || r < 0.0 {
                return Err(IntegrationError::InvalidInput {
                    message: format!("rtol[{}] must be non-negative and finite", i),
                });
            }
        }
        Ok(())
    }
}

/// Cubic Hermite interpolation of the state across one accepted step
///
/// Given the states and derivatives at both step endpoints, evaluates the
/// interpolated state at a time inside the step with O(h^4) accuracy.
/// This is the dense-output scheme used to sample the trajectory at
/// requested times that fall between the integrator's own step times.
pub fn hermite_state<const N: usize>(
    t_a: f64,
    y_a: &[f64; N],
    f_a: &[f64; N],
    t_b: f64,
    y_b: &[f64; N],
    f_b: &[f64; N],
    t: f64,
) -> [f64; N] {
    let dt = t_b - t_a;
    let alpha = (t - t_a) / dt;
    let a2 = alpha * alpha;
    let a3 = a2 * alpha;

    // Hermite basis functions
    let h00 = 1.0 - 3.0 * a2 + 2.0 * a3;
    let h10 = alpha - 2.0 * a2 + a3;
    let h01 = 3.0 * a2 - 2.0 * a3;
    let h11 = -a2 + a3;

    let mut y = [0.0; N];
    for i in 0..N {
        y[i] = h00 * y_a[i] + h10 * dt * f_a[i] + h01 * y_b[i] + h11 * dt * f_b[i];
    }
    y
}

/// Errors that can occur during integration
#[derive(Debug, Clone)]
pub enum IntegrationError<const N: usize> {
    /// Step size shrank to the floor without meeting the tolerances
    StepSizeTooSmall {
        /// Time at which progress stalled
        t: f64,
        /// Step size that was too small
        h: f64,
    },
    /// Maximum number of integration steps exceeded
    MaxStepsExceeded {
        /// Time reached when the budget ran out
        t: f64,
    },
    /// Invalid input parameters
    InvalidInput {
        /// Description of the invalid input
        message: String,
    },
    /// Non-finite state detected after an accepted step
    NonFiniteState {
        /// Time at which the state went non-finite
        t: f64,
        /// The offending state
        y: [f64; N],
    },
}

impl<const N: usize> std::fmt::Display for IntegrationError<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrationError::StepSizeTooSmall { t, h } => {
                write!(f, "Step size {} too small at t = {}", h, t)
            }
            IntegrationError::MaxStepsExceeded { t } => {
                write!(f, "Maximum number of integration steps exceeded at t = {}", t)
            }
            IntegrationError::InvalidInput { message } => {
                write!(f, "Invalid input: {}", message)
            }
            IntegrationError::NonFiniteState { t, y } => {
                write!(f, "Non-finite state {:?} at t = {}", y, t)
            }
        }
    }
}

impl<const N: usize> std::error::Error for IntegrationError<N> {}
