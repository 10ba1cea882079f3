//! CR3BP equations of motion in nondimensional rotating coordinates
//!
//! The dynamics model is a small immutable value capturing the mass ratio
//! pi2 = m2 / (m1 + m2). Both primaries sit on the x-axis of the rotating
//! frame: the primary at (-pi2, 0, 0) and the secondary at (1 - pi2, 0, 0).
//!
//! Evaluation is pure and allocation-free, so the integrator may probe
//! trial states freely. The equations divide by the cubed distance to each
//! primary; at a primary position the result is non-finite and is returned
//! as-is for the caller to classify (see `trajectory::SimulationError`).

use nalgebra::Vector3;

use crate::solver::OdeSystem;
use crate::trajectory::SimulationError;

/// Dimension of the CR3BP state vector: position then velocity
pub const STATE_DIM: usize = 6;

/// State vector layout: [x, y, z, vx, vy, vz]
pub type State = [f64; STATE_DIM];

/// Dimensionless circular restricted three-body dynamics
///
/// Referentially transparent given (t, state, mass ratio); safe to share
/// across threads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cr3bp {
    mass_ratio: f64,
}

impl Cr3bp {
    /// Create the dynamics for a given mass ratio pi2 in (0, 1)
    pub fn new(mass_ratio: f64) -> Result<Self, SimulationError> {
        if !mass_ratio.is_finite() || mass_ratio <= 0.0 || mass_ratio >= 1.0 {
            return Err(SimulationError::InvalidConfiguration {
                message: format!(
                    "mass ratio must lie strictly inside (0, 1), got {}",
                    mass_ratio
                ),
            });
        }
        Ok(Self { mass_ratio })
    }

    /// Derive the mass ratio from the two body masses (m1 >> m2 convention)
    pub fn from_masses(m1_kg: f64, m2_kg: f64) -> Result<Self, SimulationError> {
        if !(m1_kg.is_finite() && m2_kg.is_finite()) || m1_kg <= 0.0 || m2_kg <= 0.0 {
            return Err(SimulationError::InvalidConfiguration {
                message: format!(
                    "body masses must be positive and finite, got m1 = {}, m2 = {}",
                    m1_kg, m2_kg
                ),
            });
        }
        Self::new(m2_kg / (m1_kg + m2_kg))
    }

    /// The mass ratio pi2
    pub fn mass_ratio(&self) -> f64 {
        self.mass_ratio
    }

    /// Position of the primary body (m1) in the rotating frame
    pub fn primary_position(&self) -> Vector3<f64> {
        Vector3::new(-self.mass_ratio, 0.0, 0.0)
    }

    /// Position of the secondary body (m2) in the rotating frame
    pub fn secondary_position(&self) -> Vector3<f64> {
        Vector3::new(1.0 - self.mass_ratio, 0.0, 0.0)
    }

    /// Euclidean distances (sigma, psi) from a point to the primary and
    /// secondary bodies
    ///
    /// Both must be strictly positive for the equations of motion to be
    /// defined; zero means collision.
    pub fn body_distances(&self, pos: &Vector3<f64>) -> (f64, f64) {
        let sigma = (pos - self.primary_position()).norm();
        let psi = (pos - self.secondary_position()).norm();
        (sigma, psi)
    }

    /// Effective potential of the rotating frame at a position
    ///
    /// U = (x^2 + y^2)/2 + (1 - pi2)/sigma + pi2/psi
    pub fn effective_potential(&self, pos: &Vector3<f64>) -> f64 {
        let pi2 = self.mass_ratio;
        let (sigma, psi) = self.body_distances(pos);
        0.5 * (pos.x * pos.x + pos.y * pos.y) + (1.0 - pi2) / sigma + pi2 / psi
    }

    /// Jacobi constant C = 2U - v^2
    ///
    /// The only conserved integral of the CR3BP; its drift along an
    /// integrated trajectory measures accumulated numerical error.
    pub fn jacobi_constant(&self, pos: &Vector3<f64>, vel: &Vector3<f64>) -> f64 {
        2.0 * self.effective_potential(pos) - vel.norm_squared()
    }

    /// Jacobi constant evaluated on a packed state vector
    pub fn jacobi_from_state(&self, y: &State) -> f64 {
        self.jacobi_constant(
            &Vector3::new(y[0], y[1], y[2]),
            &Vector3::new(y[3], y[4], y[5]),
        )
    }
}

impl OdeSystem<STATE_DIM> for Cr3bp {
    /// CR3BP equations of motion
    ///
    /// The system is autonomous; `t` is accepted for integrator
    /// compatibility but does not enter the equations. Non-finite results
    /// from a collision state are surfaced unmodified.
    fn rhs(&self, _t: f64, y: &State, dydt: &mut State) {
        let pi2 = self.mass_ratio;
        let (x, ypos, z) = (y[0], y[1], y[2]);
        let (vx, vy, vz) = (y[3], y[4], y[5]);

        let sigma = ((x + pi2).powi(2) + ypos * ypos + z * z).sqrt();
        let psi = ((x - 1.0 + pi2).powi(2) + ypos * ypos + z * z).sqrt();
        let sigma3 = sigma * sigma * sigma;
        let psi3 = psi * psi * psi;

        // Kinematic identity: position derivatives are the velocity
        dydt[0] = vx;
        dydt[1] = vy;
        dydt[2] = vz;

        // Accelerations: Coriolis + centrifugal + gravity of both primaries
        dydt[3] =
            2.0 * vy + x - (1.0 - pi2) * (x + pi2) / sigma3 - pi2 * (x - 1.0 + pi2) / psi3;
        dydt[4] = -2.0 * vx + ypos - (1.0 - pi2) * ypos / sigma3 - pi2 * ypos / psi3;
        dydt[5] = -(1.0 - pi2) * z / sigma3 - pi2 * z / psi3;
    }
}
