//! Derived per-sample quantities for presentation consumers
//!
//! Pure post-processing over a finished trajectory: speed profile, Jacobi
//! constant, and flags marking notable events along the path. Nothing
//! here mutates the trajectory.

use nalgebra::Vector3;

use crate::dynamics::Cr3bp;
use crate::trajectory::Trajectory;

/// Flags for notable events along a trajectory
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TrajectoryFlag {
    /// The path crossed the x-axis (y changed sign) since the previous
    /// sample; the section periodic-orbit searches watch
    XAxisCrossing,
    /// Local minimum of the distance to the secondary body
    CloseApproach,
}

impl TrajectoryFlag {
    /// Stable label for serialized output
    pub fn label(&self) -> &'static str {
        match self {
            TrajectoryFlag::XAxisCrossing => "x_axis_crossing",
            TrajectoryFlag::CloseApproach => "close_approach",
        }
    }
}

/// Single trajectory sample with derived quantities
#[derive(Debug, Clone)]
pub struct TrajectorySample {
    /// Nondimensional sample time
    pub time: f64,
    /// Position in the rotating frame
    pub position: Vector3<f64>,
    /// Velocity in the rotating frame
    pub velocity: Vector3<f64>,
    /// Speed: Euclidean norm of the velocity
    pub speed: f64,
    /// Jacobi constant at the sample
    pub jacobi: f64,
    /// Notable events at this sample
    pub flags: Vec<TrajectoryFlag>,
}

/// Compute the derived profile for every sample of a trajectory
pub fn sample_profile(trajectory: &Trajectory, dynamics: &Cr3bp) -> Vec<TrajectorySample> {
    let mut samples: Vec<TrajectorySample> = trajectory
        .samples()
        .map(|(time, _)| time)
        .enumerate()
        .map(|(i, time)| {
            let position = trajectory.position(i);
            let velocity = trajectory.velocity(i);
            TrajectorySample {
                time,
                position,
                velocity,
                speed: velocity.norm(),
                jacobi: dynamics.jacobi_constant(&position, &velocity),
                flags: Vec::new(),
            }
        })
        .collect();

    detect_x_axis_crossings(&mut samples);
    detect_close_approaches(&mut samples, dynamics);

    samples
}

/// Largest deviation of the Jacobi constant from its initial value
///
/// The Jacobi constant is conserved by the exact dynamics, so its drift
/// along an integrated trajectory measures accumulated numerical error.
pub fn jacobi_drift(samples: &[TrajectorySample]) -> f64 {
    let Some(first) = samples.first() else {
        return 0.0;
    };
    samples
        .iter()
        .map(|s| (s.jacobi - first.jacobi).abs())
        .fold(0.0, f64::max)
}

/// Flag samples where the path crossed the x-axis since the previous one
fn detect_x_axis_crossings(samples: &mut [TrajectorySample]) {
    let ys: Vec<f64> = samples.iter().map(|s| s.position.y).collect();

    for i in 0..ys.len().saturating_sub(1) {
        if ys[i] * ys[i + 1] < 0.0 {
            samples[i + 1].flags.push(TrajectoryFlag::XAxisCrossing);
        }
    }
}

/// Flag local minima of the distance to the secondary body
fn detect_close_approaches(samples: &mut [TrajectorySample], dynamics: &Cr3bp) {
    let secondary = dynamics.secondary_position();
    let dists: Vec<f64> = samples
        .iter()
        .map(|s| (s.position - secondary).norm())
        .collect();

    for i in 1..dists.len().saturating_sub(1) {
        if dists[i] < dists[i - 1] && dists[i] < dists[i + 1] {
            samples[i].flags.push(TrajectoryFlag::CloseApproach);
        }
    }
}
