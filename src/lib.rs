//! # CR3BP Engine
//!
//! Circular Restricted Three-Body Problem trajectory propagation in
//! nondimensional rotating coordinates, with an adaptive Dormand-Prince
//! 5(4) integrator, dense output sampling, and typed failure
//! classification for collision singularities.

// Re-export the main types and functions
pub use cli_api::{
    render_csv, render_json, render_table, run_scenario, OutputFormat, SampleRow, ScenarioInputs,
    ScenarioReport,
};
pub use dynamics::{Cr3bp, State, STATE_DIM};
pub use solver::{
    hermite_state, Dopri5, IntegrationError, OdeSystem, Stats, StepController, StepResult,
    Tolerances,
};
pub use trajectory::{
    sample_times, PropagationSettings, ReleaseGeometry, SimulationError, Trajectory,
    TrajectoryDriver,
};
pub use trajectory_sampling::{
    jacobi_drift, sample_profile, TrajectoryFlag, TrajectorySample,
};

// Module declarations
pub mod cli_api;
pub mod coefficients;
pub mod constants;
pub mod dynamics;
pub mod solver;
pub mod trajectory;
pub mod trajectory_sampling;
