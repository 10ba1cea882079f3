// CLI API module - provides the scenario-level interface for the
// command-line tool: inputs with reference defaults, a serializable
// report, and the output renderers
use clap::ValueEnum;
use serde::Serialize;

use crate::constants::{
    DEFAULT_ABS_TOLERANCE, DEFAULT_INITIAL_STEP, DEFAULT_MAX_STEPS, DEFAULT_REL_TOLERANCE,
    DEFAULT_SAMPLE_COUNT, EARTH_MASS_KG, MOON_MASS_KG, REFERENCE_INITIAL_OFFSET,
    REFERENCE_INITIAL_SPEED, REFERENCE_LAUNCH_ANGLE_DEG, REFERENCE_T_END, REFERENCE_T_START,
    SINGULARITY_THRESHOLD,
};
use crate::dynamics::Cr3bp;
use crate::trajectory::{
    sample_times, PropagationSettings, ReleaseGeometry, SimulationError, Trajectory,
    TrajectoryDriver,
};
use crate::trajectory_sampling::{jacobi_drift, sample_profile, TrajectorySample};

/// Output format for scenario results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary plus a sample table
    Table,
    /// Full report as pretty-printed JSON
    Json,
    /// One CSV row per sample
    Csv,
}

/// Scenario input parameters
///
/// Defaults reproduce the reference Earth-Moon run: release at 122.7
/// degrees, offset 0.04, speed 8.9044, integrated over one nondimensional
/// time unit with atol 1e-9 and rtol 1e-6.
#[derive(Debug, Clone)]
pub struct ScenarioInputs {
    /// Mass of the primary body (kg)
    pub m1_kg: f64,
    /// Mass of the secondary body (kg)
    pub m2_kg: f64,
    /// Launch angle (radians, counterclockwise from +x)
    pub launch_angle_rad: f64,
    /// Radial offset of the release point from the frame origin
    pub initial_offset: f64,
    /// Release speed magnitude
    pub initial_speed: f64,
    /// Start of the integration interval
    pub t_start: f64,
    /// End of the integration interval
    pub t_end: f64,
    /// Number of requested output samples over the interval
    pub num_samples: usize,
    /// Absolute error tolerance
    pub atol: f64,
    /// Relative error tolerance
    pub rtol: f64,
    /// Initial step size guess
    pub initial_step: f64,
    /// Integration step budget
    pub max_steps: u64,
}

impl Default for ScenarioInputs {
    fn default() -> Self {
        Self {
            m1_kg: EARTH_MASS_KG,
            m2_kg: MOON_MASS_KG,
            launch_angle_rad: REFERENCE_LAUNCH_ANGLE_DEG.to_radians(),
            initial_offset: REFERENCE_INITIAL_OFFSET,
            initial_speed: REFERENCE_INITIAL_SPEED,
            t_start: REFERENCE_T_START,
            t_end: REFERENCE_T_END,
            num_samples: DEFAULT_SAMPLE_COUNT,
            atol: DEFAULT_ABS_TOLERANCE,
            rtol: DEFAULT_REL_TOLERANCE,
            initial_step: DEFAULT_INITIAL_STEP,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

/// One serialized trajectory sample
#[derive(Debug, Clone, Serialize)]
pub struct SampleRow {
    pub time: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
    pub speed: f64,
    pub jacobi: f64,
    pub flags: Vec<String>,
}

impl From<&TrajectorySample> for SampleRow {
    fn from(sample: &TrajectorySample) -> Self {
        Self {
            time: sample.time,
            x: sample.position.x,
            y: sample.position.y,
            z: sample.position.z,
            vx: sample.velocity.x,
            vy: sample.velocity.y,
            vz: sample.velocity.z,
            speed: sample.speed,
            jacobi: sample.jacobi,
            flags: sample.flags.iter().map(|f| f.label().to_string()).collect(),
        }
    }
}

/// Full result of one scenario run
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// Mass ratio pi2 derived from the body masses
    pub mass_ratio: f64,
    /// Position of the primary body in the rotating frame
    pub primary_position: [f64; 3],
    /// Position of the secondary body in the rotating frame
    pub secondary_position: [f64; 3],
    /// Per-sample trajectory data
    pub samples: Vec<SampleRow>,
    /// Accepted integrator steps
    pub accepted_steps: u64,
    /// Rejected integrator steps
    pub rejected_steps: u64,
    /// Right-hand-side evaluations
    pub fn_evals: u64,
    /// Speed at the final sample
    pub final_speed: f64,
    /// Largest Jacobi-constant deviation over the run
    pub jacobi_drift: f64,
}

impl ScenarioReport {
    fn new(dynamics: &Cr3bp, trajectory: &Trajectory, profile: &[TrajectorySample]) -> Self {
        let stats = trajectory.stats();
        let primary = dynamics.primary_position();
        let secondary = dynamics.secondary_position();
        Self {
            mass_ratio: dynamics.mass_ratio(),
            primary_position: [primary.x, primary.y, primary.z],
            secondary_position: [secondary.x, secondary.y, secondary.z],
            samples: profile.iter().map(SampleRow::from).collect(),
            accepted_steps: stats.accepted_steps,
            rejected_steps: stats.rejected_steps,
            fn_evals: stats.fn_evals,
            final_speed: profile.last().map_or(0.0, |s| s.speed),
            jacobi_drift: jacobi_drift(profile),
        }
    }
}

/// Run one scenario end to end: derive the mass ratio, build the release
/// state, propagate, and assemble the report
pub fn run_scenario(inputs: &ScenarioInputs) -> Result<ScenarioReport, SimulationError> {
    let dynamics = Cr3bp::from_masses(inputs.m1_kg, inputs.m2_kg)?;

    let geometry = ReleaseGeometry {
        angle_rad: inputs.launch_angle_rad,
        offset: inputs.initial_offset,
        speed: inputs.initial_speed,
    };

    let settings = PropagationSettings {
        t_start: inputs.t_start,
        t_end: inputs.t_end,
        sample_times: sample_times(inputs.t_start, inputs.t_end, inputs.num_samples),
        atol: inputs.atol,
        rtol: inputs.rtol,
        initial_step: inputs.initial_step,
        max_steps: inputs.max_steps,
        singularity_threshold: SINGULARITY_THRESHOLD,
    };

    let driver = TrajectoryDriver::new(dynamics, geometry, settings);
    let trajectory = driver.propagate()?;
    let profile = sample_profile(&trajectory, &dynamics);

    Ok(ScenarioReport::new(&dynamics, &trajectory, &profile))
}

/// Render a report as pretty-printed JSON
pub fn render_json(report: &ScenarioReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// Render the sample rows as CSV
pub fn render_csv(report: &ScenarioReport) -> String {
    let mut out = String::from("time,x,y,z,vx,vy,vz,speed,jacobi,flags\n");
    for row in &report.samples {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{}\n",
            row.time,
            row.x,
            row.y,
            row.z,
            row.vx,
            row.vy,
            row.vz,
            row.speed,
            row.jacobi,
            row.flags.join(";"),
        ));
    }
    out
}

/// Render a human-readable summary with a sample table
///
/// With `full` false only the first rows are listed, mirroring the
/// abbreviated trajectory tables of interactive use.
pub fn render_table(report: &ScenarioReport, full: bool) -> String {
    let mut out = String::new();

    out.push_str("CR3BP TRAJECTORY\n");
    out.push_str(&format!("  Mass ratio (pi2):    {:.6e}\n", report.mass_ratio));
    out.push_str(&format!(
        "  Primary body (m1):   ({:.6}, 0, 0)\n",
        report.primary_position[0]
    ));
    out.push_str(&format!(
        "  Secondary body (m2): ({:.6}, 0, 0)\n",
        report.secondary_position[0]
    ));
    out.push_str(&format!("  Samples:             {}\n", report.samples.len()));
    out.push_str(&format!("  Final speed:         {:.6}\n", report.final_speed));
    out.push_str(&format!("  Jacobi drift:        {:.3e}\n", report.jacobi_drift));
    out.push_str(&format!(
        "  Steps:               {} accepted, {} rejected, {} rhs evals\n",
        report.accepted_steps, report.rejected_steps, report.fn_evals
    ));
    out.push('\n');

    out.push_str("      Time |        x |        y |    Speed |   Jacobi | Flags\n");
    out.push_str("  ---------|----------|----------|----------|----------|------\n");

    let shown = if full {
        report.samples.len()
    } else {
        report.samples.len().min(10)
    };
    for row in &report.samples[..shown] {
        out.push_str(&format!(
            "  {:8.4} | {:8.4} | {:8.4} | {:8.4} | {:8.4} | {}\n",
            row.time,
            row.x,
            row.y,
            row.speed,
            row.jacobi,
            row.flags.join(";"),
        ));
    }
    if shown < report.samples.len() {
        out.push_str(&format!(
            "  ... {} more rows (use --full to list all)\n",
            report.samples.len() - shown
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_inputs() -> ScenarioInputs {
        ScenarioInputs {
            t_end: 0.01,
            num_samples: 5,
            ..ScenarioInputs::default()
        }
    }

    #[test]
    fn test_default_inputs_match_reference_scenario() {
        let inputs = ScenarioInputs::default();
        assert_eq!(inputs.m1_kg, EARTH_MASS_KG);
        assert_eq!(inputs.m2_kg, MOON_MASS_KG);
        assert!((inputs.launch_angle_rad - 122.7_f64.to_radians()).abs() < 1e-15);
        assert_eq!(inputs.initial_offset, 0.04);
        assert_eq!(inputs.initial_speed, 8.9044);
        assert_eq!(inputs.t_start, 0.0);
        assert_eq!(inputs.t_end, 1.0);
        assert_eq!(inputs.atol, 1e-9);
        assert_eq!(inputs.rtol, 1e-6);
    }

    #[test]
    fn test_run_scenario_produces_report() {
        let report = run_scenario(&quick_inputs()).unwrap();

        assert_eq!(report.samples.len(), 5);
        assert!((report.mass_ratio - 0.01215).abs() < 1e-4);
        assert!(report.final_speed > 0.0 && report.final_speed.is_finite());
        assert!(report.accepted_steps > 0);
        assert!(report.fn_evals > 0);
        assert!(report.jacobi_drift.is_finite());

        // Primaries sit on the x-axis at -pi2 and 1 - pi2
        assert!((report.primary_position[0] + report.mass_ratio).abs() < 1e-15);
        assert!((report.secondary_position[0] - (1.0 - report.mass_ratio)).abs() < 1e-15);
    }

    #[test]
    fn test_run_scenario_rejects_bad_masses() {
        let inputs = ScenarioInputs {
            m2_kg: 0.0,
            ..ScenarioInputs::default()
        };
        assert!(matches!(
            run_scenario(&inputs),
            Err(SimulationError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_render_csv_shape() {
        let report = run_scenario(&quick_inputs()).unwrap();
        let csv = render_csv(&report);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), report.samples.len() + 1);
        assert!(lines[0].starts_with("time,x,y,z,"));
        assert_eq!(lines[1].split(',').count(), 10);
    }

    #[test]
    fn test_render_json_round_trips() {
        let report = run_scenario(&quick_inputs()).unwrap();
        let json = render_json(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(value["mass_ratio"].as_f64().is_some());
        assert_eq!(
            value["samples"].as_array().map(|a| a.len()),
            Some(report.samples.len())
        );
    }

    #[test]
    fn test_render_table_abbreviates() {
        let inputs = ScenarioInputs {
            t_end: 0.01,
            num_samples: 25,
            ..ScenarioInputs::default()
        };
        let report = run_scenario(&inputs).unwrap();

        let short = render_table(&report, false);
        assert!(short.contains("more rows"));

        let full = render_table(&report, true);
        assert!(!full.contains("more rows"));
    }
}
