use clap::{Parser, Subcommand};
use std::process::ExitCode;

use cr3bp_engine::{
    render_csv, render_json, render_table, run_scenario, OutputFormat, ScenarioInputs,
    SimulationError,
};

#[derive(Parser)]
#[command(name = "cr3bp")]
#[command(version = "0.1.0")]
#[command(about = "CR3BP trajectory propagation in the rotating frame", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Propagate one trajectory and print the sampled result
    Simulate {
        /// Launch angle (degrees, counterclockwise from +x)
        #[arg(short = 'a', long, default_value = "122.7")]
        angle: f64,

        /// Radial offset of the release point from the frame origin
        #[arg(long, default_value = "0.04")]
        offset: f64,

        /// Release speed magnitude (nondimensional)
        #[arg(short = 's', long, default_value = "8.9044")]
        speed: f64,

        /// Mass of the primary body (kg)
        #[arg(long, default_value = "5.974e24")]
        m1: f64,

        /// Mass of the secondary body (kg)
        #[arg(long, default_value = "7.348e22")]
        m2: f64,

        /// Start of the integration interval (nondimensional time)
        #[arg(long, default_value = "0.0")]
        t_start: f64,

        /// End of the integration interval (nondimensional time)
        #[arg(long, default_value = "1.0")]
        t_end: f64,

        /// Number of output samples over the interval
        #[arg(short = 'n', long, default_value = "1000")]
        samples: usize,

        /// Absolute error tolerance
        #[arg(long, default_value = "1e-9")]
        atol: f64,

        /// Relative error tolerance
        #[arg(long, default_value = "1e-6")]
        rtol: f64,

        /// Integration step budget
        #[arg(long, default_value = "10000000")]
        max_steps: u64,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,

        /// List every sample row in table output
        #[arg(long)]
        full: bool,
    },

    /// Print the reference configuration and frame geometry
    Info,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            angle,
            offset,
            speed,
            m1,
            m2,
            t_start,
            t_end,
            samples,
            atol,
            rtol,
            max_steps,
            output,
            full,
        } => {
            let inputs = ScenarioInputs {
                m1_kg: m1,
                m2_kg: m2,
                launch_angle_rad: angle.to_radians(),
                initial_offset: offset,
                initial_speed: speed,
                t_start,
                t_end,
                num_samples: samples,
                atol,
                rtol,
                max_steps,
                ..ScenarioInputs::default()
            };

            match run_scenario(&inputs) {
                Ok(report) => {
                    match output {
                        OutputFormat::Table => print!("{}", render_table(&report, full)),
                        OutputFormat::Json => match render_json(&report) {
                            Ok(json) => println!("{}", json),
                            Err(e) => {
                                eprintln!("Error: failed to serialize report: {}", e);
                                return ExitCode::FAILURE;
                            }
                        },
                        OutputFormat::Csv => print!("{}", render_csv(&report)),
                    }
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    report_failure(&e);
                    ExitCode::FAILURE
                }
            }
        }

        Commands::Info => {
            let inputs = ScenarioInputs::default();
            let pi2 = inputs.m2_kg / (inputs.m1_kg + inputs.m2_kg);

            println!("CR3BP reference configuration (Earth-Moon analog)");
            println!();
            println!("  m1:             {:e} kg", inputs.m1_kg);
            println!("  m2:             {:e} kg", inputs.m2_kg);
            println!("  Mass ratio:     {:.8}", pi2);
            println!("  Primary body:   ({:.8}, 0, 0)", -pi2);
            println!("  Secondary body: ({:.8}, 0, 0)", 1.0 - pi2);
            println!();
            println!(
                "  Release: angle {:.1} deg, offset {}, speed {}",
                inputs.launch_angle_rad.to_degrees(),
                inputs.initial_offset,
                inputs.initial_speed
            );
            println!(
                "  Span [{}, {}], atol {:e}, rtol {:e}",
                inputs.t_start, inputs.t_end, inputs.atol, inputs.rtol
            );
            ExitCode::SUCCESS
        }
    }
}

/// Print a failed run with the failing time and state for diagnosis
fn report_failure(error: &SimulationError) {
    eprintln!("Error: {}", error);
    match error {
        SimulationError::Singularity { partial, .. }
        | SimulationError::NonConvergence { partial, .. } => {
            if !partial.is_empty() {
                eprintln!(
                    "Partial trajectory: {} samples up to t = {} (incomplete)",
                    partial.len(),
                    partial.times()[partial.len() - 1]
                );
            }
        }
        SimulationError::InvalidConfiguration { .. } => {}
    }
}
