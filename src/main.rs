//! Command-line entry point stub for the CR3BP engine

fn main() {
    println!("CR3BP Engine v0.1.0");
    println!();
    println!("Circular Restricted Three-Body Problem trajectory propagation.");
    println!("The full command-line interface lives in the cr3bp-cli binary:");
    println!();
    println!("  cargo run --bin cr3bp-cli -- simulate");
    println!("  cargo run --bin cr3bp-cli -- info");
    println!();
    println!("To use as a Rust library:");
    println!("  Add to Cargo.toml: cr3bp-engine = \"0.1\"");
}
