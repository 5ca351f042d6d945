//! Command-line interface for eplet-load.
//!
//! Available commands:
//!
//! - **load**: mismatch load of every donor/recipient pair in a typing file
//! - **compare**: eplets of one allele missing from another, both ways
//!
//! ## Usage
//!
//! ```text
//! # Count and details for every pair
//! eplet-load load typings.csv --data-dir data
//!
//! # Verified class II eplets only, written to results.csv
//! eplet-load load typings.csv --no-class-i --verified-only --out results
//!
//! # Rows dropped for unknown alleles
//! eplet-load load typings.csv --output removed-rows --out filtered
//!
//! # Two alleles of the same locus
//! eplet-load compare 'A*68:01' 'A*68:02' --format json
//! ```

use clap::{Parser, Subcommand};

pub mod compare;
pub mod load;

/// Default location of the reference tables
pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Parser)]
#[command(name = "eplet-load")]
#[command(version)]
#[command(about = "Compute HLA eplet mismatch load between donors and recipients")]
#[command(
    long_about = "eplet-load expands donor and recipient HLA typings into eplets using per-locus reference tables and reports, for every pair, the eplets present on the donor but absent on the recipient.\n\nOutputs:\n- Eplet count per pair\n- Mismatched eplets ranked by residue position\n- Rows dropped because an allele is not in the reference data"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Mismatch load of every pair in a typing file
    Load(load::LoadArgs),

    /// Compare two alleles of the same locus
    Compare(compare::CompareArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}
