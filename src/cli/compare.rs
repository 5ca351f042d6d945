use std::path::PathBuf;

use clap::Args;

use crate::catalog::store::DataDirectory;
use crate::cli::load::{DETAILS_COLUMN, LOAD_COLUMN};
use crate::cli::{OutputFormat, DEFAULT_DATA_DIR};
use crate::matching::expand::ExpansionOptions;
use crate::matching::simple::{compare_alleles, AlleleComparison};
use crate::parsing::typing::INDEX_COLUMN;

#[derive(Args)]
pub struct CompareArgs {
    /// First allele, e.g. A*68:01
    #[arg(required = true)]
    pub allele_a: String,

    /// Second allele of the same locus
    #[arg(required = true)]
    pub allele_b: String,

    /// Directory with A.csv ... DP.csv and ep_data.csv
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Count only antibody-verified eplets
    #[arg(long)]
    pub verified_only: bool,

    /// With --verified-only, also count eplets whose verification is questionable
    #[arg(long, requires = "verified_only")]
    pub include_questionable: bool,

    /// Ignore interlocus class II eplets
    #[arg(long)]
    pub no_interlocus: bool,
}

pub fn run(args: CompareArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let options = ExpansionOptions {
        include_interlocus: !args.no_interlocus,
        verified_only: args.verified_only,
        include_questionable: args.include_questionable,
    };

    if verbose {
        eprintln!("Reference data: {}", args.data_dir.display());
    }

    let data = DataDirectory::new(&args.data_dir);
    let rows = compare_alleles(&data, &args.allele_a, &args.allele_b, options)?;

    match format {
        OutputFormat::Text => print_text_comparison(&rows),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Csv => print_csv_comparison(&rows)?,
    }

    Ok(())
}

fn print_text_comparison(rows: &[AlleleComparison]) {
    println!("Comparison Results");
    println!("{}", "=".repeat(60));
    for row in rows {
        println!("\n{}", row.id);
        println!("  Eplet load: {}", row.load);
        println!("  Eplets: {}", row.details);
    }
}

fn print_csv_comparison(rows: &[AlleleComparison]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout().lock());
    writer.write_record([INDEX_COLUMN, LOAD_COLUMN, DETAILS_COLUMN])?;
    for row in rows {
        writer.write_record([row.id.as_str(), &row.load.to_string(), row.details.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}
