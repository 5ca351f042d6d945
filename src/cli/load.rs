use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use tracing::info;

use crate::catalog::cache::TableCache;
use crate::catalog::store::DataDirectory;
use crate::cli::{OutputFormat, DEFAULT_DATA_DIR};
use crate::core::typing::TypingTable;
use crate::matching::engine::{compute_mismatch_load, LoadOptions, LoadOutput, LoadRow, OutputType};
use crate::parsing::typing::{
    parse_typing_file, write_typing_table, DONOR_SUFFIX, INDEX_COLUMN, RECIPIENT_SUFFIX,
};

/// Column headers of written results
pub const LOAD_COLUMN: &str = "Eplet Load";
pub const DETAILS_COLUMN: &str = "EpMismatches";

#[derive(Args)]
pub struct LoadArgs {
    /// Typing file: row id column, then `<column>_D` donor and `<column>_R` recipient
    /// columns (CSV, TSV, optionally gzipped)
    #[arg(required = true)]
    pub input: PathBuf,

    /// Directory with A.csv ... DP.csv and ep_data.csv
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Skip class I (A, B, C) eplets
    #[arg(long)]
    pub no_class_i: bool,

    /// Skip class II (DR, DQ, DP) eplets
    #[arg(long)]
    pub no_class_ii: bool,

    /// Count only antibody-verified eplets
    #[arg(long)]
    pub verified_only: bool,

    /// With --verified-only, also count eplets whose verification is questionable
    #[arg(long, requires = "verified_only")]
    pub include_questionable: bool,

    /// Ignore interlocus class II eplets
    #[arg(long)]
    pub no_interlocus: bool,

    /// Row ids to leave out
    #[arg(long, num_args = 1..)]
    pub exclude: Vec<String>,

    /// What to compute
    #[arg(long, value_enum, default_value_t = OutputType::CountAndDetails)]
    pub output: OutputType,

    /// Write CSV results to `<OUT>.csv` (or `<OUT>_removed_donors.csv` and
    /// `<OUT>_removed_recipients.csv`) instead of printing them
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Recipient-minus-donor instead of donor-minus-recipient
    #[arg(long)]
    pub reverse: bool,

    /// Keep parsed reference tables in this directory between runs
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

impl LoadArgs {
    fn options(&self) -> LoadOptions {
        LoadOptions::default()
            .with_classes(!self.no_class_i, !self.no_class_ii)
            .with_verified_only(self.verified_only)
            .with_questionable(self.include_questionable)
            .with_interlocus(!self.no_interlocus)
            .with_exclude(self.exclude.iter().cloned())
            .with_output(self.output)
    }
}

pub fn run(args: LoadArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let (donors, recipients) = parse_typing_file(&args.input)
        .with_context(|| format!("Failed to read typing file {}", args.input.display()))?;

    if verbose {
        eprintln!(
            "Input: {} pairs, {} donor columns",
            donors.len(),
            donors.columns.len()
        );
    }

    let (donors, recipients) = if args.reverse {
        (recipients, donors)
    } else {
        (donors, recipients)
    };

    let cache = match &args.cache_dir {
        Some(dir) => TableCache::new().with_disk_cache(dir),
        None => TableCache::new(),
    };
    let data = DataDirectory::with_cache(&args.data_dir, cache);

    let output = compute_mismatch_load(&data, donors, recipients, &args.options())?;

    if let Some(out) = &args.out {
        return write_output(out, &output, args.output);
    }

    match format {
        OutputFormat::Text => print_text(&output),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Csv => print_csv(&output, args.output)?,
    }

    Ok(())
}

/// Write load rows as CSV: `Index`, then `Eplet Load` and/or `EpMismatches`
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_load_rows<W: Write>(
    writer: W,
    rows: &[LoadRow],
    output: OutputType,
) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);

    let mut header = vec![INDEX_COLUMN];
    if matches!(output, OutputType::Count | OutputType::CountAndDetails) {
        header.push(LOAD_COLUMN);
    }
    if matches!(output, OutputType::Details | OutputType::CountAndDetails) {
        header.push(DETAILS_COLUMN);
    }
    writer.write_record(&header)?;

    for row in rows {
        let mut record = vec![row.id.clone()];
        record.extend(row.load.map(|load| load.to_string()));
        record.extend(row.details.clone());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_output(out: &Path, output: &LoadOutput, output_type: OutputType) -> anyhow::Result<()> {
    match output {
        LoadOutput::Rows(rows) => {
            let path = with_suffix(out, ".csv");
            write_load_rows(create(&path)?, rows, output_type)?;
            info!("Wrote {} rows to {}", rows.len(), path.display());
        }
        LoadOutput::RemovedRows { donors, recipients } => {
            write_removed(&with_suffix(out, "_removed_donors.csv"), donors, DONOR_SUFFIX)?;
            write_removed(
                &with_suffix(out, "_removed_recipients.csv"),
                recipients,
                RECIPIENT_SUFFIX,
            )?;
        }
    }
    Ok(())
}

fn write_removed(path: &Path, table: &TypingTable, suffix: &str) -> anyhow::Result<()> {
    write_typing_table(create(path)?, table, suffix)?;
    info!("Wrote {} removed rows to {}", table.len(), path.display());
    Ok(())
}

fn create(path: &Path) -> anyhow::Result<std::io::BufWriter<std::fs::File>> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(std::io::BufWriter::new(file))
}

/// `results` + `.csv` -> `results.csv`, keeping any dots already in the name
fn with_suffix(out: &Path, suffix: &str) -> PathBuf {
    let mut name = out.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn print_text(output: &LoadOutput) {
    match output {
        LoadOutput::Rows(rows) => {
            println!("Eplet Mismatch Load");
            println!("{}", "=".repeat(60));
            for row in rows {
                match (&row.load, &row.details) {
                    (Some(load), Some(details)) => println!("{}: {} ({})", row.id, load, details),
                    (Some(load), None) => println!("{}: {}", row.id, load),
                    (None, Some(details)) => println!("{}: {}", row.id, details),
                    (None, None) => println!("{}", row.id),
                }
            }
            if rows.is_empty() {
                println!("No pairs left to compare");
            }
        }
        LoadOutput::RemovedRows { donors, recipients } => {
            print_removed_text("Donors", donors);
            print_removed_text("Recipients", recipients);
        }
    }
}

fn print_removed_text(label: &str, table: &TypingTable) {
    println!("{label} removed: {}", table.len());
    for row in &table.rows {
        println!("  {}: {}", row.id, row.alleles.join(" "));
    }
}

fn print_csv(output: &LoadOutput, output_type: OutputType) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    match output {
        LoadOutput::Rows(rows) => write_load_rows(stdout.lock(), rows, output_type)?,
        LoadOutput::RemovedRows { donors, recipients } => {
            write_typing_table(stdout.lock(), donors, DONOR_SUFFIX)?;
            println!();
            write_typing_table(stdout.lock(), recipients, RECIPIENT_SUFFIX)?;
        }
    }
    Ok(())
}
