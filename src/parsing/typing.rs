use flate2::read::GzDecoder;
use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

use crate::core::typing::{TypingRow, TypingTable};
use crate::parsing::reference::detect_delimiter;
use crate::utils::validation::{check_row_limit, MAX_TYPING_ROWS};

pub const DONOR_SUFFIX: &str = "_D";
pub const RECIPIENT_SUFFIX: &str = "_R";

/// Header of the row id column in written tables
pub const INDEX_COLUMN: &str = "Index";

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid typing file: {0}")]
    InvalidFormat(String),

    #[error("Too many rows: {0} exceeds maximum allowed ({MAX_TYPING_ROWS})")]
    TooManyRows(usize),
}

/// Parse a combined donor/recipient typing file.
///
/// The first column holds the row id; the other columns are named `<gene><slot>_D` or
/// `<gene><slot>_R`. Columns with neither suffix are ignored. `.gz` files are
/// decompressed; `.tsv` files are tab-separated, anything else uses `;` or `,`.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, `ParseError::Csv` for malformed
/// rows, `ParseError::InvalidFormat` for a bad header or duplicate ids, or
/// `ParseError::TooManyRows` if the limit is exceeded.
pub fn parse_typing_file(path: &Path) -> Result<(TypingTable, TypingTable), ParseError> {
    let file = std::fs::File::open(path)?;
    let mut bytes = Vec::new();

    let inner = if has_extension(path, "gz") {
        GzDecoder::new(file).read_to_end(&mut bytes)?;
        path.with_extension("")
    } else {
        std::io::BufReader::new(file).read_to_end(&mut bytes)?;
        path.to_path_buf()
    };

    let delimiter = if has_extension(&inner, "tsv") {
        b'\t'
    } else {
        detect_delimiter(&bytes)
    };
    parse_typing_bytes(&bytes, delimiter)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Parse combined typing text already in memory.
///
/// # Errors
///
/// See [`parse_typing_file`].
pub fn parse_typing_bytes(
    bytes: &[u8],
    delimiter: u8,
) -> Result<(TypingTable, TypingTable), ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(ParseError::InvalidFormat("empty header".to_string()));
    }

    let mut donor_columns = Vec::new();
    let mut recipient_columns = Vec::new();
    for (i, name) in headers.iter().enumerate().skip(1) {
        if let Some(column) = name.strip_suffix(DONOR_SUFFIX) {
            donor_columns.push((i, column.to_string()));
        } else if let Some(column) = name.strip_suffix(RECIPIENT_SUFFIX) {
            recipient_columns.push((i, column.to_string()));
        }
    }

    if donor_columns.is_empty() || recipient_columns.is_empty() {
        return Err(ParseError::InvalidFormat(format!(
            "expected columns ending in {DONOR_SUFFIX} and {RECIPIENT_SUFFIX}"
        )));
    }

    let mut donors = TypingTable::new(donor_columns.iter().map(|(_, c)| c.as_str()));
    let mut recipients = TypingTable::new(recipient_columns.iter().map(|(_, c)| c.as_str()));
    let mut seen = HashSet::new();

    for (line, record) in reader.records().enumerate() {
        let record = record?;

        if check_row_limit(donors.len()).is_some() {
            return Err(ParseError::TooManyRows(donors.len()));
        }

        let id = record.get(0).unwrap_or_default();
        if id.is_empty() {
            // Header is line 1
            return Err(ParseError::InvalidFormat(format!(
                "line {} has no row id",
                line + 2
            )));
        }
        if !seen.insert(id.to_string()) {
            return Err(ParseError::InvalidFormat(format!("duplicate row id '{id}'")));
        }

        let cells = |columns: &[(usize, String)]| -> Vec<String> {
            columns
                .iter()
                .map(|(i, _)| record.get(*i).unwrap_or_default().to_string())
                .collect()
        };
        donors.push(TypingRow::new(id, cells(&donor_columns)));
        recipients.push(TypingRow::new(id, cells(&recipient_columns)));
    }

    Ok((donors, recipients))
}

/// Write a typing table as CSV, appending `column_suffix` to each allele column.
///
/// # Errors
///
/// Returns `ParseError::Csv` or `ParseError::Io` if writing fails.
pub fn write_typing_table<W: Write>(
    writer: W,
    table: &TypingTable,
    column_suffix: &str,
) -> Result<(), ParseError> {
    let mut writer = csv::Writer::from_writer(writer);

    let mut header = vec![INDEX_COLUMN.to_string()];
    header.extend(table.columns.iter().map(|c| format!("{c}{column_suffix}")));
    writer.write_record(&header)?;

    for row in &table.rows {
        writer.write_record(std::iter::once(&row.id).chain(&row.alleles))?;
    }
    writer.flush()?;
    Ok(())
}
