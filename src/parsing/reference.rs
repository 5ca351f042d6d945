use std::path::Path;

use crate::catalog::metadata::EpletMetadata;
use crate::catalog::store::{DatabaseError, ReferenceTable};
use crate::core::types::{Confirmation, Locus, LocusGroup};

/// Pick `;` or `,` from the header line. Reference exports use `;`.
pub fn detect_delimiter(bytes: &[u8]) -> u8 {
    let header = bytes.split(|&b| b == b'\n').next().unwrap_or_default();
    if header.contains(&b';') {
        b';'
    } else if header.contains(&b'\t') {
        b'\t'
    } else {
        b','
    }
}

fn reader(bytes: &[u8]) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(bytes))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes)
}

/// Parse one locus reference table: an `allele` column plus one column per eplet slot.
///
/// Empty cells are skipped. The locus ghost alleles are appended with no eplets.
///
/// # Errors
///
/// Returns `DatabaseError::MissingAlleleColumn` if there is no `allele` header, or
/// `DatabaseError::ParseError` for malformed CSV.
pub fn parse_reference_table(
    bytes: &[u8],
    path: &Path,
    locus: Locus,
    include_eplets: bool,
) -> Result<ReferenceTable, DatabaseError> {
    let csv_error = |source| DatabaseError::ParseError {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = reader(bytes);
    let allele_column = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .position(|h| h.eq_ignore_ascii_case("allele"))
        .ok_or_else(|| DatabaseError::MissingAlleleColumn(path.to_path_buf()))?;

    let mut table = ReferenceTable::new(locus, include_eplets);
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let Some(allele) = record.get(allele_column).filter(|a| !a.is_empty()) else {
            continue;
        };

        let eplets = if include_eplets {
            record
                .iter()
                .enumerate()
                .filter(|&(i, cell)| i != allele_column && !cell.is_empty())
                .map(|(_, cell)| cell.to_string())
                .collect()
        } else {
            Vec::new()
        };
        table.insert(allele, eplets);
    }

    Ok(table.with_ghosts())
}

/// Parse the eplet metadata table (`eplet`, `locus`, `confirmation` columns).
///
/// # Errors
///
/// Returns `DatabaseError::MissingMetadataColumn` if a required header is absent,
/// `DatabaseError::UnknownLocusGroup` for an unrecognised `locus` value,
/// `DatabaseError::DuplicateEplet` if an (eplet, locus) pair repeats, or
/// `DatabaseError::ParseError` for malformed CSV.
pub fn parse_metadata(bytes: &[u8], path: &Path) -> Result<EpletMetadata, DatabaseError> {
    let csv_error = |source| DatabaseError::ParseError {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = reader(bytes);
    let headers = reader.headers().map_err(csv_error)?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| DatabaseError::MissingMetadataColumn {
                path: path.to_path_buf(),
                column: name,
            })
    };
    let eplet_column = column("eplet")?;
    let locus_column = column("locus")?;
    let confirmation_column = column("confirmation")?;

    let mut metadata = EpletMetadata::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let eplet = record.get(eplet_column).unwrap_or_default();
        if eplet.is_empty() {
            continue;
        }

        let locus = record.get(locus_column).unwrap_or_default();
        let group =
            LocusGroup::parse(locus).ok_or_else(|| DatabaseError::UnknownLocusGroup(locus.to_string()))?;
        let confirmation = Confirmation::parse(record.get(confirmation_column).unwrap_or_default());

        metadata.insert(eplet, group, confirmation)?;
    }

    Ok(metadata)
}
