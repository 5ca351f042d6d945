//! Comparison of two alleles of the same locus.

use serde::Serialize;

use crate::catalog::cache::FileSystem;
use crate::catalog::store::{DataDirectory, DatabaseError, ReferenceDatabase};
use crate::core::allele::{locus_of, normalize_null};
use crate::core::typing::TypingTable;
use crate::matching::engine::{mismatch_results, LoadError, LoadOptions, OutputType};
use crate::matching::expand::ExpansionOptions;
use crate::matching::render::render_without_suffix;
use crate::utils::validation::{is_valid_allele, same_locus, ValidationError};

/// Eplets of one allele missing from the other
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlleleComparison {
    /// `In <a> but not in <b>`
    pub id: String,
    pub load: usize,
    /// Ranked eplets without locus suffix, or `None`
    pub details: String,
}

/// Compare two alleles both ways.
///
/// Returns two rows, `In first but not in second` then `In second but not in first`.
///
/// # Errors
///
/// Returns `ValidationError::InvalidAllele` if a code lacks `*` or `:`,
/// `ValidationError::DifferentLoci` if the alleles are not of the same locus,
/// `DatabaseError::UnknownAllele` if an allele is not in the reference data, or any
/// error of [`compute_mismatch_load`](crate::matching::engine::compute_mismatch_load).
pub fn compare_alleles<F: FileSystem>(
    data: &DataDirectory<F>,
    first: &str,
    second: &str,
    options: ExpansionOptions,
) -> Result<Vec<AlleleComparison>, LoadError> {
    validate_pair(first, second)?;
    let db = ReferenceDatabase::open(data, true, true)?;
    compare_alleles_with_database(&db, first, second, options)
}

/// [`compare_alleles`] against an already opened database.
///
/// # Errors
///
/// See [`compare_alleles`].
pub fn compare_alleles_with_database(
    db: &ReferenceDatabase,
    first: &str,
    second: &str,
    options: ExpansionOptions,
) -> Result<Vec<AlleleComparison>, LoadError> {
    validate_pair(first, second)?;

    for allele in [first, second] {
        if !db.is_known(&normalize_null(allele)) {
            return Err(DatabaseError::UnknownAllele {
                allele: allele.to_string(),
                locus: locus_of(allele)?,
            }
            .into());
        }
    }

    let forward = format!("In {first} but not in {second}");
    let backward = format!("In {second} but not in {first}");
    let donors = TypingTable::new(["allele"])
        .with_row(forward.as_str(), [first])
        .with_row(backward.as_str(), [second]);
    let recipients = TypingTable::new(["allele"])
        .with_row(forward.as_str(), [second])
        .with_row(backward.as_str(), [first]);

    let load_options = LoadOptions {
        verified_only: options.verified_only,
        include_questionable: options.include_questionable,
        include_interlocus: options.include_interlocus,
        output: OutputType::CountAndDetails,
        check_parity: false,
        ..LoadOptions::default()
    };

    mismatch_results(db, donors, recipients, &load_options)?
        .into_iter()
        .map(|result| -> Result<AlleleComparison, LoadError> {
            Ok(AlleleComparison {
                load: result.load(),
                details: render_without_suffix(&result.eplets)?,
                id: result.id,
            })
        })
        .collect()
}

fn validate_pair(first: &str, second: &str) -> Result<(), ValidationError> {
    for allele in [first, second] {
        if !is_valid_allele(allele) {
            return Err(ValidationError::InvalidAllele(allele.to_string()));
        }
    }
    if !same_locus(first, second) {
        return Err(ValidationError::DifferentLoci {
            first: first.to_string(),
            second: second.to_string(),
        });
    }
    Ok(())
}
