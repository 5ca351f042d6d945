//! Centralized validation and input limits.

use crate::core::allele::gene;

/// Maximum number of rows allowed in a single typing file (DOS protection)
pub const MAX_TYPING_ROWS: usize = 1_000_000;

/// Genes treated as one locus when comparing two alleles
pub const DRB_FAMILY: &[&str] = &["DRB1", "DRB3", "DRB4", "DRB5"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Donor and recipient tables have a different number of rows ({donors} vs {recipients})")]
    RowCountMismatch { donors: usize, recipients: usize },

    #[error(
        "Row {row}: unknown {gene} alleles must be either absent, in the second slot of a \
         homozygote on both sides, or fill every {gene} slot of donor and recipient"
    )]
    UnknownAlleleParity { row: String, gene: String },

    #[error("Allele '{0}' is not valid: expected a code such as A*01:01")]
    InvalidAllele(String),

    #[error("Alleles {first} and {second} are not of the same locus")]
    DifferentLoci { first: String, second: String },
}

/// Syntactic check for a typed allele: needs both `*` and `:`.
///
/// # Examples
///
/// ```
/// use eplet_load::utils::validation::is_valid_allele;
///
/// assert!(is_valid_allele("A*01:01"));
/// assert!(!is_valid_allele("A*01"));
/// assert!(!is_valid_allele("A01:01"));
/// ```
#[must_use]
pub fn is_valid_allele(allele: &str) -> bool {
    allele.contains('*') && allele.contains(':')
}

/// Two alleles share a locus if their genes match, or both are DRB1/3/4/5.
#[must_use]
pub fn same_locus(first: &str, second: &str) -> bool {
    let (a, b) = (gene(first), gene(second));
    a == b || (DRB_FAMILY.contains(&a) && DRB_FAMILY.contains(&b))
}

/// Check if adding another row would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new row.
/// Returns an error message if adding would exceed the limit, None if safe to add.
#[must_use]
pub fn check_row_limit(count: usize) -> Option<String> {
    if count >= MAX_TYPING_ROWS {
        Some(format!(
            "Too many rows: adding another would exceed maximum of {MAX_TYPING_ROWS}"
        ))
    } else {
        None
    }
}

/// Donor and recipient tables are compared row by row, so they need the same length.
///
/// # Errors
///
/// Returns `ValidationError::RowCountMismatch` if the lengths differ.
pub fn check_row_counts(donors: usize, recipients: usize) -> Result<(), ValidationError> {
    if donors == recipients {
        Ok(())
    } else {
        Err(ValidationError::RowCountMismatch { donors, recipients })
    }
}
