//! Allele code helpers: locus dispatch, null-allele normalization and eplet classification.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::core::types::Locus;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Allele {0} belongs to an undefined locus")]
    UndefinedLocus(String),

    #[error("Eplet {0} does not have the expected format")]
    MalformedEplet(String),
}

/// Allele prefix to locus, checked in order. Adding a locus is one line here.
const LOCUS_PREFIXES: &[(&str, Locus)] = &[
    ("A", Locus::A),
    ("B", Locus::B),
    ("C", Locus::C),
    ("DR", Locus::Dr),
    ("DQ", Locus::Dq),
    ("DP", Locus::Dp),
];

lazy_static! {
    /// `<stem>*` followed by anything and ending in `N`
    static ref NULL_ALLELE: Regex = Regex::new(r"^(.*\*).*N$").expect("valid null-allele regex");
}

/// Resolve the locus of an allele from its prefix.
///
/// # Errors
///
/// Returns `FormatError::UndefinedLocus` when no known prefix matches.
pub fn locus_of(allele: &str) -> Result<Locus, FormatError> {
    LOCUS_PREFIXES
        .iter()
        .find(|(prefix, _)| allele.starts_with(prefix))
        .map(|&(_, locus)| locus)
        .ok_or_else(|| FormatError::UndefinedLocus(allele.to_string()))
}

/// Rewrite a null allele (`A*01:15N`) to the ghost allele of its gene (`A*`).
/// Any other code is returned unchanged.
#[must_use]
pub fn normalize_null(allele: &str) -> String {
    NULL_ALLELE.replace(allele, "$1").into_owned()
}

/// Gene part of an allele code, i.e. everything before the first `*`
#[must_use]
pub fn gene(allele: &str) -> &str {
    allele.split('*').next().unwrap_or(allele)
}

/// A ghost allele is a gene stem followed by a single trailing `*`
#[must_use]
pub fn is_ghost(allele: &str) -> bool {
    allele
        .strip_suffix('*')
        .is_some_and(|stem| !stem.is_empty() && !stem.contains('*'))
}

/// Interlocus eplets are shared by DR/DQ/DP and start with `r`, `q` or `p`
#[must_use]
pub fn is_interlocus(eplet: &str) -> bool {
    eplet.starts_with(['r', 'q', 'p'])
}
