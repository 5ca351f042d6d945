use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;

use crate::core::allele::FormatError;
use crate::core::types::Locus;

/// Interlocus eplets sort after every locus-private eplet
pub const INTERLOCUS_RANK_OFFSET: u32 = 1000;

/// Details string of an empty mismatch set
pub const NO_MISMATCH: &str = "None";

lazy_static! {
    static ref LEADING_POSITION: Regex = Regex::new(r"^(\d+)").expect("valid position regex");
    static ref INTERLOCUS_POSITION: Regex =
        Regex::new(r"^[rqp]+(\d+)").expect("valid interlocus position regex");
}

/// Sort key of a rendered eplet: its residue position.
///
/// `9Y_ABC` ranks 9, `rqp37YA` ranks 1037.
///
/// # Errors
///
/// Returns `FormatError::MalformedEplet` if no position can be extracted.
pub fn rank(eplet: &str) -> Result<u32, FormatError> {
    let (captures, offset) = if let Some(c) = LEADING_POSITION.captures(eplet) {
        (c, 0)
    } else if let Some(c) = INTERLOCUS_POSITION.captures(eplet) {
        (c, INTERLOCUS_RANK_OFFSET)
    } else {
        return Err(FormatError::MalformedEplet(eplet.to_string()));
    };

    captures[1]
        .parse::<u32>()
        .ok()
        .and_then(|position| position.checked_add(offset))
        .ok_or_else(|| FormatError::MalformedEplet(eplet.to_string()))
}

/// Eplets sorted by rank. Ties keep the set's lexicographic order.
///
/// # Errors
///
/// Returns `FormatError::MalformedEplet` if any eplet cannot be ranked.
pub fn ranked(eplets: &BTreeSet<String>) -> Result<Vec<&str>, FormatError> {
    let mut keyed = eplets
        .iter()
        .map(|e| Ok((rank(e)?, e.as_str())))
        .collect::<Result<Vec<_>, FormatError>>()?;
    keyed.sort_by_key(|&(rank, _)| rank);
    Ok(keyed.into_iter().map(|(_, e)| e).collect())
}

/// Ranked eplets joined with `", "`, or `"None"` for an empty set.
///
/// # Errors
///
/// Returns `FormatError::MalformedEplet` if any eplet cannot be ranked.
pub fn render(eplets: &BTreeSet<String>) -> Result<String, FormatError> {
    join(ranked(eplets)?)
}

/// Like [`render`], with the `_ABC`/`_DR`/`_DQ`/`_DP` suffix removed from each eplet.
///
/// # Errors
///
/// Returns `FormatError::MalformedEplet` if any eplet cannot be ranked.
pub fn render_without_suffix(eplets: &BTreeSet<String>) -> Result<String, FormatError> {
    join(ranked(eplets)?.into_iter().map(strip_locus_suffix).collect())
}

fn join(eplets: Vec<&str>) -> Result<String, FormatError> {
    if eplets.is_empty() {
        Ok(NO_MISMATCH.to_string())
    } else {
        Ok(eplets.join(", "))
    }
}

/// `26L_DR` -> `26L`. Interlocus eplets carry no suffix and are returned as is.
#[must_use]
pub fn strip_locus_suffix(eplet: &str) -> &str {
    match eplet.rsplit_once('_') {
        Some((token, suffix)) if Locus::ALL.iter().any(|l| l.suffix() == suffix) => token,
        _ => eplet,
    }
}

/// Number of mismatched eplets
#[must_use]
pub fn scalar_load(eplets: &BTreeSet<String>) -> usize {
    eplets.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(eplets: &[&str]) -> BTreeSet<String> {
        eplets.iter().map(|e| (*e).to_string()).collect()
    }

    #[test]
    fn test_rank_locus_eplets() {
        assert_eq!(rank("8L").unwrap(), 8);
        assert_eq!(rank("35FV").unwrap(), 35);
        assert_eq!(rank("9Y_ABC").unwrap(), 9);
        assert_eq!(rank("160S_DQ").unwrap(), 160);
    }

    #[test]
    fn test_rank_interlocus_eplets() {
        assert_eq!(rank("rqp37YA").unwrap(), 1037);
        assert_eq!(rank("rq140TV").unwrap(), 1140);
        assert_eq!(rank("p57E").unwrap(), 1057);
    }

    #[test]
    fn test_rank_malformed() {
        assert_eq!(
            rank("YA").unwrap_err(),
            FormatError::MalformedEplet("YA".to_string())
        );
        assert!(rank("").is_err());
        assert!(rank("x37Y").is_err());
        assert!(rank("99999999999Y").is_err());
    }

    #[test]
    fn test_render_sorts_by_position() {
        let eplets = set(&["116Y_ABC", "12M_ABC", "97R_ABC", "rq26Y", "114H_ABC"]);
        assert_eq!(
            render(&eplets).unwrap(),
            "12M_ABC, 97R_ABC, 114H_ABC, 116Y_ABC, rq26Y"
        );
    }

    #[test]
    fn test_render_ties_are_lexicographic() {
        let eplets = set(&["26Y_DR", "26L_DQ", "26F_DR"]);
        assert_eq!(render(&eplets).unwrap(), "26F_DR, 26L_DQ, 26Y_DR");
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&BTreeSet::new()).unwrap(), "None");
        assert_eq!(render_without_suffix(&BTreeSet::new()).unwrap(), "None");
    }

    #[test]
    fn test_render_without_suffix() {
        let eplets = set(&["97R_ABC", "12M_ABC", "rqp37YA"]);
        assert_eq!(render_without_suffix(&eplets).unwrap(), "12M, 97R, rqp37YA");
    }

    #[test]
    fn test_strip_locus_suffix() {
        assert_eq!(strip_locus_suffix("26L_DR"), "26L");
        assert_eq!(strip_locus_suffix("9Y_ABC"), "9Y");
        assert_eq!(strip_locus_suffix("rq26Y"), "rq26Y");
        assert_eq!(strip_locus_suffix("26L_XY"), "26L_XY");
    }

    #[test]
    fn test_scalar_load() {
        assert_eq!(scalar_load(&BTreeSet::new()), 0);
        assert_eq!(scalar_load(&set(&["9Y_ABC", "rq26Y"])), 2);
    }
}
