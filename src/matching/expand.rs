use std::collections::BTreeSet;
use tracing::error;

use crate::catalog::metadata::EpletMetadata;
use crate::catalog::store::{DatabaseError, ReferenceDatabase, ReferenceTable};
use crate::core::allele::{is_interlocus, locus_of};
use crate::core::types::LocusGroup;
use crate::matching::engine::LoadError;

/// How alleles are turned into eplets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionOptions {
    /// Keep interlocus (`r`/`q`/`p`) eplets
    pub include_interlocus: bool,

    /// Keep only eplets confirmed by antibody reactivity
    pub verified_only: bool,

    /// With `verified_only`, also keep eplets whose confirmation is questionable
    pub include_questionable: bool,
}

impl Default for ExpansionOptions {
    fn default() -> Self {
        Self {
            include_interlocus: true,
            verified_only: false,
            include_questionable: false,
        }
    }
}

/// Expand one allele into rendered eplets, in table column order.
///
/// Locus-private eplets are rendered `token_SUFFIX`; interlocus eplets are kept as is
/// and only when `include_interlocus` is set. Ghost alleles expand to nothing.
///
/// # Errors
///
/// Returns `LoadError::Format` for an undefined locus prefix, or `LoadError::Database`
/// if the allele is not in `table` or a `verified_only` lookup misses the metadata.
pub fn expand_allele(
    allele: &str,
    table: &ReferenceTable,
    metadata: &EpletMetadata,
    options: &ExpansionOptions,
) -> Result<Vec<String>, LoadError> {
    let locus = locus_of(allele).inspect_err(|e| error!("{}", e))?;
    let tokens = table
        .eplets(allele)
        .ok_or_else(|| DatabaseError::UnknownAllele {
            allele: allele.to_string(),
            locus,
        })?;

    let mut eplets = Vec::with_capacity(tokens.len());
    for token in tokens {
        let interlocus = is_interlocus(token);

        if options.verified_only {
            let group = if interlocus {
                LocusGroup::Interlocus
            } else {
                locus.group()
            };
            if !metadata.is_accepted(token, group, options.include_questionable)? {
                continue;
            }
        }

        if interlocus {
            if options.include_interlocus {
                eplets.push(token.clone());
            }
        } else {
            eplets.push(format!("{}_{}", token, locus.suffix()));
        }
    }

    Ok(eplets)
}

/// Expands alleles against a whole [`ReferenceDatabase`], picking the table by locus
#[derive(Debug, Clone, Copy)]
pub struct AlleleExpander<'a> {
    db: &'a ReferenceDatabase,
    options: ExpansionOptions,
}

impl<'a> AlleleExpander<'a> {
    pub fn new(db: &'a ReferenceDatabase, options: ExpansionOptions) -> Self {
        Self { db, options }
    }

    pub fn options(&self) -> &ExpansionOptions {
        &self.options
    }

    /// # Errors
    ///
    /// See [`expand_allele`]; also `DatabaseError::TableNotLoaded` if the database has
    /// no table for the allele's locus.
    pub fn expand(&self, allele: &str) -> Result<Vec<String>, LoadError> {
        let locus = locus_of(allele).inspect_err(|e| error!("{}", e))?;
        let table = self
            .db
            .table(locus)
            .ok_or(DatabaseError::TableNotLoaded(locus))?;
        expand_allele(allele, table, self.db.metadata(), &self.options)
    }

    /// Union of the eplets of every allele of one individual
    ///
    /// # Errors
    ///
    /// See [`AlleleExpander::expand`].
    pub fn expand_all<S: AsRef<str>>(&self, alleles: &[S]) -> Result<BTreeSet<String>, LoadError> {
        let mut eplets = BTreeSet::new();
        for allele in alleles {
            eplets.extend(self.expand(allele.as_ref())?);
        }
        Ok(eplets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::allele::FormatError;
    use crate::core::types::{Confirmation, Locus};
    use std::sync::Arc;

    fn dr_table() -> ReferenceTable {
        ReferenceTable::new(Locus::Dr, true)
            .with_allele("DRB1*15:01", ["rq26Y", "13R", "rqp37YA", "30R"])
            .with_ghosts()
    }

    fn metadata() -> EpletMetadata {
        EpletMetadata::new()
            .with_eplet("13R", LocusGroup::Dr, Confirmation::Verified)
            .with_eplet("30R", LocusGroup::Dr, Confirmation::NotVerified)
            .with_eplet("rq26Y", LocusGroup::Interlocus, Confirmation::Verified)
            .with_eplet("rqp37YA", LocusGroup::Interlocus, Confirmation::Questionable)
    }

    #[test]
    fn test_expand_renders_in_column_order() {
        let eplets = expand_allele(
            "DRB1*15:01",
            &dr_table(),
            &metadata(),
            &ExpansionOptions::default(),
        )
        .unwrap();
        assert_eq!(eplets, vec!["rq26Y", "13R_DR", "rqp37YA", "30R_DR"]);
    }

    #[test]
    fn test_expand_without_interlocus() {
        let options = ExpansionOptions {
            include_interlocus: false,
            ..ExpansionOptions::default()
        };
        let eplets = expand_allele("DRB1*15:01", &dr_table(), &metadata(), &options).unwrap();
        assert_eq!(eplets, vec!["13R_DR", "30R_DR"]);
        assert!(eplets.iter().all(|e| !is_interlocus(e)));
    }

    #[test]
    fn test_expand_verified_only() {
        let options = ExpansionOptions {
            verified_only: true,
            ..ExpansionOptions::default()
        };
        let eplets = expand_allele("DRB1*15:01", &dr_table(), &metadata(), &options).unwrap();
        assert_eq!(eplets, vec!["rq26Y", "13R_DR"]);

        let options = ExpansionOptions {
            include_questionable: true,
            ..options
        };
        let eplets = expand_allele("DRB1*15:01", &dr_table(), &metadata(), &options).unwrap();
        assert_eq!(eplets, vec!["rq26Y", "13R_DR", "rqp37YA"]);
    }

    #[test]
    fn test_verified_only_is_subset() {
        let all = expand_allele(
            "DRB1*15:01",
            &dr_table(),
            &metadata(),
            &ExpansionOptions::default(),
        )
        .unwrap();
        let options = ExpansionOptions {
            verified_only: true,
            ..ExpansionOptions::default()
        };
        let verified = expand_allele("DRB1*15:01", &dr_table(), &metadata(), &options).unwrap();
        assert!(verified.iter().all(|e| all.contains(e)));
    }

    #[test]
    fn test_expand_ghost_allele() {
        let eplets = expand_allele(
            "DRB345*",
            &dr_table(),
            &metadata(),
            &ExpansionOptions::default(),
        )
        .unwrap();
        assert!(eplets.is_empty());
    }

    #[test]
    fn test_expand_undefined_locus() {
        let err = expand_allele(
            "E*01:01",
            &dr_table(),
            &metadata(),
            &ExpansionOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            LoadError::Format(FormatError::UndefinedLocus(ref a)) if a == "E*01:01"
        ));
    }

    #[test]
    fn test_verified_only_missing_metadata() {
        let options = ExpansionOptions {
            verified_only: true,
            ..ExpansionOptions::default()
        };
        let err = expand_allele("DRB1*15:01", &dr_table(), &EpletMetadata::new(), &options)
            .unwrap_err();
        assert!(matches!(
            err,
            LoadError::Database(DatabaseError::UnknownEplet { .. })
        ));
    }

    #[test]
    fn test_expander_uses_locus_table() {
        let a = ReferenceTable::new(Locus::A, true)
            .with_allele("A*01:01", ["9F", "44RMA"])
            .with_ghosts();
        let db = ReferenceDatabase::from_tables(
            [Arc::new(a), Arc::new(dr_table())],
            Arc::new(metadata()),
        );
        let expander = AlleleExpander::new(&db, ExpansionOptions::default());

        assert_eq!(expander.expand("A*01:01").unwrap(), vec!["9F_ABC", "44RMA_ABC"]);

        let all = expander.expand_all(&["A*01:01", "DRB1*15:01", "A*"]).unwrap();
        assert_eq!(all.len(), 6);
        assert!(all.contains("13R_DR"));

        let err = expander.expand("DQB1*03:02").unwrap_err();
        assert!(matches!(
            err,
            LoadError::Database(DatabaseError::TableNotLoaded(Locus::Dq))
        ));
    }
}
