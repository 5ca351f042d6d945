use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::cache::FileSystem;
use crate::catalog::store::{DataDirectory, DatabaseError, ReferenceDatabase};
use crate::core::allele::{normalize_null, FormatError};
use crate::core::typing::{TypingRow, TypingTable};
use crate::matching::expand::{AlleleExpander, ExpansionOptions};
use crate::matching::filter::{filter_unknown, find_parity_violation, intersect_by_index};
use crate::matching::render::{render, scalar_load};
use crate::utils::validation::{check_row_counts, ValidationError};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// What a load computation returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputType {
    /// Number of mismatched eplets per row
    Count,
    /// Ranked mismatched eplets per row
    Details,
    /// Both count and details
    #[default]
    CountAndDetails,
    /// Rows dropped because an allele is not in the reference data
    RemovedRows,
}

impl OutputType {
    fn has_count(self) -> bool {
        matches!(self, Self::Count | Self::CountAndDetails)
    }

    fn has_details(self) -> bool {
        matches!(self, Self::Details | Self::CountAndDetails)
    }
}

/// Options of [`compute_mismatch_load`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    pub include_class_i: bool,
    pub include_class_ii: bool,
    pub verified_only: bool,
    pub include_questionable: bool,
    pub include_interlocus: bool,

    /// Row ids dropped from both tables before anything else
    pub exclude: Vec<String>,

    pub output: OutputType,

    /// Reject inconsistent wildcard placement (see
    /// [`find_parity_violation`](crate::matching::filter::find_parity_violation))
    pub check_parity: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            include_class_i: true,
            include_class_ii: true,
            verified_only: false,
            include_questionable: false,
            include_interlocus: true,
            exclude: Vec::new(),
            output: OutputType::default(),
            check_parity: true,
        }
    }
}

impl LoadOptions {
    #[must_use]
    pub fn with_classes(mut self, class_i: bool, class_ii: bool) -> Self {
        self.include_class_i = class_i;
        self.include_class_ii = class_ii;
        self
    }

    #[must_use]
    pub fn with_verified_only(mut self, verified_only: bool) -> Self {
        self.verified_only = verified_only;
        self
    }

    #[must_use]
    pub fn with_questionable(mut self, include_questionable: bool) -> Self {
        self.include_questionable = include_questionable;
        self
    }

    #[must_use]
    pub fn with_interlocus(mut self, include_interlocus: bool) -> Self {
        self.include_interlocus = include_interlocus;
        self
    }

    #[must_use]
    pub fn with_exclude(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exclude = ids.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_output(mut self, output: OutputType) -> Self {
        self.output = output;
        self
    }

    #[must_use]
    pub fn without_parity_check(mut self) -> Self {
        self.check_parity = false;
        self
    }

    pub fn expansion(&self) -> ExpansionOptions {
        ExpansionOptions {
            include_interlocus: self.include_interlocus,
            verified_only: self.verified_only,
            include_questionable: self.include_questionable,
        }
    }
}

/// Eplets present on one side of a row pair but not on the other
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MismatchResult {
    pub id: String,
    pub eplets: BTreeSet<String>,
}

impl MismatchResult {
    pub fn load(&self) -> usize {
        scalar_load(&self.eplets)
    }

    /// # Errors
    ///
    /// Returns `FormatError::MalformedEplet` if an eplet cannot be ranked.
    pub fn details(&self) -> Result<String, FormatError> {
        render(&self.eplets)
    }
}

/// One output row. Fields not requested by the [`OutputType`] are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadRow {
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub load: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LoadRow {
    fn from_result(result: &MismatchResult, output: OutputType) -> Result<Self, FormatError> {
        Ok(Self {
            id: result.id.clone(),
            load: output.has_count().then(|| result.load()),
            details: if output.has_details() {
                Some(result.details()?)
            } else {
                None
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadOutput {
    Rows(Vec<LoadRow>),

    /// Rows dropped for unknown alleles on each side
    RemovedRows {
        donors: TypingTable,
        recipients: TypingTable,
    },
}

/// Donor-minus-recipient and recipient-minus-donor, row for row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BidirectionalLoad {
    pub forward: Vec<MismatchResult>,
    pub reverse: Vec<MismatchResult>,
}

/// Per-row eplet sets and their differences
pub struct MismatchEngine<'a> {
    expander: AlleleExpander<'a>,
}

impl<'a> MismatchEngine<'a> {
    pub fn new(db: &'a ReferenceDatabase, options: ExpansionOptions) -> Self {
        Self {
            expander: AlleleExpander::new(db, options),
        }
    }

    /// Union of all eplets of one individual
    ///
    /// # Errors
    ///
    /// Returns a `LoadError` if an allele cannot be expanded.
    pub fn eplet_set(&self, row: &TypingRow) -> Result<BTreeSet<String>, LoadError> {
        self.expander.expand_all(&row.alleles)
    }

    /// `donor − recipient` for each donor row, in donor order. Rows are paired by id;
    /// donor rows with no recipient are skipped.
    ///
    /// # Errors
    ///
    /// Returns a `LoadError` if an allele cannot be expanded.
    pub fn compute(
        &self,
        donors: &TypingTable,
        recipients: &TypingTable,
    ) -> Result<Vec<MismatchResult>, LoadError> {
        Ok(self
            .paired_sets(donors, recipients)?
            .into_iter()
            .map(|(id, donor, recipient)| MismatchResult {
                id,
                eplets: donor.difference(&recipient).cloned().collect(),
            })
            .collect())
    }

    /// Both directions from one expansion pass.
    ///
    /// # Errors
    ///
    /// Returns a `LoadError` if an allele cannot be expanded.
    pub fn compute_bidirectional(
        &self,
        donors: &TypingTable,
        recipients: &TypingTable,
    ) -> Result<BidirectionalLoad, LoadError> {
        let (forward, reverse) = self
            .paired_sets(donors, recipients)?
            .into_iter()
            .map(|(id, donor, recipient)| {
                (
                    MismatchResult {
                        id: id.clone(),
                        eplets: donor.difference(&recipient).cloned().collect(),
                    },
                    MismatchResult {
                        id,
                        eplets: recipient.difference(&donor).cloned().collect(),
                    },
                )
            })
            .unzip();

        Ok(BidirectionalLoad { forward, reverse })
    }

    fn paired_sets(
        &self,
        donors: &TypingTable,
        recipients: &TypingTable,
    ) -> Result<Vec<(String, BTreeSet<String>, BTreeSet<String>)>, LoadError> {
        let by_id: HashMap<&str, &TypingRow> = recipients
            .rows
            .iter()
            .map(|row| (row.id.as_str(), row))
            .collect();

        let pairs: Vec<(&TypingRow, &TypingRow)> = donors
            .rows
            .iter()
            .filter_map(|donor| by_id.get(donor.id.as_str()).map(|r| (donor, *r)))
            .collect();

        pairs
            .par_iter()
            .map(|(donor, recipient)| -> Result<_, LoadError> {
                Ok((
                    donor.id.clone(),
                    self.eplet_set(donor)?,
                    self.eplet_set(recipient)?,
                ))
            })
            .collect()
    }
}

/// Kept and removed rows of both tables after unknown-allele filtering
struct Filtered {
    donors: TypingTable,
    recipients: TypingTable,
    removed_donors: TypingTable,
    removed_recipients: TypingTable,
}

/// Checks that need no reference data: exclusion, row counts, wildcard parity.
fn prepare(
    mut donors: TypingTable,
    mut recipients: TypingTable,
    options: &LoadOptions,
) -> Result<(TypingTable, TypingTable), LoadError> {
    if !options.include_class_i && !options.include_class_ii {
        warn!("Neither class I nor class II eplets were requested; every load will be empty");
    }

    donors.drop_ids(&options.exclude);
    recipients.drop_ids(&options.exclude);

    check_row_counts(donors.len(), recipients.len())?;

    if options.check_parity {
        if let Some(violation) = find_parity_violation(&donors, &recipients) {
            return Err(violation.into());
        }
    }

    Ok((donors, recipients))
}

/// Null alleles to ghosts, then drop rows with alleles unknown to the database
fn filter(db: &ReferenceDatabase, mut donors: TypingTable, mut recipients: TypingTable) -> Filtered {
    donors.map_alleles(normalize_null);
    recipients.map_alleles(normalize_null);

    let (donors, removed_donors) = filter_unknown(donors, db);
    let (recipients, removed_recipients) = filter_unknown(recipients, db);

    if !removed_donors.is_empty() || !removed_recipients.is_empty() {
        warn!(
            "Some alleles were not found in the reference data; {} donor and {} recipient rows \
             were removed (use the removed-rows output to list them)",
            removed_donors.len(),
            removed_recipients.len()
        );
    }

    Filtered {
        donors,
        recipients,
        removed_donors,
        removed_recipients,
    }
}

fn compute_prepared(
    db: &ReferenceDatabase,
    donors: TypingTable,
    recipients: TypingTable,
    options: &LoadOptions,
) -> Result<LoadOutput, LoadError> {
    let filtered = filter(db, donors, recipients);

    if options.output == OutputType::RemovedRows {
        return Ok(LoadOutput::RemovedRows {
            donors: filtered.removed_donors,
            recipients: filtered.removed_recipients,
        });
    }

    let (donors, recipients) = intersect_by_index(filtered.donors, filtered.recipients);
    debug!("Comparing {} row pairs", donors.len());

    let results = MismatchEngine::new(db, options.expansion()).compute(&donors, &recipients)?;
    let rows = results
        .iter()
        .map(|result| LoadRow::from_result(result, options.output))
        .collect::<Result<Vec<_>, _>>()?;

    info!("Computed mismatch load for {} rows", rows.len());
    Ok(LoadOutput::Rows(rows))
}

/// Compute the donor-minus-recipient mismatch load of every row pair.
///
/// Pipeline: exclude ids, check row counts and wildcard parity, load the reference
/// tables, normalize null alleles, drop rows with unknown alleles (or return them for
/// [`OutputType::RemovedRows`]), keep ids present on both sides, then expand and diff.
///
/// # Errors
///
/// Returns `LoadError::Validation` on a row-count or parity failure,
/// `LoadError::Database` if the reference data cannot be loaded or lacks an eplet, or
/// `LoadError::Format` for an undefined locus or unrankable eplet.
pub fn compute_mismatch_load<F: FileSystem>(
    data: &DataDirectory<F>,
    donors: TypingTable,
    recipients: TypingTable,
    options: &LoadOptions,
) -> Result<LoadOutput, LoadError> {
    let (donors, recipients) = prepare(donors, recipients, options)?;
    let db = ReferenceDatabase::open(data, options.include_class_i, options.include_class_ii)?;
    compute_prepared(&db, donors, recipients, options)
}

/// Same as [`compute_mismatch_load`] against an already opened database.
///
/// The database decides which classes carry eplets; the class flags of `options` only
/// drive the warning when neither is requested.
///
/// # Errors
///
/// See [`compute_mismatch_load`].
pub fn compute_with_database(
    db: &ReferenceDatabase,
    donors: TypingTable,
    recipients: TypingTable,
    options: &LoadOptions,
) -> Result<LoadOutput, LoadError> {
    let (donors, recipients) = prepare(donors, recipients, options)?;
    compute_prepared(db, donors, recipients, options)
}

/// Both mismatch directions in one call. `options.output` is ignored.
///
/// # Errors
///
/// See [`compute_mismatch_load`].
pub fn compute_bidirectional_load<F: FileSystem>(
    data: &DataDirectory<F>,
    donors: TypingTable,
    recipients: TypingTable,
    options: &LoadOptions,
) -> Result<BidirectionalLoad, LoadError> {
    let (donors, recipients) = prepare(donors, recipients, options)?;
    let db = ReferenceDatabase::open(data, options.include_class_i, options.include_class_ii)?;
    bidirectional_with_database(&db, donors, recipients, options)
}

pub(crate) fn bidirectional_with_database(
    db: &ReferenceDatabase,
    donors: TypingTable,
    recipients: TypingTable,
    options: &LoadOptions,
) -> Result<BidirectionalLoad, LoadError> {
    let filtered = filter(db, donors, recipients);
    let (donors, recipients) = intersect_by_index(filtered.donors, filtered.recipients);
    MismatchEngine::new(db, options.expansion()).compute_bidirectional(&donors, &recipients)
}

/// Mismatch sets for already validated tables, used by the two-allele comparison
pub(crate) fn mismatch_results(
    db: &ReferenceDatabase,
    donors: TypingTable,
    recipients: TypingTable,
    options: &LoadOptions,
) -> Result<Vec<MismatchResult>, LoadError> {
    let (donors, recipients) = prepare(donors, recipients, options)?;
    let filtered = filter(db, donors, recipients);
    let (donors, recipients) = intersect_by_index(filtered.donors, filtered.recipients);
    MismatchEngine::new(db, options.expansion()).compute(&donors, &recipients)
}
