use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::store::DatabaseError;
use crate::core::types::{Confirmation, LocusGroup};

/// Confirmation status of each eplet, keyed by (locus group, eplet token).
///
/// The same token can describe different eplets on different loci (`26L` exists on
/// both DR and DQ), hence the group in the key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpletMetadata {
    entries: BTreeMap<LocusGroup, BTreeMap<String, Confirmation>>,
}

impl EpletMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an eplet.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::DuplicateEplet` if (eplet, group) is already present.
    pub fn insert(
        &mut self,
        eplet: impl Into<String>,
        group: LocusGroup,
        confirmation: Confirmation,
    ) -> Result<(), DatabaseError> {
        let eplet = eplet.into();
        let by_eplet = self.entries.entry(group).or_default();
        if by_eplet.contains_key(&eplet) {
            return Err(DatabaseError::DuplicateEplet { eplet, group });
        }
        by_eplet.insert(eplet, confirmation);
        Ok(())
    }

    /// Builder-style insertion for fixtures; later duplicates replace earlier ones
    #[must_use]
    pub fn with_eplet(mut self, eplet: &str, group: LocusGroup, confirmation: Confirmation) -> Self {
        self.entries
            .entry(group)
            .or_default()
            .insert(eplet.to_string(), confirmation);
        self
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::UnknownEplet` if the eplet is not described.
    pub fn confirmation(&self, eplet: &str, group: LocusGroup) -> Result<Confirmation, DatabaseError> {
        self.entries
            .get(&group)
            .and_then(|by_eplet| by_eplet.get(eplet))
            .copied()
            .ok_or_else(|| DatabaseError::UnknownEplet {
                eplet: eplet.to_string(),
                group,
            })
    }

    /// Should this eplet count when only verified eplets are requested?
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::UnknownEplet` if the eplet is not described.
    pub fn is_accepted(
        &self,
        eplet: &str,
        group: LocusGroup,
        include_questionable: bool,
    ) -> Result<bool, DatabaseError> {
        Ok(match self.confirmation(eplet, group)? {
            Confirmation::Verified => true,
            Confirmation::Questionable => include_questionable,
            Confirmation::NotVerified => false,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
