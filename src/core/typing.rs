use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One individual's typing: a caller-supplied row id plus one allele per column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingRow {
    pub id: String,

    /// Alleles, aligned with the owning table's columns
    pub alleles: Vec<String>,
}

impl TypingRow {
    pub fn new<S: Into<String>>(id: impl Into<String>, alleles: impl IntoIterator<Item = S>) -> Self {
        Self {
            id: id.into(),
            alleles: alleles.into_iter().map(Into::into).collect(),
        }
    }
}

/// A donor or recipient typing table.
///
/// Columns are named `<gene><slot>` (`A1`, `A2`, `DRB11`, `DRB12`, ...), two per locus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingTable {
    pub columns: Vec<String>,
    pub rows: Vec<TypingRow>,
}

impl TypingTable {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Builder-style row insertion
    #[must_use]
    pub fn with_row<S: Into<String>>(
        mut self,
        id: impl Into<String>,
        alleles: impl IntoIterator<Item = S>,
    ) -> Self {
        self.push(TypingRow::new(id, alleles));
        self
    }

    pub fn push(&mut self, row: TypingRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn ids(&self) -> HashSet<&str> {
        self.rows.iter().map(|r| r.id.as_str()).collect()
    }

    /// Remove every row whose id is listed
    pub fn drop_ids(&mut self, ids: &[String]) {
        if ids.is_empty() {
            return;
        }
        let excluded: HashSet<&str> = ids.iter().map(String::as_str).collect();
        self.rows.retain(|row| !excluded.contains(row.id.as_str()));
    }

    /// Apply `f` to every allele cell in place
    pub fn map_alleles(&mut self, f: impl Fn(&str) -> String) {
        for row in &mut self.rows {
            for allele in &mut row.alleles {
                *allele = f(allele);
            }
        }
    }

    /// Same columns, no rows
    #[must_use]
    pub fn empty_like(&self) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: Vec::new(),
        }
    }
}
