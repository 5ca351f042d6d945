use std::collections::HashSet;

use super::store::ReferenceTable;

/// Union of the allele codes of every locus table
#[derive(Debug, Clone, Default)]
pub struct AlleleIndex {
    alleles: HashSet<String>,
}

impl AlleleIndex {
    pub fn build<'a>(tables: impl IntoIterator<Item = &'a ReferenceTable>) -> Self {
        let alleles = tables
            .into_iter()
            .flat_map(|table| table.alleles().map(str::to_string))
            .collect();
        Self { alleles }
    }

    pub fn contains(&self, allele: &str) -> bool {
        self.alleles.contains(allele)
    }

    pub fn len(&self) -> usize {
        self.alleles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alleles.is_empty()
    }
}
