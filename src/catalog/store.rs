use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::catalog::cache::{FileSystem, OsFileSystem, TableCache};
use crate::catalog::index::AlleleIndex;
use crate::catalog::metadata::EpletMetadata;
use crate::core::types::{HlaClass, Locus, LocusGroup};

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to read reference data: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Reference table {0} has no 'allele' column")]
    MissingAlleleColumn(PathBuf),

    #[error("Eplet metadata table {path} has no '{column}' column")]
    MissingMetadataColumn { path: PathBuf, column: &'static str },

    #[error("Unknown locus group '{0}' in eplet metadata table")]
    UnknownLocusGroup(String),

    #[error("Eplet {eplet} ({group}) is described more than once in the eplet metadata table")]
    DuplicateEplet { eplet: String, group: LocusGroup },

    #[error("Eplet {eplet} ({group}) is not described in the eplet metadata table")]
    UnknownEplet { eplet: String, group: LocusGroup },

    #[error("Allele {allele} is not in the {locus} reference table")]
    UnknownAllele { allele: String, locus: Locus },

    #[error("No reference table loaded for locus {0}")]
    TableNotLoaded(Locus),

    #[error("Failed to encode cached table: {0}")]
    CacheError(#[from] bincode::Error),
}

/// Allele to eplet lookup table for one locus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceTable {
    pub locus: Locus,

    /// False when only the allele codes were loaded (locus not compared)
    pub includes_eplets: bool,

    /// Allele -> raw eplet tokens in column order
    rows: BTreeMap<String, Vec<String>>,
}

impl ReferenceTable {
    pub fn new(locus: Locus, includes_eplets: bool) -> Self {
        Self {
            locus,
            includes_eplets,
            rows: BTreeMap::new(),
        }
    }

    /// Insert or replace an allele row. Eplets are dropped when the table carries none.
    pub fn insert(&mut self, allele: impl Into<String>, eplets: Vec<String>) {
        let eplets = if self.includes_eplets {
            eplets
        } else {
            Vec::new()
        };
        self.rows.insert(allele.into(), eplets);
    }

    /// Builder-style row insertion
    #[must_use]
    pub fn with_allele<S: Into<String>>(
        mut self,
        allele: impl Into<String>,
        eplets: impl IntoIterator<Item = S>,
    ) -> Self {
        self.insert(allele, eplets.into_iter().map(Into::into).collect());
        self
    }

    /// Add this locus' ghost alleles with no eplets
    #[must_use]
    pub fn with_ghosts(mut self) -> Self {
        for ghost in self.locus.ghost_alleles() {
            self.rows.insert((*ghost).to_string(), Vec::new());
        }
        self
    }

    /// Eplet tokens of an allele, `None` if the allele is unknown
    pub fn eplets(&self, allele: &str) -> Option<&[String]> {
        self.rows.get(allele).map(Vec::as_slice)
    }

    pub fn contains(&self, allele: &str) -> bool {
        self.rows.contains_key(allele)
    }

    pub fn alleles(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Directory holding the per-locus tables (`A.csv` ... `DP.csv`) and `ep_data.csv`.
///
/// Loads go through a [`TableCache`], so repeated loads of an unchanged file are free.
pub struct DataDirectory<F: FileSystem = OsFileSystem> {
    root: PathBuf,
    cache: TableCache<F>,
}

impl DataDirectory<OsFileSystem> {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_cache(root, TableCache::new())
    }
}

impl<F: FileSystem> DataDirectory<F> {
    pub fn with_cache(root: impl Into<PathBuf>, cache: TableCache<F>) -> Self {
        Self {
            root: root.into(),
            cache,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cache(&self) -> &TableCache<F> {
        &self.cache
    }

    pub fn table_path(&self, locus: Locus) -> PathBuf {
        self.root.join(format!("{}.csv", locus.file_stem()))
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root.join("ep_data.csv")
    }

    /// Load the reference table of a locus.
    ///
    /// With `include_eplets == false` the table only lists the known allele codes.
    ///
    /// # Errors
    ///
    /// Returns a `DatabaseError` if the file cannot be read or parsed.
    pub fn load(&self, locus: Locus, include_eplets: bool) -> Result<Arc<ReferenceTable>, DatabaseError> {
        self.cache
            .load_table(&self.table_path(locus), locus, include_eplets)
    }

    /// Load the eplet metadata table.
    ///
    /// # Errors
    ///
    /// Returns a `DatabaseError` if the file cannot be read or parsed.
    pub fn load_metadata(&self) -> Result<Arc<EpletMetadata>, DatabaseError> {
        self.cache.load_metadata(&self.metadata_path())
    }
}

/// Reference tables for every locus plus eplet metadata, ready for expansion
#[derive(Debug, Clone)]
pub struct ReferenceDatabase {
    tables: BTreeMap<Locus, Arc<ReferenceTable>>,
    metadata: Arc<EpletMetadata>,
    index: AlleleIndex,
}

impl ReferenceDatabase {
    /// Build a database from already loaded tables
    pub fn from_tables(
        tables: impl IntoIterator<Item = Arc<ReferenceTable>>,
        metadata: Arc<EpletMetadata>,
    ) -> Self {
        let tables: BTreeMap<Locus, Arc<ReferenceTable>> =
            tables.into_iter().map(|t| (t.locus, t)).collect();
        let index = AlleleIndex::build(tables.values().map(AsRef::as_ref));

        Self {
            tables,
            metadata,
            index,
        }
    }

    /// Load all six locus tables from a data directory. Loci of a class that is not
    /// compared are loaded without eplets; their alleles are still known for filtering.
    ///
    /// # Errors
    ///
    /// Returns a `DatabaseError` if any table or the metadata cannot be loaded.
    pub fn open<F: FileSystem>(
        data: &DataDirectory<F>,
        include_class_i: bool,
        include_class_ii: bool,
    ) -> Result<Self, DatabaseError> {
        let mut tables = Vec::with_capacity(Locus::ALL.len());
        for locus in Locus::ALL {
            let include_eplets = match locus.class() {
                HlaClass::I => include_class_i,
                HlaClass::II => include_class_ii,
            };
            let table = data.load(locus, include_eplets)?;
            debug!(
                "Loaded {} table: {} alleles (eplets: {})",
                locus,
                table.len(),
                include_eplets
            );
            tables.push(table);
        }

        let metadata = data.load_metadata()?;
        debug!("Loaded eplet metadata: {} eplets", metadata.len());

        Ok(Self::from_tables(tables, metadata))
    }

    pub fn table(&self, locus: Locus) -> Option<&ReferenceTable> {
        self.tables.get(&locus).map(AsRef::as_ref)
    }

    pub fn metadata(&self) -> &EpletMetadata {
        &self.metadata
    }

    /// Is this allele listed in any locus table?
    pub fn is_known(&self, allele: &str) -> bool {
        self.index.contains(allele)
    }
}
