//! # eplet-load
//!
//! A library for computing HLA eplet mismatch load between transplant donors and
//! recipients.
//!
//! Every typed allele is expanded into eplets (short polymorphic residue patterns)
//! through curated per-locus reference tables. The mismatch load of a donor/recipient
//! pair is the set of eplets carried by the donor but not by the recipient.
//!
//! ## Features
//!
//! - **All six loci**: A, B, C (class I) and DR, DQ, DP (class II)
//! - **Null and unknown alleles**: `A*01:15N` and `A*` contribute no eplets
//! - **Interlocus eplets**: shared DR/DQ/DP eplets can be counted or ignored
//! - **Verified-only mode**: restrict to antibody-verified eplets
//! - **Filtering**: rows with alleles missing from the reference data are set aside
//! - **Deterministic output**: eplets ranked by residue position
//!
//! ## Example
//!
//! ```rust,no_run
//! use eplet_load::catalog::store::DataDirectory;
//! use eplet_load::matching::expand::ExpansionOptions;
//! use eplet_load::matching::simple::compare_alleles;
//!
//! let data = DataDirectory::new("data");
//! let rows = compare_alleles(&data, "A*68:01", "A*68:02", ExpansionOptions::default()).unwrap();
//!
//! for row in rows {
//!     println!("{}: {} ({})", row.id, row.load, row.details);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: Reference tables, eplet metadata and their cache
//! - [`core`]: Loci, allele codes and typing tables
//! - [`matching`]: Expansion, filtering, mismatch engine and rendering
//! - [`parsing`]: Parsers for reference tables and typing files
//! - [`cli`]: Command-line interface implementation

pub mod catalog;
pub mod cli;
pub mod core;
pub mod matching;
pub mod parsing;
pub mod utils;

// Re-export commonly used types for convenience
pub use catalog::store::{DataDirectory, ReferenceDatabase, ReferenceTable};
pub use crate::core::types::*;
pub use crate::core::typing::{TypingRow, TypingTable};
pub use matching::engine::{
    compute_bidirectional_load, compute_mismatch_load, LoadError, LoadOptions, LoadOutput,
    MismatchEngine, OutputType,
};
pub use matching::simple::compare_alleles;
