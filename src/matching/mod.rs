//! Eplet mismatch computation.
//!
//! - [`expand`]: allele to eplet expansion, with interlocus and verification filters
//! - [`filter`]: unknown-allele filtering, id intersection and wildcard parity
//! - [`engine`]: per-row eplet sets and `donor − recipient` differences
//! - [`render`]: ranking and rendering of a mismatch set
//! - [`simple`]: comparison of two alleles of the same locus
//!
//! ## Pipeline
//!
//! 1. Drop excluded ids, check row counts and wildcard parity
//! 2. Rewrite null alleles (`A*01:15N`) to ghosts (`A*`)
//! 3. Drop rows with alleles missing from the reference data
//! 4. Keep ids present on both sides
//! 5. Expand every allele, union per individual, take the set difference
//! 6. Rank by residue position and render (`12M_ABC, 97R_ABC, rq26Y`)
//!
//! ## Example
//!
//! ```rust,no_run
//! use eplet_load::catalog::store::DataDirectory;
//! use eplet_load::core::typing::TypingTable;
//! use eplet_load::matching::engine::{compute_mismatch_load, LoadOptions, LoadOutput};
//!
//! let donors = TypingTable::new(["A1", "A2"]).with_row("1", ["A*68:02", "A*01:01"]);
//! let recipients = TypingTable::new(["A1", "A2"]).with_row("1", ["A*68:01", "A*01:01"]);
//!
//! let data = DataDirectory::new("data");
//! let output = compute_mismatch_load(&data, donors, recipients, &LoadOptions::default()).unwrap();
//! if let LoadOutput::Rows(rows) = output {
//!     for row in rows {
//!         println!("{}: {:?} {:?}", row.id, row.load, row.details);
//!     }
//! }
//! ```

pub mod engine;
pub mod expand;
pub mod filter;
pub mod render;
pub mod simple;
