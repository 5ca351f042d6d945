//! Reference data: per-locus allele tables and eplet metadata.
//!
//! A data directory holds one `;`-separated table per locus plus the metadata table:
//!
//! | File          | Contents                                              |
//! |---------------|-------------------------------------------------------|
//! | `A.csv` ...   | `allele` column, then one eplet token per column      |
//! | `ep_data.csv` | `eplet`, `locus` (`ABC`/`DR`/`DQ`/`DP`/`i2`), `confirmation` |
//!
//! Tables are parsed once and memoized by [`cache::TableCache`]; a changed file is
//! reparsed on the next load.
//!
//! ## Example
//!
//! ```rust,no_run
//! use eplet_load::catalog::store::{DataDirectory, ReferenceDatabase};
//!
//! let data = DataDirectory::new("data");
//! let db = ReferenceDatabase::open(&data, true, true).unwrap();
//! assert!(db.is_known("A*01:01"));
//! ```

pub mod cache;
pub mod index;
pub mod metadata;
pub mod store;
