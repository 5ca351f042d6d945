//! Parsers for reference tables and typing files.
//!
//! - **Reference tables** (`A.csv` ... `DP.csv`): allele plus positional eplet columns
//! - **Eplet metadata** (`ep_data.csv`): confirmation status per (eplet, locus group)
//! - **Typing files**: one row per donor/recipient pair, plain or gzipped
//!
//! ## Typing file layout
//!
//! | Column        | Description                          |
//! |---------------|--------------------------------------|
//! | first column  | Row id, unique                       |
//! | `<col>_D`     | Donor allele for column `<col>`      |
//! | `<col>_R`     | Recipient allele for column `<col>`  |
//!
//! ```rust,no_run
//! use eplet_load::parsing::typing::parse_typing_file;
//! use std::path::Path;
//!
//! let (donors, recipients) = parse_typing_file(Path::new("typings.csv")).unwrap();
//! assert_eq!(donors.len(), recipients.len());
//! ```

pub mod reference;
pub mod typing;
