//! Core data types for eplet mismatch computation.
//!
//! - [`Locus`]: HLA locus of an allele, with its rendering suffix and reference table
//! - [`LocusGroup`], [`Confirmation`]: keys and values of the eplet metadata table
//! - [`TypingTable`]: donor or recipient typings, two allele columns per locus
//! - [`allele`]: prefix-based locus dispatch and null-allele normalization
//!
//! ## Allele codes
//!
//! | Kind   | Example      | Eplets                       |
//! |--------|--------------|------------------------------|
//! | Typed  | `A*68:01`    | from the locus table          |
//! | Null   | `A*01:15N`   | none, normalized to `A*`      |
//! | Ghost  | `DRB345*`    | none                          |
//!
//! [`Locus`]: types::Locus
//! [`LocusGroup`]: types::LocusGroup
//! [`Confirmation`]: types::Confirmation
//! [`TypingTable`]: typing::TypingTable

pub mod allele;
pub mod types;
pub mod typing;
