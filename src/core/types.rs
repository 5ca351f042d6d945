use serde::{Deserialize, Serialize};

/// HLA locus an allele belongs to. Each locus has exactly one reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Locus {
    A,
    B,
    C,
    Dr,
    Dq,
    Dp,
}

impl Locus {
    /// All loci in reference-table order
    pub const ALL: [Locus; 6] = [
        Locus::A,
        Locus::B,
        Locus::C,
        Locus::Dr,
        Locus::Dq,
        Locus::Dp,
    ];

    /// Token appended to rendered eplets (`9Y_ABC`, `26L_DR`)
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::A | Self::B | Self::C => "ABC",
            Self::Dr => "DR",
            Self::Dq => "DQ",
            Self::Dp => "DP",
        }
    }

    /// Group used to key the eplet metadata table for locus-private eplets
    #[must_use]
    pub fn group(self) -> LocusGroup {
        match self {
            Self::A | Self::B | Self::C => LocusGroup::Abc,
            Self::Dr => LocusGroup::Dr,
            Self::Dq => LocusGroup::Dq,
            Self::Dp => LocusGroup::Dp,
        }
    }

    #[must_use]
    pub fn class(self) -> HlaClass {
        match self {
            Self::A | Self::B | Self::C => HlaClass::I,
            Self::Dr | Self::Dq | Self::Dp => HlaClass::II,
        }
    }

    /// Base name of the reference table file for this locus (`A.csv`, `DR.csv`, ...)
    #[must_use]
    pub fn file_stem(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::Dr => "DR",
            Self::Dq => "DQ",
            Self::Dp => "DP",
        }
    }

    /// Ghost alleles stored in this locus' table. They carry no eplets.
    #[must_use]
    pub fn ghost_alleles(self) -> &'static [&'static str] {
        match self {
            Self::A => &["A*"],
            Self::B => &["B*"],
            Self::C => &["C*"],
            Self::Dr => &["DRB1*", "DRB345*"],
            Self::Dq => &["DQB1*", "DQA1*"],
            Self::Dp => &["DPB1*", "DPA1*"],
        }
    }
}

impl std::fmt::Display for Locus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file_stem())
    }
}

/// HLA class of a locus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HlaClass {
    /// A, B, C
    I,
    /// DR, DQ, DP
    II,
}

/// Key of the `locus` column in the eplet metadata table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LocusGroup {
    Abc,
    Dr,
    Dq,
    Dp,
    /// Interlocus class II eplets (`r`, `q`, `p` prefixed tokens)
    Interlocus,
}

impl LocusGroup {
    /// Parse the metadata table representation (`ABC`, `DR`, `DQ`, `DP`, `i2`)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ABC" => Some(Self::Abc),
            "DR" => Some(Self::Dr),
            "DQ" => Some(Self::Dq),
            "DP" => Some(Self::Dp),
            "I2" => Some(Self::Interlocus),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Abc => "ABC",
            Self::Dr => "DR",
            Self::Dq => "DQ",
            Self::Dp => "DP",
            Self::Interlocus => "i2",
        }
    }
}

impl std::fmt::Display for LocusGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Antibody confirmation status of an eplet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confirmation {
    Verified,
    NotVerified,
    /// Reported as verified but with doubtful evidence
    Questionable,
}

impl Confirmation {
    /// Parse the `confirmation` column. Anything unrecognised counts as not verified.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "yes" | "y" | "verified" | "true" => Self::Verified,
            "questionable" | "?" => Self::Questionable,
            _ => Self::NotVerified,
        }
    }
}
