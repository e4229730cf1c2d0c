//! Shared value types used by the structure model and the PDB reconciliation pipeline.
//!
//! The enums here are small, `Copy`, and carry their own textual forms so that readers,
//! writers, and the CLI render them consistently.

use nalgebra::Point3;
use smol_str::SmolStr;
use std::fmt;
use std::str::FromStr;

/// Cartesian coordinate measured in ångströms.
pub type Point = Point3<f64>;

/// The twenty genetically encoded amino acids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardResidue {
    ALA,
    ARG,
    ASN,
    ASP,
    CYS,
    GLN,
    GLU,
    GLY,
    HIS,
    ILE,
    LEU,
    LYS,
    MET,
    PHE,
    PRO,
    SER,
    THR,
    TRP,
    TYR,
    VAL,
}

impl StandardResidue {
    /// Every standard residue in alphabetical order of its three-letter code.
    pub const ALL: [StandardResidue; 20] = [
        StandardResidue::ALA,
        StandardResidue::ARG,
        StandardResidue::ASN,
        StandardResidue::ASP,
        StandardResidue::CYS,
        StandardResidue::GLN,
        StandardResidue::GLU,
        StandardResidue::GLY,
        StandardResidue::HIS,
        StandardResidue::ILE,
        StandardResidue::LEU,
        StandardResidue::LYS,
        StandardResidue::MET,
        StandardResidue::PHE,
        StandardResidue::PRO,
        StandardResidue::SER,
        StandardResidue::THR,
        StandardResidue::TRP,
        StandardResidue::TYR,
        StandardResidue::VAL,
    ];

    /// One-letter IUPAC code.
    pub fn one_letter(&self) -> char {
        match self {
            StandardResidue::ALA => 'A',
            StandardResidue::ARG => 'R',
            StandardResidue::ASN => 'N',
            StandardResidue::ASP => 'D',
            StandardResidue::CYS => 'C',
            StandardResidue::GLN => 'Q',
            StandardResidue::GLU => 'E',
            StandardResidue::GLY => 'G',
            StandardResidue::HIS => 'H',
            StandardResidue::ILE => 'I',
            StandardResidue::LEU => 'L',
            StandardResidue::LYS => 'K',
            StandardResidue::MET => 'M',
            StandardResidue::PHE => 'F',
            StandardResidue::PRO => 'P',
            StandardResidue::SER => 'S',
            StandardResidue::THR => 'T',
            StandardResidue::TRP => 'W',
            StandardResidue::TYR => 'Y',
            StandardResidue::VAL => 'V',
        }
    }

    /// Inverse of [`StandardResidue::one_letter`].
    pub fn from_one_letter(code: char) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|res| res.one_letter() == code.to_ascii_uppercase())
    }

    pub fn three_letter(&self) -> &'static str {
        match self {
            StandardResidue::ALA => "ALA",
            StandardResidue::ARG => "ARG",
            StandardResidue::ASN => "ASN",
            StandardResidue::ASP => "ASP",
            StandardResidue::CYS => "CYS",
            StandardResidue::GLN => "GLN",
            StandardResidue::GLU => "GLU",
            StandardResidue::GLY => "GLY",
            StandardResidue::HIS => "HIS",
            StandardResidue::ILE => "ILE",
            StandardResidue::LEU => "LEU",
            StandardResidue::LYS => "LYS",
            StandardResidue::MET => "MET",
            StandardResidue::PHE => "PHE",
            StandardResidue::PRO => "PRO",
            StandardResidue::SER => "SER",
            StandardResidue::THR => "THR",
            StandardResidue::TRP => "TRP",
            StandardResidue::TYR => "TYR",
            StandardResidue::VAL => "VAL",
        }
    }
}

impl fmt::Display for StandardResidue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.three_letter())
    }
}

impl FromStr for StandardResidue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|res| res.three_letter() == s)
            .ok_or_else(|| format!("Invalid standard residue: {}", s))
    }
}

/// Role of an atom in the assembled structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomCategory {
    /// Polymer atom indexed into its chain's sequence.
    Protein,
    /// Ligand or other non-polymer group, either chain-attached or free.
    Heterogen,
    /// Solvent water.
    Water,
}

impl AtomCategory {
    pub fn name(&self) -> &'static str {
        match self {
            AtomCategory::Protein => "Protein",
            AtomCategory::Heterogen => "Heterogen",
            AtomCategory::Water => "Water",
        }
    }
}

impl fmt::Display for AtomCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Experimental technique inferred from the resolution remark and MODEL records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExperimentalMethod {
    #[default]
    Xray,
    Nmr,
}

impl ExperimentalMethod {
    pub fn name(&self) -> &'static str {
        match self {
            ExperimentalMethod::Xray => "X-ray",
            ExperimentalMethod::Nmr => "NMR",
        }
    }
}

impl fmt::Display for ExperimentalMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ExperimentalMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "X-ray" | "Xray" | "XRAY" => Ok(ExperimentalMethod::Xray),
            "NMR" | "Nmr" => Ok(ExperimentalMethod::Nmr),
            _ => Err(format!("Invalid experimental method: {}", s)),
        }
    }
}

/// Secondary-structure element family as declared by HELIX, SHEET, and TURN records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecondaryKind {
    Helix,
    Strand,
    Turn,
}

impl SecondaryKind {
    /// Single-character DSSP-style code (`H`, `E`, `T`).
    pub fn code(&self) -> char {
        match self {
            SecondaryKind::Helix => 'H',
            SecondaryKind::Strand => 'E',
            SecondaryKind::Turn => 'T',
        }
    }

    /// Record name that declares elements of this kind.
    pub fn record(&self) -> &'static str {
        match self {
            SecondaryKind::Helix => "HELIX",
            SecondaryKind::Strand => "SHEET",
            SecondaryKind::Turn => "TURN",
        }
    }
}

impl fmt::Display for SecondaryKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Secondary-structure tag attached to a residue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecondaryAssignment {
    /// Serial number of the element record.
    pub serial: u32,
    /// Element identifier (helix id, sheet id, or turn id).
    pub id: SmolStr,
    pub kind: SecondaryKind,
    /// Helix class (1-10) for helices; `None` otherwise.
    pub helix_class: Option<u8>,
}
