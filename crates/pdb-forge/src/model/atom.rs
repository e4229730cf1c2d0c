//! Atom records produced by the reconciliation pipeline.
//!
//! Every coordinate line that survives masking becomes one `Atom`. Besides the raw PDB
//! fields it carries the bookkeeping assigned during parsing: model and chain numbers, the
//! ligand group number for heterogens, and the reconciled residue index for polymer atoms.

use super::types::{AtomCategory, Point};
use smol_str::SmolStr;
use std::fmt;

/// Single atom position within one model of a structure.
///
/// Atoms are owned by their [`Chain`](super::chain::Chain) or by the structure-level group
/// and water lists; callers only ever see shared references.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Model number, starting at 1.
    pub model: usize,
    /// Final 1-based chain number, or `None` for free groups and waters.
    pub chain: Option<usize>,
    /// Chain identifier character exactly as it appeared in the file.
    pub chain_id: char,
    /// Ligand group number for heterogen atoms.
    pub group: Option<usize>,
    /// Reconciled 1-based position in the chain sequence, present for protein atoms only.
    pub residue_index: Option<usize>,
    /// Residue number text as written in columns 23-27.
    pub residue_number: SmolStr,
    /// Three-letter residue name.
    pub residue_name: SmolStr,
    /// Atom name such as `CA` or `OXT`.
    pub name: SmolStr,
    pub pos: Point,
    pub occupancy: f64,
    pub b_factor: f64,
    pub category: AtomCategory,
}

impl Atom {
    /// Creates a protein atom positioned at `pos` with unit occupancy and zero B-factor.
    ///
    /// The remaining bookkeeping fields (chain, group, index) are filled in by the assembler.
    pub fn new(name: &str, residue_name: &str, residue_number: &str, pos: Point) -> Self {
        Self {
            model: 1,
            chain: None,
            chain_id: ' ',
            group: None,
            residue_index: None,
            residue_number: SmolStr::new(residue_number),
            residue_name: SmolStr::new(residue_name),
            name: SmolStr::new(name),
            pos,
            occupancy: 1.0,
            b_factor: 0.0,
            category: AtomCategory::Protein,
        }
    }

    pub fn is_protein(&self) -> bool {
        self.category == AtomCategory::Protein
    }

    pub fn is_water(&self) -> bool {
        self.category == AtomCategory::Water
    }

    /// Returns `true` for the backbone alpha carbon.
    pub fn is_alpha_carbon(&self) -> bool {
        self.name == "CA"
    }

    /// Euclidean distance to another atom in ångströms.
    pub fn distance(&self, other: &Atom) -> f64 {
        nalgebra::distance(&self.pos, &other.pos)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Atom {{ model: {}, name: \"{}\", residue: \"{} {}\", category: {}, pos: [{:.3}, {:.3}, {:.3}] }}",
            self.model,
            self.name,
            self.residue_name,
            self.residue_number,
            self.category,
            self.pos.x,
            self.pos.y,
            self.pos.z
        )
    }
}
