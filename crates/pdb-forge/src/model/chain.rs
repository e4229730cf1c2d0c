use super::atom::Atom;
use super::residue::Residue;
use super::types::AtomCategory;
use std::fmt;

/// Per-chain element tallies derived from HELIX, SHEET, and TURN records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElementCounts {
    pub helices: usize,
    pub strands: usize,
    /// Distinct sheet identifiers.
    pub sheets: usize,
    pub turns: usize,
}

/// Polymer chain with its reconciled sequence, first-model residues, and every atom.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub id: char,
    sequence: String,
    residues: Vec<Residue>,
    atoms: Vec<Atom>,
    pub elements: ElementCounts,
    /// Number of ligand groups attached to the chain in the first model.
    pub ligand_count: usize,
    /// Whether residue indices came from the alternate-numbering interpretation.
    pub uses_alt_numbering: bool,
}

impl Chain {
    pub fn new(id: char, sequence: &str) -> Self {
        Self {
            id,
            sequence: sequence.to_string(),
            residues: Vec::new(),
            atoms: Vec::new(),
            elements: ElementCounts::default(),
            ligand_count: 0,
            uses_alt_numbering: true,
        }
    }

    pub(crate) fn push_residue(&mut self, residue: Residue) {
        debug_assert!(
            self.residue(residue.index).is_none(),
            "Attempted to add a duplicate residue index '{}' to chain '{}'",
            residue.index,
            self.id
        );
        self.residues.push(residue);
    }

    pub(crate) fn push_atom(&mut self, atom: Atom) {
        self.atoms.push(atom);
    }

    /// One-letter sequence after SEQRES/ATOM reconciliation.
    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn residue(&self, index: usize) -> Option<&Residue> {
        self.residues.iter().find(|r| r.index == index)
    }

    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }

    pub fn residue_count(&self) -> usize {
        self.residues.len()
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn iter_residues(&self) -> std::slice::Iter<'_, Residue> {
        self.residues.iter()
    }

    pub fn iter_atoms(&self) -> std::slice::Iter<'_, Atom> {
        self.atoms.iter()
    }

    /// Atoms of a single model in file order.
    pub fn iter_model_atoms(&self, model: usize) -> impl Iterator<Item = &Atom> {
        self.atoms.iter().filter(move |a| a.model == model)
    }

    pub fn protein_atoms(&self) -> impl Iterator<Item = &Atom> {
        self.atoms
            .iter()
            .filter(|a| a.category == AtomCategory::Protein)
    }

    pub fn heterogen_atoms(&self) -> impl Iterator<Item = &Atom> {
        self.atoms
            .iter()
            .filter(|a| a.category == AtomCategory::Heterogen)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Chain {{ id: '{}', length: {}, residues: {}, atoms: {} }}",
            self.id,
            self.len(),
            self.residue_count(),
            self.atoms.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::Point;

    fn atom(name: &str, model: usize, category: AtomCategory) -> Atom {
        let mut atom = Atom::new(name, "ALA", "1", Point::origin());
        atom.model = model;
        atom.category = category;
        atom
    }

    #[test]
    fn chain_new_creates_empty_chain() {
        let chain = Chain::new('A', "MAGS");

        assert_eq!(chain.id, 'A');
        assert_eq!(chain.sequence(), "MAGS");
        assert_eq!(chain.len(), 4);
        assert_eq!(chain.residue_count(), 0);
        assert!(chain.atoms().is_empty());
    }

    #[test]
    fn chain_residue_lookup_by_index() {
        let mut chain = Chain::new('A', "AG");
        chain.push_residue(Residue::new(1, 1, "1", 'A', "ALA"));
        chain.push_residue(Residue::new(1, 2, "2", 'G', "GLY"));

        assert_eq!(chain.residue(2).map(|r| r.code), Some('G'));
        assert!(chain.residue(3).is_none());
    }

    #[test]
    fn chain_filters_atoms_by_model_and_category() {
        let mut chain = Chain::new('B', "A");
        chain.push_atom(atom("N", 1, AtomCategory::Protein));
        chain.push_atom(atom("CA", 1, AtomCategory::Protein));
        chain.push_atom(atom("C1", 1, AtomCategory::Heterogen));
        chain.push_atom(atom("CA", 2, AtomCategory::Protein));

        assert_eq!(chain.iter_model_atoms(1).count(), 3);
        assert_eq!(chain.iter_model_atoms(2).count(), 1);
        assert_eq!(chain.protein_atoms().count(), 3);
        assert_eq!(chain.heterogen_atoms().count(), 1);
    }

    #[test]
    fn chain_display_formats_correctly() {
        let chain = Chain::new('A', "AGS");
        assert_eq!(
            chain.to_string(),
            "Chain { id: 'A', length: 3, residues: 0, atoms: 0 }"
        );
    }
}
