//! Representation of a reconciled PDB entry.
//!
//! The `Structure` type is the only artifact that survives a parse. It owns every chain,
//! residue, and atom, plus the free heterogen groups and waters that could not be attached to
//! a chain, and exposes them through read-only accessors.

use super::atom::Atom;
use super::chain::Chain;
use super::residue::Residue;
use super::types::ExperimentalMethod;
use std::fmt;

/// Immutable view of one PDB entry after SEQRES/ATOM reconciliation.
///
/// Chains are numbered contiguously from 1 in file order; chain `n` is `chains()[n - 1]`.
/// Atoms of every model are kept, while residues describe the first model only.
#[derive(Debug, Clone, Default)]
pub struct Structure {
    /// Four-character identifier, from the HEADER record or supplied by the caller.
    pub(crate) pdb_id: Option<String>,
    /// Concatenated COMPND text.
    pub(crate) compound: String,
    /// Concatenated SOURCE text.
    pub(crate) source: String,
    pub(crate) method: ExperimentalMethod,
    /// Resolution in ångströms for crystal structures.
    pub(crate) resolution: Option<f64>,
    /// Number of models, 1 when the file has no MODEL records.
    pub(crate) model_count: usize,
    chains: Vec<Chain>,
    groups: Vec<Atom>,
    waters: Vec<Atom>,
}

impl Structure {
    /// Creates an empty single-model structure.
    pub fn new() -> Self {
        Self {
            model_count: 1,
            ..Default::default()
        }
    }

    /// Returns the structure with its identifier replaced.
    pub fn with_pdb_id(mut self, id: impl Into<String>) -> Self {
        self.pdb_id = Some(id.into());
        self
    }

    /// Four-character identifier, when one is known.
    pub fn pdb_id(&self) -> Option<&str> {
        self.pdb_id.as_deref()
    }

    /// Concatenated COMPND text.
    pub fn compound(&self) -> &str {
        &self.compound
    }

    /// Concatenated SOURCE text.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn method(&self) -> ExperimentalMethod {
        self.method
    }

    /// Resolution in ångströms; `Some(0.0)` for NMR entries.
    pub fn resolution(&self) -> Option<f64> {
        self.resolution
    }

    pub fn model_count(&self) -> usize {
        self.model_count
    }

    pub(crate) fn push_chain(&mut self, chain: Chain) {
        debug_assert!(
            self.chains.iter().all(|c| c.id != chain.id),
            "Attempted to add a duplicate chain ID '{}'",
            chain.id
        );
        self.chains.push(chain);
    }

    pub(crate) fn push_group_atom(&mut self, atom: Atom) {
        self.groups.push(atom);
    }

    pub(crate) fn push_water(&mut self, atom: Atom) {
        self.waters.push(atom);
    }

    /// Retrieves a chain by its identifier character.
    ///
    /// # Arguments
    ///
    /// * `id` - Chain identifier as written in column 22.
    ///
    /// # Returns
    ///
    /// `Some(&Chain)` if a surviving chain carries the identifier.
    pub fn chain(&self, id: char) -> Option<&Chain> {
        self.chains.iter().find(|c| c.id == id)
    }

    /// Retrieves a chain by its final 1-based number.
    pub fn chain_by_number(&self, number: usize) -> Option<&Chain> {
        number.checked_sub(1).and_then(|i| self.chains.get(i))
    }

    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    /// Heterogen atoms that belong to no chain, in file order.
    pub fn groups(&self) -> &[Atom] {
        &self.groups
    }

    /// Number of distinct free heterogen groups.
    pub fn group_count(&self) -> usize {
        let mut numbers: Vec<usize> = self.groups.iter().filter_map(|a| a.group).collect();
        numbers.sort_unstable();
        numbers.dedup();
        numbers.len()
    }

    pub fn waters(&self) -> &[Atom] {
        &self.waters
    }

    pub fn residue_count(&self) -> usize {
        self.chains.iter().map(|c| c.residue_count()).sum()
    }

    /// Total number of atoms across chains, free groups, and waters.
    pub fn atom_count(&self) -> usize {
        self.chains.iter().map(|c| c.atoms().len()).sum::<usize>()
            + self.groups.len()
            + self.waters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    pub fn iter_chains(&self) -> std::slice::Iter<'_, Chain> {
        self.chains.iter()
    }

    /// Iterates over every atom: chains first, then free groups, then waters.
    pub fn iter_atoms(&self) -> impl Iterator<Item = &Atom> {
        self.chains
            .iter()
            .flat_map(|c| c.iter_atoms())
            .chain(self.groups.iter())
            .chain(self.waters.iter())
    }

    /// Iterates over first-model residues alongside their owning chain.
    pub fn iter_residues_with_chain(&self) -> impl Iterator<Item = (&Chain, &Residue)> {
        self.chains
            .iter()
            .flat_map(|chain| chain.iter_residues().map(move |res| (chain, res)))
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Structure {{ id: {}, chains: {}, residues: {}, atoms: {} }}",
            self.pdb_id.as_deref().unwrap_or("-"),
            self.chain_count(),
            self.residue_count(),
            self.atom_count()
        )
    }
}
