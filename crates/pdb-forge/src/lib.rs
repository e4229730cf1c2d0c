//! # PDB Forge
//!
//! **PDB Forge** is a pure-Rust parser for legacy PDB files that reconciles the two numbering schemes every entry carries: the full-chain SEQRES sequences and the residue numbers on ATOM/HETATM records. The result is a single immutable `Structure` in which every protein atom points at a position in its chain's reconciled sequence.
//!
//! ## Features
//!
//! - **Staged reconciliation** – Line classification, chain validation, TER repair, chain routing, residue masking, number standardization, sequence alignment, and secondary-structure placement run in a fixed order over one shared parse state.
//! - **Tolerant alignment** – A ladder of strategies, from exact matches through gapped alignment with a bounded mismatch budget, recovers missing termini and patches point differences between SEQRES and coordinates.
//! - **Explained omissions** – Every anomaly is reported as a tagged `Diagnostic` to a caller-supplied sink, so each dropped chain, residue, or record can be traced.
//! - **Ergonomic structure model** – Lightweight `Atom`, `Residue`, `Chain`, and `Structure` types backed by `nalgebra` keep all models, chain-attached ligands, free groups, and waters.
//! - **Round-trip output** – A PDB writer renders the reconciled structure with residue numbers replaced by sequence indices.

mod model;

pub mod io;

pub use model::atom::Atom;
pub use model::chain::{Chain, ElementCounts};
pub use model::residue::Residue;
pub use model::structure::Structure;
pub use model::types::{
    AtomCategory, ExperimentalMethod, Point, SecondaryAssignment, SecondaryKind, StandardResidue,
};
