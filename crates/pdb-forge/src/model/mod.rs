//! Core data structures describing a reconciled PDB entry.
//!
//! This module defines the immutable output of the parser: atoms, residues, chains, and the
//! enclosing structure, together with the small value types they share. The PDB reader builds
//! these types and the writer renders them back to text.

pub mod atom;
pub mod chain;
pub mod residue;
pub mod structure;
pub mod types;
