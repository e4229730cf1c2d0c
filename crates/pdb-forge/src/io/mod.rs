//! IO front-end exposing the reconciling PDB reader, the PDB writer, and their options.
//!
//! Callers parse with [`read_pdb_structure`], tune it through [`ParseConfig`] and
//! [`IoContext`], and collect anomalies through any [`DiagnosticSink`] such as
//! [`DiagnosticLog`].

mod config;
mod context;
mod diagnostics;
mod error;
mod pdb;

pub use pdb::reader::read as read_pdb_structure;
pub use pdb::writer::write_structure as write_pdb_structure;

pub use config::ParseConfig;
pub use context::IoContext;
pub use diagnostics::{Diagnostic, DiagnosticCode, DiagnosticLog, DiagnosticSink};

pub use error::Error;
