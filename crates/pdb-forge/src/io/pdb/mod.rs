//! Legacy PDB format: the reconciling reader and its stages, plus the writer.
//!
//! Each stage module exposes a `run` function over the shared [`state::ParseState`]; the
//! reader calls them in pipeline order.

mod align;
mod assemble;
mod chains;
mod classify;
mod mask;
mod numbering;
mod secondary;
mod standardize;
mod state;
mod ter;

pub mod reader;
pub mod writer;
