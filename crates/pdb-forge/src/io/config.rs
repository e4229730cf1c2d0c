//! Tunable thresholds and masking switches for the PDB reconciliation pipeline.

use super::error::Error;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options consumed by [`read_pdb_structure`](crate::io::read_pdb_structure).
///
/// All fields are optional in TOML; missing keys fall back to [`ParseConfig::default`].
///
/// ```toml
/// min_chain_size = 5
/// max_mismatches = 3
/// max_trim = 50
/// mask_nonstandard_without_ca = true
/// mask_standard_without_ca = false
/// mask_single_atom_residues = true
/// strip_capping_groups = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParseConfig {
    /// Minimum number of amino acids a chain needs to survive validation.
    pub min_chain_size: usize,
    /// Mismatches tolerated between the SEQRES and ATOM sequences.
    pub max_mismatches: usize,
    /// Largest N-terminal prefix or C-terminal tail the aligner may graft onto SEQRES.
    pub max_trim: usize,
    /// Mask non-standard residues that have no CA atom and drop them from SEQRES.
    pub mask_nonstandard_without_ca: bool,
    /// Mask standard amino acids that have no CA atom.
    pub mask_standard_without_ca: bool,
    /// Mask residues represented by a single atom.
    pub mask_single_atom_residues: bool,
    /// Drop ACE, FOR, and NH2 tokens when converting SEQRES to one-letter codes.
    pub strip_capping_groups: bool,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            min_chain_size: 5,
            max_mismatches: 3,
            max_trim: 50,
            mask_nonstandard_without_ca: true,
            mask_standard_without_ca: false,
            mask_single_atom_residues: true,
            strip_capping_groups: true,
        }
    }
}

impl ParseConfig {
    /// Parses a TOML document and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for malformed TOML or unknown keys and
    /// [`Error::InvalidConfig`] when a value is out of range.
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        let config: ParseConfig = toml::from_str(text).map_err(|e| {
            let line_number = e
                .span()
                .map(|span| text[..span.start.min(text.len())].matches('\n').count() + 1)
                .unwrap_or(0);
            Error::parse("TOML", None, line_number, e.message())
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::from_io(e, Some(path.to_path_buf())))?;
        Self::from_toml_str(&text).map_err(|e| e.with_path(path))
    }

    /// Rejects values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), Error> {
        if self.min_chain_size == 0 {
            return Err(Error::invalid_config("min_chain_size must be at least 1"));
        }
        Ok(())
    }
}
