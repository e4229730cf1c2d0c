use anyhow::{Result, bail};
use clap::Args;

use pdb_forge::Structure;

/// Writes the reconciled structure back out as PDB.
#[derive(Debug, Default, Args)]
pub struct ConvertArgs {
    /// Four-character identifier written to HEADER, replacing the one read from the input.
    #[arg(long, value_name = "ID")]
    pub id: Option<String>,
}

/// Applies output-only adjustments before the structure is written.
pub fn run(structure: Structure, args: &ConvertArgs) -> Result<Structure> {
    match &args.id {
        Some(id) => {
            let id = id.trim();
            if id.is_empty() || id.chars().count() > 4 {
                bail!("PDB identifier '{id}' must be one to four characters long");
            }
            Ok(structure.with_pdb_id(id.to_ascii_uppercase()))
        }
        None => Ok(structure),
    }
}
