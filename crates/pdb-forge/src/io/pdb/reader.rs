//! PDB structure reader that reconciles SEQRES sequences with coordinate records.
//!
//! The reader buffers the whole stream into a [`ParseState`], drives it through every
//! reconciliation stage in order, and hands the result to the assembler. Diagnostics raised
//! along the way are delivered to the caller's sink whether or not the parse succeeds.

use super::state::ParseState;
use super::{align, assemble, chains, classify, mask, numbering, secondary, standardize, ter};
use crate::io::config::ParseConfig;
use crate::io::context::IoContext;
use crate::io::diagnostics::DiagnosticSink;
use crate::io::error::Error;
use crate::model::structure::Structure;
use std::io::BufRead;

/// Parses a legacy PDB stream into a reconciled [`Structure`].
///
/// Chains are taken from SEQRES, coordinate records are routed to chains by identifier,
/// residue numbers are standardized, and each chain's ATOM sequence is aligned to SEQRES so
/// that every protein atom carries an index into the final chain sequence.
///
/// # Arguments
///
/// * `reader` - Any buffered reader that yields PDB lines.
/// * `config` - Thresholds and masking switches.
/// * `context` - Residue-name tables used for one-letter codes, waters, and capping groups.
/// * `sink` - Receives every diagnostic raised during the parse.
///
/// # Returns
///
/// A [`Structure`] holding every chain that survived validation.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] for out-of-range options, [`Error::Io`] when the stream
/// cannot be read, [`Error::MissingRecords`] when there are no SEQRES or no coordinate
/// records, and [`Error::NoValidChains`] when validation rejects every chain.
///
/// # Examples
///
/// ```
/// use pdb_forge::io::{read_pdb_structure, DiagnosticLog, IoContext, ParseConfig};
/// use std::io::Cursor;
///
/// let pdb = "\
/// SEQRES   1 A    2  GLY ALA\n\
/// ATOM      1  N   GLY A   1       0.000   0.000   0.000  1.00 20.00           N\n\
/// ATOM      2  CA  GLY A   1       1.000   0.000   0.000  1.00 20.00           C\n\
/// ATOM      3  N   ALA A   2       2.000   0.000   0.000  1.00 20.00           N\n\
/// ATOM      4  CA  ALA A   2       3.000   0.000   0.000  1.00 20.00           C\n\
/// TER       5      ALA A   2\n\
/// END\n";
/// let config = ParseConfig { min_chain_size: 1, ..ParseConfig::default() };
/// let mut log = DiagnosticLog::new();
/// let structure = read_pdb_structure(
///     Cursor::new(pdb.as_bytes()),
///     &config,
///     &IoContext::new_default(),
///     &mut log,
/// )
/// .unwrap();
/// assert_eq!(structure.chain_count(), 1);
/// assert_eq!(structure.chains()[0].sequence(), "GA");
/// ```
pub fn read<R: BufRead>(
    reader: R,
    config: &ParseConfig,
    context: &IoContext,
    sink: &mut dyn DiagnosticSink,
) -> Result<Structure, Error> {
    config.validate()?;

    let lines = reader
        .lines()
        .collect::<Result<Vec<String>, _>>()
        .map_err(|e| Error::from_io(e, None))?;
    log::debug!("read {} PDB lines", lines.len());

    let mut state = ParseState::new(lines);
    let outcome = reconcile(&mut state, config, context);
    state.diagnostics.flush_into(sink);
    outcome?;

    Ok(assemble::run(state))
}

fn reconcile(state: &mut ParseState, config: &ParseConfig, context: &IoContext) -> Result<(), Error> {
    classify::run(state, config, context)?;
    chains::run(state, config)?;
    ter::run(state, context);
    numbering::run(state);
    mask::run(state, config, context)?;
    standardize::run(state);
    align::run(state, config, context);
    secondary::run(state);
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::io::diagnostics::{DiagnosticCode, DiagnosticLog};
    use crate::model::types::{ExperimentalMethod, SecondaryKind};
    use std::io::Cursor;

    /// Assembles PDB text with correctly aligned fixed columns.
    #[derive(Default)]
    pub(crate) struct PdbBuilder {
        lines: Vec<String>,
        serial: usize,
    }

    impl PdbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn line(mut self, text: &str) -> Self {
            self.lines.push(text.to_string());
            self
        }

        pub fn seqres(mut self, chain: char, names: &[&str]) -> Self {
            for (k, chunk) in names.chunks(13).enumerate() {
                self.lines.push(format!(
                    "SEQRES {:>3} {} {:>4}  {}",
                    k + 1,
                    chain,
                    names.len(),
                    chunk.join(" ")
                ));
            }
            self
        }

        pub fn atom(mut self, record: &str, chain: char, number: &str, residue: &str, name: &str) -> Self {
            self.serial += 1;
            let (digits, marker) = match number.chars().last() {
                Some(c) if c.is_ascii_alphabetic() => (&number[..number.len() - 1], c),
                _ => (number, ' '),
            };
            let x = self.serial as f64;
            self.lines.push(format!(
                "{:6}{:5}  {:<3} {:>3} {}{:>4}{}   {:8.3}{:8.3}{:8.3}{:6.2}{:6.2}",
                record, self.serial, name, residue, chain, digits, marker, x, 0.0, 0.0, 1.0, 20.0
            ));
            self
        }

        /// Adds N, CA, and C atoms of one residue.
        pub fn residue(self, chain: char, number: &str, residue: &str) -> Self {
            self.atom("ATOM", chain, number, residue, "N")
                .atom("ATOM", chain, number, residue, "CA")
                .atom("ATOM", chain, number, residue, "C")
        }

        pub fn residues(self, chain: char, first: i64, names: &[&str]) -> Self {
            names.iter().enumerate().fold(self, |b, (k, name)| {
                b.residue(chain, &(first + k as i64).to_string(), name)
            })
        }

        pub fn ter(mut self) -> Self {
            self.serial += 1;
            self.lines.push(format!("TER   {:5}", self.serial));
            self
        }

        pub fn build(self) -> String {
            let mut text = self.lines.join("\n");
            text.push_str("\nEND\n");
            text
        }
    }

    pub(crate) fn small_chains() -> ParseConfig {
        ParseConfig {
            min_chain_size: 3,
            ..ParseConfig::default()
        }
    }

    fn parse_with(pdb: &str, config: &ParseConfig) -> (Result<Structure, Error>, DiagnosticLog) {
        let mut log = DiagnosticLog::new();
        let result = read(
            Cursor::new(pdb.as_bytes()),
            config,
            &IoContext::new_default(),
            &mut log,
        );
        (result, log)
    }

    fn parse(pdb: &str) -> (Structure, DiagnosticLog) {
        let (result, log) = parse_with(pdb, &small_chains());
        (result.expect("parse succeeds"), log)
    }

    fn residue_indices(structure: &Structure, chain: char) -> Vec<usize> {
        structure
            .chain(chain)
            .unwrap()
            .iter_residues()
            .map(|r| r.index)
            .collect()
    }

    fn assert_indices_within_sequence(structure: &Structure) {
        for chain in structure.iter_chains() {
            for atom in chain.protein_atoms() {
                let index = atom.residue_index.unwrap();
                assert!(index >= 1 && index <= chain.len(), "{} out of range", index);
            }
        }
    }

    #[test]
    fn read_accepts_exact_match() {
        let pdb = PdbBuilder::new()
            .seqres('A', &["ALA", "GLY", "SER"])
            .residues('A', 1, &["ALA", "GLY", "SER"])
            .ter()
            .build();

        let (structure, log) = parse(&pdb);

        let chain = structure.chain('A').unwrap();
        assert_eq!(chain.sequence(), "AGS");
        assert_eq!(residue_indices(&structure, 'A'), vec![1, 2, 3]);
        assert_eq!(chain.protein_atoms().count(), 9);
        assert!(chain.uses_alt_numbering);
        assert!(!log.contains(DiagnosticCode::Mismatch));
        assert!(log.is_empty());
    }

    #[test]
    fn read_aligns_n_terminal_gap() {
        let pdb = PdbBuilder::new()
            .seqres('A', &["MET", "ALA", "GLY", "SER"])
            .residues('A', 2, &["ALA", "GLY", "SER"])
            .ter()
            .build();

        let (structure, _) = parse(&pdb);

        assert_eq!(structure.chain('A').unwrap().sequence(), "MAGS");
        assert_eq!(residue_indices(&structure, 'A'), vec![2, 3, 4]);
        assert_indices_within_sequence(&structure);
    }

    #[test]
    fn read_excises_only_the_masked_modified_residue() {
        let pdb = PdbBuilder::new()
            .seqres('A', &["MET", "ALA", "MSE", "GLY", "MSE", "SER", "THR"])
            .residue('A', "2", "ALA")
            .atom("ATOM", 'A', "3", "MSE", "N")
            .atom("ATOM", 'A', "3", "MSE", "CB")
            .residue('A', "4", "GLY")
            .residue('A', "5", "MSE")
            .residues('A', 6, &["SER", "THR"])
            .ter()
            .build();

        let (structure, log) = parse(&pdb);

        assert_eq!(structure.chain('A').unwrap().sequence(), "MAGMST");
        assert_eq!(residue_indices(&structure, 'A'), vec![2, 3, 4, 5, 6]);
        assert!(log.contains(DiagnosticCode::AtomNoCa));
        assert!(!log.contains(DiagnosticCode::Mismatch));
    }

    #[test]
    fn read_inserts_missing_terminal_residues_from_atom_records() {
        let pdb = PdbBuilder::new()
            .seqres('A', &["ALA", "GLY", "SER"])
            .seqres('B', &["ALA", "GLY", "SER"])
            .residues('A', 1, &["MET", "ALA", "GLY", "SER"])
            .ter()
            .residues('B', 1, &["ALA", "GLY", "SER", "TRP"])
            .ter()
            .build();

        let (structure, log) = parse(&pdb);

        assert_eq!(structure.chain('A').unwrap().sequence(), "MAGS");
        assert_eq!(structure.chain('B').unwrap().sequence(), "AGSW");
        assert_eq!(residue_indices(&structure, 'A'), vec![1, 2, 3, 4]);
        assert_eq!(residue_indices(&structure, 'B'), vec![1, 2, 3, 4]);
        assert!(log.contains(DiagnosticCode::MissNTerm));
        assert!(log.contains(DiagnosticCode::MissCTerm));
    }

    #[test]
    fn read_patches_single_mismatch() {
        let pdb = PdbBuilder::new()
            .seqres('A', &["ALA", "ALA", "ALA"])
            .residues('A', 1, &["ALA", "GLY", "ALA"])
            .ter()
            .build();

        let (structure, log) = parse(&pdb);

        assert_eq!(structure.chain('A').unwrap().sequence(), "AGA");
        assert_eq!(log.count(DiagnosticCode::Mismatch), 1);
    }

    #[test]
    fn read_drops_chain_below_minimum_size() {
        let pdb = PdbBuilder::new()
            .seqres('A', &["ALA", "GLY", "SER"])
            .seqres('B', &["ALA", "GLY"])
            .residues('A', 1, &["ALA", "GLY", "SER"])
            .ter()
            .residues('B', 1, &["ALA", "GLY"])
            .ter()
            .build();

        let (structure, log) = parse(&pdb);

        assert_eq!(structure.chain_count(), 1);
        assert!(structure.chain('B').is_none());
        assert!(log.contains(DiagnosticCode::SeqresFewAa));
        assert_eq!(structure.atom_count(), 9);
    }

    #[test]
    fn read_rejoins_chain_split_by_spurious_ter() {
        let names = ["MET", "ALA", "GLY", "SER", "THR", "TRP"];
        let pdb = PdbBuilder::new()
            .seqres('A', &names)
            .residues('A', 1, &names[..3])
            .ter()
            .residues('A', 4, &names[3..])
            .ter()
            .build();

        let (structure, log) = parse(&pdb);

        let chain = structure.chain('A').unwrap();
        assert_eq!(residue_indices(&structure, 'A'), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(chain.heterogen_atoms().count(), 0);
        assert!(log.contains(DiagnosticCode::TerTooMany));
    }

    #[test]
    fn read_separates_chains_without_ter_records() {
        let pdb = PdbBuilder::new()
            .seqres('A', &["ALA", "GLY", "SER"])
            .seqres('B', &["VAL", "LEU", "ILE"])
            .residues('A', 1, &["ALA", "GLY", "SER"])
            .residues('B', 1, &["VAL", "LEU", "ILE"])
            .build();

        let (structure, log) = parse(&pdb);

        assert_eq!(structure.chain_count(), 2);
        assert_eq!(structure.chain('A').unwrap().protein_atoms().count(), 9);
        assert_eq!(structure.chain('B').unwrap().protein_atoms().count(), 9);
        assert_eq!(structure.chain('B').unwrap().sequence(), "VLI");
        assert!(log.contains(DiagnosticCode::TerNone));
    }

    #[test]
    fn read_treats_insertion_codes_as_consecutive_residues() {
        let pdb = PdbBuilder::new()
            .seqres('A', &["ALA", "GLY", "VAL", "SER"])
            .residue('A', "1", "ALA")
            .residue('A', "2", "GLY")
            .residue('A', "2A", "VAL")
            .residue('A', "3", "SER")
            .ter()
            .build();

        let (structure, log) = parse(&pdb);

        let chain = structure.chain('A').unwrap();
        assert!(chain.uses_alt_numbering);
        assert_eq!(chain.sequence(), "AGVS");
        assert_eq!(residue_indices(&structure, 'A'), vec![1, 2, 3, 4]);
        assert_eq!(chain.residue(3).unwrap().number, "2A");
        assert!(log.contains(DiagnosticCode::OddNum));
    }

    #[test]
    fn read_routes_heterogens_and_waters() {
        let pdb = PdbBuilder::new()
            .seqres('A', &["ALA", "GLY", "SER"])
            .residues('A', 1, &["ALA", "GLY", "SER"])
            .ter()
            .atom("HETATM", 'A', "101", "HEM", "FE")
            .atom("HETATM", 'A', "101", "HEM", "NA")
            .atom("HETATM", 'Z', "1", "ZN", "ZN")
            .atom("HETATM", 'A', "201", "HOH", "O")
            .build();

        let (structure, _) = parse(&pdb);

        // The only chain also adopts the ZN record of an unknown chain identifier.
        let chain = structure.chain('A').unwrap();
        assert_eq!(chain.heterogen_atoms().count(), 3);
        assert_eq!(chain.ligand_count, 2);
        assert!(structure.groups().is_empty());
        assert_eq!(chain.residue_count(), 3);
        assert_eq!(structure.waters().len(), 1);
        assert_indices_within_sequence(&structure);
    }

    #[test]
    fn read_keeps_every_model_and_builds_residues_from_the_first() {
        let names = ["ALA", "GLY", "SER"];
        let pdb = PdbBuilder::new()
            .seqres('A', &names)
            .line("MODEL        1")
            .residues('A', 1, &names)
            .ter()
            .line("ENDMDL")
            .line("MODEL        2")
            .residues('A', 1, &names)
            .ter()
            .line("ENDMDL")
            .build();

        let (structure, log) = parse(&pdb);

        let chain = structure.chain('A').unwrap();
        assert_eq!(structure.model_count(), 2);
        assert_eq!(structure.method(), ExperimentalMethod::Nmr);
        assert_eq!(chain.iter_model_atoms(1).count(), 9);
        assert_eq!(chain.iter_model_atoms(2).count(), 9);
        assert_eq!(chain.residue_count(), 3);
        assert!(chain.iter_residues().all(|r| r.model == 1));
        assert!(!log.contains(DiagnosticCode::TerTooFew));
    }

    #[test]
    fn read_maps_helices_onto_residues() {
        let pdb = PdbBuilder::new()
            .line("HELIX    1  H1 GLY A    2  THR A    4  1                                   3")
            .seqres('A', &["ALA", "GLY", "SER", "THR", "VAL"])
            .residues('A', 1, &["ALA", "GLY", "SER", "THR", "VAL"])
            .ter()
            .build();

        let (structure, _) = parse(&pdb);

        let chain = structure.chain('A').unwrap();
        let helix: Vec<bool> = chain.iter_residues().map(|r| r.is_helix()).collect();
        assert_eq!(helix, vec![false, true, true, true, false]);
        assert_eq!(chain.elements.helices, 1);
        let assignment = chain.residue(2).unwrap().secondary.clone().unwrap();
        assert_eq!(assignment.kind, SecondaryKind::Helix);
        assert_eq!(assignment.id, "H1");
    }

    #[test]
    fn read_captures_header_metadata() {
        let pdb = PdbBuilder::new()
            .line("HEADER    HYDROLASE                               01-JAN-00   1ABC")
            .line("COMPND    MOL_ID: 1;")
            .line("SOURCE    ORGANISM: GALLUS GALLUS;")
            .line("REMARK   2 RESOLUTION.    1.80 ANGSTROMS.")
            .seqres('A', &["ALA", "GLY", "SER"])
            .residues('A', 1, &["ALA", "GLY", "SER"])
            .ter()
            .build();

        let (structure, _) = parse(&pdb);

        assert_eq!(structure.pdb_id(), Some("1ABC"));
        assert_eq!(structure.compound(), "MOL_ID: 1;");
        assert_eq!(structure.method(), ExperimentalMethod::Xray);
        assert!((structure.resolution().unwrap() - 1.8).abs() < 1e-6);
    }

    #[test]
    fn read_fails_without_seqres_and_still_reports() {
        let pdb = PdbBuilder::new()
            .residues('A', 1, &["ALA", "GLY", "SER"])
            .ter()
            .build();

        let (result, log) = parse_with(&pdb, &small_chains());

        assert!(matches!(
            result,
            Err(Error::MissingRecords {
                record: "SEQRES",
                ..
            })
        ));
        assert!(log.contains(DiagnosticCode::NoSeqres));
        assert!(log.entries().iter().any(|d| d.code.is_fatal()));
    }

    #[test]
    fn read_fails_when_no_chain_is_large_enough() {
        let pdb = PdbBuilder::new()
            .seqres('A', &["ALA", "GLY"])
            .residues('A', 1, &["ALA", "GLY"])
            .ter()
            .build();

        let (result, log) = parse_with(&pdb, &small_chains());

        assert!(matches!(
            result,
            Err(Error::NoValidChains {
                stage: "SEQRES",
                ..
            })
        ));
        assert!(log.contains(DiagnosticCode::NoProteins));
    }

    #[test]
    fn read_fails_when_atom_records_are_too_few() {
        let pdb = PdbBuilder::new()
            .seqres('A', &["ALA", "GLY", "SER", "THR"])
            .residues('A', 1, &["ALA", "GLY"])
            .ter()
            .build();

        let (result, log) = parse_with(&pdb, &small_chains());

        assert!(matches!(
            result,
            Err(Error::NoValidChains { stage: "ATOM", .. })
        ));
        assert!(log.contains(DiagnosticCode::AtomFewAa));
        let fatal: Vec<_> = log.entries().iter().filter(|d| d.code.is_fatal()).collect();
        assert_eq!(fatal.len(), 1);
        assert_eq!(fatal[0].code, DiagnosticCode::NoProteins);
    }

    #[test]
    fn read_rejects_invalid_config() {
        let config = ParseConfig {
            min_chain_size: 0,
            ..ParseConfig::default()
        };

        let (result, log) = parse_with("END\n", &config);

        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
        assert!(log.is_empty());
    }

    #[test]
    fn read_residue_count_matches_distinct_model_one_numbers() {
        let pdb = PdbBuilder::new()
            .seqres('A', &["MET", "ALA", "GLY", "SER", "THR", "TRP"])
            .residues('A', 2, &["ALA", "GLY"])
            .residues('A', 5, &["THR", "TRP"])
            .ter()
            .build();

        let (structure, _) = parse(&pdb);

        let chain = structure.chain('A').unwrap();
        let mut numbers: Vec<&str> = chain
            .iter_model_atoms(1)
            .filter(|a| a.is_protein())
            .map(|a| a.residue_number.as_str())
            .collect();
        numbers.dedup();
        assert_eq!(chain.residue_count(), numbers.len());
        assert_eq!(residue_indices(&structure, 'A'), vec![2, 3, 5, 6]);

        let indices: Vec<usize> = chain
            .protein_atoms()
            .map(|a| a.residue_index.unwrap())
            .collect();
        assert!(indices.windows(2).all(|w| w[0] <= w[1]));
    }
}
