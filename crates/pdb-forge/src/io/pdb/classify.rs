//! First pass over the raw text: tags every line and collects header records.
//!
//! Coordinate lines receive their residue fields and provisional numbers, SEQRES records are
//! folded into [`ChainRecord`]s, and HELIX/SHEET/TURN records become [`SecondaryElement`]s.

use super::state::{ChainRecord, LineTag, ParseState, SecondaryElement, column, columns};
use crate::io::config::ParseConfig;
use crate::io::context::IoContext;
use crate::io::diagnostics::DiagnosticCode;
use crate::io::error::Error;
use crate::model::types::{ExperimentalMethod, SecondaryKind};
use smol_str::SmolStr;

/// SEQRES lines of one chain collected so far.
struct PendingSeqres {
    id: char,
    declared: usize,
    tokens: Vec<SmolStr>,
    line: usize,
}

pub(crate) fn run(
    state: &mut ParseState,
    config: &ParseConfig,
    context: &IoContext,
) -> Result<(), Error> {
    let mut pending: Option<PendingSeqres> = None;
    let mut coordinate_records = 0usize;
    let mut saw_resolution = false;
    let mut compound: Vec<String> = Vec::new();
    let mut source: Vec<String> = Vec::new();

    for idx in 0..state.lines.len() {
        let text = state.lines[idx].text.clone();
        let number = state.lines[idx].number;
        let record = columns(&text, 0, 6).trim_end();

        match record {
            "ATOM" | "HETATM" => {
                coordinate_records += 1;
                if state.first_coord_line.is_none() {
                    state.first_coord_line = Some(idx);
                }
                classify_atom(state, idx, record == "HETATM", context);
            }
            "SEQRES" => {
                let id = column(&text, 11);
                let declared = columns(&text, 13, 19).trim().parse::<usize>().unwrap_or(0);
                let tokens = columns(&text, 19, 71)
                    .split_whitespace()
                    .map(SmolStr::new);

                match pending.as_mut().filter(|chain| chain.id == id) {
                    Some(chain) => {
                        if declared != chain.declared {
                            state.diagnostics.push(
                                DiagnosticCode::SeqresLenDif,
                                Some(number),
                                Some(id),
                                format!(
                                    "declared length changed from {} to {}",
                                    chain.declared, declared
                                ),
                            );
                        }
                        chain.tokens.extend(tokens);
                    }
                    None => {
                        if let Some(done) = pending.take() {
                            finish_chain(state, done, config, context);
                        }
                        pending = Some(PendingSeqres {
                            id,
                            declared,
                            tokens: tokens.collect(),
                            line: number,
                        });
                    }
                }
            }
            "COMPND" => push_text(&mut compound, &text),
            "SOURCE" => push_text(&mut source, &text),
            "HEADER" => {
                let id = columns(&text, 62, 66).trim();
                if !id.is_empty() {
                    state.pdb_id = Some(id.to_string());
                }
            }
            "TER" => {
                state.lines[idx].classify_as(LineTag::Ter);
                state.ter_count += 1;
            }
            "MODEL" => {
                state.lines[idx].classify_as(LineTag::Model);
                state.model_count += 1;
                if state.first_coord_line.is_none() {
                    state.first_coord_line = Some(idx);
                }
            }
            "ENDMDL" => state.lines[idx].classify_as(LineTag::EndModel),
            "REMARK" if !saw_resolution && text.contains("RESOLUTION") => {
                saw_resolution = true;
                match parse_resolution(&text) {
                    Some(value) => {
                        state.method = ExperimentalMethod::Xray;
                        state.resolution = Some(value);
                    }
                    None => {
                        state.method = ExperimentalMethod::Nmr;
                        state.resolution = Some(0.0);
                    }
                }
            }
            "HELIX" => parse_element(state, &text, number, SecondaryKind::Helix),
            "SHEET" => parse_element(state, &text, number, SecondaryKind::Strand),
            "TURN" => parse_element(state, &text, number, SecondaryKind::Turn),
            _ => {}
        }
    }

    if let Some(done) = pending.take() {
        finish_chain(state, done, config, context);
    }

    state.compound = compound.join(" ");
    state.source = source.join(" ");

    if state.model_count > 0 && !saw_resolution {
        state.method = ExperimentalMethod::Nmr;
    }

    if state.chains.is_empty() {
        state
            .diagnostics
            .push(DiagnosticCode::NoSeqres, None, None, "no SEQRES records found");
        return Err(Error::missing_records("SEQRES"));
    }
    if coordinate_records == 0 && state.model_count == 0 {
        state
            .diagnostics
            .push(DiagnosticCode::NoAtom, None, None, "no ATOM or HETATM records found");
        return Err(Error::missing_records("ATOM"));
    }

    log::debug!(
        "classified {} lines: {} SEQRES chains, {} coordinate records, {} TER, {} MODEL",
        state.lines.len(),
        state.chains.len(),
        coordinate_records,
        state.ter_count,
        state.model_count
    );
    Ok(())
}

fn classify_atom(state: &mut ParseState, idx: usize, is_hetatm: bool, context: &IoContext) {
    let text = state.lines[idx].text.clone();
    let number = state.lines[idx].number;
    let chain_id = column(&text, 21);

    let alt_loc = column(&text, 16);
    let atom_marker = column(&text, 12);
    if !matches!(alt_loc, ' ' | '1' | 'A') || (atom_marker.is_ascii_digit() && atom_marker != '1')
    {
        state.diagnostics.push(
            DiagnosticCode::DupAtomRes,
            Some(number),
            Some(chain_id),
            "alternate atom position skipped",
        );
        return;
    }

    let atom_name = columns(&text, 12, 16).trim();
    let residue_name = columns(&text, 17, 20).trim();
    if atom_name.is_empty() && residue_name.is_empty() {
        return;
    }

    let residue_text: String = columns(&text, 22, 27)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    let Some(residue_number) = leading_integer(&residue_text) else {
        state.diagnostics.push(
            DiagnosticCode::NoAtomResId,
            Some(number),
            Some(chain_id),
            format!("unreadable residue number '{}'", residue_text),
        );
        return;
    };
    let marker = residue_text
        .chars()
        .last()
        .filter(|c| c.is_ascii_alphabetic())
        .unwrap_or(' ');

    let line = &mut state.lines[idx];
    line.is_hetatm = is_hetatm;
    line.atom_name = SmolStr::new(atom_name);
    line.residue_name = SmolStr::new(residue_name);
    line.chain_id = chain_id;
    line.residue_text = SmolStr::new(&residue_text);
    line.marker = marker;
    line.residue_number = residue_number;
    line.alt_number = residue_number;
    line.het_number = residue_number;
    line.classify_as(if context.is_water(residue_name) {
        LineTag::CoordWater
    } else {
        LineTag::Coord
    });
}

/// Parses the optionally signed integer that starts `text`.
fn leading_integer(text: &str) -> Option<i64> {
    let end = text
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    text[..end].parse().ok()
}

fn finish_chain(
    state: &mut ParseState,
    pending: PendingSeqres,
    config: &ParseConfig,
    context: &IoContext,
) {
    let mut chain = ChainRecord::new(pending.id);
    chain.sequence = context.sequence_from_tokens(&pending.tokens, config.strip_capping_groups);
    chain.declared_len = pending.declared;
    chain.tokens = pending.tokens;

    if chain.sequence.len() != chain.declared_len {
        state.diagnostics.push(
            DiagnosticCode::SeqresLen,
            Some(pending.line),
            Some(chain.id),
            format!(
                "SEQRES declares {} residues but lists {}",
                chain.declared_len,
                chain.sequence.len()
            ),
        );
    }
    state.chains.push(chain);
}

fn push_text(parts: &mut Vec<String>, text: &str) {
    let part = columns(text, 10, text.len()).trim();
    if !part.is_empty() {
        parts.push(part.to_string());
    }
}

fn parse_resolution(text: &str) -> Option<f64> {
    let start = text.find("RESOLUTION")? + "RESOLUTION".len();
    text[start..]
        .split_whitespace()
        .find_map(|token| token.parse::<f64>().ok())
}

/// Column layout of one secondary-structure record type.
struct ElementColumns {
    start_name: (usize, usize),
    start_chain: usize,
    start_number: (usize, usize),
    end_name: (usize, usize),
    end_chain: usize,
    end_number: (usize, usize),
}

const HELIX_COLUMNS: ElementColumns = ElementColumns {
    start_name: (15, 18),
    start_chain: 19,
    start_number: (21, 26),
    end_name: (27, 30),
    end_chain: 31,
    end_number: (33, 38),
};

const SHEET_COLUMNS: ElementColumns = ElementColumns {
    start_name: (17, 20),
    start_chain: 21,
    start_number: (22, 27),
    end_name: (28, 31),
    end_chain: 32,
    end_number: (33, 38),
};

const TURN_COLUMNS: ElementColumns = ElementColumns {
    start_name: (15, 18),
    start_chain: 19,
    start_number: (20, 25),
    end_name: (26, 29),
    end_chain: 30,
    end_number: (31, 36),
};

fn residue_field(text: &str, range: (usize, usize)) -> SmolStr {
    columns(text, range.0, range.1)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect::<String>()
        .into()
}

fn parse_element(state: &mut ParseState, text: &str, number: usize, kind: SecondaryKind) {
    let layout = match kind {
        SecondaryKind::Helix => &HELIX_COLUMNS,
        SecondaryKind::Strand => &SHEET_COLUMNS,
        SecondaryKind::Turn => &TURN_COLUMNS,
    };

    let id = SmolStr::new(columns(text, 11, 14).trim());
    let start_name = SmolStr::new(columns(text, layout.start_name.0, layout.start_name.1).trim());
    let end_name = SmolStr::new(columns(text, layout.end_name.0, layout.end_name.1).trim());
    let start_number = residue_field(text, layout.start_number);
    let end_number = residue_field(text, layout.end_number);
    let start_chain = column(text, layout.start_chain);
    let end_chain = column(text, layout.end_chain);

    if id.is_empty()
        || start_name.is_empty()
        || end_name.is_empty()
        || start_number.is_empty()
        || end_number.is_empty()
    {
        state.diagnostics.push(
            DiagnosticCode::SecMiss,
            Some(number),
            Some(start_chain),
            format!("{} record is missing a required field", kind.record()),
        );
        return;
    }

    if start_chain != end_chain {
        state.diagnostics.push(
            DiagnosticCode::SecTwoChn,
            Some(number),
            Some(start_chain),
            format!(
                "{} {} spans chains '{}' and '{}'",
                kind.record(),
                id,
                start_chain,
                end_chain
            ),
        );
        return;
    }

    let element = SecondaryElement {
        kind,
        serial: columns(text, 7, 10).trim().parse().unwrap_or(0),
        id,
        helix_class: match kind {
            SecondaryKind::Helix => columns(text, 38, 40).trim().parse().ok(),
            _ => None,
        },
        chain_id: start_chain,
        start_name,
        start_number,
        end_name,
        end_number,
        line: number,
    };

    if kind == SecondaryKind::Strand {
        let first_strand = state
            .elements
            .iter()
            .find(|e| e.kind == SecondaryKind::Strand && e.id == element.id);
        if let Some(first) = first_strand {
            if first.chain_id == element.chain_id
                && first.start_name == element.start_name
                && first.start_number == element.start_number
                && first.end_name == element.end_name
                && first.end_number == element.end_number
            {
                state.diagnostics.push(
                    DiagnosticCode::SecBarrel,
                    Some(number),
                    Some(element.chain_id),
                    format!("strand closing barrel {} duplicates its first strand", element.id),
                );
                return;
            }
        }
    }

    state.elements.push(element);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(pdb: &str) -> (ParseState, Result<(), Error>) {
        let mut state = ParseState::new(pdb.lines().map(String::from).collect());
        let result = run(&mut state, &ParseConfig::default(), &IoContext::new_default());
        (state, result)
    }

    const PDB_DATA: &str = "\
HEADER    HYDROLASE                               01-JAN-00   1ABC              \n\
COMPND    MOL_ID: 1;                                                            \n\
COMPND   2 MOLECULE: LYSOZYME;                                                  \n\
SOURCE    ORGANISM: GALLUS GALLUS;                                              \n\
REMARK   2 RESOLUTION.    1.80 ANGSTROMS.                                       \n\
SEQRES   1 A    3  ACE ALA GLY                                                  \n\
SEQRES   1 B    3  SER THR                                                      \n\
SEQRES   2 B    2  VAL                                                          \n\
HELIX    1   1 ALA A    1  GLY A    2  1                                   2    \n\
SHEET    1   S 2 ALA A   1  GLY A   2  0                                        \n\
SHEET    2   S 2 ALA A   1  GLY A   2 -1                                        \n\
TURN     1  T1 SER B   1  THR B   2                                             \n\
ATOM      1  N   ALA A   1      11.104   6.134  -6.504  1.00  0.00           N  \n\
ATOM      2  CA BALA A   1      11.639   6.071  -5.147  0.50  0.00           C  \n\
ATOM      3  CA  ALA A  10B     11.639   6.071  -5.147  1.00  0.00           C  \n\
ATOM      4  CA  ALA A          11.639   6.071  -5.147  1.00  0.00           C  \n\
HETATM    5  O   HOH A 301       1.000   2.000   3.000  1.00  0.00           O  \n\
TER       6      ALA A  10                                                      \n\
END                                                                             \n";

    #[test]
    fn run_collects_header_records() {
        let (state, result) = classify(PDB_DATA);
        assert!(result.is_ok());

        assert_eq!(state.pdb_id.as_deref(), Some("1ABC"));
        assert_eq!(state.compound, "MOL_ID: 1; MOLECULE: LYSOZYME;");
        assert_eq!(state.source, "ORGANISM: GALLUS GALLUS;");
        assert_eq!(state.method, ExperimentalMethod::Xray);
        assert!((state.resolution.unwrap() - 1.8).abs() < 1e-6);
        assert_eq!(state.ter_count, 1);
        assert_eq!(state.model_count, 0);
    }

    #[test]
    fn run_folds_seqres_lines_per_chain() {
        let (state, _) = classify(PDB_DATA);

        assert_eq!(state.chains.len(), 2);
        assert_eq!(state.chains[0].id, 'A');
        assert_eq!(state.chains[0].sequence, "AG");
        assert_eq!(state.chains[0].tokens.len(), 3);
        assert_eq!(state.chains[1].sequence, "STV");
        assert_eq!(state.diagnostics.count(DiagnosticCode::SeqresLen), 1);
        assert_eq!(state.diagnostics.count(DiagnosticCode::SeqresLenDif), 1);
    }

    #[test]
    fn run_tags_coordinate_lines_and_skips_alternates() {
        let (state, _) = classify(PDB_DATA);
        let tags: Vec<LineTag> = state.lines[12..17].iter().map(|l| l.tag()).collect();

        assert_eq!(
            tags,
            vec![
                LineTag::Coord,
                LineTag::Ignore,
                LineTag::Coord,
                LineTag::Ignore,
                LineTag::CoordWater
            ]
        );
        assert!(state.diagnostics.contains(DiagnosticCode::DupAtomRes));
        assert!(state.diagnostics.contains(DiagnosticCode::NoAtomResId));

        let inserted = &state.lines[14];
        assert_eq!(inserted.residue_text, "10B");
        assert_eq!(inserted.residue_number, 10);
        assert_eq!(inserted.marker, 'B');
        assert_eq!(inserted.alt_number, 10);
        assert_eq!(inserted.het_number, 10);
        assert_eq!(state.first_coord_line, Some(12));
    }

    #[test]
    fn run_parses_secondary_elements_and_drops_barrel_closure() {
        let (state, _) = classify(PDB_DATA);

        assert_eq!(state.elements.len(), 3);
        let helix = &state.elements[0];
        assert_eq!(helix.kind, SecondaryKind::Helix);
        assert_eq!(helix.id, "1");
        assert_eq!(helix.start_number, "1");
        assert_eq!(helix.end_name, "GLY");
        assert_eq!(helix.helix_class, Some(1));
        assert_eq!(state.elements[1].kind, SecondaryKind::Strand);
        assert_eq!(state.elements[2].kind, SecondaryKind::Turn);
        assert_eq!(state.elements[2].chain_id, 'B');
        assert!(state.diagnostics.contains(DiagnosticCode::SecBarrel));
    }

    #[test]
    fn run_drops_elements_spanning_two_chains() {
        let pdb = "\
SEQRES   1 A    2  ALA GLY                                                      \n\
HELIX    1   1 ALA A    1  GLY B    2  1                                   2    \n\
ATOM      1  CA  ALA A   1      11.104   6.134  -6.504  1.00  0.00           C  \n";
        let (state, result) = classify(pdb);

        assert!(result.is_ok());
        assert!(state.elements.is_empty());
        assert!(state.diagnostics.contains(DiagnosticCode::SecTwoChn));
    }

    #[test]
    fn models_without_resolution_mark_nmr() {
        let pdb = "\
SEQRES   1 A    1  ALA                                                          \n\
MODEL        1                                                                  \n\
ATOM      1  CA  ALA A   1      11.104   6.134  -6.504  1.00  0.00           C  \n\
ENDMDL                                                                          \n";
        let (state, _) = classify(pdb);

        assert_eq!(state.method, ExperimentalMethod::Nmr);
        assert_eq!(state.model_count, 1);
        assert_eq!(state.lines[1].tag(), LineTag::Model);
        assert_eq!(state.lines[3].tag(), LineTag::EndModel);
        assert_eq!(state.first_coord_line, Some(1));
    }

    #[test]
    fn resolution_remark_without_value_marks_nmr() {
        let pdb = "\
REMARK   2 RESOLUTION. NOT APPLICABLE.                                          \n\
SEQRES   1 A    1  ALA                                                          \n\
ATOM      1  CA  ALA A   1      11.104   6.134  -6.504  1.00  0.00           C  \n";
        let (state, _) = classify(pdb);

        assert_eq!(state.method, ExperimentalMethod::Nmr);
        assert_eq!(state.resolution, Some(0.0));
    }

    #[test]
    fn missing_seqres_is_fatal() {
        let pdb = "ATOM      1  CA  ALA A   1      11.104   6.134  -6.504  1.00  0.00           C\n";
        let (state, result) = classify(pdb);

        assert!(matches!(
            result,
            Err(Error::MissingRecords {
                record: "SEQRES",
                ..
            })
        ));
        assert!(state.diagnostics.contains(DiagnosticCode::NoSeqres));
    }

    #[test]
    fn missing_atoms_is_fatal() {
        let pdb = "SEQRES   1 A    1  ALA\n";
        let (state, result) = classify(pdb);

        assert!(matches!(
            result,
            Err(Error::MissingRecords { record: "ATOM", .. })
        ));
        assert!(state.diagnostics.contains(DiagnosticCode::NoAtom));
    }

    #[test]
    fn leading_integer_accepts_signs_and_insertions() {
        assert_eq!(leading_integer("-12"), Some(-12));
        assert_eq!(leading_integer("100A"), Some(100));
        assert_eq!(leading_integer("A1"), None);
        assert_eq!(leading_integer(""), None);
        assert_eq!(leading_integer("-"), None);
    }
}
