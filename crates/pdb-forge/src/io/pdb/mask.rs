//! Coordinate parsing and residue-level masking.
//!
//! Residues with a single atom or without a CA atom are optionally removed, chains whose
//! coordinate records no longer hold enough residues are rejected, and every remaining
//! coordinate line receives its parsed position.

use std::collections::HashMap;

use smol_str::SmolStr;

use super::state::{Coordinates, LineTag, ParseState, columns};
use crate::io::config::ParseConfig;
use crate::io::context::IoContext;
use crate::io::diagnostics::DiagnosticCode;
use crate::io::error::Error;

pub(crate) fn run(
    state: &mut ParseState,
    config: &ParseConfig,
    context: &IoContext,
) -> Result<(), Error> {
    parse_coordinates(state);
    mask_residues(state, config, context);
    report_missing_ters(state);
    validate_chain_sizes(state, config, context);

    for line in state.lines.iter_mut() {
        let invalid = line
            .chain
            .and_then(|c| state.chains.get(c))
            .is_some_and(|c| !c.ok);
        if line.is_coordinate() && invalid {
            line.mask();
        }
    }

    if state.valid_chain_count() == 0 {
        state.diagnostics.push(
            DiagnosticCode::NoProteins,
            None,
            None,
            "no protein chains passed ATOM validation",
        );
        return Err(Error::no_valid_chains("ATOM"));
    }

    log::debug!(
        "{} chains passed ATOM validation",
        state.valid_chain_count()
    );
    Ok(())
}

fn parse_coordinates(state: &mut ParseState) {
    for idx in 0..state.lines.len() {
        if !state.lines[idx].is_coordinate() {
            continue;
        }
        match read_coordinates(&state.lines[idx].text) {
            Some(coordinates) => state.lines[idx].coordinates = Some(coordinates),
            None => {
                let line = &mut state.lines[idx];
                line.mask();
                let (number, chain_id) = (line.number, line.chain_id);
                state.diagnostics.push(
                    DiagnosticCode::BadCoord,
                    Some(number),
                    Some(chain_id),
                    "unreadable coordinates",
                );
            }
        }
    }
}

/// Reads x, y, z, occupancy, and B-factor from fixed columns, falling back to
/// whitespace-separated values when the columns are misaligned.
fn read_coordinates(text: &str) -> Option<Coordinates> {
    let fixed = |start: usize, end: usize| columns(text, start, end).trim().parse::<f64>().ok();

    if let (Some(x), Some(y), Some(z)) = (fixed(30, 38), fixed(38, 46), fixed(46, 54)) {
        return Some(Coordinates {
            x,
            y,
            z,
            occupancy: fixed(54, 60).unwrap_or(1.0),
            b_factor: fixed(60, 66).unwrap_or(0.0),
        });
    }

    let values: Vec<f64> = columns(text, 28, text.len())
        .split_whitespace()
        .map_while(|token| token.parse::<f64>().ok())
        .collect();
    if values.len() < 3 {
        return None;
    }
    let b_factor = columns(text, 60, text.len())
        .split_whitespace()
        .next()
        .and_then(|token| token.parse::<f64>().ok())
        .or_else(|| values.get(4).copied())
        .unwrap_or(0.0);

    Some(Coordinates {
        x: values[0],
        y: values[1],
        z: values[2],
        occupancy: values.get(3).copied().unwrap_or(1.0),
        b_factor,
    })
}

/// Groups consecutive `Coord` lines into residues, skipping masked lines.
pub(crate) fn residue_runs(state: &ParseState) -> Vec<Vec<usize>> {
    let mut runs: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = Vec::new();

    for (idx, line) in state.lines.iter().enumerate() {
        match line.tag() {
            LineTag::Ignore => continue,
            LineTag::Coord => {
                let continues = current
                    .last()
                    .is_some_and(|&last| state.lines[last].same_residue(line));
                if !continues && !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
                current.push(idx);
            }
            _ => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

fn mask_residues(state: &mut ParseState, config: &ParseConfig, context: &IoContext) {
    let mut excised: Vec<Vec<bool>> = state
        .chains
        .iter()
        .map(|c| vec![false; c.tokens.len()])
        .collect();
    let mut occurrences: HashMap<(usize, SmolStr), usize> = HashMap::new();

    for run in residue_runs(state) {
        let first = &state.lines[run[0]];
        let (number, chain_id, chain) = (first.number, first.chain_id, first.chain);
        let name = first.residue_name.clone();
        let text = first.residue_text.clone();
        let residue_number = first.residue_number;

        // Which model-1 occurrence of this name within its chain.
        let occurrence = match chain {
            Some(c) if first.model == 1 => {
                let seen = occurrences.entry((c, name.clone())).or_insert(0);
                *seen += 1;
                Some(*seen - 1)
            }
            _ => None,
        };

        if run.len() == 1 {
            state.diagnostics.push(
                DiagnosticCode::AtomOneOnly,
                Some(number),
                Some(chain_id),
                format!("residue {} {} has a single atom", name, text),
            );
            if config.mask_single_atom_residues {
                state.lines[run[0]].mask();
                continue;
            }
        }

        let has_ca = run.iter().any(|&idx| state.lines[idx].atom_name == "CA");
        if has_ca {
            continue;
        }

        state.diagnostics.push(
            DiagnosticCode::AtomNoCa,
            Some(number),
            Some(chain_id),
            format!("residue {} {} has no CA atom", name, text),
        );

        let standard = context.is_standard_amino_acid(&name);
        let masked = if standard {
            config.mask_standard_without_ca
        } else {
            config.mask_nonstandard_without_ca
        };
        if !masked {
            continue;
        }

        for &idx in &run {
            state.lines[idx].mask();
        }

        if standard {
            continue;
        }
        if let (Some(c), Some(occurrence)) = (chain, occurrence) {
            let tokens = &state.chains[c].tokens;
            if let Some(slot) = seqres_slot(tokens, &excised[c], &name, residue_number, occurrence) {
                excised[c][slot] = true;
            }
        }
    }

    for (record, excised) in state.chains.iter_mut().zip(excised) {
        if !excised.contains(&true) {
            continue;
        }
        let mut flags = excised.into_iter();
        record.tokens.retain(|_| !flags.next().unwrap_or(false));
        record.sequence = context.sequence_from_tokens(&record.tokens, config.strip_capping_groups);
    }
}

/// Picks the one SEQRES token that stands for a masked residue.
///
/// The token at the residue's own number wins when its name agrees; otherwise the token
/// with the same rank among equally named tokens, then the first one still present.
fn seqres_slot(
    tokens: &[SmolStr],
    excised: &[bool],
    name: &str,
    residue_number: i64,
    occurrence: usize,
) -> Option<usize> {
    let available = |slot: usize| tokens[slot] == name && !excised[slot];

    if let Ok(slot) = usize::try_from(residue_number - 1) {
        if slot < tokens.len() && available(slot) {
            return Some(slot);
        }
    }

    let mut named = (0..tokens.len()).filter(|&slot| tokens[slot] == name);
    if let Some(slot) = named.nth(occurrence).filter(|&slot| available(slot)) {
        return Some(slot);
    }
    (0..tokens.len()).find(|&slot| available(slot))
}

fn report_missing_ters(state: &mut ParseState) {
    let mut previous: Option<(Option<usize>, usize)> = None;
    let mut reports = Vec::new();

    for line in &state.lines {
        match line.tag() {
            LineTag::Coord => {
                if let Some((chain, model)) = previous {
                    if chain != line.chain && model == line.model {
                        reports.push((line.number, line.chain_id));
                    }
                }
                previous = Some((line.chain, line.model));
            }
            LineTag::Ter | LineTag::Model | LineTag::EndModel => previous = None,
            _ => {}
        }
    }

    for (number, chain_id) in reports {
        state.diagnostics.push(
            DiagnosticCode::TerMiss,
            Some(number),
            Some(chain_id),
            "chain changes without a TER record",
        );
    }
}

/// Counts amino-acid residues per chain and model; names that map to `X` are not counted.
fn validate_chain_sizes(state: &mut ParseState, config: &ParseConfig, context: &IoContext) {
    let models = state.effective_models();
    let mut counts = vec![vec![0usize; models + 1]; state.chains.len()];

    for run in residue_runs(state) {
        let line = &state.lines[run[0]];
        if context.one_letter(&line.residue_name) == 'X' {
            continue;
        }
        if let Some(chain) = line.chain {
            if line.model <= models {
                counts[chain][line.model] += 1;
            }
        }
    }

    for (slot, chain) in state.chains.iter_mut().enumerate() {
        if !chain.ok {
            continue;
        }
        chain.aa_count = counts[slot][1];
        if let Some(model) = (1..=models).find(|&m| counts[slot][m] < config.min_chain_size) {
            chain.ok = false;
            state.diagnostics.push(
                DiagnosticCode::AtomFewAa,
                None,
                Some(chain.id),
                format!(
                    "model {} has {} residues with coordinates, fewer than {}",
                    model, counts[slot][model], config.min_chain_size
                ),
            );
        }
    }
}
