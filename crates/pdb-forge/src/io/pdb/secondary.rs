//! Placement of HELIX, SHEET, and TURN elements onto reconciled residue indices.
//!
//! Each element is located once on the first model, where its endpoints are matched by
//! residue-number text and residue name. The resulting index range is then stamped onto the
//! polymer lines of the chain in every model.

use super::state::{LineTag, ParseState, SecondaryElement};
use crate::io::diagnostics::DiagnosticCode;
use crate::model::types::SecondaryKind;
use smol_str::SmolStr;
use std::collections::HashSet;

pub(crate) fn run(state: &mut ParseState) {
    let elements = std::mem::take(&mut state.elements);
    let mut sheets: Vec<HashSet<SmolStr>> = vec![HashSet::new(); state.chains.len()];

    for element in &elements {
        let Some(chain) = state.valid_chain_slot(element.chain_id) else {
            state.diagnostics.push(
                DiagnosticCode::SecChain,
                Some(element.line),
                Some(element.chain_id),
                format!(
                    "{} {} refers to no valid chain",
                    element.kind.record(),
                    element.id
                ),
            );
            continue;
        };

        let Some((first, last)) = locate(state, chain, element) else {
            continue;
        };

        let assignment = element.assignment();
        for line in state.lines.iter_mut() {
            if line.tag() != LineTag::Coord || line.chain != Some(chain) {
                continue;
            }
            if line.residue_index.is_some_and(|i| (first..=last).contains(&i)) {
                line.secondary = Some(assignment.clone());
            }
        }

        let record = &mut state.chains[chain];
        match element.kind {
            SecondaryKind::Helix => record.helix_count += 1,
            SecondaryKind::Strand => {
                record.strand_count += 1;
                sheets[chain].insert(element.id.clone());
            }
            SecondaryKind::Turn => record.turn_count += 1,
        }
    }

    for (record, ids) in state.chains.iter_mut().zip(&sheets) {
        record.sheet_count = ids.len();
    }
    state.elements = elements;

    log::debug!(
        "placed secondary structure: {:?}",
        state
            .chains
            .iter()
            .map(|c| (c.id, c.helix_count, c.strand_count, c.turn_count))
            .collect::<Vec<_>>()
    );
}

/// Finds the residue-index range of an element on model 1, logging when an endpoint is absent.
fn locate(state: &mut ParseState, chain: usize, element: &SecondaryElement) -> Option<(usize, usize)> {
    let lines = state.coord_lines(chain, 1);
    let matches = |idx: usize, text: &SmolStr, name: &SmolStr| {
        let line = &state.lines[idx];
        line.residue_text == *text && line.residue_name == *name && line.residue_index.is_some()
    };

    let start = lines
        .iter()
        .position(|&idx| matches(idx, &element.start_number, &element.start_name));
    let end = {
        let from = start.unwrap_or(0);
        lines[from..]
            .iter()
            .position(|&idx| matches(idx, &element.end_number, &element.end_name))
            .map(|p| {
                let mut k = from + p;
                while k + 1 < lines.len()
                    && matches(lines[k + 1], &element.end_number, &element.end_name)
                {
                    k += 1;
                }
                k
            })
    };

    let missing = match (start, end) {
        (Some(s), Some(e)) => {
            let first = state.lines[lines[s]].residue_index?;
            let last = state.lines[lines[e]].residue_index?;
            return Some((first, last));
        }
        (None, None) => (DiagnosticCode::SecBoth, "start and end residues"),
        (None, Some(_)) => (DiagnosticCode::SecStart, "start residue"),
        (Some(_), None) => (DiagnosticCode::SecEnd, "end residue"),
    };

    state.diagnostics.push(
        missing.0,
        Some(element.line),
        Some(element.chain_id),
        format!(
            "{} {}: {} not found among coordinates",
            element.kind.record(),
            element.id,
            missing.1
        ),
    );
    None
}
