//! Residue-number standardization under the two competing interpretations.
//!
//! The alternate-numbering interpretation (`alt_number`) reads a repeated residue number with a
//! new insertion marker as the next residue. The heterogeneity interpretation (`het_number`)
//! reads it as a second identity for the same position and excludes it. Both are made positive
//! and strictly increasing per chain and model.

use super::state::{Numbering, ParseState};
use crate::io::diagnostics::DiagnosticCode;

pub(crate) fn run(state: &mut ParseState) {
    for chain in 0..state.chains.len() {
        if !state.chains[chain].ok {
            continue;
        }
        for model in 1..=state.effective_models() {
            let lines = state.coord_lines(chain, model);
            if lines.is_empty() {
                continue;
            }
            shift_to_positive(state, &lines);
            split_alternate_markers(state, &lines);
            enforce_sequential(state, &lines, Numbering::Alt);
            let distinct: Vec<usize> = lines
                .iter()
                .copied()
                .filter(|&idx| !state.lines[idx].duplicate_position)
                .collect();
            enforce_sequential(state, &distinct, Numbering::Het);
        }
    }
}

fn shift_to_positive(state: &mut ParseState, lines: &[usize]) {
    let head = &state.lines[lines[0]];
    let first = head.alt_number;
    if first > 0 {
        return;
    }
    let (number, chain_id) = (head.number, head.chain_id);
    let offset = 1 - first;
    for &idx in lines {
        state.lines[idx].alt_number += offset;
        state.lines[idx].het_number += offset;
    }
    let code = if first < 0 {
        DiagnosticCode::NegNum
    } else {
        DiagnosticCode::ZerNum
    };
    state.diagnostics.push(
        code,
        Some(number),
        Some(chain_id),
        format!("residue numbering starts at {}, shifted by {}", first, offset),
    );
}

/// Treats a repeated residue number carrying a different insertion marker as the next residue.
fn split_alternate_markers(state: &mut ParseState, lines: &[usize]) {
    let mut correction = 0;
    let mut duplicate = false;
    let mut reports = Vec::new();

    for (k, &idx) in lines.iter().enumerate() {
        if k > 0 {
            let previous = &state.lines[lines[k - 1]];
            let line = &state.lines[idx];
            if line.residue_text != previous.residue_text {
                duplicate = line.residue_number == previous.residue_number
                    && line.marker != previous.marker;
                if duplicate {
                    correction += 1;
                    reports.push((line.number, line.chain_id, line.residue_text.clone()));
                }
            }
        }
        let line = &mut state.lines[idx];
        line.alt_number += correction;
        if duplicate {
            line.duplicate_position = true;
        }
    }

    for (number, chain_id, text) in reports {
        state.diagnostics.push(
            DiagnosticCode::OddNum,
            Some(number),
            Some(chain_id),
            format!("residue {} repeats the previous number with a new marker", text),
        );
    }
}

/// Removes exact repeats and backward jumps from one interpretation.
fn enforce_sequential(state: &mut ParseState, lines: &[usize], numbering: Numbering) {
    let mut correction = 0;
    let mut previous: Option<i64> = None;
    let mut duplicate = false;
    let mut reports = Vec::new();

    for (k, &idx) in lines.iter().enumerate() {
        let starts_residue = k == 0 || {
            let before = &state.lines[lines[k - 1]];
            let line = &state.lines[idx];
            line.atom_name == "N"
                || line.residue_name != before.residue_name
                || line.residue_text != before.residue_text
        };

        let mut current = numbering.of(&state.lines[idx]) + correction;
        if starts_residue {
            duplicate = false;
            if let Some(prev) = previous {
                let line = &state.lines[idx];
                if current == prev {
                    correction += 1;
                    current += 1;
                    duplicate = numbering == Numbering::Alt;
                    reports.push((DiagnosticCode::OddNum, line.number, line.chain_id, prev, prev));
                } else if current < prev {
                    let jump = prev - current + 1;
                    correction += jump;
                    reports.push((DiagnosticCode::NonSqntl, line.number, line.chain_id, prev, current));
                    current += jump;
                }
            }
            previous = Some(current);
        }

        let line = &mut state.lines[idx];
        match numbering {
            Numbering::Alt => line.alt_number = current,
            Numbering::Het => line.het_number = current,
        }
        if duplicate {
            line.duplicate_position = true;
        }
    }

    for (code, number, chain_id, prev, found) in reports {
        let message = match code {
            DiagnosticCode::OddNum => format!("residue number {} repeated", prev),
            _ => format!("residue number drops from {} to {}", prev, found),
        };
        state
            .diagnostics
            .push(code, Some(number), Some(chain_id), message);
    }
}
