//! TER and MODEL record reconciliation.

use super::state::{LineTag, ParseState};
use crate::io::context::IoContext;
use crate::io::diagnostics::DiagnosticCode;

/// Masks duplicate MODEL records, then compares the TER count with the expected
/// chains × models and masks TER records that split a contiguous amino-acid run.
pub(crate) fn run(state: &mut ParseState, context: &IoContext) {
    mask_duplicate_models(state);

    let expected = state.valid_chain_count() * state.effective_models();
    let observed = state.ter_count;

    if observed == 0 {
        state.too_few_ter = true;
        state
            .diagnostics
            .push(DiagnosticCode::TerNone, None, None, "no TER records found");
    } else if observed > expected {
        state.diagnostics.push(
            DiagnosticCode::TerTooMany,
            None,
            None,
            format!("{} TER records found, {} expected", observed, expected),
        );
        mask_spurious_ters(state, context);
    } else if observed < expected {
        state.too_few_ter = true;
        state.diagnostics.push(
            DiagnosticCode::TerTooFew,
            None,
            None,
            format!("{} TER records found, {} expected", observed, expected),
        );
    }

    log::debug!(
        "TER records: {} observed, {} expected, {} after masking",
        observed,
        expected,
        state.ter_count
    );
}

fn mask_duplicate_models(state: &mut ParseState) {
    let mut previous: Option<LineTag> = None;
    for idx in 0..state.lines.len() {
        let tag = state.lines[idx].tag();
        if tag == LineTag::Ignore {
            continue;
        }
        if tag == LineTag::Model && previous == Some(LineTag::Model) {
            state.lines[idx].mask();
            state.model_count -= 1;
            let number = state.lines[idx].number;
            state.diagnostics.push(
                DiagnosticCode::ModelDup,
                Some(number),
                None,
                "duplicate MODEL record masked",
            );
            continue;
        }
        previous = Some(tag);
    }
}

fn mask_spurious_ters(state: &mut ParseState, context: &IoContext) {
    for idx in 0..state.lines.len() {
        if state.lines[idx].tag() != LineTag::Ter {
            continue;
        }

        let before = state.lines[..idx]
            .iter()
            .rev()
            .find(|l| l.tag() != LineTag::Ignore);
        let after = state.lines[idx + 1..]
            .iter()
            .find(|l| l.tag() != LineTag::Ignore);

        let is_amino_acid = |tag: LineTag, name: &str| {
            tag == LineTag::Coord && context.is_standard_amino_acid(name)
        };

        let spurious = match (before, after) {
            (Some(b), Some(a)) => {
                is_amino_acid(b.tag(), &b.residue_name)
                    && is_amino_acid(a.tag(), &a.residue_name)
                    && b.chain_id == a.chain_id
            }
            _ => false,
        };

        if spurious {
            let chain_id = state.lines[idx + 1..]
                .iter()
                .find(|l| l.tag() != LineTag::Ignore)
                .map(|l| l.chain_id);
            state.lines[idx].mask();
            state.ter_count -= 1;
            let number = state.lines[idx].number;
            state.diagnostics.push(
                DiagnosticCode::TerTooMany,
                Some(number),
                chain_id,
                "TER record inside a contiguous chain masked",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::pdb::state::{ChainRecord, LineRecord, fixtures::coord};

    fn tagged(number: usize, tag: LineTag) -> LineRecord {
        let mut line = LineRecord::new(number, String::new());
        line.classify_as(tag);
        line
    }

    fn state_with_lines(lines: Vec<LineRecord>, chains: usize) -> ParseState {
        let mut state = ParseState::default();
        for id in ['A', 'B', 'C'].into_iter().take(chains) {
            state.chains.push(ChainRecord::new(id));
        }
        state.ter_count = lines.iter().filter(|l| l.tag() == LineTag::Ter).count();
        state.model_count = lines.iter().filter(|l| l.tag() == LineTag::Model).count();
        state.lines = lines;
        state
    }

    #[test]
    fn spurious_ter_between_matching_amino_acids_is_masked() {
        let lines = vec![
            coord(1, 0, 'A', "1", "ALA", "CA"),
            tagged(2, LineTag::Ter),
            coord(3, 0, 'A', "2", "GLY", "CA"),
            tagged(4, LineTag::Ter),
        ];
        let mut state = state_with_lines(lines, 1);

        run(&mut state, &IoContext::new_default());

        assert_eq!(state.lines[1].tag(), LineTag::Ignore);
        assert_eq!(state.lines[3].tag(), LineTag::Ter);
        assert_eq!(state.ter_count, 1);
        assert!(!state.too_few_ter);
        assert_eq!(state.diagnostics.count(DiagnosticCode::TerTooMany), 2);
    }

    #[test]
    fn ter_next_to_heterogen_is_kept() {
        let lines = vec![
            coord(1, 0, 'A', "1", "ALA", "CA"),
            tagged(2, LineTag::Ter),
            coord(3, 0, 'A', "2", "HEM", "FE"),
            tagged(4, LineTag::Ter),
        ];
        let mut state = state_with_lines(lines, 1);

        run(&mut state, &IoContext::new_default());

        assert_eq!(state.lines[1].tag(), LineTag::Ter);
        assert_eq!(state.ter_count, 2);
    }

    #[test]
    fn missing_ters_set_too_few_flag() {
        let lines = vec![
            coord(1, 0, 'A', "1", "ALA", "CA"),
            tagged(2, LineTag::Ter),
            coord(3, 1, 'B', "1", "GLY", "CA"),
        ];
        let mut state = state_with_lines(lines, 2);

        run(&mut state, &IoContext::new_default());

        assert!(state.too_few_ter);
        assert!(state.diagnostics.contains(DiagnosticCode::TerTooFew));
    }

    #[test]
    fn no_ters_are_reported_and_flagged() {
        let lines = vec![coord(1, 0, 'A', "1", "ALA", "CA")];
        let mut state = state_with_lines(lines, 1);

        run(&mut state, &IoContext::new_default());

        assert!(state.too_few_ter);
        assert!(state.diagnostics.contains(DiagnosticCode::TerNone));
    }

    #[test]
    fn adjacent_model_records_are_deduplicated() {
        let lines = vec![
            tagged(1, LineTag::Model),
            tagged(2, LineTag::Model),
            coord(3, 0, 'A', "1", "ALA", "CA"),
            tagged(4, LineTag::Ter),
            tagged(5, LineTag::EndModel),
        ];
        let mut state = state_with_lines(lines, 1);

        run(&mut state, &IoContext::new_default());

        assert_eq!(state.lines[1].tag(), LineTag::Ignore);
        assert_eq!(state.model_count, 1);
        assert!(state.diagnostics.contains(DiagnosticCode::ModelDup));
        assert!(!state.too_few_ter);
    }
}
