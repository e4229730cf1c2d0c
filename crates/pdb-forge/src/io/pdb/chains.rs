//! SEQRES-level chain validation.

use super::state::ParseState;
use crate::io::config::ParseConfig;
use crate::io::diagnostics::DiagnosticCode;
use crate::io::error::Error;

/// Rejects chains with clashing identifiers or too few amino acids.
///
/// # Errors
///
/// Returns [`Error::NoValidChains`] when no chain survives.
pub(crate) fn run(state: &mut ParseState, config: &ParseConfig) -> Result<(), Error> {
    let count = state.chains.len();

    for i in 0..count {
        for j in (i + 1)..count {
            if state.chains[i].id == state.chains[j].id {
                state.chains[i].ok = false;
                state.chains[j].ok = false;
                let id = state.chains[i].id;
                state.diagnostics.push(
                    DiagnosticCode::ChainIds,
                    None,
                    Some(id),
                    format!("chains {} and {} share the identifier '{}'", i + 1, j + 1, id),
                );
            }
        }
    }

    let has_blank = state.chains.iter().any(|c| c.id == ' ');
    let has_named = state.chains.iter().any(|c| c.id != ' ');
    if has_blank && has_named {
        state.diagnostics.push(
            DiagnosticCode::ChainIdSpc,
            None,
            None,
            "blank and non-blank chain identifiers are mixed",
        );
    }

    for chain in state.chains.iter_mut() {
        chain.aa_count = chain.sequence.chars().filter(|&c| c != 'X').count();
        if !chain.ok {
            continue;
        }
        if chain.aa_count == 0 {
            chain.ok = false;
            state.diagnostics.push(
                DiagnosticCode::SeqresNoAa,
                None,
                Some(chain.id),
                "SEQRES sequence contains no amino acids",
            );
        } else if chain.aa_count < config.min_chain_size {
            chain.ok = false;
            state.diagnostics.push(
                DiagnosticCode::SeqresFewAa,
                None,
                Some(chain.id),
                format!(
                    "SEQRES sequence has {} amino acids, fewer than {}",
                    chain.aa_count, config.min_chain_size
                ),
            );
        }
    }

    if state.valid_chain_count() == 0 {
        state.diagnostics.push(
            DiagnosticCode::NoProteins,
            None,
            None,
            "no protein chains passed SEQRES validation",
        );
        return Err(Error::no_valid_chains("SEQRES"));
    }

    log::debug!(
        "{} of {} chains passed SEQRES validation",
        state.valid_chain_count(),
        count
    );
    Ok(())
}
