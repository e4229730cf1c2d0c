//! Model, chain, and ligand-group assignment for coordinate lines.
//!
//! Chains are routed by their identifier character, so two chains with no TER between them
//! are still separated. Once a chain has been closed by a TER in the current model, further
//! records carrying its identifier are treated as ligands of that chain.

use super::state::{LineTag, ParseState};
use smol_str::SmolStr;
use std::collections::HashMap;

pub(crate) fn run(state: &mut ParseState) {
    assign_chains(state);
    if state.too_few_ter {
        reclassify_trailing_hetatm(state);
    }
    number_groups(state);

    log::debug!(
        "numbered {} models; ligand groups per chain: {:?}",
        state.effective_models(),
        state.chains.iter().map(|c| c.ligand_count).collect::<Vec<_>>()
    );
}

fn assign_chains(state: &mut ParseState) {
    let single_chain = state.chains.len() == 1;
    let mut closed = vec![false; state.chains.len()];
    let mut model = 1;
    let mut seen_model = false;
    let mut last_chain: Option<usize> = None;

    let start = state.first_coord_line.unwrap_or(state.lines.len());
    for idx in start..state.lines.len() {
        let tag = state.lines[idx].tag();
        match tag {
            LineTag::Model => {
                if seen_model {
                    model += 1;
                }
                seen_model = true;
                closed.iter_mut().for_each(|c| *c = false);
                continue;
            }
            LineTag::Ter => {
                if let Some(chain) = last_chain {
                    closed[chain] = true;
                }
                continue;
            }
            LineTag::Coord | LineTag::CoordWater => {}
            _ => continue,
        }

        let is_water = tag == LineTag::CoordWater;
        let chain_id = state.lines[idx].chain_id;
        let slot = state.chain_slot(chain_id);
        let line = &mut state.lines[idx];
        line.model = model;

        if is_water {
            continue;
        }

        match slot {
            Some(chain) if !closed[chain] => {
                if state.too_few_ter {
                    if let Some(previous) = last_chain.filter(|&p| p != chain) {
                        closed[previous] = true;
                    }
                }
                line.chain = Some(chain);
                last_chain = Some(chain);
            }
            Some(chain) => {
                line.chain = Some(chain);
                line.retag(LineTag::CoordHet);
            }
            None if chain_id == ' ' => match last_chain {
                Some(chain) => {
                    line.chain = Some(chain);
                    line.retag(LineTag::CoordHet);
                }
                None => line.retag(LineTag::CoordGroup),
            },
            None if single_chain => {
                line.chain = Some(0);
                line.retag(LineTag::CoordHet);
            }
            None => line.retag(LineTag::CoordGroup),
        }
    }
}

/// Turns HETATM runs at the tail of a chain into chain ligands when TER records are missing.
///
/// A run qualifies when its first residue number drops below the preceding line of the chain,
/// or when no ATOM record of the chain follows it in the same model.
fn reclassify_trailing_hetatm(state: &mut ParseState) {
    for chain in 0..state.chains.len() {
        for model in 1..=state.effective_models() {
            let lines = state.coord_lines(chain, model);
            let mut k = 0;
            while k < lines.len() {
                if !state.lines[lines[k]].is_hetatm {
                    k += 1;
                    continue;
                }
                let run_start = k;
                while k < lines.len() && state.lines[lines[k]].is_hetatm {
                    k += 1;
                }

                let first = &state.lines[lines[run_start]];
                let drops = run_start > 0
                    && first.residue_number < state.lines[lines[run_start - 1]].residue_number;
                let trailing = k == lines.len();

                if drops || trailing {
                    for &idx in &lines[run_start..k] {
                        state.lines[idx].retag(LineTag::CoordHet);
                    }
                }
            }
        }
    }
}

fn number_groups(state: &mut ParseState) {
    let chain_count = state.chains.len();
    let mut counters: HashMap<(usize, usize), (usize, Option<(SmolStr, SmolStr)>)> =
        HashMap::new();
    let mut orphan_groups: HashMap<char, usize> = HashMap::new();

    for line in state.lines.iter_mut() {
        match line.tag() {
            LineTag::CoordHet => {
                let Some(chain) = line.chain else {
                    panic!("heterogen on line {} has no chain", line.number);
                };
                let key = (line.residue_text.clone(), line.residue_name.clone());
                let (count, previous) = counters.entry((chain, line.model)).or_default();
                if previous.as_ref() != Some(&key) {
                    *count += 1;
                    *previous = Some(key);
                }
                line.group = Some(*count);
            }
            LineTag::CoordGroup => {
                let next = orphan_groups.len() + 1;
                line.group = Some(*orphan_groups.entry(line.chain_id).or_insert(next));
            }
            _ => {}
        }
    }

    for chain in 0..chain_count {
        state.chains[chain].ligand_count = counters.get(&(chain, 1)).map_or(0, |(n, _)| *n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::pdb::state::{ChainRecord, LineRecord};

    fn atom(number: usize, chain_id: char, residue: &str, name: &str, water: bool) -> LineRecord {
        let mut line = LineRecord::new(number, String::new());
        line.classify_as(if water {
            LineTag::CoordWater
        } else {
            LineTag::Coord
        });
        line.chain_id = chain_id;
        line.residue_text = SmolStr::new(residue);
        line.residue_name = SmolStr::new(name);
        line.residue_number = residue.parse().unwrap_or(0);
        line
    }

    fn hetatm(number: usize, chain_id: char, residue: &str, name: &str) -> LineRecord {
        let mut line = atom(number, chain_id, residue, name, false);
        line.is_hetatm = true;
        line
    }

    fn tagged(number: usize, tag: LineTag) -> LineRecord {
        let mut line = LineRecord::new(number, String::new());
        line.classify_as(tag);
        line
    }

    fn state_with(lines: Vec<LineRecord>, ids: &[char]) -> ParseState {
        let mut state = ParseState::default();
        for &id in ids {
            state.chains.push(ChainRecord::new(id));
        }
        state.model_count = lines.iter().filter(|l| l.tag() == LineTag::Model).count();
        state.first_coord_line = Some(0);
        state.lines = lines;
        state
    }

    #[test]
    fn chains_are_routed_by_identifier_without_ter() {
        let mut state = state_with(
            vec![
                atom(1, 'A', "1", "ALA", false),
                atom(2, 'B', "1", "GLY", false),
                atom(3, 'B', "2", "SER", false),
            ],
            &['A', 'B'],
        );
        state.too_few_ter = true;

        run(&mut state);

        assert_eq!(state.lines[0].chain, Some(0));
        assert_eq!(state.lines[1].chain, Some(1));
        assert_eq!(state.lines[2].chain, Some(1));
        assert!(state.lines.iter().all(|l| l.tag() == LineTag::Coord));
    }

    #[test]
    fn records_after_ter_become_chain_ligands() {
        let mut state = state_with(
            vec![
                atom(1, 'A', "1", "ALA", false),
                tagged(2, LineTag::Ter),
                hetatm(3, 'A', "101", "HEM"),
                hetatm(4, 'A', "101", "HEM"),
                hetatm(5, 'A', "102", "SO4"),
                atom(6, 'A', "201", "HOH", true),
            ],
            &['A'],
        );

        run(&mut state);

        assert_eq!(state.lines[2].tag(), LineTag::CoordHet);
        assert_eq!(state.lines[2].group, Some(1));
        assert_eq!(state.lines[3].group, Some(1));
        assert_eq!(state.lines[4].group, Some(2));
        assert_eq!(state.lines[5].tag(), LineTag::CoordWater);
        assert_eq!(state.lines[5].chain, None);
        assert_eq!(state.chains[0].ligand_count, 2);
    }

    #[test]
    fn unknown_identifiers_become_file_groups() {
        let mut state = state_with(
            vec![
                atom(1, 'A', "1", "ALA", false),
                tagged(2, LineTag::Ter),
                atom(3, 'B', "1", "GLY", false),
                tagged(4, LineTag::Ter),
                hetatm(5, 'Z', "1", "ZN"),
                hetatm(6, 'Y', "1", "CA"),
                hetatm(7, 'Z', "2", "ZN"),
            ],
            &['A', 'B'],
        );

        run(&mut state);

        assert_eq!(state.lines[4].tag(), LineTag::CoordGroup);
        assert_eq!(state.lines[4].group, Some(1));
        assert_eq!(state.lines[5].group, Some(2));
        assert_eq!(state.lines[6].group, Some(1));
    }

    #[test]
    fn unknown_identifier_joins_the_only_chain() {
        let mut state = state_with(
            vec![
                atom(1, 'A', "1", "ALA", false),
                tagged(2, LineTag::Ter),
                hetatm(3, 'A', "50", "NAG"),
                hetatm(4, 'Z', "60", "ZN"),
            ],
            &['A'],
        );

        run(&mut state);

        assert_eq!(state.lines[3].tag(), LineTag::CoordHet);
        assert_eq!(state.lines[3].chain, Some(0));
        assert_eq!(state.lines[3].group, Some(2));
    }

    #[test]
    fn blank_identifier_inherits_previous_chain_or_becomes_group() {
        let mut state = state_with(
            vec![
                hetatm(1, ' ', "1", "SO4"),
                atom(2, 'A', "1", "ALA", false),
                tagged(3, LineTag::Ter),
                hetatm(4, ' ', "2", "SO4"),
            ],
            &['A', 'B'],
        );

        run(&mut state);

        assert_eq!(state.lines[0].tag(), LineTag::CoordGroup);
        assert_eq!(state.lines[3].tag(), LineTag::CoordHet);
        assert_eq!(state.lines[3].chain, Some(0));
    }

    #[test]
    fn models_reset_closed_chains() {
        let mut state = state_with(
            vec![
                tagged(1, LineTag::Model),
                atom(2, 'A', "1", "ALA", false),
                tagged(3, LineTag::Ter),
                tagged(4, LineTag::EndModel),
                tagged(5, LineTag::Model),
                atom(6, 'A', "1", "ALA", false),
                tagged(7, LineTag::Ter),
                tagged(8, LineTag::EndModel),
            ],
            &['A'],
        );

        run(&mut state);

        assert_eq!(state.lines[1].model, 1);
        assert_eq!(state.lines[5].model, 2);
        assert_eq!(state.lines[5].tag(), LineTag::Coord);
    }

    #[test]
    fn trailing_hetatm_runs_are_reclassified_when_ter_is_missing() {
        let mut state = state_with(
            vec![
                atom(1, 'A', "1", "ALA", false),
                hetatm(2, 'A', "2", "MSE"),
                atom(3, 'A', "3", "GLY", false),
                atom(4, 'A', "4", "SER", false),
                hetatm(5, 'A', "1", "NAG"),
                atom(6, 'A', "5", "SER", false),
                hetatm(7, 'A', "301", "HEM"),
            ],
            &['A'],
        );
        state.too_few_ter = true;

        run(&mut state);

        assert_eq!(state.lines[1].tag(), LineTag::Coord);
        assert_eq!(state.lines[4].tag(), LineTag::CoordHet);
        assert_eq!(state.lines[6].tag(), LineTag::CoordHet);
        assert_eq!(state.lines[4].group, Some(1));
        assert_eq!(state.lines[6].group, Some(2));
    }
}
