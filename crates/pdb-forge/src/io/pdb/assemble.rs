//! Conversion of the reconciled parse state into the public [`Structure`].

use super::state::{LineRecord, LineTag, ParseState};
use crate::model::atom::Atom;
use crate::model::chain::{Chain, ElementCounts};
use crate::model::residue::Residue;
use crate::model::structure::Structure;
use crate::model::types::{AtomCategory, Point};

pub(crate) fn run(state: ParseState) -> Structure {
    let mut structure = Structure::new();
    structure.pdb_id = state.pdb_id.clone();
    structure.compound = state.compound.clone();
    structure.source = state.source.clone();
    structure.method = state.method;
    structure.resolution = state.resolution;
    structure.model_count = state.effective_models();

    // Parse-time chain slot to final 1-based chain number.
    let mut lookup: Vec<Option<usize>> = Vec::with_capacity(state.chains.len());
    let mut chains: Vec<Chain> = Vec::new();
    for record in &state.chains {
        if !record.ok {
            lookup.push(None);
            continue;
        }
        let mut chain = Chain::new(record.id, &record.sequence);
        chain.elements = ElementCounts {
            helices: record.helix_count,
            strands: record.strand_count,
            sheets: record.sheet_count,
            turns: record.turn_count,
        };
        chain.ligand_count = record.ligand_count;
        chain.uses_alt_numbering = record.uses_alt_numbering;
        chains.push(chain);
        lookup.push(Some(chains.len()));
    }

    for line in &state.lines {
        let tag = line.tag();
        if !tag.is_coordinate() {
            continue;
        }
        let mut atom = atom_from(line);

        match tag {
            LineTag::Coord | LineTag::CoordHet => {
                let number = final_chain(&lookup, line);
                let chain = &mut chains[number - 1];
                atom.chain = Some(number);

                if tag == LineTag::Coord {
                    let Some(index) = line.residue_index else {
                        panic!("polymer atom on line {} has no residue index", line.number);
                    };
                    atom.residue_index = Some(index);
                    if line.model == 1 && chain.residue(index).is_none() {
                        let code = chain.sequence().as_bytes()[index - 1] as char;
                        let mut residue =
                            Residue::new(number, index, &line.residue_text, code, &line.residue_name);
                        residue.secondary = line.secondary.clone();
                        chain.push_residue(residue);
                    }
                } else {
                    atom.category = AtomCategory::Heterogen;
                    atom.group = line.group;
                }
                chain.push_atom(atom);
            }
            LineTag::CoordGroup => {
                atom.category = AtomCategory::Heterogen;
                atom.group = line.group;
                structure.push_group_atom(atom);
            }
            LineTag::CoordWater => {
                atom.category = AtomCategory::Water;
                structure.push_water(atom);
            }
            _ => unreachable!("non-coordinate tag {:?}", tag),
        }
    }

    for chain in chains {
        structure.push_chain(chain);
    }

    log::debug!(
        "assembled {} chains, {} residues, {} atoms",
        structure.chain_count(),
        structure.residue_count(),
        structure.atom_count()
    );
    structure
}

fn final_chain(lookup: &[Option<usize>], line: &LineRecord) -> usize {
    match line.chain.and_then(|slot| lookup.get(slot).copied().flatten()) {
        Some(number) => number,
        None => panic!(
            "line {} belongs to no surviving chain but was not masked",
            line.number
        ),
    }
}

fn atom_from(line: &LineRecord) -> Atom {
    let Some(coordinates) = line.coordinates else {
        panic!("coordinate line {} has no parsed coordinates", line.number);
    };
    let mut atom = Atom::new(
        &line.atom_name,
        &line.residue_name,
        &line.residue_text,
        Point::new(coordinates.x, coordinates.y, coordinates.z),
    );
    atom.model = line.model;
    atom.chain_id = line.chain_id;
    atom.occupancy = coordinates.occupancy;
    atom.b_factor = coordinates.b_factor;
    atom
}
