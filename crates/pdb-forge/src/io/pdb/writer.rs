//! PDB output for reconciled structures.
//!
//! Header metadata, SEQRES, and coordinates are written back in fixed columns. Protein
//! atoms are numbered by their residue index, so a written file reads back with SEQRES and
//! ATOM numbering already in agreement.

use crate::io::error::Error;
use crate::model::{
    atom::Atom,
    chain::Chain,
    structure::Structure,
    types::{ExperimentalMethod, StandardResidue},
};
use std::io::Write;

const SEQRES_PER_LINE: usize = 13;
const TEXT_WIDTH: usize = 60;

pub fn write_structure<W: Write>(writer: W, structure: &Structure) -> Result<(), Error> {
    let mut ctx = WriterContext::new(writer);

    ctx.write_header(structure)?;

    ctx.write_seqres(structure)?;

    for model in 1..=structure.model_count.max(1) {
        ctx.write_model(structure, model)?;
    }

    ctx.write_end()?;

    Ok(())
}

struct WriterContext<W> {
    writer: W,
    current_serial: usize,
}

impl<W: Write> WriterContext<W> {
    fn new(writer: W) -> Self {
        Self {
            writer,
            current_serial: 1,
        }
    }

    fn line(&mut self, text: &str) -> Result<(), Error> {
        writeln!(self.writer, "{}", text).map_err(|e| Error::from_io(e, None))
    }

    fn write_header(&mut self, structure: &Structure) -> Result<(), Error> {
        if let Some(id) = &structure.pdb_id {
            self.line(&format!("HEADER    {:<40}{:9}   {:4}", "", "", id))?;
        }
        self.write_text("COMPND", &structure.compound)?;
        self.write_text("SOURCE", &structure.source)?;

        match (structure.method, structure.resolution) {
            (ExperimentalMethod::Xray, Some(resolution)) if resolution > 0.0 => {
                self.line(&format!(
                    "REMARK   2 RESOLUTION. {:>6.2} ANGSTROMS.",
                    resolution
                ))?;
            }
            (ExperimentalMethod::Nmr, _) => {
                self.line("REMARK   2 RESOLUTION. NOT APPLICABLE.")?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Writes free text wrapped at word boundaries with continuation numbers from 2.
    fn write_text(&mut self, record: &str, text: &str) -> Result<(), Error> {
        let mut chunks: Vec<String> = Vec::new();
        for word in text.split_whitespace() {
            match chunks.last_mut() {
                Some(chunk) if chunk.len() + 1 + word.len() <= TEXT_WIDTH => {
                    chunk.push(' ');
                    chunk.push_str(word);
                }
                _ => chunks.push(word.to_string()),
            }
        }

        for (k, chunk) in chunks.iter().enumerate() {
            let text = if k == 0 {
                format!("{:6}    {}", record, chunk)
            } else {
                format!("{:6} {:>3} {}", record, k + 1, chunk)
            };
            self.line(&text)?;
        }
        Ok(())
    }

    fn write_seqres(&mut self, structure: &Structure) -> Result<(), Error> {
        for chain in structure.iter_chains() {
            let names: Vec<&str> = chain.sequence().chars().map(three_letter).collect();
            for (k, chunk) in names.chunks(SEQRES_PER_LINE).enumerate() {
                self.line(&format!(
                    "SEQRES {:>3} {} {:>4}  {}",
                    k + 1,
                    chain.id,
                    names.len(),
                    chunk.join(" ")
                ))?;
            }
        }
        Ok(())
    }

    fn write_model(&mut self, structure: &Structure, model: usize) -> Result<(), Error> {
        let multi_model = structure.model_count > 1;
        if multi_model {
            self.line(&format!("MODEL     {:>4}", model))?;
        }

        for chain in structure.iter_chains() {
            self.write_chain(chain, model)?;
        }
        for atom in structure.groups().iter().filter(|a| a.model == model) {
            self.write_atom_record("HETATM", atom, &residue_field(&atom.residue_number))?;
        }
        for atom in structure.waters().iter().filter(|a| a.model == model) {
            self.write_atom_record("HETATM", atom, &residue_field(&atom.residue_number))?;
        }

        if multi_model {
            self.line("ENDMDL")?;
        }
        Ok(())
    }

    fn write_chain(&mut self, chain: &Chain, model: usize) -> Result<(), Error> {
        let mut last: Option<&Atom> = None;
        for atom in chain.iter_model_atoms(model).filter(|a| a.is_protein()) {
            let index = atom.residue_index.unwrap_or(0);
            self.write_atom_record("ATOM  ", atom, &format!("{:>4} ", index % 10000))?;
            last = Some(atom);
        }

        if let Some(atom) = last {
            self.write_ter_record(atom)?;
        }

        for atom in chain.iter_model_atoms(model).filter(|a| !a.is_protein()) {
            self.write_atom_record("HETATM", atom, &residue_field(&atom.residue_number))?;
        }
        Ok(())
    }

    fn write_atom_record(&mut self, record_type: &str, atom: &Atom, residue: &str) -> Result<(), Error> {
        let atom_name = if atom.name.chars().count() >= 4 {
            clipped(&atom.name, 4)
        } else {
            format!(" {:<3}", atom.name)
        };
        let res_name = clipped(&atom.residue_name, 3);

        let serial = self.current_serial;
        self.current_serial += 1;

        writeln!(
            self.writer,
            "{:6}{:5} {:4}{:1}{:>3} {:1}{:5}   {:8.3}{:8.3}{:8.3}{:6.2}{:6.2}",
            record_type,
            serial % 100000,
            atom_name,
            ' ',
            res_name,
            atom.chain_id,
            residue,
            atom.pos.x,
            atom.pos.y,
            atom.pos.z,
            atom.occupancy,
            atom.b_factor,
        )
        .map_err(|e| Error::from_io(e, None))
    }

    fn write_ter_record(&mut self, atom: &Atom) -> Result<(), Error> {
        let serial = self.current_serial;
        self.current_serial += 1;

        writeln!(
            self.writer,
            "TER   {:5}      {:>3} {:1}{:>4}",
            serial % 100000,
            clipped(&atom.residue_name, 3),
            atom.chain_id,
            atom.residue_index.unwrap_or(0) % 10000,
        )
        .map_err(|e| Error::from_io(e, None))
    }

    fn write_end(&mut self) -> Result<(), Error> {
        self.line("END")
    }
}

/// Three-letter SEQRES name of a reconciled one-letter code.
fn three_letter(code: char) -> &'static str {
    match code {
        'B' => "ASX",
        'Z' => "GLX",
        _ => StandardResidue::from_one_letter(code)
            .map(|res| res.three_letter())
            .unwrap_or("UNK"),
    }
}

/// First `width` characters of a name, never splitting a character.
fn clipped(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

/// Right-aligns residue-number text so an insertion marker lands in column 27.
fn residue_field(text: &str) -> String {
    match text.chars().last() {
        Some(marker) if marker.is_ascii_alphabetic() => {
            format!("{:>4}{}", &text[..text.len() - 1], marker)
        }
        _ => format!("{:>4} ", text),
    }
}
