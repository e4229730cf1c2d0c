//! Working state shared by every stage of the PDB reconciliation pipeline.
//!
//! A parse owns exactly one [`ParseState`]. It holds one [`LineRecord`] per input line, one
//! [`ChainRecord`] per SEQRES chain, the secondary-structure elements declared in the header,
//! and the buffered diagnostics. Stages mutate it in place and the assembler drains it.

use crate::io::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use crate::model::types::{ExperimentalMethod, SecondaryAssignment, SecondaryKind};
use smol_str::SmolStr;

/// Classification of an input line.
///
/// Tags only move forward: `Coord` may be refined into one of the other coordinate tags, and
/// any tag may be masked to `Ignore`, which is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineTag {
    Ignore,
    /// Polymer coordinate line.
    Coord,
    /// Heterogen attached to a chain.
    CoordHet,
    /// Heterogen attached to no chain.
    CoordGroup,
    CoordWater,
    Ter,
    Model,
    EndModel,
}

impl LineTag {
    pub fn can_become(self, next: LineTag) -> bool {
        if self == next {
            return true;
        }
        match self {
            LineTag::Ignore => false,
            LineTag::Coord => matches!(
                next,
                LineTag::CoordHet | LineTag::CoordGroup | LineTag::CoordWater | LineTag::Ignore
            ),
            _ => next == LineTag::Ignore,
        }
    }

    pub fn is_coordinate(self) -> bool {
        matches!(
            self,
            LineTag::Coord | LineTag::CoordHet | LineTag::CoordGroup | LineTag::CoordWater
        )
    }
}

/// The two readings of a residue number carried on every coordinate line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Numbering {
    /// Repeated numbers with a new insertion marker are consecutive residues.
    Alt,
    /// Repeated numbers are alternative identities of one residue.
    Het,
}

impl Numbering {
    pub fn of(self, line: &LineRecord) -> i64 {
        match self {
            Numbering::Alt => line.alt_number,
            Numbering::Het => line.het_number,
        }
    }
}

/// Position and displacement values of one coordinate line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Coordinates {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub occupancy: f64,
    pub b_factor: f64,
}

/// Everything the pipeline knows about a single input line.
///
/// Atom fields are only meaningful on lines that were ATOM or HETATM records.
#[derive(Debug, Clone)]
pub(crate) struct LineRecord {
    pub text: String,
    /// One-based line number in the input.
    pub number: usize,
    tag: LineTag,
    pub is_hetatm: bool,
    pub atom_name: SmolStr,
    pub residue_name: SmolStr,
    pub chain_id: char,
    /// Residue number text (columns 22-26, alphanumerics and hyphens only).
    pub residue_text: SmolStr,
    /// Trailing insertion character of the residue text, blank when absent.
    pub marker: char,
    /// Leading integer of the residue text.
    pub residue_number: i64,
    /// Zero-based SEQRES chain slot.
    pub chain: Option<usize>,
    pub model: usize,
    pub group: Option<usize>,
    /// Residue number under the alternate-numbering interpretation.
    pub alt_number: i64,
    /// Residue number under the heterogeneity interpretation.
    pub het_number: i64,
    pub duplicate_position: bool,
    /// Final one-based index into the chain sequence.
    pub residue_index: Option<usize>,
    pub coordinates: Option<Coordinates>,
    pub secondary: Option<SecondaryAssignment>,
}

impl LineRecord {
    pub fn new(number: usize, text: String) -> Self {
        Self {
            text,
            number,
            tag: LineTag::Ignore,
            is_hetatm: false,
            atom_name: SmolStr::default(),
            residue_name: SmolStr::default(),
            chain_id: ' ',
            residue_text: SmolStr::default(),
            marker: ' ',
            residue_number: 0,
            chain: None,
            model: 1,
            group: None,
            alt_number: 0,
            het_number: 0,
            duplicate_position: false,
            residue_index: None,
            coordinates: None,
            secondary: None,
        }
    }

    pub fn tag(&self) -> LineTag {
        self.tag
    }

    /// Sets the initial tag during classification.
    pub fn classify_as(&mut self, tag: LineTag) {
        assert_eq!(
            self.tag,
            LineTag::Ignore,
            "line {} was classified twice",
            self.number
        );
        self.tag = tag;
    }

    /// Moves the line to a later tag.
    ///
    /// # Panics
    ///
    /// Panics when the transition is not allowed by [`LineTag::can_become`].
    pub fn retag(&mut self, next: LineTag) {
        assert!(
            self.tag.can_become(next),
            "illegal tag transition {:?} -> {:?} on line {}",
            self.tag,
            next,
            self.number
        );
        self.tag = next;
    }

    pub fn mask(&mut self) {
        self.retag(LineTag::Ignore);
    }

    pub fn is_coordinate(&self) -> bool {
        self.tag.is_coordinate()
    }

    /// Whether two lines belong to the same residue of the same chain and model.
    pub fn same_residue(&self, other: &LineRecord) -> bool {
        self.residue_text == other.residue_text
            && self.chain == other.chain
            && self.chain_id == other.chain_id
            && self.model == other.model
    }
}

/// Per-chain bookkeeping, indexed by SEQRES order.
#[derive(Debug, Clone)]
pub(crate) struct ChainRecord {
    pub id: char,
    /// SEQRES three-letter tokens as written.
    pub tokens: Vec<SmolStr>,
    /// One-letter sequence, revised by the aligner.
    pub sequence: String,
    pub declared_len: usize,
    pub ok: bool,
    pub uses_alt_numbering: bool,
    pub aa_count: usize,
    pub ligand_count: usize,
    pub helix_count: usize,
    pub strand_count: usize,
    pub sheet_count: usize,
    pub turn_count: usize,
}

impl ChainRecord {
    pub fn new(id: char) -> Self {
        Self {
            id,
            tokens: Vec::new(),
            sequence: String::new(),
            declared_len: 0,
            ok: true,
            uses_alt_numbering: true,
            aa_count: 0,
            ligand_count: 0,
            helix_count: 0,
            strand_count: 0,
            sheet_count: 0,
            turn_count: 0,
        }
    }
}

/// HELIX, SHEET, or TURN record awaiting placement.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SecondaryElement {
    pub kind: SecondaryKind,
    pub serial: u32,
    pub id: SmolStr,
    pub helix_class: Option<u8>,
    pub chain_id: char,
    pub start_name: SmolStr,
    pub start_number: SmolStr,
    pub end_name: SmolStr,
    pub end_number: SmolStr,
    /// One-based line number of the declaring record.
    pub line: usize,
}

impl SecondaryElement {
    pub fn assignment(&self) -> SecondaryAssignment {
        SecondaryAssignment {
            serial: self.serial,
            id: self.id.clone(),
            kind: self.kind,
            helix_class: self.helix_class,
        }
    }
}

/// Diagnostics buffered until the parse finishes.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn push(
        &mut self,
        code: DiagnosticCode,
        line: Option<usize>,
        chain: Option<char>,
        message: impl Into<String>,
    ) {
        let diagnostic = Diagnostic::new(code, line, chain, message);
        if code.is_fatal() {
            log::error!("{}", diagnostic);
        } else {
            log::warn!("{}", diagnostic);
        }
        self.entries.push(diagnostic);
    }

    pub fn flush_into(&mut self, sink: &mut dyn DiagnosticSink) {
        for diagnostic in self.entries.drain(..) {
            sink.report(diagnostic);
        }
    }

    #[cfg(test)]
    pub fn contains(&self, code: DiagnosticCode) -> bool {
        self.entries.iter().any(|d| d.code == code)
    }

    #[cfg(test)]
    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.entries.iter().filter(|d| d.code == code).count()
    }
}

#[derive(Debug, Default)]
pub(crate) struct ParseState {
    pub lines: Vec<LineRecord>,
    pub chains: Vec<ChainRecord>,
    pub elements: Vec<SecondaryElement>,
    pub pdb_id: Option<String>,
    pub compound: String,
    pub source: String,
    pub resolution: Option<f64>,
    pub method: ExperimentalMethod,
    pub ter_count: usize,
    /// Number of MODEL records, 0 when the file has none.
    pub model_count: usize,
    /// Index of the first coordinate or MODEL line.
    pub first_coord_line: Option<usize>,
    pub too_few_ter: bool,
    pub diagnostics: Diagnostics,
}

impl ParseState {
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            lines: lines
                .into_iter()
                .enumerate()
                .map(|(i, text)| LineRecord::new(i + 1, text))
                .collect(),
            ..Default::default()
        }
    }

    /// Number of models, counting a file without MODEL records as one.
    pub fn effective_models(&self) -> usize {
        self.model_count.max(1)
    }

    /// First chain slot carrying `id`.
    pub fn chain_slot(&self, id: char) -> Option<usize> {
        self.chains.iter().position(|c| c.id == id)
    }

    /// First valid chain slot carrying `id`.
    pub fn valid_chain_slot(&self, id: char) -> Option<usize> {
        self.chains.iter().position(|c| c.ok && c.id == id)
    }

    pub fn valid_chain_count(&self) -> usize {
        self.chains.iter().filter(|c| c.ok).count()
    }

    /// Indices of `Coord` lines of `chain` in `model`, in file order.
    pub fn coord_lines(&self, chain: usize, model: usize) -> Vec<usize> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, l)| l.tag() == LineTag::Coord && l.chain == Some(chain) && l.model == model)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Returns columns `start..end` of a line, clipped to its length.
pub(crate) fn columns(text: &str, start: usize, end: usize) -> &str {
    let end = end.min(text.len());
    if start >= end {
        return "";
    }
    text.get(start..end).unwrap_or("")
}

/// Returns the character at a column, blank when the line is shorter.
pub(crate) fn column(text: &str, index: usize) -> char {
    text.as_bytes().get(index).map(|&b| b as char).unwrap_or(' ')
}
