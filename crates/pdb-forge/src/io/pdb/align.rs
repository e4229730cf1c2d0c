//! SEQRES/ATOM sequence reconciliation.
//!
//! For every valid chain the residues with coordinates are read off model 1 under both
//! numbering interpretations and matched against the SEQRES sequence by a fixed ladder of
//! increasingly tolerant strategies. The first strategy that succeeds decides the chain
//! sequence, the numbering interpretation, and the residue index of every coordinate line.

use super::state::{LineTag, Numbering, ParseState};
use crate::io::config::ParseConfig;
use crate::io::context::IoContext;
use crate::io::diagnostics::DiagnosticCode;
use std::collections::HashMap;

/// Strategy of the ladder that produced an [`Alignment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LadderStep {
    /// Equal lengths, identical or within the mismatch limit.
    EqualLength,
    /// ATOM sequence found inside SEQRES, possibly with a C-terminal tail appended.
    AtomInSeqres,
    /// SEQRES found inside the ATOM sequence; the flanks are grafted on.
    SeqresInAtom,
    /// Residue numbers used directly as SEQRES positions.
    Indexed,
    /// Exact segments separated by gaps.
    Gapped,
    /// Exact segments with a bounded number of mismatched residues in the gaps.
    GappedTolerant,
}

/// Successful match of one candidate against a working SEQRES sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Alignment {
    /// Working sequence after patching and grafting.
    pub sequence: Vec<u8>,
    /// One-based position in `sequence` of every candidate residue.
    pub indices: Vec<usize>,
    /// Zero-based positions of `sequence` patched from the ATOM residue.
    pub mismatches: Vec<usize>,
    /// Residues grafted before the start of SEQRES.
    pub missing_n: usize,
    /// Residues grafted after the end of SEQRES.
    pub missing_c: usize,
    pub step: LadderStep,
}

impl Alignment {
    fn new(sequence: Vec<u8>, indices: Vec<usize>, step: LadderStep) -> Self {
        Self {
            sequence,
            indices,
            mismatches: Vec::new(),
            missing_n: 0,
            missing_c: 0,
            step,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Limits {
    pub max_mismatches: usize,
    pub max_trim: usize,
}

/// Runs the ladder for one candidate.
///
/// # Arguments
///
/// * `candidate` - One-letter codes of the residues with coordinates.
/// * `numbers` - Standardized residue number of each candidate residue.
/// * `seqres` - Working SEQRES sequence.
/// * `limits` - Mismatch and trim budgets.
///
/// # Returns
///
/// The first successful [`Alignment`], or `None` when every strategy fails.
pub(crate) fn align(
    candidate: &[u8],
    numbers: &[i64],
    seqres: &[u8],
    limits: Limits,
) -> Option<Alignment> {
    if candidate.is_empty() || seqres.is_empty() {
        return None;
    }
    equal_length(candidate, seqres, limits.max_mismatches)
        .or_else(|| atom_in_seqres(candidate, seqres, limits.max_trim))
        .or_else(|| seqres_in_atom(candidate, seqres))
        .or_else(|| indexed(candidate, numbers, seqres, limits.max_mismatches))
        .or_else(|| greedy(candidate, seqres, 0, false))
        .or_else(|| greedy(candidate, seqres, limits.max_mismatches, true))
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|p| p + from)
}

fn equal_length(candidate: &[u8], seqres: &[u8], limit: usize) -> Option<Alignment> {
    if candidate.len() != seqres.len() {
        return None;
    }
    let mismatches: Vec<usize> = (0..candidate.len())
        .filter(|&i| candidate[i] != seqres[i])
        .collect();
    if mismatches.len() > limit {
        return None;
    }
    let mut alignment = Alignment::new(
        candidate.to_vec(),
        (1..=candidate.len()).collect(),
        LadderStep::EqualLength,
    );
    alignment.mismatches = mismatches;
    Some(alignment)
}

/// Finds the candidate in SEQRES. Without trimming it may sit anywhere; with `b` residues
/// trimmed from its C-terminus the remainder must end SEQRES and the tail is appended.
fn atom_in_seqres(candidate: &[u8], seqres: &[u8], max_trim: usize) -> Option<Alignment> {
    let n = candidate.len();
    for trim in 0..=max_trim.min(n - 1) {
        let kept = &candidate[..n - trim];
        let offset = if trim == 0 {
            find(seqres, kept, 0)
        } else if seqres.ends_with(kept) {
            Some(seqres.len() - kept.len())
        } else {
            None
        };
        let Some(offset) = offset else {
            continue;
        };

        let mut sequence = seqres.to_vec();
        sequence.extend_from_slice(&candidate[n - trim..]);
        let mut alignment = Alignment::new(
            sequence,
            (offset + 1..=offset + n).collect(),
            LadderStep::AtomInSeqres,
        );
        alignment.missing_c = trim;
        return Some(alignment);
    }
    None
}

fn seqres_in_atom(candidate: &[u8], seqres: &[u8]) -> Option<Alignment> {
    let offset = find(candidate, seqres, 0)?;
    let mut alignment = Alignment::new(
        candidate.to_vec(),
        (1..=candidate.len()).collect(),
        LadderStep::SeqresInAtom,
    );
    alignment.missing_n = offset;
    alignment.missing_c = candidate.len() - offset - seqres.len();
    Some(alignment)
}

fn indexed(candidate: &[u8], numbers: &[i64], seqres: &[u8], limit: usize) -> Option<Alignment> {
    if numbers.len() != candidate.len()
        || numbers
            .iter()
            .any(|&k| k < 1 || k as usize > seqres.len())
    {
        return None;
    }

    let mut sequence = seqres.to_vec();
    let mut mismatches = Vec::new();
    for (i, &k) in numbers.iter().enumerate() {
        let p = k as usize - 1;
        if seqres[p] != candidate[i] {
            if !mismatches.contains(&p) {
                mismatches.push(p);
            }
            sequence[p] = candidate[i];
        }
    }
    if mismatches.len() > limit {
        return None;
    }

    let mut alignment = Alignment::new(
        sequence,
        numbers.iter().map(|&k| k as usize).collect(),
        LadderStep::Indexed,
    );
    alignment.mismatches = mismatches;
    Some(alignment)
}

/// Greedy segment chaining shared by the last two ladder steps.
///
/// At each position the longest prefix of the unmatched candidate that still occurs in the
/// unmatched SEQRES tail, with room for every remaining candidate residue, is consumed. When
/// `tolerate` is set, a segment must span at least two residues unless it is the last one; a
/// residue that starts no such segment is held back and later placed in the gap before the
/// next match (or after the last one), counting as a mismatch unless an exact residue is
/// found for it in that gap. Residues held back before the first match are placed
/// immediately before it without that search.
fn greedy(candidate: &[u8], seqres: &[u8], limit: usize, tolerate: bool) -> Option<Alignment> {
    let n = candidate.len();
    let m = seqres.len();
    let mut placement = Placement {
        candidate,
        seqres,
        sequence: seqres.to_vec(),
        indices: vec![0; n],
        mismatches: Vec::new(),
    };
    let mut pending: Vec<usize> = Vec::new();
    let mut matched = false;
    let mut seq_pos = 0;
    let mut cand_pos = 0;

    while cand_pos < n {
        let from = seq_pos + pending.len();
        let remaining = n - cand_pos;
        let shortest = if tolerate { remaining.min(2) } else { 1 };

        let segment = longest_segment(&candidate[cand_pos..], seqres, from)
            .filter(|&(_, len)| len >= shortest);
        match segment {
            Some((p, len)) => {
                if !pending.is_empty() {
                    placement.place(&pending, seq_pos, p, matched, true);
                    pending.clear();
                    if placement.mismatches.len() > limit {
                        return None;
                    }
                }
                for t in 0..len {
                    placement.indices[cand_pos + t] = p + t + 1;
                }
                cand_pos += len;
                seq_pos = p + len;
                matched = true;
            }
            None if tolerate => {
                pending.push(cand_pos);
                cand_pos += 1;
            }
            None => return None,
        }
    }

    if !pending.is_empty() {
        if seq_pos + pending.len() > m {
            return None;
        }
        placement.place(&pending, seq_pos, m, matched, false);
    }

    if placement.mismatches.len() > limit {
        return None;
    }

    let step = if tolerate {
        LadderStep::GappedTolerant
    } else {
        LadderStep::Gapped
    };
    let mut alignment = Alignment::new(placement.sequence, placement.indices, step);
    alignment.mismatches = placement.mismatches;
    Some(alignment)
}

/// Longest prefix of `rest` found in `seqres` at or after `from`, leaving room for all of
/// `rest`. Returns the earliest start among equally long matches, with the match length.
fn longest_segment(rest: &[u8], seqres: &[u8], from: usize) -> Option<(usize, usize)> {
    let last_start = seqres.len().checked_sub(rest.len())?;
    let mut best: Option<(usize, usize)> = None;

    for p in from..=last_start {
        let len = rest
            .iter()
            .zip(&seqres[p..])
            .take_while(|(a, b)| a == b)
            .count();
        if len > best.map_or(0, |(_, l)| l) {
            best = Some((p, len));
            if len == rest.len() {
                break;
            }
        }
    }
    best
}

struct Placement<'a> {
    candidate: &'a [u8],
    seqres: &'a [u8],
    sequence: Vec<u8>,
    indices: Vec<usize>,
    mismatches: Vec<usize>,
}

impl Placement<'_> {
    /// Places held-back residues into SEQRES positions `lo..hi`, in order.
    fn place(&mut self, pending: &[usize], lo: usize, hi: usize, rescue: bool, right_align: bool) {
        let k = pending.len();
        let mut cursor = lo;
        for (t, &residue) in pending.iter().enumerate() {
            let latest = hi - (k - t);
            let default = if right_align { latest } else { cursor };
            let slot = if rescue {
                (cursor..=latest)
                    .find(|&q| self.seqres[q] == self.candidate[residue])
                    .unwrap_or(default)
            } else {
                default
            };
            self.indices[residue] = slot + 1;
            if self.seqres[slot] != self.candidate[residue] {
                self.mismatches.push(slot);
                self.sequence[slot] = self.candidate[residue];
            }
            cursor = slot + 1;
        }
    }
}

/// Residues with coordinates in model 1 read under one numbering.
#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    numbering: Numbering,
    sequence: Vec<u8>,
    numbers: Vec<i64>,
}

fn candidate(
    state: &ParseState,
    lines: &[usize],
    numbering: Numbering,
    context: &IoContext,
) -> Candidate {
    let mut sequence = Vec::new();
    let mut numbers = Vec::new();
    for &idx in lines {
        let line = &state.lines[idx];
        if numbering == Numbering::Het && line.duplicate_position {
            continue;
        }
        let number = numbering.of(line);
        if numbers.last() != Some(&number) {
            numbers.push(number);
            sequence.push(context.one_letter(&line.residue_name) as u8);
        }
    }
    Candidate {
        numbering,
        sequence,
        numbers,
    }
}

pub(crate) fn run(state: &mut ParseState, config: &ParseConfig, context: &IoContext) {
    let limits = Limits {
        max_mismatches: config.max_mismatches,
        max_trim: config.max_trim,
    };

    for chain in 0..state.chains.len() {
        if !state.chains[chain].ok {
            continue;
        }
        let lines = state.coord_lines(chain, 1);
        let alt = candidate(state, &lines, Numbering::Alt, context);
        if alt.sequence.is_empty() {
            continue;
        }
        let het = Some(candidate(state, &lines, Numbering::Het, context))
            .filter(|het| !het.sequence.is_empty() && het.sequence != alt.sequence);

        let seqres = state.chains[chain].sequence.as_bytes().to_vec();
        let mut chosen: Option<(usize, &Candidate, Alignment)> = None;

        'search: for prefix in 0..=config.max_trim.min(alt.sequence.len() - 1) {
            for cand in std::iter::once(&alt).chain(het.as_ref()) {
                if prefix >= cand.sequence.len() {
                    continue;
                }
                let mut working = cand.sequence[..prefix].to_vec();
                working.extend_from_slice(&seqres);
                if let Some(alignment) = align(&cand.sequence, &cand.numbers, &working, limits) {
                    chosen = Some((prefix, cand, alignment));
                    break 'search;
                }
            }
        }

        let chain_id = state.chains[chain].id;
        let (numbering, map) = match chosen {
            Some((prefix, cand, alignment)) => {
                report(state, chain_id, prefix, &alignment);
                state.chains[chain].sequence =
                    alignment.sequence.iter().map(|&b| b as char).collect();
                let map: HashMap<i64, usize> = cand
                    .numbers
                    .iter()
                    .copied()
                    .zip(alignment.indices.iter().copied())
                    .collect();
                (cand.numbering, map)
            }
            None => {
                state.diagnostics.push(
                    DiagnosticCode::NoMatch,
                    None,
                    Some(chain_id),
                    "no alignment found, using the ATOM sequence",
                );
                state.chains[chain].sequence = alt.sequence.iter().map(|&b| b as char).collect();
                let map: HashMap<i64, usize> = alt
                    .numbers
                    .iter()
                    .copied()
                    .zip(1..)
                    .collect();
                (Numbering::Alt, map)
            }
        };

        state.chains[chain].uses_alt_numbering = numbering == Numbering::Alt;
        assign_indices(state, chain, numbering, &map);
    }
}

fn report(state: &mut ParseState, chain_id: char, prefix: usize, alignment: &Alignment) {
    let chain = Some(chain_id);
    let diagnostics = &mut state.diagnostics;

    if prefix > 0 {
        diagnostics.push(
            DiagnosticCode::MissNTerm,
            None,
            chain,
            format!("{} N-terminal residues missing from SEQRES", prefix),
        );
    }
    if alignment.missing_n > 0 {
        diagnostics.push(
            DiagnosticCode::MissNTerm,
            None,
            chain,
            format!("{} N-terminal residues missing from SEQRES", alignment.missing_n),
        );
    }
    if alignment.missing_c > 0 {
        diagnostics.push(
            DiagnosticCode::MissCTerm,
            None,
            chain,
            format!("{} C-terminal residues missing from SEQRES", alignment.missing_c),
        );
    }
    for &p in &alignment.mismatches {
        diagnostics.push(
            DiagnosticCode::Mismatch,
            None,
            chain,
            format!(
                "SEQRES position {} replaced by ATOM residue {}",
                p + 1,
                alignment.sequence[p] as char
            ),
        );
    }
    match alignment.step {
        LadderStep::Gapped => diagnostics.push(
            DiagnosticCode::Gapped,
            None,
            chain,
            "ATOM sequence aligned to SEQRES with gaps",
        ),
        LadderStep::GappedTolerant => diagnostics.push(
            DiagnosticCode::GappedOk,
            None,
            chain,
            format!(
                "ATOM sequence aligned to SEQRES with gaps and {} mismatches",
                alignment.mismatches.len()
            ),
        ),
        _ => {}
    }
    log::debug!("chain {} aligned by {:?}", chain_id, alignment.step);
}

fn assign_indices(
    state: &mut ParseState,
    chain: usize,
    numbering: Numbering,
    map: &HashMap<i64, usize>,
) {
    let length = state.chains[chain].sequence.len();
    let mut reports = Vec::new();

    for line in state.lines.iter_mut() {
        if line.tag() != LineTag::Coord || line.chain != Some(chain) {
            continue;
        }
        if numbering == Numbering::Het && line.duplicate_position {
            line.mask();
            reports.push((DiagnosticCode::DupAtomRes, line.number, line.chain_id));
            continue;
        }
        match map.get(&numbering.of(line)) {
            Some(&index) => {
                assert!(
                    (1..=length).contains(&index),
                    "residue index {} outside chain of length {}",
                    index,
                    length
                );
                line.residue_index = Some(index);
            }
            None => {
                line.mask();
                reports.push((DiagnosticCode::BadIndex, line.number, line.chain_id));
            }
        }
    }

    for (code, number, chain_id) in reports {
        let message = match code {
            DiagnosticCode::DupAtomRes => "alternate residue identity dropped",
            _ => "residue number has no position in the aligned sequence",
        };
        state
            .diagnostics
            .push(code, Some(number), Some(chain_id), message);
    }
}
